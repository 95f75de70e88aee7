use serde::Deserialize;

/// Property holding the region name in the ISTAT regional boundaries dataset.
pub const DEFAULT_REGION_KEY: &str = "reg_name";

/// `[longitude, latitude]` as stored in GeoJSON.
pub type Position = [f64; 2];
/// Outer ring followed by any holes.
pub type PolygonRings = Vec<Vec<Position>>;

#[derive(Debug, Clone, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Feature {
    #[serde(default)]
    pub properties: serde_json::Map<String, serde_json::Value>,
    pub geometry: Option<Geometry>,
}

/// Areal geometry. Points, lines and collections carry no fill and are kept
/// as `Unsupported` rather than failing the whole document.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "RawGeometry")]
pub enum Geometry {
    Polygon(PolygonRings),
    MultiPolygon(Vec<PolygonRings>),
    Unsupported,
}

#[derive(Deserialize)]
struct RawGeometry {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    coordinates: serde_json::Value,
}

impl From<RawGeometry> for Geometry {
    fn from(raw: RawGeometry) -> Self {
        match raw.kind.as_str() {
            "Polygon" => serde_json::from_value(raw.coordinates)
                .map(Geometry::Polygon)
                .unwrap_or(Geometry::Unsupported),
            "MultiPolygon" => serde_json::from_value(raw.coordinates)
                .map(Geometry::MultiPolygon)
                .unwrap_or(Geometry::Unsupported),
            _ => Geometry::Unsupported,
        }
    }
}

impl Feature {
    /// String value of a property, if present and a string.
    pub fn property_str(&self, key: &str) -> Option<&str> {
        self.properties.get(key).and_then(|v| v.as_str())
    }
}

impl FeatureCollection {
    /// Features carrying both a name under `key` and a geometry, in dataset
    /// order. Each comes with its position among all features, skipped ones
    /// included.
    pub fn named_features<'a>(
        &'a self,
        key: &'a str,
    ) -> impl Iterator<Item = (usize, &'a str, &'a Geometry)> + 'a {
        self.features
            .iter()
            .enumerate()
            .filter_map(move |(index, feature)| {
                let name = feature.property_str(key)?;
                let geometry = feature.geometry.as_ref()?;
                Some((index, name, geometry))
            })
    }
}

impl Geometry {
    /// Uniform multipolygon view; unsupported geometries yield nothing.
    pub fn polygons(&self) -> &[PolygonRings] {
        match self {
            Geometry::Polygon(rings) => std::slice::from_ref(rings),
            Geometry::MultiPolygon(polygons) => polygons,
            Geometry::Unsupported => &[],
        }
    }

    /// `(min_lon, min_lat, max_lon, max_lat)`, or `None` for empty geometry.
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let mut points = self
            .polygons()
            .iter()
            .flat_map(|rings| rings.iter().take(1))
            .flatten();
        let first = points.next()?;
        let init = (first[0], first[1], first[0], first[1]);
        Some(points.fold(init, |(min_x, min_y, max_x, max_y), p| {
            (min_x.min(p[0]), min_y.min(p[1]), max_x.max(p[0]), max_y.max(p[1]))
        }))
    }
}

/// Even-odd rule across a set of rings (outer ring plus holes).
pub fn rings_contain<'a, P>(rings: impl IntoIterator<Item = &'a [P]>, x: f64, y: f64) -> bool
where
    P: Point + 'a,
{
    let mut inside = false;
    for ring in rings {
        if ring.len() < 3 {
            continue;
        }
        let mut j = ring.len() - 1;
        for i in 0..ring.len() {
            let (xi, yi) = ring[i].xy();
            let (xj, yj) = ring[j].xy();
            if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
                inside = !inside;
            }
            j = i;
        }
    }
    inside
}

/// Anything with planar coordinates.
pub trait Point {
    fn xy(&self) -> (f64, f64);
}

impl Point for Position {
    fn xy(&self) -> (f64, f64) {
        (self[0], self[1])
    }
}

impl Point for (f64, f64) {
    fn xy(&self) -> (f64, f64) {
        *self
    }
}
