use regioni_shared::{Geometry, geo::rings_contain};

use crate::viewport::project;

const GRID_COLS: usize = 32;
const GRID_ROWS: usize = 32;

type Ring = Vec<(f64, f64)>;
type Bounds = (f64, f64, f64, f64);

/// One map layer in projected world coordinates.
#[derive(Debug, Clone)]
pub struct ProjectedShape {
    pub name: String,
    pub polygons: Vec<Vec<Ring>>,
    pub bounds: Option<Bounds>,
}

impl ProjectedShape {
    pub fn from_geometry(name: &str, geometry: &Geometry) -> Self {
        let polygons: Vec<Vec<Ring>> = geometry
            .polygons()
            .iter()
            .map(|rings| {
                rings
                    .iter()
                    .map(|ring| ring.iter().map(|p| project(p[0], p[1])).collect())
                    .collect()
            })
            .collect();

        let bounds = polygons
            .iter()
            .filter_map(|rings| rings.first())
            .flatten()
            .fold(None, |acc: Option<Bounds>, &(x, y)| {
                Some(match acc {
                    None => (x, y, x, y),
                    Some((l, t, r, b)) => (l.min(x), t.min(y), r.max(x), b.max(y)),
                })
            });

        Self {
            name: name.to_owned(),
            polygons,
            bounds,
        }
    }

    pub fn contains(&self, wx: f64, wy: f64) -> bool {
        let Some((l, t, r, b)) = self.bounds else {
            return false;
        };
        if wx < l || wx > r || wy < t || wy > b {
            return false;
        }
        self.polygons
            .iter()
            .any(|rings| rings_contain(rings.iter().map(Vec::as_slice), wx, wy))
    }
}

/// Union of all shape bounds.
pub fn world_bounds(shapes: &[ProjectedShape]) -> Option<Bounds> {
    shapes
        .iter()
        .filter_map(|shape| shape.bounds)
        .reduce(|(l, t, r, b), (l2, t2, r2, b2)| (l.min(l2), t.min(t2), r.max(r2), b.max(b2)))
}

/// A flat 2D grid over world space; each cell lists the shapes whose bounding
/// box overlaps it. Rebuilt whenever layers are added.
#[derive(Debug, Default)]
pub struct SpatialGrid {
    cells: Vec<Vec<usize>>,
    min_x: f64,
    min_y: f64,
    cell_w: f64,
    cell_h: f64,
}

impl SpatialGrid {
    pub fn build(shapes: &[ProjectedShape]) -> Self {
        let Some((min_x, min_y, max_x, max_y)) = world_bounds(shapes) else {
            return Self::default();
        };

        let cell_w = ((max_x - min_x) / GRID_COLS as f64).max(f64::EPSILON);
        let cell_h = ((max_y - min_y) / GRID_ROWS as f64).max(f64::EPSILON);

        let mut cells = vec![Vec::new(); GRID_COLS * GRID_ROWS];
        for (idx, shape) in shapes.iter().enumerate() {
            let Some((l, t, r, b)) = shape.bounds else {
                continue;
            };
            let col_start = ((l - min_x) / cell_w).floor().max(0.0) as usize;
            let col_end = (((r - min_x) / cell_w).floor() as usize).min(GRID_COLS - 1);
            let row_start = ((t - min_y) / cell_h).floor().max(0.0) as usize;
            let row_end = (((b - min_y) / cell_h).floor() as usize).min(GRID_ROWS - 1);

            for row in row_start..=row_end {
                for col in col_start..=col_end {
                    cells[row * GRID_COLS + col].push(idx);
                }
            }
        }

        Self {
            cells,
            min_x,
            min_y,
            cell_w,
            cell_h,
        }
    }

    /// Index of the topmost shape containing the world point. Later shapes
    /// are drawn over earlier ones, so they win.
    pub fn find_at(&self, shapes: &[ProjectedShape], wx: f64, wy: f64) -> Option<usize> {
        if self.cells.is_empty() {
            return None;
        }

        let col = ((wx - self.min_x) / self.cell_w).floor();
        let row = ((wy - self.min_y) / self.cell_h).floor();
        if col < 0.0 || row < 0.0 {
            return None;
        }
        let (col, row) = (col as usize, row as usize);
        if col >= GRID_COLS || row >= GRID_ROWS {
            return None;
        }

        self.cells[row * GRID_COLS + col]
            .iter()
            .rev()
            .copied()
            .find(|&idx| shapes.get(idx).is_some_and(|shape| shape.contains(wx, wy)))
    }
}
