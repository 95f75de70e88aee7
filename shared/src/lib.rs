pub mod colors;
pub mod geo;
pub mod info;

pub use colors::{category10, darken_percent, darker};
pub use geo::{DEFAULT_REGION_KEY, Feature, FeatureCollection, Geometry};
pub use info::*;
