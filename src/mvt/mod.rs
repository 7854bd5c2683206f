// Mapbox Vector Tile views over an owned buffer.
//
// # Modules
//
// - `tile`   : top-level message walk, layer ranges, owned buffer
// - `layer`  : memoized layer parse, key/value tables, feature ranges
// - `feature`: memoized feature parse, tag resolution, geometry access
// - `value`  : typed entries of a layer's value table

pub mod feature;
pub mod layer;
pub mod tile;
pub mod value;

pub use feature::{Feature, GeomType, Properties};
pub use layer::{DEFAULT_EXTENT, DEFAULT_VERSION, Features, Layer, LayerInfo};
pub use tile::{Layers, Tile};
pub use value::Value;
