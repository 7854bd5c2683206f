//! mvtread: lazy, zero-copy Mapbox Vector Tile decoding.
//!
//! The crate provides:
//! - Protobuf wire primitives (`pbf`)
//! - Tile, layer and feature views with memoized parsing (`mvt`)
//! - Geometry command stream interpretation (`geometry`)
//! - File-oriented helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use mvtread::pbf::MessageWriter;
//! use mvtread::Tile;
//!
//! let mut layer = MessageWriter::new();
//! layer.varint(15, 2).string(1, "water").varint(5, 4096);
//! let mut tile = MessageWriter::new();
//! tile.message(3, &layer);
//!
//! let tile = Tile::decode(tile.finish()).unwrap();
//! let info = tile.layer(0).unwrap().info().unwrap();
//! assert_eq!((info.name, info.version, info.extent), ("water", 2, 4096));
//! assert_eq!(info.feature_count, 0);
//! ```

pub mod error;
pub mod geometry;
pub mod io;
pub mod mvt;
pub mod pbf;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{DecodeError, Table};
pub use mvt::{Feature, GeomType, Layer, LayerInfo, Tile, Value};
