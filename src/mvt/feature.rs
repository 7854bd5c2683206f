// Feature decoding.
//
// A feature's id, tag list, geometry type and raw command stream are parsed
// together on first access and memoized in the feature's slot. Tag indices
// are checked against the owning layer's key/value tables at that point, so
// every later `properties()` walk is infallible.

use std::fmt;
use std::ops::Range;

use log::debug;

use crate::error::{DecodeError, Table};
use crate::geometry::{self, BBox, Point};
use crate::pbf::reader::{self, FieldReader};

use super::layer::{FeatureSlot, Layer, LayerData};
use super::value::Value;

// Feature message field numbers.
const FEATURE_ID: u32 = 1;
const FEATURE_TAGS: u32 = 2;
const FEATURE_TYPE: u32 = 3;
const FEATURE_GEOMETRY: u32 = 4;

// ---------------------------------------------------------------------------
// Geometry type
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum GeomType {
    #[default]
    Unknown,
    Point,
    LineString,
    Polygon,
}

impl GeomType {
    /// Unrecognized values map to `Unknown`.
    pub fn from_wire(v: u64) -> Self {
        match v {
            1 => GeomType::Point,
            2 => GeomType::LineString,
            3 => GeomType::Polygon,
            _ => GeomType::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            GeomType::Unknown => "Unknown",
            GeomType::Point => "Point",
            GeomType::LineString => "LineString",
            GeomType::Polygon => "Polygon",
        }
    }
}

impl fmt::Display for GeomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
// Parsed feature
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct FeatureData {
    pub(crate) id: Option<u64>,
    /// Flattened (key, value) index pairs; always even length.
    pub(crate) tags: Vec<u32>,
    pub(crate) geom_type: GeomType,
    pub(crate) geometry: Vec<u32>,
}

impl FeatureData {
    /// Scalar fields keep their last occurrence; repeated `tags` and
    /// `geometry` occurrences are concatenated.
    pub(crate) fn parse(msg: &[u8], layer: &LayerData) -> Result<Self, DecodeError> {
        let mut id = None;
        let mut tags = Vec::new();
        let mut geom_type = GeomType::default();
        let mut geometry = Vec::new();

        for field in FieldReader::new(msg) {
            let field = field?;
            match field.number {
                FEATURE_ID => id = Some(field.varint()?),
                FEATURE_TAGS => reader::read_repeated_u32(&field, "tag", &mut tags)?,
                FEATURE_TYPE => geom_type = GeomType::from_wire(field.varint()?),
                FEATURE_GEOMETRY => reader::read_repeated_u32(&field, "geometry", &mut geometry)?,
                _ => reader::skip_unknown("feature", &field),
            }
        }

        if tags.len() % 2 != 0 {
            return Err(DecodeError::malformed(format!(
                "feature has odd tag list length {}",
                tags.len()
            )));
        }
        for pair in tags.chunks_exact(2) {
            check_reference(Table::Keys, pair[0], layer.keys.len())?;
            check_reference(Table::Values, pair[1], layer.values.len())?;
        }

        Ok(Self {
            id,
            tags,
            geom_type,
            geometry,
        })
    }
}

fn check_reference(table: Table, index: u32, len: usize) -> Result<(), DecodeError> {
    let index = index as usize;
    if index < len {
        Ok(())
    } else {
        Err(DecodeError::ReferenceOutOfRange { table, index, len })
    }
}

// ---------------------------------------------------------------------------
// Feature view
// ---------------------------------------------------------------------------

/// Borrowed view of one feature of a [`Layer`].
#[derive(Debug, Clone, Copy)]
pub struct Feature<'t> {
    layer: Layer<'t>,
    layer_data: &'t LayerData,
    slot: &'t FeatureSlot,
    index: usize,
}

impl<'t> Feature<'t> {
    pub(crate) fn new(
        layer: Layer<'t>,
        layer_data: &'t LayerData,
        slot: &'t FeatureSlot,
        index: usize,
    ) -> Self {
        Self {
            layer,
            layer_data,
            slot,
            index,
        }
    }

    /// Position of this feature in its layer.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn layer(&self) -> Layer<'t> {
        self.layer
    }

    /// Byte range of the feature submessage within the tile buffer.
    pub fn byte_range(&self) -> Range<usize> {
        self.slot.range.clone()
    }

    pub fn is_parsed(&self) -> bool {
        self.slot.parsed.get().is_some()
    }

    /// Extent of the owning layer.
    pub fn extent(&self) -> u32 {
        self.layer_data.extent
    }

    pub(crate) fn parsed(&self) -> Result<&'t FeatureData, DecodeError> {
        let parsed = self.slot.parsed.get_or_init(|| {
            let msg = self.layer.tile().bytes_at(self.slot.range.clone());
            let result = FeatureData::parse(msg, self.layer_data);
            if let Err(e) = &result {
                debug!(
                    "layer {} feature {}: {e}",
                    self.layer.index(),
                    self.index
                );
            }
            result
        });
        parsed.as_ref().map_err(Clone::clone)
    }

    pub fn id(&self) -> Result<Option<u64>, DecodeError> {
        Ok(self.parsed()?.id)
    }

    pub fn geom_type(&self) -> Result<GeomType, DecodeError> {
        Ok(self.parsed()?.geom_type)
    }

    /// (key index, value index) pairs into the layer's tables.
    pub fn tags(&self) -> Result<impl ExactSizeIterator<Item = (u32, u32)> + use<'t>, DecodeError> {
        let data = self.parsed()?;
        Ok(data.tags.chunks_exact(2).map(|pair| (pair[0], pair[1])))
    }

    /// Raw geometry command/parameter integers.
    pub fn geometry(&self) -> Result<&'t [u32], DecodeError> {
        Ok(&self.parsed()?.geometry)
    }

    /// Tags resolved to key strings and typed values.
    pub fn properties(&self) -> Result<Properties<'t>, DecodeError> {
        let data = self.parsed()?;
        Ok(Properties {
            layer: self.layer,
            layer_data: self.layer_data,
            tags: data.tags.chunks_exact(2),
        })
    }

    /// Value of the first tag whose key equals `key`.
    pub fn property(&self, key: &str) -> Result<Option<Value<'t>>, DecodeError> {
        Ok(self
            .properties()?
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v))
    }

    /// Decode the command stream into lines (or rings) of absolute points.
    pub fn decode_geometry(&self) -> Result<Vec<Vec<Point>>, DecodeError> {
        geometry::decode_geometry(self.geometry()?)
    }

    /// Bounding box of every point the command stream visits.
    pub fn bbox(&self) -> Result<Option<BBox>, DecodeError> {
        geometry::bbox(self.geometry()?)
    }
}

/// Iterator over a feature's resolved `(key, value)` properties.
#[derive(Debug, Clone)]
pub struct Properties<'t> {
    layer: Layer<'t>,
    layer_data: &'t LayerData,
    tags: std::slice::ChunksExact<'t, u32>,
}

impl<'t> Iterator for Properties<'t> {
    type Item = (&'t str, Value<'t>);

    fn next(&mut self) -> Option<Self::Item> {
        let pair = self.tags.next()?;
        // Indices were validated when the feature was parsed.
        let key = self.layer_data.keys[pair[0] as usize];
        let value = self.layer_data.values[pair[1] as usize];
        Some((self.layer.tile().str_at(key), self.layer.resolve(value)))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.tags.size_hint()
    }
}

impl ExactSizeIterator for Properties<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
