// Layer decoding.
//
// A `Layer` is a (tile, slot) pair. Its submessage is parsed the first time
// any metadata, table entry or feature is requested; the result (or the
// error) is stored in the slot's `OnceLock` and shared by every later
// caller, on any thread.

use std::ops::Range;
use std::sync::OnceLock;

use log::debug;

use crate::error::DecodeError;
use crate::pbf::reader::{self, FieldReader};

use super::feature::{Feature, FeatureData};
use super::tile::{LayerSlot, TextSpan, Tile};
use super::value::{RawValue, Value};

/// Version assumed when a layer omits field 15.
pub const DEFAULT_VERSION: u32 = 1;
/// Extent assumed when a layer omits field 5.
pub const DEFAULT_EXTENT: u32 = 4096;

// Layer message field numbers.
const LAYER_NAME: u32 = 1;
const LAYER_FEATURES: u32 = 2;
const LAYER_KEYS: u32 = 3;
const LAYER_VALUES: u32 = 4;
const LAYER_EXTENT: u32 = 5;
const LAYER_VERSION: u32 = 15;

// ---------------------------------------------------------------------------
// Parsed layer
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub(crate) struct FeatureSlot {
    pub(crate) range: Range<usize>,
    pub(crate) parsed: OnceLock<Result<FeatureData, DecodeError>>,
}

/// Memoized contents of one layer submessage.
#[derive(Debug)]
pub(crate) struct LayerData {
    pub(crate) version: u32,
    pub(crate) name: TextSpan,
    pub(crate) extent: u32,
    pub(crate) keys: Vec<TextSpan>,
    pub(crate) values: Vec<RawValue>,
    pub(crate) features: Vec<FeatureSlot>,
}

impl LayerData {
    /// Parse the layer submessage at `range` of `data`.
    pub(crate) fn parse(data: &[u8], range: Range<usize>) -> Result<Self, DecodeError> {
        let base = range.start;
        let mut reader = FieldReader::new(&data[range]);

        let mut version = DEFAULT_VERSION;
        let mut extent = DEFAULT_EXTENT;
        let mut name = None;
        let mut keys = Vec::new();
        let mut values = Vec::new();
        let mut features = Vec::new();

        while let Some(field) = reader.next_field()? {
            match field.number {
                LAYER_VERSION => version = field.varint_u32()?,
                LAYER_NAME => {
                    if name.is_some() {
                        return Err(DecodeError::malformed("layer has more than one name"));
                    }
                    let s = field.str()?;
                    let end = base + reader.position();
                    name = Some(TextSpan::new(end - s.len(), s.len()));
                }
                LAYER_FEATURES => {
                    let len = field.bytes()?.len();
                    let end = base + reader.position();
                    features.push(FeatureSlot {
                        range: end - len..end,
                        parsed: OnceLock::new(),
                    });
                }
                LAYER_KEYS => {
                    let s = field.str()?;
                    let end = base + reader.position();
                    keys.push(TextSpan::new(end - s.len(), s.len()));
                }
                LAYER_VALUES => {
                    let msg = field.bytes()?;
                    let start = base + reader.position() - msg.len();
                    values.push(RawValue::parse(msg, start)?);
                }
                LAYER_EXTENT => extent = field.varint_u32()?,
                _ => reader::skip_unknown("layer", &field),
            }
        }

        let name = name.ok_or_else(|| DecodeError::malformed("layer has no name"))?;

        Ok(Self {
            version,
            name,
            extent,
            keys,
            values,
            features,
        })
    }
}

// ---------------------------------------------------------------------------
// Layer view
// ---------------------------------------------------------------------------

/// Snapshot of the metadata exposed for every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerInfo<'t> {
    pub version: u32,
    pub name: &'t str,
    pub extent: u32,
    pub feature_count: usize,
}

/// Borrowed view of one layer of a [`Tile`].
#[derive(Debug, Clone, Copy)]
pub struct Layer<'t> {
    tile: &'t Tile,
    slot: &'t LayerSlot,
    index: usize,
}

impl<'t> Layer<'t> {
    pub(crate) fn new(tile: &'t Tile, slot: &'t LayerSlot, index: usize) -> Self {
        Self { tile, slot, index }
    }

    /// Position of this layer in the tile.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Byte range of the layer submessage within the tile buffer.
    pub fn byte_range(&self) -> Range<usize> {
        self.slot.range.clone()
    }

    /// Whether the submessage has been parsed (successfully or not).
    pub fn is_parsed(&self) -> bool {
        self.slot.parsed.get().is_some()
    }

    pub(crate) fn tile(&self) -> &'t Tile {
        self.tile
    }

    pub(crate) fn data(&self) -> Result<&'t LayerData, DecodeError> {
        let parsed = self.slot.parsed.get_or_init(|| {
            let result = LayerData::parse(self.tile.as_bytes(), self.slot.range.clone());
            match &result {
                Ok(data) => debug!(
                    "layer {}: parsed {:?}, {} features, {} keys, {} values",
                    self.index,
                    self.tile.str_at(data.name),
                    data.features.len(),
                    data.keys.len(),
                    data.values.len()
                ),
                Err(e) => debug!("layer {}: {e}", self.index),
            }
            result
        });
        parsed.as_ref().map_err(Clone::clone)
    }

    pub fn version(&self) -> Result<u32, DecodeError> {
        Ok(self.data()?.version)
    }

    pub fn name(&self) -> Result<&'t str, DecodeError> {
        let data = self.data()?;
        Ok(self.tile.str_at(data.name))
    }

    pub fn extent(&self) -> Result<u32, DecodeError> {
        Ok(self.data()?.extent)
    }

    pub fn feature_count(&self) -> Result<usize, DecodeError> {
        Ok(self.data()?.features.len())
    }

    /// Version, name, extent and feature count in one call.
    pub fn info(&self) -> Result<LayerInfo<'t>, DecodeError> {
        let data = self.data()?;
        Ok(LayerInfo {
            version: data.version,
            name: self.tile.str_at(data.name),
            extent: data.extent,
            feature_count: data.features.len(),
        })
    }

    pub fn key_count(&self) -> Result<usize, DecodeError> {
        Ok(self.data()?.keys.len())
    }

    pub fn value_count(&self) -> Result<usize, DecodeError> {
        Ok(self.data()?.values.len())
    }

    pub fn key(&self, index: usize) -> Result<&'t str, DecodeError> {
        let data = self.data()?;
        DecodeError::check_index(index, data.keys.len())?;
        Ok(self.tile.str_at(data.keys[index]))
    }

    pub fn value(&self, index: usize) -> Result<Value<'t>, DecodeError> {
        let data = self.data()?;
        DecodeError::check_index(index, data.values.len())?;
        Ok(self.resolve(data.values[index]))
    }

    pub fn keys(&self) -> Result<impl ExactSizeIterator<Item = &'t str> + use<'t>, DecodeError> {
        let data = self.data()?;
        let tile = self.tile;
        Ok(data.keys.iter().map(move |&span| tile.str_at(span)))
    }

    pub fn values(&self) -> Result<impl ExactSizeIterator<Item = Value<'t>> + use<'t>, DecodeError> {
        let data = self.data()?;
        let layer = *self;
        Ok(data.values.iter().map(move |&raw| layer.resolve(raw)))
    }

    pub(crate) fn resolve(&self, raw: RawValue) -> Value<'t> {
        match raw {
            RawValue::String(span) => Value::String(self.tile.str_at(span)),
            RawValue::Float(v) => Value::Float(v),
            RawValue::Double(v) => Value::Double(v),
            RawValue::Int(v) => Value::Int(v),
            RawValue::UInt(v) => Value::UInt(v),
            RawValue::SInt(v) => Value::SInt(v),
            RawValue::Bool(v) => Value::Bool(v),
        }
    }

    /// Feature at `index`; its body is parsed on first access.
    pub fn feature(&self, index: usize) -> Result<Feature<'t>, DecodeError> {
        let data = self.data()?;
        DecodeError::check_index(index, data.features.len())?;
        Ok(Feature::new(*self, data, &data.features[index], index))
    }

    pub fn features(&self) -> Result<Features<'t>, DecodeError> {
        let data = self.data()?;
        Ok(Features {
            layer: *self,
            data,
            next: 0,
        })
    }
}

/// Iterator over a layer's features in wire order.
#[derive(Debug, Clone)]
pub struct Features<'t> {
    layer: Layer<'t>,
    data: &'t LayerData,
    next: usize,
}

impl<'t> Iterator for Features<'t> {
    type Item = Feature<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.data.features.get(self.next)?;
        let feature = Feature::new(self.layer, self.data, slot, self.next);
        self.next += 1;
        Some(feature)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.data.features.len() - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Features<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
