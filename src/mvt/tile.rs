// Top-level tile decoding.
//
// `Tile::decode` takes ownership of the buffer and walks only the top-level
// message, recording the byte range of every `layers` (field 3) entry. Layer
// contents are parsed on first access through `Layer`, a borrowed view whose
// lifetime is tied to the tile.

use std::ops::Range;
use std::sync::OnceLock;

use log::debug;

use crate::error::DecodeError;
use crate::pbf::reader::{self, FieldReader, WireType};

use super::layer::{Layer, LayerData};

/// Field number of `Tile.layers`.
const TILE_LAYERS: u32 = 3;

// ---------------------------------------------------------------------------
// Text spans
// ---------------------------------------------------------------------------

/// Byte range of a UTF-8 string inside the tile buffer.
///
/// Only constructed by the layer and value parsers after the bytes at that
/// range have been validated with `std::str::from_utf8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct TextSpan {
    start: usize,
    len: usize,
}

impl TextSpan {
    /// `start..start + len` must be a range of the owning tile's buffer that
    /// was checked with `std::str::from_utf8`. `Tile::str_at` reads a span that
    /// is out of range or not UTF-8 as an empty string.
    pub(crate) fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }
}

// ---------------------------------------------------------------------------
// Tile
// ---------------------------------------------------------------------------

/// Byte range of one layer plus its compute-once parse result.
#[derive(Debug)]
pub(crate) struct LayerSlot {
    pub(crate) range: Range<usize>,
    pub(crate) parsed: OnceLock<Result<LayerData, DecodeError>>,
}

/// A decoded vector tile owning its buffer.
///
/// ```
/// use mvtread::Tile;
///
/// let tile = Tile::decode(Vec::<u8>::new()).unwrap();
/// assert_eq!(tile.layer_count(), 0);
/// ```
#[derive(Debug)]
pub struct Tile {
    data: Box<[u8]>,
    layers: Vec<LayerSlot>,
}

impl Tile {
    /// Take ownership of `data` and enumerate its layers.
    ///
    /// Only the top-level message is walked here; a malformed layer body is
    /// reported when that layer is first accessed.
    pub fn decode(data: impl Into<Box<[u8]>>) -> Result<Self, DecodeError> {
        let data = data.into();
        let mut layers = Vec::new();
        let mut reader = FieldReader::new(&data);

        while let Some(field) = reader.next_field()? {
            if field.number != TILE_LAYERS {
                reader::skip_unknown("tile", &field);
                continue;
            }
            if field.wire_type() != WireType::LengthDelimited {
                return Err(DecodeError::malformed(format!(
                    "layer field has wire type {}",
                    field.wire_type()
                )));
            }
            let len = field.bytes()?.len();
            let end = reader.position();
            layers.push(LayerSlot {
                range: end - len..end,
                parsed: OnceLock::new(),
            });
        }

        debug!("tile: {} bytes, {} layers", data.len(), layers.len());
        Ok(Self { data, layers })
    }

    /// The raw tile bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Layer at `index`, in wire order.
    pub fn layer(&self, index: usize) -> Result<Layer<'_>, DecodeError> {
        DecodeError::check_index(index, self.layers.len())?;
        Ok(Layer::new(self, &self.layers[index], index))
    }

    pub fn layers(&self) -> Layers<'_> {
        Layers {
            tile: self,
            next: 0,
        }
    }

    /// First layer named `name`.
    ///
    /// Layers are parsed in order until a match is found; a layer that fails
    /// to parse before the match aborts the lookup with its error.
    pub fn layer_by_name(&self, name: &str) -> Result<Option<Layer<'_>>, DecodeError> {
        for layer in self.layers() {
            if layer.name()? == name {
                return Ok(Some(layer));
            }
        }
        Ok(None)
    }

    /// Parse every layer and feature now, returning the first failure.
    pub fn preload(&self) -> Result<(), DecodeError> {
        for layer in self.layers() {
            for feature in layer.features()? {
                feature.parsed()?;
            }
        }
        Ok(())
    }

    /// `preload` spread across the rayon thread pool.
    #[cfg(feature = "parallel")]
    pub fn preload_parallel(&self) -> Result<(), DecodeError> {
        use rayon::prelude::*;

        (0..self.layer_count()).into_par_iter().try_for_each(|i| {
            let layer = self.layer(i)?;
            (0..layer.feature_count()?)
                .into_par_iter()
                .try_for_each(|j| layer.feature(j)?.parsed().map(|_| ()))
        })
    }

    pub(crate) fn bytes_at(&self, range: Range<usize>) -> &[u8] {
        &self.data[range]
    }

    pub(crate) fn str_at(&self, span: TextSpan) -> &str {
        self.data
            .get(span.start..span.start.saturating_add(span.len))
            .and_then(|bytes| std::str::from_utf8(bytes).ok())
            .unwrap_or_default()
    }
}

/// Iterator over a tile's layers in wire order.
#[derive(Debug, Clone)]
pub struct Layers<'t> {
    tile: &'t Tile,
    next: usize,
}

impl<'t> Iterator for Layers<'t> {
    type Item = Layer<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        let slot = self.tile.layers.get(self.next)?;
        let layer = Layer::new(self.tile, slot, self.next);
        self.next += 1;
        Some(layer)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let n = self.tile.layers.len() - self.next;
        (n, Some(n))
    }
}

impl ExactSizeIterator for Layers<'_> {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
