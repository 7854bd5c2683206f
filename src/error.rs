// Decode error shared by the wire reader, the tile views and geometry decoding.

use std::fmt;

use thiserror::Error;

use crate::pbf::varint::VarIntError;

/// Which per-layer table a feature tag points into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Keys,
    Values,
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Table::Keys => f.write_str("key"),
            Table::Values => f.write_str("value"),
        }
    }
}

/// Failure while decoding a tile or one of its layers/features.
///
/// Errors are cheap to clone so that a memoized failed parse can be
/// reported again on every later access.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input ended in the middle of a varint or command parameter list.
    #[error("truncated input")]
    Truncated,
    /// Structurally invalid protobuf or MVT content.
    #[error("malformed tile: {0}")]
    Malformed(String),
    /// A caller-supplied index is past the end of a list.
    #[error("index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },
    /// A feature tag references a key or value the layer does not have.
    #[error("feature references {table} {index}, but the layer has {len}")]
    ReferenceOutOfRange { table: Table, index: usize, len: usize },
}

impl DecodeError {
    pub(crate) fn malformed(msg: impl Into<String>) -> Self {
        Self::Malformed(msg.into())
    }

    /// Bounds check shared by every indexed accessor.
    pub(crate) fn check_index(index: usize, len: usize) -> Result<(), Self> {
        if index < len {
            Ok(())
        } else {
            Err(Self::IndexOutOfRange { index, len })
        }
    }
}

impl From<VarIntError> for DecodeError {
    fn from(e: VarIntError) -> Self {
        match e {
            VarIntError::Truncated => Self::Truncated,
            VarIntError::Overlong | VarIntError::Overflow => Self::Malformed(e.to_string()),
        }
    }
}
