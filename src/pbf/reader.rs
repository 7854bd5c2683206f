// Protobuf wire-format field reader.
//
// Walks a byte range as (field number, wire type, payload) triples. Every
// payload is bounds-checked against the range before it is returned, so
// callers can skip any field they do not recognize simply by ignoring it.

use std::fmt;

use log::trace;

use super::varint::{self, VarIntError};
use crate::error::DecodeError;

/// Largest field number protobuf allows (2^29 - 1).
pub const MAX_FIELD_NUMBER: u32 = (1 << 29) - 1;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WireType {
    Varint,
    Fixed64,
    LengthDelimited,
    Fixed32,
}

impl WireType {
    /// Map the low three tag bits to a wire type.
    /// Groups (3, 4) and the reserved values (6, 7) are rejected.
    pub fn from_tag_bits(bits: u8) -> Result<Self, DecodeError> {
        match bits {
            0 => Ok(WireType::Varint),
            1 => Ok(WireType::Fixed64),
            2 => Ok(WireType::LengthDelimited),
            5 => Ok(WireType::Fixed32),
            other => Err(DecodeError::malformed(format!(
                "unsupported wire type {other}"
            ))),
        }
    }

    pub fn tag_bits(self) -> u8 {
        match self {
            WireType::Varint => 0,
            WireType::Fixed64 => 1,
            WireType::LengthDelimited => 2,
            WireType::Fixed32 => 5,
        }
    }
}

impl fmt::Display for WireType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            WireType::Varint => "varint",
            WireType::Fixed64 => "fixed64",
            WireType::LengthDelimited => "length-delimited",
            WireType::Fixed32 => "fixed32",
        };
        f.write_str(name)
    }
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Decoded payload of one field, borrowing length-delimited bytes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Payload<'a> {
    Varint(u64),
    Fixed64(u64),
    Bytes(&'a [u8]),
    Fixed32(u32),
}

impl Payload<'_> {
    pub fn wire_type(&self) -> WireType {
        match self {
            Payload::Varint(_) => WireType::Varint,
            Payload::Fixed64(_) => WireType::Fixed64,
            Payload::Bytes(_) => WireType::LengthDelimited,
            Payload::Fixed32(_) => WireType::Fixed32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Field<'a> {
    pub number: u32,
    pub payload: Payload<'a>,
}

impl<'a> Field<'a> {
    pub fn wire_type(&self) -> WireType {
        self.payload.wire_type()
    }

    fn wrong_type(&self, expected: WireType) -> DecodeError {
        DecodeError::malformed(format!(
            "field {} has wire type {}, expected {expected}",
            self.number,
            self.wire_type()
        ))
    }

    pub fn varint(&self) -> Result<u64, DecodeError> {
        match self.payload {
            Payload::Varint(v) => Ok(v),
            _ => Err(self.wrong_type(WireType::Varint)),
        }
    }

    /// Varint narrowed to 32 bits.
    pub fn varint_u32(&self) -> Result<u32, DecodeError> {
        let v = self.varint()?;
        u32::try_from(v).map_err(|_| {
            DecodeError::malformed(format!("field {} value {v} exceeds 32 bits", self.number))
        })
    }

    pub fn fixed64(&self) -> Result<u64, DecodeError> {
        match self.payload {
            Payload::Fixed64(v) => Ok(v),
            _ => Err(self.wrong_type(WireType::Fixed64)),
        }
    }

    pub fn fixed32(&self) -> Result<u32, DecodeError> {
        match self.payload {
            Payload::Fixed32(v) => Ok(v),
            _ => Err(self.wrong_type(WireType::Fixed32)),
        }
    }

    pub fn bytes(&self) -> Result<&'a [u8], DecodeError> {
        match self.payload {
            Payload::Bytes(b) => Ok(b),
            _ => Err(self.wrong_type(WireType::LengthDelimited)),
        }
    }

    /// Length-delimited payload validated as UTF-8.
    pub fn str(&self) -> Result<&'a str, DecodeError> {
        let bytes = self.bytes()?;
        std::str::from_utf8(bytes).map_err(|e| {
            DecodeError::malformed(format!("field {} is not valid UTF-8: {e}", self.number))
        })
    }
}

// ---------------------------------------------------------------------------
// FieldReader
// ---------------------------------------------------------------------------

/// Cursor over the fields of one message.
///
/// Also usable as an iterator of `Result<Field, DecodeError>`; iteration
/// stops after the first error.
#[derive(Debug, Clone)]
pub struct FieldReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> FieldReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Offset of the cursor from the start of the message.
    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos == self.data.len()
    }

    fn read_varint(&mut self) -> Result<u64, DecodeError> {
        let (val, len) = varint::read_u64(&self.data[self.pos..])?;
        self.pos += len;
        Ok(val)
    }

    fn take(&mut self, len: usize, number: u32) -> Result<&'a [u8], DecodeError> {
        if len > self.remaining() {
            return Err(DecodeError::malformed(format!(
                "field {number} declares {len} bytes but only {} remain",
                self.remaining()
            )));
        }
        let out = &self.data[self.pos..self.pos + len];
        self.pos += len;
        Ok(out)
    }

    /// Read the next field, or `None` at exactly the end of the message.
    pub fn next_field(&mut self) -> Result<Option<Field<'a>>, DecodeError> {
        if self.is_at_end() {
            return Ok(None);
        }

        let tag = self.read_varint()?;
        let wire_type = WireType::from_tag_bits((tag & 0x07) as u8)?;
        let number = tag >> 3;
        if number == 0 || number > u64::from(MAX_FIELD_NUMBER) {
            return Err(DecodeError::malformed(format!(
                "invalid field number {number}"
            )));
        }
        let number = number as u32;

        let payload = match wire_type {
            WireType::Varint => Payload::Varint(self.read_varint()?),
            WireType::Fixed64 => {
                let raw = self.take(8, number)?;
                let mut buf = [0u8; 8];
                buf.copy_from_slice(raw);
                Payload::Fixed64(u64::from_le_bytes(buf))
            }
            WireType::Fixed32 => {
                let raw = self.take(4, number)?;
                let mut buf = [0u8; 4];
                buf.copy_from_slice(raw);
                Payload::Fixed32(u32::from_le_bytes(buf))
            }
            WireType::LengthDelimited => {
                let len = self.read_varint()?;
                let len = usize::try_from(len).map_err(|_| {
                    DecodeError::malformed(format!("field {number} length {len} too large"))
                })?;
                Payload::Bytes(self.take(len, number)?)
            }
        };

        Ok(Some(Field { number, payload }))
    }
}

impl<'a> Iterator for FieldReader<'a> {
    type Item = Result<Field<'a>, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        match self.next_field() {
            Ok(Some(field)) => Some(Ok(field)),
            Ok(None) => None,
            Err(e) => {
                self.pos = self.data.len();
                Some(Err(e))
            }
        }
    }
}

/// Log a field that a message loop does not recognize.
#[inline]
pub(crate) fn skip_unknown(message: &str, field: &Field<'_>) {
    trace!(
        "{message}: skipping unknown field {} ({})",
        field.number,
        field.wire_type()
    );
}

// ---------------------------------------------------------------------------
// Packed repeated varints
// ---------------------------------------------------------------------------

/// Decode a packed varint payload whose elements must each fit in 32 bits,
/// appending them to `out`.
pub fn read_packed_u32(
    mut data: &[u8],
    what: &str,
    out: &mut Vec<u32>,
) -> Result<(), DecodeError> {
    // Every element needs at least one byte.
    out.reserve(data.len().min(4096));
    while !data.is_empty() {
        let (v, len) = varint::read_u32(data).map_err(|e| match e {
            VarIntError::Overflow => {
                DecodeError::malformed(format!("{what} value exceeds 32 bits"))
            }
            other => other.into(),
        })?;
        out.push(v);
        data = &data[len..];
    }
    Ok(())
}

/// Append one occurrence of a repeated `uint32` field to `out`. Writers may
/// emit packed chunks (wire type 2), which concatenate, or single unpacked
/// varints.
pub fn read_repeated_u32(
    field: &Field<'_>,
    what: &str,
    out: &mut Vec<u32>,
) -> Result<(), DecodeError> {
    match field.payload {
        Payload::Bytes(data) => read_packed_u32(data, what, out),
        Payload::Varint(_) => {
            out.push(field.varint_u32()?);
            Ok(())
        }
        _ => Err(field.wrong_type(WireType::LengthDelimited)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
