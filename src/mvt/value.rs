// Layer value table entries.
//
// A `Value` submessage carries exactly one of seven scalar variants. The
// layer caches values as `RawValue`, with string payloads kept as offsets
// into the tile buffer; `Value<'t>` is the borrowed form handed to callers.

use std::fmt;

use crate::error::DecodeError;
use crate::pbf::reader::{self, FieldReader};
use crate::pbf::varint::zigzag_decode;

use super::tile::TextSpan;

/// One typed attribute value from a layer's value table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value<'a> {
    String(&'a str),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

impl<'a> Value<'a> {
    pub fn as_str(&self) -> Option<&'a str> {
        match *self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match *self {
            Value::Bool(b) => Some(b),
            _ => None,
        }
    }

    /// Integer variants widened to `i64`; `UInt` values above `i64::MAX`
    /// yield `None`.
    pub fn as_i64(&self) -> Option<i64> {
        match *self {
            Value::Int(v) | Value::SInt(v) => Some(v),
            Value::UInt(v) => i64::try_from(v).ok(),
            _ => None,
        }
    }

    /// Any numeric variant as `f64`.
    pub fn as_f64(&self) -> Option<f64> {
        match *self {
            Value::Float(v) => Some(f64::from(v)),
            Value::Double(v) => Some(v),
            Value::Int(v) | Value::SInt(v) => Some(v as f64),
            Value::UInt(v) => Some(v as f64),
            _ => None,
        }
    }

    /// Name of the wire variant.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::String(_) => "string",
            Value::Float(_) => "float",
            Value::Double(_) => "double",
            Value::Int(_) => "int",
            Value::UInt(_) => "uint",
            Value::SInt(_) => "sint",
            Value::Bool(_) => "bool",
        }
    }
}

impl fmt::Display for Value<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{s:?}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Double(v) => write!(f, "{v}"),
            Value::Int(v) | Value::SInt(v) => write!(f, "{v}"),
            Value::UInt(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Cached form
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum RawValue {
    String(TextSpan),
    Float(f32),
    Double(f64),
    Int(i64),
    UInt(u64),
    SInt(i64),
    Bool(bool),
}

impl RawValue {
    /// Parse a `Value` submessage located at `base` in the tile buffer.
    pub(crate) fn parse(msg: &[u8], base: usize) -> Result<Self, DecodeError> {
        let mut found: Option<RawValue> = None;
        let mut reader = FieldReader::new(msg);

        while let Some(field) = reader.next_field()? {
            let value = match field.number {
                1 => {
                    let s = field.str()?;
                    let end = base + reader.position();
                    RawValue::String(TextSpan::new(end - s.len(), s.len()))
                }
                2 => RawValue::Float(f32::from_bits(field.fixed32()?)),
                3 => RawValue::Double(f64::from_bits(field.fixed64()?)),
                4 => RawValue::Int(field.varint()? as i64),
                5 => RawValue::UInt(field.varint()?),
                6 => RawValue::SInt(zigzag_decode(field.varint()?)),
                7 => RawValue::Bool(field.varint()? != 0),
                _ => {
                    reader::skip_unknown("value", &field);
                    continue;
                }
            };
            if found.is_some() {
                return Err(DecodeError::malformed("value has more than one variant"));
            }
            found = Some(value);
        }

        found.ok_or_else(|| DecodeError::malformed("value has no variant"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pbf::MessageWriter;

    fn parse(w: &MessageWriter) -> Result<RawValue, DecodeError> {
        RawValue::parse(w.as_bytes(), 0)
    }

    #[test]
    fn each_variant() {
        let mut w = MessageWriter::new();
        w.float(2, 1.5);
        assert_eq!(parse(&w), Ok(RawValue::Float(1.5)));

        let mut w = MessageWriter::new();
        w.double(3, -2.25);
        assert_eq!(parse(&w), Ok(RawValue::Double(-2.25)));

        let mut w = MessageWriter::new();
        w.varint(4, (-5i64) as u64);
        assert_eq!(parse(&w), Ok(RawValue::Int(-5)));

        let mut w = MessageWriter::new();
        w.varint(5, u64::MAX);
        assert_eq!(parse(&w), Ok(RawValue::UInt(u64::MAX)));

        let mut w = MessageWriter::new();
        w.sint(6, -3);
        assert_eq!(parse(&w), Ok(RawValue::SInt(-3)));

        let mut w = MessageWriter::new();
        w.bool(7, true);
        assert_eq!(parse(&w), Ok(RawValue::Bool(true)));
    }

    #[test]
    fn string_span_is_absolute() {
        let mut w = MessageWriter::new();
        w.string(1, "park");
        // tag + length = 2 bytes, message placed at offset 100
        assert_eq!(
            RawValue::parse(w.as_bytes(), 100),
            Ok(RawValue::String(TextSpan::new(102, 4)))
        );
    }

    #[test]
    fn two_variants_rejected() {
        let mut w = MessageWriter::new();
        w.string(1, "x");
        w.bool(7, false);
        assert!(matches!(parse(&w), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn repeated_variant_rejected() {
        let mut w = MessageWriter::new();
        w.varint(5, 1);
        w.varint(5, 2);
        assert!(matches!(parse(&w), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn empty_value_rejected() {
        assert!(matches!(
            RawValue::parse(&[], 0),
            Err(DecodeError::Malformed(_))
        ));
    }

    #[test]
    fn unknown_fields_skipped() {
        let mut w = MessageWriter::new();
        w.string(9, "future");
        w.varint(5, 42);
        assert_eq!(parse(&w), Ok(RawValue::UInt(42)));
    }

    #[test]
    fn wrong_wire_type_rejected() {
        let mut w = MessageWriter::new();
        w.varint(2, 1); // float must be fixed32
        assert!(matches!(parse(&w), Err(DecodeError::Malformed(_))));
    }

    #[test]
    fn conversions() {
        assert_eq!(Value::UInt(7).as_i64(), Some(7));
        assert_eq!(Value::UInt(u64::MAX).as_i64(), None);
        assert_eq!(Value::Float(0.5).as_f64(), Some(0.5));
        assert_eq!(Value::String("a").as_f64(), None);
        assert_eq!(Value::Bool(true).to_string(), "true");
        assert_eq!(Value::String("Mauerpark").to_string(), "\"Mauerpark\"");
    }
}
