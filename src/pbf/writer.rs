// Minimal protobuf wire writer.
//
// Emits individual fields into a byte vector. Used to assemble fixture
// messages for tests, benchmarks and fuzz seeds; there is no tile-level
// encoder on top of it.

use super::reader::WireType;
use super::varint::{self, MAX_VARINT_LEN};

#[derive(Debug, Clone, Default)]
pub struct MessageWriter {
    buf: Vec<u8>,
}

impl MessageWriter {
    pub fn new() -> Self {
        Self::default()
    }

    fn raw_varint(&mut self, v: u64) {
        let mut tmp = [0u8; MAX_VARINT_LEN];
        let len = varint::encode_u64(v, &mut tmp);
        self.buf.extend_from_slice(&tmp[..len]);
    }

    pub fn tag(&mut self, number: u32, wire_type: WireType) -> &mut Self {
        self.raw_varint((u64::from(number) << 3) | u64::from(wire_type.tag_bits()));
        self
    }

    pub fn varint(&mut self, number: u32, v: u64) -> &mut Self {
        self.tag(number, WireType::Varint);
        self.raw_varint(v);
        self
    }

    pub fn sint(&mut self, number: u32, v: i64) -> &mut Self {
        self.varint(number, varint::zigzag_encode(v))
    }

    pub fn bool(&mut self, number: u32, v: bool) -> &mut Self {
        self.varint(number, u64::from(v))
    }

    pub fn fixed64(&mut self, number: u32, v: u64) -> &mut Self {
        self.tag(number, WireType::Fixed64);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn fixed32(&mut self, number: u32, v: u32) -> &mut Self {
        self.tag(number, WireType::Fixed32);
        self.buf.extend_from_slice(&v.to_le_bytes());
        self
    }

    pub fn float(&mut self, number: u32, v: f32) -> &mut Self {
        self.fixed32(number, v.to_bits())
    }

    pub fn double(&mut self, number: u32, v: f64) -> &mut Self {
        self.fixed64(number, v.to_bits())
    }

    pub fn bytes(&mut self, number: u32, data: &[u8]) -> &mut Self {
        self.tag(number, WireType::LengthDelimited);
        self.buf.reserve(varint::sizeof_u64(data.len() as u64) + data.len());
        self.raw_varint(data.len() as u64);
        self.buf.extend_from_slice(data);
        self
    }

    pub fn string(&mut self, number: u32, s: &str) -> &mut Self {
        self.bytes(number, s.as_bytes())
    }

    /// Embed a nested message built with another writer.
    pub fn message(&mut self, number: u32, msg: &MessageWriter) -> &mut Self {
        self.bytes(number, &msg.buf)
    }

    pub fn packed_varints<I>(&mut self, number: u32, values: I) -> &mut Self
    where
        I: IntoIterator,
        I::Item: Into<u64>,
    {
        let mut inner = MessageWriter::new();
        for v in values {
            inner.raw_varint(v.into());
        }
        self.bytes(number, &inner.buf)
    }

    /// Append already-encoded bytes verbatim.
    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(data);
        self
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buf
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn finish(self) -> Vec<u8> {
        self.buf
    }
}
