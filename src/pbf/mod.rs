// Protobuf wire format primitives.
//
// # Modules
//
// - `varint`: base-128 varints and zigzag transforms
// - `reader`: bounds-checked field reader and packed varint decoding
// - `writer`: field emitter for assembling fixture messages

pub mod reader;
pub mod varint;
pub mod writer;

pub use reader::{Field, FieldReader, Payload, WireType};
pub use varint::VarIntError;
pub use writer::MessageWriter;
