#![no_main]
use libfuzzer_sys::fuzz_target;
use mvtread::pbf::{FieldReader, Payload, reader, varint};

fuzz_target!(|data: &[u8]| {
    let Some((&mode, rest)) = data.split_first() else {
        return;
    };

    if mode & 1 == 0 {
        // Protobuf wire layer: walk fields and expand packed payloads.
        let _ = varint::read_u64(rest);
        for field in FieldReader::new(rest) {
            let Ok(field) = field else {
                break;
            };
            if let Payload::Bytes(bytes) = field.payload {
                let mut out = Vec::new();
                let _ = reader::read_packed_u32(bytes, "fuzz", &mut out);
                let _ = field.str();
            }
        }
    } else {
        // Command-line parsing.
        let text = String::from_utf8_lossy(rest);
        let args: Vec<String> = text
            .split_whitespace()
            .take(32)
            .map(str::to_string)
            .collect();
        mvtread::cli::fuzz_try_parse_args(&args);
    }
});
