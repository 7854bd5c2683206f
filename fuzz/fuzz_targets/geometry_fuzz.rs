#![no_main]
use libfuzzer_sys::fuzz_target;
use mvtread::geometry;

fuzz_target!(|data: &[u8]| {
    let commands: Vec<u32> = data
        .chunks_exact(4)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    let _ = geometry::Commands::new(&commands).count();
    let _ = geometry::bbox(&commands);
    if let Ok(rings) = geometry::decode_geometry(&commands) {
        let _ = geometry::classify_rings(rings);
    }
});
