#![no_main]
use libfuzzer_sys::fuzz_target;
use mvtread::Tile;

fuzz_target!(|data: &[u8]| {
    // Decoding and every accessor must return errors, never panic.
    let Ok(tile) = Tile::decode(data.to_vec()) else {
        return;
    };
    for layer in tile.layers() {
        let _ = layer.info();
        if let Ok(values) = layer.values() {
            for value in values {
                let _ = value.to_string();
            }
        }
        let Ok(features) = layer.features() else {
            continue;
        };
        for feature in features {
            let _ = feature.id();
            let _ = feature.geom_type();
            let _ = feature.properties().map(|p| p.count());
            let _ = feature.bbox();
        }
    }
    let _ = tile.preload();
});
