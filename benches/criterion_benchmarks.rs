use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use mvtread::Tile;
use mvtread::geometry;
use mvtread::pbf::MessageWriter;

/// Deterministic pseudo-random sequence for fixture generation.
fn lcg(seed: &mut u64) -> u32 {
    *seed = seed.wrapping_mul(6364136223846793005).wrapping_add(1);
    (*seed >> 33) as u32
}

/// A polyline with `points` vertices as a raw command stream.
fn gen_line(points: usize, seed: &mut u64) -> Vec<u32> {
    let mut out = Vec::with_capacity(points * 2 + 2);
    out.extend([9, 4096, 4096]);
    out.push(((points as u32 - 1) << 3) | 2);
    for _ in 1..points {
        out.push(lcg(seed) % 64);
        out.push(lcg(seed) % 64);
    }
    out
}

/// A tile with `layers` layers of `features` line features each.
fn gen_tile(layers: usize, features: usize) -> Vec<u8> {
    let mut seed = 7u64;
    let mut t = MessageWriter::new();
    for li in 0..layers {
        let mut l = MessageWriter::new();
        l.varint(15, 2).string(1, &format!("layer{li}")).varint(5, 4096);
        for k in 0..8 {
            l.string(3, &format!("key{k}"));
        }
        for v in 0..32 {
            let mut value = MessageWriter::new();
            value.sint(6, v - 16);
            l.message(4, &value);
        }
        for fi in 0..features {
            let tags: Vec<u32> = (0..4)
                .flat_map(|_| [lcg(&mut seed) % 8, lcg(&mut seed) % 32])
                .collect();
            let mut f = MessageWriter::new();
            f.varint(1, fi as u64)
                .packed_varints(2, tags)
                .varint(3, 2)
                .packed_varints(4, gen_line(16, &mut seed));
            l.message(2, &f);
        }
        t.message(3, &l);
    }
    t.finish()
}

fn bench_tile_decode(c: &mut Criterion) {
    let mut g = c.benchmark_group("tile_decode_mb_s");
    for layers in [1usize, 8, 64] {
        let data = gen_tile(layers, 64);
        g.throughput(Throughput::Bytes(data.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(layers), &layers, |b, _| {
            b.iter(|| {
                let tile = Tile::decode(black_box(data.clone())).unwrap();
                black_box(tile.layer_count());
            });
        });
    }
    g.finish();
}

fn bench_full_parse(c: &mut Criterion) {
    let mut g = c.benchmark_group("preload_vs_features");
    for features in [16usize, 256, 2048] {
        let data = gen_tile(4, features);
        g.throughput(Throughput::Bytes(data.len() as u64));
        g.bench_with_input(BenchmarkId::from_parameter(features), &features, |b, _| {
            b.iter(|| {
                let tile = Tile::decode(black_box(data.clone())).unwrap();
                tile.preload().unwrap();
                black_box(tile);
            });
        });
    }
    g.finish();
}

fn bench_single_layer_access(c: &mut Criterion) {
    // Lazy access should only pay for the layer that is touched.
    let data = gen_tile(64, 64);
    c.bench_function("last_layer_of_64", |b| {
        b.iter(|| {
            let tile = Tile::decode(black_box(data.clone())).unwrap();
            let layer = tile.layer(63).unwrap();
            black_box(layer.info().unwrap());
        });
    });
}

fn bench_properties(c: &mut Criterion) {
    let data = gen_tile(1, 1024);
    let tile = Tile::decode(data).unwrap();
    tile.preload().unwrap();
    let layer = tile.layer(0).unwrap();
    c.bench_function("resolve_properties_1024_features", |b| {
        b.iter(|| {
            let mut n = 0usize;
            for feature in layer.features().unwrap() {
                n += feature.properties().unwrap().count();
            }
            black_box(n);
        });
    });
}

fn bench_geometry(c: &mut Criterion) {
    let mut g = c.benchmark_group("decode_geometry_vs_points");
    for points in [16usize, 256, 4096] {
        let mut seed = 11u64;
        let data = gen_line(points, &mut seed);
        g.throughput(Throughput::Elements(points as u64));
        g.bench_with_input(BenchmarkId::from_parameter(points), &points, |b, _| {
            b.iter(|| {
                let lines = geometry::decode_geometry(black_box(&data)).unwrap();
                black_box(lines);
            });
        });
    }
    g.finish();
}

criterion_group!(
    benches,
    bench_tile_decode,
    bench_full_parse,
    bench_single_layer_access,
    bench_properties,
    bench_geometry
);
criterion_main!(benches);
