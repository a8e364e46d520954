use std::io::Cursor;
use std::path::PathBuf;

use cggtts::Cggtts;
use criterion::{criterion_group, criterion_main, Criterion, Throughput};

fn fixture_path(name: &str) -> PathBuf {
    let mut path = PathBuf::from(std::env::var("CARGO_MANIFEST_DIR").unwrap());
    path.push("tests/fixtures");
    path.push(name);
    path
}

fn bench_decode(c: &mut Criterion) {
    let content = std::fs::read_to_string(fixture_path("opmt_gps_2e.cggtts")).unwrap();
    let mut group = c.benchmark_group("decode");
    group.throughput(Throughput::Bytes(content.len() as u64));
    group.bench_function("document", |b| {
        b.iter(|| {
            let cgg = Cggtts::parse(Cursor::new(content.as_bytes())).unwrap();
            assert_eq!(cgg.tracks.len(), 3);
        });
    });
    group.finish();
}

criterion_group!(benches, bench_decode);
criterion_main!(benches);
