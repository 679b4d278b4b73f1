//! Traversal benchmarks over the long fixture manifest.
//!
//! Run with:
//! ```bash
//! cargo bench --bench traversal
//! ```

#![allow(clippy::expect_used)]

use criterion::{Criterion, criterion_group, criterion_main};
use keep_manifest::Manifest;
use std::hint::black_box;
use std::path::Path;

fn load_long_manifest() -> Manifest {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("test_fixtures/long_manifest");
    let text = std::fs::read_to_string(path).expect("Failed to read long_manifest fixture");
    Manifest::new(text)
}

fn bench_stream_iter(c: &mut Criterion) {
    let manifest = load_long_manifest();
    c.bench_function("stream_iter/long_manifest", |b| {
        b.iter(|| {
            let count = black_box(&manifest)
                .stream_iter()
                .filter(Result::is_ok)
                .count();
            black_box(count)
        });
    });
}

fn bench_block_iter(c: &mut Criterion) {
    let manifest = load_long_manifest();
    let mut group = c.benchmark_group("block_iter");
    group.bench_function("with_duplicates", |b| {
        b.iter(|| {
            let bytes: u64 = black_box(&manifest)
                .block_iter_with_duplicates()
                .filter_map(Result::ok)
                .map(|locator| locator.size)
                .sum();
            black_box(bytes)
        });
    });
    group.bench_function("unique", |b| {
        b.iter(|| {
            let count = black_box(&manifest)
                .unique_block_iter()
                .filter(Result::is_ok)
                .count();
            black_box(count)
        });
    });
    group.finish();
}

criterion_group!(benches, bench_stream_iter, bench_block_iter);
criterion_main!(benches);
