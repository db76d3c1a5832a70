//! Conversion benchmarks
//!
//! Decode should stay flat in the element count (no copy); encode scales
//! with it. Resolution cost is dominated by the number of failed probes.

use bufbridge::interop::{Float32, Float64, OwnedFloat32Array};
use bufbridge::{decode, encode, ElementKind, HeapEngine, Resolver};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn samples(n: usize) -> Vec<f32> {
    (0..n).map(|i| i as f32 * 0.5).collect()
}

fn bench_decode(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode");
    let engine = HeapEngine::new();

    for size in [16, 1_024, 65_536].iter() {
        let value = engine.typed_array_from::<Float32>(&samples(*size));
        group.bench_with_input(BenchmarkId::new("float32", size), size, |b, _| {
            b.iter(|| {
                let seq = decode::<Float32, _>(&engine, black_box(&value)).unwrap();
                black_box(seq.len())
            });
        });
    }

    group.finish();
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode");
    let engine = HeapEngine::new();

    for size in [16, 1_024, 65_536].iter() {
        let owned = OwnedFloat32Array::from_vec(samples(*size));
        group.bench_with_input(BenchmarkId::new("float32", size), size, |b, _| {
            b.iter(|| encode(&engine, black_box(&owned)));
        });
    }

    group.finish();
}

fn bench_resolve(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve");
    let engine = HeapEngine::new();
    let value = engine.typed_array_from::<Float64>(&[1.0; 256]);

    let first = Resolver::from_kinds(&[ElementKind::F64, ElementKind::I16, ElementKind::Bytes]);
    let last = Resolver::from_kinds(&[ElementKind::Bytes, ElementKind::I16, ElementKind::F32, ElementKind::F64]);

    group.bench_function("first_candidate", |b| {
        b.iter(|| first.resolve(&engine, black_box(&value)).unwrap().index)
    });
    group.bench_function("last_candidate", |b| {
        b.iter(|| last.resolve(&engine, black_box(&value)).unwrap().index)
    });

    group.finish();
}

criterion_group!(benches, bench_decode, bench_encode, bench_resolve);
criterion_main!(benches);
