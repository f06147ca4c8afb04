//! Table insert and scan benchmarks.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use quill_bench::flat_document;
use quill_core::Database;
use quill_engine::MemoryEngine;

/// Benchmark successive insertions.
fn bench_table_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_insert");
    group.sample_size(10);

    for size in [1usize, 10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let doc = flat_document(10);
            b.iter(|| {
                let db = Database::new(MemoryEngine::new()).unwrap();
                let tx = db.begin(true).unwrap();
                tx.create_table("bench", None).unwrap();
                let mut table = tx.get_table("bench").unwrap();
                for _ in 0..size {
                    table.insert(black_box(&doc)).unwrap();
                }
            });
        });
    }

    group.finish();
}

/// Benchmark full table scans.
fn bench_table_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("table_scan");
    group.sample_size(10);

    for size in [1usize, 10, 100, 1000] {
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            let db = Database::new(MemoryEngine::new()).unwrap();
            let tx = db.begin(true).unwrap();
            tx.create_table("bench", None).unwrap();
            let mut table = tx.get_table("bench").unwrap();
            let doc = flat_document(10);
            for _ in 0..size {
                table.insert(&doc).unwrap();
            }

            b.iter(|| {
                let mut count = 0;
                table
                    .iterate(|doc| {
                        black_box(doc.key());
                        count += 1;
                        Ok(())
                    })
                    .unwrap();
                black_box(count);
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_table_insert, bench_table_scan);

criterion_main!(benches);
