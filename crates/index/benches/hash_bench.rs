//! Benchmarks for HashIndex lookups and row shifting.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use strata_index::{HashIndex, SearchIndex};

fn build(rows: usize) -> HashIndex<i64> {
    HashIndex::from_entries((0..rows).map(|r| ((r % 1000) as i64, r)))
}

fn hash_lookup_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_index_lookup");
    for rows in [1_000usize, 10_000, 100_000] {
        let index = build(rows);
        group.bench_with_input(BenchmarkId::new("find_first", rows), &index, |b, index| {
            b.iter(|| black_box(index.find_first(&black_box(500))))
        });
    }
    group.finish();
}

fn hash_shift_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_index_shift");
    for rows in [1_000usize, 10_000] {
        group.bench_with_input(BenchmarkId::new("shift_down", rows), &rows, |b, &rows| {
            b.iter_batched(
                || build(rows),
                |mut index| {
                    index.remove(&0, 0);
                    index.shift_down(0);
                    index
                },
                criterion::BatchSize::SmallInput,
            )
        });
    }
    group.finish();
}

criterion_group!(benches, hash_lookup_benchmark, hash_shift_benchmark);
criterion_main!(benches);
