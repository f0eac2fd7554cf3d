//! Benchmark for PersistentOrderedSet.
//!
//! Measures path-copying insert and delete against a pseudo-random key
//! order (which keeps the unbalanced tree shallow), plus lookups at old
//! versions.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use persistent_history::persistent::PersistentOrderedSet;
use std::hint::black_box;

type KeyedSet = PersistentOrderedSet<u64, fn(&u64, &str) -> String>;

fn key_of(record: &u64, _field: &str) -> String {
    format!("{record:016x}")
}

/// Multiplicative scramble so consecutive indices land far apart in key order.
fn scrambled(index: u64) -> u64 {
    index.wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

fn build_set(size: u64) -> KeyedSet {
    let mut set: KeyedSet =
        PersistentOrderedSet::new("key", key_of as fn(&u64, &str) -> String);
    set.extend((0..size).map(scrambled));
    set
}

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("ordered_set_insert");

    for size in [100_u64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("insert", size), &size, |bencher, &size| {
            bencher.iter(|| black_box(build_set(size)));
        });
    }

    group.finish();
}

// =============================================================================
// delete Benchmark
// =============================================================================

fn benchmark_delete(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("ordered_set_delete");

    for size in [100_u64, 1000, 10000] {
        group.bench_with_input(BenchmarkId::new("delete_all", size), &size, |bencher, &size| {
            bencher.iter_batched(
                || build_set(size),
                |mut set| {
                    for index in 0..size {
                        let _ = black_box(set.delete(&scrambled(index)));
                    }
                    set
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }

    group.finish();
}

// =============================================================================
// find Benchmark
// =============================================================================

fn benchmark_find_at(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("ordered_set_find_at");

    for size in [100_u64, 1000, 10000] {
        let set = build_set(size);
        let middle = usize::try_from(size / 2).unwrap_or(usize::MAX);

        group.bench_with_input(BenchmarkId::new("find_at_middle", size), &size, |bencher, &size| {
            bencher.iter(|| {
                for index in 0..size {
                    black_box(set.find_at(&scrambled(index), middle).ok());
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("get_all_elements", size), &size, |bencher, _| {
            bencher.iter(|| black_box(set.get_all_elements().len()));
        });
    }

    group.finish();
}

criterion_group!(benches, benchmark_insert, benchmark_delete, benchmark_find_at);
criterion_main!(benches);
