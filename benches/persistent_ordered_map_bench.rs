//! Benchmark for PersistentOrderedMap vs standard BTreeMap.
//!
//! Compares insertion and lookup costs of the versioned map against
//! Rust's standard BTreeMap, and measures lookups into old versions.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use fatmap::config::{MapConfig, ModificationBudget};
use fatmap::persistent::{PersistentOrderedMap, Version};
use std::collections::BTreeMap;
use std::hint::black_box;

// =============================================================================
// insert Benchmark
// =============================================================================

fn benchmark_insert(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("insert");

    for size in [100, 1000] {
        group.bench_with_input(
            BenchmarkId::new("PersistentOrderedMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = PersistentOrderedMap::new();
                    for index in 0..size {
                        map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("BTreeMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut map = BTreeMap::new();
                    for index in 0..size {
                        map.insert(black_box(index), black_box(index * 2));
                    }
                    black_box(map)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// update Benchmark
// =============================================================================

fn benchmark_update_rounds(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("update_rounds");

    for budget in [ModificationBudget::Shared, ModificationBudget::PerField] {
        group.bench_with_input(
            BenchmarkId::new("PersistentOrderedMap", format!("{budget:?}")),
            &budget,
            |bencher, &budget| {
                bencher.iter(|| {
                    let config = MapConfig::new().with_budget(budget);
                    let mut map = PersistentOrderedMap::with_config(config);
                    for round in 0..8 {
                        for key in 0..128 {
                            map.insert(black_box(key), black_box(round));
                        }
                    }
                    black_box(map.statistics())
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// get Benchmark
// =============================================================================

fn benchmark_get(criterion: &mut Criterion) {
    let mut group = criterion.benchmark_group("get");

    for size in [100, 1000] {
        let mut persistent_map = PersistentOrderedMap::new();
        for index in 0..size {
            persistent_map.insert(index, index * 2);
        }
        let checkpoint = persistent_map.current_version();
        for index in 0..size {
            persistent_map.insert(index, index * 3);
        }
        let standard_map: BTreeMap<i32, i32> = (0..size).map(|index| (index, index * 2)).collect();

        group.bench_with_input(
            BenchmarkId::new("PersistentOrderedMap/latest", size),
            &size,
            |bencher, &size| {
                let latest = persistent_map.current_version();
                bencher.iter(|| {
                    let mut sum = 0;
                    for key in 0..size {
                        sum += persistent_map.search(&black_box(key), latest);
                    }
                    black_box(sum)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("PersistentOrderedMap/checkpoint", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sum = 0;
                    for key in 0..size {
                        sum += persistent_map.search(&black_box(key), black_box(checkpoint));
                    }
                    black_box(sum)
                });
            },
        );

        group.bench_with_input(
            BenchmarkId::new("BTreeMap", size),
            &size,
            |bencher, &size| {
                bencher.iter(|| {
                    let mut sum = 0;
                    for key in 0..size {
                        if let Some(&value) = standard_map.get(&black_box(key)) {
                            sum += value;
                        }
                    }
                    black_box(sum)
                });
            },
        );
    }

    group.finish();
}

// =============================================================================
// snapshot Benchmark
// =============================================================================

fn benchmark_snapshot_iter(criterion: &mut Criterion) {
    let map: PersistentOrderedMap<i32, i32> = (0..1000).map(|index| (index, index)).collect();

    criterion.bench_function("snapshot_iter/midpoint", |bencher| {
        bencher.iter(|| {
            let snapshot = map.snapshot(black_box(Version::new(500))).unwrap();
            black_box(snapshot.iter().map(|(_, value)| *value).sum::<i32>())
        });
    });
}

criterion_group!(
    benches,
    benchmark_insert,
    benchmark_update_rounds,
    benchmark_get,
    benchmark_snapshot_iter
);
criterion_main!(benches);
