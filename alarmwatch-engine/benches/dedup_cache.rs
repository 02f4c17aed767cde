use alarmwatch_engine::{AlarmKey, AlarmRecord, DedupCache};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use serde_json::json;

/// Benchmark key derivation for each fallback level
fn bench_key_derivation(c: &mut Criterion) {
    let mut group = c.benchmark_group("key_derivation");

    let by_id = AlarmRecord::new(json!({"id": 42, "timestamp": 1700000000, "message": "x"}));
    let by_ts = AlarmRecord::new(json!({"timestamp": 1700000000, "message": "disk full"}));
    let canonical = AlarmRecord::new(json!({
        "level": "critical",
        "source": {"host": "node-3", "rack": 7},
        "tags": ["power", "ups"],
    }));

    group.bench_function("id", |b| b.iter(|| AlarmKey::derive(black_box(&by_id))));
    group.bench_function("timestamp_message", |b| {
        b.iter(|| AlarmKey::derive(black_box(&by_ts)))
    });
    group.bench_function("canonical", |b| {
        b.iter(|| AlarmKey::derive(black_box(&canonical)))
    });
    group.finish();
}

/// Benchmark inserting fresh keys
fn bench_insert_new(c: &mut Criterion) {
    let keys: Vec<AlarmKey> = (0..1000).map(|i| AlarmKey::from(i.to_string())).collect();

    c.bench_function("insert_1000_new", |b| {
        b.iter(|| {
            let mut cache = DedupCache::new();
            for key in &keys {
                cache.insert(black_box(key.clone()));
            }
            cache
        });
    });
}

/// Benchmark re-polling the same alarm list (the common steady state)
fn bench_insert_seen(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert_seen");

    for size in [10usize, 100, 1000].iter() {
        let keys: Vec<AlarmKey> = (0..*size).map(|i| AlarmKey::from(i.to_string())).collect();
        let mut cache = DedupCache::new();
        for key in &keys {
            cache.insert(key.clone());
        }

        group.bench_with_input(BenchmarkId::from_parameter(size), size, |b, _| {
            b.iter(|| {
                for key in &keys {
                    black_box(cache.insert(key.clone()));
                }
            });
        });
    }
    group.finish();
}

/// Benchmark pruning a cache just over the high-water mark
fn bench_prune(c: &mut Criterion) {
    c.bench_function("prune_2001", |b| {
        b.iter_batched(
            || {
                let mut cache = DedupCache::new();
                for i in 0..2001 {
                    cache.insert(AlarmKey::from(i.to_string()));
                }
                cache
            },
            |mut cache| black_box(cache.prune()),
            criterion::BatchSize::SmallInput,
        );
    });
}

criterion_group!(
    benches,
    bench_key_derivation,
    bench_insert_new,
    bench_insert_seen,
    bench_prune,
);

criterion_main!(benches);
