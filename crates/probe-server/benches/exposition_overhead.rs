// Cost of encoding a scrape as the target count grows

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use probe::{DEFAULT_STATUS_CODES, MetricsStore, Target};
use probe_server::metrics::MetricsRegistry;
use std::hint::black_box;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

fn populated_store(count: usize) -> Arc<MetricsStore> {
    let store = Arc::new(MetricsStore::new());
    let targets: Vec<Target> = (0..count)
        .map(|i| Target::from(format!("http://target-{}.test/health", i)))
        .collect();
    store.register(&targets);

    for (i, target) in targets.iter().enumerate() {
        if i % 5 == 0 {
            store.record_failure(target, SystemTime::now());
        } else {
            store.record_success(target, 200, 20 + i as u64 % 50, SystemTime::now());
        }
    }
    store.record_round(Duration::from_millis(120), SystemTime::now());
    store
}

fn bench_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("exposition_encode");

    for count in [10, 100, 1000].iter() {
        let registry = MetricsRegistry::new(populated_store(*count), &DEFAULT_STATUS_CODES);
        group.bench_with_input(BenchmarkId::from_parameter(count), count, |b, _| {
            b.iter(|| black_box(registry.encode()));
        });
    }

    group.finish();
}

fn bench_encode_while_recording(c: &mut Criterion) {
    let mut group = c.benchmark_group("exposition_concurrent");
    let store = populated_store(100);
    let registry = MetricsRegistry::new(store.clone(), &DEFAULT_STATUS_CODES);
    let target = Target::from("http://target-1.test/health");

    // A writer folding outcomes between scrapes
    group.bench_function("record_then_encode", |b| {
        b.iter(|| {
            store.record_success(black_box(&target), 503, 12, SystemTime::now());
            black_box(registry.encode())
        });
    });

    group.finish();
}

criterion_group!(benches, bench_encode, bench_encode_while_recording);
criterion_main!(benches);
