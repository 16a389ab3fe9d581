//! Performance benchmarks for the statistics and configuration paths
//!
//! Network time dominates a real run; these benchmarks keep the pure
//! computations honest as sample counts grow.

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion};
use speedtest_publisher::{
    models::{Config, RunResult},
    stats,
    IterationPlan,
};
use std::collections::HashMap;
use std::hint::black_box;

/// Deterministic pseudo-random scores in a realistic range
fn create_sample_scores(count: usize) -> Vec<f64> {
    (0..count)
        .map(|i| 5.0 + ((i * 7919) % 1000) as f64 / 10.0)
        .collect()
}

fn benchmark_percentile(c: &mut Criterion) {
    let mut group = c.benchmark_group("percentile");

    for size in [10, 30, 100, 1000].iter() {
        let scores = create_sample_scores(*size);

        group.bench_with_input(BenchmarkId::new("p90", size), size, |b, _| {
            b.iter(|| black_box(stats::percentile(black_box(&scores), 90.0)));
        });

        group.bench_with_input(BenchmarkId::new("median", size), size, |b, _| {
            b.iter(|| black_box(stats::median(black_box(&scores))));
        });
    }

    group.finish();
}

fn benchmark_jitter(c: &mut Criterion) {
    let mut group = c.benchmark_group("jitter");

    for size in [20, 200, 2000].iter() {
        let samples = create_sample_scores(*size);
        group.bench_with_input(BenchmarkId::new("jitter", size), size, |b, _| {
            b.iter(|| black_box(stats::jitter(black_box(&samples))));
        });
    }

    group.finish();
}

fn benchmark_config_parsing(c: &mut Criterion) {
    let env: HashMap<String, String> = [
        ("MQTT_SERVER", "broker.lan"),
        ("PING_COUNT", "20"),
        ("PERCENTILE", "90"),
        ("DOWNLOAD_ITERATIONS", "10,8,6,4,2"),
        ("UPLOAD_ITERATIONS", "8,6,4,2"),
    ]
    .iter()
    .map(|(k, v)| (k.to_string(), v.to_string()))
    .collect();

    c.bench_function("config_merge_and_validate", |b| {
        b.iter(|| {
            let mut config = Config::default();
            config.merge_from_lookup(|key| env.get(key).cloned()).ok();
            black_box(config.validate().is_ok())
        });
    });

    c.bench_function("iteration_plan_parse", |b| {
        b.iter(|| black_box("10,8,6,4,2,1,1,1,1".parse::<IterationPlan>()));
    });
}

fn benchmark_payload_serialization(c: &mut Criterion) {
    let result = RunResult::new(12.345, 1.234, 456.789, 98.765);

    c.bench_function("attributes_json", |b| {
        b.iter(|| black_box(result.attributes_json()));
    });
}

criterion_group!(
    benches,
    benchmark_percentile,
    benchmark_jitter,
    benchmark_config_parsing,
    benchmark_payload_serialization
);

criterion_main!(benches);
