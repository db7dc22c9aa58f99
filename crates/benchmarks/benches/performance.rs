use criterion::{
    black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput,
};
use meigen_core::{check_data_integrity, validate_quotes};
use serde_json::Value;

use meigen_benchmarks::{
    datasets::{generate_quotes, write_json_dataset},
    harness::{measure_cold_load, measure_filter, runtime, WarmStack},
};

const DATASET_SIZES: [usize; 3] = [1_000, 10_000, 50_000];

fn bench_validate(c: &mut Criterion) {
    let mut group = c.benchmark_group("validate_quotes");
    for &size in &DATASET_SIZES {
        let dataset = Value::Array(generate_quotes(size, size as u64));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &dataset, |b, data| {
            b.iter(|| black_box(validate_quotes(data).expect("valid dataset").len()));
        });
    }
    group.finish();

    let mut integrity = c.benchmark_group("integrity_report");
    for &size in &DATASET_SIZES {
        let records = generate_quotes(size, (size as u64) + 1);
        integrity.throughput(Throughput::Elements(size as u64));
        integrity.bench_with_input(BenchmarkId::from_parameter(size), &records, |b, data| {
            b.iter(|| black_box(check_data_integrity(data).quality_score));
        });
    }
    integrity.finish();
}

fn bench_cold_load(c: &mut Criterion) {
    let rt = runtime();
    let mut group = c.benchmark_group("cold_load_file");
    for &size in &DATASET_SIZES {
        let file = write_json_dataset(&generate_quotes(size, (size as u64) + 7));
        group.throughput(Throughput::Elements(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &file, |b, file| {
            b.iter(|| black_box(measure_cold_load(&rt, file.path())));
        });
    }
    group.finish();
}

fn bench_filter(c: &mut Criterion) {
    let mut group = c.benchmark_group("filter_tags");
    for &size in &DATASET_SIZES {
        let stack = WarmStack::new(&generate_quotes(size, (size as u64) + 11));
        for (label, exact) in [("substring", false), ("exact", true)] {
            group.bench_with_input(BenchmarkId::new(label, size), &stack, |b, stack| {
                b.iter(|| black_box(measure_filter(&stack.quotes, "努力", exact)));
            });
        }
    }
    group.finish();
}

fn bench_random(c: &mut Criterion) {
    let stack = WarmStack::new(&generate_quotes(10_000, 13));
    c.bench_function("random_quote_warm", |b| {
        b.iter(|| {
            let quote = stack
                .runtime
                .block_on(stack.service.random_quote())
                .expect("random quote");
            black_box(quote.id)
        });
    });
}

fn benches(c: &mut Criterion) {
    bench_validate(c);
    bench_cold_load(c);
    bench_filter(c);
    bench_random(c);
}

criterion_group!(meigen_benches, benches);
criterion_main!(meigen_benches);
