use chrono::NaiveDate;
use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use sentiment_dashboard::aggregate::aggregate;
use sentiment_dashboard::classify::classify;
use sentiment_dashboard::filter::filter;
use sentiment_dashboard::generator::{to_csv_bytes, SampleGenerator};
use sentiment_dashboard::loader::Dataset;
use sentiment_dashboard::types::{SentimentKind, SentimentSelector, ViewQuery};
use sentiment_dashboard::views;

fn start() -> NaiveDate {
    NaiveDate::from_ymd_opt(2015, 1, 1).unwrap()
}

fn dataset(days: usize) -> Dataset {
    let rows = SampleGenerator::new(1).generate(start(), days);
    Dataset::from_csv_bytes(&to_csv_bytes(&rows).unwrap()).unwrap()
}

fn load_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("load_csv");
    for days in [365, 1825, 3650] {
        let rows = SampleGenerator::new(1).generate(start(), days);
        let bytes = to_csv_bytes(&rows).unwrap();
        group.throughput(Throughput::Elements(rows.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(days), &bytes, |b, bytes| {
            b.iter(|| Dataset::from_csv_bytes(bytes).unwrap());
        });
    }
    group.finish();
}

fn query_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("queries");
    for days in [365, 1825, 3650] {
        let ds = dataset(days);
        let end = ds.date_bounds().unwrap().1;
        group.throughput(Throughput::Elements(ds.len() as u64));

        group.bench_with_input(BenchmarkId::new("filter", days), &ds, |b, ds| {
            b.iter(|| filter(ds, "MSFT", start(), end));
        });
        group.bench_with_input(BenchmarkId::new("classify", days), &ds, |b, ds| {
            let rows = filter(ds, "MSFT", start(), end);
            b.iter(|| classify(&rows, SentimentSelector::Explicit(SentimentKind::Positive), 0.4));
        });
        group.bench_with_input(BenchmarkId::new("aggregate", days), &ds, |b, ds| {
            let rows = filter(ds, "MSFT", start(), end);
            b.iter(|| aggregate(&rows));
        });
    }
    group.finish();
}

fn full_snapshot(c: &mut Criterion) {
    let ds = dataset(3650);
    let query = ViewQuery {
        stock: "AAPL".into(),
        selector: SentimentSelector::AutoMax,
        threshold: 0.7,
        start: start(),
        end: ds.date_bounds().unwrap().1,
    };

    c.bench_function("snapshot", |b| {
        b.iter(|| views::snapshot(&ds, &query));
    });
}

criterion_group!(benches, load_throughput, query_throughput, full_snapshot);
criterion_main!(benches);
