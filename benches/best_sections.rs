//! Benchmark the best-section sliding window over a long activity.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use tracevault::{best_sections, default_sections, TraceSeries};

/// One hour at 1 Hz, steady 5 m/s with a rolling altitude profile.
fn long_series(points: usize) -> TraceSeries {
    let mut series = TraceSeries::default();
    for i in 0..points {
        series.timestamps.push(1_700_000_000 + i as i64);
        series.latitude.push(Some(47.0 + i as f64 * 1e-5));
        series.longitude.push(Some(8.0));
        series.distance.push(Some(i as f64 * 5.0));
        series.altitude.push(Some(500.0 + (i as f64 / 50.0).sin() * 40.0));
        series.heart_rate.push(Some(140.0));
        series.cadence.push(Some(88.0));
        series.speed.push(Some(5.0));
        series.temperature.push(Some(15.0));
    }
    series
}

fn bench_best_sections(c: &mut Criterion) {
    let series = long_series(3_600);
    let defs = default_sections();

    c.bench_function("best_sections_1h", |b| {
        b.iter(|| best_sections(black_box(&series), black_box(&defs)))
    });

    let long = long_series(36_000);
    c.bench_function("best_sections_10h", |b| {
        b.iter(|| best_sections(black_box(&long), black_box(&defs)))
    });
}

criterion_group!(benches, bench_best_sections);
criterion_main!(benches);
