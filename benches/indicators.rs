//! Benchmarks for indicator calculation

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use tradewatch::indicators::{
    analyze_closes, bollinger, detect_crash_reversal, rsi, CrashParams, BOLLINGER_STD_DEV,
    BOLLINGER_WINDOW, RSI_PERIOD,
};
use tradewatch::venue::Candle;

fn closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| 50_000.0 + (i as f64 * 0.7).sin() * 250.0 + i as f64 * 3.0)
        .collect()
}

fn candles(n: usize) -> Vec<Candle> {
    let start = Utc.timestamp_opt(1_700_000_000, 0).unwrap();
    closes(n)
        .into_iter()
        .enumerate()
        .map(|(i, close)| Candle {
            open_time: start + Duration::minutes(i as i64),
            open: close,
            high: close + 10.0,
            low: close - 10.0,
            close,
            volume: 5.0 + (i % 7) as f64,
        })
        .collect()
}

fn benchmark_rsi(c: &mut Criterion) {
    let data = closes(50);
    c.bench_function("rsi_14", |b| b.iter(|| rsi(black_box(&data), RSI_PERIOD)));
}

fn benchmark_bollinger(c: &mut Criterion) {
    let data = closes(50);
    c.bench_function("bollinger_20", |b| {
        b.iter(|| bollinger(black_box(&data), BOLLINGER_WINDOW, BOLLINGER_STD_DEV))
    });
}

fn benchmark_analysis(c: &mut Criterion) {
    let data = closes(50);
    c.bench_function("market_analysis", |b| {
        b.iter(|| analyze_closes(black_box(&data)))
    });
}

fn benchmark_crash_detection(c: &mut Criterion) {
    let data = candles(50);
    let params = CrashParams::default();
    c.bench_function("crash_reversal", |b| {
        b.iter(|| detect_crash_reversal(black_box(&data), &params))
    });
}

criterion_group!(
    benches,
    benchmark_rsi,
    benchmark_bollinger,
    benchmark_analysis,
    benchmark_crash_detection
);
criterion_main!(benches);
