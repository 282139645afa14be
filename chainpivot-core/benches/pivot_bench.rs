//! Criterion benchmarks for the reshaping hot paths.
//!
//! 1. Ticker decoding
//! 2. Catalog build over a full option chain
//! 3. Pivot of one trading day
//! 4. Dynamic reconciliation of the pivoted tables

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use chainpivot_core::{
    decode, pivot, reconcile, ColumnNamer, ContractCatalog, DuplicatePolicy, ExpiryPolicy,
    FieldLabel, MissingFill, RawQuote, SchemaMode, TickerDecoder,
};
use chrono::{Duration, NaiveDate};

const SYMBOLS: [&str; 5] = ["TCS", "INFY", "BAJAJ-AUTO", "M&M", "RELIANCE"];

// ── Helpers ──────────────────────────────────────────────────────────

fn chain_tickers(strikes: u32) -> Vec<String> {
    let mut tickers = Vec::new();
    for sym in SYMBOLS {
        for series in ["I", "II", "III"] {
            tickers.push(format!("{sym}-{series}.NFO"));
        }
        for i in 0..strikes {
            let strike = 1000 + i * 20;
            tickers.push(format!("{sym}25NOV25{strike}CE.NFO"));
            tickers.push(format!("{sym}25NOV25{strike}PE.NFO"));
        }
    }
    tickers
}

fn make_quotes(minutes: i64, strikes: u32) -> Vec<RawQuote> {
    let open = NaiveDate::from_ymd_opt(2025, 10, 31)
        .unwrap()
        .and_hms_opt(9, 15, 59)
        .unwrap();
    let close: FieldLabel = "Close".into();
    let volume: FieldLabel = "Volume".into();
    let tickers = chain_tickers(strikes);
    let mut quotes = Vec::with_capacity(tickers.len() * minutes as usize);
    for m in 0..minutes {
        let ts = open + Duration::minutes(m);
        for (i, ticker) in tickers.iter().enumerate() {
            let px = 100.0 + (i as f64 * 0.1 + m as f64 * 0.01).sin() * 10.0;
            quotes.push(
                RawQuote::new(ticker.as_str(), ts)
                    .with_value(close.clone(), px)
                    .with_value(volume.clone(), 1000.0),
            );
        }
    }
    quotes
}

fn build_catalog(quotes: &[RawQuote]) -> ContractCatalog {
    ContractCatalog::build(
        quotes.iter().map(|q| q.ticker.as_str()),
        &TickerDecoder::default(),
        ExpiryPolicy::Reject,
    )
    .unwrap()
}

// ── 1. Decoding ──────────────────────────────────────────────────────

fn bench_decode(c: &mut Criterion) {
    let tickers = chain_tickers(40);
    c.bench_function("decode_chain", |b| {
        b.iter(|| {
            for t in &tickers {
                black_box(decode(black_box(t)));
            }
        })
    });
}

// ── 2. Catalog ───────────────────────────────────────────────────────

fn bench_catalog(c: &mut Criterion) {
    let quotes = make_quotes(30, 40);
    c.bench_function("catalog_build", |b| b.iter(|| build_catalog(black_box(&quotes))));
}

// ── 3. Pivot ─────────────────────────────────────────────────────────

fn bench_pivot(c: &mut Criterion) {
    let mut group = c.benchmark_group("pivot");
    for minutes in [30_i64, 375] {
        let quotes = make_quotes(minutes, 40);
        let catalog = build_catalog(&quotes);
        let namer = ColumnNamer::default();
        group.bench_with_input(BenchmarkId::from_parameter(minutes), &quotes, |b, q| {
            b.iter(|| pivot(black_box(q), &catalog, &namer, DuplicatePolicy::LastWins))
        });
    }
    group.finish();
}

// ── 4. Reconcile ─────────────────────────────────────────────────────

fn bench_reconcile(c: &mut Criterion) {
    let quotes = make_quotes(375, 40);
    let catalog = build_catalog(&quotes);
    let out = pivot(&quotes, &catalog, &ColumnNamer::default(), DuplicatePolicy::LastWins);
    let day = NaiveDate::from_ymd_opt(2025, 10, 31).unwrap();
    c.bench_function("reconcile_dynamic", |b| {
        b.iter(|| {
            for table in out.tables.values() {
                black_box(reconcile(
                    table.clone(),
                    &SchemaMode::Dynamic,
                    MissingFill::Null,
                    day,
                ));
            }
        })
    });
}

criterion_group!(benches, bench_decode, bench_catalog, bench_pivot, bench_reconcile);
criterion_main!(benches);
