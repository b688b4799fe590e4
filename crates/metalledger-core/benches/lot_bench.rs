//! Lot selection and consumption benchmarks.
//!
//! Run with: cargo bench -p metalledger-core

#![allow(missing_docs)]

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};

use chrono::{NaiveDate, NaiveDateTime};
use metalledger_core::{Commodity, Lot, LotLedger};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(day: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 1, 1 + day % 28)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap()
}

/// Generate a ledger with N lots of 10 units each.
fn generate_ledger(num_lots: usize) -> LotLedger {
    LotLedger::from_lots(
        (0..num_lots)
            .map(|i| Lot::new(dec!(10), dec!(100) + Decimal::from(i), "Acme", date(i as u32)))
            .collect(),
    )
}

fn bench_add_lot(c: &mut Criterion) {
    let mut group = c.benchmark_group("add_lot");

    for size in [10, 100, 1000] {
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, &size| {
            b.iter(|| {
                let mut commodity =
                    Commodity::new("Copper", Lot::new(dec!(10), dec!(100), "Acme", date(0)))
                        .unwrap();
                for i in 1..size {
                    commodity
                        .add_lot(Lot::new(dec!(10), dec!(100) + Decimal::from(i), "Acme", date(i)))
                        .unwrap();
                }
                black_box(commodity)
            });
        });
    }

    group.finish();
}

fn bench_select(c: &mut Criterion) {
    let mut group = c.benchmark_group("select");

    for size in [10, 100, 1000] {
        let ledger = generate_ledger(size);
        // Half the stock, so roughly half the lots are drawn
        let request = Decimal::from(size * 5);

        group.bench_with_input(BenchmarkId::new("fifo", size), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.select(black_box(request), None)));
        });
        group.bench_with_input(BenchmarkId::new("preferred", size), &ledger, |b, ledger| {
            b.iter(|| black_box(ledger.select(black_box(request), Some(size - 1))));
        });
    }

    group.finish();
}

fn bench_consume(c: &mut Criterion) {
    let mut group = c.benchmark_group("consume");

    for size in [10, 100, 1000] {
        let ledger = generate_ledger(size);
        let request = Decimal::from(size * 5);

        group.bench_with_input(BenchmarkId::from_parameter(size), &ledger, |b, ledger| {
            b.iter(|| {
                let mut ledger = ledger.clone();
                let plan = ledger.select(request, None);
                ledger.apply(&plan);
                black_box(ledger)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_add_lot, bench_select, bench_consume);
criterion_main!(benches);
