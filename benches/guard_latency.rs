//! Latency benchmarks for the guard write path and the statistics
//! read path.
//!
//! Run with: `cargo bench --bench guard_latency`

use chrono::{Duration, TimeZone, Utc};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rust_decimal::Decimal;

use riskdesk::{
    Direction, Operation, OperationDraft, OperationResult, RiskConfig, RiskDesk,
    StatisticsAggregator, StatsWindow,
};

const ASSETS: [&str; 4] = ["EUR/USD", "GBP/JPY", "USD/BRL", "AUD/CAD"];

/// Generate a synthetic ledger spread over `days` trading days.
fn generate_ledger(days: u32, per_day: u32) -> Vec<Operation> {
    let mut rng = StdRng::seed_from_u64(42);
    let start = Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap();
    let mut operations = Vec::with_capacity((days * per_day) as usize);

    for day in 0..days {
        for seq in 0..per_day {
            let pnl = Decimal::new(rng.gen_range(-80..80), 0);
            let result = if pnl >= Decimal::ZERO {
                OperationResult::Gain
            } else {
                OperationResult::Loss
            };
            let direction = if rng.gen_bool(0.5) {
                Direction::Call
            } else {
                Direction::Put
            };
            let draft = OperationDraft::new(
                ASSETS[rng.gen_range(0..ASSETS.len())],
                direction,
                result,
                Decimal::new(100, 0),
                pnl,
            )
            .with_timestamp(start + Duration::days(day as i64) + Duration::hours(seq as i64));
            operations.push(draft.into_operation(seq + 1));
        }
    }
    operations
}

/// Benchmark the full submit path: admission checks, ledger append and
/// guard recomputation.
fn bench_submit(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("guard_submit");
    group.throughput(Throughput::Elements(1));

    group.bench_function("submit_one", |b| {
        b.iter_batched(
            || {
                let config = RiskConfig::derive(
                    Decimal::new(1_000_000, 0),
                    Decimal::new(2, 0),
                    Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap().date_naive(),
                )
                .unwrap();
                RiskDesk::new(config).0
            },
            |desk| {
                runtime.block_on(async {
                    let draft = OperationDraft::new(
                        "EUR/USD",
                        Direction::Call,
                        OperationResult::Gain,
                        Decimal::new(100, 0),
                        Decimal::new(1, 0),
                    )
                    .with_timestamp(Utc.with_ymd_and_hms(2025, 1, 1, 9, 0, 0).unwrap());
                    black_box(desk.submit_operation(draft).await.unwrap());
                })
            },
            criterion::BatchSize::SmallInput,
        )
    });

    group.finish();
}

/// Benchmark snapshot computation over ledgers of increasing size.
fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics_snapshot");
    let reference = Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap();

    for days in [30u32, 180, 365].iter() {
        let ledger = generate_ledger(*days, 5);
        group.throughput(Throughput::Elements(ledger.len() as u64));
        group.bench_with_input(
            BenchmarkId::new("all_time", ledger.len()),
            &ledger,
            |b, ledger| {
                b.iter(|| {
                    black_box(StatisticsAggregator::snapshot(
                        black_box(ledger),
                        StatsWindow::AllTime,
                        reference,
                    ))
                })
            },
        );
        group.bench_with_input(
            BenchmarkId::new("month", ledger.len()),
            &ledger,
            |b, ledger| {
                b.iter(|| {
                    black_box(StatisticsAggregator::snapshot(
                        black_box(ledger),
                        StatsWindow::Month,
                        reference,
                    ))
                })
            },
        );
    }

    group.finish();
}

criterion_group!(benches, bench_submit, bench_statistics);
criterion_main!(benches);
