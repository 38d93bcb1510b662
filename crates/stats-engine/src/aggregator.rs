//! Windowed statistics over journaled operations.

use chrono::{DateTime, Datelike, Timelike, Utc};
use journal_core::types::{Direction, Operation};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::debug;

/// Time window a snapshot covers, anchored at a reference time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StatsWindow {
    /// The reference calendar day.
    Day,
    /// The reference calendar month.
    Month,
    /// The reference calendar year.
    Year,
    AllTime,
}

/// Win/loss rollup for one bucket of operations.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BucketStats {
    pub wins: u32,
    pub losses: u32,
    /// Percent of operations that were wins; zero when empty.
    pub win_rate_pct: Decimal,
    pub pnl: Decimal,
    pub total: u32,
}

impl BucketStats {
    fn add(&mut self, op: &Operation) {
        if op.is_win() {
            self.wins += 1;
        } else {
            self.losses += 1;
        }
        self.total += 1;
        self.pnl += op.pnl;
    }

    fn finalize(&mut self) {
        if self.total > 0 {
            self.win_rate_pct =
                Decimal::from(self.wins) / Decimal::from(self.total) * Decimal::ONE_HUNDRED;
        }
    }
}

/// Per-month rollup for the annual breakdown.
#[derive(Debug, Clone, Serialize)]
pub struct MonthBreakdown {
    /// Calendar month, 1..=12.
    pub month: u32,
    pub pnl: Decimal,
    pub operation_count: u32,
}

/// Statistics for one window. Derived, never stored.
#[derive(Debug, Clone, Serialize)]
pub struct StatisticsSnapshot {
    pub window: StatsWindow,
    /// Anchor the window was resolved against.
    pub reference_time: DateTime<Utc>,
    pub total_operations: u32,
    pub wins: u32,
    pub losses: u32,
    pub win_rate_pct: Decimal,
    pub total_pnl: Decimal,
    /// Buckets keyed by asset symbol.
    pub by_asset: BTreeMap<String, BucketStats>,
    /// Buckets keyed by direction ("call" / "put").
    pub by_direction: BTreeMap<String, BucketStats>,
    /// Buckets keyed by UTC hour of day (0..=23).
    pub by_hour: BTreeMap<u32, BucketStats>,
    /// Buckets keyed by weekday, 0 = Sunday.
    pub by_weekday: BTreeMap<u32, BucketStats>,
    /// Asset with the highest accumulated pnl in the window.
    pub most_profitable_asset: Option<String>,
    /// Asset with the lowest accumulated pnl in the window.
    pub least_profitable_asset: Option<String>,
    /// Total pnl divided by the number of distinct days with activity.
    pub avg_pnl_per_active_day: Decimal,
    /// Total pnl divided by the number of distinct months with activity.
    pub avg_pnl_per_active_month: Decimal,
    /// Per-month pnl and counts for the reference year, months 1..=12.
    /// Populated for Year and AllTime windows.
    pub monthly_breakdown: Vec<MonthBreakdown>,
}

impl StatisticsSnapshot {
    /// Asset ranking by win rate, best first. Ties keep map order; no
    /// sample-size tie-break.
    pub fn asset_ranking(&self) -> Vec<(&str, &BucketStats)> {
        ranked(&self.by_asset)
            .into_iter()
            .map(|(k, v)| (k.as_str(), v))
            .collect()
    }

    /// Best asset by win rate, if any operations exist.
    pub fn best_asset(&self) -> Option<&str> {
        self.asset_ranking().first().map(|(k, _)| *k)
    }

    /// Worst asset by win rate.
    pub fn worst_asset(&self) -> Option<&str> {
        self.asset_ranking().last().map(|(k, _)| *k)
    }

    /// Hour of day with the highest win rate.
    pub fn best_hour(&self) -> Option<u32> {
        ranked(&self.by_hour).first().map(|(k, _)| **k)
    }

    /// Hour of day with the lowest win rate.
    pub fn worst_hour(&self) -> Option<u32> {
        ranked(&self.by_hour).last().map(|(k, _)| **k)
    }

    /// Weekdays by win rate, best first. 0 = Sunday.
    pub fn weekday_ranking(&self) -> Vec<(u32, &BucketStats)> {
        ranked(&self.by_weekday)
            .into_iter()
            .map(|(k, v)| (*k, v))
            .collect()
    }

    /// Win rate for one direction; zero with no such operations.
    pub fn direction_win_rate(&self, direction: Direction) -> Decimal {
        let key = match direction {
            Direction::Call => "call",
            Direction::Put => "put",
        };
        self.by_direction
            .get(key)
            .map(|b| b.win_rate_pct)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Buckets sorted by win rate descending. Equal rates keep the map's
/// key order regardless of sample size.
fn ranked<K: Ord>(buckets: &BTreeMap<K, BucketStats>) -> Vec<(&K, &BucketStats)> {
    let mut entries: Vec<(&K, &BucketStats)> = buckets.iter().collect();
    entries.sort_by(|a, b| b.1.win_rate_pct.cmp(&a.1.win_rate_pct));
    entries
}

/// The statistics aggregator. Stateless; every call recomputes from the
/// operations it is handed.
pub struct StatisticsAggregator;

impl StatisticsAggregator {
    /// Build a snapshot of `operations` restricted to `window` around
    /// `reference_time`.
    pub fn snapshot(
        operations: &[Operation],
        window: StatsWindow,
        reference_time: DateTime<Utc>,
    ) -> StatisticsSnapshot {
        let reference_date = reference_time.date_naive();
        let in_window: Vec<&Operation> = operations
            .iter()
            .filter(|op| {
                let d = op.timestamp.date_naive();
                match window {
                    StatsWindow::Day => d == reference_date,
                    StatsWindow::Month => {
                        d.year() == reference_date.year() && d.month() == reference_date.month()
                    }
                    StatsWindow::Year => d.year() == reference_date.year(),
                    StatsWindow::AllTime => true,
                }
            })
            .collect();

        debug!(
            ?window,
            operations = in_window.len(),
            "Computing statistics snapshot"
        );

        let mut overall = BucketStats::default();
        let mut by_asset: BTreeMap<String, BucketStats> = BTreeMap::new();
        let mut by_direction: BTreeMap<String, BucketStats> = BTreeMap::new();
        let mut by_hour: BTreeMap<u32, BucketStats> = BTreeMap::new();
        let mut by_weekday: BTreeMap<u32, BucketStats> = BTreeMap::new();
        let mut active_days = std::collections::BTreeSet::new();
        let mut active_months = std::collections::BTreeSet::new();

        for op in &in_window {
            overall.add(op);
            by_asset.entry(op.asset.clone()).or_default().add(op);
            let direction_key = match op.direction {
                Direction::Call => "call",
                Direction::Put => "put",
            };
            by_direction
                .entry(direction_key.to_string())
                .or_default()
                .add(op);
            by_hour.entry(op.timestamp.hour()).or_default().add(op);
            by_weekday
                .entry(op.timestamp.weekday().num_days_from_sunday())
                .or_default()
                .add(op);

            let d = op.timestamp.date_naive();
            active_days.insert(d);
            active_months.insert((d.year(), d.month()));
        }

        overall.finalize();
        for bucket in by_asset
            .values_mut()
            .chain(by_direction.values_mut())
            .chain(by_hour.values_mut())
            .chain(by_weekday.values_mut())
        {
            bucket.finalize();
        }

        let most_profitable_asset = by_asset
            .iter()
            .max_by_key(|(_, b)| b.pnl)
            .map(|(k, _)| k.clone());
        let least_profitable_asset = by_asset
            .iter()
            .min_by_key(|(_, b)| b.pnl)
            .map(|(k, _)| k.clone());

        let avg_pnl_per_active_day = if active_days.is_empty() {
            Decimal::ZERO
        } else {
            overall.pnl / Decimal::from(active_days.len() as u64)
        };
        let avg_pnl_per_active_month = if active_months.is_empty() {
            Decimal::ZERO
        } else {
            overall.pnl / Decimal::from(active_months.len() as u64)
        };

        let monthly_breakdown = match window {
            StatsWindow::Year | StatsWindow::AllTime => (1..=12u32)
                .map(|month| {
                    let mut pnl = Decimal::ZERO;
                    let mut operation_count = 0;
                    for op in &in_window {
                        let d = op.timestamp.date_naive();
                        if d.year() == reference_date.year() && d.month() == month {
                            pnl += op.pnl;
                            operation_count += 1;
                        }
                    }
                    MonthBreakdown {
                        month,
                        pnl,
                        operation_count,
                    }
                })
                .collect(),
            _ => Vec::new(),
        };

        StatisticsSnapshot {
            window,
            reference_time,
            total_operations: overall.total,
            wins: overall.wins,
            losses: overall.losses,
            win_rate_pct: overall.win_rate_pct,
            total_pnl: overall.pnl,
            by_asset,
            by_direction,
            by_hour,
            by_weekday,
            most_profitable_asset,
            least_profitable_asset,
            avg_pnl_per_active_day,
            avg_pnl_per_active_month,
            monthly_breakdown,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use journal_core::types::{OperationDraft, OperationResult};

    fn op(
        asset: &str,
        direction: Direction,
        pnl: i64,
        month: u32,
        day: u32,
        hour: u32,
    ) -> Operation {
        let result = if pnl >= 0 {
            OperationResult::Gain
        } else {
            OperationResult::Loss
        };
        OperationDraft::new(
            asset,
            direction,
            result,
            Decimal::new(100, 0),
            Decimal::new(pnl, 0),
        )
        .with_timestamp(Utc.with_ymd_and_hms(2025, month, day, hour, 0, 0).unwrap())
        .into_operation(1)
    }

    fn reference() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 12, 0, 0).unwrap()
    }

    fn fixture() -> Vec<Operation> {
        vec![
            op("EUR/USD", Direction::Call, 50, 3, 10, 9),
            op("EUR/USD", Direction::Call, -30, 3, 10, 9),
            op("GBP/JPY", Direction::Put, 40, 3, 10, 14),
            op("GBP/JPY", Direction::Put, 25, 3, 15, 14),
            op("EUR/USD", Direction::Call, -60, 4, 2, 10),
        ]
    }

    #[test]
    fn test_window_filtering() {
        let ops = fixture();
        let day = StatisticsAggregator::snapshot(&ops, StatsWindow::Day, reference());
        assert_eq!(day.total_operations, 3);
        assert_eq!(day.total_pnl, Decimal::new(60, 0));

        let month = StatisticsAggregator::snapshot(&ops, StatsWindow::Month, reference());
        assert_eq!(month.total_operations, 4);

        let year = StatisticsAggregator::snapshot(&ops, StatsWindow::Year, reference());
        assert_eq!(year.total_operations, 5);

        let all = StatisticsAggregator::snapshot(&ops, StatsWindow::AllTime, reference());
        assert_eq!(all.total_operations, 5);
        assert_eq!(all.total_pnl, Decimal::new(25, 0));
    }

    #[test]
    fn test_win_rate_and_buckets() {
        let ops = fixture();
        let all = StatisticsAggregator::snapshot(&ops, StatsWindow::AllTime, reference());

        assert_eq!(all.wins, 3);
        assert_eq!(all.losses, 2);
        assert_eq!(all.win_rate_pct, Decimal::new(60, 0));

        let eur = &all.by_asset["EUR/USD"];
        assert_eq!(eur.total, 3);
        assert_eq!(eur.wins, 1);
        assert_eq!(eur.pnl, Decimal::new(-40, 0));

        let put = &all.by_direction["put"];
        assert_eq!(put.total, 2);
        assert_eq!(put.win_rate_pct, Decimal::ONE_HUNDRED);
        assert_eq!(all.direction_win_rate(Direction::Put), Decimal::ONE_HUNDRED);

        // 2025-03-10 is a Monday -> weekday index 1.
        assert_eq!(all.by_weekday[&1].total, 3);
        assert_eq!(all.by_hour[&14].total, 2);
    }

    #[test]
    fn test_empty_window_is_all_zeros() {
        let snapshot = StatisticsAggregator::snapshot(&[], StatsWindow::Day, reference());
        assert_eq!(snapshot.total_operations, 0);
        assert_eq!(snapshot.win_rate_pct, Decimal::ZERO);
        assert_eq!(snapshot.avg_pnl_per_active_day, Decimal::ZERO);
        assert!(snapshot.by_asset.is_empty());
        assert!(snapshot.best_asset().is_none());
    }

    #[test]
    fn test_profitability_and_rankings() {
        let ops = fixture();
        let all = StatisticsAggregator::snapshot(&ops, StatsWindow::AllTime, reference());

        assert_eq!(all.most_profitable_asset.as_deref(), Some("GBP/JPY"));
        assert_eq!(all.least_profitable_asset.as_deref(), Some("EUR/USD"));
        // GBP/JPY wins on rate (100% vs 33%); pnl is irrelevant here.
        assert_eq!(all.best_asset(), Some("GBP/JPY"));
        assert_eq!(all.worst_asset(), Some("EUR/USD"));
    }

    #[test]
    fn test_ranking_has_no_sample_size_tie_break() {
        // One 1/1 asset and one 50/50 asset: identical 50% win rates.
        let mut ops = vec![
            op("AAA/BBB", Direction::Call, 10, 3, 10, 9),
            op("AAA/BBB", Direction::Call, -10, 3, 10, 9),
        ];
        for i in 0..50 {
            ops.push(op("CCC/DDD", Direction::Call, 10, 3, 1 + (i % 28), 9));
            ops.push(op("CCC/DDD", Direction::Call, -10, 3, 1 + (i % 28), 9));
        }
        let all = StatisticsAggregator::snapshot(&ops, StatsWindow::AllTime, reference());

        // Equal rates keep key order: the small-sample asset ranks first.
        assert_eq!(all.best_asset(), Some("AAA/BBB"));
    }

    #[test]
    fn test_active_period_averages() {
        let ops = fixture();
        let all = StatisticsAggregator::snapshot(&ops, StatsWindow::AllTime, reference());

        // Activity on 3 distinct days and 2 distinct months, pnl 25.
        assert_eq!(
            all.avg_pnl_per_active_day,
            Decimal::new(25, 0) / Decimal::new(3, 0)
        );
        assert_eq!(
            all.avg_pnl_per_active_month,
            Decimal::new(125, 1) // 12.5
        );
    }

    #[test]
    fn test_annual_breakdown_covers_all_months() {
        let ops = fixture();
        let year = StatisticsAggregator::snapshot(&ops, StatsWindow::Year, reference());

        assert_eq!(year.monthly_breakdown.len(), 12);
        let march = &year.monthly_breakdown[2];
        assert_eq!(march.month, 3);
        assert_eq!(march.operation_count, 4);
        assert_eq!(march.pnl, Decimal::new(85, 0));
        let april = &year.monthly_breakdown[3];
        assert_eq!(april.operation_count, 1);
        assert_eq!(year.monthly_breakdown[0].operation_count, 0);

        let day = StatisticsAggregator::snapshot(&ops, StatsWindow::Day, reference());
        assert!(day.monthly_breakdown.is_empty());
    }

    #[test]
    fn test_snapshot_is_deterministic() {
        let ops = fixture();
        let a = StatisticsAggregator::snapshot(&ops, StatsWindow::Month, reference());
        let b = StatisticsAggregator::snapshot(&ops, StatsWindow::Month, reference());

        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
