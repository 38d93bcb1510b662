//! Stats Engine
//!
//! Read-side rollups over the operation ledger. Everything here is a
//! pure function of a ledger slice, a window and a reference time: the
//! same inputs always produce the same snapshot, and nothing is cached.

pub mod aggregator;

pub use aggregator::{
    BucketStats, MonthBreakdown, StatisticsAggregator, StatisticsSnapshot, StatsWindow,
};
