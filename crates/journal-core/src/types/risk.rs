//! Capital-preservation thresholds and daily guard state.

use crate::{Error, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::operation::Operation;

/// Fixed daily operation cap. Not user-configurable.
pub const DAILY_OPERATION_CAP: u32 = 5;

/// Fraction of capital allowed per entry (2.5%).
pub fn max_entry_fraction() -> Decimal {
    Decimal::new(25, 3)
}

/// Reason the daily guard blocked further trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    /// Cumulative daily profit reached the stop-gain threshold.
    StopGain,
    /// Cumulative daily loss reached the stop-loss threshold.
    StopLoss,
    /// The fixed daily operation cap was reached.
    LimitOperations,
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            BlockReason::StopGain => "stop_gain",
            BlockReason::StopLoss => "stop_loss",
            BlockReason::LimitOperations => "limit_operations",
        };
        f.write_str(s)
    }
}

/// Traffic-light risk level for the current day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Safe,
    /// Within 80% of either stop threshold.
    Warning,
    Blocked,
}

/// Derived capital-preservation thresholds.
///
/// Immutable once derived; reconfiguring replaces the whole value.
/// Replacement never revalidates past operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Total trading capital.
    pub capital_total: Decimal,
    /// Daily profit target, percent of capital.
    pub target_daily_pct: Decimal,
    /// Daily profit threshold that halts trading.
    pub stop_gain_amount: Decimal,
    /// Equal to the daily target.
    pub stop_gain_pct: Decimal,
    /// Daily loss threshold that halts trading.
    pub stop_loss_amount: Decimal,
    /// Half of the stop-gain percent.
    pub stop_loss_pct: Decimal,
    /// Largest admissible single entry (2.5% of capital).
    pub max_entry_amount: Decimal,
    /// Fixed daily operation cap.
    pub daily_operation_cap: u32,
    /// First day the configuration applies to.
    pub start_date: NaiveDate,
}

impl RiskConfig {
    /// Derive all thresholds from capital and the daily target percent.
    ///
    /// Fails with [`Error::InvalidConfiguration`] on non-positive inputs;
    /// every derived threshold assumes positive capital and target.
    pub fn derive(
        capital_total: Decimal,
        target_daily_pct: Decimal,
        start_date: NaiveDate,
    ) -> Result<Self> {
        if capital_total <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!("capital_total must be positive, got {capital_total}"),
            });
        }
        if target_daily_pct <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!("target_daily_pct must be positive, got {target_daily_pct}"),
            });
        }

        let stop_gain_pct = target_daily_pct;
        let stop_loss_pct = target_daily_pct * Decimal::new(5, 1);
        Ok(Self {
            capital_total,
            target_daily_pct,
            stop_gain_amount: capital_total * stop_gain_pct / Decimal::ONE_HUNDRED,
            stop_gain_pct,
            stop_loss_amount: capital_total * stop_loss_pct / Decimal::ONE_HUNDRED,
            stop_loss_pct,
            max_entry_amount: capital_total * max_entry_fraction(),
            daily_operation_cap: DAILY_OPERATION_CAP,
            start_date,
        })
    }

    /// Progress toward the stop gain, as a percentage of the threshold.
    pub fn stop_gain_progress_pct(&self, cumulative_pnl: Decimal) -> Decimal {
        if self.stop_gain_amount > Decimal::ZERO {
            cumulative_pnl / self.stop_gain_amount * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        }
    }

    /// Progress toward the stop loss, as a percentage of the threshold.
    /// Always non-negative.
    pub fn stop_loss_progress_pct(&self, cumulative_pnl: Decimal) -> Decimal {
        if self.stop_loss_amount > Decimal::ZERO {
            (cumulative_pnl / self.stop_loss_amount * Decimal::ONE_HUNDRED).abs()
        } else {
            Decimal::ZERO
        }
    }
}

/// Snapshot of one trading day, recomputed from the ledger on every
/// mutation. Never stored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyState {
    /// The day this snapshot describes.
    pub date: NaiveDate,
    /// Ledger slice for the day, in admission order.
    pub operations: Vec<Operation>,
    /// Sum of pnl over the day's operations.
    pub cumulative_pnl: Decimal,
    /// Number of operations admitted today.
    pub operation_count: u32,
    /// Traffic-light level.
    pub risk_level: RiskLevel,
    /// Whether trading is halted until the next explicit day reset.
    pub blocked: bool,
    /// Why trading is halted, when it is.
    pub block_reason: Option<BlockReason>,
    /// Progress toward the stop gain, percent of threshold.
    pub stop_gain_progress_pct: Decimal,
    /// Progress toward the stop loss, percent of threshold.
    pub stop_loss_progress_pct: Decimal,
    /// Capital plus today's cumulative pnl.
    pub current_balance: Decimal,
    /// Today's pnl as a percent of total capital.
    pub accumulated_pct: Decimal,
}
