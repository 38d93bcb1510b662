//! Daily guard: the Safe -> Warning -> Blocked state machine.
//!
//! All state is recomputed from the ledger on demand; the only thing the
//! guard remembers between calls is the sticky blocked flag for the
//! current day, which an explicit day reset clears. Admission, guard
//! recomputation and the trip decision happen under one write lock, so
//! each submission is atomic.

use chrono::NaiveDate;
use journal_core::types::{
    BlockReason, DailyState, Operation, OperationDraft, OperationPatch, RiskConfig, RiskLevel,
};
use journal_core::{Error, Result};
use rust_decimal::Decimal;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::{error, info, warn};

use crate::ledger::OperationLedger;

/// Warning fires at 80% of either stop threshold.
fn warning_threshold_pct() -> Decimal {
    Decimal::new(80, 0)
}

/// Sticky per-day blocking state.
#[derive(Debug, Clone)]
struct GuardDay {
    date: NaiveDate,
    blocked: bool,
    reason: Option<BlockReason>,
}

/// Result of a successful mutation: the stored operation plus the trip
/// reason when this mutation was the one that blocked the day.
#[derive(Debug, Clone)]
pub struct Admitted {
    pub operation: Operation,
    /// `Some` exactly once per transition into Blocked (edge-triggered).
    pub tripped: Option<BlockReason>,
}

/// The daily risk guard. One instance covers one trading scope.
pub struct DailyGuard {
    config: RwLock<RiskConfig>,
    ledger: RwLock<OperationLedger>,
    day: RwLock<GuardDay>,
    /// Fast path flag for checking if the current day is blocked.
    is_blocked: AtomicBool,
}

impl DailyGuard {
    /// Create a guard whose current day starts at the configuration's
    /// start date.
    pub fn new(config: RiskConfig) -> Self {
        let date = config.start_date;
        Self {
            config: RwLock::new(config),
            ledger: RwLock::new(OperationLedger::new()),
            day: RwLock::new(GuardDay {
                date,
                blocked: false,
                reason: None,
            }),
            is_blocked: AtomicBool::new(false),
        }
    }

    /// Whether the current day is blocked (fast path).
    pub fn is_blocked(&self) -> bool {
        self.is_blocked.load(Ordering::SeqCst)
    }

    /// The day new operations are admitted into.
    pub async fn current_date(&self) -> NaiveDate {
        self.day.read().await.date
    }

    /// Current risk configuration snapshot.
    pub async fn config(&self) -> RiskConfig {
        self.config.read().await.clone()
    }

    /// Full ledger snapshot, in admission order.
    pub async fn operations(&self) -> Vec<Operation> {
        self.ledger.read().await.list_all()
    }

    /// Ledger slice for one day.
    pub async fn operations_for(&self, date: NaiveDate) -> Vec<Operation> {
        self.ledger.read().await.list_by_day(date)
    }

    /// Validate and admit a new operation into the current day.
    ///
    /// Checks run in a fixed order and the first failure wins:
    /// day match, capacity, entry size, blocked day. On success the
    /// guard is recomputed immediately and the trip reason (if this
    /// admission blocked the day) is reported exactly once.
    pub async fn submit(&self, draft: OperationDraft) -> Result<Admitted> {
        let config = self.config.read().await;
        let mut day = self.day.write().await;
        let mut ledger = self.ledger.write().await;

        // Drafts are only admissible into the guard's current day:
        // capacity, sequencing and the blocked flag all key off it.
        let draft_date = draft.timestamp.date_naive();
        if draft_date != day.date {
            return Err(Error::OutsideTradingDay {
                date: draft_date,
                current_day: day.date,
            });
        }

        let count = ledger.day_count(day.date);
        if count >= config.daily_operation_cap {
            return Err(Error::CapacityExceeded {
                cap: config.daily_operation_cap,
            });
        }
        if draft.entry_amount > config.max_entry_amount {
            return Err(Error::EntryTooLarge {
                amount: draft.entry_amount,
                max: config.max_entry_amount,
            });
        }
        if day.blocked {
            return Err(Error::GuardBlocked {
                reason: day.reason.unwrap_or(BlockReason::LimitOperations),
            });
        }

        let sequence = ledger.next_sequence(day.date);
        let operation = draft.into_operation(sequence);
        ledger.append(operation.clone());

        info!(
            operation_id = %operation.id,
            sequence = sequence,
            asset = %operation.asset,
            pnl = %operation.pnl,
            "Operation admitted"
        );

        let tripped = self.recompute(&config, &mut day, &ledger);
        Ok(Admitted { operation, tripped })
    }

    /// Apply a caller-issued edit to an existing operation, then
    /// recompute the guard. Edits keep timestamp and sequence number.
    pub async fn update_operation(&self, id: uuid::Uuid, patch: OperationPatch) -> Result<Admitted> {
        let config = self.config.read().await;
        let mut day = self.day.write().await;
        let mut ledger = self.ledger.write().await;

        let operation = ledger.update(id, patch)?;
        let tripped = self.recompute(&config, &mut day, &ledger);
        Ok(Admitted { operation, tripped })
    }

    /// Remove an operation. Refused while its owning day is blocked.
    /// Like any other ledger mutation, removal recomputes the guard:
    /// deleting a loss can push the day across the stop gain.
    pub async fn remove_operation(&self, id: uuid::Uuid) -> Result<Admitted> {
        let config = self.config.read().await;
        let mut day = self.day.write().await;
        let mut ledger = self.ledger.write().await;

        let owning_day = ledger
            .get(id)
            .ok_or(Error::OperationNotFound(id))?
            .timestamp
            .date_naive();
        if day.blocked && owning_day == day.date {
            return Err(Error::GuardBlocked {
                reason: day.reason.unwrap_or(BlockReason::LimitOperations),
            });
        }

        let removed = ledger.remove(id)?;
        info!(operation_id = %id, "Operation removed");
        let tripped = self.recompute(&config, &mut day, &ledger);
        Ok(Admitted {
            operation: removed,
            tripped,
        })
    }

    /// Replace the risk configuration wholesale.
    ///
    /// Past operations are never revalidated against the new entry
    /// limit, but the blocking thresholds are re-evaluated right away.
    /// Returns the trip reason if the new thresholds block the day.
    pub async fn set_config(&self, new_config: RiskConfig) -> Option<BlockReason> {
        let mut config = self.config.write().await;
        let mut day = self.day.write().await;
        let ledger = self.ledger.read().await;

        *config = new_config;
        info!(
            capital = %config.capital_total,
            stop_gain = %config.stop_gain_amount,
            stop_loss = %config.stop_loss_amount,
            "Risk configuration replaced"
        );
        self.recompute(&config, &mut day, &ledger)
    }

    /// Start a new trading day at `date`, clearing the blocked flag.
    ///
    /// Deliberately callable at any time: the source system treats this
    /// as a manual "new trading day" action, not a calendar rollover.
    pub async fn reset_day(&self, date: NaiveDate) {
        let mut day = self.day.write().await;
        if day.blocked {
            warn!(
                previous_reason = ?day.reason,
                "Day reset while blocked - manual override"
            );
        }
        day.date = date;
        day.blocked = false;
        day.reason = None;
        self.is_blocked.store(false, Ordering::SeqCst);
        info!(%date, "New trading day started");
    }

    /// Daily state for the guard's current day, including the sticky
    /// blocked flag.
    pub async fn today(&self) -> DailyState {
        let config = self.config.read().await;
        let day = self.day.read().await;
        let ledger = self.ledger.read().await;
        build_state(&config, &ledger, day.date, day.blocked, day.reason)
    }

    /// Daily state for an arbitrary date. For days other than the
    /// current one the blocked flag is derived from thresholds alone.
    pub async fn evaluate(&self, date: NaiveDate) -> DailyState {
        let config = self.config.read().await;
        let day = self.day.read().await;
        let ledger = self.ledger.read().await;

        if date == day.date {
            build_state(&config, &ledger, date, day.blocked, day.reason)
        } else {
            let pnl = ledger.day_pnl(date);
            let count = ledger.day_count(date);
            let reason = check_thresholds(&config, pnl, count);
            build_state(&config, &ledger, date, reason.is_some(), reason)
        }
    }

    /// Recompute thresholds after a mutation. Returns the trip reason
    /// only on the transition into Blocked.
    fn recompute(
        &self,
        config: &RiskConfig,
        day: &mut GuardDay,
        ledger: &OperationLedger,
    ) -> Option<BlockReason> {
        if day.blocked {
            return None;
        }

        let pnl = ledger.day_pnl(day.date);
        let count = ledger.day_count(day.date);
        let reason = check_thresholds(config, pnl, count)?;

        day.blocked = true;
        day.reason = Some(reason);
        self.is_blocked.store(true, Ordering::SeqCst);

        error!(
            %reason,
            cumulative_pnl = %pnl,
            operation_count = count,
            "Daily guard TRIPPED - trading halted"
        );
        Some(reason)
    }
}

/// Threshold checks in priority order: stop gain, stop loss, operation cap.
fn check_thresholds(config: &RiskConfig, pnl: Decimal, count: u32) -> Option<BlockReason> {
    if pnl >= config.stop_gain_amount {
        return Some(BlockReason::StopGain);
    }
    if pnl <= -config.stop_loss_amount {
        return Some(BlockReason::StopLoss);
    }
    if count >= config.daily_operation_cap {
        return Some(BlockReason::LimitOperations);
    }
    None
}

fn build_state(
    config: &RiskConfig,
    ledger: &OperationLedger,
    date: NaiveDate,
    blocked: bool,
    reason: Option<BlockReason>,
) -> DailyState {
    let operations = ledger.list_by_day(date);
    let cumulative_pnl: Decimal = operations.iter().map(|op| op.pnl).sum();
    let operation_count = operations.len() as u32;

    let gain_progress = config.stop_gain_progress_pct(cumulative_pnl);
    let loss_progress = config.stop_loss_progress_pct(cumulative_pnl);

    let risk_level = if blocked {
        RiskLevel::Blocked
    } else if gain_progress >= warning_threshold_pct() || loss_progress >= warning_threshold_pct()
    {
        RiskLevel::Warning
    } else {
        RiskLevel::Safe
    };

    let accumulated_pct = if config.capital_total > Decimal::ZERO {
        cumulative_pnl / config.capital_total * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    };

    DailyState {
        date,
        operations,
        cumulative_pnl,
        operation_count,
        risk_level,
        blocked,
        block_reason: reason,
        stop_gain_progress_pct: gain_progress,
        stop_loss_progress_pct: loss_progress,
        current_balance: config.capital_total + cumulative_pnl,
        accumulated_pct,
    }
}
