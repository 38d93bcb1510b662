//! Leverage session types: bounded multi-level capital-growth plans.

use crate::{Error, Result};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::operation::Operation;

/// Maximum number of levels a session may plan.
pub const MAX_SESSION_LEVELS: u8 = 5;

/// How per-operation entry sizes are expressed for the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySizing {
    /// Percent of the capital accumulated at the current level.
    Percent,
    /// Fixed monetary amount.
    Fixed,
}

/// Lifecycle state of a leverage session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Active,
    /// Final level target met.
    Completed,
    /// Total stop breached.
    Aborted,
}

/// Caller-supplied plan for a leverage session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeverageSessionConfig {
    /// Capital committed to the session.
    pub initial_capital: Decimal,
    /// Number of levels (1..=5).
    pub levels: u8,
    /// Profit target per level, percent of the capital accumulated at
    /// the level's start.
    pub target_per_level_pct: Decimal,
    /// Maximum tolerated cumulative session loss; breaching it aborts
    /// the session.
    pub total_stop: Decimal,
    /// Informational capital floor. Surfaced in progress and stats but
    /// never enforced as a hard stop.
    pub protected_stop: Option<Decimal>,
    /// Entry size per operation, interpreted per `entry_sizing`.
    pub entry_size: Decimal,
    /// Interpretation of `entry_size`.
    pub entry_sizing: EntrySizing,
}

impl LeverageSessionConfig {
    /// Validate the plan before a session is started.
    pub fn validate(&self) -> Result<()> {
        if self.levels == 0 || self.levels > MAX_SESSION_LEVELS {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "levels must be within 1..={MAX_SESSION_LEVELS}, got {}",
                    self.levels
                ),
            });
        }
        if self.initial_capital <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!("initial_capital must be positive, got {}", self.initial_capital),
            });
        }
        if self.target_per_level_pct <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!(
                    "target_per_level_pct must be positive, got {}",
                    self.target_per_level_pct
                ),
            });
        }
        if self.total_stop <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!("total_stop must be positive, got {}", self.total_stop),
            });
        }
        if self.entry_size <= Decimal::ZERO {
            return Err(Error::InvalidConfiguration {
                message: format!("entry_size must be positive, got {}", self.entry_size),
            });
        }
        Ok(())
    }

    /// Suggested entry amount for a level that starts with `accumulated`
    /// capital.
    pub fn entry_amount_for(&self, accumulated: Decimal) -> Decimal {
        match self.entry_sizing {
            EntrySizing::Percent => accumulated * self.entry_size / Decimal::ONE_HUNDRED,
            EntrySizing::Fixed => self.entry_size,
        }
    }
}

/// A leverage session: an independent risk scope with its own sub-ledger
/// and stop thresholds. At most one session is active at a time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeverageSession {
    /// Unique session identifier.
    pub id: Uuid,
    /// The plan the session was started with.
    pub config: LeverageSessionConfig,
    /// Lifecycle state.
    pub status: SessionStatus,
    /// Current level (1..=levels). Only ever moves forward.
    pub current_level: u8,
    /// When the session was started.
    pub started_at: DateTime<Utc>,
    /// When the session concluded, if it has.
    pub concluded_at: Option<DateTime<Utc>>,
}

impl LeverageSession {
    /// Start a new session at level 1.
    pub fn new(config: LeverageSessionConfig) -> Self {
        Self {
            id: Uuid::new_v4(),
            config,
            status: SessionStatus::Active,
            current_level: 1,
            started_at: Utc::now(),
            concluded_at: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }
}

/// An operation taken inside a leverage session, tagged with the level
/// it was recorded at.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionOperation {
    /// The underlying journal operation.
    pub operation: Operation,
    /// Owning session.
    pub session_id: Uuid,
    /// Level the session was at when the operation was admitted.
    pub level: u8,
}

/// Derived progress for one planned level.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelProgress {
    /// Level number (1-based).
    pub level: u8,
    /// Capital accumulated at the level's start: initial capital plus
    /// the planned targets of all prior levels.
    pub accumulated_capital: Decimal,
    /// Profit required to complete the level.
    pub target_amount: Decimal,
    /// Sum of pnl over operations tagged with this level.
    pub realized_pnl: Decimal,
    /// Realized over target, clamped to 100 for display.
    pub progress_pct: Decimal,
    /// Whether the level's target has been met.
    pub complete: bool,
    /// Suggested entry size at this level, from the session plan.
    pub suggested_entry: Decimal,
}

/// Edge transition produced by recomputing a session after a mutation.
/// Consumed by the alert dispatcher; at most one per recomputation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionTransition {
    /// A non-final level met its target; awaiting explicit confirmation
    /// to advance.
    LevelComplete { level: u8 },
    /// The final level met its target; session completed.
    FinalTargetReached,
    /// Cumulative session loss breached the total stop; session aborted.
    TotalStopReached,
}
