//! Session lifecycle, level progression and the total-stop abort path.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use journal_core::types::{
    LevelProgress, LeverageSession, LeverageSessionConfig, OperationDraft, SessionOperation,
    SessionStatus, SessionTransition,
};
use journal_core::{Error, Result};
use rust_decimal::Decimal;
use tokio::sync::RwLock;
use tracing::{info, warn};
use uuid::Uuid;

/// A session plus its sub-ledger. Archived forever once concluded.
#[derive(Debug, Clone)]
struct SessionRecord {
    session: LeverageSession,
    operations: Vec<SessionOperation>,
}

/// Result of recording an operation into the active session.
#[derive(Debug, Clone)]
pub struct SessionOutcome {
    pub operation: SessionOperation,
    /// `Some` exactly when this recording changed the session's edge
    /// state: a level completing, the plan finishing, or the abort.
    pub transition: Option<SessionTransition>,
}

/// Aggregate figures for one session, derived from its sub-ledger.
#[derive(Debug, Clone, serde::Serialize)]
pub struct SessionStats {
    pub session_id: Uuid,
    pub status: SessionStatus,
    pub operation_count: u32,
    pub wins: u32,
    pub losses: u32,
    /// Percent of operations that were wins; zero when empty.
    pub win_rate_pct: Decimal,
    pub total_pnl: Decimal,
    /// Initial capital plus realized session pnl.
    pub current_balance: Decimal,
    /// Whether the balance ever dipped below the informational
    /// protected stop. Never enforced.
    pub protected_stop_breached: bool,
}

/// One point of a session's equity curve: balance after an operation.
#[derive(Debug, Clone, serde::Serialize)]
pub struct EquityPoint {
    pub timestamp: DateTime<Utc>,
    pub balance: Decimal,
}

/// Aggregate figures across every session ever started, active or
/// archived.
#[derive(Debug, Clone, serde::Serialize)]
pub struct OverallSessionStats {
    pub total_sessions: u32,
    pub completed_sessions: u32,
    pub aborted_sessions: u32,
    pub total_pnl: Decimal,
    /// Total pnl divided by the number of sessions; zero with none.
    pub avg_pnl_per_session: Decimal,
    /// Win rate across all leverage operations of all sessions.
    pub win_rate_pct: Decimal,
    /// Asset with the highest pnl accumulated across sessions.
    pub best_asset: Option<String>,
}

/// The leverage session engine.
///
/// Sessions live in a concurrent archive; a separate pointer tracks the
/// single allowed active session.
pub struct LeverageEngine {
    sessions: DashMap<Uuid, SessionRecord>,
    active: RwLock<Option<Uuid>>,
}

impl Default for LeverageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LeverageEngine {
    pub fn new() -> Self {
        Self {
            sessions: DashMap::new(),
            active: RwLock::new(None),
        }
    }

    /// Start a new session from a validated plan. Fails while another
    /// session is active.
    pub async fn start_session(&self, config: LeverageSessionConfig) -> Result<LeverageSession> {
        config.validate()?;

        let mut active = self.active.write().await;
        if active.is_some() {
            return Err(Error::SessionAlreadyActive);
        }

        let session = LeverageSession::new(config);
        info!(
            session_id = %session.id,
            initial_capital = %session.config.initial_capital,
            levels = session.config.levels,
            target_pct = %session.config.target_per_level_pct,
            "Leverage session started"
        );
        self.sessions.insert(
            session.id,
            SessionRecord {
                session: session.clone(),
                operations: Vec::new(),
            },
        );
        *active = Some(session.id);
        Ok(session)
    }

    /// Record an operation into the active session at its current level.
    ///
    /// The total stop is checked before level targets, so a recording
    /// that breaches both aborts the session. The returned transition is
    /// edge-triggered: each level completion is reported once.
    pub async fn record_operation(&self, draft: OperationDraft) -> Result<SessionOutcome> {
        let mut active = self.active.write().await;
        let session_id = active.ok_or(Error::SessionNotActive)?;
        let mut record = self
            .sessions
            .get_mut(&session_id)
            .ok_or(Error::UnknownSession(session_id))?;

        let level = record.session.current_level;
        let level_realized_before = level_realized(&record.operations, level);

        let sequence = record.operations.len() as u32 + 1;
        let operation = SessionOperation {
            operation: draft.into_operation(sequence),
            session_id,
            level,
        };
        record.operations.push(operation.clone());

        let session_pnl: Decimal = record.operations.iter().map(|op| op.operation.pnl).sum();
        info!(
            session_id = %session_id,
            level,
            pnl = %operation.operation.pnl,
            session_pnl = %session_pnl,
            "Session operation recorded"
        );

        // Abort wins over completion when one operation crosses both.
        if session_pnl <= -record.session.config.total_stop {
            record.session.status = SessionStatus::Aborted;
            record.session.concluded_at = Some(Utc::now());
            *active = None;
            warn!(
                session_id = %session_id,
                session_pnl = %session_pnl,
                total_stop = %record.session.config.total_stop,
                "Total stop breached - session aborted"
            );
            return Ok(SessionOutcome {
                operation,
                transition: Some(SessionTransition::TotalStopReached),
            });
        }

        let plan = level_plan(&record.session.config);
        let target = plan[level as usize - 1].1;
        let realized = level_realized(&record.operations, level);

        // Edge: the target must be crossed by this recording.
        if realized >= target && level_realized_before < target {
            if level == record.session.config.levels {
                record.session.status = SessionStatus::Completed;
                record.session.concluded_at = Some(Utc::now());
                *active = None;
                info!(session_id = %session_id, "Final level target met - session completed");
                return Ok(SessionOutcome {
                    operation,
                    transition: Some(SessionTransition::FinalTargetReached),
                });
            }
            info!(session_id = %session_id, level, "Level target met - awaiting confirmation");
            return Ok(SessionOutcome {
                operation,
                transition: Some(SessionTransition::LevelComplete { level }),
            });
        }

        Ok(SessionOutcome {
            operation,
            transition: None,
        })
    }

    /// Confirm a completed level and move the active session forward.
    /// Level advancement is explicit: meeting a target never advances
    /// on its own.
    pub async fn advance_level(&self) -> Result<u8> {
        let active = self.active.read().await;
        let session_id = active.ok_or(Error::SessionNotActive)?;
        let mut record = self
            .sessions
            .get_mut(&session_id)
            .ok_or(Error::UnknownSession(session_id))?;

        let level = record.session.current_level;
        let plan = level_plan(&record.session.config);
        let target = plan[level as usize - 1].1;
        if level_realized(&record.operations, level) < target {
            return Err(Error::LevelNotComplete { level });
        }

        record.session.current_level = level + 1;
        info!(
            session_id = %session_id,
            from = level,
            to = record.session.current_level,
            "Advanced to next level"
        );
        Ok(record.session.current_level)
    }

    /// The currently active session, if any.
    pub async fn active_session(&self) -> Option<LeverageSession> {
        let active = self.active.read().await;
        active.and_then(|id| self.sessions.get(&id).map(|r| r.session.clone()))
    }

    /// A session by id, active or archived.
    pub fn session(&self, id: Uuid) -> Result<LeverageSession> {
        self.sessions
            .get(&id)
            .map(|r| r.session.clone())
            .ok_or(Error::UnknownSession(id))
    }

    /// Every session ever started, newest first.
    pub fn sessions(&self) -> Vec<LeverageSession> {
        let mut all: Vec<LeverageSession> =
            self.sessions.iter().map(|r| r.session.clone()).collect();
        all.sort_by(|a, b| b.started_at.cmp(&a.started_at));
        all
    }

    /// The sub-ledger of a session, in recording order.
    pub fn operations(&self, id: Uuid) -> Result<Vec<SessionOperation>> {
        self.sessions
            .get(&id)
            .map(|r| r.operations.clone())
            .ok_or(Error::UnknownSession(id))
    }

    /// Per-level progress for a session. Levels past the plan's length
    /// never appear; levels not yet reached show zero realized pnl.
    pub fn progress(&self, id: Uuid) -> Result<Vec<LevelProgress>> {
        let record = self.sessions.get(&id).ok_or(Error::UnknownSession(id))?;
        let config = &record.session.config;

        Ok(level_plan(config)
            .into_iter()
            .enumerate()
            .map(|(i, (accumulated, target))| {
                let level = i as u8 + 1;
                let realized = level_realized(&record.operations, level);
                let progress_pct = if target > Decimal::ZERO {
                    (realized / target * Decimal::ONE_HUNDRED)
                        .clamp(Decimal::ZERO, Decimal::ONE_HUNDRED)
                } else {
                    Decimal::ZERO
                };
                LevelProgress {
                    level,
                    accumulated_capital: accumulated,
                    target_amount: target,
                    realized_pnl: realized,
                    progress_pct,
                    complete: realized >= target,
                    suggested_entry: config.entry_amount_for(accumulated),
                }
            })
            .collect())
    }

    /// Aggregate figures for a session.
    pub fn stats(&self, id: Uuid) -> Result<SessionStats> {
        let record = self.sessions.get(&id).ok_or(Error::UnknownSession(id))?;
        let config = &record.session.config;

        let operation_count = record.operations.len() as u32;
        let wins = record
            .operations
            .iter()
            .filter(|op| op.operation.is_win())
            .count() as u32;
        let losses = operation_count - wins;
        let total_pnl: Decimal = record.operations.iter().map(|op| op.operation.pnl).sum();
        let win_rate_pct = if operation_count > 0 {
            Decimal::from(wins) / Decimal::from(operation_count) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };

        let protected_stop_breached = config.protected_stop.is_some_and(|floor| {
            let mut balance = config.initial_capital;
            record.operations.iter().any(|op| {
                balance += op.operation.pnl;
                balance < floor
            })
        });

        Ok(SessionStats {
            session_id: id,
            status: record.session.status,
            operation_count,
            wins,
            losses,
            win_rate_pct,
            total_pnl,
            current_balance: config.initial_capital + total_pnl,
            protected_stop_breached,
        })
    }

    /// Aggregate figures across the whole session archive.
    pub fn overall_stats(&self) -> OverallSessionStats {
        let mut total_sessions = 0;
        let mut completed_sessions = 0;
        let mut aborted_sessions = 0;
        let mut total_pnl = Decimal::ZERO;
        let mut wins = 0u32;
        let mut operations = 0u32;
        let mut asset_pnl: std::collections::BTreeMap<String, Decimal> =
            std::collections::BTreeMap::new();

        for record in self.sessions.iter() {
            total_sessions += 1;
            match record.session.status {
                SessionStatus::Completed => completed_sessions += 1,
                SessionStatus::Aborted => aborted_sessions += 1,
                SessionStatus::Active => {}
            }
            for op in &record.operations {
                operations += 1;
                if op.operation.is_win() {
                    wins += 1;
                }
                total_pnl += op.operation.pnl;
                *asset_pnl.entry(op.operation.asset.clone()).or_default() += op.operation.pnl;
            }
        }

        let avg_pnl_per_session = if total_sessions > 0 {
            total_pnl / Decimal::from(total_sessions)
        } else {
            Decimal::ZERO
        };
        let win_rate_pct = if operations > 0 {
            Decimal::from(wins) / Decimal::from(operations) * Decimal::ONE_HUNDRED
        } else {
            Decimal::ZERO
        };
        let best_asset = asset_pnl
            .iter()
            .max_by_key(|(_, pnl)| **pnl)
            .map(|(asset, _)| asset.clone());

        OverallSessionStats {
            total_sessions,
            completed_sessions,
            aborted_sessions,
            total_pnl,
            avg_pnl_per_session,
            win_rate_pct,
            best_asset,
        }
    }

    /// Running balance after each operation, in recording order.
    pub fn equity_curve(&self, id: Uuid) -> Result<Vec<EquityPoint>> {
        let record = self.sessions.get(&id).ok_or(Error::UnknownSession(id))?;

        let mut balance = record.session.config.initial_capital;
        Ok(record
            .operations
            .iter()
            .map(|op| {
                balance += op.operation.pnl;
                EquityPoint {
                    timestamp: op.operation.timestamp,
                    balance,
                }
            })
            .collect())
    }
}

/// Planned `(accumulated_capital, target_amount)` per level. Targets
/// compound over the PLANNED accumulation, not realized pnl: level k
/// starts from initial capital plus the planned targets of levels 1..k.
fn level_plan(config: &LeverageSessionConfig) -> Vec<(Decimal, Decimal)> {
    let mut plan = Vec::with_capacity(config.levels as usize);
    let mut accumulated = config.initial_capital;
    for _ in 0..config.levels {
        let target = accumulated * config.target_per_level_pct / Decimal::ONE_HUNDRED;
        plan.push((accumulated, target));
        accumulated += target;
    }
    plan
}

fn level_realized(operations: &[SessionOperation], level: u8) -> Decimal {
    operations
        .iter()
        .filter(|op| op.level == level)
        .map(|op| op.operation.pnl)
        .sum()
}
