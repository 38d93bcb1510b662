//! RiskDesk: risk-control and leverage-session engine for a
//! self-reporting trading journal.
//!
//! This root crate ties the domain crates together behind one facade:
//!
//! - `journal-core`: core types, risk configuration, alerts, errors
//! - `risk-guard`: operation ledger and the daily blocking guard
//! - `leverage-engine`: bounded multi-level leverage sessions
//! - `stats-engine`: pure windowed statistics over the ledger
//!
//! The facade owns exactly one guard scope and at most one active
//! leverage session. Every write runs check, mutate, recompute and
//! alert dispatch as one logical unit before returning.

use chrono::{NaiveDate, Utc};
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

pub use journal_core::alert::{Alert, AlertDispatcher, AlertKind};
pub use journal_core::config::DeskConfig;
pub use journal_core::types::{
    BlockReason, DailyState, Direction, EntrySizing, LevelProgress, LeverageSession,
    LeverageSessionConfig, Operation, OperationDraft, OperationPatch, OperationResult, RiskConfig,
    RiskLevel, SessionOperation, SessionStatus, SessionTransition,
};
pub use journal_core::{Error, Result};
pub use leverage_engine::{EquityPoint, LeverageEngine, OverallSessionStats, SessionStats};
pub use risk_guard::{DailyGuard, OperationLedger};
pub use stats_engine::{StatisticsAggregator, StatisticsSnapshot, StatsWindow};

/// The engine facade. Construct one per trading scope; alerts arrive on
/// the receiver returned alongside it.
pub struct RiskDesk {
    guard: DailyGuard,
    leverage: LeverageEngine,
    dispatcher: AlertDispatcher,
    alerts: mpsc::UnboundedSender<Alert>,
}

impl RiskDesk {
    /// Build a desk from an explicit risk configuration. The second
    /// element receives every alert the engines emit; dropping it is
    /// fine, delivery is fire-and-forget.
    pub fn new(config: RiskConfig) -> (Self, mpsc::UnboundedReceiver<Alert>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                guard: DailyGuard::new(config),
                leverage: LeverageEngine::new(),
                dispatcher: AlertDispatcher::new(),
                alerts: tx,
            },
            rx,
        )
    }

    /// Build a desk from loaded desk settings, starting at `start_date`.
    pub fn from_desk_config(
        desk: &DeskConfig,
        start_date: NaiveDate,
    ) -> Result<(Self, mpsc::UnboundedReceiver<Alert>)> {
        Ok(Self::new(desk.risk_config(start_date)?))
    }

    fn dispatch(&self, alert: Option<Alert>) {
        if let Some(alert) = alert {
            debug!(kind = ?alert.kind, "Dispatching alert");
            // Receiver may be gone; alerts are best-effort.
            let _ = self.alerts.send(alert);
        }
    }

    // ---- daily guard ----

    /// Submit a new operation into the current trading day.
    pub async fn submit_operation(&self, draft: OperationDraft) -> Result<Operation> {
        let admitted = self.guard.submit(draft).await?;
        self.dispatch(self.dispatcher.guard_tripped(admitted.tripped));
        Ok(admitted.operation)
    }

    /// Edit an existing operation. May trip the guard.
    pub async fn update_operation(&self, id: Uuid, patch: OperationPatch) -> Result<Operation> {
        let admitted = self.guard.update_operation(id, patch).await?;
        self.dispatch(self.dispatcher.guard_tripped(admitted.tripped));
        Ok(admitted.operation)
    }

    /// Remove an operation. Refused while its day is blocked; may trip
    /// the guard when deleting a loss exposes a breached stop.
    pub async fn remove_operation(&self, id: Uuid) -> Result<Operation> {
        let admitted = self.guard.remove_operation(id).await?;
        self.dispatch(self.dispatcher.guard_tripped(admitted.tripped));
        Ok(admitted.operation)
    }

    /// Replace the risk configuration, rederiving every threshold from
    /// the new capital and target. May trip the guard.
    pub async fn set_risk_config(
        &self,
        capital_total: rust_decimal::Decimal,
        target_daily_pct: rust_decimal::Decimal,
    ) -> Result<RiskConfig> {
        let start_date = self.guard.current_date().await;
        let config = RiskConfig::derive(capital_total, target_daily_pct, start_date)?;
        let tripped = self.guard.set_config(config.clone()).await;
        self.dispatch(self.dispatcher.guard_tripped(tripped));
        Ok(config)
    }

    /// Current risk configuration snapshot.
    pub async fn risk_config(&self) -> RiskConfig {
        self.guard.config().await
    }

    /// Start a new trading day, clearing any block.
    pub async fn reset_day(&self, date: NaiveDate) {
        self.guard.reset_day(date).await;
    }

    /// Whether the current day is blocked.
    pub fn is_blocked(&self) -> bool {
        self.guard.is_blocked()
    }

    /// State of the current trading day.
    pub async fn daily_state(&self) -> DailyState {
        self.guard.today().await
    }

    /// State of an arbitrary day.
    pub async fn daily_state_for(&self, date: NaiveDate) -> DailyState {
        self.guard.evaluate(date).await
    }

    // ---- leverage sessions ----

    /// Start a leverage session. Fails while one is active.
    pub async fn start_session(&self, config: LeverageSessionConfig) -> Result<LeverageSession> {
        self.leverage.start_session(config).await
    }

    /// Record an operation into the active session. Session operations
    /// live in their own risk scope and never touch the daily ledger.
    pub async fn record_session_operation(
        &self,
        draft: OperationDraft,
    ) -> Result<SessionOperation> {
        let outcome = self.leverage.record_operation(draft).await?;
        self.dispatch(self.dispatcher.session_transitioned(outcome.transition));
        Ok(outcome.operation)
    }

    /// Confirm a completed level and advance the active session.
    pub async fn advance_level(&self) -> Result<u8> {
        self.leverage.advance_level().await
    }

    /// The active session, if any.
    pub async fn active_session(&self) -> Option<LeverageSession> {
        self.leverage.active_session().await
    }

    /// Every session ever started, newest first.
    pub fn sessions(&self) -> Vec<LeverageSession> {
        self.leverage.sessions()
    }

    /// Per-level progress for a session.
    pub fn session_progress(&self, id: Uuid) -> Result<Vec<LevelProgress>> {
        self.leverage.progress(id)
    }

    /// Aggregate figures for a session.
    pub fn session_stats(&self, id: Uuid) -> Result<SessionStats> {
        self.leverage.stats(id)
    }

    /// Aggregate figures across every session ever started.
    pub fn overall_session_stats(&self) -> OverallSessionStats {
        self.leverage.overall_stats()
    }

    /// Running balance after each operation of a session.
    pub fn session_equity_curve(&self, id: Uuid) -> Result<Vec<EquityPoint>> {
        self.leverage.equity_curve(id)
    }

    // ---- statistics ----

    /// Statistics over the daily ledger, windowed around now.
    pub async fn statistics(&self, window: StatsWindow) -> StatisticsSnapshot {
        self.statistics_at(window, Utc::now()).await
    }

    /// Statistics windowed around an explicit reference time.
    pub async fn statistics_at(
        &self,
        window: StatsWindow,
        reference_time: chrono::DateTime<Utc>,
    ) -> StatisticsSnapshot {
        let operations = self.guard.operations().await;
        StatisticsAggregator::snapshot(&operations, window, reference_time)
    }
}
