//! Alert events for the notification layer.
//!
//! The engine never plays sounds or renders overlays itself: state
//! transitions are translated into discrete `Alert` values and handed to
//! the caller, who owns all presentation side effects.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::risk::BlockReason;
use crate::types::session::SessionTransition;

/// Kind of notable transition the alert describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertKind {
    StopGain,
    StopLoss,
    OperationLimit,
    LevelComplete,
    FinalTargetReached,
    TotalStopReached,
}

/// A fire-and-forget notification event. The engine keeps no delivery
/// state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Alert {
    pub kind: AlertKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

/// Stateless translator from engine edge transitions to alerts.
///
/// Emits zero or one alert per recomputation; repeated recomputation of
/// an already-blocked or already-concluded state produces nothing
/// because the engines only report transitions on the edge.
#[derive(Debug, Default, Clone, Copy)]
pub struct AlertDispatcher;

impl AlertDispatcher {
    pub fn new() -> Self {
        Self
    }

    /// Translate a daily-guard trip into an alert.
    pub fn guard_tripped(&self, reason: Option<BlockReason>) -> Option<Alert> {
        let reason = reason?;
        let (kind, message) = match reason {
            BlockReason::StopGain => (
                AlertKind::StopGain,
                "STOP GAIN reached - trading is halted for the day",
            ),
            BlockReason::StopLoss => (
                AlertKind::StopLoss,
                "STOP LOSS reached - trading is halted for the day",
            ),
            BlockReason::LimitOperations => (
                AlertKind::OperationLimit,
                "Daily operation limit reached - trading is halted for the day",
            ),
        };
        Some(Alert {
            kind,
            message: message.to_string(),
            timestamp: Utc::now(),
        })
    }

    /// Translate a leverage-session transition into an alert.
    pub fn session_transitioned(&self, transition: Option<SessionTransition>) -> Option<Alert> {
        let transition = transition?;
        let (kind, message) = match transition {
            SessionTransition::LevelComplete { level } => (
                AlertKind::LevelComplete,
                format!("Level {level} complete - confirm to advance to the next level"),
            ),
            SessionTransition::FinalTargetReached => (
                AlertKind::FinalTargetReached,
                "Final target reached - session completed".to_string(),
            ),
            SessionTransition::TotalStopReached => (
                AlertKind::TotalStopReached,
                "Total stop reached - session aborted".to_string(),
            ),
        };
        Some(Alert {
            kind,
            message,
            timestamp: Utc::now(),
        })
    }
}
