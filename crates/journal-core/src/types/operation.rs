//! Trading operation records for the risk journal.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Direction of a binary-options entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// Buy / up.
    Call,
    /// Sell / down.
    Put,
}

/// Self-reported outcome of an operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationResult {
    Gain,
    Loss,
}

/// A single journaled trading operation.
///
/// Immutable after admission except through an explicit
/// [`OperationPatch`] or removal issued by the caller.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Operation {
    /// Unique identifier for this operation.
    pub id: Uuid,
    /// Position within its day (1..cap). Historical, never renumbered.
    pub sequence_number: u32,
    /// Traded asset symbol (e.g. "EUR/USD").
    pub asset: String,
    /// Entry direction.
    pub direction: Direction,
    /// Reported outcome.
    pub result: OperationResult,
    /// Capital committed to the entry. Validated against the configured
    /// maximum at insertion time only.
    pub entry_amount: Decimal,
    /// Signed profit or loss of the operation.
    pub pnl: Decimal,
    /// When the operation was taken.
    pub timestamp: DateTime<Utc>,
    /// Free-form note.
    pub note: Option<String>,
    /// Reference to an externally stored evidence screenshot.
    pub evidence_ref: Option<String>,
}

impl Operation {
    /// Whether this operation counts as a win for win-rate purposes.
    pub fn is_win(&self) -> bool {
        self.result == OperationResult::Gain
    }
}

/// Caller-supplied input for a new operation, before the engine assigns
/// id and sequence number.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OperationDraft {
    pub asset: String,
    pub direction: Direction,
    pub result: OperationResult,
    pub entry_amount: Decimal,
    pub pnl: Decimal,
    pub timestamp: DateTime<Utc>,
    pub note: Option<String>,
    pub evidence_ref: Option<String>,
}

impl OperationDraft {
    /// Create a draft timestamped now.
    pub fn new(
        asset: impl Into<String>,
        direction: Direction,
        result: OperationResult,
        entry_amount: Decimal,
        pnl: Decimal,
    ) -> Self {
        Self {
            asset: asset.into(),
            direction,
            result,
            entry_amount,
            pnl,
            timestamp: Utc::now(),
            note: None,
            evidence_ref: None,
        }
    }

    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_evidence(mut self, evidence_ref: impl Into<String>) -> Self {
        self.evidence_ref = Some(evidence_ref.into());
        self
    }

    /// Materialize the draft into a stored operation.
    pub fn into_operation(self, sequence_number: u32) -> Operation {
        Operation {
            id: Uuid::new_v4(),
            sequence_number,
            asset: self.asset,
            direction: self.direction,
            result: self.result,
            entry_amount: self.entry_amount,
            pnl: self.pnl,
            timestamp: self.timestamp,
            note: self.note,
            evidence_ref: self.evidence_ref,
        }
    }
}

/// Partial update for an existing operation.
///
/// Timestamp and sequence number are deliberately not patchable: edits
/// keep the operation's place in history.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OperationPatch {
    pub asset: Option<String>,
    pub direction: Option<Direction>,
    pub result: Option<OperationResult>,
    pub entry_amount: Option<Decimal>,
    pub pnl: Option<Decimal>,
    pub note: Option<Option<String>>,
    pub evidence_ref: Option<Option<String>>,
}

impl OperationPatch {
    /// Apply the patch in place.
    pub fn apply(self, op: &mut Operation) {
        if let Some(asset) = self.asset {
            op.asset = asset;
        }
        if let Some(direction) = self.direction {
            op.direction = direction;
        }
        if let Some(result) = self.result {
            op.result = result;
        }
        if let Some(entry_amount) = self.entry_amount {
            op.entry_amount = entry_amount;
        }
        if let Some(pnl) = self.pnl {
            op.pnl = pnl;
        }
        if let Some(note) = self.note {
            op.note = note;
        }
        if let Some(evidence_ref) = self.evidence_ref {
            op.evidence_ref = evidence_ref;
        }
    }
}
