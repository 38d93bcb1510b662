//! Append-only, time-ordered store of journaled operations.

use chrono::{Datelike, NaiveDate};
use journal_core::types::{Operation, OperationPatch};
use journal_core::{Error, Result};
use rust_decimal::Decimal;
use uuid::Uuid;

/// The operation ledger. Admission checks live in the guard; the ledger
/// only stores and slices history.
#[derive(Debug, Default, Clone)]
pub struct OperationLedger {
    operations: Vec<Operation>,
}

impl OperationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an already-admitted operation.
    pub fn append(&mut self, operation: Operation) -> Uuid {
        let id = operation.id;
        self.operations.push(operation);
        id
    }

    /// Next sequence number for `date`: one past the highest ever
    /// assigned that day. Removals never free numbers for reuse.
    pub fn next_sequence(&self, date: NaiveDate) -> u32 {
        self.operations
            .iter()
            .filter(|op| op.timestamp.date_naive() == date)
            .map(|op| op.sequence_number)
            .max()
            .unwrap_or(0)
            + 1
    }

    /// All operations for a calendar day, in admission order.
    pub fn list_by_day(&self, date: NaiveDate) -> Vec<Operation> {
        self.operations
            .iter()
            .filter(|op| op.timestamp.date_naive() == date)
            .cloned()
            .collect()
    }

    /// All operations for a calendar month.
    pub fn list_by_month(&self, year: i32, month: u32) -> Vec<Operation> {
        self.operations
            .iter()
            .filter(|op| {
                let d = op.timestamp.date_naive();
                d.year() == year && d.month() == month
            })
            .cloned()
            .collect()
    }

    /// All operations for a calendar year.
    pub fn list_by_year(&self, year: i32) -> Vec<Operation> {
        self.operations
            .iter()
            .filter(|op| op.timestamp.date_naive().year() == year)
            .cloned()
            .collect()
    }

    /// The full history, in admission order.
    pub fn list_all(&self) -> Vec<Operation> {
        self.operations.clone()
    }

    /// Number of operations on `date`.
    pub fn day_count(&self, date: NaiveDate) -> u32 {
        self.operations
            .iter()
            .filter(|op| op.timestamp.date_naive() == date)
            .count() as u32
    }

    /// Cumulative pnl over `date`.
    pub fn day_pnl(&self, date: NaiveDate) -> Decimal {
        self.operations
            .iter()
            .filter(|op| op.timestamp.date_naive() == date)
            .map(|op| op.pnl)
            .sum()
    }

    pub fn get(&self, id: Uuid) -> Option<&Operation> {
        self.operations.iter().find(|op| op.id == id)
    }

    /// Apply a patch to an existing operation, returning the updated
    /// record. Timestamp and sequence number are untouched.
    pub fn update(&mut self, id: Uuid, patch: OperationPatch) -> Result<Operation> {
        let op = self
            .operations
            .iter_mut()
            .find(|op| op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        patch.apply(op);
        Ok(op.clone())
    }

    /// Remove an operation. Surviving operations keep their sequence
    /// numbers: they are historical, not positional.
    pub fn remove(&mut self, id: Uuid) -> Result<Operation> {
        let idx = self
            .operations
            .iter()
            .position(|op| op.id == id)
            .ok_or(Error::OperationNotFound(id))?;
        Ok(self.operations.remove(idx))
    }

    pub fn len(&self) -> usize {
        self.operations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use journal_core::types::{Direction, OperationDraft, OperationResult};

    fn draft_at(day: u32, hour: u32, pnl: i64) -> OperationDraft {
        OperationDraft::new(
            "EUR/USD",
            Direction::Call,
            OperationResult::Gain,
            Decimal::new(100, 0),
            Decimal::new(pnl, 0),
        )
        .with_timestamp(Utc.with_ymd_and_hms(2025, 3, day, hour, 0, 0).unwrap())
    }

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, day).unwrap()
    }

    #[test]
    fn test_day_slices_and_sums() {
        let mut ledger = OperationLedger::new();
        for (day, pnl) in [(10, 50), (10, -20), (11, 30)] {
            let seq = ledger.next_sequence(date(day));
            ledger.append(draft_at(day, 9, pnl).into_operation(seq));
        }

        assert_eq!(ledger.day_count(date(10)), 2);
        assert_eq!(ledger.day_pnl(date(10)), Decimal::new(30, 0));
        assert_eq!(ledger.list_by_day(date(11)).len(), 1);
        assert_eq!(ledger.list_by_month(2025, 3).len(), 3);
        assert_eq!(ledger.list_by_year(2025).len(), 3);
        assert!(ledger.list_by_month(2025, 4).is_empty());
    }

    #[test]
    fn test_sequence_is_dense_per_day() {
        let mut ledger = OperationLedger::new();
        for _ in 0..3 {
            let seq = ledger.next_sequence(date(10));
            ledger.append(draft_at(10, 9, 10).into_operation(seq));
        }
        let seq = ledger.next_sequence(date(11));
        ledger.append(draft_at(11, 9, 10).into_operation(seq));

        let day10: Vec<u32> = ledger
            .list_by_day(date(10))
            .iter()
            .map(|op| op.sequence_number)
            .collect();
        assert_eq!(day10, vec![1, 2, 3]);
        assert_eq!(ledger.list_by_day(date(11))[0].sequence_number, 1);
    }

    #[test]
    fn test_removal_never_renumbers() {
        let mut ledger = OperationLedger::new();
        let mut ids = Vec::new();
        for _ in 0..3 {
            let seq = ledger.next_sequence(date(10));
            ids.push(ledger.append(draft_at(10, 9, 10).into_operation(seq)));
        }

        ledger.remove(ids[1]).unwrap();
        let remaining: Vec<u32> = ledger
            .list_by_day(date(10))
            .iter()
            .map(|op| op.sequence_number)
            .collect();
        assert_eq!(remaining, vec![1, 3]);

        // Next admission continues past the highest historical number.
        assert_eq!(ledger.next_sequence(date(10)), 4);
    }

    #[test]
    fn test_update_unknown_id_fails_loudly() {
        let mut ledger = OperationLedger::new();
        let missing = Uuid::new_v4();
        assert!(matches!(
            ledger.update(missing, OperationPatch::default()),
            Err(Error::OperationNotFound(id)) if id == missing
        ));
        assert!(matches!(
            ledger.remove(missing),
            Err(Error::OperationNotFound(_))
        ));
    }
}
