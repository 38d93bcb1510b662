//! Risk Guard
//!
//! Daily capital-preservation guard for the riskdesk journal: an
//! append-only operation ledger plus the Safe/Warning/Blocked state
//! machine that decides whether new operations may be admitted.

pub mod guard;
pub mod ledger;

pub use guard::{Admitted, DailyGuard};
pub use ledger::OperationLedger;
