//! Leverage Engine
//!
//! Bounded multi-level capital-growth sessions. Each session is an
//! independent risk scope with its own sub-ledger, compounding level
//! targets and a hard total stop. At most one session is active at a
//! time; concluded sessions stay queryable in the archive.

pub mod engine;

pub use engine::{
    EquityPoint, LeverageEngine, OverallSessionStats, SessionOutcome, SessionStats,
};
