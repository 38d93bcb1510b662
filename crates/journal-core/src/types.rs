//! Core domain types for the riskdesk engine.

pub mod operation;
pub mod risk;
pub mod session;

pub use operation::*;
pub use risk::*;
pub use session::*;
