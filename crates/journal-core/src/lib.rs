//! Journal Core Library
//!
//! Shared domain types, typed errors and configuration loading for the
//! riskdesk engine crates.

pub mod alert;
pub mod config;
pub mod error;
pub mod types;

pub use error::{Error, Result};
