//! Error types for the riskdesk engine.
//!
//! Every rule violation is a typed variant with a reason code. Rejections
//! are expected user-facing conditions: nothing here is retried, the
//! caller corrects the input and resubmits.

use crate::types::risk::BlockReason;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum Error {
    #[error("invalid risk configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("daily operation cap of {cap} reached")]
    CapacityExceeded { cap: u32 },

    #[error("entry amount {amount} exceeds maximum {max}")]
    EntryTooLarge { amount: Decimal, max: Decimal },

    #[error("operation dated {date} does not belong to the current trading day {current_day}")]
    OutsideTradingDay {
        date: NaiveDate,
        current_day: NaiveDate,
    },

    #[error("trading is blocked for the day: {reason}")]
    GuardBlocked { reason: BlockReason },

    #[error("a leverage session is already active")]
    SessionAlreadyActive,

    #[error("no active leverage session")]
    SessionNotActive,

    #[error("level {level} target has not been met")]
    LevelNotComplete { level: u8 },

    #[error("operation {0} not found")]
    OperationNotFound(Uuid),

    #[error("operation references unknown session {0}")]
    UnknownSession(Uuid),

    #[error("configuration file error: {0}")]
    ConfigFile(#[from] config::ConfigError),

    #[error("configuration error: {message}")]
    Config { message: String },
}

pub type Result<T> = std::result::Result<T, Error>;
