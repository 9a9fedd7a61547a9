//! Domain-specific errors for the banking simulator.
//!
//! Contains error variants for common failure cases like:
//! - Account lookup errors (unknown user, administrator carries no balance)
//! - Amount validation errors (non-positive, not a multiple of ten, over the
//!   per-withdrawal limit, insufficient balance, deposit past the balance
//!   limit)
//! - Directory management errors (duplicate user, protected administrator)
//! - Persistence and rendering errors (store unreadable/unwritable, chart
//!   output failed)
//!
//! Validation, not-found, and chart failures are recoverable: the session
//! prints the message and re-prompts, and no account state has been mutated.
//! I/O and serialization failures are fatal and end the session, so the
//! process never keeps running on in-memory state that diverges from the
//! store. Display texts double as the console messages shown to the user.

use thiserror::Error;

use crate::directory::WITHDRAW_LIMIT;

#[derive(Debug, Error)]
pub enum Error {
    #[error("User not found")]
    AccountNotFound,

    #[error("The administrator account cannot be deleted")]
    AdminUndeletable,

    #[error("The amount must be positive")]
    AmountMustBePositive,

    #[error("Your balance cannot hold that amount")]
    BalanceLimitExceeded,

    #[error("No balance is tracked for this account")]
    BalanceNotTracked,

    #[error("You do not have sufficient balance")]
    InsufficientFunds,

    #[error("Invalid PIN format. Must be 4 digits.")]
    InvalidPinFormat,

    #[error("The amount must be a multiple of 10")]
    NotMultipleOfTen,

    #[error("User already exists")]
    UserAlreadyExists,

    #[error("You can only withdraw up to ${} at a time", WITHDRAW_LIMIT)]
    WithdrawLimitExceeded,

    #[error("Failed to render chart: {0}")]
    Chart(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// True for failures the session reports and recovers from by
    /// re-prompting; false for failures that must abort the session.
    pub fn is_recoverable(&self) -> bool {
        !matches!(self, Error::Io(_) | Error::Serialization(_))
    }
}
