use serde::{Deserialize, Serialize};

/// A single entry in the persisted user store.
///
/// The store file maps each username to one of these records. Regular
/// account holders always carry a balance; the administrator record tracks
/// none, and its `balance` key is omitted from the file entirely rather than
/// written as `null`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AccountRecord {
    #[serde(rename = "PIN")]
    pub pin: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub balance: Option<i64>,
}

impl AccountRecord {
    /// Creates a record for a regular account holder.
    pub fn with_balance(pin: impl Into<String>, balance: i64) -> Self {
        Self {
            pin: pin.into(),
            balance: Some(balance),
        }
    }

    /// Creates the administrator record: PIN only, no balance.
    pub fn admin(pin: impl Into<String>) -> Self {
        Self {
            pin: pin.into(),
            balance: None,
        }
    }
}

/// Checks the PIN format rule: exactly four ASCII decimal digits.
pub fn pin_is_valid(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}
