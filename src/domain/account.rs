//! Trading accounts. Each account owns one trade spreadsheet.

use chrono::NaiveDate;

use super::error::JournalError;

pub const MAX_ACCOUNT_NAME_LEN: usize = 64;

#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub name: String,
    pub initial_capital: f64,
    pub created: NaiveDate,
}

impl Account {
    pub fn new(
        name: &str,
        initial_capital: f64,
        created: NaiveDate,
    ) -> Result<Self, JournalError> {
        let name = validate_account_name(name)?;
        if !initial_capital.is_finite() || initial_capital <= 0.0 {
            return Err(JournalError::InvalidAccount {
                reason: "initial capital must be positive".into(),
            });
        }
        Ok(Account {
            name,
            initial_capital,
            created,
        })
    }
}

/// Account names double as file stems, so only `[A-Za-z0-9_-]` is allowed.
pub fn validate_account_name(name: &str) -> Result<String, JournalError> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(JournalError::InvalidAccount {
            reason: "account name must not be empty".into(),
        });
    }
    if trimmed.len() > MAX_ACCOUNT_NAME_LEN {
        return Err(JournalError::InvalidAccount {
            reason: format!("account name longer than {MAX_ACCOUNT_NAME_LEN} characters"),
        });
    }
    if let Some(c) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
    {
        return Err(JournalError::InvalidAccount {
            reason: format!("account name contains invalid character '{c}'"),
        });
    }
    // Reserved for the account registry file.
    if trimmed.eq_ignore_ascii_case("accounts") {
        return Err(JournalError::InvalidAccount {
            reason: "account name 'accounts' is reserved".into(),
        });
    }
    Ok(trimmed.to_string())
}
