//! Journal persistence port trait.

use crate::domain::account::Account;
use crate::domain::error::JournalError;
use crate::domain::trade::{NewTrade, TradeEntry};

pub trait JournalStore: Send + Sync {
    fn list_accounts(&self) -> Result<Vec<Account>, JournalError>;

    /// `Ok(None)` when no account has that name.
    fn load_account(&self, name: &str) -> Result<Option<Account>, JournalError>;

    /// Inserts or overwrites the account record. Trades are untouched.
    fn save_account(&self, account: &Account) -> Result<(), JournalError>;

    fn load_trades(&self, account: &str) -> Result<Vec<TradeEntry>, JournalError>;

    /// Validates the draft, assigns the next id and persists it.
    fn append_trade(&self, account: &str, trade: NewTrade) -> Result<TradeEntry, JournalError>;

    /// Overwrites the whole trade sheet for `account`.
    fn replace_trades(&self, account: &str, trades: &[TradeEntry]) -> Result<(), JournalError>;

    fn delete_trade(&self, account: &str, id: u64) -> Result<TradeEntry, JournalError>;

    /// Loads an account or fails with `UnknownAccount`.
    fn require_account(&self, name: &str) -> Result<Account, JournalError> {
        self.load_account(name)?
            .ok_or_else(|| JournalError::UnknownAccount {
                name: name.to_string(),
            })
    }

    /// Writes that reached this store but not its mirror. Zero for
    /// unmirrored stores.
    fn mirror_failures(&self) -> u64 {
        0
    }
}
