//! A primary store with a best-effort mirror.
//!
//! Reads always come from the primary. Writes go to the primary first; if that
//! succeeds the same write is replayed against the mirror. Mirror failures are
//! logged and counted, never returned, so the local spreadsheets stay the
//! source of truth. Divergence is repaired with the `sync` command.

use std::sync::atomic::{AtomicU64, Ordering};
use tracing::warn;

use crate::domain::account::Account;
use crate::domain::error::JournalError;
use crate::domain::trade::{sort_chronological, NewTrade, TradeEntry};
use crate::ports::journal_store::JournalStore;

pub struct MirroredStore {
    primary: Box<dyn JournalStore>,
    mirror: Box<dyn JournalStore>,
    mirror_failures: AtomicU64,
}

impl MirroredStore {
    pub fn new(primary: Box<dyn JournalStore>, mirror: Box<dyn JournalStore>) -> Self {
        Self {
            primary,
            mirror,
            mirror_failures: AtomicU64::new(0),
        }
    }

    pub fn primary(&self) -> &dyn JournalStore {
        self.primary.as_ref()
    }

    pub fn mirror(&self) -> &dyn JournalStore {
        self.mirror.as_ref()
    }

    fn mirror_write<T>(&self, operation: &str, account: &str, result: Result<T, JournalError>) {
        if let Err(e) = result {
            self.mirror_failures.fetch_add(1, Ordering::Relaxed);
            warn!(operation, account, error = %e, "mirror write failed; run sync to reconcile");
        }
    }
}

impl JournalStore for MirroredStore {
    fn list_accounts(&self) -> Result<Vec<Account>, JournalError> {
        self.primary.list_accounts()
    }

    fn load_account(&self, name: &str) -> Result<Option<Account>, JournalError> {
        self.primary.load_account(name)
    }

    fn save_account(&self, account: &Account) -> Result<(), JournalError> {
        self.primary.save_account(account)?;
        self.mirror_write(
            "save_account",
            &account.name,
            self.mirror.save_account(account),
        );
        Ok(())
    }

    fn load_trades(&self, account: &str) -> Result<Vec<TradeEntry>, JournalError> {
        self.primary.load_trades(account)
    }

    /// The mirror receives the entry under the id the primary assigned.
    fn append_trade(&self, account: &str, trade: NewTrade) -> Result<TradeEntry, JournalError> {
        let entry = self.primary.append_trade(account, trade)?;
        let result = self
            .ensure_mirror_account(account)
            .and_then(|_| self.mirror_insert(account, &entry));
        self.mirror_write("append_trade", account, result);
        Ok(entry)
    }

    fn replace_trades(&self, account: &str, trades: &[TradeEntry]) -> Result<(), JournalError> {
        self.primary.replace_trades(account, trades)?;
        let result = self
            .ensure_mirror_account(account)
            .and_then(|_| self.mirror.replace_trades(account, trades));
        self.mirror_write("replace_trades", account, result);
        Ok(())
    }

    fn delete_trade(&self, account: &str, id: u64) -> Result<TradeEntry, JournalError> {
        let removed = self.primary.delete_trade(account, id)?;
        self.mirror_write("delete_trade", account, self.mirror.delete_trade(account, id));
        Ok(removed)
    }

    /// Mirror writes that failed since this store was opened.
    fn mirror_failures(&self) -> u64 {
        self.mirror_failures.load(Ordering::Relaxed)
    }
}

impl MirroredStore {
    /// Copies the account record to the mirror when it is missing there.
    fn ensure_mirror_account(&self, account: &str) -> Result<(), JournalError> {
        if self.mirror.load_account(account)?.is_none() {
            let record = self.primary.require_account(account)?;
            self.mirror.save_account(&record)?;
        }
        Ok(())
    }

    /// Adds `entry` to the mirror's sheet, keeping every trade already there.
    /// A different trade under the same id is left for `sync` to resolve.
    fn mirror_insert(&self, account: &str, entry: &TradeEntry) -> Result<(), JournalError> {
        let mut trades = self.mirror.load_trades(account)?;
        match trades.iter().find(|t| t.id == entry.id) {
            Some(existing) if existing == entry => return Ok(()),
            Some(_) => {
                return Err(JournalError::Mirror {
                    reason: format!("mirror already holds a different trade #{}", entry.id),
                });
            }
            None => trades.push(entry.clone()),
        }
        sort_chronological(&mut trades);
        self.mirror.replace_trades(account, &trades)
    }
}
