#![allow(dead_code)]

use chrono::NaiveDate;
use std::collections::{BTreeSet, HashMap};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tradejournal::domain::account::Account;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::trade::{
    next_trade_id, sort_chronological, Direction, NewTrade, RiskFlag, TradeEntry,
};
use tradejournal::ports::journal_store::JournalStore;

/// In-memory store for exercising code that only needs the port.
#[derive(Default)]
pub struct MockStore {
    accounts: Mutex<Vec<Account>>,
    trades: Mutex<HashMap<String, Vec<TradeEntry>>>,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_account(self, account: Account) -> Self {
        self.accounts.lock().unwrap().push(account);
        self
    }

    pub fn with_trades(self, account: &str, trades: Vec<TradeEntry>) -> Self {
        self.trades
            .lock()
            .unwrap()
            .insert(account.to_string(), trades);
        self
    }
}

impl JournalStore for MockStore {
    fn list_accounts(&self) -> Result<Vec<Account>, JournalError> {
        let mut accounts = self.accounts.lock().unwrap().clone();
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    fn load_account(&self, name: &str) -> Result<Option<Account>, JournalError> {
        Ok(self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.name == name)
            .cloned())
    }

    fn save_account(&self, account: &Account) -> Result<(), JournalError> {
        let mut accounts = self.accounts.lock().unwrap();
        accounts.retain(|a| a.name != account.name);
        accounts.push(account.clone());
        Ok(())
    }

    fn load_trades(&self, account: &str) -> Result<Vec<TradeEntry>, JournalError> {
        let mut trades = self
            .trades
            .lock()
            .unwrap()
            .get(account)
            .cloned()
            .unwrap_or_default();
        sort_chronological(&mut trades);
        Ok(trades)
    }

    fn append_trade(&self, account: &str, trade: NewTrade) -> Result<TradeEntry, JournalError> {
        trade.validate()?;
        self.require_account(account)?;
        let mut all = self.trades.lock().unwrap();
        let sheet = all.entry(account.to_string()).or_default();
        let entry = trade.into_entry(next_trade_id(sheet));
        sheet.push(entry.clone());
        Ok(entry)
    }

    fn replace_trades(&self, account: &str, trades: &[TradeEntry]) -> Result<(), JournalError> {
        self.trades
            .lock()
            .unwrap()
            .insert(account.to_string(), trades.to_vec());
        Ok(())
    }

    fn delete_trade(&self, account: &str, id: u64) -> Result<TradeEntry, JournalError> {
        let mut all = self.trades.lock().unwrap();
        let sheet = all.entry(account.to_string()).or_default();
        match sheet.iter().position(|t| t.id == id) {
            Some(index) => Ok(sheet.remove(index)),
            None => Err(JournalError::UnknownTrade {
                account: account.to_string(),
                id,
            }),
        }
    }
}

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn account(name: &str, capital: f64) -> Account {
    Account::new(name, capital, date(2024, 1, 1)).unwrap()
}

pub fn entry(id: u64, day: NaiveDate, instrument: &str, pnl: f64) -> TradeEntry {
    TradeEntry {
        id,
        date: day,
        instrument: instrument.to_string(),
        direction: Direction::Long,
        pnl,
        risk: 100.0,
        flags: BTreeSet::new(),
        feedback: String::new(),
    }
}

pub fn flagged_entry(id: u64, day: NaiveDate, pnl: f64, flag: RiskFlag) -> TradeEntry {
    let mut trade = entry(id, day, "NQ", pnl);
    trade.flags.insert(flag);
    trade.feedback = "broke the plan".to_string();
    trade
}

pub fn draft(day: NaiveDate, instrument: &str, pnl: f64) -> NewTrade {
    NewTrade {
        date: day,
        instrument: instrument.to_string(),
        direction: Direction::Long,
        pnl,
        risk: 100.0,
        flags: BTreeSet::new(),
        feedback: String::new(),
    }
}

/// Writes `journal.ini` into `dir` with the data directory under `dir/data`.
/// `extra` is appended verbatim.
pub fn write_config(dir: &Path, extra: &str) -> PathBuf {
    let data_dir = dir.join("data");
    let content = format!(
        "[journal]\ndata_dir = {}\ndefault_account = main\n\n[risk]\nrisk_pct = 0.01\nmilestone_step = 0.5\nbase_trades = 2\ntrades_step = 1\n\n{}",
        data_dir.display(),
        extra
    );
    let path = dir.join("journal.ini");
    std::fs::write(&path, content).unwrap();
    path
}

pub fn mirror_section(dir: &Path, policy: &str) -> String {
    format!(
        "[mirror]\nenabled = true\npath = {}\npool_size = 2\nmerge_policy = {}\n",
        dir.join("mirror.db").display(),
        policy
    )
}
