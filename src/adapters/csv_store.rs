//! Per-account CSV spreadsheets.
//!
//! Layout under the data directory:
//! - `accounts.csv`: `name,initial_capital,created`
//! - `<account>.csv`: `id,date,instrument,direction,pnl,risk,flags,feedback`

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::domain::account::{validate_account_name, Account};
use crate::domain::error::JournalError;
use crate::domain::trade::{
    format_flags, next_trade_id, parse_flags, sort_chronological, Direction, NewTrade, TradeEntry,
};
use crate::ports::journal_store::JournalStore;

const ACCOUNTS_FILE: &str = "accounts.csv";
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Serialize, Deserialize)]
struct AccountRow {
    name: String,
    initial_capital: f64,
    created: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct TradeRow {
    id: u64,
    date: String,
    instrument: String,
    direction: String,
    pnl: f64,
    /// Blank when the trader did not record the amount at risk.
    #[serde(default)]
    risk: Option<f64>,
    #[serde(default)]
    flags: String,
    #[serde(default)]
    feedback: String,
}

impl From<&TradeEntry> for TradeRow {
    fn from(trade: &TradeEntry) -> Self {
        TradeRow {
            id: trade.id,
            date: trade.date.format(DATE_FORMAT).to_string(),
            instrument: trade.instrument.clone(),
            direction: trade.direction.to_string(),
            pnl: trade.pnl,
            risk: Some(trade.risk),
            flags: format_flags(&trade.flags),
            feedback: trade.feedback.clone(),
        }
    }
}

impl TradeRow {
    fn into_entry(self, path: &Path, line: usize) -> Result<TradeEntry, JournalError> {
        let context = |reason: String| {
            JournalError::storage(format!("{} row {}: {}", path.display(), line, reason))
        };
        let date = parse_date(&self.date).map_err(context)?;
        let direction = self
            .direction
            .parse::<Direction>()
            .map_err(|e| context(e.to_string()))?;
        let flags = parse_flags(&self.flags).map_err(|e| context(e.to_string()))?;
        Ok(TradeEntry {
            id: self.id,
            date,
            instrument: self.instrument,
            direction,
            pnl: self.pnl,
            risk: self.risk.unwrap_or(0.0),
            flags,
            feedback: self.feedback,
        })
    }
}

fn parse_date(value: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT)
        .map_err(|e| format!("invalid date '{value}': {e}"))
}

pub struct CsvStore {
    base_path: PathBuf,
}

impl CsvStore {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Creates the data directory if needed.
    pub fn open(base_path: PathBuf) -> Result<Self, JournalError> {
        fs::create_dir_all(&base_path).map_err(|e| {
            JournalError::storage(format!(
                "failed to create data directory {}: {}",
                base_path.display(),
                e
            ))
        })?;
        Ok(Self::new(base_path))
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    fn accounts_path(&self) -> PathBuf {
        self.base_path.join(ACCOUNTS_FILE)
    }

    fn trades_path(&self, account: &str) -> Result<PathBuf, JournalError> {
        let name = validate_account_name(account)?;
        Ok(self.base_path.join(format!("{name}.csv")))
    }

    fn read_accounts(&self) -> Result<Vec<Account>, JournalError> {
        let path = self.accounts_path();
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(&path)?;
        let mut accounts = Vec::new();
        for (i, result) in rdr.deserialize::<AccountRow>().enumerate() {
            let row = result?;
            let created = parse_date(&row.created).map_err(|reason| {
                JournalError::storage(format!("{} row {}: {}", path.display(), i + 1, reason))
            })?;
            accounts.push(Account::new(&row.name, row.initial_capital, created)?);
        }
        Ok(accounts)
    }

    fn write_accounts(&self, accounts: &[Account]) -> Result<(), JournalError> {
        let rows: Vec<AccountRow> = accounts
            .iter()
            .map(|a| AccountRow {
                name: a.name.clone(),
                initial_capital: a.initial_capital,
                created: a.created.format(DATE_FORMAT).to_string(),
            })
            .collect();
        write_rows(&self.accounts_path(), &rows, &["name", "initial_capital", "created"])
    }

    fn read_trades(&self, path: &Path) -> Result<Vec<TradeEntry>, JournalError> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut rdr = csv::Reader::from_path(path)?;
        let mut trades = Vec::new();
        for (i, result) in rdr.deserialize::<TradeRow>().enumerate() {
            trades.push(result?.into_entry(path, i + 1)?);
        }
        sort_chronological(&mut trades);
        Ok(trades)
    }

    fn write_trades(&self, path: &Path, trades: &[TradeEntry]) -> Result<(), JournalError> {
        let rows: Vec<TradeRow> = trades.iter().map(TradeRow::from).collect();
        write_rows(
            path,
            &rows,
            &[
                "id",
                "date",
                "instrument",
                "direction",
                "pnl",
                "risk",
                "flags",
                "feedback",
            ],
        )
    }
}

/// Writes through a sibling temp file and renames it over `path`, so readers
/// never see a half-written sheet. The header is written explicitly so that
/// empty sheets keep their columns.
fn write_rows<T: Serialize>(path: &Path, rows: &[T], header: &[&str]) -> Result<(), JournalError> {
    let tmp = path.with_extension("csv.tmp");
    {
        let mut wtr = csv::WriterBuilder::new()
            .has_headers(false)
            .from_path(&tmp)?;
        wtr.write_record(header)?;
        for row in rows {
            wtr.serialize(row)?;
        }
        wtr.flush()?;
    }
    fs::rename(&tmp, path).map_err(|e| {
        JournalError::storage(format!("failed to replace {}: {}", path.display(), e))
    })?;
    debug!(path = %path.display(), rows = rows.len(), "wrote sheet");
    Ok(())
}

impl JournalStore for CsvStore {
    fn list_accounts(&self) -> Result<Vec<Account>, JournalError> {
        let mut accounts = self.read_accounts()?;
        accounts.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(accounts)
    }

    fn load_account(&self, name: &str) -> Result<Option<Account>, JournalError> {
        Ok(self.read_accounts()?.into_iter().find(|a| a.name == name))
    }

    fn save_account(&self, account: &Account) -> Result<(), JournalError> {
        let mut accounts = self.read_accounts()?;
        match accounts.iter_mut().find(|a| a.name == account.name) {
            Some(existing) => *existing = account.clone(),
            None => accounts.push(account.clone()),
        }
        self.write_accounts(&accounts)
    }

    fn load_trades(&self, account: &str) -> Result<Vec<TradeEntry>, JournalError> {
        let path = self.trades_path(account)?;
        self.read_trades(&path)
    }

    fn append_trade(&self, account: &str, trade: NewTrade) -> Result<TradeEntry, JournalError> {
        self.require_account(account)?;
        trade.validate()?;
        let path = self.trades_path(account)?;
        let mut trades = self.read_trades(&path)?;
        let entry = trade.into_entry(next_trade_id(&trades));
        trades.push(entry.clone());
        sort_chronological(&mut trades);
        self.write_trades(&path, &trades)?;
        Ok(entry)
    }

    fn replace_trades(&self, account: &str, trades: &[TradeEntry]) -> Result<(), JournalError> {
        let path = self.trades_path(account)?;
        let mut sorted = trades.to_vec();
        sort_chronological(&mut sorted);
        self.write_trades(&path, &sorted)
    }

    fn delete_trade(&self, account: &str, id: u64) -> Result<TradeEntry, JournalError> {
        let path = self.trades_path(account)?;
        let mut trades = self.read_trades(&path)?;
        let index = trades
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| JournalError::UnknownTrade {
                account: account.to_string(),
                id,
            })?;
        let removed = trades.remove(index);
        self.write_trades(&path, &trades)?;
        Ok(removed)
    }
}
