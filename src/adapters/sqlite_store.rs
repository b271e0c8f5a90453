//! SQLite journal store, used as the mirror copy of the spreadsheets.

use crate::domain::account::Account;
use crate::domain::error::JournalError;
use crate::domain::settings::MirrorSettings;
use crate::domain::trade::{
    format_flags, next_trade_id, parse_flags, Direction, NewTrade, TradeEntry,
};
use crate::ports::config_port::ConfigPort;
use crate::ports::journal_store::JournalStore;
use chrono::NaiveDate;
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::{params, OptionalExtension};

const DATE_FORMAT: &str = "%Y-%m-%d";

pub struct SqliteStore {
    pool: Pool<SqliteConnectionManager>,
}

fn pool_error(e: r2d2::Error) -> JournalError {
    JournalError::Storage {
        reason: e.to_string(),
    }
}

fn query_error(e: rusqlite::Error) -> JournalError {
    JournalError::StorageQuery {
        reason: e.to_string(),
    }
}

fn conversion_error(
    column: usize,
    e: impl std::error::Error + Send + Sync + 'static,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, rusqlite::types::Type::Text, Box::new(e))
}

fn parse_date(column: usize, value: &str) -> Result<NaiveDate, rusqlite::Error> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| conversion_error(column, e))
}

fn trade_from_row(row: &rusqlite::Row<'_>) -> Result<TradeEntry, rusqlite::Error> {
    let id: i64 = row.get(0)?;
    let date: String = row.get(1)?;
    let direction: String = row.get(3)?;
    let flags: String = row.get(6)?;
    Ok(TradeEntry {
        id: id as u64,
        date: parse_date(1, &date)?,
        instrument: row.get(2)?,
        direction: direction
            .parse::<Direction>()
            .map_err(|e| conversion_error(3, e))?,
        pnl: row.get(4)?,
        risk: row.get(5)?,
        flags: parse_flags(&flags).map_err(|e| conversion_error(6, e))?,
        feedback: row.get(7)?,
    })
}

fn insert_trade(
    conn: &rusqlite::Connection,
    account: &str,
    trade: &TradeEntry,
) -> Result<(), JournalError> {
    conn.execute(
        "INSERT INTO trades (account, id, date, instrument, direction, pnl, risk, flags, feedback)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            account,
            trade.id as i64,
            trade.date.format(DATE_FORMAT).to_string(),
            trade.instrument,
            trade.direction.to_string(),
            trade.pnl,
            trade.risk,
            format_flags(&trade.flags),
            trade.feedback
        ],
    )
    .map_err(query_error)?;
    Ok(())
}

impl SqliteStore {
    /// Reads `[mirror] path` and `pool_size`.
    pub fn from_config(config: &dyn ConfigPort) -> Result<Self, JournalError> {
        let db_path = config.require_string("mirror", "path")?;
        let pool_size = config.get_int("mirror", "pool_size", 4).clamp(1, 64) as u32;
        Self::open(&db_path, pool_size)
    }

    pub fn from_settings(settings: &MirrorSettings) -> Result<Self, JournalError> {
        Self::open(&settings.path.to_string_lossy(), settings.pool_size)
    }

    fn open(db_path: &str, pool_size: u32) -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::file(db_path);
        let pool = Pool::builder()
            .max_size(pool_size)
            .build(manager)
            .map_err(pool_error)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn in_memory() -> Result<Self, JournalError> {
        let manager = SqliteConnectionManager::memory();
        let pool = Pool::builder()
            .max_size(1)
            .build(manager)
            .map_err(pool_error)?;
        let store = Self { pool };
        store.initialize_schema()?;
        Ok(store)
    }

    pub fn initialize_schema(&self) -> Result<(), JournalError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS accounts (
                name TEXT PRIMARY KEY,
                initial_capital REAL NOT NULL,
                created TEXT NOT NULL
            );
            CREATE TABLE IF NOT EXISTS trades (
                account TEXT NOT NULL,
                id INTEGER NOT NULL,
                date TEXT NOT NULL,
                instrument TEXT NOT NULL,
                direction TEXT NOT NULL,
                pnl REAL NOT NULL,
                risk REAL NOT NULL DEFAULT 0,
                flags TEXT NOT NULL DEFAULT '',
                feedback TEXT NOT NULL DEFAULT '',
                PRIMARY KEY (account, id)
            );
            CREATE INDEX IF NOT EXISTS idx_trades_account_date ON trades(account, date);",
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn query_trades(
        conn: &rusqlite::Connection,
        account: &str,
    ) -> Result<Vec<TradeEntry>, JournalError> {
        let mut stmt = conn
            .prepare(
                "SELECT id, date, instrument, direction, pnl, risk, flags, feedback
                 FROM trades
                 WHERE account = ?1
                 ORDER BY date ASC, id ASC",
            )
            .map_err(query_error)?;
        let rows = stmt
            .query_map(params![account], trade_from_row)
            .map_err(query_error)?;

        let mut trades = Vec::new();
        for row in rows {
            trades.push(row.map_err(query_error)?);
        }
        Ok(trades)
    }
}

impl JournalStore for SqliteStore {
    fn list_accounts(&self) -> Result<Vec<Account>, JournalError> {
        let conn = self.pool.get().map_err(pool_error)?;
        let mut stmt = conn
            .prepare("SELECT name, initial_capital, created FROM accounts ORDER BY name")
            .map_err(query_error)?;
        let rows = stmt
            .query_map([], |row| {
                let created: String = row.get(2)?;
                Ok(Account {
                    name: row.get(0)?,
                    initial_capital: row.get(1)?,
                    created: parse_date(2, &created)?,
                })
            })
            .map_err(query_error)?;

        let mut accounts = Vec::new();
        for row in rows {
            accounts.push(row.map_err(query_error)?);
        }
        Ok(accounts)
    }

    fn load_account(&self, name: &str) -> Result<Option<Account>, JournalError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.query_row(
            "SELECT name, initial_capital, created FROM accounts WHERE name = ?1",
            params![name],
            |row| {
                let created: String = row.get(2)?;
                Ok(Account {
                    name: row.get(0)?,
                    initial_capital: row.get(1)?,
                    created: parse_date(2, &created)?,
                })
            },
        )
        .optional()
        .map_err(query_error)
    }

    fn save_account(&self, account: &Account) -> Result<(), JournalError> {
        let conn = self.pool.get().map_err(pool_error)?;
        conn.execute(
            "INSERT OR REPLACE INTO accounts (name, initial_capital, created)
             VALUES (?1, ?2, ?3)",
            params![
                account.name,
                account.initial_capital,
                account.created.format(DATE_FORMAT).to_string()
            ],
        )
        .map_err(query_error)?;
        Ok(())
    }

    fn load_trades(&self, account: &str) -> Result<Vec<TradeEntry>, JournalError> {
        let conn = self.pool.get().map_err(pool_error)?;
        Self::query_trades(&conn, account)
    }

    fn append_trade(&self, account: &str, trade: NewTrade) -> Result<TradeEntry, JournalError> {
        self.require_account(account)?;
        trade.validate()?;

        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;
        let existing = Self::query_trades(&tx, account)?;
        let entry = trade.into_entry(next_trade_id(&existing));
        insert_trade(&tx, account, &entry)?;
        tx.commit().map_err(query_error)?;
        Ok(entry)
    }

    fn replace_trades(&self, account: &str, trades: &[TradeEntry]) -> Result<(), JournalError> {
        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;
        tx.execute("DELETE FROM trades WHERE account = ?1", params![account])
            .map_err(query_error)?;
        for trade in trades {
            insert_trade(&tx, account, trade)?;
        }
        tx.commit().map_err(query_error)?;
        Ok(())
    }

    fn delete_trade(&self, account: &str, id: u64) -> Result<TradeEntry, JournalError> {
        let mut conn = self.pool.get().map_err(pool_error)?;
        let tx = conn.transaction().map_err(query_error)?;
        let removed = tx
            .query_row(
                "SELECT id, date, instrument, direction, pnl, risk, flags, feedback
                 FROM trades WHERE account = ?1 AND id = ?2",
                params![account, id as i64],
                trade_from_row,
            )
            .optional()
            .map_err(query_error)?
            .ok_or_else(|| JournalError::UnknownTrade {
                account: account.to_string(),
                id,
            })?;
        tx.execute(
            "DELETE FROM trades WHERE account = ?1 AND id = ?2",
            params![account, id as i64],
        )
        .map_err(query_error)?;
        tx.commit().map_err(query_error)?;
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::file_config_adapter::FileConfigAdapter;
    use crate::domain::trade::RiskFlag;
    use std::collections::BTreeSet;

    fn date(m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, m, d).unwrap()
    }

    fn setup() -> SqliteStore {
        let store = SqliteStore::in_memory().unwrap();
        store
            .save_account(&Account::new("main", 25_000.0, date(1, 2)).unwrap())
            .unwrap();
        store
    }

    fn draft(day: u32, pnl: f64) -> NewTrade {
        NewTrade {
            date: date(3, day),
            instrument: "NQ".into(),
            direction: Direction::Short,
            pnl,
            risk: 250.0,
            flags: BTreeSet::new(),
            feedback: String::new(),
        }
    }

    #[test]
    fn initialize_schema_is_idempotent() {
        let store = setup();
        store.initialize_schema().unwrap();
        assert_eq!(store.list_accounts().unwrap().len(), 1);
    }

    #[test]
    fn account_round_trip() {
        let store = setup();
        let loaded = store.load_account("main").unwrap().unwrap();
        assert_eq!(loaded.created, date(1, 2));
        assert!((loaded.initial_capital - 25_000.0).abs() < f64::EPSILON);
        assert!(store.load_account("other").unwrap().is_none());
    }

    #[test]
    fn append_and_load_in_date_order() {
        let store = setup();
        store.append_trade("main", draft(5, 500.0)).unwrap();
        let mut flagged = draft(4, -900.0);
        flagged.flags.insert(RiskFlag::NoStopLoss);
        flagged.feedback = "Held through the news spike".into();
        store.append_trade("main", flagged).unwrap();

        let trades = store.load_trades("main").unwrap();
        assert_eq!(trades.len(), 2);
        assert_eq!(trades[0].id, 2);
        assert!(trades[0].flags.contains(&RiskFlag::NoStopLoss));
        assert_eq!(trades[1].id, 1);
        assert_eq!(trades[1].direction, Direction::Short);
    }

    #[test]
    fn trades_are_scoped_per_account() {
        let store = setup();
        store
            .save_account(&Account::new("swing", 5_000.0, date(1, 2)).unwrap())
            .unwrap();
        store.append_trade("main", draft(1, 1.0)).unwrap();
        let swing = store.append_trade("swing", draft(1, 2.0)).unwrap();
        assert_eq!(swing.id, 1);
        assert_eq!(store.load_trades("main").unwrap().len(), 1);
    }

    #[test]
    fn append_requires_account() {
        let store = setup();
        let err = store.append_trade("ghost", draft(1, 1.0)).unwrap_err();
        assert!(matches!(err, JournalError::UnknownAccount { .. }));
    }

    #[test]
    fn replace_and_delete() {
        let store = setup();
        let trades = vec![draft(1, 10.0).into_entry(3), draft(2, -5.0).into_entry(9)];
        store.replace_trades("main", &trades).unwrap();
        assert_eq!(store.load_trades("main").unwrap(), trades);

        let removed = store.delete_trade("main", 9).unwrap();
        assert_eq!(removed.id, 9);
        assert!(matches!(
            store.delete_trade("main", 9),
            Err(JournalError::UnknownTrade { id: 9, .. })
        ));
        assert_eq!(store.load_trades("main").unwrap().len(), 1);
    }

    #[test]
    fn from_config_requires_path() {
        let config = FileConfigAdapter::from_string("[mirror]\nenabled = true\n").unwrap();
        assert!(matches!(
            SqliteStore::from_config(&config),
            Err(JournalError::ConfigMissing { .. })
        ));
    }

    #[test]
    fn from_config_opens_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let db = dir.path().join("mirror.db");
        let config =
            FileConfigAdapter::from_string(&format!("[mirror]\npath = {}\n", db.display()))
                .unwrap();
        let store = SqliteStore::from_config(&config).unwrap();
        store
            .save_account(&Account::new("main", 1_000.0, date(1, 1)).unwrap())
            .unwrap();
        assert!(db.exists());
    }
}
