//! Chronological account ledger and equity tracking.

use chrono::NaiveDate;
use std::collections::BTreeMap;

use super::account::Account;
use super::trade::{sort_chronological, TradeEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct EquityPoint {
    pub date: NaiveDate,
    pub equity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Ledger {
    pub account: Account,
    pub trades: Vec<TradeEntry>,
}

impl Ledger {
    pub fn new(account: Account, mut trades: Vec<TradeEntry>) -> Self {
        sort_chronological(&mut trades);
        Ledger { account, trades }
    }

    pub fn initial_capital(&self) -> f64 {
        self.account.initial_capital
    }

    pub fn net_pnl(&self) -> f64 {
        self.trades.iter().map(|t| t.pnl).sum()
    }

    pub fn current_capital(&self) -> f64 {
        self.initial_capital() + self.net_pnl()
    }

    pub fn trade_count(&self) -> usize {
        self.trades.len()
    }

    /// Starting capital followed by one point per trade.
    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        let start_date = self
            .trades
            .first()
            .map(|t| t.date)
            .unwrap_or(self.account.created);

        let mut curve = Vec::with_capacity(self.trades.len() + 1);
        let mut equity = self.initial_capital();
        curve.push(EquityPoint {
            date: start_date,
            equity,
        });
        for trade in &self.trades {
            equity += trade.pnl;
            curve.push(EquityPoint {
                date: trade.date,
                equity,
            });
        }
        curve
    }

    pub fn daily_pnl(&self) -> BTreeMap<NaiveDate, f64> {
        let mut days = BTreeMap::new();
        for trade in &self.trades {
            *days.entry(trade.date).or_insert(0.0) += trade.pnl;
        }
        days
    }

    /// The `count` most recent trades, newest first.
    pub fn recent(&self, count: usize) -> Vec<&TradeEntry> {
        self.trades.iter().rev().take(count).collect()
    }
}
