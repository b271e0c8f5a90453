//! Everything shown on an account dashboard, computed in one pass.

use chrono::NaiveDate;

use super::account::Account;
use super::achievement::{self, AchievementInput, AchievementStatus};
use super::ledger::{EquityPoint, Ledger};
use super::risk::{RiskPlan, RiskSnapshot};
use super::stats::{FlagCount, InstrumentResult, JournalStats};
use super::streak::Streaks;
use super::trade::TradeEntry;

pub const DEFAULT_RECENT_TRADES: usize = 10;

#[derive(Debug, Clone)]
pub struct Dashboard {
    pub ledger: Ledger,
    pub stats: JournalStats,
    pub streaks: Streaks,
    pub risk: RiskSnapshot,
    pub instruments: Vec<InstrumentResult>,
    pub flags: Vec<FlagCount>,
    pub achievements: Vec<AchievementStatus>,
    pub recent_count: usize,
    pub as_of: NaiveDate,
}

impl Dashboard {
    /// `plan.initial_capital` is overridden by the account's own capital.
    pub fn build(
        account: Account,
        trades: Vec<TradeEntry>,
        plan: &RiskPlan,
        today: NaiveDate,
    ) -> Self {
        let plan = RiskPlan {
            initial_capital: account.initial_capital,
            ..plan.clone()
        };
        let ledger = Ledger::new(account, trades);
        let stats = JournalStats::compute(&ledger);
        let streaks = Streaks::compute(&ledger, today);
        let risk = plan.evaluate(ledger.current_capital(), ledger.trade_count());
        let instruments = InstrumentResult::compute_per_instrument(&ledger.trades);
        let flags = FlagCount::tally(&ledger.trades);
        let achievements =
            achievement::evaluate(&AchievementInput::from_parts(&stats, &streaks, &risk));

        Dashboard {
            ledger,
            stats,
            streaks,
            risk,
            instruments,
            flags,
            achievements,
            recent_count: DEFAULT_RECENT_TRADES,
            as_of: today,
        }
    }

    pub fn with_recent_count(mut self, count: usize) -> Self {
        self.recent_count = count;
        self
    }

    pub fn account(&self) -> &Account {
        &self.ledger.account
    }

    pub fn equity_curve(&self) -> Vec<EquityPoint> {
        self.ledger.equity_curve()
    }

    pub fn recent_trades(&self) -> Vec<&TradeEntry> {
        self.ledger.recent(self.recent_count)
    }

    pub fn unlocked_achievements(&self) -> impl Iterator<Item = &AchievementStatus> {
        self.achievements.iter().filter(|a| a.unlocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::achievement::Achievement;
    use crate::domain::trade::{Direction, RiskFlag};
    use std::collections::BTreeSet;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn trade(id: u64, day: u32, pnl: f64) -> TradeEntry {
        TradeEntry {
            id,
            date: date(day),
            instrument: if id % 2 == 0 { "ES".into() } else { "NQ".into() },
            direction: Direction::Long,
            pnl,
            risk: 50.0,
            flags: BTreeSet::new(),
            feedback: String::new(),
        }
    }

    #[test]
    fn build_assembles_all_sections() {
        let account = Account::new("main", 1_000.0, date(1)).unwrap();
        let mut flagged = trade(4, 4, -30.0);
        flagged.flags.insert(RiskFlag::Revenge);
        flagged.feedback = "chased the open".into();
        let trades = vec![
            trade(1, 1, 100.0),
            trade(2, 2, 200.0),
            trade(3, 3, 250.0),
            flagged,
        ];
        // Plan capital is replaced by the account's.
        let plan = RiskPlan::new(99.0, 0.02);
        let dashboard = Dashboard::build(account, trades, &plan, date(4));

        assert_eq!(dashboard.stats.total_trades, 4);
        assert_eq!(dashboard.streaks.longest_win, 3);
        assert_eq!(dashboard.streaks.journal_days_current, 4);
        assert!((dashboard.risk.current_capital - 1_520.0).abs() < 1e-9);
        assert_eq!(dashboard.risk.milestone, 1);
        assert_eq!(dashboard.instruments.len(), 2);
        assert_eq!(dashboard.flags.len(), 1);
        assert_eq!(dashboard.equity_curve().len(), 5);

        let unlocked: Vec<Achievement> = dashboard
            .unlocked_achievements()
            .map(|s| s.achievement)
            .collect();
        assert!(unlocked.contains(&Achievement::FirstTrade));
        assert!(unlocked.contains(&Achievement::HotStreak));
        assert!(unlocked.contains(&Achievement::FirstMilestone));
    }

    #[test]
    fn recent_trades_respects_count() {
        let account = Account::new("main", 1_000.0, date(1)).unwrap();
        let trades = (1..=15).map(|i| trade(i, 1, 1.0)).collect();
        let dashboard = Dashboard::build(account, trades, &RiskPlan::new(1_000.0, 0.01), date(1));
        assert_eq!(dashboard.recent_trades().len(), DEFAULT_RECENT_TRADES);
        let dashboard = dashboard.with_recent_count(3);
        let ids: Vec<u64> = dashboard.recent_trades().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![15, 14, 13]);
    }
}
