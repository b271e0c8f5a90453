//! End-to-end tests across the domain and storage adapters.
//!
//! Tests cover:
//! - Logging into CSV spreadsheets and rebuilding the dashboard from disk
//! - Milestone risk sizing as capital and trade count grow
//! - Mirrored writes into SQLite
//! - Merging a diverged spreadsheet with the mirror
//! - Typst report generation from a stored journal

mod common;

use approx::assert_relative_eq;
use common::*;
use tempfile::TempDir;
use tradejournal::adapters::csv_store::CsvStore;
use tradejournal::adapters::typst_report::TypstReportAdapter;
use tradejournal::domain::achievement::{newly_unlocked, Achievement};
use tradejournal::domain::dashboard::Dashboard;
use tradejournal::domain::error::JournalError;
use tradejournal::domain::risk::RiskPlan;
use tradejournal::domain::streak::Streak;
use tradejournal::domain::trade::RiskFlag;
use tradejournal::ports::journal_store::JournalStore;
use tradejournal::ports::report_port::ReportPort;

fn csv_journal() -> (TempDir, CsvStore) {
    let dir = TempDir::new().unwrap();
    let store = CsvStore::open(dir.path().join("data")).unwrap();
    store.save_account(&account("main", 10_000.0)).unwrap();
    (dir, store)
}

fn log_week(store: &dyn JournalStore) {
    for (day, pnl) in [(1, 200.0), (2, 300.0), (3, -100.0), (4, 400.0)] {
        store
            .append_trade("main", draft(date(2024, 3, day), "es", pnl))
            .unwrap();
    }
    let mut oversized = draft(date(2024, 3, 5), "nq", -100.0);
    oversized.flags.insert(RiskFlag::Oversized);
    oversized.feedback = "Tripled size after the morning win".into();
    store.append_trade("main", oversized).unwrap();
}

fn dashboard_for(store: &dyn JournalStore, plan: &RiskPlan, today: chrono::NaiveDate) -> Dashboard {
    let account = store.require_account("main").unwrap();
    let trades = store.load_trades("main").unwrap();
    Dashboard::build(account, trades, plan, today)
}

mod csv_pipeline {
    use super::*;

    #[test]
    fn dashboard_from_spreadsheet() {
        let (_dir, store) = csv_journal();
        log_week(&store);

        let dashboard = dashboard_for(&store, &RiskPlan::new(10_000.0, 0.01), date(2024, 3, 6));

        let stats = &dashboard.stats;
        assert_eq!(stats.total_trades, 5);
        assert_eq!(stats.trades_won, 3);
        assert_eq!(stats.trades_lost, 2);
        assert_relative_eq!(stats.win_rate, 0.6);
        assert_relative_eq!(stats.profit_factor, 4.5);
        assert_relative_eq!(dashboard.ledger.current_capital(), 10_700.0);
        assert_eq!(stats.flagged_trades, 1);

        let streaks = &dashboard.streaks;
        assert_eq!(streaks.current, Streak::Loss(1));
        assert_eq!(streaks.longest_win, 2);
        assert_eq!(streaks.discipline_current, 0);
        assert_eq!(streaks.discipline_longest, 4);
        assert_eq!(streaks.journal_days_current, 5);

        assert_eq!(dashboard.instruments.len(), 2);
        assert_eq!(dashboard.flags.len(), 1);
        assert_eq!(dashboard.flags[0].flag, RiskFlag::Oversized);

        let unlocked: Vec<_> = dashboard
            .unlocked_achievements()
            .map(|s| s.achievement)
            .collect();
        assert!(unlocked.contains(&Achievement::FirstTrade));
        assert!(unlocked.contains(&Achievement::Consistent));
        assert!(!unlocked.contains(&Achievement::TenTrades));
    }

    #[test]
    fn journaling_streak_lapses_after_a_missed_day() {
        let (_dir, store) = csv_journal();
        log_week(&store);
        let dashboard = dashboard_for(&store, &RiskPlan::new(10_000.0, 0.01), date(2024, 3, 8));
        assert_eq!(dashboard.streaks.journal_days_current, 0);
        assert_eq!(dashboard.streaks.journal_days_longest, 5);
    }

    #[test]
    fn reopened_store_sees_same_journal() {
        let (dir, store) = csv_journal();
        log_week(&store);
        drop(store);

        let reopened = CsvStore::open(dir.path().join("data")).unwrap();
        let trades = reopened.load_trades("main").unwrap();
        assert_eq!(trades.len(), 5);
        assert_eq!(trades[4].feedback, "Tripled size after the morning win");
        assert_eq!(trades[4].instrument, "NQ");
    }

    #[test]
    fn flagged_trade_without_feedback_is_not_written() {
        let (_dir, store) = csv_journal();
        let mut revenge = draft(date(2024, 3, 1), "ES", -250.0);
        revenge.flags.insert(RiskFlag::Revenge);
        let err = store.append_trade("main", revenge).unwrap_err();
        assert!(matches!(err, JournalError::InvalidTrade { .. }));
        assert!(store.load_trades("main").unwrap().is_empty());
    }

    #[test]
    fn first_trade_unlocks_achievement() {
        let (_dir, store) = csv_journal();
        let plan = RiskPlan::new(10_000.0, 0.01);
        let before = dashboard_for(&store, &plan, date(2024, 3, 1));
        store
            .append_trade("main", draft(date(2024, 3, 1), "ES", 50.0))
            .unwrap();
        let after = dashboard_for(&store, &plan, date(2024, 3, 1));

        let unlocked = newly_unlocked(&before.achievements, &after.achievements);
        assert_eq!(unlocked, vec![Achievement::FirstTrade]);
    }
}

mod risk_milestones {
    use super::*;

    fn plan() -> RiskPlan {
        RiskPlan::new(10_000.0, 0.01)
    }

    #[test]
    fn below_first_milestone_risks_off_initial_capital() {
        let (_dir, store) = csv_journal();
        log_week(&store);
        let risk = dashboard_for(&store, &plan(), date(2024, 3, 6)).risk;
        assert_eq!(risk.milestone, 0);
        assert_relative_eq!(risk.risk_base, 10_000.0);
        assert_relative_eq!(risk.risk_per_trade, 100.0);
        assert_relative_eq!(risk.next_milestone_capital, 15_000.0);
        assert_relative_eq!(risk.capital_to_next, 4_300.0);
        assert_eq!(risk.trades_for_next_level, 5);
    }

    #[test]
    fn milestone_risk_waits_for_trade_count() {
        let (_dir, store) = csv_journal();
        store
            .append_trade("main", draft(date(2024, 3, 1), "ES", 5_000.0))
            .unwrap();

        let risk = dashboard_for(&store, &plan(), date(2024, 3, 1)).risk;
        assert_eq!(risk.milestone, 1);
        assert!(!risk.risk_unlocked);
        assert_relative_eq!(risk.risk_per_trade, 100.0);
        assert_eq!(risk.trades_for_next_level, 9);

        for day in 2..=10 {
            store
                .append_trade("main", draft(date(2024, 3, day), "ES", 0.0))
                .unwrap();
        }
        let risk = dashboard_for(&store, &plan(), date(2024, 3, 10)).risk;
        assert!(risk.risk_unlocked);
        assert_relative_eq!(risk.risk_base, 15_000.0);
        assert_relative_eq!(risk.risk_per_trade, 150.0);
    }

    #[test]
    fn drawdown_shrinks_risk_with_capital() {
        let (_dir, store) = csv_journal();
        store
            .append_trade("main", draft(date(2024, 3, 1), "ES", -2_000.0))
            .unwrap();
        let risk = dashboard_for(&store, &plan(), date(2024, 3, 1)).risk;
        assert_eq!(risk.milestone, 0);
        assert_relative_eq!(risk.risk_per_trade, 80.0);
        assert_relative_eq!(risk.drawdown_from_initial, 0.2);
    }

    #[test]
    fn plan_uses_each_accounts_own_capital() {
        let (_dir, store) = csv_journal();
        store.save_account(&account("small", 2_000.0)).unwrap();
        let account = store.require_account("small").unwrap();
        let dashboard = Dashboard::build(account, Vec::new(), &plan(), date(2024, 3, 1));
        assert_relative_eq!(dashboard.risk.risk_per_trade, 20.0);
    }
}

#[cfg(feature = "sqlite")]
mod mirror {
    use super::*;
    use tradejournal::adapters::mirrored_store::MirroredStore;
    use tradejournal::adapters::sqlite_store::SqliteStore;
    use tradejournal::domain::merge::{merge, MergePolicy};

    fn mirrored(dir: &TempDir) -> MirroredStore {
        let csv = CsvStore::open(dir.path().join("data")).unwrap();
        let sqlite = SqliteStore::in_memory().unwrap();
        MirroredStore::new(Box::new(csv), Box::new(sqlite))
    }

    #[test]
    fn writes_land_in_both_stores() {
        let dir = TempDir::new().unwrap();
        let store = mirrored(&dir);
        store.save_account(&account("main", 10_000.0)).unwrap();
        log_week(&store);
        store.delete_trade("main", 2).unwrap();

        let local = store.primary().load_trades("main").unwrap();
        let remote = store.mirror().load_trades("main").unwrap();
        assert_eq!(local.len(), 4);
        assert_eq!(local, remote);
        assert_eq!(store.mirror_failures(), 0);
    }

    #[test]
    fn diverged_copies_merge_back_together() {
        let dir = TempDir::new().unwrap();
        let store = mirrored(&dir);
        store.save_account(&account("main", 10_000.0)).unwrap();
        log_week(&store);

        // Spreadsheet edited by hand; mirror picked up an extra trade.
        let mut local = store.primary().load_trades("main").unwrap();
        local[0].feedback = "Added notes later".into();
        store.primary().replace_trades("main", &local).unwrap();
        let mut remote = store.mirror().load_trades("main").unwrap();
        remote.push(entry(6, date(2024, 3, 6), "CL", 75.0));
        store.mirror().replace_trades("main", &remote).unwrap();

        let outcome = merge(&local, &remote, MergePolicy::PreferLocal);
        assert_eq!(outcome.conflicts.len(), 1);
        assert_eq!(outcome.conflicts[0].differing_fields(), vec!["feedback"]);
        assert_eq!(outcome.remote_only, vec![6]);
        assert!(outcome.local_changed(MergePolicy::PreferLocal));
        assert!(outcome.remote_changed(MergePolicy::PreferLocal));

        store.primary().replace_trades("main", &outcome.merged).unwrap();
        store.mirror().replace_trades("main", &outcome.merged).unwrap();
        assert_eq!(
            store.primary().load_trades("main").unwrap(),
            store.mirror().load_trades("main").unwrap()
        );
        assert_eq!(store.primary().load_trades("main").unwrap().len(), 6);
    }
}

mod report {
    use super::*;

    #[test]
    fn report_from_stored_journal() {
        let (dir, store) = csv_journal();
        log_week(&store);
        let dashboard = dashboard_for(&store, &RiskPlan::new(10_000.0, 0.01), date(2024, 3, 6));

        let out = dir.path().join("main.typ");
        TypstReportAdapter::default()
            .write(&dashboard, out.to_str().unwrap())
            .unwrap();
        let content = std::fs::read_to_string(out).unwrap();
        assert!(content.contains("Oversized position"));
        assert!(content.contains("Tripled size after the morning win"));
        assert!(content.contains("#image.decode("));
        assert!(!content.contains("{{"));
    }
}

#[test]
fn mock_store_matches_csv_behaviour() {
    let mock = MockStore::new().with_account(account("main", 10_000.0));
    let (_dir, csv) = csv_journal();
    log_week(&mock);
    log_week(&csv);
    assert_eq!(mock.load_trades("main").unwrap(), csv.load_trades("main").unwrap());
}
