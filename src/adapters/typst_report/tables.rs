//! Typst table markup for the dashboard report.
//!
//! Every function returns a self-contained Typst snippet, or an italic
//! placeholder sentence when there is nothing to show.

use chrono::Datelike;
use std::collections::BTreeMap;

use super::chart_svg::fmt_money;
use crate::domain::account::Account;
use crate::domain::achievement::AchievementStatus;
use crate::domain::ledger::Ledger;
use crate::domain::risk::RiskSnapshot;
use crate::domain::stats::{FlagCount, InstrumentResult, JournalStats};
use crate::domain::streak::Streaks;
use crate::domain::trade::TradeEntry;

/// Escapes text so it renders literally inside a Typst content block.
pub fn escape_typst(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '#' | '[' | ']' | '*' | '_' | '`' | '$' | '<' | '>' | '@' | '~' | '/' | '='
            | '-' | '+' | '"' => {
                out.push('\\');
                out.push(c);
            }
            '\n' | '\r' => out.push(' '),
            _ => out.push(c),
        }
    }
    out
}

pub fn fmt_pct(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

pub fn fmt_ratio(value: f64) -> String {
    if value.is_infinite() {
        "∞".to_string()
    } else {
        format!("{:.2}", value)
    }
}

fn pnl_cell(value: f64) -> String {
    let color = if value >= 0.0 { "green" } else { "red" };
    format!("text(fill: {}, [{}])", color, escape_typst(&fmt_money(value)))
}

fn money(value: f64) -> String {
    escape_typst(&fmt_money(value))
}

fn two_column_table(rows: &[(&str, String)]) -> String {
    let mut out = String::from("#table(\n  columns: (auto, auto),\n  align: (left, right),\n");
    out.push_str("  [*Metric*], [*Value*],\n");
    for (label, value) in rows {
        out.push_str(&format!("  [{}], [{}],\n", label, value));
    }
    out.push_str(")\n");
    out
}

pub fn render_account_summary(ledger: &Ledger, as_of: chrono::NaiveDate) -> String {
    let account: &Account = &ledger.account;
    two_column_table(&[
        ("Account", escape_typst(&account.name)),
        ("Opened", account.created.to_string()),
        ("As of", as_of.to_string()),
        ("Initial Capital", money(account.initial_capital)),
        ("Current Capital", money(ledger.current_capital())),
        ("Net P/L", money(ledger.net_pnl())),
        ("Trades Logged", ledger.trade_count().to_string()),
    ])
}

pub fn render_stats_table(stats: &JournalStats) -> String {
    two_column_table(&[
        ("Total Return", escape_typst(&fmt_pct(stats.total_return))),
        ("Win Rate", fmt_pct(stats.win_rate)),
        ("Profit Factor", fmt_ratio(stats.profit_factor)),
        (
            "Won / Lost / Breakeven",
            format!(
                "{} \\/ {} \\/ {}",
                stats.trades_won, stats.trades_lost, stats.trades_breakeven
            ),
        ),
        ("Gross Profit", money(stats.gross_profit)),
        ("Gross Loss", money(-stats.gross_loss)),
        ("Average Win", money(stats.avg_win)),
        ("Average Loss", money(-stats.avg_loss)),
        ("Largest Win", money(stats.largest_win)),
        ("Largest Loss", money(-stats.largest_loss)),
        ("Expectancy", money(stats.expectancy)),
        ("Avg Risk per Trade", money(stats.avg_risk_per_trade)),
        ("Avg R Multiple", escape_typst(&format!("{:.2}R", stats.avg_r_multiple))),
        ("Risk % of Capital", fmt_pct(stats.risk_pct_of_capital)),
        ("Max Drawdown", fmt_pct(stats.max_drawdown)),
        (
            "Max Drawdown Duration",
            format!("{} trades", stats.max_drawdown_duration),
        ),
        ("Flagged Trades", stats.flagged_trades.to_string()),
        ("Discipline Rate", fmt_pct(stats.discipline_rate)),
    ])
}

pub fn render_risk_table(risk: &RiskSnapshot) -> String {
    let unlocked = if risk.risk_unlocked {
        "yes".to_string()
    } else {
        format!("no, {} more trades needed", risk.trades_for_next_level)
    };
    two_column_table(&[
        ("Growth", escape_typst(&fmt_pct(risk.growth))),
        ("Milestone Reached", risk.milestone.to_string()),
        ("Milestone Capital", money(risk.milestone_capital)),
        ("Next Milestone", money(risk.next_milestone_capital)),
        ("Capital to Next", money(risk.capital_to_next)),
        ("Qualified Level", qualified_level(risk)),
        ("Trades for Next Level", risk.trades_for_next_level.to_string()),
        ("Milestone Risk Unlocked", escape_typst(&unlocked)),
        ("Risk Base", money(risk.risk_base)),
        ("Risk per Trade", money(risk.risk_per_trade)),
        (
            "Drawdown from Initial",
            fmt_pct(risk.drawdown_from_initial),
        ),
    ])
}

fn qualified_level(risk: &RiskSnapshot) -> String {
    if risk.qualified_level == u32::MAX {
        "unlimited".to_string()
    } else {
        risk.qualified_level.to_string()
    }
}

pub fn render_streaks_table(streaks: &Streaks) -> String {
    two_column_table(&[
        ("Current Streak", escape_typst(&streaks.current.to_string())),
        ("Longest Win Streak", streaks.longest_win.to_string()),
        ("Longest Loss Streak", streaks.longest_loss.to_string()),
        ("Disciplined Trades in a Row", streaks.discipline_current.to_string()),
        ("Best Discipline Run", streaks.discipline_longest.to_string()),
        ("Journaling Days (current)", streaks.journal_days_current.to_string()),
        ("Journaling Days (best)", streaks.journal_days_longest.to_string()),
    ])
}

pub fn render_achievements(achievements: &[AchievementStatus]) -> String {
    if achievements.is_empty() {
        return "_No achievements defined._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: (auto, 1fr, auto),\n  align: (left, left, right),\n");
    out.push_str("  [*Achievement*], [*Goal*], [*Progress*],\n");
    for status in achievements {
        let title = escape_typst(status.achievement.title());
        let title = if status.unlocked {
            format!("*{}*", title)
        } else {
            title
        };
        let progress = if status.unlocked {
            "text(fill: green, [unlocked])".to_string()
        } else {
            format!("[{:.0}%]", status.progress * 100.0)
        };
        out.push_str(&format!(
            "  [{}], [{}], {},\n",
            title,
            escape_typst(status.achievement.description()),
            progress
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_instrument_table(results: &[InstrumentResult]) -> String {
    if results.is_empty() {
        return "_No trades logged._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: 6,\n");
    out.push_str("  [*Instrument*], [*Trades*], [*Win Rate*], [*Net P/L*], ");
    out.push_str("[*Largest Win*], [*Largest Loss*],\n");
    for result in results {
        out.push_str(&format!(
            "  [{}], [{}], [{}], {}, [{}], [{}],\n",
            escape_typst(&result.instrument),
            result.total_trades,
            fmt_pct(result.win_rate),
            pnl_cell(result.net_pnl),
            money(result.largest_win),
            money(-result.largest_loss)
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_flag_table(flags: &[FlagCount]) -> String {
    if flags.is_empty() {
        return "_No risk rules broken. Keep it up._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: 3,\n");
    out.push_str("  [*Risk Flag*], [*Occurrences*], [*Net P/L*],\n");
    for count in flags {
        out.push_str(&format!(
            "  [{}], [{}], {},\n",
            escape_typst(count.flag.label()),
            count.occurrences,
            pnl_cell(count.net_pnl)
        ));
    }
    out.push_str(")\n");
    out
}

pub fn render_trade_log(trades: &[TradeEntry]) -> String {
    if trades.is_empty() {
        return "_No trades logged._\n".to_string();
    }

    let mut out = String::from("#table(\n  columns: (auto, auto, auto, auto, auto, auto, auto, 1fr),\n");
    out.push_str("  [*\\#*], [*Date*], [*Instrument*], [*Side*], [*P/L*], [*Risk*], ");
    out.push_str("[*Flags*], [*Feedback*],\n");
    for trade in trades {
        let flags = trade
            .flags
            .iter()
            .map(|f| f.label())
            .collect::<Vec<_>>()
            .join(", ");
        let risk = if trade.risk > 0.0 {
            money(trade.risk)
        } else {
            "\\-".to_string()
        };
        out.push_str(&format!(
            "  [{}], [{}], [{}], [{}], {}, [{}], [{}], [{}],\n",
            trade.id,
            trade.date.format("%Y-%m-%d"),
            escape_typst(&trade.instrument),
            trade.direction,
            pnl_cell(trade.pnl),
            risk,
            escape_typst(&flags),
            escape_typst(&trade.feedback)
        ));
    }
    out.push_str(")\n");
    out
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyPnl {
    pub year: i32,
    pub month: u32,
    pub pnl: f64,
    /// P/L relative to equity at the start of the month.
    pub return_pct: f64,
}

pub fn compute_monthly_pnl(ledger: &Ledger) -> Vec<MonthlyPnl> {
    let mut totals: BTreeMap<(i32, u32), f64> = BTreeMap::new();
    for trade in &ledger.trades {
        *totals
            .entry((trade.date.year(), trade.date.month()))
            .or_insert(0.0) += trade.pnl;
    }

    let mut equity = ledger.initial_capital();
    totals
        .into_iter()
        .map(|((year, month), pnl)| {
            let return_pct = if equity > 0.0 { pnl / equity } else { 0.0 };
            equity += pnl;
            MonthlyPnl {
                year,
                month,
                pnl,
                return_pct,
            }
        })
        .collect()
}

fn month_cell(entry: &MonthlyPnl) -> String {
    let (fill, white) = if entry.return_pct >= 0.05 {
        ("rgb(\"#15803d\")", true)
    } else if entry.return_pct > 0.0 {
        ("rgb(\"#dcfce7\")", false)
    } else if entry.return_pct == 0.0 {
        ("rgb(\"#ffffff\")", false)
    } else if entry.return_pct > -0.05 {
        ("rgb(\"#fee2e2\")", false)
    } else {
        ("rgb(\"#b91c1c\")", true)
    };
    let label = escape_typst(&format!("{:+.1}%", entry.return_pct * 100.0));
    if white {
        format!("box(fill: {}, text(fill: white, [{}]))", fill, label)
    } else {
        format!("box(fill: {}, [{}])", fill, label)
    }
}

pub fn render_monthly_pnl(months: &[MonthlyPnl]) -> String {
    if months.is_empty() {
        return "_No monthly data yet._\n".to_string();
    }

    let mut years: BTreeMap<i32, [Option<&MonthlyPnl>; 12]> = BTreeMap::new();
    for entry in months {
        years.entry(entry.year).or_insert([None; 12])[(entry.month - 1) as usize] = Some(entry);
    }

    let mut out = String::from("#table(\n  columns: 14,\n");
    out.push_str("  [*Year*], [*Jan*], [*Feb*], [*Mar*], [*Apr*], [*May*], [*Jun*], ");
    out.push_str("[*Jul*], [*Aug*], [*Sep*], [*Oct*], [*Nov*], [*Dec*], [*Total*],\n");
    for (year, row) in &years {
        out.push_str(&format!("  [{}],", year));
        let mut total = 0.0;
        for cell in row {
            match cell {
                Some(entry) => {
                    total += entry.pnl;
                    out.push_str(&format!(" {},", month_cell(entry)));
                }
                None => out.push_str(" [\\-],"),
            }
        }
        out.push_str(&format!(" {},\n", pnl_cell(total)));
    }
    out.push_str(")\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::achievement::{self, AchievementInput};
    use crate::domain::trade::{Direction, RiskFlag};
    use chrono::NaiveDate;
    use std::collections::BTreeSet;

    fn trade(id: u64, y: i32, m: u32, d: u32, pnl: f64) -> TradeEntry {
        TradeEntry {
            id,
            date: NaiveDate::from_ymd_opt(y, m, d).unwrap(),
            instrument: "ES".into(),
            direction: Direction::Long,
            pnl,
            risk: 0.0,
            flags: BTreeSet::new(),
            feedback: String::new(),
        }
    }

    fn ledger(trades: Vec<TradeEntry>) -> Ledger {
        let account =
            Account::new("main", 10_000.0, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()).unwrap();
        Ledger::new(account, trades)
    }

    #[test]
    fn escape_typst_neutralises_markup() {
        assert_eq!(escape_typst("#let x = [1]"), "\\#let x \\= \\[1\\]");
        assert_eq!(escape_typst("a*b_c"), "a\\*b\\_c");
        assert_eq!(escape_typst("line\nbreak"), "line break");
        assert_eq!(escape_typst("// no comment"), "\\/\\/ no comment");
    }

    #[test]
    fn fmt_ratio_handles_infinity() {
        assert_eq!(fmt_ratio(f64::INFINITY), "∞");
        assert_eq!(fmt_ratio(1.5), "1.50");
    }

    #[test]
    fn monthly_pnl_compounds_equity() {
        let l = ledger(vec![
            trade(1, 2024, 1, 5, 1_000.0),
            trade(2, 2024, 1, 20, -500.0),
            trade(3, 2024, 2, 3, 1_050.0),
        ]);
        let months = compute_monthly_pnl(&l);
        assert_eq!(months.len(), 2);
        assert_eq!((months[0].year, months[0].month), (2024, 1));
        assert!((months[0].pnl - 500.0).abs() < 1e-9);
        assert!((months[0].return_pct - 0.05).abs() < 1e-9);
        assert!((months[1].return_pct - 0.10).abs() < 1e-9);
    }

    #[test]
    fn monthly_pnl_table_has_year_rows() {
        let l = ledger(vec![trade(1, 2023, 12, 5, 100.0), trade(2, 2024, 1, 5, -50.0)]);
        let out = render_monthly_pnl(&compute_monthly_pnl(&l));
        assert!(out.contains("[2023],"));
        assert!(out.contains("[2024],"));
        assert!(out.contains("columns: 14"));
    }

    #[test]
    fn empty_sections_render_placeholders() {
        assert!(render_trade_log(&[]).contains("No trades logged"));
        assert!(render_instrument_table(&[]).contains("No trades logged"));
        assert!(render_flag_table(&[]).contains("No risk rules broken"));
        assert!(render_monthly_pnl(&[]).contains("No monthly data"));
    }

    #[test]
    fn trade_log_escapes_feedback() {
        let mut t = trade(7, 2024, 3, 1, -120.0);
        t.flags.insert(RiskFlag::MovedStop);
        t.feedback = "Moved stop to $4500 #fail".into();
        let out = render_trade_log(&[t]);
        assert!(out.contains("Moved stop to \\$4500 \\#fail"));
        assert!(out.contains("text(fill: red"));
        assert!(out.contains("[Moved stop]"));
    }

    #[test]
    fn achievements_mark_unlocked() {
        let statuses = achievement::evaluate(&AchievementInput {
            total_trades: 1,
            ..AchievementInput::default()
        });
        let out = render_achievements(&statuses);
        assert!(out.contains("[unlocked]"));
        assert!(out.contains("%]"));
    }
}
