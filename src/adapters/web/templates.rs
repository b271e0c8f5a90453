//! HTML templates using Askama.
//!
//! Content templates render only the `<main>` body so they can be returned
//! as HTMX fragments; [`PageTemplate`] wraps them into a full document.

use askama::Template;

use crate::adapters::typst_report::chart_svg::{
    fmt_money, generate_daily_pnl_svg, generate_equity_svg,
};
use crate::adapters::typst_report::tables::{fmt_pct, fmt_ratio};
use crate::domain::dashboard::Dashboard;
use crate::domain::ledger::Ledger;
use crate::domain::trade::{RiskFlag, TradeEntry};

#[derive(Template)]
#[template(path = "base.html")]
pub struct PageTemplate<'a> {
    pub title: &'a str,
    pub content: &'a str,
}

pub struct Row {
    pub label: &'static str,
    pub value: String,
}

fn row(label: &'static str, value: String) -> Row {
    Row { label, value }
}

fn pnl_class(value: f64) -> &'static str {
    if value > 0.0 {
        "gain"
    } else if value < 0.0 {
        "loss"
    } else {
        "flat"
    }
}

pub struct AccountRow {
    pub name: String,
    pub initial_capital: String,
    pub current_capital: String,
    pub net_pnl: String,
    pub pnl_class: &'static str,
    pub trades: usize,
}

impl AccountRow {
    pub fn from_ledger(ledger: &Ledger) -> Self {
        let net = ledger.net_pnl();
        AccountRow {
            name: ledger.account.name.clone(),
            initial_capital: fmt_money(ledger.initial_capital()),
            current_capital: fmt_money(ledger.current_capital()),
            net_pnl: fmt_money(net),
            pnl_class: pnl_class(net),
            trades: ledger.trade_count(),
        }
    }
}

#[derive(Template)]
#[template(path = "accounts.html")]
pub struct AccountsTemplate<'a> {
    pub accounts: &'a [AccountRow],
}

pub struct TradeView {
    pub id: u64,
    pub date: String,
    pub instrument: String,
    pub direction: String,
    pub pnl: String,
    pub pnl_class: &'static str,
    pub risk: String,
    pub flags: String,
    pub feedback: String,
}

impl From<&TradeEntry> for TradeView {
    fn from(trade: &TradeEntry) -> Self {
        TradeView {
            id: trade.id,
            date: trade.date.format("%Y-%m-%d").to_string(),
            instrument: trade.instrument.clone(),
            direction: trade.direction.to_string(),
            pnl: fmt_money(trade.pnl),
            pnl_class: pnl_class(trade.pnl),
            risk: if trade.risk > 0.0 {
                fmt_money(trade.risk)
            } else {
                "-".to_string()
            },
            flags: trade
                .flags
                .iter()
                .map(|f| f.label())
                .collect::<Vec<_>>()
                .join(", "),
            feedback: trade.feedback.clone(),
        }
    }
}

pub struct AchievementView {
    pub title: &'static str,
    pub description: &'static str,
    pub unlocked: bool,
    pub progress: u32,
}

pub struct BreakdownRow {
    pub name: String,
    pub trades: usize,
    pub detail: String,
    pub pnl: String,
    pub pnl_class: &'static str,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub account: String,
    pub as_of: String,
    pub headline: Vec<Row>,
    pub stats: Vec<Row>,
    pub risk: Vec<Row>,
    pub risk_unlocked: bool,
    pub streaks: Vec<Row>,
    pub achievements: Vec<AchievementView>,
    pub unlocked_count: usize,
    pub instruments: Vec<BreakdownRow>,
    pub flags: Vec<BreakdownRow>,
    pub recent: Vec<TradeView>,
    pub equity_svg: String,
    pub daily_svg: String,
}

impl DashboardTemplate {
    pub fn from_dashboard(dashboard: &Dashboard) -> Self {
        let ledger = &dashboard.ledger;
        let stats = &dashboard.stats;
        let risk = &dashboard.risk;
        let streaks = &dashboard.streaks;

        let headline = vec![
            row("Capital", fmt_money(ledger.current_capital())),
            row("Net P/L", fmt_money(ledger.net_pnl())),
            row("Win Rate", fmt_pct(stats.win_rate)),
            row("Profit Factor", fmt_ratio(stats.profit_factor)),
            row("Risk per Trade", fmt_money(risk.risk_per_trade)),
        ];

        let stats_rows = vec![
            row("Trades", stats.total_trades.to_string()),
            row(
                "Won / Lost / Breakeven",
                format!(
                    "{} / {} / {}",
                    stats.trades_won, stats.trades_lost, stats.trades_breakeven
                ),
            ),
            row("Total Return", fmt_pct(stats.total_return)),
            row("Average Win", fmt_money(stats.avg_win)),
            row("Average Loss", fmt_money(-stats.avg_loss)),
            row("Largest Win", fmt_money(stats.largest_win)),
            row("Largest Loss", fmt_money(-stats.largest_loss)),
            row("Expectancy", fmt_money(stats.expectancy)),
            row("Avg Risk per Trade", fmt_money(stats.avg_risk_per_trade)),
            row("Avg R Multiple", format!("{:.2}R", stats.avg_r_multiple)),
            row("Max Drawdown", fmt_pct(stats.max_drawdown)),
            row("Discipline Rate", fmt_pct(stats.discipline_rate)),
        ];

        let risk_rows = vec![
            row("Growth", fmt_pct(risk.growth)),
            row("Milestone", risk.milestone.to_string()),
            row("Next Milestone", fmt_money(risk.next_milestone_capital)),
            row("Capital to Next", fmt_money(risk.capital_to_next)),
            row(
                "Trades for Next Level",
                risk.trades_for_next_level.to_string(),
            ),
            row("Risk Base", fmt_money(risk.risk_base)),
            row("Drawdown from Initial", fmt_pct(risk.drawdown_from_initial)),
        ];

        let streak_rows = vec![
            row("Current", streaks.current.to_string()),
            row("Longest Win Streak", streaks.longest_win.to_string()),
            row("Longest Loss Streak", streaks.longest_loss.to_string()),
            row("Disciplined in a Row", streaks.discipline_current.to_string()),
            row("Journaling Days", streaks.journal_days_current.to_string()),
        ];

        let achievements: Vec<AchievementView> = dashboard
            .achievements
            .iter()
            .map(|status| AchievementView {
                title: status.achievement.title(),
                description: status.achievement.description(),
                unlocked: status.unlocked,
                progress: (status.progress * 100.0).round() as u32,
            })
            .collect();

        let instruments = dashboard
            .instruments
            .iter()
            .map(|r| BreakdownRow {
                name: r.instrument.clone(),
                trades: r.total_trades,
                detail: fmt_pct(r.win_rate),
                pnl: fmt_money(r.net_pnl),
                pnl_class: pnl_class(r.net_pnl),
            })
            .collect();

        let flags = dashboard
            .flags
            .iter()
            .map(|f| BreakdownRow {
                name: f.flag.label().to_string(),
                trades: f.occurrences,
                detail: f.flag.as_str().to_string(),
                pnl: fmt_money(f.net_pnl),
                pnl_class: pnl_class(f.net_pnl),
            })
            .collect();

        DashboardTemplate {
            account: ledger.account.name.clone(),
            as_of: dashboard.as_of.to_string(),
            headline,
            stats: stats_rows,
            risk: risk_rows,
            risk_unlocked: risk.risk_unlocked,
            streaks: streak_rows,
            unlocked_count: achievements.iter().filter(|a| a.unlocked).count(),
            achievements,
            instruments,
            flags,
            recent: dashboard
                .recent_trades()
                .into_iter()
                .map(TradeView::from)
                .collect(),
            equity_svg: generate_equity_svg(&dashboard.equity_curve()),
            daily_svg: generate_daily_pnl_svg(&ledger.daily_pnl()),
        }
    }
}

pub struct FlagOption {
    pub value: &'static str,
    pub label: &'static str,
}

#[derive(Template)]
#[template(path = "trade_form.html")]
pub struct TradeFormTemplate<'a> {
    pub account: &'a str,
    pub error: Option<String>,
    pub date: String,
    pub instrument: String,
    pub direction: String,
    pub pnl: String,
    pub risk: String,
    pub flags: String,
    pub feedback: String,
    pub flag_options: Vec<FlagOption>,
}

impl<'a> TradeFormTemplate<'a> {
    pub fn blank(account: &'a str, today: chrono::NaiveDate) -> Self {
        TradeFormTemplate {
            account,
            error: None,
            date: today.format("%Y-%m-%d").to_string(),
            instrument: String::new(),
            direction: "long".to_string(),
            pnl: String::new(),
            risk: String::new(),
            flags: String::new(),
            feedback: String::new(),
            flag_options: flag_options(),
        }
    }
}

pub fn flag_options() -> Vec<FlagOption> {
    RiskFlag::ALL
        .iter()
        .map(|f| FlagOption {
            value: f.as_str(),
            label: f.label(),
        })
        .collect()
}

#[derive(Template)]
#[template(path = "error.html")]
pub struct ErrorTemplate<'a> {
    pub message: &'a str,
    pub status: u16,
}
