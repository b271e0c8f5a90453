//! Journal statistics: win rate, profit factor, risk per trade, drawdown.

use std::collections::BTreeMap;

use super::ledger::{EquityPoint, Ledger};
use super::trade::{RiskFlag, TradeEntry};

#[derive(Debug, Clone, PartialEq)]
pub struct JournalStats {
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub trades_breakeven: usize,
    pub win_rate: f64,
    pub profit_factor: f64,
    pub net_pnl: f64,
    pub gross_profit: f64,
    pub gross_loss: f64,
    pub avg_win: f64,
    pub avg_loss: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
    pub expectancy: f64,
    pub avg_risk_per_trade: f64,
    pub avg_r_multiple: f64,
    pub risk_pct_of_capital: f64,
    pub total_return: f64,
    pub max_drawdown: f64,
    pub max_drawdown_duration: usize,
    pub flagged_trades: usize,
    pub discipline_rate: f64,
}

impl JournalStats {
    pub fn compute(ledger: &Ledger) -> Self {
        let trades = &ledger.trades;
        let initial_capital = ledger.initial_capital();

        let mut trades_won = 0usize;
        let mut trades_lost = 0usize;
        let mut trades_breakeven = 0usize;
        let mut gross_profit = 0.0_f64;
        let mut gross_loss = 0.0_f64;
        let mut largest_win = 0.0_f64;
        let mut largest_loss = 0.0_f64;
        let mut total_risk = 0.0_f64;
        let mut risked_trades = 0usize;
        let mut total_r = 0.0_f64;
        let mut flagged_trades = 0usize;

        for trade in trades {
            let pnl = trade.pnl;
            if pnl > 0.0 {
                trades_won += 1;
                gross_profit += pnl;
                if pnl > largest_win {
                    largest_win = pnl;
                }
            } else if pnl < 0.0 {
                trades_lost += 1;
                gross_loss += pnl.abs();
                if pnl.abs() > largest_loss {
                    largest_loss = pnl.abs();
                }
            } else {
                trades_breakeven += 1;
            }

            if let Some(r) = trade.r_multiple() {
                total_risk += trade.risk;
                total_r += r;
                risked_trades += 1;
            }

            if !trade.is_disciplined() {
                flagged_trades += 1;
            }
        }

        let total_trades = trades.len();
        let net_pnl = gross_profit - gross_loss;

        let win_rate = ratio(trades_won as f64, total_trades);

        let profit_factor = if gross_loss > 0.0 {
            gross_profit / gross_loss
        } else if gross_profit > 0.0 {
            f64::INFINITY
        } else {
            0.0
        };

        let avg_risk_per_trade = ratio(total_risk, risked_trades);

        let risk_pct_of_capital = if initial_capital > 0.0 {
            avg_risk_per_trade / initial_capital
        } else {
            0.0
        };

        let total_return = if initial_capital > 0.0 {
            net_pnl / initial_capital
        } else {
            0.0
        };

        let (max_drawdown, max_drawdown_duration) = compute_drawdown(&ledger.equity_curve());

        let discipline_rate = if total_trades > 0 {
            (total_trades - flagged_trades) as f64 / total_trades as f64
        } else {
            0.0
        };

        JournalStats {
            total_trades,
            trades_won,
            trades_lost,
            trades_breakeven,
            win_rate,
            profit_factor,
            net_pnl,
            gross_profit,
            gross_loss,
            avg_win: ratio(gross_profit, trades_won),
            avg_loss: ratio(gross_loss, trades_lost),
            largest_win,
            largest_loss,
            expectancy: ratio(net_pnl, total_trades),
            avg_risk_per_trade,
            avg_r_multiple: ratio(total_r, risked_trades),
            risk_pct_of_capital,
            total_return,
            max_drawdown,
            max_drawdown_duration,
            flagged_trades,
            discipline_rate,
        }
    }
}

fn ratio(numerator: f64, count: usize) -> f64 {
    if count > 0 {
        numerator / count as f64
    } else {
        0.0
    }
}

/// Largest fractional peak-to-trough decline and the longest run of points
/// spent below a prior peak.
pub fn compute_drawdown(equity_curve: &[EquityPoint]) -> (f64, usize) {
    let Some(first) = equity_curve.first() else {
        return (0.0, 0);
    };

    let mut peak = first.equity;
    let mut max_dd = 0.0_f64;
    let mut max_duration = 0usize;
    let mut current_duration = 0usize;

    for point in equity_curve {
        if point.equity >= peak {
            peak = point.equity;
            current_duration = 0;
        } else if peak > 0.0 {
            let dd = (peak - point.equity) / peak;
            if dd > max_dd {
                max_dd = dd;
            }
            current_duration += 1;
            if current_duration > max_duration {
                max_duration = current_duration;
            }
        }
    }

    (max_dd, max_duration)
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentResult {
    pub instrument: String,
    pub total_trades: usize,
    pub trades_won: usize,
    pub trades_lost: usize,
    pub win_rate: f64,
    pub net_pnl: f64,
    pub largest_win: f64,
    pub largest_loss: f64,
}

impl InstrumentResult {
    pub fn compute_per_instrument(trades: &[TradeEntry]) -> Vec<InstrumentResult> {
        let mut grouped: BTreeMap<&str, Vec<&TradeEntry>> = BTreeMap::new();
        for trade in trades {
            grouped.entry(trade.instrument.as_str()).or_default().push(trade);
        }

        grouped
            .into_iter()
            .map(|(instrument, group)| {
                let trades_won = group.iter().filter(|t| t.pnl > 0.0).count();
                let trades_lost = group.iter().filter(|t| t.pnl < 0.0).count();
                let largest_win = group.iter().map(|t| t.pnl).fold(0.0, f64::max);
                let largest_loss = group.iter().map(|t| -t.pnl).fold(0.0, f64::max);
                InstrumentResult {
                    instrument: instrument.to_string(),
                    total_trades: group.len(),
                    trades_won,
                    trades_lost,
                    win_rate: ratio(trades_won as f64, group.len()),
                    net_pnl: group.iter().map(|t| t.pnl).sum(),
                    largest_win,
                    largest_loss,
                }
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FlagCount {
    pub flag: RiskFlag,
    pub occurrences: usize,
    pub net_pnl: f64,
}

impl FlagCount {
    /// Occurrences of every flag that appears at least once, in flag order.
    pub fn tally(trades: &[TradeEntry]) -> Vec<FlagCount> {
        let mut counts: BTreeMap<RiskFlag, (usize, f64)> = BTreeMap::new();
        for trade in trades {
            for flag in &trade.flags {
                let entry = counts.entry(*flag).or_insert((0, 0.0));
                entry.0 += 1;
                entry.1 += trade.pnl;
            }
        }
        counts
            .into_iter()
            .map(|(flag, (occurrences, net_pnl))| FlagCount {
                flag,
                occurrences,
                net_pnl,
            })
            .collect()
    }
}
