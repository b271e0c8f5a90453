//! Risk sizing with stepped capital milestones.
//!
//! Capital milestones sit at every `milestone_step` of growth over the
//! initial capital (+50%, +100%, ... by default). Risk per trade is sized off
//! the last milestone reached rather than the live balance, so it only steps
//! up once a milestone is banked. Each milestone level also asks for a
//! growing number of logged trades (`base_trades + trades_step * level`)
//! before its larger risk base unlocks.

use super::error::JournalError;
use crate::ports::config_port::ConfigPort;

pub const DEFAULT_RISK_PCT: f64 = 0.01;
pub const DEFAULT_MILESTONE_STEP: f64 = 0.5;
pub const DEFAULT_BASE_TRADES: u32 = 10;
pub const DEFAULT_TRADES_STEP: u32 = 5;

#[derive(Debug, Clone, PartialEq)]
pub struct RiskPlan {
    pub initial_capital: f64,
    pub risk_pct: f64,
    pub milestone_step: f64,
    pub base_trades: u32,
    pub trades_step: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RiskSnapshot {
    pub current_capital: f64,
    pub growth: f64,
    pub milestone: u32,
    pub milestone_capital: f64,
    pub next_milestone_capital: f64,
    pub capital_to_next: f64,
    pub qualified_level: u32,
    pub trades_logged: usize,
    pub trades_for_next_level: usize,
    pub risk_unlocked: bool,
    pub risk_base: f64,
    pub risk_per_trade: f64,
    pub drawdown_from_initial: f64,
}

impl RiskPlan {
    pub fn new(initial_capital: f64, risk_pct: f64) -> Self {
        RiskPlan {
            initial_capital,
            risk_pct,
            milestone_step: DEFAULT_MILESTONE_STEP,
            base_trades: DEFAULT_BASE_TRADES,
            trades_step: DEFAULT_TRADES_STEP,
        }
    }

    /// Reads `[risk]`; the account supplies the initial capital.
    pub fn from_config(config: &dyn ConfigPort, initial_capital: f64) -> Self {
        RiskPlan {
            initial_capital,
            risk_pct: config.get_double("risk", "risk_pct", DEFAULT_RISK_PCT),
            milestone_step: config.get_double("risk", "milestone_step", DEFAULT_MILESTONE_STEP),
            base_trades: config
                .get_int("risk", "base_trades", DEFAULT_BASE_TRADES as i64)
                .clamp(0, u32::MAX as i64) as u32,
            trades_step: config
                .get_int("risk", "trades_step", DEFAULT_TRADES_STEP as i64)
                .clamp(0, u32::MAX as i64) as u32,
        }
    }

    pub fn validate(&self) -> Result<(), JournalError> {
        let invalid = |key: &str, reason: &str| JournalError::ConfigInvalid {
            section: "risk".into(),
            key: key.into(),
            reason: reason.into(),
        };
        if !(self.initial_capital > 0.0) {
            return Err(invalid("initial_capital", "initial capital must be positive"));
        }
        if !(self.risk_pct > 0.0 && self.risk_pct <= 1.0) {
            return Err(invalid("risk_pct", "risk_pct must be in (0, 1]"));
        }
        if !(self.milestone_step > 0.0) || !self.milestone_step.is_finite() {
            return Err(invalid("milestone_step", "milestone_step must be positive"));
        }
        if self.base_trades < 1 {
            return Err(invalid("base_trades", "base_trades must be at least 1"));
        }
        Ok(())
    }

    pub fn milestone_capital(&self, level: u32) -> f64 {
        self.initial_capital * (1.0 + self.milestone_step * level as f64)
    }

    /// Trades required while sitting at milestone `level`.
    pub fn trades_at_level(&self, level: u32) -> u64 {
        self.base_trades as u64 + self.trades_step as u64 * level as u64
    }

    /// Total trades needed to qualify for `level`.
    pub fn cumulative_trades(&self, level: u32) -> u64 {
        (0..level).map(|l| self.trades_at_level(l)).sum()
    }

    pub fn evaluate(&self, current_capital: f64, trades_logged: usize) -> RiskSnapshot {
        let growth = if self.initial_capital > 0.0 {
            (current_capital - self.initial_capital) / self.initial_capital
        } else {
            0.0
        };

        let milestone = if growth > 0.0 && self.milestone_step > 0.0 {
            // Small epsilon so exact multiples land on their milestone. The
            // cast saturates for tiny steps.
            ((growth + 1e-12) / self.milestone_step).floor() as u32
        } else {
            0
        };

        let qualified_level = self.qualified_level(trades_logged as u64);
        let effective_level = milestone.min(qualified_level);

        let risk_base = if current_capital < self.initial_capital {
            current_capital.max(0.0)
        } else {
            self.milestone_capital(effective_level)
        };

        let next_milestone_capital = self.milestone_capital(milestone.saturating_add(1));
        let trades_for_next_level = if qualified_level == u32::MAX {
            0
        } else {
            self.cumulative_trades(qualified_level + 1)
                .saturating_sub(trades_logged as u64) as usize
        };

        RiskSnapshot {
            current_capital,
            growth,
            milestone,
            milestone_capital: self.milestone_capital(milestone),
            next_milestone_capital,
            capital_to_next: (next_milestone_capital - current_capital).max(0.0),
            qualified_level,
            trades_logged,
            trades_for_next_level,
            risk_unlocked: milestone <= qualified_level,
            risk_base,
            risk_per_trade: risk_base * self.risk_pct,
            drawdown_from_initial: if self.initial_capital > 0.0 {
                ((self.initial_capital - current_capital) / self.initial_capital).max(0.0)
            } else {
                0.0
            },
        }
    }

    fn qualified_level(&self, trades_logged: u64) -> u32 {
        if self.base_trades == 0 && self.trades_step == 0 {
            return u32::MAX;
        }
        let mut level = 0u32;
        let mut required = 0u64;
        loop {
            required += self.trades_at_level(level);
            if required > trades_logged {
                return level;
            }
            level += 1;
        }
    }
}
