//! Journal trade entries and risk flags.

use chrono::NaiveDate;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Long,
    Short,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Long => write!(f, "long"),
            Direction::Short => write!(f, "short"),
        }
    }
}

impl FromStr for Direction {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "long" | "buy" => Ok(Direction::Long),
            "short" | "sell" => Ok(Direction::Short),
            other => Err(JournalError::invalid_trade(format!(
                "unknown direction '{other}' (expected long or short)"
            ))),
        }
    }
}

/// A self-reported breach of the trader's own risk rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RiskFlag {
    NoStopLoss,
    Oversized,
    MovedStop,
    Revenge,
    Overtrading,
    OffPlan,
}

impl RiskFlag {
    pub const ALL: [RiskFlag; 6] = [
        RiskFlag::NoStopLoss,
        RiskFlag::Oversized,
        RiskFlag::MovedStop,
        RiskFlag::Revenge,
        RiskFlag::Overtrading,
        RiskFlag::OffPlan,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RiskFlag::NoStopLoss => "no-stop-loss",
            RiskFlag::Oversized => "oversized",
            RiskFlag::MovedStop => "moved-stop",
            RiskFlag::Revenge => "revenge",
            RiskFlag::Overtrading => "overtrading",
            RiskFlag::OffPlan => "off-plan",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            RiskFlag::NoStopLoss => "No stop loss",
            RiskFlag::Oversized => "Oversized position",
            RiskFlag::MovedStop => "Moved stop",
            RiskFlag::Revenge => "Revenge trade",
            RiskFlag::Overtrading => "Overtrading",
            RiskFlag::OffPlan => "Off plan",
        }
    }
}

impl fmt::Display for RiskFlag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RiskFlag {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        RiskFlag::ALL
            .into_iter()
            .find(|flag| flag.as_str() == normalized)
            .ok_or_else(|| JournalError::invalid_trade(format!("unknown risk flag '{}'", s.trim())))
    }
}

/// Parse a `;` or `,` separated flag list. Blank input yields no flags.
pub fn parse_flags(input: &str) -> Result<BTreeSet<RiskFlag>, JournalError> {
    input
        .split([';', ','])
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(RiskFlag::from_str)
        .collect()
}

pub fn format_flags(flags: &BTreeSet<RiskFlag>) -> String {
    flags
        .iter()
        .map(RiskFlag::as_str)
        .collect::<Vec<_>>()
        .join(";")
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Breakeven,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TradeEntry {
    pub id: u64,
    pub date: NaiveDate,
    pub instrument: String,
    pub direction: Direction,
    pub pnl: f64,
    /// Amount put at risk; zero when the trader did not record it.
    pub risk: f64,
    pub flags: BTreeSet<RiskFlag>,
    pub feedback: String,
}

impl TradeEntry {
    pub fn outcome(&self) -> Outcome {
        if self.pnl > 0.0 {
            Outcome::Win
        } else if self.pnl < 0.0 {
            Outcome::Loss
        } else {
            Outcome::Breakeven
        }
    }

    pub fn r_multiple(&self) -> Option<f64> {
        if self.risk > 0.0 {
            Some(self.pnl / self.risk)
        } else {
            None
        }
    }

    pub fn is_disciplined(&self) -> bool {
        self.flags.is_empty()
    }
}

/// A trade as entered by the user, before the store assigns an id.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrade {
    pub date: NaiveDate,
    pub instrument: String,
    pub direction: Direction,
    pub pnl: f64,
    pub risk: f64,
    pub flags: BTreeSet<RiskFlag>,
    pub feedback: String,
}

impl NewTrade {
    pub fn validate(&self) -> Result<(), JournalError> {
        if self.instrument.trim().is_empty() {
            return Err(JournalError::invalid_trade("instrument must not be empty"));
        }
        if !self.pnl.is_finite() {
            return Err(JournalError::invalid_trade("pnl must be a finite number"));
        }
        if !self.risk.is_finite() || self.risk < 0.0 {
            return Err(JournalError::invalid_trade(
                "risk must be a non-negative number",
            ));
        }
        if !self.flags.is_empty() && self.feedback.trim().is_empty() {
            let flags = format_flags(&self.flags);
            return Err(JournalError::invalid_trade(format!(
                "flagged trade ({flags}) requires feedback explaining the breach"
            )));
        }
        Ok(())
    }

    pub fn into_entry(self, id: u64) -> TradeEntry {
        TradeEntry {
            id,
            date: self.date,
            instrument: self.instrument.trim().to_uppercase(),
            direction: self.direction,
            pnl: self.pnl,
            risk: self.risk,
            flags: self.flags,
            feedback: self.feedback.trim().to_string(),
        }
    }
}

pub fn next_trade_id(trades: &[TradeEntry]) -> u64 {
    trades.iter().map(|t| t.id).max().map_or(1, |max| max + 1)
}

/// Order trades chronologically, ties broken by id.
pub fn sort_chronological(trades: &mut [TradeEntry]) {
    trades.sort_by(|a, b| a.date.cmp(&b.date).then(a.id.cmp(&b.id)));
}
