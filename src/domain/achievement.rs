//! Achievement catalogue for journaling milestones.

use super::risk::RiskSnapshot;
use super::stats::JournalStats;
use super::streak::Streaks;

/// Minimum sample before ratio-based achievements count.
pub const MIN_TRADES_FOR_RATIOS: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Achievement {
    FirstTrade,
    TenTrades,
    FiftyTrades,
    HundredTrades,
    HotStreak,
    OnFire,
    Unstoppable,
    Disciplined,
    IronWill,
    Consistent,
    FirstMilestone,
    DoubledUp,
    Edge,
    Sharpshooter,
}

impl Achievement {
    pub const ALL: [Achievement; 14] = [
        Achievement::FirstTrade,
        Achievement::TenTrades,
        Achievement::FiftyTrades,
        Achievement::HundredTrades,
        Achievement::HotStreak,
        Achievement::OnFire,
        Achievement::Unstoppable,
        Achievement::Disciplined,
        Achievement::IronWill,
        Achievement::Consistent,
        Achievement::FirstMilestone,
        Achievement::DoubledUp,
        Achievement::Edge,
        Achievement::Sharpshooter,
    ];

    pub fn slug(&self) -> &'static str {
        match self {
            Achievement::FirstTrade => "first-trade",
            Achievement::TenTrades => "ten-trades",
            Achievement::FiftyTrades => "fifty-trades",
            Achievement::HundredTrades => "hundred-trades",
            Achievement::HotStreak => "hot-streak",
            Achievement::OnFire => "on-fire",
            Achievement::Unstoppable => "unstoppable",
            Achievement::Disciplined => "disciplined",
            Achievement::IronWill => "iron-will",
            Achievement::Consistent => "consistent",
            Achievement::FirstMilestone => "first-milestone",
            Achievement::DoubledUp => "doubled-up",
            Achievement::Edge => "edge",
            Achievement::Sharpshooter => "sharpshooter",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Achievement::FirstTrade => "First Trade",
            Achievement::TenTrades => "Getting Started",
            Achievement::FiftyTrades => "Committed",
            Achievement::HundredTrades => "Centurion",
            Achievement::HotStreak => "Hot Streak",
            Achievement::OnFire => "On Fire",
            Achievement::Unstoppable => "Unstoppable",
            Achievement::Disciplined => "Disciplined",
            Achievement::IronWill => "Iron Will",
            Achievement::Consistent => "Consistent",
            Achievement::FirstMilestone => "First Milestone",
            Achievement::DoubledUp => "Doubled Up",
            Achievement::Edge => "Edge",
            Achievement::Sharpshooter => "Sharpshooter",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Achievement::FirstTrade => "Log your first trade",
            Achievement::TenTrades => "Log 10 trades",
            Achievement::FiftyTrades => "Log 50 trades",
            Achievement::HundredTrades => "Log 100 trades",
            Achievement::HotStreak => "Win 3 trades in a row",
            Achievement::OnFire => "Win 5 trades in a row",
            Achievement::Unstoppable => "Win 10 trades in a row",
            Achievement::Disciplined => "10 trades in a row without a risk flag",
            Achievement::IronWill => "25 trades in a row without a risk flag",
            Achievement::Consistent => "Journal trades 5 days in a row",
            Achievement::FirstMilestone => "Grow the account by one capital milestone",
            Achievement::DoubledUp => "Grow the account by two capital milestones",
            Achievement::Edge => "Profit factor of 2 or better over 20+ trades",
            Achievement::Sharpshooter => "Win rate of 60% or better over 20+ trades",
        }
    }

    /// Progress toward the goal, in `[0, 1]`.
    fn progress(&self, input: &AchievementInput) -> f64 {
        let fraction = |value: f64, target: f64| (value / target).clamp(0.0, 1.0);
        let sampled = |value: f64, target: f64| {
            let sample = fraction(input.total_trades as f64, MIN_TRADES_FOR_RATIOS as f64);
            if sample < 1.0 {
                // Sample size dominates until it is met.
                sample * 0.5
            } else {
                fraction(value, target)
            }
        };
        match self {
            Achievement::FirstTrade => fraction(input.total_trades as f64, 1.0),
            Achievement::TenTrades => fraction(input.total_trades as f64, 10.0),
            Achievement::FiftyTrades => fraction(input.total_trades as f64, 50.0),
            Achievement::HundredTrades => fraction(input.total_trades as f64, 100.0),
            Achievement::HotStreak => fraction(input.longest_win_streak as f64, 3.0),
            Achievement::OnFire => fraction(input.longest_win_streak as f64, 5.0),
            Achievement::Unstoppable => fraction(input.longest_win_streak as f64, 10.0),
            Achievement::Disciplined => fraction(input.longest_discipline_streak as f64, 10.0),
            Achievement::IronWill => fraction(input.longest_discipline_streak as f64, 25.0),
            Achievement::Consistent => fraction(input.longest_journal_days as f64, 5.0),
            Achievement::FirstMilestone => fraction(input.milestone as f64, 1.0),
            Achievement::DoubledUp => fraction(input.milestone as f64, 2.0),
            Achievement::Edge => sampled(input.profit_factor.min(f64::MAX), 2.0),
            Achievement::Sharpshooter => sampled(input.win_rate, 0.6),
        }
    }
}

impl std::fmt::Display for Achievement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// The figures achievements are judged on.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AchievementInput {
    pub total_trades: usize,
    pub longest_win_streak: usize,
    pub longest_discipline_streak: usize,
    pub longest_journal_days: usize,
    pub milestone: u32,
    pub profit_factor: f64,
    pub win_rate: f64,
}

impl AchievementInput {
    pub fn from_parts(stats: &JournalStats, streaks: &Streaks, risk: &RiskSnapshot) -> Self {
        AchievementInput {
            total_trades: stats.total_trades,
            longest_win_streak: streaks.longest_win,
            longest_discipline_streak: streaks.discipline_longest,
            longest_journal_days: streaks.journal_days_longest,
            milestone: risk.milestone,
            profit_factor: stats.profit_factor,
            win_rate: stats.win_rate,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AchievementStatus {
    pub achievement: Achievement,
    pub unlocked: bool,
    pub progress: f64,
}

pub fn evaluate(input: &AchievementInput) -> Vec<AchievementStatus> {
    Achievement::ALL
        .iter()
        .map(|&achievement| {
            let progress = achievement.progress(input);
            AchievementStatus {
                achievement,
                unlocked: progress >= 1.0,
                progress,
            }
        })
        .collect()
}

/// Achievements unlocked in `after` that were still locked in `before`.
pub fn newly_unlocked(before: &[AchievementStatus], after: &[AchievementStatus]) -> Vec<Achievement> {
    after
        .iter()
        .filter(|status| status.unlocked)
        .filter(|status| {
            !before
                .iter()
                .any(|prev| prev.achievement == status.achievement && prev.unlocked)
        })
        .map(|status| status.achievement)
        .collect()
}
