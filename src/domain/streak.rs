//! Win/loss, discipline and journaling-day streaks.

use chrono::NaiveDate;

use super::ledger::Ledger;
use super::trade::Outcome;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Streak {
    None,
    Win(usize),
    Loss(usize),
}

impl Streak {
    pub fn len(&self) -> usize {
        match self {
            Streak::None => 0,
            Streak::Win(n) | Streak::Loss(n) => *n,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl std::fmt::Display for Streak {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Streak::None => write!(f, "-"),
            Streak::Win(n) => write!(f, "{n}W"),
            Streak::Loss(n) => write!(f, "{n}L"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Streaks {
    pub current: Streak,
    pub longest_win: usize,
    pub longest_loss: usize,
    pub discipline_current: usize,
    pub discipline_longest: usize,
    pub journal_days_current: usize,
    pub journal_days_longest: usize,
}

impl Streaks {
    /// `today` anchors the journaling-day streak: it only counts as current
    /// when the latest trade day is today or yesterday.
    pub fn compute(ledger: &Ledger, today: NaiveDate) -> Self {
        let mut current = Streak::None;
        let mut longest_win = 0usize;
        let mut longest_loss = 0usize;
        let mut discipline_current = 0usize;
        let mut discipline_longest = 0usize;

        for trade in &ledger.trades {
            current = match (trade.outcome(), current) {
                (Outcome::Win, Streak::Win(n)) => Streak::Win(n + 1),
                (Outcome::Win, _) => Streak::Win(1),
                (Outcome::Loss, Streak::Loss(n)) => Streak::Loss(n + 1),
                (Outcome::Loss, _) => Streak::Loss(1),
                (Outcome::Breakeven, _) => Streak::None,
            };
            match current {
                Streak::Win(n) => longest_win = longest_win.max(n),
                Streak::Loss(n) => longest_loss = longest_loss.max(n),
                Streak::None => {}
            }

            if trade.is_disciplined() {
                discipline_current += 1;
                discipline_longest = discipline_longest.max(discipline_current);
            } else {
                discipline_current = 0;
            }
        }

        let days: Vec<NaiveDate> = ledger.daily_pnl().into_keys().collect();
        let (journal_days_current, journal_days_longest) = day_streaks(&days, today);

        Streaks {
            current,
            longest_win,
            longest_loss,
            discipline_current,
            discipline_longest,
            journal_days_current,
            journal_days_longest,
        }
    }
}

/// `days` must be sorted ascending and free of duplicates.
fn day_streaks(days: &[NaiveDate], today: NaiveDate) -> (usize, usize) {
    let mut longest = 0usize;
    let mut run = 0usize;
    let mut prev: Option<NaiveDate> = None;

    for &day in days {
        run = match prev {
            Some(p) if day.signed_duration_since(p).num_days() == 1 => run + 1,
            _ => 1,
        };
        longest = longest.max(run);
        prev = Some(day);
    }

    let current = match prev {
        Some(last) if (0..=1).contains(&today.signed_duration_since(last).num_days()) => run,
        _ => 0,
    };

    (current, longest)
}
