//! Reconciling the local journal with its mirror copy.
//!
//! Trades are matched by id. Nothing here is automatic beyond the chosen
//! policy: every disagreement is reported back so the user can review it.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use super::error::JournalError;
use super::trade::{sort_chronological, TradeEntry};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    PreferLocal,
    PreferRemote,
    /// Keep local versions and leave conflicts for the user.
    #[default]
    Manual,
}

impl FromStr for MergePolicy {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "prefer-local" | "local" => Ok(MergePolicy::PreferLocal),
            "prefer-remote" | "remote" => Ok(MergePolicy::PreferRemote),
            "manual" => Ok(MergePolicy::Manual),
            other => Err(JournalError::ConfigInvalid {
                section: "mirror".into(),
                key: "merge_policy".into(),
                reason: format!("unknown merge policy '{other}'"),
            }),
        }
    }
}

impl fmt::Display for MergePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MergePolicy::PreferLocal => write!(f, "prefer-local"),
            MergePolicy::PreferRemote => write!(f, "prefer-remote"),
            MergePolicy::Manual => write!(f, "manual"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Conflict {
    pub local: TradeEntry,
    pub remote: TradeEntry,
}

impl Conflict {
    pub fn id(&self) -> u64 {
        self.local.id
    }

    /// Names of the fields that differ between the two sides.
    pub fn differing_fields(&self) -> Vec<&'static str> {
        let (l, r) = (&self.local, &self.remote);
        let mut fields = Vec::new();
        if l.date != r.date {
            fields.push("date");
        }
        if l.instrument != r.instrument {
            fields.push("instrument");
        }
        if l.direction != r.direction {
            fields.push("direction");
        }
        if l.pnl != r.pnl {
            fields.push("pnl");
        }
        if l.risk != r.risk {
            fields.push("risk");
        }
        if l.flags != r.flags {
            fields.push("flags");
        }
        if l.feedback != r.feedback {
            fields.push("feedback");
        }
        fields
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct MergeOutcome {
    pub merged: Vec<TradeEntry>,
    pub conflicts: Vec<Conflict>,
    pub local_only: Vec<u64>,
    pub remote_only: Vec<u64>,
    pub identical: usize,
}

impl MergeOutcome {
    pub fn is_clean(&self) -> bool {
        self.conflicts.is_empty()
    }

    /// Whether the local copy differs from `merged`.
    pub fn local_changed(&self, policy: MergePolicy) -> bool {
        !self.remote_only.is_empty()
            || (policy == MergePolicy::PreferRemote && !self.conflicts.is_empty())
    }

    /// Whether the remote copy differs from `merged`.
    pub fn remote_changed(&self, policy: MergePolicy) -> bool {
        !self.local_only.is_empty()
            || (policy != MergePolicy::PreferRemote && !self.conflicts.is_empty())
    }
}

pub fn merge(local: &[TradeEntry], remote: &[TradeEntry], policy: MergePolicy) -> MergeOutcome {
    let remote_by_id: BTreeMap<u64, &TradeEntry> = remote.iter().map(|t| (t.id, t)).collect();
    let local_by_id: BTreeMap<u64, &TradeEntry> = local.iter().map(|t| (t.id, t)).collect();

    let mut outcome = MergeOutcome::default();

    for (id, local_trade) in &local_by_id {
        match remote_by_id.get(id) {
            None => {
                outcome.local_only.push(*id);
                outcome.merged.push((*local_trade).clone());
            }
            Some(remote_trade) if *remote_trade == *local_trade => {
                outcome.identical += 1;
                outcome.merged.push((*local_trade).clone());
            }
            Some(remote_trade) => {
                let chosen = match policy {
                    MergePolicy::PreferRemote => (*remote_trade).clone(),
                    MergePolicy::PreferLocal | MergePolicy::Manual => (*local_trade).clone(),
                };
                outcome.merged.push(chosen);
                outcome.conflicts.push(Conflict {
                    local: (*local_trade).clone(),
                    remote: (*remote_trade).clone(),
                });
            }
        }
    }

    for (id, remote_trade) in &remote_by_id {
        if !local_by_id.contains_key(id) {
            outcome.remote_only.push(*id);
            outcome.merged.push((*remote_trade).clone());
        }
    }

    sort_chronological(&mut outcome.merged);
    outcome
}
