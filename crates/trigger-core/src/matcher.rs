//! Match engine: decides which trigger, if any, fires for a message.
//!
//! The message is lowercased and otherwise left untouched. When several
//! triggers qualify, the longest key wins; equal lengths fall back to the
//! lexicographically smallest key so the outcome never depends on map order.

use crate::trigger::{Trigger, TriggerSet};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Policy deciding whether a trigger fires for a message.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchMode {
    /// The whole message equals the keyword.
    Exact,
    /// The keyword appears anywhere in the message.
    #[default]
    Substring,
    /// A whitespace-separated word of the message equals the keyword.
    Token,
}

impl MatchMode {
    /// Human-readable name for display (e.g. in `status`).
    pub fn display_name(&self) -> &str {
        match self {
            Self::Exact => "exact",
            Self::Substring => "substring",
            Self::Token => "token",
        }
    }
}

/// Find the trigger that fires for `text` under `mode`.
pub fn find_match<'a>(set: &'a TriggerSet, text: &str, mode: MatchMode) -> Option<&'a Trigger> {
    if set.is_empty() {
        return None;
    }
    let folded = text.to_lowercase();

    match mode {
        MatchMode::Exact => set.get(&folded),
        MatchMode::Substring => set
            .iter()
            .filter(|t| folded.contains(t.key.as_str()))
            .fold(None, more_specific),
        MatchMode::Token => folded
            .split_whitespace()
            .filter_map(|token| set.get(token))
            .fold(None, more_specific),
    }
}

/// Keep whichever candidate is more specific.
fn more_specific<'a>(best: Option<&'a Trigger>, candidate: &'a Trigger) -> Option<&'a Trigger> {
    match best {
        None => Some(candidate),
        Some(current) => match specificity(candidate, current) {
            Ordering::Greater => Some(candidate),
            _ => Some(current),
        },
    }
}

/// Longer keys rank higher; among equal lengths the smaller key ranks higher.
fn specificity(a: &Trigger, b: &Trigger) -> Ordering {
    a.key_len()
        .cmp(&b.key_len())
        .then_with(|| b.key.cmp(&a.key))
}
