//! The trigger record and the in-memory set the match engine scans.

use crate::error::TriggerError;
use crate::matcher::{self, MatchMode};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Normalize a keyword into its matching form: trimmed and lowercased.
pub fn normalize_key(keyword: &str) -> String {
    keyword.trim().to_lowercase()
}

/// A registered keyword and the reply it produces.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trigger {
    /// Normalized keyword, unique across the store.
    pub key: String,
    /// Keyword as the admin typed it, used in listings.
    pub display: String,
    /// Text sent back verbatim when the trigger fires.
    pub reply: String,
}

impl Trigger {
    /// Build a trigger from admin input. Fails if the keyword is blank.
    pub fn new(keyword: &str, reply: &str) -> Result<Self, TriggerError> {
        let display = keyword.trim();
        let key = normalize_key(display);
        if key.is_empty() {
            return Err(TriggerError::Validation(
                "keyword must not be empty".to_string(),
            ));
        }
        Ok(Self {
            key,
            display: display.to_string(),
            reply: reply.to_string(),
        })
    }

    /// Rebuild a trigger from persisted columns.
    ///
    /// The key is normalized again so hand-edited files stay consistent.
    /// An empty display falls back to the key.
    pub fn from_parts(key: &str, display: &str, reply: &str) -> Result<Self, TriggerError> {
        let display = if display.trim().is_empty() {
            key
        } else {
            display
        };
        let mut trigger = Self::new(display, reply)?;
        let key = normalize_key(key);
        if !key.is_empty() {
            trigger.key = key;
        }
        Ok(trigger)
    }

    /// Length of the key in characters, used for longest-match tie-breaking.
    pub fn key_len(&self) -> usize {
        self.key.chars().count()
    }
}

/// Snapshot of all triggers, keyed by normalized keyword.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TriggerSet {
    by_key: HashMap<String, Trigger>,
}

impl TriggerSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Exact lookup by normalized key.
    pub fn get(&self, key: &str) -> Option<&Trigger> {
        self.by_key.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.by_key.contains_key(key)
    }

    /// Insert or replace. Returns the previous trigger for the same key.
    pub fn insert(&mut self, trigger: Trigger) -> Option<Trigger> {
        self.by_key.insert(trigger.key.clone(), trigger)
    }

    pub fn remove(&mut self, key: &str) -> Option<Trigger> {
        self.by_key.remove(key)
    }

    pub fn len(&self) -> usize {
        self.by_key.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_key.is_empty()
    }

    /// Iterate in arbitrary order.
    pub fn iter(&self) -> impl Iterator<Item = &Trigger> {
        self.by_key.values()
    }

    /// All triggers ordered lexicographically by key.
    pub fn sorted(&self) -> Vec<&Trigger> {
        let mut all: Vec<&Trigger> = self.by_key.values().collect();
        all.sort_by(|a, b| a.key.cmp(&b.key));
        all
    }

    /// Find the trigger that fires for `text` under `mode`, if any.
    pub fn find_match(&self, text: &str, mode: MatchMode) -> Option<&Trigger> {
        matcher::find_match(self, text, mode)
    }
}

impl FromIterator<Trigger> for TriggerSet {
    /// Later triggers replace earlier ones with the same key.
    fn from_iter<I: IntoIterator<Item = Trigger>>(iter: I) -> Self {
        let mut set = Self::new();
        for trigger in iter {
            set.insert(trigger);
        }
        set
    }
}
