//! Item confiscation rules: item name -> resulting student state

use serde::{Deserialize, Serialize};

use crate::student::state::BehaviorState;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfiscationRule {
    pub item: String,
    pub state: String,
}

#[derive(Debug, Clone, Default)]
pub struct ConfiscationRules {
    rules: Vec<(String, BehaviorState)>,
}

impl ConfiscationRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse rules, skipping entries with an unknown state
    pub fn from_rules(rules: &[ConfiscationRule]) -> Self {
        let mut out = Self::new();
        for rule in rules {
            match rule.state.parse::<BehaviorState>() {
                Ok(state) => out.insert(&rule.item, state),
                Err(e) => tracing::warn!(item = %rule.item, "skipping confiscation rule: {}", e),
            }
        }
        out
    }

    /// Add or replace the rule for `item`
    pub fn insert(&mut self, item: &str, state: BehaviorState) {
        let item = item.trim();
        match self.rules.iter_mut().find(|(name, _)| name.eq_ignore_ascii_case(item)) {
            Some(existing) => existing.1 = state,
            None => self.rules.push((item.to_string(), state)),
        }
    }

    /// State applied when `item` is confiscated (case-insensitive)
    pub fn lookup(&self, item: &str) -> Option<BehaviorState> {
        let item = item.trim();
        self.rules
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(item))
            .map(|(_, state)| *state)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }
}
