use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ClassroomError;
use crate::student::state::BehaviorState;

/// When a scripted trigger is allowed to fire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerCondition {
    /// Level time within tolerance of the trigger value
    TimeElapsed,
    Always,
    Random,
    OnActingOut,
    OnCritical,
    OnDistracted,
}

impl TriggerCondition {
    pub fn all() -> &'static [TriggerCondition] {
        &[
            TriggerCondition::TimeElapsed,
            TriggerCondition::Always,
            TriggerCondition::Random,
            TriggerCondition::OnActingOut,
            TriggerCondition::OnCritical,
            TriggerCondition::OnDistracted,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            TriggerCondition::TimeElapsed => "timeElapsed",
            TriggerCondition::Always => "Always",
            TriggerCondition::Random => "Random",
            TriggerCondition::OnActingOut => "OnActingOut",
            TriggerCondition::OnCritical => "OnCritical",
            TriggerCondition::OnDistracted => "OnDistracted",
        }
    }

    /// Time-based conditions still fire while the source is being moved
    pub fn is_time_based(self) -> bool {
        matches!(self, TriggerCondition::TimeElapsed)
    }

    /// State the source must be in, for state-based conditions
    pub fn required_state(self) -> Option<BehaviorState> {
        match self {
            TriggerCondition::OnActingOut => Some(BehaviorState::ActingOut),
            TriggerCondition::OnCritical => Some(BehaviorState::Critical),
            TriggerCondition::OnDistracted => Some(BehaviorState::Distracted),
            _ => None,
        }
    }
}

impl fmt::Display for TriggerCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TriggerCondition {
    type Err = ClassroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        TriggerCondition::all()
            .iter()
            .copied()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClassroomError::InvalidTriggerCondition(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_case_insensitive() {
        assert_eq!(
            "timeelapsed".parse::<TriggerCondition>().unwrap(),
            TriggerCondition::TimeElapsed
        );
        assert_eq!(
            " OnCritical ".parse::<TriggerCondition>().unwrap(),
            TriggerCondition::OnCritical
        );
        assert!("whenever".parse::<TriggerCondition>().is_err());
    }

    #[test]
    fn test_required_state() {
        assert_eq!(
            TriggerCondition::OnActingOut.required_state(),
            Some(BehaviorState::ActingOut)
        );
        assert_eq!(TriggerCondition::Random.required_state(), None);
        assert!(TriggerCondition::TimeElapsed.is_time_based());
        assert!(!TriggerCondition::Always.is_time_based());
    }
}
