//! Behavioral escalation ladder and transient reactions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ClassroomError;
use crate::core::types::{Seconds, StudentId};

/// Four-step escalation ladder
///
/// Calm is the floor and Critical the ceiling; moving along the ladder never
/// wraps or skips a step.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[repr(u8)]
pub enum BehaviorState {
    #[default]
    Calm = 0,
    Distracted = 1,
    ActingOut = 2,
    Critical = 3,
}

impl BehaviorState {
    pub fn all() -> &'static [BehaviorState] {
        &[
            BehaviorState::Calm,
            BehaviorState::Distracted,
            BehaviorState::ActingOut,
            BehaviorState::Critical,
        ]
    }

    /// One step up, saturating at Critical
    pub fn escalated(self) -> Self {
        match self {
            BehaviorState::Calm => BehaviorState::Distracted,
            BehaviorState::Distracted => BehaviorState::ActingOut,
            BehaviorState::ActingOut | BehaviorState::Critical => BehaviorState::Critical,
        }
    }

    /// One step down, saturating at Calm
    pub fn deescalated(self) -> Self {
        match self {
            BehaviorState::Calm | BehaviorState::Distracted => BehaviorState::Calm,
            BehaviorState::ActingOut => BehaviorState::Distracted,
            BehaviorState::Critical => BehaviorState::ActingOut,
        }
    }

    pub fn level(self) -> u8 {
        self as u8
    }

    /// ActingOut or Critical
    pub fn is_misbehaving(self) -> bool {
        self >= BehaviorState::ActingOut
    }

    pub fn name(self) -> &'static str {
        match self {
            BehaviorState::Calm => "Calm",
            BehaviorState::Distracted => "Distracted",
            BehaviorState::ActingOut => "ActingOut",
            BehaviorState::Critical => "Critical",
        }
    }
}

impl fmt::Display for BehaviorState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for BehaviorState {
    type Err = ClassroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BehaviorState::all()
            .iter()
            .copied()
            .find(|state| state.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ClassroomError::InvalidState(s.to_string()))
    }
}

/// Transient emotional flag shown on a student; purely informational
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReactionKind {
    Scared,
    Confused,
    Angry,
    Happy,
    Sad,
    Embarrassed,
}

/// A reaction with its expiry time
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ActiveReaction {
    pub kind: ReactionKind,
    pub expires_at: Seconds,
}

impl ActiveReaction {
    pub fn is_expired(&self, now: Seconds) -> bool {
        now >= self.expires_at
    }
}

/// Record of a single state change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateTransition {
    pub student: StudentId,
    pub old: BehaviorState,
    pub new: BehaviorState,
}
