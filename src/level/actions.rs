//! Teacher intents supplied by the input layer

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ClassroomError;
use crate::events::types::EventType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TeacherAction {
    Calm,
    SendToSeat,
    Stop,
    Talk,
    Scold,
    Praise,
    CallStudentBack,
    EscortStudentBack,
    ForceReturnToSeat,
}

impl TeacherAction {
    pub fn all() -> &'static [TeacherAction] {
        &[
            TeacherAction::Calm,
            TeacherAction::SendToSeat,
            TeacherAction::Stop,
            TeacherAction::Talk,
            TeacherAction::Scold,
            TeacherAction::Praise,
            TeacherAction::CallStudentBack,
            TeacherAction::EscortStudentBack,
            TeacherAction::ForceReturnToSeat,
        ]
    }

    pub fn name(self) -> &'static str {
        match self {
            TeacherAction::Calm => "Calm",
            TeacherAction::SendToSeat => "SendToSeat",
            TeacherAction::Stop => "Stop",
            TeacherAction::Talk => "Talk",
            TeacherAction::Scold => "Scold",
            TeacherAction::Praise => "Praise",
            TeacherAction::CallStudentBack => "CallStudentBack",
            TeacherAction::EscortStudentBack => "EscortStudentBack",
            TeacherAction::ForceReturnToSeat => "ForceReturnToSeat",
        }
    }

    /// Event published when the action takes effect
    pub fn event_type(self) -> EventType {
        match self {
            TeacherAction::Calm => EventType::StudentCalmed,
            TeacherAction::SendToSeat => EventType::SentToSeat,
            TeacherAction::Stop => EventType::StudentStopped,
            TeacherAction::Talk => EventType::StudentTalkedTo,
            TeacherAction::Scold => EventType::StudentScolded,
            TeacherAction::Praise => EventType::StudentPraised,
            TeacherAction::CallStudentBack => EventType::StudentCalledBack,
            TeacherAction::EscortStudentBack => EventType::StudentEscorted,
            TeacherAction::ForceReturnToSeat => EventType::SentToSeat,
        }
    }
}

impl fmt::Display for TeacherAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TeacherAction {
    type Err = ClassroomError;

    /// Accepts the variant name in any case, plus a few console shorthands
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        let shorthand = match wanted.to_ascii_lowercase().as_str() {
            "seat" | "send" => Some(TeacherAction::SendToSeat),
            "callback" | "call" => Some(TeacherAction::CallStudentBack),
            "escort" => Some(TeacherAction::EscortStudentBack),
            "force" | "return" => Some(TeacherAction::ForceReturnToSeat),
            _ => None,
        };
        if let Some(action) = shorthand {
            return Ok(action);
        }
        TeacherAction::all()
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClassroomError::InvalidTeacherAction(s.to_string()))
    }
}

/// What a teacher action did
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ActionOutcome {
    /// Handled by the student's running interaction sequence
    SequenceStep { completed: bool },
    Applied,
    /// Action had no effect in the student's current situation
    NoEffect,
    /// Escort refused while influences on the student are unresolved
    Rejected { unresolved: usize },
    Backfired,
    UnknownStudent,
    LevelEnded,
}

impl ActionOutcome {
    pub fn took_effect(&self) -> bool {
        matches!(
            self,
            ActionOutcome::SequenceStep { .. } | ActionOutcome::Applied | ActionOutcome::Backfired
        )
    }
}
