//! State-change notifications published alongside behavioral events
//!
//! Notifications describe what the core *did* (a state moved, the mood
//! changed, the level ended). They are consumed by the presentation layer
//! and are never fed back into propagation.

use serde::{Deserialize, Serialize};

use crate::classroom::ClassroomMood;
use crate::core::types::{Seconds, StudentId};
use crate::events::types::EventType;
use crate::influence::InfluenceTier;
use crate::outcome::LoseReason;
use crate::student::{BehaviorState, ReactionKind};

/// Movement the core asks the movement collaborator to perform
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MovementIntent {
    ToSeat,
    BackToClassroom,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    StudentStateChanged {
        student: StudentId,
        old: BehaviorState,
        new: BehaviorState,
    },
    ReactionTriggered {
        student: StudentId,
        reaction: ReactionKind,
        until: Seconds,
    },
    DisruptionChanged {
        old: f32,
        new: f32,
        reason: String,
    },
    MoodChanged {
        old: ClassroomMood,
        new: ClassroomMood,
    },
    DisruptionTimeoutWarning {
        remaining: Seconds,
    },
    InfluenceRecorded {
        source: StudentId,
        target: StudentId,
        event_type: EventType,
        strength: f32,
        tier: InfluenceTier,
    },
    SourcesResolved {
        source: StudentId,
        count: usize,
    },
    EscapeRouteRequested {
        student: StudentId,
    },
    MovementRequested {
        student: StudentId,
        intent: MovementIntent,
    },
    StudentLeftRoom {
        student: StudentId,
    },
    StudentReturnedToRoom {
        student: StudentId,
        seconds_outside: Seconds,
    },
    ScoreChanged {
        score: i32,
        delta: i32,
    },
    LevelWon {
        stars: u8,
        score: i32,
    },
    LevelLost {
        reason: LoseReason,
    },
}

impl Notification {
    /// Short label for logs
    pub fn label(&self) -> &'static str {
        match self {
            Notification::StudentStateChanged { .. } => "state_changed",
            Notification::ReactionTriggered { .. } => "reaction",
            Notification::DisruptionChanged { .. } => "disruption_changed",
            Notification::MoodChanged { .. } => "mood_changed",
            Notification::DisruptionTimeoutWarning { .. } => "timeout_warning",
            Notification::InfluenceRecorded { .. } => "influence_recorded",
            Notification::SourcesResolved { .. } => "sources_resolved",
            Notification::EscapeRouteRequested { .. } => "escape_route",
            Notification::MovementRequested { .. } => "movement_requested",
            Notification::StudentLeftRoom { .. } => "left_room",
            Notification::StudentReturnedToRoom { .. } => "returned_to_room",
            Notification::ScoreChanged { .. } => "score_changed",
            Notification::LevelWon { .. } => "level_won",
            Notification::LevelLost { .. } => "level_lost",
        }
    }
}
