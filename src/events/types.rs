//! Behavioral event vocabulary carried on the event bus

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::error::ClassroomError;
use crate::core::types::{EventId, MessId, ObjectId, Seconds, StudentId};

/// Types of behavioral events published by students, scripts and teacher actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventType {
    // Misbehavior that spreads to peers
    ThrowingObject,
    KnockedOverObject,
    MakingNoise,
    MessCreated,
    Laughing,

    // Misbehavior that stays local
    LeftSeat,
    Wandering,
    DroppedItem,
    TouchedObject,

    // Idle fidgeting (cosmetic)
    LookingAround,
    Fidgeting,
    StandingUp,

    // Teacher intervention outcomes
    StudentCalmed,
    StudentStopped,
    StudentTalkedTo,
    StudentScolded,
    StudentPraised,
    SentToSeat,
    ReturnedToSeat,
    StudentCalledBack,
    StudentEscorted,
    ItemConfiscated,
    MessCleaned,
}

impl EventType {
    /// All event types
    pub fn all() -> &'static [EventType] {
        &[
            EventType::ThrowingObject,
            EventType::KnockedOverObject,
            EventType::MakingNoise,
            EventType::MessCreated,
            EventType::Laughing,
            EventType::LeftSeat,
            EventType::Wandering,
            EventType::DroppedItem,
            EventType::TouchedObject,
            EventType::LookingAround,
            EventType::Fidgeting,
            EventType::StandingUp,
            EventType::StudentCalmed,
            EventType::StudentStopped,
            EventType::StudentTalkedTo,
            EventType::StudentScolded,
            EventType::StudentPraised,
            EventType::SentToSeat,
            EventType::ReturnedToSeat,
            EventType::StudentCalledBack,
            EventType::StudentEscorted,
            EventType::ItemConfiscated,
            EventType::MessCleaned,
        ]
    }

    /// Canonical name used in level files
    pub fn name(&self) -> &'static str {
        match self {
            EventType::ThrowingObject => "ThrowingObject",
            EventType::KnockedOverObject => "KnockedOverObject",
            EventType::MakingNoise => "MakingNoise",
            EventType::MessCreated => "MessCreated",
            EventType::Laughing => "Laughing",
            EventType::LeftSeat => "LeftSeat",
            EventType::Wandering => "Wandering",
            EventType::DroppedItem => "DroppedItem",
            EventType::TouchedObject => "TouchedObject",
            EventType::LookingAround => "LookingAround",
            EventType::Fidgeting => "Fidgeting",
            EventType::StandingUp => "StandingUp",
            EventType::StudentCalmed => "StudentCalmed",
            EventType::StudentStopped => "StudentStopped",
            EventType::StudentTalkedTo => "StudentTalkedTo",
            EventType::StudentScolded => "StudentScolded",
            EventType::StudentPraised => "StudentPraised",
            EventType::SentToSeat => "SentToSeat",
            EventType::ReturnedToSeat => "ReturnedToSeat",
            EventType::StudentCalledBack => "StudentCalledBack",
            EventType::StudentEscorted => "StudentEscorted",
            EventType::ItemConfiscated => "ItemConfiscated",
            EventType::MessCleaned => "MessCleaned",
        }
    }

    /// Disruption added (or removed) when this event is dispatched
    ///
    /// ADDITIVE on the 0-100 classroom scale.
    pub fn disruption_impact(&self) -> f32 {
        match self {
            EventType::ThrowingObject => 8.0,
            EventType::KnockedOverObject => 6.0,
            EventType::MakingNoise => 4.0,
            EventType::MessCreated => 5.0,
            EventType::Laughing => 2.0,

            EventType::LeftSeat => 3.0,
            EventType::Wandering => 2.0,
            EventType::DroppedItem => 1.0,
            EventType::TouchedObject => 0.5,

            EventType::LookingAround | EventType::Fidgeting | EventType::StandingUp => 0.0,

            EventType::StudentCalmed => -5.0,
            EventType::StudentStopped => -3.0,
            EventType::StudentTalkedTo => -1.0,
            EventType::StudentScolded => -2.0,
            EventType::StudentPraised => -1.0,
            EventType::SentToSeat => -2.0,
            EventType::ReturnedToSeat => -3.0,
            EventType::StudentCalledBack => -1.0,
            EventType::StudentEscorted => -4.0,
            EventType::ItemConfiscated => -3.0,
            EventType::MessCleaned => -4.0,
        }
    }

    /// True for events produced by a teacher intervention
    pub fn is_intervention(&self) -> bool {
        matches!(
            self,
            EventType::StudentCalmed
                | EventType::StudentStopped
                | EventType::StudentTalkedTo
                | EventType::StudentScolded
                | EventType::StudentPraised
                | EventType::SentToSeat
                | EventType::ReturnedToSeat
                | EventType::StudentCalledBack
                | EventType::StudentEscorted
                | EventType::ItemConfiscated
                | EventType::MessCleaned
        )
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for EventType {
    type Err = ClassroomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        EventType::all()
            .iter()
            .copied()
            .find(|t| t.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| ClassroomError::InvalidEventType(s.to_string()))
    }
}

/// How far an event's influence reaches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfluenceScope {
    None,
    WholeClass,
    SingleStudent,
}

/// A published behavioral event
///
/// Events are immutable once handed to the bus; subscribers only ever see
/// shared references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClassroomEvent {
    pub id: EventId,
    pub source: StudentId,
    pub event_type: EventType,
    pub target: Option<StudentId>,
    pub scope: Option<InfluenceScope>,
    pub description: String,
    pub timestamp: Seconds,
    /// Object involved, if any
    pub object: Option<ObjectId>,
    /// Mess created or cleaned, if any
    pub mess: Option<MessId>,
}

impl ClassroomEvent {
    pub fn new(source: StudentId, event_type: EventType, timestamp: Seconds) -> Self {
        Self {
            id: EventId::default(),
            source,
            event_type,
            target: None,
            scope: None,
            description: String::new(),
            timestamp,
            object: None,
            mess: None,
        }
    }

    pub fn with_target(mut self, target: StudentId) -> Self {
        self.target = Some(target);
        self
    }

    pub fn with_scope(mut self, scope: InfluenceScope) -> Self {
        self.scope = Some(scope);
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_object(mut self, object: ObjectId) -> Self {
        self.object = Some(object);
        self
    }

    pub fn with_mess(mut self, mess: MessId) -> Self {
        self.mess = Some(mess);
        self
    }
}
