//! Classroom-wide disruption and mood

pub mod aggregate;
pub mod mood;

pub use aggregate::{AggregateSettings, AggregateUpdate, ClassroomAggregate, DisruptionTimeout};
pub use mood::ClassroomMood;
