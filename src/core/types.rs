//! Core type definitions used throughout the codebase

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Simulation time in seconds since level start
pub type Seconds = f32;

/// World-space position supplied by the presentation layer
pub type Position = glam::Vec3;

/// Stable identifier for a student within a level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct StudentId(pub u32);

impl StudentId {
    pub fn new(id: u32) -> Self {
        Self(id)
    }
}

impl fmt::Display for StudentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "student#{}", self.0)
    }
}

/// Identifier for an interactable classroom object (desk, bin, shelf...)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectId(pub u32);

/// Identifier for a mess left behind by a student
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessId(pub u32);

impl fmt::Display for MessId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mess#{}", self.0)
    }
}

/// Identifier for a published event
///
/// The bus stamps ids in publish order, so a seeded run reproduces them.
/// An event that was never published carries the nil id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct EventId(pub Uuid);

impl EventId {
    /// Id of the `n`th event published since the last bus reset
    pub fn from_sequence(n: u64) -> Self {
        Self(Uuid::from_u128(u128::from(n)))
    }

    pub fn is_published(&self) -> bool {
        !self.0.is_nil()
    }
}

/// Whether a student is inside the classroom or out of it
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Location {
    #[default]
    Inside,
    Outside,
}
