//! Classroom Sim - rules engine for a classroom of autonomous students
//!
//! Students escalate and calm down on their own, spread misbehavior to their
//! peers, and push a shared disruption score that can lose the level. A
//! supervising teacher intervenes through [`level::Level`].

pub mod classroom;
pub mod core;
pub mod events;
pub mod influence;
pub mod level;
pub mod outcome;
pub mod sequence;
pub mod student;
pub mod triggers;
pub mod world;
