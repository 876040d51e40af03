//! Branching teacher/student interaction sequences
//!
//! A sequence is an ordered list of steps, each naming the teacher action
//! (and optionally the student state) that moves it forward. Steps may
//! branch on success/failure and auto-advance after a timeout.

pub mod engine;
pub mod step;

pub use engine::{SequenceEngine, SequenceInstance, StepResult, StepResultKind};
pub use step::{InteractionSequence, SequenceStep, StepBranch, StepTimeout};
