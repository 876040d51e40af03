//! Student behavioral state machine
//!
//! One `Student` per pupil: a four-state escalation ladder, transient
//! reactions, influence immunity and the personality that drives both
//! autonomous misbehavior and susceptibility to peers.

pub mod behavior;
pub mod machine;
pub mod personality;
pub mod roster;
pub mod state;

pub use behavior::{
    resolve_autonomous_behavior, BehaviorDecision, BehaviorTuning, IdleBehavior, ObjectInteraction,
};
pub use machine::Student;
pub use personality::{Capabilities, Personality};
pub use roster::Roster;
pub use state::{ActiveReaction, BehaviorState, ReactionKind, StateTransition};
