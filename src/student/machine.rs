//! Student record and its behavioral state machine
//!
//! The state field is private: everything else in the crate requests
//! transitions through the methods below, each of which publishes a
//! `StudentStateChanged` notification when the state actually moves.

use serde::{Deserialize, Serialize};

use crate::core::types::{Seconds, StudentId};
use crate::events::{EventBus, Notification};
use crate::influence::ledger::InfluenceLedger;
use crate::student::personality::{Capabilities, Personality};
use crate::student::state::{ActiveReaction, BehaviorState, ReactionKind, StateTransition};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Student {
    pub id: StudentId,
    pub name: String,
    pub personality: Personality,
    pub capabilities: Capabilities,
    /// Peers currently influencing this student
    pub ledger: InfluenceLedger,
    /// Inactive students skip autonomous behavior (e.g. during a cutscene)
    pub active: bool,
    state: BehaviorState,
    reaction: Option<ActiveReaction>,
    immunity_until: Seconds,
    next_behavior_at: Seconds,
}

impl Student {
    pub fn new(id: StudentId, name: impl Into<String>, personality: Personality) -> Self {
        Self {
            id,
            name: name.into(),
            personality: personality.clamped(),
            capabilities: Capabilities::default(),
            ledger: InfluenceLedger::new(),
            active: true,
            state: BehaviorState::Calm,
            reaction: None,
            immunity_until: 0.0,
            next_behavior_at: 0.0,
        }
    }

    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities = capabilities;
        self
    }

    pub fn with_state(mut self, state: BehaviorState) -> Self {
        self.state = state;
        self
    }

    pub fn state(&self) -> BehaviorState {
        self.state
    }

    /// Move one step up the ladder; no-op at Critical
    pub fn escalate(&mut self, bus: &mut EventBus) -> Option<StateTransition> {
        self.transition_to(self.state.escalated(), bus)
    }

    /// Move one step down the ladder; no-op at Calm
    pub fn deescalate(&mut self, bus: &mut EventBus) -> Option<StateTransition> {
        self.transition_to(self.state.deescalated(), bus)
    }

    /// Jump directly to `state` (scripted outcomes, confiscation rules)
    pub fn set_state(&mut self, state: BehaviorState, bus: &mut EventBus) -> Option<StateTransition> {
        self.transition_to(state, bus)
    }

    fn transition_to(&mut self, new: BehaviorState, bus: &mut EventBus) -> Option<StateTransition> {
        if new == self.state {
            return None;
        }
        let old = self.state;
        self.state = new;
        tracing::debug!(student = %self.id, %old, %new, "state changed");
        bus.notify(Notification::StudentStateChanged {
            student: self.id,
            old,
            new,
        });
        Some(StateTransition {
            student: self.id,
            old,
            new,
        })
    }

    /// Show a transient reaction until `now + duration`
    pub fn trigger_reaction(
        &mut self,
        kind: ReactionKind,
        duration: Seconds,
        now: Seconds,
        bus: &mut EventBus,
    ) {
        let expires_at = now + duration.max(0.0);
        self.reaction = Some(ActiveReaction { kind, expires_at });
        bus.notify(Notification::ReactionTriggered {
            student: self.id,
            reaction: kind,
            until: expires_at,
        });
    }

    pub fn reaction(&self) -> Option<ReactionKind> {
        self.reaction.map(|r| r.kind)
    }

    /// Suppress propagation effects against this student until `now + duration`
    ///
    /// Never shortens an immunity that is already running longer.
    pub fn set_influence_immunity(&mut self, duration: Seconds, now: Seconds) {
        self.immunity_until = self.immunity_until.max(now + duration.max(0.0));
    }

    pub fn is_immune(&self, now: Seconds) -> bool {
        now < self.immunity_until
    }

    pub fn immunity_until(&self) -> Seconds {
        self.immunity_until
    }

    /// Expire the reaction if its time has passed; returns the cleared kind
    pub fn update_timers(&mut self, now: Seconds) -> Option<ReactionKind> {
        match self.reaction {
            Some(reaction) if reaction.is_expired(now) => {
                self.reaction = None;
                Some(reaction.kind)
            }
            _ => None,
        }
    }

    /// Whether the autonomous behavior roll is due
    pub fn behavior_due(&self, now: Seconds) -> bool {
        now >= self.next_behavior_at
    }

    pub fn schedule_next_behavior(&mut self, at: Seconds) {
        self.next_behavior_at = at;
    }

    /// Escort is only allowed once every influence on this student is resolved
    pub fn is_escort_eligible(&self) -> bool {
        self.ledger.all_resolved()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventType;

    fn student() -> Student {
        Student::new(StudentId(1), "Ada", Personality::default())
    }

    #[test]
    fn test_escalate_reaches_critical_in_three_steps() {
        let mut bus = EventBus::new();
        let mut s = student();

        assert!(s.escalate(&mut bus).is_some());
        assert!(s.escalate(&mut bus).is_some());
        assert!(s.escalate(&mut bus).is_some());
        assert_eq!(s.state(), BehaviorState::Critical);

        // Ceiling: no transition, no notification
        assert!(s.escalate(&mut bus).is_none());
        assert_eq!(s.state(), BehaviorState::Critical);
        assert_eq!(bus.notifications().len(), 3);
    }

    #[test]
    fn test_deescalate_at_calm_is_noop() {
        let mut bus = EventBus::new();
        let mut s = student();
        assert!(s.deescalate(&mut bus).is_none());
        assert!(bus.notifications().is_empty());
    }

    #[test]
    fn test_state_change_notification_carries_old_and_new() {
        let mut bus = EventBus::new();
        let mut s = student();
        s.set_state(BehaviorState::ActingOut, &mut bus);

        assert_eq!(
            bus.notifications()[0],
            Notification::StudentStateChanged {
                student: StudentId(1),
                old: BehaviorState::Calm,
                new: BehaviorState::ActingOut,
            }
        );
    }

    #[test]
    fn test_reaction_expires() {
        let mut bus = EventBus::new();
        let mut s = student();
        s.trigger_reaction(ReactionKind::Scared, 2.0, 10.0, &mut bus);

        assert_eq!(s.update_timers(11.0), None);
        assert_eq!(s.reaction(), Some(ReactionKind::Scared));
        assert_eq!(s.update_timers(12.0), Some(ReactionKind::Scared));
        assert_eq!(s.reaction(), None);
    }

    #[test]
    fn test_immunity_window() {
        let mut s = student();
        s.set_influence_immunity(5.0, 10.0);
        assert!(s.is_immune(14.9));
        assert!(!s.is_immune(15.0));

        // Shorter immunity does not cut the running one
        s.set_influence_immunity(1.0, 11.0);
        assert_eq!(s.immunity_until(), 15.0);
    }

    #[test]
    fn test_escort_eligibility_tracks_ledger() {
        let mut s = student();
        assert!(s.is_escort_eligible());

        s.ledger.record(StudentId(2), EventType::MakingNoise, 0.5, 0.0);
        assert!(!s.is_escort_eligible());

        s.ledger.resolve_from(StudentId(2));
        assert!(s.is_escort_eligible());
    }

    #[test]
    fn test_personality_clamped_on_creation() {
        let s = Student::new(
            StudentId(1),
            "Ada",
            Personality {
                impulsiveness: 3.0,
                ..Personality::default()
            },
        );
        assert_eq!(s.personality.impulsiveness, 1.0);
    }
}
