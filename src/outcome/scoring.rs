//! Points and counters accumulated from the event stream

use serde::{Deserialize, Serialize};

use crate::events::types::{ClassroomEvent, EventType};
use crate::events::{EventBus, Notification};
use crate::influence::is_influence_eligible;

/// Points per event type
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringRules {
    pub calmed: i32,
    pub stopped: i32,
    pub talked_to: i32,
    pub scolded: i32,
    pub praised: i32,
    pub sent_to_seat: i32,
    pub returned_to_seat: i32,
    pub called_back: i32,
    pub escorted: i32,
    pub confiscated: i32,
    pub mess_cleaned: i32,
    /// Applied to every misbehavior that spreads to peers
    pub misbehavior_penalty: i32,
}

impl Default for ScoringRules {
    fn default() -> Self {
        Self {
            calmed: 10,
            stopped: 5,
            talked_to: 3,
            scolded: 2,
            praised: 5,
            sent_to_seat: 5,
            returned_to_seat: 2,
            called_back: 5,
            escorted: 15,
            confiscated: 8,
            mess_cleaned: 8,
            misbehavior_penalty: -2,
        }
    }
}

impl ScoringRules {
    pub fn points(&self, event_type: EventType) -> i32 {
        match event_type {
            EventType::StudentCalmed => self.calmed,
            EventType::StudentStopped => self.stopped,
            EventType::StudentTalkedTo => self.talked_to,
            EventType::StudentScolded => self.scolded,
            EventType::StudentPraised => self.praised,
            EventType::SentToSeat => self.sent_to_seat,
            EventType::ReturnedToSeat => self.returned_to_seat,
            EventType::StudentCalledBack => self.called_back,
            EventType::StudentEscorted => self.escorted,
            EventType::ItemConfiscated => self.confiscated,
            EventType::MessCleaned => self.mess_cleaned,
            t if is_influence_eligible(t) => self.misbehavior_penalty,
            _ => 0,
        }
    }
}

/// Interventions that count towards the "problems resolved" goal
pub fn resolves_problem(event_type: EventType) -> bool {
    matches!(
        event_type,
        EventType::MessCleaned
            | EventType::StudentEscorted
            | EventType::ReturnedToSeat
            | EventType::ItemConfiscated
    )
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreSummary {
    pub score: i32,
    pub problems_resolved: u32,
    pub calm_downs: u32,
    pub misbehaviors: u32,
    pub interventions: u32,
}

#[derive(Debug, Clone, Default)]
pub struct Scorer {
    rules: ScoringRules,
    summary: ScoreSummary,
}

impl Scorer {
    pub fn new(rules: ScoringRules) -> Self {
        Self {
            rules,
            summary: ScoreSummary::default(),
        }
    }

    pub fn summary(&self) -> ScoreSummary {
        self.summary
    }

    pub fn score(&self) -> i32 {
        self.summary.score
    }

    /// Count the event and apply its points; the score never drops below zero
    pub fn on_event(&mut self, event: &ClassroomEvent, bus: &mut EventBus) -> i32 {
        let event_type = event.event_type;
        if event_type.is_intervention() {
            self.summary.interventions += 1;
        }
        if is_influence_eligible(event_type) {
            self.summary.misbehaviors += 1;
        }
        if resolves_problem(event_type) {
            self.summary.problems_resolved += 1;
        }
        if event_type == EventType::StudentCalmed {
            self.summary.calm_downs += 1;
        }

        self.add_points(self.rules.points(event_type), bus)
    }

    /// Adjust the score directly; returns the delta actually applied
    pub fn add_points(&mut self, points: i32, bus: &mut EventBus) -> i32 {
        let old = self.summary.score;
        self.summary.score = (old + points).max(0);
        let delta = self.summary.score - old;
        if delta != 0 {
            bus.notify(Notification::ScoreChanged {
                score: self.summary.score,
                delta,
            });
        }
        delta
    }

    pub fn reset(&mut self) {
        self.summary = ScoreSummary::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StudentId;

    fn event(event_type: EventType) -> ClassroomEvent {
        ClassroomEvent::new(StudentId(1), event_type, 0.0)
    }

    #[test]
    fn test_calm_counts_as_calm_down() {
        let mut scorer = Scorer::new(ScoringRules::default());
        let mut bus = EventBus::new();

        scorer.on_event(&event(EventType::StudentCalmed), &mut bus);

        let summary = scorer.summary();
        assert_eq!(summary.score, 10);
        assert_eq!(summary.calm_downs, 1);
        assert_eq!(summary.problems_resolved, 0);
        assert_eq!(summary.interventions, 1);
    }

    #[test]
    fn test_score_floored_at_zero() {
        let mut scorer = Scorer::new(ScoringRules::default());
        let mut bus = EventBus::new();

        let delta = scorer.on_event(&event(EventType::ThrowingObject), &mut bus);

        assert_eq!(delta, 0);
        assert_eq!(scorer.score(), 0);
        assert_eq!(scorer.summary().misbehaviors, 1);
        assert!(bus.notifications().is_empty());
    }

    #[test]
    fn test_penalty_after_points() {
        let mut scorer = Scorer::new(ScoringRules::default());
        let mut bus = EventBus::new();

        scorer.on_event(&event(EventType::StudentEscorted), &mut bus);
        scorer.on_event(&event(EventType::MakingNoise), &mut bus);

        assert_eq!(scorer.score(), 13);
        assert_eq!(scorer.summary().problems_resolved, 1);
    }

    #[test]
    fn test_cosmetic_events_score_nothing() {
        let rules = ScoringRules::default();
        assert_eq!(rules.points(EventType::Fidgeting), 0);
        assert_eq!(rules.points(EventType::LeftSeat), 0);
    }

    #[test]
    fn test_partial_rules_from_toml() {
        let rules: ScoringRules = toml::from_str("calmed = 25").unwrap();
        assert_eq!(rules.calmed, 25);
        assert_eq!(rules.escorted, 15);
    }
}
