//! Per-tick win/lose evaluation
//!
//! Once a level has ended the evaluator ignores everything until reset.

use crate::core::types::{Seconds, StudentId};
use crate::events::{EventBus, Notification};
use crate::outcome::goal::{LevelGoal, LevelOutcome, LoseReason};
use crate::outcome::scoring::ScoreSummary;

/// Everything the evaluator reads on one tick
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct OutcomeSnapshot {
    pub disruption: f32,
    pub outside_count: usize,
    /// Student who has been outside longest, and for how long
    pub longest_outside: Option<(StudentId, Seconds)>,
    pub critical_count: usize,
    pub score: ScoreSummary,
}

#[derive(Debug, Clone, Default)]
pub struct OutcomeEvaluator {
    goal: Option<LevelGoal>,
    elapsed: Seconds,
    excess_timer: Seconds,
    outcome: Option<LevelOutcome>,
}

impl OutcomeEvaluator {
    pub fn new(goal: Option<LevelGoal>) -> Self {
        if goal.is_none() {
            tracing::info!("no level goal configured, only explicit end is possible");
        }
        Self {
            goal,
            ..Self::default()
        }
    }

    pub fn goal(&self) -> Option<&LevelGoal> {
        self.goal.as_ref()
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn outcome(&self) -> Option<&LevelOutcome> {
        self.outcome.as_ref()
    }

    pub fn is_ended(&self) -> bool {
        self.outcome.is_some()
    }

    /// Seconds left before the win check, if a time limit is set
    pub fn time_remaining(&self) -> Option<Seconds> {
        let limit = self.goal.as_ref()?.time_limit;
        (limit > 0.0).then(|| (limit - self.elapsed).max(0.0))
    }

    /// Advance time and evaluate the goal
    pub fn tick(
        &mut self,
        dt: Seconds,
        snapshot: &OutcomeSnapshot,
        bus: &mut EventBus,
    ) -> Option<LevelOutcome> {
        if self.is_ended() {
            return None;
        }
        self.elapsed += dt;

        let goal = self.goal.clone()?;

        if goal.time_limit > 0.0 && self.elapsed >= goal.time_limit {
            let score = snapshot.score;
            let met = snapshot.disruption <= goal.win_disruption_threshold
                && score.problems_resolved >= goal.required_resolved
                && score.calm_downs >= goal.required_calm_downs;
            return if met {
                self.win(goal.stars_for(score.score), score.score, bus)
            } else {
                self.lose(
                    LoseReason::GoalsNotMet {
                        disruption: snapshot.disruption,
                        resolved: score.problems_resolved,
                        calm_downs: score.calm_downs,
                    },
                    bus,
                )
            };
        }

        let reason = self.check_lose_conditions(&goal, dt, snapshot)?;
        self.lose(reason, bus)
    }

    /// Lose-only conditions, first match wins
    fn check_lose_conditions(
        &mut self,
        goal: &LevelGoal,
        dt: Seconds,
        snapshot: &OutcomeSnapshot,
    ) -> Option<LoseReason> {
        if goal.catastrophic_disruption > 0.0 && snapshot.disruption >= goal.catastrophic_disruption {
            return Some(LoseReason::CatastrophicDisruption {
                disruption: snapshot.disruption,
            });
        }

        if goal.catastrophic_outside_count > 0
            && snapshot.outside_count >= goal.catastrophic_outside_count
        {
            return Some(LoseReason::TooManyOutside {
                count: snapshot.outside_count,
            });
        }

        if goal.max_outside_duration > 0.0 {
            if let Some((student, seconds)) = snapshot.longest_outside {
                if seconds > goal.max_outside_duration {
                    return Some(LoseReason::OutsideTooLong { student, seconds });
                }
            }
        }

        if goal.catastrophic_critical_count > 0
            && snapshot.critical_count >= goal.catastrophic_critical_count
        {
            return Some(LoseReason::TooManyCritical {
                count: snapshot.critical_count,
            });
        }

        if snapshot.outside_count > goal.max_allowed_outside_students {
            self.excess_timer += dt;
            if self.excess_timer > goal.outside_grace_period {
                return Some(LoseReason::OutsideExcess {
                    count: snapshot.outside_count,
                    allowed: goal.max_allowed_outside_students,
                    seconds: self.excess_timer,
                });
            }
        } else {
            self.excess_timer = 0.0;
        }

        None
    }

    /// Declare a win; no-op once the level has ended
    pub fn win(&mut self, stars: u8, score: i32, bus: &mut EventBus) -> Option<LevelOutcome> {
        if self.is_ended() {
            return None;
        }
        tracing::info!(stars, score, elapsed = self.elapsed, "level won");
        bus.notify(Notification::LevelWon { stars, score });
        let outcome = LevelOutcome::Won { stars, score };
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    /// Declare a loss; works without a goal, no-op once the level has ended
    pub fn lose(&mut self, reason: LoseReason, bus: &mut EventBus) -> Option<LevelOutcome> {
        if self.is_ended() {
            return None;
        }
        tracing::info!(%reason, elapsed = self.elapsed, "level lost");
        bus.notify(Notification::LevelLost {
            reason: reason.clone(),
        });
        let outcome = LevelOutcome::Lost { reason };
        self.outcome = Some(outcome.clone());
        Some(outcome)
    }

    pub fn reset(&mut self) {
        self.elapsed = 0.0;
        self.excess_timer = 0.0;
        self.outcome = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quiet() -> OutcomeSnapshot {
        OutcomeSnapshot::default()
    }

    #[test]
    fn test_no_goal_is_inert() {
        let mut evaluator = OutcomeEvaluator::new(None);
        let mut bus = EventBus::new();
        let snapshot = OutcomeSnapshot {
            disruption: 100.0,
            outside_count: 10,
            ..quiet()
        };

        for _ in 0..1000 {
            assert!(evaluator.tick(1.0, &snapshot, &mut bus).is_none());
        }
        assert!(evaluator.lose(LoseReason::Abandoned, &mut bus).is_some());
    }

    #[test]
    fn test_win_at_time_limit() {
        let goal = LevelGoal {
            time_limit: 10.0,
            star_thresholds: [0, 10, 20],
            ..LevelGoal::default()
        };
        let mut evaluator = OutcomeEvaluator::new(Some(goal));
        let mut bus = EventBus::new();
        let mut snapshot = quiet();
        snapshot.score.score = 15;

        for _ in 0..9 {
            assert!(evaluator.tick(1.0, &snapshot, &mut bus).is_none());
        }
        assert_eq!(
            evaluator.tick(1.0, &snapshot, &mut bus),
            Some(LevelOutcome::Won { stars: 2, score: 15 })
        );
    }

    #[test]
    fn test_time_limit_with_unmet_goals_loses() {
        let goal = LevelGoal {
            time_limit: 5.0,
            required_calm_downs: 2,
            ..LevelGoal::default()
        };
        let mut evaluator = OutcomeEvaluator::new(Some(goal));
        let mut bus = EventBus::new();

        let outcome = evaluator.tick(5.0, &quiet(), &mut bus).unwrap();
        assert!(matches!(
            outcome,
            LevelOutcome::Lost {
                reason: LoseReason::GoalsNotMet { calm_downs: 0, .. }
            }
        ));
    }

    #[test]
    fn test_lose_priority_order() {
        let mut evaluator = OutcomeEvaluator::new(Some(LevelGoal::default()));
        let mut bus = EventBus::new();
        let snapshot = OutcomeSnapshot {
            disruption: 100.0,
            outside_count: 6,
            critical_count: 6,
            ..quiet()
        };

        let outcome = evaluator.tick(0.1, &snapshot, &mut bus).unwrap();
        assert_eq!(
            outcome,
            LevelOutcome::Lost {
                reason: LoseReason::CatastrophicDisruption { disruption: 100.0 }
            }
        );
    }

    #[test]
    fn test_outside_duration_cap() {
        let mut evaluator = OutcomeEvaluator::new(Some(LevelGoal::default()));
        let mut bus = EventBus::new();
        let snapshot = OutcomeSnapshot {
            outside_count: 1,
            longest_outside: Some((StudentId(4), 61.0)),
            ..quiet()
        };

        let outcome = evaluator.tick(0.1, &snapshot, &mut bus).unwrap();
        assert_eq!(
            outcome,
            LevelOutcome::Lost {
                reason: LoseReason::OutsideTooLong {
                    student: StudentId(4),
                    seconds: 61.0
                }
            }
        );
    }

    #[test]
    fn test_outside_excess_grace_resets() {
        let mut evaluator = OutcomeEvaluator::new(Some(LevelGoal::default()));
        let mut bus = EventBus::new();
        let excess = OutcomeSnapshot {
            disruption: 60.0,
            outside_count: 3,
            ..quiet()
        };
        let allowed = OutcomeSnapshot {
            outside_count: 2,
            ..excess
        };

        for _ in 0..9 {
            assert!(evaluator.tick(1.0, &excess, &mut bus).is_none());
        }
        // Dropping back to the allowed count resets the grace clock
        assert!(evaluator.tick(1.0, &allowed, &mut bus).is_none());
        for _ in 0..10 {
            assert!(evaluator.tick(1.0, &excess, &mut bus).is_none());
        }
        let outcome = evaluator.tick(1.0, &excess, &mut bus).unwrap();
        assert!(matches!(
            outcome,
            LevelOutcome::Lost {
                reason: LoseReason::OutsideExcess { count: 3, allowed: 2, .. }
            }
        ));
    }

    #[test]
    fn test_zero_outside_allowance_tolerates_nobody() {
        let goal = LevelGoal {
            max_allowed_outside_students: 0,
            outside_grace_period: 3.0,
            ..LevelGoal::default()
        };
        let mut evaluator = OutcomeEvaluator::new(Some(goal));
        let mut bus = EventBus::new();
        let one_outside = OutcomeSnapshot {
            outside_count: 1,
            longest_outside: Some((StudentId(2), 1.0)),
            ..quiet()
        };

        for _ in 0..3 {
            assert!(evaluator.tick(1.0, &one_outside, &mut bus).is_none());
        }
        let outcome = evaluator.tick(1.0, &one_outside, &mut bus).unwrap();
        assert!(matches!(
            outcome,
            LevelOutcome::Lost {
                reason: LoseReason::OutsideExcess { count: 1, allowed: 0, .. }
            }
        ));
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut evaluator = OutcomeEvaluator::new(Some(LevelGoal::default()));
        let mut bus = EventBus::new();

        assert!(evaluator.lose(LoseReason::Abandoned, &mut bus).is_some());
        assert!(evaluator.lose(LoseReason::Abandoned, &mut bus).is_none());
        assert!(evaluator.win(3, 100, &mut bus).is_none());
        assert!(evaluator
            .tick(1000.0, &OutcomeSnapshot::default(), &mut bus)
            .is_none());

        let ends = bus
            .notifications()
            .iter()
            .filter(|n| matches!(n, Notification::LevelLost { .. } | Notification::LevelWon { .. }))
            .count();
        assert_eq!(ends, 1);
    }
}
