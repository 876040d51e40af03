//! Autonomous behavior resolution
//!
//! Once per behavior check a student draws a single uniform value. If it falls
//! under the state-dependent interaction chance the student tries an object
//! interaction, otherwise it does something cosmetic and may talk itself up
//! one step on the escalation ladder.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::error::{ClassroomError, Result};
use crate::core::types::ObjectId;
use crate::events::types::EventType;
use crate::student::machine::Student;
use crate::student::state::BehaviorState;
use crate::world::ClassroomObject;

/// Probabilities driving autonomous behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BehaviorTuning {
    /// Seconds between behavior rolls for one student (0 = every tick)
    pub check_interval: f32,

    /// Chance per roll that a student interacts with a nearby object, by state
    pub interaction_chance_calm: f32,
    pub interaction_chance_distracted: f32,
    pub interaction_chance_acting_out: f32,
    pub interaction_chance_critical: f32,

    /// Width of each interaction band, checked in this priority order
    pub knock_over_chance: f32,
    pub make_noise_chance: f32,
    pub throw_chance: f32,
    pub drop_chance: f32,
    pub touch_chance: f32,

    /// Independent rolls for cosmetic idle behavior, first success wins
    pub look_around_chance: f32,
    pub fidget_chance: f32,
    pub stand_chance: f32,
    pub move_chance: f32,

    /// Base chance to self-escalate on a non-interaction roll
    ///
    /// Scaled up by impulsiveness and down by attention span.
    pub self_escalation_chance: f32,
}

impl Default for BehaviorTuning {
    fn default() -> Self {
        Self {
            check_interval: 1.0,
            interaction_chance_calm: 0.02,
            interaction_chance_distracted: 0.08,
            interaction_chance_acting_out: 0.2,
            interaction_chance_critical: 0.35,
            knock_over_chance: 0.15,
            make_noise_chance: 0.25,
            throw_chance: 0.15,
            drop_chance: 0.2,
            touch_chance: 0.25,
            look_around_chance: 0.3,
            fidget_chance: 0.2,
            stand_chance: 0.1,
            move_chance: 0.05,
            self_escalation_chance: 0.02,
        }
    }
}

impl BehaviorTuning {
    pub fn interaction_chance(&self, state: BehaviorState) -> f32 {
        match state {
            BehaviorState::Calm => self.interaction_chance_calm,
            BehaviorState::Distracted => self.interaction_chance_distracted,
            BehaviorState::ActingOut => self.interaction_chance_acting_out,
            BehaviorState::Critical => self.interaction_chance_critical,
        }
    }

    /// Effective self-escalation chance for a student
    pub fn self_escalation_for(&self, student: &Student) -> f32 {
        let p = &student.personality;
        (self.self_escalation_chance * (0.5 + p.impulsiveness) * (1.5 - p.attention_span))
            .clamp(0.0, 1.0)
    }

    pub fn validate(&self) -> Result<()> {
        if self.check_interval < 0.0 {
            return Err(ClassroomError::InvalidConfig(
                "behavior.check_interval must not be negative".into(),
            ));
        }
        let chances = [
            self.interaction_chance_calm,
            self.interaction_chance_distracted,
            self.interaction_chance_acting_out,
            self.interaction_chance_critical,
            self.knock_over_chance,
            self.make_noise_chance,
            self.throw_chance,
            self.drop_chance,
            self.touch_chance,
            self.look_around_chance,
            self.fidget_chance,
            self.stand_chance,
            self.move_chance,
            self.self_escalation_chance,
        ];
        if chances.iter().any(|c| !(0.0..=1.0).contains(c)) {
            return Err(ClassroomError::InvalidConfig(
                "behavior chances must be probabilities".into(),
            ));
        }
        Ok(())
    }
}

/// Object interactions in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ObjectInteraction {
    KnockOver,
    MakeNoise,
    Throw,
    Drop,
    Touch,
}

impl ObjectInteraction {
    pub fn event_type(self) -> EventType {
        match self {
            ObjectInteraction::KnockOver => EventType::KnockedOverObject,
            ObjectInteraction::MakeNoise => EventType::MakingNoise,
            ObjectInteraction::Throw => EventType::ThrowingObject,
            ObjectInteraction::Drop => EventType::DroppedItem,
            ObjectInteraction::Touch => EventType::TouchedObject,
        }
    }

    /// Whether this interaction leaves a mess on an object that can make one
    pub fn leaves_mess(self) -> bool {
        matches!(self, ObjectInteraction::KnockOver | ObjectInteraction::Drop)
    }
}

/// Cosmetic idle behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IdleBehavior {
    LookAround,
    Fidget,
    Stand,
    Move,
}

impl IdleBehavior {
    pub fn event_type(self) -> EventType {
        match self {
            IdleBehavior::LookAround => EventType::LookingAround,
            IdleBehavior::Fidget => EventType::Fidgeting,
            IdleBehavior::Stand => EventType::StandingUp,
            IdleBehavior::Move => EventType::Wandering,
        }
    }
}

/// Result of one autonomous behavior roll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BehaviorDecision {
    /// Interaction chance hit but nothing nearby allowed it
    Nothing,
    Interact {
        interaction: ObjectInteraction,
        object: ObjectId,
    },
    Idle {
        idle: Option<IdleBehavior>,
        self_escalate: bool,
    },
}

/// Roll autonomous behavior for one student
///
/// The caller is responsible for skipping inactive, mid-sequence and moving
/// students. Consumes a deterministic number of draws per branch so a seeded
/// rng reproduces runs exactly.
pub fn resolve_autonomous_behavior<R: Rng + ?Sized>(
    student: &Student,
    nearby: Option<&ClassroomObject>,
    tuning: &BehaviorTuning,
    rng: &mut R,
) -> BehaviorDecision {
    let draw: f32 = rng.gen();
    let chance = tuning.interaction_chance(student.state());

    if draw < chance {
        let Some(object) = nearby else {
            return BehaviorDecision::Nothing;
        };
        let band = draw / chance;
        return match pick_interaction(band, student, object, tuning) {
            Some(interaction) => BehaviorDecision::Interact {
                interaction,
                object: object.id,
            },
            None => BehaviorDecision::Nothing,
        };
    }

    let idle_rolls = [
        (IdleBehavior::LookAround, tuning.look_around_chance),
        (IdleBehavior::Fidget, tuning.fidget_chance),
        (IdleBehavior::Stand, tuning.stand_chance),
        (IdleBehavior::Move, tuning.move_chance),
    ];
    let mut idle = None;
    for (behavior, p) in idle_rolls {
        let roll: f32 = rng.gen();
        if idle.is_none() && roll < p {
            idle = Some(behavior);
        }
    }

    let escalate_roll: f32 = rng.gen();
    let self_escalate = student.state() != BehaviorState::Critical
        && escalate_roll < tuning.self_escalation_for(student);

    BehaviorDecision::Idle { idle, self_escalate }
}

/// Walk the cumulative bands in priority order, skipping disallowed interactions
fn pick_interaction(
    band: f32,
    student: &Student,
    object: &ClassroomObject,
    tuning: &BehaviorTuning,
) -> Option<ObjectInteraction> {
    let caps = &student.capabilities;
    let candidates = [
        (
            ObjectInteraction::KnockOver,
            caps.can_knock_over && object.can_knock_over,
            tuning.knock_over_chance,
        ),
        (
            ObjectInteraction::MakeNoise,
            caps.can_make_noise && object.can_make_noise,
            tuning.make_noise_chance,
        ),
        (
            ObjectInteraction::Throw,
            caps.can_throw && object.can_throw,
            tuning.throw_chance,
        ),
        (
            ObjectInteraction::Drop,
            caps.can_drop && object.can_drop,
            tuning.drop_chance,
        ),
        (
            ObjectInteraction::Touch,
            caps.can_touch && object.can_touch,
            tuning.touch_chance,
        ),
    ];

    let mut cumulative = 0.0;
    for (interaction, allowed, p) in candidates {
        if !allowed {
            continue;
        }
        cumulative += p;
        if band < cumulative {
            return Some(interaction);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::StudentId;
    use crate::student::personality::{Capabilities, Personality};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn desk() -> ClassroomObject {
        ClassroomObject::new(ObjectId(1), "desk")
    }

    fn tuning_always_interact() -> BehaviorTuning {
        BehaviorTuning {
            interaction_chance_calm: 1.0,
            ..BehaviorTuning::default()
        }
    }

    #[test]
    fn test_bands_follow_priority_order() {
        let student = Student::new(StudentId(1), "Ada", Personality::default());
        let tuning = BehaviorTuning::default();
        let object = desk();

        // Bands: knock [0,.15) noise [.15,.40) throw [.40,.55) drop [.55,.75) touch [.75,1)
        assert_eq!(pick_interaction(0.10, &student, &object, &tuning), Some(ObjectInteraction::KnockOver));
        assert_eq!(pick_interaction(0.20, &student, &object, &tuning), Some(ObjectInteraction::MakeNoise));
        assert_eq!(pick_interaction(0.50, &student, &object, &tuning), Some(ObjectInteraction::Throw));
        assert_eq!(pick_interaction(0.60, &student, &object, &tuning), Some(ObjectInteraction::Drop));
        assert_eq!(pick_interaction(0.90, &student, &object, &tuning), Some(ObjectInteraction::Touch));
    }

    #[test]
    fn test_disallowed_interactions_skip_their_band() {
        let student = Student::new(StudentId(1), "Ada", Personality::default());
        let tuning = BehaviorTuning::default();
        let mut object = desk();
        object.can_knock_over = false;

        // Noise now owns [0, .25)
        assert_eq!(pick_interaction(0.10, &student, &object, &tuning), Some(ObjectInteraction::MakeNoise));
    }

    #[test]
    fn test_student_capabilities_gate_interactions() {
        let student = Student::new(StudentId(1), "Ada", Personality::default())
            .with_capabilities(Capabilities::none());
        let tuning = BehaviorTuning::default();
        assert_eq!(pick_interaction(0.10, &student, &desk(), &tuning), None);
    }

    #[test]
    fn test_interaction_without_object_does_nothing() {
        let student = Student::new(StudentId(1), "Ada", Personality::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let decision = resolve_autonomous_behavior(&student, None, &tuning_always_interact(), &mut rng);
        assert_eq!(decision, BehaviorDecision::Nothing);
    }

    #[test]
    fn test_interaction_with_object() {
        let student = Student::new(StudentId(1), "Ada", Personality::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let decision =
            resolve_autonomous_behavior(&student, Some(&desk()), &tuning_always_interact(), &mut rng);
        assert!(matches!(decision, BehaviorDecision::Interact { object: ObjectId(1), .. }));
    }

    #[test]
    fn test_same_seed_same_decisions() {
        let student = Student::new(StudentId(1), "Ada", Personality::default());
        let tuning = BehaviorTuning::default();
        let object = desk();

        let run = |seed: u64| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..50)
                .map(|_| resolve_autonomous_behavior(&student, Some(&object), &tuning, &mut rng))
                .collect::<Vec<_>>()
        };

        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_critical_never_self_escalates() {
        let student = Student::new(StudentId(1), "Ada", Personality::default())
            .with_state(BehaviorState::Critical);
        let tuning = BehaviorTuning {
            interaction_chance_critical: 0.0,
            self_escalation_chance: 1.0,
            ..BehaviorTuning::default()
        };
        let mut rng = ChaCha8Rng::seed_from_u64(9);
        for _ in 0..20 {
            match resolve_autonomous_behavior(&student, None, &tuning, &mut rng) {
                BehaviorDecision::Idle { self_escalate, .. } => assert!(!self_escalate),
                other => panic!("unexpected decision {:?}", other),
            }
        }
    }

    #[test]
    fn test_self_escalation_scales_with_impulsiveness() {
        let tuning = BehaviorTuning::default();
        let calm_kid = Student::new(
            StudentId(1),
            "Ada",
            Personality {
                impulsiveness: 0.0,
                attention_span: 1.0,
                ..Personality::default()
            },
        );
        let wild_kid = Student::new(
            StudentId(2),
            "Bo",
            Personality {
                impulsiveness: 1.0,
                attention_span: 0.0,
                ..Personality::default()
            },
        );
        assert!(tuning.self_escalation_for(&wild_kid) > tuning.self_escalation_for(&calm_kid));
    }

    #[test]
    fn test_interaction_event_mapping() {
        assert_eq!(ObjectInteraction::Throw.event_type(), EventType::ThrowingObject);
        assert_eq!(IdleBehavior::Move.event_type(), EventType::Wandering);
        assert!(ObjectInteraction::KnockOver.leaves_mess());
        assert!(!ObjectInteraction::Touch.leaves_mess());
    }

    #[test]
    fn test_tuning_validation() {
        assert!(BehaviorTuning::default().validate().is_ok());
        let bad = BehaviorTuning {
            throw_chance: -0.1,
            ..BehaviorTuning::default()
        };
        assert!(bad.validate().is_err());
    }
}
