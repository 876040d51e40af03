//! Simulation configuration with documented constants
//!
//! All tunable numbers for a level are collected here with explanations of
//! their purpose and how they interact with each other. A level file may
//! override any subset; everything missing falls back to `Default`.

use serde::{Deserialize, Serialize};

use crate::core::error::{ClassroomError, Result};
use crate::outcome::scoring::ScoringRules;
use crate::student::behavior::BehaviorTuning;

/// Configuration for the classroom simulation systems
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    // === OUTSIDE TRACKING ===
    /// Seconds between outside-student disruption penalties
    ///
    /// Every interval, while at least one student is outside the room,
    /// `outside_count * outside_disruption_rate` disruption is added.
    pub outside_check_interval: f32,

    /// Disruption added per outside student per interval
    pub outside_disruption_rate: f32,

    /// Ceiling on the total outside penalty applied during one level
    ///
    /// Once reached, students being outside no longer raise disruption
    /// (they still count towards the outcome lose conditions).
    pub max_outside_penalty: f32,

    // === DISRUPTION TIMEOUT ===
    /// Whether sustained high disruption can fail the level on its own
    pub disruption_timeout_enabled: bool,

    /// Disruption level at or above which the timeout clock runs
    pub disruption_timeout_threshold: f32,

    /// Seconds of continuous high disruption before the level is failed
    pub disruption_timeout_duration: f32,

    /// Seconds into the timeout at which the one-shot warning fires
    ///
    /// Must be shorter than `disruption_timeout_duration`.
    pub disruption_timeout_warning: f32,

    // === INFLUENCE ===
    /// Maximum distance (world units) over which single-student influence travels
    pub max_influence_radius: f32,

    /// How long a reaction (Scared, Confused...) stays on a student
    pub reaction_duration: f32,

    /// Escalation chance for a medium-strength hit on a Calm student
    pub medium_escalation_calm: f32,

    /// Escalation chance for a medium-strength hit on a Distracted student
    pub medium_escalation_distracted: f32,

    /// Escalation chance for a medium-strength hit on an ActingOut student
    pub medium_escalation_acting_out: f32,

    /// Chance a medium-strength hit leaves the target Confused
    pub medium_confused_chance: f32,

    /// Escalation chance for a weak hit (only Calm targets are eligible)
    pub weak_escalation_chance: f32,

    // === TEACHER ACTIONS ===
    /// Influence immunity granted when a student is called back
    pub call_back_immunity: f32,

    /// Influence immunity granted when a student is escorted back
    pub escort_immunity: f32,

    /// Impulsiveness above which scolding backfires
    pub scold_backfire_impulsiveness: f32,

    // === SCRIPTED TRIGGERS ===
    /// Seconds between scripted trigger evaluations
    ///
    /// Triggers are polled, not evaluated every tick, which is why
    /// time-based triggers use a tolerance window.
    pub trigger_poll_interval: f32,

    /// Half-width of the window in which a time-elapsed trigger may fire
    pub trigger_time_tolerance: f32,

    // === AUTONOMOUS BEHAVIOR ===
    /// Probabilities for per-student autonomous behavior rolls
    pub behavior: BehaviorTuning,

    // === SCORING ===
    /// Points awarded per event type
    pub scoring: ScoringRules,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            // Outside tracking (caps at 15 intervals of a single student)
            outside_check_interval: 5.0,
            outside_disruption_rate: 2.0,
            max_outside_penalty: 30.0,

            // Disruption timeout
            disruption_timeout_enabled: true,
            disruption_timeout_threshold: 80.0,
            disruption_timeout_duration: 30.0,
            disruption_timeout_warning: 20.0,

            // Influence
            max_influence_radius: 6.0,
            reaction_duration: 3.0,
            medium_escalation_calm: 0.5,
            medium_escalation_distracted: 0.35,
            medium_escalation_acting_out: 0.2,
            medium_confused_chance: 0.3,
            weak_escalation_chance: 0.15,

            // Teacher actions
            call_back_immunity: 5.0,
            escort_immunity: 10.0,
            scold_backfire_impulsiveness: 0.7,

            // Triggers
            trigger_poll_interval: 0.5,
            trigger_time_tolerance: 0.5,

            behavior: BehaviorTuning::default(),
            scoring: ScoringRules::default(),
        }
    }
}

impl SimulationConfig {
    /// Create a new config with default values
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate configuration for internal consistency
    pub fn validate(&self) -> Result<()> {
        if self.outside_check_interval <= 0.0 {
            return Err(ClassroomError::InvalidConfig(format!(
                "outside_check_interval ({}) must be positive",
                self.outside_check_interval
            )));
        }

        if self.trigger_poll_interval <= 0.0 {
            return Err(ClassroomError::InvalidConfig(format!(
                "trigger_poll_interval ({}) must be positive",
                self.trigger_poll_interval
            )));
        }

        if !(0.0..=100.0).contains(&self.disruption_timeout_threshold) {
            return Err(ClassroomError::InvalidConfig(format!(
                "disruption_timeout_threshold ({}) must be within 0..=100",
                self.disruption_timeout_threshold
            )));
        }

        if self.disruption_timeout_warning >= self.disruption_timeout_duration {
            return Err(ClassroomError::InvalidConfig(format!(
                "disruption_timeout_warning ({}) should be < disruption_timeout_duration ({})",
                self.disruption_timeout_warning, self.disruption_timeout_duration
            )));
        }

        let chances = [
            ("medium_escalation_calm", self.medium_escalation_calm),
            ("medium_escalation_distracted", self.medium_escalation_distracted),
            ("medium_escalation_acting_out", self.medium_escalation_acting_out),
            ("medium_confused_chance", self.medium_confused_chance),
            ("weak_escalation_chance", self.weak_escalation_chance),
        ];
        for (name, value) in chances {
            if !(0.0..=1.0).contains(&value) {
                return Err(ClassroomError::InvalidConfig(format!(
                    "{} ({}) must be a probability",
                    name, value
                )));
            }
        }

        self.behavior.validate()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(SimulationConfig::default().validate().is_ok());
    }

    #[test]
    fn test_warning_must_precede_timeout() {
        let config = SimulationConfig {
            disruption_timeout_warning: 30.0,
            disruption_timeout_duration: 30.0,
            ..SimulationConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_probabilities_checked() {
        let config = SimulationConfig {
            weak_escalation_chance: 1.5,
            ..SimulationConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("weak_escalation_chance"));
    }

    #[test]
    fn test_partial_toml_falls_back_to_defaults() {
        let config: SimulationConfig = toml::from_str("max_influence_radius = 12.0").unwrap();
        assert_eq!(config.max_influence_radius, 12.0);
        assert_eq!(config.outside_check_interval, 5.0);
        assert_eq!(config.trigger_poll_interval, 0.5);
    }
}
