//! Per-student personality parameters and capability flags

use serde::{Deserialize, Serialize};

/// Personality traits (all normalized 0.0 to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Personality {
    /// How long the student tolerates waiting before acting up
    pub patience: f32,
    /// How well the student stays on task (high = rarely self-escalates)
    pub attention_span: f32,
    /// Tendency to act on a whim (high = self-escalates often)
    pub impulsiveness: f32,
    /// Influence strength at or above which the student panics
    pub panic_threshold: f32,
    /// How readily peer misbehavior reaches this student
    pub influence_susceptibility: f32,
    /// How strongly the student shrugs off peer misbehavior
    pub influence_resistance: f32,
}

impl Default for Personality {
    fn default() -> Self {
        Self {
            patience: 0.5,
            attention_span: 0.5,
            impulsiveness: 0.3,
            panic_threshold: 0.7,
            influence_susceptibility: 0.5,
            influence_resistance: 0.3,
        }
    }
}

impl Personality {
    /// Copy with every trait clamped into 0..=1
    pub fn clamped(self) -> Self {
        Self {
            patience: self.patience.clamp(0.0, 1.0),
            attention_span: self.attention_span.clamp(0.0, 1.0),
            impulsiveness: self.impulsiveness.clamp(0.0, 1.0),
            panic_threshold: self.panic_threshold.clamp(0.0, 1.0),
            influence_susceptibility: self.influence_susceptibility.clamp(0.0, 1.0),
            influence_resistance: self.influence_resistance.clamp(0.0, 1.0),
        }
    }

    /// Multiplier applied to a base event severity when this student is the target
    pub fn influence_factor(&self) -> f32 {
        self.influence_susceptibility * (1.0 - self.influence_resistance)
    }
}

/// What a student is physically able to do with objects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Capabilities {
    pub can_knock_over: bool,
    pub can_make_noise: bool,
    pub can_throw: bool,
    pub can_drop: bool,
    pub can_touch: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self {
            can_knock_over: true,
            can_make_noise: true,
            can_throw: true,
            can_drop: true,
            can_touch: true,
        }
    }
}

impl Capabilities {
    pub fn none() -> Self {
        Self {
            can_knock_over: false,
            can_make_noise: false,
            can_throw: false,
            can_drop: false,
            can_touch: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_personality_bounded() {
        let p = Personality::default();
        for value in [
            p.patience,
            p.attention_span,
            p.impulsiveness,
            p.panic_threshold,
            p.influence_susceptibility,
            p.influence_resistance,
        ] {
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_clamped() {
        let p = Personality {
            impulsiveness: 1.7,
            influence_resistance: -0.2,
            ..Personality::default()
        }
        .clamped();
        assert_eq!(p.impulsiveness, 1.0);
        assert_eq!(p.influence_resistance, 0.0);
    }

    #[test]
    fn test_influence_factor() {
        let p = Personality {
            influence_susceptibility: 0.8,
            influence_resistance: 0.2,
            ..Personality::default()
        };
        assert!((p.influence_factor() - 0.64).abs() < 1e-6);
    }

    #[test]
    fn test_partial_toml() {
        let p: Personality = toml::from_str("impulsiveness = 0.9").unwrap();
        assert_eq!(p.impulsiveness, 0.9);
        assert_eq!(p.patience, 0.5);
    }
}
