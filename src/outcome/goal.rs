//! Win/lose thresholds for one level

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::core::error::{ClassroomError, Result};
use crate::core::types::{Seconds, StudentId};

/// Goal configuration
///
/// Zero disables a threshold lose condition, and a zero time limit means the
/// level only ends on a loss or an explicit end. The outside allowance is the
/// exception: `max_allowed_outside_students = 0` tolerates nobody outside, so
/// a single outside student starts the grace clock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LevelGoal {
    /// Seconds until the win conditions are checked
    pub time_limit: Seconds,

    // === WIN ===
    /// Final disruption must be at or below this
    pub win_disruption_threshold: f32,
    pub required_resolved: u32,
    pub required_calm_downs: u32,
    /// Minimum score for one, two and three stars
    pub star_thresholds: [i32; 3],

    // === LOSE (checked in this order) ===
    pub catastrophic_disruption: f32,
    pub catastrophic_outside_count: usize,
    /// Longest a single student may stay outside
    pub max_outside_duration: Seconds,
    pub catastrophic_critical_count: usize,
    /// More than this many students outside starts the grace clock
    pub max_allowed_outside_students: usize,
    pub outside_grace_period: Seconds,
}

impl Default for LevelGoal {
    fn default() -> Self {
        Self {
            time_limit: 180.0,
            win_disruption_threshold: 40.0,
            required_resolved: 0,
            required_calm_downs: 0,
            star_thresholds: [0, 100, 200],
            catastrophic_disruption: 100.0,
            catastrophic_outside_count: 5,
            max_outside_duration: 60.0,
            catastrophic_critical_count: 4,
            max_allowed_outside_students: 2,
            outside_grace_period: 10.0,
        }
    }
}

impl LevelGoal {
    pub fn validate(&self) -> Result<()> {
        if self.time_limit < 0.0 {
            return Err(ClassroomError::InvalidConfig(format!(
                "time_limit ({}) must not be negative",
                self.time_limit
            )));
        }
        let [one, two, three] = self.star_thresholds;
        if !(one <= two && two <= three) {
            return Err(ClassroomError::InvalidConfig(format!(
                "star_thresholds {:?} must be ascending",
                self.star_thresholds
            )));
        }
        Ok(())
    }

    /// Highest star tier whose threshold the score reaches
    pub fn stars_for(&self, score: i32) -> u8 {
        self.star_thresholds
            .iter()
            .rposition(|&threshold| score >= threshold)
            .map_or(0, |i| i as u8 + 1)
    }
}

/// Why a level was lost
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LoseReason {
    DisruptionTimeout { seconds: Seconds },
    GoalsNotMet {
        disruption: f32,
        resolved: u32,
        calm_downs: u32,
    },
    CatastrophicDisruption { disruption: f32 },
    TooManyOutside { count: usize },
    OutsideTooLong { student: StudentId, seconds: Seconds },
    TooManyCritical { count: usize },
    OutsideExcess { count: usize, allowed: usize, seconds: Seconds },
    /// Ended from outside the simulation
    Abandoned,
}

impl fmt::Display for LoseReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoseReason::DisruptionTimeout { seconds } => {
                write!(f, "classroom out of control for {:.0}s", seconds)
            }
            LoseReason::GoalsNotMet {
                disruption,
                resolved,
                calm_downs,
            } => write!(
                f,
                "time up with goals unmet (disruption {:.0}, {} resolved, {} calm-downs)",
                disruption, resolved, calm_downs
            ),
            LoseReason::CatastrophicDisruption { disruption } => {
                write!(f, "disruption reached {:.0}", disruption)
            }
            LoseReason::TooManyOutside { count } => {
                write!(f, "{} students outside the classroom", count)
            }
            LoseReason::OutsideTooLong { student, seconds } => {
                write!(f, "{} outside for {:.0}s", student, seconds)
            }
            LoseReason::TooManyCritical { count } => {
                write!(f, "{} students in critical state", count)
            }
            LoseReason::OutsideExcess {
                count,
                allowed,
                seconds,
            } => write!(
                f,
                "too many students outside ({} > {} allowed) for {:.0}s",
                count, allowed, seconds
            ),
            LoseReason::Abandoned => f.write_str("level abandoned"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LevelOutcome {
    Won { stars: u8, score: i32 },
    Lost { reason: LoseReason },
}

impl LevelOutcome {
    pub fn is_win(&self) -> bool {
        matches!(self, LevelOutcome::Won { .. })
    }
}
