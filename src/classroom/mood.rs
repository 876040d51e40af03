use serde::{Deserialize, Serialize};
use std::fmt;

/// Four-tier classroom mood, a pure function of disruption
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub enum ClassroomMood {
    #[default]
    Calm,
    Noisy,
    Tense,
    Chaotic,
}

impl ClassroomMood {
    pub const NOISY_AT: f32 = 25.0;
    pub const TENSE_AT: f32 = 50.0;
    pub const CHAOTIC_AT: f32 = 75.0;

    pub fn from_disruption(disruption: f32) -> Self {
        if disruption >= Self::CHAOTIC_AT {
            ClassroomMood::Chaotic
        } else if disruption >= Self::TENSE_AT {
            ClassroomMood::Tense
        } else if disruption >= Self::NOISY_AT {
            ClassroomMood::Noisy
        } else {
            ClassroomMood::Calm
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ClassroomMood::Calm => "Calm",
            ClassroomMood::Noisy => "Noisy",
            ClassroomMood::Tense => "Tense",
            ClassroomMood::Chaotic => "Chaotic",
        }
    }
}

impl fmt::Display for ClassroomMood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
