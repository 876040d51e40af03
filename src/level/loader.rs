//! Level files
//!
//! A level is a TOML document with the roster, goal, scripted triggers,
//! interaction sequences and confiscation rules. Levels live under
//! `data/levels/{name}.toml`.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{ObjectId, Position, StudentId};
use crate::level::confiscation::ConfiscationRule;
use crate::outcome::LevelGoal;
use crate::sequence::InteractionSequence;
use crate::student::{BehaviorState, Capabilities, Personality, Student};
use crate::triggers::TriggerDefinition;
use crate::world::{ClassroomObject, StaticWorld};

/// One student entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentConfig {
    pub id: u32,
    pub name: String,
    #[serde(default)]
    pub personality: Personality,
    #[serde(default)]
    pub capabilities: Capabilities,
    #[serde(default)]
    pub state: BehaviorState,
    /// Seat position, `[x, y, z]`
    #[serde(default)]
    pub seat: Option<Position>,
    /// Interaction sequence bound at level start
    #[serde(default)]
    pub sequence: Option<String>,
    /// Whether the scene gives this student somewhere to run to
    #[serde(default)]
    pub escape_route: bool,
    /// Object within reach at level start
    #[serde(default)]
    pub nearby_object: Option<u32>,
}

impl StudentConfig {
    pub fn to_student(&self) -> Student {
        Student::new(StudentId(self.id), self.name.clone(), self.personality)
            .with_capabilities(self.capabilities)
            .with_state(self.state)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelConfig {
    pub name: String,
    #[serde(default)]
    pub seed: u64,
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default)]
    pub goal: Option<LevelGoal>,
    #[serde(default, deserialize_with = "skip_invalid_entries")]
    pub students: Vec<StudentConfig>,
    #[serde(default)]
    pub objects: Vec<ClassroomObject>,
    #[serde(default)]
    pub triggers: Vec<TriggerDefinition>,
    /// A sequence with any unreadable step is dropped whole
    #[serde(default, deserialize_with = "skip_invalid_entries")]
    pub sequences: Vec<InteractionSequence>,
    #[serde(default)]
    pub confiscation: Vec<ConfiscationRule>,
}

impl LevelConfig {
    /// In-memory world matching the level's seats, objects and escape routes
    pub fn build_world(&self) -> StaticWorld {
        let mut world = StaticWorld::new();
        for object in &self.objects {
            world.add_object(object.clone());
        }
        for student in &self.students {
            let id = StudentId(student.id);
            if let Some(seat) = student.seat {
                world.place(id, seat);
            }
            if student.escape_route {
                world.add_escape_route(id);
            }
            if let Some(object) = student.nearby_object {
                world.set_nearby(id, ObjectId(object));
            }
        }
        world
    }
}

/// Read a list one entry at a time, logging and dropping entries that don't parse
fn skip_invalid_entries<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let raw = Vec::<toml::Value>::deserialize(deserializer)?;
    let entries = raw
        .into_iter()
        .enumerate()
        .filter_map(|(index, value)| match value.try_into::<T>() {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(index, "skipping level entry: {}", e);
                None
            }
        })
        .collect();
    Ok(entries)
}

/// Parse and validate a level from TOML text
pub fn parse_level(contents: &str) -> Result<LevelConfig> {
    let level: LevelConfig = toml::from_str(contents)?;
    level.simulation.validate()?;
    if let Some(goal) = &level.goal {
        goal.validate()?;
    }
    Ok(level)
}

/// Load a level file from disk
pub fn load_level(path: impl AsRef<Path>) -> Result<LevelConfig> {
    let path = path.as_ref();
    let contents = fs::read_to_string(path)?;
    let level = parse_level(&contents)?;
    tracing::info!(
        path = %path.display(),
        name = %level.name,
        students = level.students.len(),
        triggers = level.triggers.len(),
        "level loaded"
    );
    Ok(level)
}

/// Path of a bundled level by name
pub fn level_path(name: &str) -> PathBuf {
    PathBuf::from("data/levels").join(format!("{}.toml", name))
}
