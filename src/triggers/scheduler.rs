//! Scripted trigger table, polled at a fixed cadence
//!
//! Level files describe triggers with plain strings. They are parsed once
//! at load; malformed entries are skipped with a warning. The scheduler is
//! polled every `trigger_poll_interval` seconds rather than every tick,
//! which is why time-based triggers match within a tolerance window.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::error::Result;
use crate::core::types::{Seconds, StudentId};
use crate::events::types::{ClassroomEvent, EventType, InfluenceScope};
use crate::events::EventBus;
use crate::student::{BehaviorState, Roster};
use crate::triggers::condition::TriggerCondition;
use crate::world::ClassroomWorld;

fn default_probability() -> f32 {
    1.0
}

fn default_one_time() -> bool {
    true
}

/// Raw trigger entry as written in a level file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerDefinition {
    /// Student id or name
    pub source: String,
    #[serde(default)]
    pub target: Option<String>,
    pub event_type: String,
    pub condition: String,
    #[serde(default)]
    pub value: f32,
    #[serde(default = "default_probability")]
    pub probability: f32,
    #[serde(default = "default_one_time")]
    pub one_time: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// Parsed trigger
#[derive(Debug, Clone, PartialEq)]
pub struct ScriptedTrigger {
    pub source: String,
    pub target: Option<String>,
    pub event_type: EventType,
    pub condition: TriggerCondition,
    pub value: f32,
    pub probability: f32,
    pub one_time: bool,
    pub description: Option<String>,
    pub triggered: bool,
}

impl ScriptedTrigger {
    pub fn parse(def: &TriggerDefinition) -> Result<Self> {
        Ok(Self {
            source: def.source.clone(),
            target: def.target.clone().filter(|t| !t.trim().is_empty()),
            event_type: def.event_type.parse()?,
            condition: def.condition.parse()?,
            value: def.value,
            probability: def.probability.clamp(0.0, 1.0),
            one_time: def.one_time,
            description: def.description.clone(),
            triggered: false,
        })
    }

    /// Untriggered, or repeatable
    pub fn is_eligible(&self) -> bool {
        !(self.one_time && self.triggered)
    }
}

/// Evaluate a trigger's condition against a resolved source
///
/// Draws from `rng` only for probabilistic conditions.
pub fn evaluate_condition<R: Rng + ?Sized>(
    trigger: &ScriptedTrigger,
    source_state: BehaviorState,
    elapsed: Seconds,
    tolerance: Seconds,
    rng: &mut R,
) -> bool {
    match trigger.condition {
        TriggerCondition::TimeElapsed => (elapsed - trigger.value).abs() <= tolerance,
        TriggerCondition::Always | TriggerCondition::Random => {
            rng.gen::<f32>() <= trigger.probability
        }
        condition => {
            condition.required_state() == Some(source_state)
                && rng.gen::<f32>() <= trigger.probability
        }
    }
}

#[derive(Debug, Clone)]
pub struct TriggerScheduler {
    triggers: Vec<ScriptedTrigger>,
    poll_interval: Seconds,
    tolerance: Seconds,
    timer: Seconds,
}

impl TriggerScheduler {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            triggers: Vec::new(),
            poll_interval: config.trigger_poll_interval,
            tolerance: config.trigger_time_tolerance,
            timer: 0.0,
        }
    }

    /// Build from raw definitions, skipping malformed entries
    pub fn from_definitions(defs: &[TriggerDefinition], config: &SimulationConfig) -> Self {
        let mut scheduler = Self::new(config);
        for (index, def) in defs.iter().enumerate() {
            match ScriptedTrigger::parse(def) {
                Ok(trigger) => scheduler.add(trigger),
                Err(e) => tracing::warn!(index, source = %def.source, "skipping trigger: {}", e),
            }
        }
        scheduler
    }

    pub fn add(&mut self, trigger: ScriptedTrigger) {
        self.triggers.push(trigger);
    }

    pub fn triggers(&self) -> &[ScriptedTrigger] {
        &self.triggers
    }

    pub fn len(&self) -> usize {
        self.triggers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triggers.is_empty()
    }

    /// Advance the poll clock; evaluates the table when a poll is due
    ///
    /// Returns the indices of the triggers that fired.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        dt: Seconds,
        elapsed: Seconds,
        roster: &Roster,
        world: &dyn ClassroomWorld,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> Vec<usize> {
        self.timer += dt;
        if self.timer < self.poll_interval {
            return Vec::new();
        }
        self.timer -= self.poll_interval;
        if self.timer >= self.poll_interval {
            // Long frame: one poll covers the backlog
            self.timer = 0.0;
        }
        self.poll(elapsed, roster, world, rng, bus)
    }

    /// Evaluate every eligible trigger once
    pub fn poll<R: Rng + ?Sized>(
        &mut self,
        elapsed: Seconds,
        roster: &Roster,
        world: &dyn ClassroomWorld,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> Vec<usize> {
        let mut fired = Vec::new();

        for (index, trigger) in self.triggers.iter_mut().enumerate() {
            if !trigger.is_eligible() {
                continue;
            }

            let Some(source_id) = roster.find(&trigger.source) else {
                tracing::debug!(index, source = %trigger.source, "trigger source not found");
                continue;
            };
            let Some(source) = roster.get(source_id) else {
                continue;
            };

            if source.is_immune(elapsed) {
                continue;
            }
            if !trigger.condition.is_time_based() && world.is_moving(source_id) {
                continue;
            }

            if !evaluate_condition(trigger, source.state(), elapsed, self.tolerance, rng) {
                continue;
            }

            let target = trigger.target.as_deref().and_then(|t| {
                let found = roster.find(t);
                if found.is_none() {
                    tracing::debug!(index, target = t, "trigger target not found");
                }
                found
            });

            if trigger.one_time {
                trigger.triggered = true;
            }

            bus.publish(build_event(trigger, source_id, target, elapsed));
            tracing::info!(
                index,
                source = %source_id,
                event_type = %trigger.event_type,
                condition = %trigger.condition,
                "scripted trigger fired"
            );
            fired.push(index);
        }

        fired
    }

    /// Rewind the poll clock and re-arm every trigger for a fresh level
    pub fn reset(&mut self) {
        self.timer = 0.0;
        for trigger in &mut self.triggers {
            trigger.triggered = false;
        }
    }
}

fn build_event(
    trigger: &ScriptedTrigger,
    source: StudentId,
    target: Option<StudentId>,
    now: Seconds,
) -> ClassroomEvent {
    let mut event = ClassroomEvent::new(source, trigger.event_type, now);
    event = match target {
        Some(target) => event.with_target(target).with_scope(InfluenceScope::SingleStudent),
        None => event.with_scope(InfluenceScope::WholeClass),
    };
    match &trigger.description {
        Some(text) => event.with_description(text.clone()),
        None => event.with_description(format!("scripted {}", trigger.event_type)),
    }
}
