//! Shared classroom disruption score
//!
//! One aggregate per level. Every component raises or lowers disruption
//! through [`ClassroomAggregate::add_disruption`], which clamps to 0..=100
//! and keeps the mood in sync. The aggregate also owns the outside-student
//! penalty clock and the sustained-disruption timeout.

use ahash::AHashMap;

use crate::classroom::mood::ClassroomMood;
use crate::core::config::SimulationConfig;
use crate::core::types::{Seconds, StudentId};
use crate::events::types::ClassroomEvent;
use crate::events::{EventBus, Notification};

pub const MIN_DISRUPTION: f32 = 0.0;
pub const MAX_DISRUPTION: f32 = 100.0;

/// Deltas at or below this are not announced
const DISRUPTION_EPSILON: f32 = 0.01;

/// Tunables copied out of the simulation config
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateSettings {
    pub outside_check_interval: Seconds,
    pub outside_disruption_rate: f32,
    pub max_outside_penalty: f32,
    pub timeout_enabled: bool,
    pub timeout_threshold: f32,
    pub timeout_duration: Seconds,
    pub timeout_warning: Seconds,
}

impl AggregateSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            outside_check_interval: config.outside_check_interval,
            outside_disruption_rate: config.outside_disruption_rate,
            max_outside_penalty: config.max_outside_penalty,
            timeout_enabled: config.disruption_timeout_enabled,
            timeout_threshold: config.disruption_timeout_threshold,
            timeout_duration: config.disruption_timeout_duration,
            timeout_warning: config.disruption_timeout_warning,
        }
    }
}

/// Sustained-high-disruption clock
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DisruptionTimeout {
    pub active: bool,
    pub started_at: Seconds,
    pub warning_shown: bool,
    pub expired: bool,
}

impl DisruptionTimeout {
    pub fn elapsed(&self, now: Seconds) -> Seconds {
        if self.active {
            (now - self.started_at).max(0.0)
        } else {
            0.0
        }
    }
}

/// Result of one aggregate update
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct AggregateUpdate {
    /// Outside penalty applied this update
    pub outside_penalty: f32,
    pub warning_fired: bool,
    /// The disruption timeout ran out; the level is lost
    pub timed_out: bool,
}

#[derive(Debug, Clone)]
pub struct ClassroomAggregate {
    settings: AggregateSettings,
    disruption: f32,
    mood: ClassroomMood,
    outside: AHashMap<StudentId, Seconds>,
    outside_timer: Seconds,
    outside_penalty_applied: f32,
    timeout: DisruptionTimeout,
}

impl ClassroomAggregate {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            settings: AggregateSettings::from_config(config),
            disruption: MIN_DISRUPTION,
            mood: ClassroomMood::Calm,
            outside: AHashMap::new(),
            outside_timer: 0.0,
            outside_penalty_applied: 0.0,
            timeout: DisruptionTimeout::default(),
        }
    }

    pub fn disruption(&self) -> f32 {
        self.disruption
    }

    pub fn mood(&self) -> ClassroomMood {
        self.mood
    }

    pub fn timeout(&self) -> DisruptionTimeout {
        self.timeout
    }

    pub fn outside_penalty_applied(&self) -> f32 {
        self.outside_penalty_applied
    }

    /// Add (or with a negative amount, remove) disruption
    ///
    /// Returns the clamped delta actually applied.
    pub fn add_disruption(&mut self, amount: f32, reason: &str, bus: &mut EventBus) -> f32 {
        let old = self.disruption;
        let new = (old + amount).clamp(MIN_DISRUPTION, MAX_DISRUPTION);
        self.disruption = new;

        let delta = new - old;
        if delta.abs() > DISRUPTION_EPSILON {
            tracing::debug!(old, new, reason, "disruption changed");
            bus.notify(Notification::DisruptionChanged {
                old,
                new,
                reason: reason.to_string(),
            });
        }

        let mood = ClassroomMood::from_disruption(new);
        if mood != self.mood {
            let old_mood = self.mood;
            self.mood = mood;
            tracing::info!(old = %old_mood, new = %mood, "classroom mood changed");
            bus.notify(Notification::MoodChanged { old: old_mood, new: mood });
        }
        delta
    }

    /// Apply an event's fixed disruption impact
    pub fn on_event(&mut self, event: &ClassroomEvent, bus: &mut EventBus) -> f32 {
        let impact = event.event_type.disruption_impact();
        if impact == 0.0 {
            return 0.0;
        }
        self.add_disruption(impact, event.event_type.name(), bus)
    }

    // === OUTSIDE TRACKING ===

    /// Mark a student as outside the room; re-registering is a no-op
    pub fn register_outside(&mut self, student: StudentId, now: Seconds, bus: &mut EventBus) -> bool {
        if self.outside.contains_key(&student) {
            return false;
        }
        self.outside.insert(student, now);
        tracing::info!(%student, count = self.outside.len(), "student left the room");
        bus.notify(Notification::StudentLeftRoom { student });
        true
    }

    /// Mark a student as back inside; returns how long they were out
    pub fn unregister_outside(
        &mut self,
        student: StudentId,
        now: Seconds,
        bus: &mut EventBus,
    ) -> Option<Seconds> {
        let since = self.outside.remove(&student)?;
        let seconds_outside = (now - since).max(0.0);
        tracing::info!(%student, seconds_outside, "student returned to the room");
        bus.notify(Notification::StudentReturnedToRoom {
            student,
            seconds_outside,
        });
        Some(seconds_outside)
    }

    pub fn is_outside(&self, student: StudentId) -> bool {
        self.outside.contains_key(&student)
    }

    pub fn outside_count(&self) -> usize {
        self.outside.len()
    }

    pub fn outside_students(&self) -> Vec<StudentId> {
        let mut ids: Vec<_> = self.outside.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Continuous time outside for one student
    pub fn outside_duration(&self, student: StudentId, now: Seconds) -> Option<Seconds> {
        self.outside.get(&student).map(|since| (now - since).max(0.0))
    }

    /// Longest continuous time any student has spent outside
    pub fn longest_outside(&self, now: Seconds) -> Option<(StudentId, Seconds)> {
        self.outside
            .iter()
            .map(|(id, since)| (*id, (now - since).max(0.0)))
            .max_by(|a, b| a.1.total_cmp(&b.1).then(b.0.cmp(&a.0)))
    }

    // === PER-TICK ===

    /// Advance the outside-penalty clock and the disruption timeout
    pub fn update(&mut self, dt: Seconds, now: Seconds, bus: &mut EventBus) -> AggregateUpdate {
        let mut result = AggregateUpdate {
            outside_penalty: self.apply_outside_penalty(dt, bus),
            ..AggregateUpdate::default()
        };
        self.update_timeout(now, bus, &mut result);
        result
    }

    fn apply_outside_penalty(&mut self, dt: Seconds, bus: &mut EventBus) -> f32 {
        let count = self.outside.len();
        if count == 0 {
            self.outside_timer = 0.0;
            return 0.0;
        }

        self.outside_timer += dt;
        let mut applied = 0.0;
        while self.outside_timer >= self.settings.outside_check_interval {
            self.outside_timer -= self.settings.outside_check_interval;

            let remaining = (self.settings.max_outside_penalty - self.outside_penalty_applied).max(0.0);
            let penalty = (count as f32 * self.settings.outside_disruption_rate).min(remaining);
            if penalty <= 0.0 {
                continue;
            }
            self.outside_penalty_applied += penalty;
            applied += self.add_disruption(penalty, "students outside", bus);
        }
        applied
    }

    fn update_timeout(&mut self, now: Seconds, bus: &mut EventBus, result: &mut AggregateUpdate) {
        if !self.settings.timeout_enabled || self.timeout.expired {
            return;
        }

        if self.disruption < self.settings.timeout_threshold {
            if self.timeout.active {
                tracing::debug!(disruption = self.disruption, "disruption timeout cleared");
            }
            self.timeout.active = false;
            self.timeout.warning_shown = false;
            return;
        }

        if !self.timeout.active {
            self.timeout.active = true;
            self.timeout.started_at = now;
            self.timeout.warning_shown = false;
            tracing::debug!(disruption = self.disruption, "disruption timeout started");
        }

        let elapsed = self.timeout.elapsed(now);
        if !self.timeout.warning_shown && elapsed >= self.settings.timeout_warning {
            self.timeout.warning_shown = true;
            result.warning_fired = true;
            let remaining = (self.settings.timeout_duration - elapsed).max(0.0);
            tracing::warn!(remaining, "disruption timeout warning");
            bus.notify(Notification::DisruptionTimeoutWarning { remaining });
        }

        if elapsed >= self.settings.timeout_duration {
            self.timeout.expired = true;
            result.timed_out = true;
            tracing::warn!(elapsed, "disruption timeout expired");
        }
    }

    /// Back to a fresh level: zero disruption, nobody outside, clocks stopped
    pub fn reset(&mut self) {
        self.disruption = MIN_DISRUPTION;
        self.mood = ClassroomMood::Calm;
        self.outside.clear();
        self.outside_timer = 0.0;
        self.outside_penalty_applied = 0.0;
        self.timeout = DisruptionTimeout::default();
    }
}
