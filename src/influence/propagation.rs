//! Peer-influence propagation
//!
//! Every dispatched event passes through [`InfluenceEngine::on_event`]. For
//! influence-eligible events the engine picks the affected peers, records a
//! ledger entry on each, and applies a tiered effect:
//!
//! - strong: escalate one step, Scared/Confused reaction, maybe an escape run
//! - medium: state-dependent chance to escalate, maybe Confused
//! - weak: Calm students only, small chance to escalate
//!
//! State transitions made here are never re-published as new events, so one
//! misbehavior cannot cascade through the room within a single tick.

use ordered_float::OrderedFloat;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::core::config::SimulationConfig;
use crate::core::types::{Seconds, StudentId};
use crate::events::types::{ClassroomEvent, InfluenceScope};
use crate::events::{EventBus, Notification};
use crate::influence::classification::influence_profile;
use crate::influence::ledger::NEGLIGIBLE_STRENGTH;
use crate::student::personality::Personality;
use crate::student::state::{BehaviorState, ReactionKind, StateTransition};
use crate::student::Roster;
use crate::world::ClassroomWorld;

/// Strength at or above which an influence is always strong
pub const STRONG_THRESHOLD: f32 = 0.5;

/// Strength at or above which an influence is at least medium
pub const MEDIUM_THRESHOLD: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InfluenceTier {
    Weak,
    Medium,
    Strong,
}

/// base severity x susceptibility x (1 - resistance)
pub fn influence_strength(base_severity: f32, target: &Personality) -> f32 {
    base_severity * target.influence_susceptibility * (1.0 - target.influence_resistance)
}

/// Tier for a strength against a target's panic threshold
///
/// Strong if the strength reaches the panic threshold OR the fixed strong
/// threshold, whichever is lower.
pub fn classify_strength(strength: f32, panic_threshold: f32) -> InfluenceTier {
    if strength >= panic_threshold || strength >= STRONG_THRESHOLD {
        InfluenceTier::Strong
    } else if strength >= MEDIUM_THRESHOLD {
        InfluenceTier::Medium
    } else {
        InfluenceTier::Weak
    }
}

/// Tunables copied out of the simulation config
#[derive(Debug, Clone, Copy)]
pub struct InfluenceSettings {
    pub max_radius: f32,
    pub reaction_duration: Seconds,
    pub medium_escalation_calm: f32,
    pub medium_escalation_distracted: f32,
    pub medium_escalation_acting_out: f32,
    pub medium_confused_chance: f32,
    pub weak_escalation_chance: f32,
}

impl InfluenceSettings {
    pub fn from_config(config: &SimulationConfig) -> Self {
        Self {
            max_radius: config.max_influence_radius,
            reaction_duration: config.reaction_duration,
            medium_escalation_calm: config.medium_escalation_calm,
            medium_escalation_distracted: config.medium_escalation_distracted,
            medium_escalation_acting_out: config.medium_escalation_acting_out,
            medium_confused_chance: config.medium_confused_chance,
            weak_escalation_chance: config.weak_escalation_chance,
        }
    }

    fn medium_escalation(&self, state: BehaviorState) -> f32 {
        match state {
            BehaviorState::Calm => self.medium_escalation_calm,
            BehaviorState::Distracted => self.medium_escalation_distracted,
            BehaviorState::ActingOut => self.medium_escalation_acting_out,
            BehaviorState::Critical => 0.0,
        }
    }
}

/// What happened to one target
#[derive(Debug, Clone, PartialEq)]
pub struct InfluenceEffect {
    pub target: StudentId,
    pub strength: f32,
    pub tier: InfluenceTier,
    pub transition: Option<StateTransition>,
    pub reaction: Option<ReactionKind>,
    pub escape_requested: bool,
    /// Recorded in the ledger but not applied because the target was immune
    pub suppressed: bool,
}

/// Everything one event did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropagationReport {
    pub scope: Option<InfluenceScope>,
    pub effects: Vec<InfluenceEffect>,
    /// Targets whose strength fell at or below the negligible floor
    pub ignored: Vec<StudentId>,
}

impl PropagationReport {
    pub fn affected(&self) -> impl Iterator<Item = StudentId> + '_ {
        self.effects.iter().map(|e| e.target)
    }
}

/// Running counters for diagnostics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfluenceStats {
    pub events_propagated: u32,
    pub edges_recorded: u32,
    pub escalations: u32,
    pub suppressed: u32,
    pub rejected: u32,
}

#[derive(Debug, Clone)]
pub struct InfluenceEngine {
    settings: InfluenceSettings,
    stats: InfluenceStats,
}

impl InfluenceEngine {
    pub fn new(config: &SimulationConfig) -> Self {
        Self {
            settings: InfluenceSettings::from_config(config),
            stats: InfluenceStats::default(),
        }
    }

    pub fn settings(&self) -> &InfluenceSettings {
        &self.settings
    }

    pub fn stats(&self) -> InfluenceStats {
        self.stats
    }

    pub fn reset(&mut self) {
        self.stats = InfluenceStats::default();
    }

    /// React to a dispatched event
    pub fn on_event<R: Rng + ?Sized>(
        &mut self,
        event: &ClassroomEvent,
        roster: &mut Roster,
        world: &dyn ClassroomWorld,
        now: Seconds,
        rng: &mut R,
        bus: &mut EventBus,
    ) -> PropagationReport {
        let mut report = PropagationReport::default();

        let Some(profile) = influence_profile(event.event_type) else {
            return report;
        };
        if !roster.contains(event.source) {
            tracing::debug!(source = %event.source, "influence source not in roster");
            return report;
        }

        let scope = event.scope.unwrap_or(profile.default_scope);
        report.scope = Some(scope);

        let targets = match scope {
            InfluenceScope::None => return report,
            InfluenceScope::SingleStudent => match event.target {
                Some(target) => match self.explicit_target(event.source, target, roster, world) {
                    Some(t) => vec![t],
                    None => {
                        self.stats.rejected += 1;
                        return report;
                    }
                },
                None => match self.nearest_peer(event.source, roster, world) {
                    Some(t) => vec![t],
                    None => {
                        tracing::debug!(
                            source = %event.source,
                            "no peer within radius, falling back to whole class"
                        );
                        report.scope = Some(InfluenceScope::WholeClass);
                        self.same_location_peers(event.source, roster, world)
                    }
                },
            },
            InfluenceScope::WholeClass => self.same_location_peers(event.source, roster, world),
        };

        self.stats.events_propagated += 1;

        for target in targets {
            let Some(student) = roster.get_mut(target) else {
                continue;
            };

            let strength = influence_strength(profile.base_severity, &student.personality);
            if strength <= NEGLIGIBLE_STRENGTH {
                tracing::trace!(%target, strength, "negligible influence ignored");
                report.ignored.push(target);
                continue;
            }

            let tier = classify_strength(strength, student.personality.panic_threshold);
            student.ledger.record(event.source, event.event_type, strength, now);
            self.stats.edges_recorded += 1;
            bus.notify(Notification::InfluenceRecorded {
                source: event.source,
                target,
                event_type: event.event_type,
                strength,
                tier,
            });

            let mut effect = InfluenceEffect {
                target,
                strength,
                tier,
                transition: None,
                reaction: None,
                escape_requested: false,
                suppressed: false,
            };

            if student.is_immune(now) {
                effect.suppressed = true;
                self.stats.suppressed += 1;
                report.effects.push(effect);
                continue;
            }

            let duration = self.settings.reaction_duration;
            match tier {
                InfluenceTier::Strong => {
                    effect.transition = student.escalate(bus);
                    let panicked = strength >= student.personality.panic_threshold;
                    let reaction = if panicked {
                        ReactionKind::Scared
                    } else {
                        ReactionKind::Confused
                    };
                    student.trigger_reaction(reaction, duration, now, bus);
                    effect.reaction = Some(reaction);

                    if panicked && student.state().is_misbehaving() && !world.is_moving(target) {
                        if world.has_escape_route(target) {
                            bus.notify(Notification::EscapeRouteRequested { student: target });
                            effect.escape_requested = true;
                        } else {
                            tracing::debug!(%target, "panicked but no escape route configured");
                        }
                    }
                }
                InfluenceTier::Medium => {
                    let chance = self.settings.medium_escalation(student.state());
                    if rng.gen::<f32>() < chance {
                        effect.transition = student.escalate(bus);
                    }
                    if rng.gen::<f32>() < self.settings.medium_confused_chance {
                        student.trigger_reaction(ReactionKind::Confused, duration, now, bus);
                        effect.reaction = Some(ReactionKind::Confused);
                    }
                }
                InfluenceTier::Weak => {
                    if student.state() == BehaviorState::Calm
                        && rng.gen::<f32>() < self.settings.weak_escalation_chance
                    {
                        effect.transition = student.escalate(bus);
                    }
                }
            }

            if effect.transition.is_some() {
                self.stats.escalations += 1;
            }
            report.effects.push(effect);
        }

        report
    }

    /// Validate an explicitly targeted single-student influence
    fn explicit_target(
        &self,
        source: StudentId,
        target: StudentId,
        roster: &Roster,
        world: &dyn ClassroomWorld,
    ) -> Option<StudentId> {
        if target == source || !roster.contains(target) {
            tracing::debug!(%source, %target, "influence target unavailable");
            return None;
        }
        match world.distance(source, target) {
            Some(d) if d <= self.settings.max_radius => Some(target),
            Some(d) => {
                tracing::debug!(%source, %target, distance = d, "influence target out of range");
                None
            }
            None => {
                tracing::debug!(%source, %target, "no positions for influence range check");
                None
            }
        }
    }

    /// Closest other student within the influence radius
    fn nearest_peer(
        &self,
        source: StudentId,
        roster: &Roster,
        world: &dyn ClassroomWorld,
    ) -> Option<StudentId> {
        roster
            .iter()
            .filter(|s| s.id != source)
            .filter_map(|s| world.distance(source, s.id).map(|d| (s.id, d)))
            .filter(|(_, d)| *d <= self.settings.max_radius)
            .min_by_key(|(id, d)| (OrderedFloat(*d), *id))
            .map(|(id, _)| id)
    }

    /// Every other student in the same room as the source
    fn same_location_peers(
        &self,
        source: StudentId,
        roster: &Roster,
        world: &dyn ClassroomWorld,
    ) -> Vec<StudentId> {
        let here = world.location(source);
        roster
            .iter()
            .filter(|s| s.id != source && world.location(s.id) == here)
            .map(|s| s.id)
            .collect()
    }
}
