//! Level: the composition root wiring every subsystem together
//!
//! A `Level` owns the roster, the bus, the rng and one instance of each
//! subsystem. The host drives it with [`Level::tick`] and feeds it teacher
//! intents between ticks.
//!
//! Per tick, in order:
//! 1. dispatch events published since the last tick
//! 2. expire reactions, fire sequence step timeouts
//! 3. autonomous behavior rolls, then dispatch
//! 4. scripted triggers, then dispatch
//! 5. sync outside students from the world
//! 6. outside penalty and disruption timeout
//! 7. outcome evaluation
//!
//! Dispatch fans each event out to the aggregate, then influence
//! propagation, then scoring. Influence never publishes new events, so
//! dispatch always terminates.

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::classroom::{ClassroomAggregate, ClassroomMood};
use crate::core::config::SimulationConfig;
use crate::core::types::{Location, MessId, Seconds, StudentId};
use crate::events::types::{ClassroomEvent, EventType};
use crate::events::{EventBus, MovementIntent, Notification};
use crate::influence::InfluenceEngine;
use crate::level::actions::{ActionOutcome, TeacherAction};
use crate::level::confiscation::ConfiscationRules;
use crate::level::loader::LevelConfig;
use crate::level::mess::{Mess, MessTracker};
use crate::outcome::{
    LevelGoal, LevelOutcome, LoseReason, OutcomeEvaluator, OutcomeSnapshot, ScoreSummary, Scorer,
};
use crate::sequence::{InteractionSequence, SequenceEngine, StepResult, StepResultKind};
use crate::student::{
    resolve_autonomous_behavior, BehaviorDecision, BehaviorState, ReactionKind, Roster, Student,
};
use crate::triggers::{ScriptedTrigger, TriggerDefinition, TriggerScheduler};
use crate::world::ClassroomWorld;

/// What one tick did
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickReport {
    pub elapsed: Seconds,
    pub events_dispatched: usize,
    pub triggers_fired: usize,
    pub outcome: Option<LevelOutcome>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentSummary {
    pub id: StudentId,
    pub name: String,
    pub state: BehaviorState,
    pub reaction: Option<ReactionKind>,
    pub unresolved_influences: usize,
    pub influenced_by: Vec<StudentId>,
}

/// Serializable view of a level for HUDs and the headless runner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelSummary {
    pub name: String,
    pub elapsed: Seconds,
    pub disruption: f32,
    pub mood: ClassroomMood,
    pub outside: Vec<StudentId>,
    pub open_messes: usize,
    pub score: ScoreSummary,
    pub events_published: u64,
    pub outcome: Option<LevelOutcome>,
    pub students: Vec<StudentSummary>,
}

pub struct Level {
    name: String,
    config: SimulationConfig,
    seed: u64,
    rng: ChaCha8Rng,
    bus: EventBus,
    roster: Roster,
    aggregate: ClassroomAggregate,
    influence: InfluenceEngine,
    sequences: SequenceEngine,
    triggers: TriggerScheduler,
    scorer: Scorer,
    outcome: OutcomeEvaluator,
    confiscation: ConfiscationRules,
    messes: MessTracker,
    elapsed: Seconds,
    ended: bool,

    // Restart state
    initial_students: Vec<Student>,
    initial_sequences: Vec<(StudentId, String)>,
}

impl Level {
    pub fn new(config: SimulationConfig, seed: u64) -> Self {
        if let Err(e) = config.validate() {
            tracing::warn!("simulation config inconsistent: {}", e);
        }
        Self {
            name: String::from("untitled"),
            rng: ChaCha8Rng::seed_from_u64(seed),
            bus: EventBus::new(),
            roster: Roster::new(),
            aggregate: ClassroomAggregate::new(&config),
            influence: InfluenceEngine::new(&config),
            sequences: SequenceEngine::new(),
            triggers: TriggerScheduler::new(&config),
            scorer: Scorer::new(config.scoring.clone()),
            outcome: OutcomeEvaluator::new(None),
            confiscation: ConfiscationRules::new(),
            messes: MessTracker::new(),
            elapsed: 0.0,
            ended: false,
            initial_students: Vec::new(),
            initial_sequences: Vec::new(),
            config,
            seed,
        }
    }

    /// Build a level from a parsed level file
    pub fn from_config(level: &LevelConfig) -> Self {
        let mut out = Self::new(level.simulation.clone(), level.seed).with_name(&level.name);
        out.set_goal(level.goal.clone());
        for student in &level.students {
            out.add_student(student.to_student());
        }
        out.triggers = TriggerScheduler::from_definitions(&level.triggers, &out.config);
        for sequence in &level.sequences {
            out.sequences.register(sequence.clone());
        }
        for student in &level.students {
            if let Some(name) = &student.sequence {
                out.bind_sequence(StudentId(student.id), name);
            }
        }
        out.confiscation = ConfiscationRules::from_rules(&level.confiscation);
        tracing::info!(
            name = %out.name,
            students = out.roster.len(),
            triggers = out.triggers.len(),
            "level ready"
        );
        out
    }

    pub fn with_name(mut self, name: &str) -> Self {
        self.name = name.to_string();
        self
    }

    // === SETUP ===

    pub fn add_student(&mut self, student: Student) -> bool {
        let snapshot = student.clone();
        if self.roster.add(student) {
            self.initial_students.push(snapshot);
            true
        } else {
            false
        }
    }

    pub fn set_goal(&mut self, goal: Option<LevelGoal>) {
        self.outcome = OutcomeEvaluator::new(goal);
    }

    pub fn add_trigger(&mut self, def: &TriggerDefinition) -> bool {
        match ScriptedTrigger::parse(def) {
            Ok(trigger) => {
                self.triggers.add(trigger);
                true
            }
            Err(e) => {
                tracing::warn!(source = %def.source, "skipping trigger: {}", e);
                false
            }
        }
    }

    pub fn register_sequence(&mut self, sequence: InteractionSequence) {
        self.sequences.register(sequence);
    }

    /// Bind a registered sequence to a student now and on every restart
    pub fn bind_sequence(&mut self, student: StudentId, name: &str) -> bool {
        if !self.roster.contains(student) {
            tracing::warn!(%student, name, "sequence bound to unknown student");
            return false;
        }
        if self.sequences.start_named(student, name, self.elapsed) {
            self.initial_sequences.retain(|(id, _)| *id != student);
            self.initial_sequences.push((student, name.to_string()));
            true
        } else {
            false
        }
    }

    pub fn add_confiscation_rule(&mut self, item: &str, state: BehaviorState) {
        self.confiscation.insert(item, state);
    }

    // === ACCESSORS ===

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn elapsed(&self) -> Seconds {
        self.elapsed
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn student(&self, id: StudentId) -> Option<&Student> {
        self.roster.get(id)
    }

    /// Look a student up by id or name
    pub fn find_student(&self, reference: &str) -> Option<StudentId> {
        self.roster.find(reference)
    }

    pub fn aggregate(&self) -> &ClassroomAggregate {
        &self.aggregate
    }

    pub fn influence(&self) -> &InfluenceEngine {
        &self.influence
    }

    pub fn sequences(&self) -> &SequenceEngine {
        &self.sequences
    }

    pub fn triggers(&self) -> &TriggerScheduler {
        &self.triggers
    }

    pub fn score(&self) -> ScoreSummary {
        self.scorer.summary()
    }

    pub fn outcome(&self) -> Option<&LevelOutcome> {
        self.outcome.outcome()
    }

    pub fn evaluator(&self) -> &OutcomeEvaluator {
        &self.outcome
    }

    pub fn messes(&self) -> Vec<Mess> {
        self.messes.open()
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// For registering external listeners
    pub fn bus_mut(&mut self) -> &mut EventBus {
        &mut self.bus
    }

    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        self.bus.drain_notifications()
    }

    /// Publish an event from outside (presentation layer, tests)
    pub fn publish(&mut self, event: ClassroomEvent) {
        if self.ended {
            return;
        }
        self.bus.publish(event);
    }

    // === TICK ===

    pub fn tick(&mut self, dt: Seconds, world: &dyn ClassroomWorld) -> TickReport {
        if self.ended {
            return TickReport {
                elapsed: self.elapsed,
                ..TickReport::default()
            };
        }

        let dt = dt.max(0.0);
        self.elapsed += dt;
        let now = self.elapsed;
        let mut report = TickReport {
            elapsed: now,
            ..TickReport::default()
        };

        report.events_dispatched += self.dispatch_pending(world);

        for student in self.roster.iter_mut() {
            student.update_timers(now);
        }
        for result in self.sequences.tick(now) {
            self.apply_step_result(&result);
        }

        self.run_autonomous_behavior(world, now);
        report.events_dispatched += self.dispatch_pending(world);

        let fired = self
            .triggers
            .update(dt, now, &self.roster, world, &mut self.rng, &mut self.bus);
        report.triggers_fired = fired.len();
        report.events_dispatched += self.dispatch_pending(world);

        self.sync_outside(world, now);

        let update = self.aggregate.update(dt, now, &mut self.bus);
        if update.timed_out {
            let reason = LoseReason::DisruptionTimeout {
                seconds: self.config.disruption_timeout_duration,
            };
            report.outcome = self.outcome.lose(reason, &mut self.bus);
        }

        if report.outcome.is_none() {
            let snapshot = self.outcome_snapshot(now);
            report.outcome = self.outcome.tick(dt, &snapshot, &mut self.bus);
        }

        if report.outcome.is_some() {
            self.ended = true;
        }
        report
    }

    /// Fan queued events out to aggregate, influence and scoring, in that order
    pub fn dispatch_pending(&mut self, world: &dyn ClassroomWorld) -> usize {
        let mut dispatched = 0;
        while let Some(event) = self.bus.next_pending() {
            self.aggregate.on_event(&event, &mut self.bus);
            self.influence.on_event(
                &event,
                &mut self.roster,
                world,
                self.elapsed,
                &mut self.rng,
                &mut self.bus,
            );
            self.scorer.on_event(&event, &mut self.bus);
            dispatched += 1;
        }
        dispatched
    }

    fn run_autonomous_behavior(&mut self, world: &dyn ClassroomWorld, now: Seconds) {
        let tuning = self.config.behavior.clone();

        for id in self.roster.ids() {
            if self.sequences.is_active(id) || world.is_moving(id) {
                continue;
            }
            let Some(student) = self.roster.get_mut(id) else {
                continue;
            };
            if !student.active || !student.behavior_due(now) {
                continue;
            }
            student.schedule_next_behavior(now + tuning.check_interval);

            let nearby = world.nearby_object(id);
            let leaves_mess_on = nearby.map(|o| o.creates_mess).unwrap_or(false);
            match resolve_autonomous_behavior(student, nearby, &tuning, &mut self.rng) {
                BehaviorDecision::Nothing => {}
                BehaviorDecision::Interact {
                    interaction,
                    object,
                } => {
                    tracing::debug!(student = %id, ?interaction, "object interaction");
                    self.bus.publish(
                        ClassroomEvent::new(id, interaction.event_type(), now).with_object(object),
                    );
                    if interaction.leaves_mess() && leaves_mess_on {
                        let mess = self.messes.create(id, object, now);
                        self.bus.publish(
                            ClassroomEvent::new(id, EventType::MessCreated, now)
                                .with_object(object)
                                .with_mess(mess),
                        );
                    }
                }
                BehaviorDecision::Idle {
                    idle,
                    self_escalate,
                } => {
                    if self_escalate {
                        student.escalate(&mut self.bus);
                    }
                    if let Some(idle) = idle {
                        self.bus
                            .publish(ClassroomEvent::new(id, idle.event_type(), now));
                    }
                }
            }
        }
    }

    fn sync_outside(&mut self, world: &dyn ClassroomWorld, now: Seconds) {
        for id in self.roster.ids() {
            let outside = world.location(id) == Location::Outside;
            if outside && !self.aggregate.is_outside(id) {
                self.aggregate.register_outside(id, now, &mut self.bus);
            } else if !outside && self.aggregate.is_outside(id) {
                self.aggregate.unregister_outside(id, now, &mut self.bus);
            }
        }
    }

    fn outcome_snapshot(&self, now: Seconds) -> OutcomeSnapshot {
        OutcomeSnapshot {
            disruption: self.aggregate.disruption(),
            outside_count: self.aggregate.outside_count(),
            longest_outside: self.aggregate.longest_outside(now),
            critical_count: self.roster.count_in_state(BehaviorState::Critical),
            score: self.scorer.summary(),
        }
    }

    fn apply_step_result(&mut self, result: &StepResult) {
        let now = self.elapsed;
        let duration = self.config.reaction_duration;
        let Some(student) = self.roster.get_mut(result.student) else {
            return;
        };
        if let Some(state) = result.state_change {
            student.set_state(state, &mut self.bus);
        }
        if let Some(reaction) = result.reaction {
            student.trigger_reaction(reaction, duration, now, &mut self.bus);
        }
    }

    // === TEACHER ACTIONS ===

    pub fn apply_teacher_action(&mut self, id: StudentId, action: TeacherAction) -> ActionOutcome {
        if self.ended {
            return ActionOutcome::LevelEnded;
        }
        let now = self.elapsed;
        let Some(state) = self.roster.get(id).map(|s| s.state()) else {
            tracing::warn!(student = %id, %action, "teacher action on unknown student");
            return ActionOutcome::UnknownStudent;
        };

        if let Some(result) = self.sequences.handle_action(id, action, state, now) {
            self.apply_step_result(&result);
            if result.kind == StepResultKind::Advanced {
                self.publish_intervention(id, action, "sequence step");
            }
            return ActionOutcome::SequenceStep {
                completed: result.completed,
            };
        }

        let duration = self.config.reaction_duration;
        let outcome = match action {
            TeacherAction::Calm => {
                let changed = self
                    .with_student(id, |s, bus| s.set_state(BehaviorState::Calm, bus).is_some())
                    .unwrap_or(false);
                let resolved = self.resolve_sources_from(id);
                if changed || resolved > 0 {
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::NoEffect
                }
            }
            TeacherAction::Stop => {
                let moved = self.with_student(id, |s, bus| s.deescalate(bus).is_some());
                if moved == Some(true) {
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::NoEffect
                }
            }
            TeacherAction::Talk => {
                if state == BehaviorState::Distracted {
                    self.with_student(id, |s, bus| {
                        s.deescalate(bus);
                    });
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::NoEffect
                }
            }
            TeacherAction::Scold => {
                let backfire = self.config.scold_backfire_impulsiveness;
                self.with_student(id, |s, bus| {
                    if s.personality.impulsiveness > backfire {
                        s.escalate(bus);
                        s.trigger_reaction(ReactionKind::Angry, duration, now, bus);
                        ActionOutcome::Backfired
                    } else {
                        s.deescalate(bus);
                        s.trigger_reaction(ReactionKind::Sad, duration, now, bus);
                        ActionOutcome::Applied
                    }
                })
                .unwrap_or(ActionOutcome::UnknownStudent)
            }
            TeacherAction::Praise => {
                if state == BehaviorState::Calm {
                    self.with_student(id, |s, bus| {
                        s.trigger_reaction(ReactionKind::Happy, duration, now, bus);
                    });
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::NoEffect
                }
            }
            TeacherAction::SendToSeat => {
                self.with_student(id, |s, bus| {
                    s.deescalate(bus);
                });
                self.request_movement(id, MovementIntent::ToSeat);
                ActionOutcome::Applied
            }
            TeacherAction::CallStudentBack => {
                if self.aggregate.is_outside(id) {
                    let immunity = self.config.call_back_immunity;
                    self.with_student(id, |s, _| s.set_influence_immunity(immunity, now));
                    self.request_movement(id, MovementIntent::BackToClassroom);
                    ActionOutcome::Applied
                } else {
                    ActionOutcome::NoEffect
                }
            }
            TeacherAction::EscortStudentBack => self.escort(id, now),
            TeacherAction::ForceReturnToSeat => {
                self.with_student(id, |s, bus| {
                    s.ledger.clear();
                    s.set_state(BehaviorState::Calm, bus);
                });
                self.request_movement(id, MovementIntent::ToSeat);
                ActionOutcome::Applied
            }
        };

        match outcome {
            ActionOutcome::Applied => self.publish_intervention(id, action, action.name()),
            ActionOutcome::NoEffect => {
                tracing::debug!(student = %id, %action, %state, "teacher action had no effect")
            }
            _ => {}
        }
        outcome
    }

    fn escort(&mut self, id: StudentId, now: Seconds) -> ActionOutcome {
        let unresolved = self
            .roster
            .get(id)
            .map(|s| s.ledger.unresolved_count())
            .unwrap_or(0);
        if unresolved > 0 {
            tracing::info!(student = %id, unresolved, "escort refused, influences unresolved");
            return ActionOutcome::Rejected { unresolved };
        }

        let immunity = self.config.escort_immunity;
        self.with_student(id, |s, bus| {
            s.ledger.clear();
            s.set_influence_immunity(immunity, now);
            s.set_state(BehaviorState::Calm, bus);
        });
        // Outside tracking ends when the world reports the student back inside
        if self.aggregate.is_outside(id) {
            self.request_movement(id, MovementIntent::BackToClassroom);
        }
        ActionOutcome::Applied
    }

    /// The movement layer reports the student has reached their seat
    pub fn student_returned_to_seat(&mut self, id: StudentId) -> bool {
        if self.ended {
            return false;
        }
        let now = self.elapsed;
        let Some(student) = self.roster.get_mut(id) else {
            tracing::warn!(student = %id, "return to seat for unknown student");
            return false;
        };
        student.ledger.clear();
        self.bus.publish(
            ClassroomEvent::new(id, EventType::ReturnedToSeat, now)
                .with_description("back in seat"),
        );
        true
    }

    /// Take an item from a student; unknown items do nothing
    pub fn confiscate(&mut self, id: StudentId, item: &str) -> ActionOutcome {
        if self.ended {
            return ActionOutcome::LevelEnded;
        }
        if !self.roster.contains(id) {
            tracing::warn!(student = %id, item, "confiscation from unknown student");
            return ActionOutcome::UnknownStudent;
        }
        let Some(state) = self.confiscation.lookup(item) else {
            tracing::debug!(student = %id, item, "no confiscation rule for item");
            return ActionOutcome::NoEffect;
        };

        self.with_student(id, |s, bus| {
            s.set_state(state, bus);
        });
        self.bus.publish(
            ClassroomEvent::new(id, EventType::ItemConfiscated, self.elapsed)
                .with_description(format!("confiscated {}", item)),
        );
        ActionOutcome::Applied
    }

    /// Clean a mess, resolving the influences its creator caused
    pub fn clean_mess(&mut self, mess: MessId) -> bool {
        if self.ended {
            return false;
        }
        let Some(mess) = self.messes.remove(mess) else {
            tracing::debug!(%mess, "mess already cleaned or unknown");
            return false;
        };
        self.resolve_sources_from(mess.creator);
        self.bus.publish(
            ClassroomEvent::new(mess.creator, EventType::MessCleaned, self.elapsed)
                .with_object(mess.object)
                .with_mess(mess.id),
        );
        true
    }

    /// Bind a registered sequence to a student
    pub fn start_sequence(&mut self, id: StudentId, name: &str) -> bool {
        if self.ended || !self.roster.contains(id) {
            return false;
        }
        self.sequences.start_named(id, name, self.elapsed)
    }

    fn with_student<T>(
        &mut self,
        id: StudentId,
        f: impl FnOnce(&mut Student, &mut EventBus) -> T,
    ) -> Option<T> {
        let student = self.roster.get_mut(id)?;
        Some(f(student, &mut self.bus))
    }

    fn resolve_sources_from(&mut self, source: StudentId) -> usize {
        let count = self.roster.resolve_sources_from(source);
        if count > 0 {
            tracing::debug!(%source, count, "influence sources resolved");
            self.bus.notify(Notification::SourcesResolved { source, count });
        }
        count
    }

    fn request_movement(&mut self, student: StudentId, intent: MovementIntent) {
        self.bus
            .notify(Notification::MovementRequested { student, intent });
    }

    fn publish_intervention(&mut self, id: StudentId, action: TeacherAction, description: &str) {
        self.bus.publish(
            ClassroomEvent::new(id, action.event_type(), self.elapsed)
                .with_description(description.to_string()),
        );
    }

    // === LIFECYCLE ===

    /// End the level with an explicit outcome; no-op once ended
    pub fn end(&mut self, outcome: LevelOutcome) -> bool {
        if self.ended {
            return false;
        }
        let declared = match outcome {
            LevelOutcome::Won { stars, score } => self.outcome.win(stars, score, &mut self.bus),
            LevelOutcome::Lost { reason } => self.outcome.lose(reason, &mut self.bus),
        };
        self.ended = true;
        declared.is_some()
    }

    /// Rebuild every subsystem from the level's initial state
    pub fn restart(&mut self) {
        tracing::info!(name = %self.name, "level restarted");
        self.rng = ChaCha8Rng::seed_from_u64(self.seed);
        self.bus.reset();
        self.roster.clear();
        for student in &self.initial_students {
            self.roster.add(student.clone());
        }
        self.aggregate.reset();
        self.influence.reset();
        self.sequences.reset();
        self.triggers.reset();
        self.scorer.reset();
        self.outcome.reset();
        self.messes.clear();
        self.elapsed = 0.0;
        self.ended = false;

        for (id, name) in self.initial_sequences.clone() {
            self.sequences.start_named(id, &name, 0.0);
        }
    }

    pub fn summary(&self) -> LevelSummary {
        LevelSummary {
            name: self.name.clone(),
            elapsed: self.elapsed,
            disruption: self.aggregate.disruption(),
            mood: self.aggregate.mood(),
            outside: self.aggregate.outside_students(),
            open_messes: self.messes.len(),
            score: self.scorer.summary(),
            events_published: self.bus.published_count(),
            outcome: self.outcome.outcome().cloned(),
            students: self
                .roster
                .iter()
                .map(|s| StudentSummary {
                    id: s.id,
                    name: s.name.clone(),
                    state: s.state(),
                    reaction: s.reaction(),
                    unresolved_influences: s.ledger.unresolved_count(),
                    influenced_by: s.ledger.unresolved_sources(),
                })
                .collect(),
        }
    }
}

impl std::fmt::Debug for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Level")
            .field("name", &self.name)
            .field("elapsed", &self.elapsed)
            .field("students", &self.roster.len())
            .field("disruption", &self.aggregate.disruption())
            .field("ended", &self.ended)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::types::ObjectId;
    use crate::events::types::InfluenceScope;
    use crate::sequence::SequenceStep;
    use crate::student::Personality;
    use crate::world::{ClassroomObject, StaticWorld};
    use glam::Vec3;

    /// Quiet tuning: no autonomous rolls interfere with the scenario
    fn quiet_config() -> SimulationConfig {
        let mut config = SimulationConfig::default();
        config.behavior.interaction_chance_calm = 0.0;
        config.behavior.interaction_chance_distracted = 0.0;
        config.behavior.interaction_chance_acting_out = 0.0;
        config.behavior.interaction_chance_critical = 0.0;
        config.behavior.self_escalation_chance = 0.0;
        config.behavior.look_around_chance = 0.0;
        config.behavior.fidget_chance = 0.0;
        config.behavior.stand_chance = 0.0;
        config.behavior.move_chance = 0.0;
        config
    }

    fn level_with(n: u32) -> (Level, StaticWorld) {
        let mut level = Level::new(quiet_config(), 1);
        let mut world = StaticWorld::new();
        let p = Personality {
            influence_susceptibility: 0.8,
            influence_resistance: 0.2,
            ..Personality::default()
        };
        for i in 1..=n {
            level.add_student(Student::new(StudentId(i), format!("s{}", i), p));
            world.place(StudentId(i), Vec3::new(i as f32, 0.0, 0.0));
        }
        (level, world)
    }

    #[test]
    fn test_calm_resolves_sources_and_scores() {
        let (mut level, world) = level_with(3);
        level.publish(
            ClassroomEvent::new(StudentId(1), EventType::MakingNoise, 0.0)
                .with_scope(InfluenceScope::WholeClass),
        );
        level.tick(0.1, &world);
        assert_eq!(level.student(StudentId(2)).unwrap().ledger.unresolved_count(), 1);

        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Calm),
            ActionOutcome::Applied
        );
        level.tick(0.1, &world);

        assert!(level.student(StudentId(2)).unwrap().is_escort_eligible());
        assert!(level.student(StudentId(3)).unwrap().is_escort_eligible());
        assert_eq!(level.score().calm_downs, 1);
    }

    #[test]
    fn test_escort_rejected_until_resolved() {
        let (mut level, world) = level_with(2);
        level.publish(ClassroomEvent::new(StudentId(1), EventType::ThrowingObject, 0.0));
        level.tick(0.1, &world);

        assert_eq!(
            level.apply_teacher_action(StudentId(2), TeacherAction::EscortStudentBack),
            ActionOutcome::Rejected { unresolved: 1 }
        );

        level.apply_teacher_action(StudentId(1), TeacherAction::Calm);
        assert_eq!(
            level.apply_teacher_action(StudentId(2), TeacherAction::EscortStudentBack),
            ActionOutcome::Applied
        );
        let escorted = level.student(StudentId(2)).unwrap();
        assert!(escorted.ledger.is_empty());
        assert_eq!(escorted.state(), BehaviorState::Calm);
        assert!(escorted.is_immune(level.elapsed()));
    }

    #[test]
    fn test_escort_from_outside_keeps_the_outside_clock_running() {
        let (mut level, mut world) = level_with(1);
        level.set_goal(Some(LevelGoal {
            time_limit: 0.0,
            max_outside_duration: 60.0,
            ..LevelGoal::default()
        }));
        world.set_location(StudentId(1), Location::Outside);
        for _ in 0..50 {
            level.tick(1.0, &world);
        }
        level.drain_notifications();

        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::EscortStudentBack),
            ActionOutcome::Applied
        );
        assert!(level.drain_notifications().contains(&Notification::MovementRequested {
            student: StudentId(1),
            intent: MovementIntent::BackToClassroom,
        }));
        assert_eq!(level.aggregate().outside_duration(StudentId(1), 50.0), Some(49.0));

        // Nobody walks the student back, so they stay outside past the cap
        let mut outcome = None;
        for _ in 0..30 {
            outcome = level.tick(1.0, &world).outcome;
            if outcome.is_some() {
                break;
            }
        }
        assert!(matches!(
            outcome,
            Some(LevelOutcome::Lost {
                reason: LoseReason::OutsideTooLong { student: StudentId(1), .. }
            })
        ));
    }

    #[test]
    fn test_escorted_student_counts_inside_once_back_in_the_room() {
        let (mut level, mut world) = level_with(1);
        world.set_location(StudentId(1), Location::Outside);
        level.tick(1.0, &world);
        assert!(level.aggregate().is_outside(StudentId(1)));

        level.apply_teacher_action(StudentId(1), TeacherAction::EscortStudentBack);
        assert!(level.aggregate().is_outside(StudentId(1)));

        world.set_location(StudentId(1), Location::Inside);
        level.tick(1.0, &world);
        assert!(!level.aggregate().is_outside(StudentId(1)));
        let returned = level
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::StudentReturnedToRoom { .. }))
            .count();
        assert_eq!(returned, 1);
        assert_eq!(level.score().problems_resolved, 1);
    }

    #[test]
    fn test_escort_with_empty_ledger_proceeds() {
        let (mut level, _) = level_with(1);
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::EscortStudentBack),
            ActionOutcome::Applied
        );
    }

    #[test]
    fn test_scold_backfires_on_impulsive_student() {
        let mut level = Level::new(quiet_config(), 1);
        let hothead = Personality {
            impulsiveness: 0.9,
            ..Personality::default()
        };
        level.add_student(
            Student::new(StudentId(1), "Hot", hothead).with_state(BehaviorState::Distracted),
        );

        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Scold),
            ActionOutcome::Backfired
        );
        let student = level.student(StudentId(1)).unwrap();
        assert_eq!(student.state(), BehaviorState::ActingOut);
        assert_eq!(student.reaction(), Some(ReactionKind::Angry));
    }

    #[test]
    fn test_calming_a_calm_student_with_nothing_to_resolve_is_no_effect() {
        let (mut level, world) = level_with(1);
        for _ in 0..5 {
            assert_eq!(
                level.apply_teacher_action(StudentId(1), TeacherAction::Calm),
                ActionOutcome::NoEffect
            );
        }
        level.tick(0.1, &world);

        assert_eq!(level.score().calm_downs, 0);
        assert_eq!(level.score().score, 0);
    }

    #[test]
    fn test_calming_a_restless_student_applies() {
        let mut level = Level::new(quiet_config(), 1);
        level.add_student(
            Student::new(StudentId(1), "Restless", Personality::default())
                .with_state(BehaviorState::Distracted),
        );
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Calm),
            ActionOutcome::Applied
        );
        assert_eq!(level.student(StudentId(1)).unwrap().state(), BehaviorState::Calm);
    }

    #[test]
    fn test_forced_return_counts_once_on_arrival() {
        let (mut level, world) = level_with(1);
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::ForceReturnToSeat),
            ActionOutcome::Applied
        );
        assert!(level.drain_notifications().contains(&Notification::MovementRequested {
            student: StudentId(1),
            intent: MovementIntent::ToSeat,
        }));
        level.tick(0.1, &world);
        assert_eq!(level.score().problems_resolved, 0);

        assert!(level.student_returned_to_seat(StudentId(1)));
        level.tick(0.1, &world);
        assert_eq!(level.score().problems_resolved, 1);
    }

    #[test]
    fn test_return_to_seat_purges_ledger() {
        let (mut level, world) = level_with(2);
        level.publish(ClassroomEvent::new(StudentId(1), EventType::ThrowingObject, 0.0));
        level.tick(0.1, &world);
        assert_eq!(level.student(StudentId(2)).unwrap().ledger.unresolved_count(), 1);

        assert!(level.student_returned_to_seat(StudentId(2)));
        let seated = level.student(StudentId(2)).unwrap();
        assert!(seated.ledger.is_empty());
        assert!(seated.is_escort_eligible());
    }

    #[test]
    fn test_knocked_over_paint_leaves_a_mess_and_cleaning_resolves_it() {
        let mut config = quiet_config();
        config.behavior.interaction_chance_calm = 1.0;
        config.behavior.knock_over_chance = 1.0;
        config.behavior.make_noise_chance = 0.0;
        config.behavior.throw_chance = 0.0;
        config.behavior.drop_chance = 0.0;
        config.behavior.touch_chance = 0.0;
        let mut level = Level::new(config, 3);
        let mut world = StaticWorld::new();
        let p = Personality {
            influence_susceptibility: 0.8,
            influence_resistance: 0.2,
            ..Personality::default()
        };
        for i in 1..=2 {
            level.add_student(Student::new(StudentId(i), format!("s{}", i), p));
            world.place(StudentId(i), Vec3::new(i as f32, 0.0, 0.0));
        }
        world.add_object(ClassroomObject::new(ObjectId(10), "paint").messy());
        world.set_nearby(StudentId(1), ObjectId(10));

        level.tick(0.1, &world);
        world.clear_nearby(StudentId(1));

        assert!(level
            .bus()
            .history()
            .any(|e| e.event_type == EventType::MessCreated && e.source == StudentId(1)));
        let messes = level.messes();
        assert_eq!(messes.len(), 1);
        assert_eq!(messes[0].creator, StudentId(1));
        assert_eq!(messes[0].object, ObjectId(10));
        assert!(level.student(StudentId(2)).unwrap().ledger.unresolved_count() > 0);

        assert!(level.clean_mess(messes[0].id));
        assert!(level.student(StudentId(2)).unwrap().is_escort_eligible());
        assert!(!level.clean_mess(messes[0].id));
        level.tick(0.1, &world);
        assert!(level.messes().is_empty());
        assert_eq!(level.score().problems_resolved, 1);
    }

    #[test]
    fn test_teacher_actions_drive_a_bound_sequence() {
        let (mut level, world) = level_with(1);
        level.register_sequence(InteractionSequence::new(
            "settle",
            vec![
                SequenceStep::new(TeacherAction::Talk).with_reaction(ReactionKind::Embarrassed),
                SequenceStep::new(TeacherAction::Calm).with_state_change(BehaviorState::Calm),
            ],
        ));
        assert!(level.bind_sequence(StudentId(1), "settle"));

        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Talk),
            ActionOutcome::SequenceStep { completed: false }
        );
        assert_eq!(
            level.student(StudentId(1)).unwrap().reaction(),
            Some(ReactionKind::Embarrassed)
        );
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Calm),
            ActionOutcome::SequenceStep { completed: true }
        );
        assert!(!level.sequences().is_active(StudentId(1)));

        level.tick(0.1, &world);
        assert_eq!(level.score().calm_downs, 1);
    }

    #[test]
    fn test_timeout_warning_is_sent_once() {
        let (mut level, world) = level_with(1);
        for _ in 0..11 {
            level.publish(ClassroomEvent::new(StudentId(1), EventType::ThrowingObject, 0.0));
        }

        let mut warnings = 0;
        for _ in 0..25 {
            level.tick(1.0, &world);
            warnings += level
                .drain_notifications()
                .iter()
                .filter(|n| matches!(n, Notification::DisruptionTimeoutWarning { .. }))
                .count();
        }

        assert!(level.aggregate().disruption() >= 80.0);
        assert_eq!(warnings, 1);
        assert!(!level.is_ended());
    }

    #[test]
    fn test_talk_only_works_when_distracted() {
        let (mut level, _) = level_with(1);
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Talk),
            ActionOutcome::NoEffect
        );
    }

    #[test]
    fn test_call_back_requires_outside() {
        let (mut level, mut world) = level_with(1);
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::CallStudentBack),
            ActionOutcome::NoEffect
        );

        world.set_location(StudentId(1), Location::Outside);
        level.tick(0.1, &world);
        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::CallStudentBack),
            ActionOutcome::Applied
        );
        assert!(level.drain_notifications().contains(&Notification::MovementRequested {
            student: StudentId(1),
            intent: MovementIntent::BackToClassroom,
        }));
    }

    #[test]
    fn test_unknown_student_is_noop() {
        let (mut level, _) = level_with(1);
        assert_eq!(
            level.apply_teacher_action(StudentId(42), TeacherAction::Calm),
            ActionOutcome::UnknownStudent
        );
        assert!(!level.student_returned_to_seat(StudentId(42)));
    }

    #[test]
    fn test_confiscation_rules() {
        let (mut level, _) = level_with(1);
        level.add_confiscation_rule("phone", BehaviorState::Distracted);

        assert_eq!(level.confiscate(StudentId(1), "comic"), ActionOutcome::NoEffect);
        assert_eq!(level.confiscate(StudentId(1), "Phone"), ActionOutcome::Applied);
        assert_eq!(
            level.student(StudentId(1)).unwrap().state(),
            BehaviorState::Distracted
        );
    }

    #[test]
    fn test_ended_level_ignores_everything() {
        let (mut level, world) = level_with(1);
        assert!(level.end(LevelOutcome::Lost {
            reason: LoseReason::Abandoned
        }));
        assert!(!level.end(LevelOutcome::Won { stars: 3, score: 0 }));

        assert_eq!(
            level.apply_teacher_action(StudentId(1), TeacherAction::Calm),
            ActionOutcome::LevelEnded
        );
        let report = level.tick(1.0, &world);
        assert_eq!(report.events_dispatched, 0);
        assert_eq!(level.elapsed(), 0.0);
    }

    #[test]
    fn test_restart_restores_initial_state() {
        let (mut level, world) = level_with(2);
        level.publish(ClassroomEvent::new(StudentId(1), EventType::ThrowingObject, 0.0));
        level.tick(0.5, &world);
        level.end(LevelOutcome::Lost {
            reason: LoseReason::Abandoned,
        });

        level.restart();

        assert!(!level.is_ended());
        assert_eq!(level.elapsed(), 0.0);
        assert_eq!(level.aggregate().disruption(), 0.0);
        assert!(level.student(StudentId(2)).unwrap().ledger.is_empty());
        assert_eq!(level.student(StudentId(2)).unwrap().state(), BehaviorState::Calm);
        assert!(level.outcome().is_none());
    }
}
