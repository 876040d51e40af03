//! Running interaction sequences, at most one per student

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{Seconds, StudentId};
use crate::level::actions::TeacherAction;
use crate::sequence::step::{InteractionSequence, SequenceStep};
use crate::student::state::{BehaviorState, ReactionKind};

/// A sequence bound to one student
#[derive(Debug, Clone, PartialEq)]
pub struct SequenceInstance {
    pub sequence: InteractionSequence,
    pub current: usize,
    pub step_started_at: Seconds,
}

impl SequenceInstance {
    pub fn new(sequence: InteractionSequence, now: Seconds) -> Self {
        Self {
            sequence,
            current: 0,
            step_started_at: now,
        }
    }

    pub fn current_step(&self) -> Option<&SequenceStep> {
        self.sequence.steps.get(self.current)
    }

    pub fn is_complete(&self) -> bool {
        self.current >= self.sequence.len()
    }

    pub fn can_advance(&self, action: TeacherAction, state: BehaviorState) -> bool {
        self.current_step()
            .is_some_and(|step| step.can_advance(action, state))
    }

    pub fn can_branch(&self, action: TeacherAction, state: BehaviorState) -> Option<bool> {
        self.current_step()?.can_branch(action, state)
    }

    /// Move on from the current step; returns the new index
    pub fn advance_with_result(&mut self, success: bool, now: Seconds) -> usize {
        let count = self.sequence.len();
        self.current = match self.current_step() {
            Some(step) => step.next_index(self.current, success, count),
            None => count,
        };
        self.step_started_at = now;
        self.current
    }

    /// Jump straight to `index` (timeouts); out of range ends the sequence
    pub fn jump_to(&mut self, index: Option<usize>, now: Seconds) {
        self.current = index.unwrap_or(self.sequence.len()).min(self.sequence.len());
        self.step_started_at = now;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepResultKind {
    Advanced,
    Failed,
    TimedOut,
}

/// What a sequence step did; the level applies reaction and state change
#[derive(Debug, Clone, PartialEq)]
pub struct StepResult {
    pub student: StudentId,
    pub sequence: String,
    pub kind: StepResultKind,
    pub from: usize,
    pub to: usize,
    pub reaction: Option<ReactionKind>,
    pub state_change: Option<BehaviorState>,
    pub completed: bool,
}

#[derive(Debug, Clone, Default)]
pub struct SequenceEngine {
    library: AHashMap<String, InteractionSequence>,
    active: AHashMap<StudentId, SequenceInstance>,
}

impl SequenceEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a definition available to `start_named`
    pub fn register(&mut self, sequence: InteractionSequence) {
        if sequence.is_empty() {
            tracing::warn!(name = %sequence.name, "empty interaction sequence skipped");
            return;
        }
        self.library.insert(sequence.name.clone(), sequence);
    }

    pub fn definition(&self, name: &str) -> Option<&InteractionSequence> {
        self.library.get(name)
    }

    /// Bind a sequence to a student, abandoning any running one
    pub fn start(&mut self, student: StudentId, sequence: InteractionSequence, now: Seconds) {
        if let Some(prior) = self.active.get(&student) {
            tracing::debug!(%student, abandoned = %prior.sequence.name, "sequence replaced");
        }
        tracing::info!(%student, sequence = %sequence.name, "interaction sequence started");
        self.active.insert(student, SequenceInstance::new(sequence, now));
    }

    pub fn start_named(&mut self, student: StudentId, name: &str, now: Seconds) -> bool {
        match self.library.get(name) {
            Some(sequence) => {
                let sequence = sequence.clone();
                self.start(student, sequence, now);
                true
            }
            None => {
                tracing::warn!(%student, name, "unknown interaction sequence");
                false
            }
        }
    }

    pub fn abandon(&mut self, student: StudentId) -> bool {
        self.active.remove(&student).is_some()
    }

    pub fn is_active(&self, student: StudentId) -> bool {
        self.active.contains_key(&student)
    }

    pub fn instance(&self, student: StudentId) -> Option<&SequenceInstance> {
        self.active.get(&student)
    }

    pub fn active_count(&self) -> usize {
        self.active.len()
    }

    /// Offer a teacher action to the student's running sequence
    ///
    /// Returns `None` when no sequence is running or the action is irrelevant
    /// to the current step.
    pub fn handle_action(
        &mut self,
        student: StudentId,
        action: TeacherAction,
        state: BehaviorState,
        now: Seconds,
    ) -> Option<StepResult> {
        let instance = self.active.get_mut(&student)?;
        let success = instance.can_branch(action, state)?;
        let step = instance.current_step()?.clone();

        let from = instance.current;
        let to = instance.advance_with_result(success, now);
        let completed = instance.is_complete();
        let result = StepResult {
            student,
            sequence: instance.sequence.name.clone(),
            kind: if success {
                StepResultKind::Advanced
            } else {
                StepResultKind::Failed
            },
            from,
            to,
            reaction: if success { step.reaction } else { None },
            state_change: if success { step.state_change } else { None },
            completed,
        };

        tracing::debug!(%student, %action, from, to, success, "sequence step");
        if completed {
            self.finish(student);
        }
        Some(result)
    }

    /// Fire step timeouts that have elapsed, in student-id order
    pub fn tick(&mut self, now: Seconds) -> Vec<StepResult> {
        let mut students: Vec<StudentId> = self.active.keys().copied().collect();
        students.sort();

        let mut results = Vec::new();
        for student in students {
            let Some(instance) = self.active.get_mut(&student) else {
                continue;
            };
            let Some(timeout) = instance.current_step().and_then(|s| s.timeout) else {
                continue;
            };
            if now - instance.step_started_at < timeout.seconds {
                continue;
            }

            let from = instance.current;
            instance.jump_to(timeout.next, now);
            let completed = instance.is_complete();
            tracing::debug!(%student, from, to = instance.current, "sequence step timed out");
            results.push(StepResult {
                student,
                sequence: instance.sequence.name.clone(),
                kind: StepResultKind::TimedOut,
                from,
                to: instance.current,
                reaction: timeout.reaction,
                state_change: None,
                completed,
            });
            if completed {
                self.finish(student);
            }
        }
        results
    }

    fn finish(&mut self, student: StudentId) {
        if let Some(instance) = self.active.remove(&student) {
            tracing::info!(%student, sequence = %instance.sequence.name, "interaction sequence complete");
        }
    }

    /// Drop every running instance; definitions stay registered
    pub fn reset(&mut self) {
        self.active.clear();
    }
}
