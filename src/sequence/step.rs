//! Interaction sequence definitions as loaded from level files

use serde::{Deserialize, Serialize};

use crate::core::types::Seconds;
use crate::level::actions::TeacherAction;
use crate::student::state::{BehaviorState, ReactionKind};

/// Where a branching step goes next; `None` ends the sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StepBranch {
    #[serde(default)]
    pub success_next: Option<usize>,
    #[serde(default)]
    pub failure_next: Option<usize>,
}

/// Auto-transition when the teacher takes too long
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StepTimeout {
    pub seconds: Seconds,
    /// Step to jump to; `None` ends the sequence
    #[serde(default)]
    pub next: Option<usize>,
    #[serde(default)]
    pub reaction: Option<ReactionKind>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SequenceStep {
    /// State the student must be in; `None` accepts any state
    #[serde(default)]
    pub required_state: Option<BehaviorState>,
    pub required_action: TeacherAction,
    /// Reaction shown when the step succeeds
    #[serde(default)]
    pub reaction: Option<ReactionKind>,
    /// State forced on the student when the step succeeds
    #[serde(default)]
    pub state_change: Option<BehaviorState>,
    #[serde(default)]
    pub branch: Option<StepBranch>,
    /// Any other action while the required state holds counts as failure
    #[serde(default)]
    pub fail_on_other_action: bool,
    #[serde(default)]
    pub timeout: Option<StepTimeout>,
    #[serde(default)]
    pub description: String,
}

impl SequenceStep {
    pub fn new(required_action: TeacherAction) -> Self {
        Self {
            required_state: None,
            required_action,
            reaction: None,
            state_change: None,
            branch: None,
            fail_on_other_action: false,
            timeout: None,
            description: String::new(),
        }
    }

    pub fn in_state(mut self, state: BehaviorState) -> Self {
        self.required_state = Some(state);
        self
    }

    pub fn with_reaction(mut self, reaction: ReactionKind) -> Self {
        self.reaction = Some(reaction);
        self
    }

    pub fn with_state_change(mut self, state: BehaviorState) -> Self {
        self.state_change = Some(state);
        self
    }

    pub fn with_branch(mut self, success_next: Option<usize>, failure_next: Option<usize>) -> Self {
        self.branch = Some(StepBranch {
            success_next,
            failure_next,
        });
        self
    }

    pub fn failing_on_other_action(mut self) -> Self {
        self.fail_on_other_action = true;
        self
    }

    pub fn with_timeout(
        mut self,
        seconds: Seconds,
        next: Option<usize>,
        reaction: Option<ReactionKind>,
    ) -> Self {
        self.timeout = Some(StepTimeout {
            seconds,
            next,
            reaction,
        });
        self
    }

    fn state_matches(&self, state: BehaviorState) -> bool {
        self.required_state.map_or(true, |required| required == state)
    }

    /// Plain equality check against this step's requirements
    pub fn can_advance(&self, action: TeacherAction, state: BehaviorState) -> bool {
        self.required_action == action && self.state_matches(state)
    }

    /// `Some(true)` on a match, `Some(false)` when the step fails on a wrong
    /// action, `None` when the action is irrelevant to this step
    pub fn can_branch(&self, action: TeacherAction, state: BehaviorState) -> Option<bool> {
        if self.can_advance(action, state) {
            Some(true)
        } else if self.fail_on_other_action && self.state_matches(state) {
            Some(false)
        } else {
            None
        }
    }

    /// Index after this one for the given result
    pub fn next_index(&self, current: usize, success: bool, step_count: usize) -> usize {
        match self.branch {
            Some(branch) => {
                let next = if success {
                    branch.success_next
                } else {
                    branch.failure_next
                };
                next.unwrap_or(step_count)
            }
            None => current + 1,
        }
    }
}

/// Named, ordered list of steps
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InteractionSequence {
    pub name: String,
    pub steps: Vec<SequenceStep>,
}

impl InteractionSequence {
    pub fn new(name: impl Into<String>, steps: Vec<SequenceStep>) -> Self {
        Self {
            name: name.into(),
            steps,
        }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}
