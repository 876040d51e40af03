//! Scoring, level goals and the win/lose evaluator

pub mod evaluator;
pub mod goal;
pub mod scoring;

pub use evaluator::{OutcomeEvaluator, OutcomeSnapshot};
pub use goal::{LevelGoal, LevelOutcome, LoseReason};
pub use scoring::{resolves_problem, ScoreSummary, Scorer, ScoringRules};
