//! Level-scripted triggers that publish events on conditions

pub mod condition;
pub mod scheduler;

pub use condition::TriggerCondition;
pub use scheduler::{evaluate_condition, ScriptedTrigger, TriggerDefinition, TriggerScheduler};
