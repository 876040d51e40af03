//! Level composition root
//!
//! Wires the roster, bus and subsystems together, applies teacher actions,
//! confiscations and mess cleanup, and loads level files.

pub mod actions;
pub mod confiscation;
pub mod loader;
pub mod mess;
pub mod session;

pub use actions::{ActionOutcome, TeacherAction};
pub use confiscation::{ConfiscationRule, ConfiscationRules};
pub use loader::{level_path, load_level, parse_level, LevelConfig, StudentConfig};
pub use mess::{Mess, MessTracker};
pub use session::{Level, LevelSummary, StudentSummary, TickReport};
