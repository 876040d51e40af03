pub mod config;
pub mod error;
pub mod types;

pub use config::SimulationConfig;
pub use error::{ClassroomError, Result};
pub use types::{EventId, Location, MessId, ObjectId, Position, Seconds, StudentId};
