//! Event bus - discrete behavioral events and state-change notifications

pub mod bus;
pub mod notification;
pub mod types;

pub use bus::{BusMessage, EventBus, ListenerId};
pub use notification::{MovementIntent, Notification};
pub use types::{ClassroomEvent, EventType, InfluenceScope};
