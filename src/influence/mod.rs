//! Peer influence: who spreads misbehavior to whom, and how it is undone
//!
//! - `classification` - which event types spread and how hard
//! - `ledger` - per-student record of active influence edges
//! - `propagation` - turns eligible events into ledger entries and state changes

pub mod classification;
pub mod ledger;
pub mod propagation;

pub use classification::{influence_profile, is_influence_eligible, InfluenceProfile};
pub use ledger::{InfluenceLedger, InfluenceSource, LedgerWrite, NEGLIGIBLE_STRENGTH};
pub use propagation::{
    classify_strength, influence_strength, InfluenceEffect, InfluenceEngine, InfluenceStats,
    InfluenceTier, PropagationReport,
};
