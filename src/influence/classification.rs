//! Static table of which events spread to peers and how hard

use crate::events::types::{EventType, InfluenceScope};

/// How an influence-eligible event spreads
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InfluenceProfile {
    /// Severity before the target's susceptibility/resistance are applied
    pub base_severity: f32,
    /// Scope used when the event was published without one
    pub default_scope: InfluenceScope,
}

/// Influence profile for an event type, `None` if the event never spreads
pub fn influence_profile(event_type: EventType) -> Option<InfluenceProfile> {
    let (base_severity, default_scope) = match event_type {
        EventType::ThrowingObject => (0.9, InfluenceScope::SingleStudent),
        EventType::KnockedOverObject => (0.7, InfluenceScope::WholeClass),
        EventType::MakingNoise => (0.6, InfluenceScope::WholeClass),
        EventType::MessCreated => (0.5, InfluenceScope::WholeClass),
        EventType::Laughing => (0.4, InfluenceScope::SingleStudent),
        _ => return None,
    };
    Some(InfluenceProfile {
        base_severity,
        default_scope,
    })
}

pub fn is_influence_eligible(event_type: EventType) -> bool {
    influence_profile(event_type).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spreading_events_are_eligible() {
        assert!(is_influence_eligible(EventType::ThrowingObject));
        assert!(is_influence_eligible(EventType::MakingNoise));
        assert!(is_influence_eligible(EventType::KnockedOverObject));
        assert!(is_influence_eligible(EventType::MessCreated));
    }

    #[test]
    fn test_local_events_are_not_eligible() {
        assert!(!is_influence_eligible(EventType::LeftSeat));
        assert!(!is_influence_eligible(EventType::Wandering));
        assert!(!is_influence_eligible(EventType::StudentCalmed));
        assert!(!is_influence_eligible(EventType::Fidgeting));
    }

    #[test]
    fn test_throwing_is_most_severe() {
        let throw = influence_profile(EventType::ThrowingObject).unwrap();
        assert_eq!(throw.base_severity, 0.9);
        assert_eq!(throw.default_scope, InfluenceScope::SingleStudent);

        for event_type in EventType::all() {
            if let Some(profile) = influence_profile(*event_type) {
                assert!(profile.base_severity <= throw.base_severity);
                assert!(profile.base_severity > 0.0);
            }
        }
    }
}
