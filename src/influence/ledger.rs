//! Per-student record of who is influencing whom
//!
//! Each student owns one ledger listing the peers whose misbehavior reached
//! it. Entries are resolved (never removed) when the origin student is dealt
//! with, and purged wholesale when the affected student is escorted back or
//! returns to their seat.

use serde::{Deserialize, Serialize};

use crate::core::types::{Seconds, StudentId};
use crate::events::types::EventType;

/// Strengths at or below this are ignored entirely
pub const NEGLIGIBLE_STRENGTH: f32 = 0.01;

/// One influence edge from `source` onto the ledger's owner
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfluenceSource {
    pub source: StudentId,
    pub event_type: EventType,
    pub strength: f32,
    pub created_at: Seconds,
    pub resolved: bool,
}

/// What a write did to the ledger
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerWrite {
    Created,
    Refreshed,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InfluenceLedger {
    sources: Vec<InfluenceSource>,
}

impl InfluenceLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an influence edge
    ///
    /// An unresolved entry for the same (source, event type) pair is refreshed
    /// in place keeping the maximum strength. Negligible strengths are dropped
    /// and return `None`.
    pub fn record(
        &mut self,
        source: StudentId,
        event_type: EventType,
        strength: f32,
        now: Seconds,
    ) -> Option<LedgerWrite> {
        if strength <= NEGLIGIBLE_STRENGTH {
            return None;
        }

        if let Some(existing) = self
            .sources
            .iter_mut()
            .find(|s| !s.resolved && s.source == source && s.event_type == event_type)
        {
            existing.strength = existing.strength.max(strength);
            existing.created_at = now;
            return Some(LedgerWrite::Refreshed);
        }

        self.sources.push(InfluenceSource {
            source,
            event_type,
            strength: strength.min(1.0),
            created_at: now,
            resolved: false,
        });
        Some(LedgerWrite::Created)
    }

    /// Resolve every unresolved entry caused by `source`; returns how many flipped
    pub fn resolve_from(&mut self, source: StudentId) -> usize {
        let mut flipped = 0;
        for entry in self.sources.iter_mut().filter(|s| s.source == source && !s.resolved) {
            entry.resolved = true;
            flipped += 1;
        }
        flipped
    }

    /// Resolve a single (source, event type) entry; already-resolved is a no-op
    pub fn resolve(&mut self, source: StudentId, event_type: EventType) -> bool {
        match self
            .sources
            .iter_mut()
            .find(|s| !s.resolved && s.source == source && s.event_type == event_type)
        {
            Some(entry) => {
                entry.resolved = true;
                true
            }
            None => false,
        }
    }

    pub fn unresolved_count(&self) -> usize {
        self.sources.iter().filter(|s| !s.resolved).count()
    }

    /// Distinct origin students with at least one unresolved entry, in first-seen order
    pub fn unresolved_sources(&self) -> Vec<StudentId> {
        let mut out = Vec::new();
        for entry in self.sources.iter().filter(|s| !s.resolved) {
            if !out.contains(&entry.source) {
                out.push(entry.source);
            }
        }
        out
    }

    /// True when no entry is unresolved (an empty ledger counts as resolved)
    pub fn all_resolved(&self) -> bool {
        self.sources.iter().all(|s| s.resolved)
    }

    pub fn strongest_unresolved(&self) -> Option<&InfluenceSource> {
        self.sources
            .iter()
            .filter(|s| !s.resolved)
            .max_by(|a, b| a.strength.total_cmp(&b.strength))
    }

    /// Empty the ledger outright, resolved entries included
    pub fn clear(&mut self) {
        self.sources.clear();
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &InfluenceSource> {
        self.sources.iter()
    }
}
