//! Messes left behind by knocked-over and dropped objects

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::core::types::{MessId, ObjectId, Seconds, StudentId};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Mess {
    pub id: MessId,
    pub creator: StudentId,
    pub object: ObjectId,
    pub created_at: Seconds,
}

#[derive(Debug, Clone, Default)]
pub struct MessTracker {
    messes: AHashMap<MessId, Mess>,
    next_id: u32,
}

impl MessTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, creator: StudentId, object: ObjectId, now: Seconds) -> MessId {
        self.next_id += 1;
        let id = MessId(self.next_id);
        self.messes.insert(
            id,
            Mess {
                id,
                creator,
                object,
                created_at: now,
            },
        );
        id
    }

    pub fn get(&self, id: MessId) -> Option<&Mess> {
        self.messes.get(&id)
    }

    /// Remove a mess; `None` if it was already cleaned
    pub fn remove(&mut self, id: MessId) -> Option<Mess> {
        self.messes.remove(&id)
    }

    pub fn len(&self) -> usize {
        self.messes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messes.is_empty()
    }

    /// Open messes, oldest first
    pub fn open(&self) -> Vec<Mess> {
        let mut messes: Vec<_> = self.messes.values().copied().collect();
        messes.sort_by_key(|m| m.id.0);
        messes
    }

    pub fn clear(&mut self) {
        self.messes.clear();
        self.next_id = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique_and_removal_once() {
        let mut tracker = MessTracker::new();
        let a = tracker.create(StudentId(1), ObjectId(1), 0.0);
        let b = tracker.create(StudentId(1), ObjectId(2), 1.0);
        assert_ne!(a, b);
        assert_eq!(tracker.len(), 2);

        assert_eq!(tracker.remove(a).unwrap().creator, StudentId(1));
        assert!(tracker.remove(a).is_none());
        assert_eq!(tracker.open().len(), 1);
    }
}
