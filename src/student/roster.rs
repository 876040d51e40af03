//! Arena storage for the students of a level
//!
//! Students are addressed by stable `StudentId`; nothing outside the roster
//! holds references into it.

use ahash::AHashMap;

use crate::core::types::StudentId;
use crate::student::machine::Student;
use crate::student::state::BehaviorState;

#[derive(Debug, Clone, Default)]
pub struct Roster {
    students: Vec<Student>,
    index: AHashMap<StudentId, usize>,
}

impl Roster {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a student; a duplicate id is rejected
    pub fn add(&mut self, student: Student) -> bool {
        if self.index.contains_key(&student.id) {
            tracing::warn!(student = %student.id, "duplicate student id ignored");
            return false;
        }
        self.index.insert(student.id, self.students.len());
        self.students.push(student);
        true
    }

    pub fn get(&self, id: StudentId) -> Option<&Student> {
        self.index.get(&id).map(|&i| &self.students[i])
    }

    pub fn get_mut(&mut self, id: StudentId) -> Option<&mut Student> {
        match self.index.get(&id) {
            Some(&i) => Some(&mut self.students[i]),
            None => None,
        }
    }

    pub fn contains(&self, id: StudentId) -> bool {
        self.index.contains_key(&id)
    }

    /// Resolve a student by numeric id or by name (case-insensitive)
    pub fn find(&self, reference: &str) -> Option<StudentId> {
        let reference = reference.trim();
        if let Ok(raw) = reference.parse::<u32>() {
            if self.contains(StudentId(raw)) {
                return Some(StudentId(raw));
            }
        }
        self.students
            .iter()
            .find(|s| s.name.eq_ignore_ascii_case(reference))
            .map(|s| s.id)
    }

    pub fn ids(&self) -> Vec<StudentId> {
        self.students.iter().map(|s| s.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Student> {
        self.students.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Student> {
        self.students.iter_mut()
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.students.is_empty()
    }

    pub fn count_in_state(&self, state: BehaviorState) -> usize {
        self.students.iter().filter(|s| s.state() == state).count()
    }

    /// Resolve, across every ledger, the entries caused by `source`
    pub fn resolve_sources_from(&mut self, source: StudentId) -> usize {
        self.students
            .iter_mut()
            .filter(|s| s.id != source)
            .map(|s| s.ledger.resolve_from(source))
            .sum()
    }

    pub fn clear(&mut self) {
        self.students.clear();
        self.index.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::types::EventType;
    use crate::student::personality::Personality;

    fn roster() -> Roster {
        let mut roster = Roster::new();
        roster.add(Student::new(StudentId(1), "Ada", Personality::default()));
        roster.add(Student::new(StudentId(2), "Bo", Personality::default()));
        roster.add(Student::new(StudentId(3), "Cy", Personality::default()));
        roster
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut roster = roster();
        assert!(!roster.add(Student::new(StudentId(1), "Other", Personality::default())));
        assert_eq!(roster.len(), 3);
        assert_eq!(roster.get(StudentId(1)).unwrap().name, "Ada");
    }

    #[test]
    fn test_find_by_id_or_name() {
        let roster = roster();
        assert_eq!(roster.find("2"), Some(StudentId(2)));
        assert_eq!(roster.find("cy"), Some(StudentId(3)));
        assert_eq!(roster.find("Zed"), None);
        assert_eq!(roster.find("99"), None);
    }

    #[test]
    fn test_resolve_sources_across_ledgers() {
        let mut roster = roster();
        roster
            .get_mut(StudentId(2))
            .unwrap()
            .ledger
            .record(StudentId(1), EventType::MakingNoise, 0.5, 0.0);
        roster
            .get_mut(StudentId(3))
            .unwrap()
            .ledger
            .record(StudentId(1), EventType::ThrowingObject, 0.5, 0.0);
        roster
            .get_mut(StudentId(3))
            .unwrap()
            .ledger
            .record(StudentId(2), EventType::Laughing, 0.5, 0.0);

        assert_eq!(roster.resolve_sources_from(StudentId(1)), 2);
        assert_eq!(roster.get(StudentId(3)).unwrap().ledger.unresolved_count(), 1);
        assert_eq!(roster.get(StudentId(3)).unwrap().ledger.len(), 2);
    }

    #[test]
    fn test_count_in_state() {
        let roster = roster();
        assert_eq!(roster.count_in_state(BehaviorState::Calm), 3);
        assert_eq!(roster.count_in_state(BehaviorState::Critical), 0);
    }
}
