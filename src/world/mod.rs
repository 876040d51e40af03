//! Facts supplied by the presentation and movement layers
//!
//! The core never computes positions, paths or room membership itself. It
//! pulls them once per tick through [`ClassroomWorld`]. [`StaticWorld`] is a
//! plain in-memory implementation for headless runs and tests.

use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

use crate::core::types::{Location, ObjectId, Position, StudentId};

/// An interactable object and what can be done with it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassroomObject {
    pub id: ObjectId,
    pub name: String,
    #[serde(default = "yes")]
    pub can_knock_over: bool,
    #[serde(default = "yes")]
    pub can_make_noise: bool,
    #[serde(default = "yes")]
    pub can_throw: bool,
    #[serde(default = "yes")]
    pub can_drop: bool,
    #[serde(default = "yes")]
    pub can_touch: bool,
    /// Knocking over or dropping this object leaves a mess to clean
    #[serde(default)]
    pub creates_mess: bool,
}

fn yes() -> bool {
    true
}

impl ClassroomObject {
    pub fn new(id: ObjectId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            can_knock_over: true,
            can_make_noise: true,
            can_throw: true,
            can_drop: true,
            can_touch: true,
            creates_mess: false,
        }
    }

    pub fn messy(mut self) -> Self {
        self.creates_mess = true;
        self
    }
}

/// Read-only view of the world outside the rules engine
pub trait ClassroomWorld {
    /// Current world position, if the student is placed
    fn position(&self, student: StudentId) -> Option<Position>;

    /// Inside or outside the classroom
    fn location(&self, student: StudentId) -> Location;

    /// Whether the movement layer is currently moving this student
    fn is_moving(&self, student: StudentId) -> bool;

    /// Whether an escape route is configured for this student
    fn has_escape_route(&self, student: StudentId) -> bool;

    /// Object within reach of the student, if any
    fn nearby_object(&self, student: StudentId) -> Option<&ClassroomObject>;

    fn distance(&self, a: StudentId, b: StudentId) -> Option<f32> {
        Some(self.position(a)?.distance(self.position(b)?))
    }
}

/// In-memory world facts
#[derive(Debug, Clone, Default)]
pub struct StaticWorld {
    positions: AHashMap<StudentId, Position>,
    outside: AHashSet<StudentId>,
    moving: AHashSet<StudentId>,
    escape_routes: AHashSet<StudentId>,
    objects: AHashMap<ObjectId, ClassroomObject>,
    nearby: AHashMap<StudentId, ObjectId>,
}

impl StaticWorld {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, student: StudentId, position: Position) {
        self.positions.insert(student, position);
    }

    pub fn set_location(&mut self, student: StudentId, location: Location) {
        match location {
            Location::Outside => {
                self.outside.insert(student);
            }
            Location::Inside => {
                self.outside.remove(&student);
            }
        }
    }

    pub fn set_moving(&mut self, student: StudentId, moving: bool) {
        if moving {
            self.moving.insert(student);
        } else {
            self.moving.remove(&student);
        }
    }

    pub fn add_escape_route(&mut self, student: StudentId) {
        self.escape_routes.insert(student);
    }

    pub fn add_object(&mut self, object: ClassroomObject) {
        self.objects.insert(object.id, object);
    }

    /// Put `object` within reach of `student`
    pub fn set_nearby(&mut self, student: StudentId, object: ObjectId) {
        self.nearby.insert(student, object);
    }

    pub fn clear_nearby(&mut self, student: StudentId) {
        self.nearby.remove(&student);
    }
}

impl ClassroomWorld for StaticWorld {
    fn position(&self, student: StudentId) -> Option<Position> {
        self.positions.get(&student).copied()
    }

    fn location(&self, student: StudentId) -> Location {
        if self.outside.contains(&student) {
            Location::Outside
        } else {
            Location::Inside
        }
    }

    fn is_moving(&self, student: StudentId) -> bool {
        self.moving.contains(&student)
    }

    fn has_escape_route(&self, student: StudentId) -> bool {
        self.escape_routes.contains(&student)
    }

    fn nearby_object(&self, student: StudentId) -> Option<&ClassroomObject> {
        self.nearby.get(&student).and_then(|id| self.objects.get(id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec3;

    #[test]
    fn test_distance_requires_both_positions() {
        let mut world = StaticWorld::new();
        world.place(StudentId(1), Vec3::new(0.0, 0.0, 0.0));
        assert_eq!(world.distance(StudentId(1), StudentId(2)), None);

        world.place(StudentId(2), Vec3::new(3.0, 0.0, 4.0));
        assert_eq!(world.distance(StudentId(1), StudentId(2)), Some(5.0));
    }

    #[test]
    fn test_location_toggle() {
        let mut world = StaticWorld::new();
        world.set_location(StudentId(1), Location::Outside);
        assert_eq!(world.location(StudentId(1)), Location::Outside);
        world.set_location(StudentId(1), Location::Inside);
        assert_eq!(world.location(StudentId(1)), Location::Inside);
    }

    #[test]
    fn test_nearby_object_lookup() {
        let mut world = StaticWorld::new();
        world.add_object(ClassroomObject::new(ObjectId(5), "bin").messy());
        world.set_nearby(StudentId(1), ObjectId(5));

        let object = world.nearby_object(StudentId(1)).unwrap();
        assert_eq!(object.name, "bin");
        assert!(object.creates_mess);
        assert!(world.nearby_object(StudentId(2)).is_none());
    }

    #[test]
    fn test_object_toml_defaults() {
        let object: ClassroomObject = toml::from_str("id = 3\nname = \"chair\"\ncan_throw = false").unwrap();
        assert!(!object.can_throw);
        assert!(object.can_touch);
        assert!(!object.creates_mess);
    }
}
