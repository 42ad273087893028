// ── Roster store ──
//
// Reactive cache of the student roster. Refreshed wholesale from the
// backend; lookups by roll number are exact and case-sensitive.

mod collection;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::model::{Student, StudentId};
use crate::stream::{Roster, RosterStream};

use collection::StudentCollection;

/// Reactive roster cache.
pub struct RosterStore {
    students: StudentCollection,
    last_refresh: watch::Sender<Option<DateTime<Utc>>>,
}

impl RosterStore {
    pub fn new() -> Self {
        let (last_refresh, _) = watch::channel(None);
        Self {
            students: StudentCollection::new(),
            last_refresh,
        }
    }

    /// Replace the roster with a fresh fetch.
    pub fn apply_roster(&self, students: Vec<Student>) {
        self.students.replace_all(students);
        self.last_refresh.send_replace(Some(Utc::now()));
    }

    pub fn upsert(&self, student: Student) {
        self.students.upsert(student);
    }

    pub fn remove(&self, id: StudentId) -> Option<Arc<Student>> {
        self.students.remove(id)
    }

    pub fn get(&self, id: StudentId) -> Option<Arc<Student>> {
        self.students.get(id)
    }

    /// Exact, case-sensitive roll-number lookup.
    pub fn find_by_roll(&self, roll_no: &str) -> Option<Arc<Student>> {
        self.students.by_roll(roll_no)
    }

    pub fn snapshot(&self) -> Roster {
        self.students.snapshot()
    }

    pub fn subscribe(&self) -> RosterStream {
        RosterStream::new(self.students.subscribe())
    }

    pub fn len(&self) -> usize {
        self.students.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When the roster was last replaced from the backend.
    pub fn last_refresh(&self) -> Option<DateTime<Utc>> {
        *self.last_refresh.borrow()
    }

    pub fn is_loaded(&self) -> bool {
        self.last_refresh().is_some()
    }
}

impl Default for RosterStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn student(id: u64, roll: &str) -> Student {
        Student {
            id: StudentId::new(id),
            name: format!("Student {id}"),
            roll_no: roll.into(),
            department: "CS".into(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn roll_lookup_is_exact() {
        let store = RosterStore::new();
        store.apply_roster(vec![student(1, "CS001"), student(2, "cs002")]);

        assert_eq!(store.find_by_roll("CS001").unwrap().id, StudentId::new(1));
        assert!(store.find_by_roll("cs001").is_none());
        assert!(store.find_by_roll("CS002").is_none());
        assert!(store.find_by_roll(" CS001").is_none());
    }

    #[test]
    fn apply_roster_marks_loaded_and_prunes() {
        let store = RosterStore::new();
        assert!(!store.is_loaded());

        store.apply_roster(vec![student(1, "A"), student(2, "B")]);
        store.apply_roster(vec![student(2, "B")]);

        assert!(store.is_loaded());
        assert_eq!(store.len(), 1);
        assert!(store.get(StudentId::new(1)).is_none());
    }
}
