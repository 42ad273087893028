// ── Keyed student collection ──
//
// Concurrent map of students by id with a secondary exact index on roll
// number. Every mutation republishes the id-ordered snapshot.

use std::collections::HashSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{Student, StudentId};
use crate::stream::Roster;

pub(crate) struct StudentCollection {
    by_id: DashMap<StudentId, Arc<Student>>,
    /// Roll number (verbatim) to id.
    by_roll: DashMap<String, StudentId>,
    snapshot: watch::Sender<Roster>,
}

impl StudentCollection {
    pub(crate) fn new() -> Self {
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));
        Self {
            by_id: DashMap::new(),
            by_roll: DashMap::new(),
            snapshot,
        }
    }

    fn insert(&self, student: Student) {
        let id = student.id;
        let roll_no = student.roll_no.clone();
        if let Some(old) = self.by_id.insert(id, Arc::new(student)) {
            if old.roll_no != roll_no {
                self.by_roll.remove_if(&old.roll_no, |_, owner| *owner == id);
            }
        }
        self.by_roll.insert(roll_no, id);
    }

    pub(crate) fn upsert(&self, student: Student) {
        self.insert(student);
        self.publish();
    }

    pub(crate) fn remove(&self, id: StudentId) -> Option<Arc<Student>> {
        let (_, removed) = self.by_id.remove(&id)?;
        self.by_roll.remove_if(&removed.roll_no, |_, owner| *owner == id);
        self.publish();
        Some(removed)
    }

    /// Swap in a fresh roster. Entries are upserted before stale ones are
    /// pruned, so readers never observe an empty roster mid-refresh.
    pub(crate) fn replace_all(&self, students: Vec<Student>) {
        let keep: HashSet<StudentId> = students.iter().map(|s| s.id).collect();
        for student in students {
            self.insert(student);
        }
        self.by_id.retain(|id, _| keep.contains(id));
        self.by_roll.retain(|_, id| keep.contains(id));
        self.publish();
    }

    pub(crate) fn get(&self, id: StudentId) -> Option<Arc<Student>> {
        self.by_id.get(&id).map(|entry| Arc::clone(entry.value()))
    }

    /// Exact, case-sensitive lookup.
    pub(crate) fn by_roll(&self, roll_no: &str) -> Option<Arc<Student>> {
        let id = *self.by_roll.get(roll_no)?;
        self.get(id)
    }

    pub(crate) fn snapshot(&self) -> Roster {
        self.snapshot.borrow().clone()
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<Roster> {
        self.snapshot.subscribe()
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    fn publish(&self) {
        let mut students: Vec<Arc<Student>> =
            self.by_id.iter().map(|e| Arc::clone(e.value())).collect();
        students.sort_by_key(|s| s.id);
        // send_replace stores the value even with no receivers.
        self.snapshot.send_replace(Arc::new(students));
    }
}
