// ── In-memory attendance ledger ──
//
// Single-writer reference of the rules the attendance service enforces:
// unique roll numbers, at most one active poll, idempotent marks, and marks
// only while the target poll is open. Used for offline demos and to drive
// the controller and sync tasks in tests without a network.

use std::collections::BTreeMap;

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::clock::{Clock, SystemClock};
use crate::error::CoreError;
use crate::lifecycle::{self, PollDuration, PollPhase};
use crate::model::{
    AttendanceLog, AttendancePoll, AttendanceRecord, NewStudent, PollId, PollStatus, RecordId,
    Student, StudentId, StudentUpdate,
};

#[derive(Default)]
struct LedgerState {
    students: BTreeMap<StudentId, Student>,
    polls: BTreeMap<PollId, AttendancePoll>,
    records: Vec<AttendanceRecord>,
    next_student: u64,
    next_poll: u64,
    next_record: u64,
}

impl LedgerState {
    fn roll_taken(&self, roll_no: &str, except: Option<StudentId>) -> bool {
        self.students
            .values()
            .any(|s| s.roll_no == roll_no && Some(s.id) != except)
    }

    fn active_poll(&self, now: chrono::DateTime<chrono::Utc>) -> Option<&AttendancePoll> {
        self.polls
            .values()
            .rev()
            .find(|p| p.phase_at(now) == PollPhase::Active)
    }

    fn student(&self, id: StudentId) -> Result<&Student, CoreError> {
        self.students.get(&id).ok_or_else(|| CoreError::NotFound {
            message: "Student not found".into(),
        })
    }

    fn poll(&self, id: PollId) -> Result<&AttendancePoll, CoreError> {
        self.polls.get(&id).ok_or_else(|| CoreError::NotFound {
            message: "Poll not found".into(),
        })
    }

    fn roster_size(&self) -> u64 {
        u64::try_from(self.students.len()).unwrap_or(u64::MAX)
    }
}

/// In-memory implementation of the attendance service's rules.
pub struct AttendanceLedger<C: Clock = SystemClock> {
    clock: C,
    state: Mutex<LedgerState>,
}

impl AttendanceLedger<SystemClock> {
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for AttendanceLedger<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> AttendanceLedger<C> {
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            state: Mutex::new(LedgerState::default()),
        }
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    // ── Students ─────────────────────────────────────────────────────

    pub async fn create_student(&self, new: NewStudent) -> Result<Student, CoreError> {
        new.validate()?;
        let mut state = self.state.lock().await;
        if state.roll_taken(&new.roll_no, None) {
            return Err(CoreError::Conflict {
                message: "Roll number already registered".into(),
            });
        }
        state.next_student += 1;
        let student = Student {
            id: StudentId::new(state.next_student),
            name: new.name,
            roll_no: new.roll_no,
            department: new.department,
            created_at: self.clock.now(),
        };
        state.students.insert(student.id, student.clone());
        debug!(id = %student.id, roll_no = %student.roll_no, "student registered");
        Ok(student)
    }

    pub async fn get_student(&self, id: StudentId) -> Result<Student, CoreError> {
        self.state.lock().await.student(id).cloned()
    }

    pub async fn list_students(&self, skip: usize, limit: usize) -> Vec<Student> {
        self.state
            .lock()
            .await
            .students
            .values()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        update: &StudentUpdate,
    ) -> Result<Student, CoreError> {
        update.validate()?;
        let mut state = self.state.lock().await;
        state.student(id)?;
        if let Some(roll_no) = &update.roll_no {
            if state.roll_taken(roll_no, Some(id)) {
                return Err(CoreError::Conflict {
                    message: "Roll number already taken".into(),
                });
            }
        }
        let student = state
            .students
            .get_mut(&id)
            .ok_or_else(|| CoreError::Internal(format!("student {id} vanished under lock")))?;
        update.apply_to(student);
        Ok(student.clone())
    }

    /// Remove a student. Refused while attendance records reference them.
    pub async fn delete_student(&self, id: StudentId) -> Result<(), CoreError> {
        let mut state = self.state.lock().await;
        state.student(id)?;
        if state.records.iter().any(|r| r.student_id == id) {
            return Err(CoreError::Conflict {
                message: "Student has attendance records and cannot be deleted".into(),
            });
        }
        state.students.remove(&id);
        debug!(%id, "student removed");
        Ok(())
    }

    // ── Polls ────────────────────────────────────────────────────────

    /// Open a new poll at the current instant.
    ///
    /// Fails with `PollAlreadyActive` while another poll is open. Earlier,
    /// already-expired polls have their active flag cleared.
    pub async fn start_poll(&self, duration: PollDuration) -> Result<AttendancePoll, CoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        if let Some(open) = state.active_poll(now) {
            return Err(CoreError::PollAlreadyActive {
                message: format!(
                    "Poll {} is already active ({}s remaining)",
                    open.id,
                    open.remaining_seconds_at(now)
                ),
            });
        }
        for poll in state.polls.values_mut() {
            poll.active = false;
        }
        state.next_poll += 1;
        let poll = AttendancePoll {
            id: PollId::new(state.next_poll),
            start_time: now,
            end_time: duration.end_time(now),
            duration_minutes: duration.minutes(),
            active: true,
            created_at: now,
        };
        state.polls.insert(poll.id, poll.clone());
        info!(poll_id = %poll.id, %duration, "poll started");
        Ok(poll)
    }

    /// Status of the open poll, or the inactive status when none is open.
    pub async fn current_status(&self) -> PollStatus {
        let now = self.clock.now();
        let state = self.state.lock().await;
        match state.active_poll(now) {
            Some(poll) => lifecycle::project_status(Some(poll), now),
            None => PollStatus::inactive(),
        }
    }

    pub async fn get_poll(&self, id: PollId) -> Result<AttendancePoll, CoreError> {
        self.state.lock().await.poll(id).cloned()
    }

    /// Polls newest first.
    pub async fn list_polls(&self, skip: usize, limit: usize) -> Vec<AttendancePoll> {
        self.state
            .lock()
            .await
            .polls
            .values()
            .rev()
            .skip(skip)
            .take(limit)
            .cloned()
            .collect()
    }

    // ── Attendance ───────────────────────────────────────────────────

    /// Mark `student` present for `poll`.
    ///
    /// Repeating the call for the same pair returns the original record.
    pub async fn mark(
        &self,
        student_id: StudentId,
        poll_id: PollId,
    ) -> Result<AttendanceRecord, CoreError> {
        let now = self.clock.now();
        let mut state = self.state.lock().await;
        let student = state.student(student_id)?.clone();
        if state.poll(poll_id)?.phase_at(now) != PollPhase::Active {
            return Err(CoreError::poll_not_active());
        }
        if let Some(existing) = state
            .records
            .iter()
            .find(|r| r.student_id == student_id && r.poll_id == poll_id)
        {
            debug!(%student_id, %poll_id, "already marked");
            return Ok(existing.clone());
        }
        state.next_record += 1;
        let record = AttendanceRecord {
            id: RecordId::new(state.next_record),
            student_id,
            poll_id,
            marked_at: now,
            student_name: Some(student.name),
            student_roll_no: Some(student.roll_no),
        };
        state.records.push(record.clone());
        debug!(%student_id, %poll_id, "attendance marked");
        Ok(record)
    }

    pub async fn poll_log(&self, poll_id: PollId) -> Result<AttendanceLog, CoreError> {
        let state = self.state.lock().await;
        let poll = state.poll(poll_id)?;
        let records = state
            .records
            .iter()
            .filter(|r| r.poll_id == poll_id)
            .map(|r| with_current_names(&state, r))
            .collect();
        Ok(AttendanceLog::summarize(poll, state.roster_size(), records))
    }

    pub async fn student_history(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        let state = self.state.lock().await;
        state.student(student_id)?;
        Ok(state
            .records
            .iter()
            .filter(|r| r.student_id == student_id)
            .rev()
            .map(|r| with_current_names(&state, r))
            .collect())
    }
}

/// Records carry the student's current name and roll number.
fn with_current_names(state: &LedgerState, record: &AttendanceRecord) -> AttendanceRecord {
    let mut record = record.clone();
    if let Some(student) = state.students.get(&record.student_id) {
        record.student_name = Some(student.name.clone());
        record.student_roll_no = Some(student.roll_no.clone());
    }
    record
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use chrono::{Duration, TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::clock::ManualClock;

    fn ledger() -> (Arc<ManualClock>, AttendanceLedger<Arc<ManualClock>>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ));
        (Arc::clone(&clock), AttendanceLedger::with_clock(clock))
    }

    fn student(name: &str, roll: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            roll_no: roll.into(),
            department: "CS".into(),
        }
    }

    fn minutes(m: u32) -> PollDuration {
        PollDuration::try_from(m).unwrap()
    }

    #[tokio::test]
    async fn duplicate_roll_numbers_conflict() {
        let (_, ledger) = ledger();
        ledger.create_student(student("A", "CS001")).await.unwrap();
        let err = ledger.create_student(student("B", "CS001")).await.unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[tokio::test]
    async fn roll_numbers_are_case_sensitive() {
        let (_, ledger) = ledger();
        ledger.create_student(student("A", "cs001")).await.unwrap();
        ledger.create_student(student("B", "CS001")).await.unwrap();
        assert_eq!(ledger.list_students(0, 100).await.len(), 2);
    }

    #[tokio::test]
    async fn update_to_taken_roll_conflicts() {
        let (_, ledger) = ledger();
        ledger.create_student(student("A", "CS001")).await.unwrap();
        let b = ledger.create_student(student("B", "CS002")).await.unwrap();
        let update = StudentUpdate {
            roll_no: Some("CS001".into()),
            ..Default::default()
        };
        let err = ledger.update_student(b.id, &update).await.unwrap_err();
        assert_eq!(err.to_string(), "Roll number already taken");

        // Keeping your own roll number is fine.
        let update = StudentUpdate {
            roll_no: Some("CS002".into()),
            name: Some("Bea".into()),
            ..Default::default()
        };
        assert_eq!(ledger.update_student(b.id, &update).await.unwrap().name, "Bea");
    }

    #[tokio::test]
    async fn second_active_poll_conflicts() {
        let (clock, ledger) = ledger();
        ledger.start_poll(minutes(5)).await.unwrap();
        let err = ledger.start_poll(minutes(5)).await.unwrap_err();
        assert!(matches!(err, CoreError::PollAlreadyActive { .. }));

        clock.advance(Duration::minutes(5));
        let next = ledger.start_poll(minutes(1)).await.unwrap();
        assert_eq!(next.id, PollId::new(2));
        assert!(!ledger.get_poll(PollId::new(1)).await.unwrap().active);
    }

    #[tokio::test]
    async fn status_follows_the_clock() {
        let (clock, ledger) = ledger();
        assert_eq!(ledger.current_status().await, PollStatus::inactive());

        let poll = ledger.start_poll(minutes(2)).await.unwrap();
        let status = ledger.current_status().await;
        assert!(status.is_active);
        assert_eq!(status.poll_id, Some(poll.id));
        assert_eq!(status.remaining_seconds, 120);

        clock.advance(Duration::seconds(90));
        assert_eq!(ledger.current_status().await.remaining_seconds, 30);

        clock.advance(Duration::seconds(30));
        assert!(!ledger.current_status().await.is_active);
    }

    #[tokio::test]
    async fn mark_is_idempotent() {
        let (_, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        let poll = ledger.start_poll(minutes(5)).await.unwrap();

        let first = ledger.mark(a.id, poll.id).await.unwrap();
        let second = ledger.mark(a.id, poll.id).await.unwrap();
        assert_eq!(first, second);

        let log = ledger.poll_log(poll.id).await.unwrap();
        assert_eq!(log.summary.present_count, 1);
    }

    #[tokio::test]
    async fn mark_after_expiry_fails() {
        let (clock, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        let poll = ledger.start_poll(minutes(1)).await.unwrap();

        clock.advance(Duration::seconds(60));
        let err = ledger.mark(a.id, poll.id).await.unwrap_err();
        assert!(matches!(err, CoreError::PollNotActive { .. }));
    }

    #[tokio::test]
    async fn mark_fails_once_status_reports_zero_remaining() {
        let (clock, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        let poll = ledger.start_poll(minutes(1)).await.unwrap();

        clock.advance(Duration::milliseconds(59_500));
        let status = ledger.current_status().await;
        assert!(!status.is_active);
        assert_eq!(status.remaining_seconds, 0);

        let err = ledger.mark(a.id, poll.id).await.unwrap_err();
        assert!(matches!(err, CoreError::PollNotActive { .. }));
    }

    #[tokio::test]
    async fn mark_unknown_entities() {
        let (_, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        let poll = ledger.start_poll(minutes(5)).await.unwrap();

        let err = ledger.mark(StudentId::new(99), poll.id).await.unwrap_err();
        assert_eq!(err.to_string(), "Student not found");
        let err = ledger.mark(a.id, PollId::new(99)).await.unwrap_err();
        assert_eq!(err.to_string(), "Poll not found");
    }

    #[tokio::test]
    async fn two_student_scenario_log() {
        let (_, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        ledger.create_student(student("B", "CS002")).await.unwrap();
        let poll = ledger.start_poll(minutes(5)).await.unwrap();

        let record = ledger.mark(a.id, poll.id).await.unwrap();
        assert_eq!(record.student_id, a.id);
        assert_eq!(record.poll_id, poll.id);

        let log = ledger.poll_log(poll.id).await.unwrap();
        assert_eq!(log.summary.total_students, 2);
        assert_eq!(log.summary.present_count, 1);
        assert_eq!(log.summary.absent_count, 1);
        assert!((log.summary.attendance_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn delete_refused_while_referenced() {
        let (_, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        let b = ledger.create_student(student("B", "CS002")).await.unwrap();
        let poll = ledger.start_poll(minutes(5)).await.unwrap();
        ledger.mark(a.id, poll.id).await.unwrap();

        assert!(ledger.delete_student(a.id).await.unwrap_err().is_conflict());
        ledger.delete_student(b.id).await.unwrap();
        assert!(ledger.get_student(b.id).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn polls_listed_newest_first() {
        let (clock, ledger) = ledger();
        for _ in 0..3 {
            ledger.start_poll(minutes(1)).await.unwrap();
            clock.advance(Duration::minutes(2));
        }
        let ids: Vec<_> = ledger
            .list_polls(0, 50)
            .await
            .into_iter()
            .map(|p| p.id.get())
            .collect();
        assert_eq!(ids, vec![3, 2, 1]);
        assert_eq!(ledger.list_polls(1, 1).await[0].id, PollId::new(2));
    }

    #[tokio::test]
    async fn history_is_newest_first() {
        let (clock, ledger) = ledger();
        let a = ledger.create_student(student("A", "CS001")).await.unwrap();
        for _ in 0..2 {
            let poll = ledger.start_poll(minutes(1)).await.unwrap();
            ledger.mark(a.id, poll.id).await.unwrap();
            clock.advance(Duration::minutes(2));
        }
        let history = ledger.student_history(a.id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].poll_id, PollId::new(2));
    }
}
