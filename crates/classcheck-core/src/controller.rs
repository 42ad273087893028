// ── Controller abstraction ──
//
// Facade over an attendance backend. Owns the roster cache, validates
// input before anything is sent, routes commands, and owns the background
// refresh tasks that feed the live views.

use std::io::{self, Write};
use std::sync::Arc;
use std::time::Duration;

use classcheck_api::ClassCheckClient;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::{AttendanceBackend, ServiceHealth};
use crate::command::{Command, CommandResult};
use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::export;
use crate::lifecycle::PollDuration;
use crate::model::{
    AttendanceLog, AttendancePoll, AttendanceRecord, NewStudent, PollId, PollStatus, Student,
    StudentId, StudentUpdate,
};
use crate::store::RosterStore;
use crate::stream::RosterStream;
use crate::submission;
use crate::sync::{BOARD_FALLBACK_MESSAGE, BoardSnapshot, PollingSync, StatusSync, fetch_board};

// ── Controller ───────────────────────────────────────────────────

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`. Generic over the backend
/// so the same code drives the HTTP client and the in-memory ledger.
pub struct Controller<B: AttendanceBackend = ClassCheckClient> {
    inner: Arc<ControllerInner<B>>,
}

impl<B: AttendanceBackend> Clone for Controller<B> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

struct ControllerInner<B> {
    config: ClientConfig,
    backend: Arc<B>,
    roster: Arc<RosterStore>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller<ClassCheckClient> {
    /// Build an HTTP-backed controller. Nothing is fetched until asked.
    pub fn connect(config: ClientConfig) -> Result<Self, CoreError> {
        let client =
            ClassCheckClient::new(config.url.as_str(), &config.credentials, &config.transport())?;
        debug!(url = %client.base_url(), "client ready");
        Ok(Self::with_backend(config, Arc::new(client)))
    }
}

impl<B: AttendanceBackend> Controller<B> {
    pub fn with_backend(config: ClientConfig, backend: Arc<B>) -> Self {
        Self {
            inner: Arc::new(ControllerInner {
                config,
                backend,
                roster: Arc::new(RosterStore::new()),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.inner.backend
    }

    pub fn roster(&self) -> &Arc<RosterStore> {
        &self.inner.roster
    }

    // ── Roster ───────────────────────────────────────────────────

    /// Re-fetch the whole roster into the cache. Returns its size.
    pub async fn refresh_roster(&self) -> Result<usize, CoreError> {
        let students = self.inner.backend.list_students().await?;
        let count = students.len();
        self.inner.roster.apply_roster(students);
        debug!(count, "roster refreshed");
        Ok(count)
    }

    pub fn students_snapshot(&self) -> Arc<Vec<Arc<Student>>> {
        self.inner.roster.snapshot()
    }

    pub fn students(&self) -> RosterStream {
        self.inner.roster.subscribe()
    }

    /// Fresh roster, ordered by id.
    pub async fn list_students(&self) -> Result<Vec<Student>, CoreError> {
        self.refresh_roster().await?;
        Ok(self
            .students_snapshot()
            .iter()
            .map(|s| Student::clone(s))
            .collect())
    }

    pub async fn get_student(&self, id: StudentId) -> Result<Student, CoreError> {
        let student = self.inner.backend.get_student(id).await?;
        self.inner.roster.upsert(student.clone());
        Ok(student)
    }

    pub async fn create_student(&self, new: NewStudent) -> Result<Student, CoreError> {
        new.validate()?;
        let student = self.inner.backend.create_student(new).await?;
        info!(id = %student.id, roll_no = %student.roll_no, "student created");
        self.inner.roster.upsert(student.clone());
        Ok(student)
    }

    pub async fn update_student(
        &self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Student, CoreError> {
        update.validate()?;
        let student = self.inner.backend.update_student(id, update).await?;
        info!(%id, "student updated");
        self.inner.roster.upsert(student.clone());
        Ok(student)
    }

    pub async fn delete_student(&self, id: StudentId) -> Result<(), CoreError> {
        self.inner.backend.delete_student(id).await?;
        info!(%id, "student deleted");
        self.inner.roster.remove(id);
        Ok(())
    }

    pub async fn student_history(
        &self,
        id: StudentId,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        self.inner.backend.student_history(id).await
    }

    // ── Polls ────────────────────────────────────────────────────

    pub async fn current_status(&self) -> Result<PollStatus, CoreError> {
        self.inner.backend.current_status().await
    }

    /// Open a poll after checking that none is running.
    ///
    /// The check is advisory; the service rejects a concurrent start too.
    pub async fn start_poll(&self, duration: PollDuration) -> Result<AttendancePoll, CoreError> {
        let status = self.current_status().await?;
        if status.is_active {
            return Err(CoreError::PollAlreadyActive {
                message: format!(
                    "An attendance poll is already active ({}s remaining)",
                    status.remaining_seconds
                ),
            });
        }
        let poll = self.inner.backend.start_poll(duration).await?;
        info!(poll_id = %poll.id, %duration, "poll started");
        Ok(poll)
    }

    pub async fn list_polls(&self, skip: u32, limit: u32) -> Result<Vec<AttendancePoll>, CoreError> {
        self.inner.backend.list_polls(skip, limit).await
    }

    pub async fn poll_log(&self, poll_id: PollId) -> Result<AttendanceLog, CoreError> {
        self.inner.backend.poll_log(poll_id).await
    }

    /// Fetch a poll's log and write it as CSV.
    ///
    /// `open` is only called once the log has been fetched, so a failed
    /// fetch never creates or truncates the destination.
    pub async fn export_csv<W, O>(&self, poll_id: PollId, open: O) -> Result<usize, CoreError>
    where
        W: Write,
        O: FnOnce() -> io::Result<W>,
    {
        let log = self.poll_log(poll_id).await?;
        let out = open().map_err(|e| CoreError::Internal(format!("cannot open export target: {e}")))?;
        export::write_csv(&log, out).map_err(|e| CoreError::Internal(format!("CSV write failed: {e}")))?;
        Ok(log.records.len())
    }

    // ── Attendance ───────────────────────────────────────────────

    /// Mark a roll number present in the currently open poll.
    ///
    /// Fetches the status first, and the roster if it has not been loaded.
    pub async fn mark_by_roll(&self, roll_no: &str) -> Result<AttendanceRecord, CoreError> {
        let status = self.current_status().await?;
        if status.is_active && !self.inner.roster.is_loaded() {
            self.refresh_roster().await?;
        }
        submission::submit_attendance(
            self.inner.backend.as_ref(),
            &self.inner.roster,
            &status,
            roll_no,
        )
        .await
    }

    pub async fn health(&self) -> Result<ServiceHealth, CoreError> {
        self.inner.backend.health().await
    }

    // ── Command execution ────────────────────────────────────────

    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        match cmd {
            Command::CreateStudent(new) => self.create_student(new).await.map(CommandResult::Student),
            Command::UpdateStudent { id, update } => self
                .update_student(id, update)
                .await
                .map(CommandResult::Student),
            Command::DeleteStudent { id } => {
                self.delete_student(id).await?;
                Ok(CommandResult::Ok)
            }
            Command::StartPoll { duration } => self.start_poll(duration).await.map(CommandResult::Poll),
            Command::MarkAttendance { roll_no } => {
                self.mark_by_roll(&roll_no).await.map(CommandResult::Record)
            }
        }
    }

    // ── Live views ───────────────────────────────────────────────

    /// Student-side status view: status refresh plus local countdown.
    pub fn watch_status(&self) -> StatusSync {
        let backend = Arc::clone(&self.inner.backend);
        StatusSync::spawn(
            move || {
                let backend = Arc::clone(&backend);
                async move { backend.current_status().await }
            },
            self.inner.config.status_timing(),
            self.inner.cancel.child_token(),
        )
    }

    /// Admin-side status view on the board cadence.
    pub fn watch_admin_status(&self) -> StatusSync {
        let backend = Arc::clone(&self.inner.backend);
        StatusSync::spawn(
            move || {
                let backend = Arc::clone(&backend);
                async move { backend.current_status().await }
            },
            self.inner.config.board_timing(),
            self.inner.cancel.child_token(),
        )
    }

    /// Live attendance board: status and open-poll log.
    pub fn watch_board(&self) -> PollingSync<BoardSnapshot> {
        let backend = Arc::clone(&self.inner.backend);
        PollingSync::spawn(
            move || fetch_board(Arc::clone(&backend)),
            self.inner.config.board_interval,
            BOARD_FALLBACK_MESSAGE,
            self.inner.cancel.child_token(),
        )
    }

    /// Keep the roster cache fresh in the background.
    pub async fn start_roster_refresh(&self, period: Duration) {
        let cancel = self.inner.cancel.child_token();
        let handle = tokio::spawn(roster_refresh_task(self.clone(), period, cancel));
        self.inner.task_handles.lock().await.push(handle);
    }

    /// Cancel every background task and wait for the owned ones to exit.
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let mut handles = self.inner.task_handles.lock().await;
        for handle in handles.drain(..) {
            let _ = handle.await;
        }
        debug!("controller shut down");
    }
}

// ── Background tasks ─────────────────────────────────────────────

async fn roster_refresh_task<B: AttendanceBackend>(
    controller: Controller<B>,
    period: Duration,
    cancel: CancellationToken,
) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if let Err(e) = controller.refresh_roster().await {
                    warn!(error = %e, "roster refresh failed");
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;
    use crate::clock::ManualClock;
    use crate::ledger::AttendanceLedger;

    type LedgerController = Controller<AttendanceLedger<Arc<ManualClock>>>;

    fn controller() -> (LedgerController, Arc<ManualClock>) {
        let clock = Arc::new(ManualClock::new(
            Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
        ));
        let ledger = AttendanceLedger::with_clock(Arc::clone(&clock));
        (
            Controller::with_backend(ClientConfig::default(), Arc::new(ledger)),
            clock,
        )
    }

    fn new_student(name: &str, roll: &str) -> NewStudent {
        NewStudent {
            name: name.into(),
            roll_no: roll.into(),
            department: "CS".into(),
        }
    }

    #[tokio::test]
    async fn create_validates_before_backend() {
        let (c, _) = controller();
        let err = c.create_student(new_student("", "R1")).await.unwrap_err();
        assert!(matches!(err, CoreError::ValidationFailed { .. }));
        assert!(c.backend().list_students(0, 10).await.is_empty());
    }

    #[tokio::test]
    async fn roster_cache_follows_writes() {
        let (c, _) = controller();
        let a = c.create_student(new_student("Ada", "R1")).await.unwrap();
        assert!(c.roster().find_by_roll("R1").is_some());

        c.update_student(
            a.id,
            StudentUpdate {
                roll_no: Some("R9".into()),
                ..StudentUpdate::default()
            },
        )
        .await
        .unwrap();
        assert!(c.roster().find_by_roll("R1").is_none());
        assert_eq!(c.roster().find_by_roll("R9").unwrap().id, a.id);

        c.delete_student(a.id).await.unwrap();
        assert!(c.roster().is_empty());
    }

    #[tokio::test]
    async fn second_start_is_rejected_while_active() {
        let (c, clock) = controller();
        let d = PollDuration::try_from(1).unwrap();
        c.start_poll(d).await.unwrap();
        let err = c.start_poll(d).await.unwrap_err();
        assert!(matches!(err, CoreError::PollAlreadyActive { .. }));

        clock.advance(chrono::Duration::seconds(60));
        let second = c.start_poll(d).await.unwrap();
        assert_eq!(second.id, PollId::new(2));
    }

    #[tokio::test]
    async fn mark_by_roll_loads_roster_on_demand() {
        let (c, _) = controller();
        c.backend()
            .create_student(new_student("Ada", "R1"))
            .await
            .unwrap();
        let poll = c.start_poll(PollDuration::try_from(5).unwrap()).await.unwrap();

        let record = c.mark_by_roll("R1").await.unwrap();
        assert_eq!(record.poll_id, poll.id);
        assert_eq!(c.poll_log(poll.id).await.unwrap().summary.present_count, 1);
    }

    #[tokio::test]
    async fn execute_routes_commands() {
        let (c, _) = controller();
        let CommandResult::Student(s) = c
            .execute(Command::CreateStudent(new_student("Bo", "R2")))
            .await
            .unwrap()
        else {
            panic!("expected student");
        };
        let CommandResult::Poll(poll) = c
            .execute(Command::StartPoll {
                duration: PollDuration::try_from(10).unwrap(),
            })
            .await
            .unwrap()
        else {
            panic!("expected poll");
        };
        let CommandResult::Record(r) = c
            .execute(Command::MarkAttendance {
                roll_no: "R2".into(),
            })
            .await
            .unwrap()
        else {
            panic!("expected record");
        };
        assert_eq!((r.student_id, r.poll_id), (s.id, poll.id));
        assert!(matches!(
            c.execute(Command::DeleteStudent { id: s.id }).await,
            Err(CoreError::Conflict { .. })
        ));
    }

    #[tokio::test]
    async fn export_writes_csv() {
        let (c, _) = controller();
        c.create_student(new_student("Ada", "R1")).await.unwrap();
        let poll = c.start_poll(PollDuration::try_from(5).unwrap()).await.unwrap();
        c.mark_by_roll("R1").await.unwrap();

        let mut buf = Vec::new();
        let out = &mut buf;
        let rows = c.export_csv(poll.id, move || Ok(out)).await.unwrap();
        assert_eq!(rows, 1);
        let csv = String::from_utf8(buf).unwrap();
        assert!(csv.starts_with("Roll No,Name,Status,Marked At\nR1,Ada,Present,"));
    }

    #[tokio::test]
    async fn export_of_unknown_poll_never_opens_the_target() {
        let (c, _) = controller();
        let mut opened = false;
        let err = c
            .export_csv(PollId::new(42), || {
                opened = true;
                Ok(Vec::new())
            })
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert!(!opened);
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_roster_refresh() {
        let (c, _) = controller();
        c.start_roster_refresh(Duration::from_secs(5)).await;
        tokio::time::sleep(Duration::from_secs(1)).await;
        assert!(c.roster().is_loaded());
        c.shutdown().await;
        assert!(c.inner.task_handles.lock().await.is_empty());
    }
}
