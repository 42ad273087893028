// ── Backend seam ──
//
// Everything the controller and sync tasks need from the owning service.
// Implemented by the HTTP client and by the in-memory ledger.

use std::future::Future;

use classcheck_api::ClassCheckClient;
use serde::Serialize;

use crate::clock::Clock;
use crate::error::CoreError;
use crate::ledger::AttendanceLedger;
use crate::lifecycle::PollDuration;
use crate::model::{
    AttendanceLog, AttendancePoll, AttendanceRecord, NewStudent, PollId, PollStatus, Student,
    StudentId, StudentUpdate,
};

/// Liveness summary of the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceHealth {
    pub healthy: bool,
    pub status: String,
    pub version: Option<String>,
}

/// The attendance service as seen by clients.
pub trait AttendanceBackend: Send + Sync + 'static {
    /// The whole roster.
    fn list_students(&self) -> impl Future<Output = Result<Vec<Student>, CoreError>> + Send;

    fn get_student(
        &self,
        id: StudentId,
    ) -> impl Future<Output = Result<Student, CoreError>> + Send;

    fn create_student(
        &self,
        new: NewStudent,
    ) -> impl Future<Output = Result<Student, CoreError>> + Send;

    fn update_student(
        &self,
        id: StudentId,
        update: StudentUpdate,
    ) -> impl Future<Output = Result<Student, CoreError>> + Send;

    fn delete_student(&self, id: StudentId) -> impl Future<Output = Result<(), CoreError>> + Send;

    fn start_poll(
        &self,
        duration: PollDuration,
    ) -> impl Future<Output = Result<AttendancePoll, CoreError>> + Send;

    fn current_status(&self) -> impl Future<Output = Result<PollStatus, CoreError>> + Send;

    fn mark_attendance(
        &self,
        student_id: StudentId,
        poll_id: PollId,
    ) -> impl Future<Output = Result<AttendanceRecord, CoreError>> + Send;

    fn poll_log(
        &self,
        poll_id: PollId,
    ) -> impl Future<Output = Result<AttendanceLog, CoreError>> + Send;

    /// Polls newest first.
    fn list_polls(
        &self,
        skip: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<AttendancePoll>, CoreError>> + Send;

    fn student_history(
        &self,
        student_id: StudentId,
    ) -> impl Future<Output = Result<Vec<AttendanceRecord>, CoreError>> + Send;

    fn health(&self) -> impl Future<Output = Result<ServiceHealth, CoreError>> + Send;
}

// ── HTTP ────────────────────────────────────────────────────────────

impl AttendanceBackend for ClassCheckClient {
    async fn list_students(&self) -> Result<Vec<Student>, CoreError> {
        let raw = self.list_all_students().await?;
        Ok(raw.into_iter().map(Student::from).collect())
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, CoreError> {
        Ok(ClassCheckClient::get_student(self, id.get()).await?.into())
    }

    async fn create_student(&self, new: NewStudent) -> Result<Student, CoreError> {
        Ok(ClassCheckClient::create_student(self, &new.into())
            .await?
            .into())
    }

    async fn update_student(
        &self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Student, CoreError> {
        Ok(ClassCheckClient::update_student(self, id.get(), &update.into())
            .await?
            .into())
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), CoreError> {
        Ok(ClassCheckClient::delete_student(self, id.get()).await?)
    }

    async fn start_poll(&self, duration: PollDuration) -> Result<AttendancePoll, CoreError> {
        Ok(ClassCheckClient::start_poll(self, duration.minutes())
            .await?
            .into())
    }

    async fn current_status(&self) -> Result<PollStatus, CoreError> {
        Ok(self.current_poll().await?.into())
    }

    async fn mark_attendance(
        &self,
        student_id: StudentId,
        poll_id: PollId,
    ) -> Result<AttendanceRecord, CoreError> {
        Ok(
            ClassCheckClient::mark_attendance(self, student_id.get(), poll_id.get())
                .await?
                .into(),
        )
    }

    async fn poll_log(&self, poll_id: PollId) -> Result<AttendanceLog, CoreError> {
        Ok(ClassCheckClient::poll_log(self, poll_id.get()).await?.into())
    }

    async fn list_polls(&self, skip: u32, limit: u32) -> Result<Vec<AttendancePoll>, CoreError> {
        let raw = ClassCheckClient::list_polls(self, skip, limit).await?;
        Ok(raw.into_iter().map(AttendancePoll::from).collect())
    }

    async fn student_history(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        let raw = ClassCheckClient::student_history(self, student_id.get()).await?;
        Ok(raw.into_iter().map(AttendanceRecord::from).collect())
    }

    async fn health(&self) -> Result<ServiceHealth, CoreError> {
        let health = ClassCheckClient::health(self).await?;
        // The banner is informational; a missing one does not fail the check.
        let version = self.service_info().await.ok().and_then(|info| info.version);
        Ok(ServiceHealth {
            healthy: health.is_healthy(),
            status: health.status,
            version,
        })
    }
}

// ── In-memory ───────────────────────────────────────────────────────

fn to_usize(n: u32) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

impl<C: Clock> AttendanceBackend for AttendanceLedger<C> {
    async fn list_students(&self) -> Result<Vec<Student>, CoreError> {
        Ok(AttendanceLedger::list_students(self, 0, usize::MAX).await)
    }

    async fn get_student(&self, id: StudentId) -> Result<Student, CoreError> {
        AttendanceLedger::get_student(self, id).await
    }

    async fn create_student(&self, new: NewStudent) -> Result<Student, CoreError> {
        AttendanceLedger::create_student(self, new).await
    }

    async fn update_student(
        &self,
        id: StudentId,
        update: StudentUpdate,
    ) -> Result<Student, CoreError> {
        AttendanceLedger::update_student(self, id, &update).await
    }

    async fn delete_student(&self, id: StudentId) -> Result<(), CoreError> {
        AttendanceLedger::delete_student(self, id).await
    }

    async fn start_poll(&self, duration: PollDuration) -> Result<AttendancePoll, CoreError> {
        AttendanceLedger::start_poll(self, duration).await
    }

    async fn current_status(&self) -> Result<PollStatus, CoreError> {
        Ok(AttendanceLedger::current_status(self).await)
    }

    async fn mark_attendance(
        &self,
        student_id: StudentId,
        poll_id: PollId,
    ) -> Result<AttendanceRecord, CoreError> {
        self.mark(student_id, poll_id).await
    }

    async fn poll_log(&self, poll_id: PollId) -> Result<AttendanceLog, CoreError> {
        AttendanceLedger::poll_log(self, poll_id).await
    }

    async fn list_polls(&self, skip: u32, limit: u32) -> Result<Vec<AttendancePoll>, CoreError> {
        Ok(AttendanceLedger::list_polls(self, to_usize(skip), to_usize(limit)).await)
    }

    async fn student_history(
        &self,
        student_id: StudentId,
    ) -> Result<Vec<AttendanceRecord>, CoreError> {
        AttendanceLedger::student_history(self, student_id).await
    }

    async fn health(&self) -> Result<ServiceHealth, CoreError> {
        Ok(ServiceHealth {
            healthy: true,
            status: "healthy".into(),
            version: Some(env!("CARGO_PKG_VERSION").into()),
        })
    }
}
