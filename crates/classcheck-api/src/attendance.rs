// Attendance poll and marking endpoints

use tracing::debug;

use crate::client::ClassCheckClient;
use crate::error::Error;
use crate::types::{
    AttendanceLogResponse, AttendanceRecordResponse, MarkRequest, PollResponse, PollStartRequest,
    PollStatusResponse,
};

impl ClassCheckClient {
    /// Start a time-boxed poll.
    ///
    /// `POST /attendance/start` with `{"duration_minutes": N}`
    pub async fn start_poll(&self, duration_minutes: u32) -> Result<PollResponse, Error> {
        debug!(duration_minutes, "starting poll");
        self.post("attendance/start", &PollStartRequest { duration_minutes })
            .await
    }

    /// Status of the currently active poll, if any.
    ///
    /// `GET /attendance/current`
    pub async fn current_poll(&self) -> Result<PollStatusResponse, Error> {
        self.get("attendance/current").await
    }

    /// Mark a student present for a poll. Repeating the call for the same
    /// pair returns the existing record.
    ///
    /// `POST /attendance/mark`
    pub async fn mark_attendance(
        &self,
        student_id: u64,
        poll_id: u64,
    ) -> Result<AttendanceRecordResponse, Error> {
        debug!(student_id, poll_id, "marking attendance");
        self.post(
            "attendance/mark",
            &MarkRequest {
                student_id,
                poll_id,
            },
        )
        .await
    }

    /// Aggregate log for a single poll.
    ///
    /// `GET /attendance/logs/{poll_id}`
    pub async fn poll_log(&self, poll_id: u64) -> Result<AttendanceLogResponse, Error> {
        self.get(&format!("attendance/logs/{poll_id}")).await
    }

    /// Past and present polls, newest first.
    ///
    /// `GET /attendance/logs?skip={skip}&limit={limit}`
    pub async fn list_polls(&self, skip: u32, limit: u32) -> Result<Vec<PollResponse>, Error> {
        debug!(skip, limit, "listing polls");
        self.get_with_params(
            "attendance/logs",
            &[("skip", skip.to_string()), ("limit", limit.to_string())],
        )
        .await
    }

    /// `GET /attendance/student/{student_id}`
    pub async fn student_history(
        &self,
        student_id: u64,
    ) -> Result<Vec<AttendanceRecordResponse>, Error> {
        self.get(&format!("attendance/student/{student_id}")).await
    }
}
