// ── Attendance submission ──
//
// Roll number in, attendance record out. Local checks run in a fixed order
// and the marking endpoint is only contacted when all of them pass.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info};

use crate::backend::AttendanceBackend;
use crate::error::{CoreError, MARK_FALLBACK_MESSAGE};
use crate::model::{AttendanceRecord, PollStatus};
use crate::store::RosterStore;

/// How long the success confirmation stays visible.
pub const CONFIRMATION_TTL: Duration = Duration::from_secs(3);

pub const SUCCESS_MESSAGE: &str = "Attendance marked successfully!";

/// Mark the student with this exact roll number present in the open poll.
///
/// Fails without contacting the service when the input is empty, when
/// `status` has no open poll, or when no roster entry matches.
pub async fn submit_attendance<B: AttendanceBackend>(
    backend: &B,
    roster: &RosterStore,
    status: &PollStatus,
    roll_no: &str,
) -> Result<AttendanceRecord, CoreError> {
    if roll_no.is_empty() {
        return Err(CoreError::ValidationFailed {
            message: "Roll number is required".into(),
        });
    }
    let Some(poll_id) = status.active_poll() else {
        return Err(CoreError::NoActivePoll);
    };
    let Some(student) = roster.find_by_roll(roll_no) else {
        debug!(roll_no, "roll number not on roster");
        return Err(CoreError::StudentNotFound {
            roll_no: roll_no.to_owned(),
        });
    };

    let record = backend.mark_attendance(student.id, poll_id).await?;
    info!(student_id = %student.id, %poll_id, "attendance marked");
    Ok(record)
}

// ── Form state ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Success,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    expires_at: Option<Instant>,
}

impl Notice {
    fn success() -> Self {
        Self {
            kind: NoticeKind::Success,
            message: SUCCESS_MESSAGE.into(),
            expires_at: Some(Instant::now() + CONFIRMATION_TTL),
        }
    }

    fn error(message: String) -> Self {
        Self {
            kind: NoticeKind::Error,
            message,
            expires_at: None,
        }
    }

    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| Instant::now() >= at)
    }
}

/// State of the student-facing marking form.
#[derive(Debug, Default)]
pub struct AttendanceForm {
    input: String,
    submitting: bool,
    notice: Option<Notice>,
}

impl AttendanceForm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, value: impl Into<String>) {
        self.input = value.into();
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting
    }

    pub fn can_submit(&self) -> bool {
        !self.submitting && !self.input.is_empty()
    }

    /// The current notice, unless a confirmation has timed out.
    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref().filter(|n| !n.is_expired())
    }

    /// Submit the current input once. Nothing is retried.
    pub async fn submit<B: AttendanceBackend>(
        &mut self,
        backend: &B,
        roster: &RosterStore,
        status: &PollStatus,
    ) -> Result<AttendanceRecord, CoreError> {
        self.notice = None;
        self.submitting = true;
        let result = submit_attendance(backend, roster, status, &self.input).await;
        self.submitting = false;

        match &result {
            Ok(_) => {
                self.input.clear();
                self.notice = Some(Notice::success());
            }
            Err(e) => {
                self.notice = Some(Notice::error(e.user_message(MARK_FALLBACK_MESSAGE)));
            }
        }
        result
    }
}
