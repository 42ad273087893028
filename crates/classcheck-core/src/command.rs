// ── Command API ──
//
// Every state-changing request flows through one `Command` enum so the
// CLI and interactive front ends share the same validation and routing.

use crate::lifecycle::PollDuration;
use crate::model::{AttendancePoll, AttendanceRecord, NewStudent, Student, StudentId, StudentUpdate};

/// All write operations against the attendance service.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Roster ───────────────────────────────────────────────────────
    CreateStudent(NewStudent),
    UpdateStudent { id: StudentId, update: StudentUpdate },
    DeleteStudent { id: StudentId },

    // ── Polls ────────────────────────────────────────────────────────
    StartPoll { duration: PollDuration },

    // ── Attendance ───────────────────────────────────────────────────
    /// Resolve a roll number against the roster and mark it present in
    /// the open poll.
    MarkAttendance { roll_no: String },
}

/// Result of a command execution.
#[derive(Debug)]
pub enum CommandResult {
    Ok,
    Student(Student),
    Poll(AttendancePoll),
    Record(AttendanceRecord),
}
