// ── Domain model ──
//
// Canonical types shared by the API conversion layer, the in-memory
// ledger, the sync tasks and the CLI renderers.

pub mod attendance;
pub mod ids;
pub mod poll;
pub mod student;

pub use attendance::{AttendanceLog, AttendanceRecord, AttendanceSummary};
pub use ids::{PollId, RecordId, StudentId};
pub use poll::{AttendancePoll, PollStatus};
pub use student::{NewStudent, Student, StudentUpdate};
