//! Attendance logic between `classcheck-api` and the CLI.
//!
//! This crate owns the domain model, the poll lifecycle rules and the live
//! synchronization used by the ClassCheck front ends:
//!
//! - **[`Controller`]**: Facade over an [`AttendanceBackend`]. Validates
//!   input, keeps the [`RosterStore`] current, routes [`Command`]s and vends
//!   the live views.
//!
//! - **Lifecycle** ([`lifecycle`]): `NoPoll → Active → Expired` as a pure
//!   function of time, plus the validated [`PollDuration`].
//!
//! - **[`AttendanceLedger`]**: In-memory service with an injectable
//!   [`Clock`]. Enforces the same rules as the HTTP service and implements
//!   the same backend trait.
//!
//! - **Live views** ([`sync`]): Generation-tagged periodic refresh with a
//!   local one-second countdown ([`StatusSync`]) and the admin attendance
//!   board ([`PollingSync`] of [`BoardSnapshot`]).
//!
//! - **Submission and export**: Roll-number marking with local
//!   pre-checks ([`submission`]) and CSV rendering of a poll log ([`export`]).

pub mod backend;
pub mod clock;
pub mod command;
pub mod config;
pub mod controller;
pub mod convert;
pub mod error;
pub mod export;
pub mod ledger;
pub mod lifecycle;
pub mod model;
pub mod store;
pub mod stream;
pub mod submission;
pub mod sync;

// ── Primary re-exports ──────────────────────────────────────────────
pub use backend::{AttendanceBackend, ServiceHealth};
pub use clock::{Clock, ManualClock, SystemClock};
pub use command::{Command, CommandResult};
pub use config::{ClientConfig, DEFAULT_API_URL, TlsVerification};
pub use controller::Controller;
pub use error::{CoreError, MARK_FALLBACK_MESSAGE};
pub use ledger::AttendanceLedger;
pub use lifecycle::{PollDuration, PollPhase};
pub use store::RosterStore;
pub use stream::{Roster, RosterStream};
pub use submission::{AttendanceForm, Notice, NoticeKind};
pub use sync::{
    BoardSnapshot, PollingSync, StatusSync, StatusView, SyncTiming, Synced, Urgency,
};

pub use model::{
    AttendanceLog, AttendancePoll, AttendanceRecord, AttendanceSummary, NewStudent, PollId,
    PollStatus, RecordId, Student, StudentId, StudentUpdate,
};
