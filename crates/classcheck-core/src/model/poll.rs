// ── Poll domain types ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PollId;
use crate::lifecycle::{self, PollPhase};

/// A time-boxed attendance window.
///
/// Whether the poll is open is a function of wall-clock time; see
/// [`AttendancePoll::phase_at`]. The `active` flag only records that the
/// owning service has not closed it early.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendancePoll {
    pub id: PollId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AttendancePoll {
    /// Lifecycle phase at `now`. Never `NoPoll`.
    ///
    /// Open only while at least one whole second remains, so this agrees
    /// with the `is_active` flag of [`lifecycle::project_status`].
    pub fn phase_at(&self, now: DateTime<Utc>) -> PollPhase {
        if self.active && self.start_time <= now && self.remaining_seconds_at(now) > 0 {
            PollPhase::Active
        } else {
            PollPhase::Expired
        }
    }

    /// Whole seconds left at `now`, floored at zero.
    pub fn remaining_seconds_at(&self, now: DateTime<Utc>) -> u64 {
        lifecycle::remaining_seconds(self.end_time, now)
    }
}

/// Read-only projection of the current poll, recomputed on every query.
///
/// Two observers computing it a moment apart may disagree right at the
/// expiry boundary; the owning service's answer to a mark request decides.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollStatus {
    pub is_active: bool,
    pub poll_id: Option<PollId>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub remaining_seconds: u64,
}

impl PollStatus {
    /// Status when no poll is running.
    pub const fn inactive() -> Self {
        Self {
            is_active: false,
            poll_id: None,
            start_time: None,
            end_time: None,
            remaining_seconds: 0,
        }
    }

    pub fn phase(&self) -> PollPhase {
        match (self.poll_id, self.is_active) {
            (None, _) => PollPhase::NoPoll,
            (Some(_), true) => PollPhase::Active,
            (Some(_), false) => PollPhase::Expired,
        }
    }

    /// The poll a mark request should target, if marking is open.
    pub fn active_poll(&self) -> Option<PollId> {
        if self.is_active { self.poll_id } else { None }
    }
}

impl Default for PollStatus {
    fn default() -> Self {
        Self::inactive()
    }
}
