// ── Poll lifecycle ──
//
// NoPoll -> Active -> Expired. Entering Active needs a validated duration;
// leaving it is a pure function of wall-clock time. Expired is terminal for
// a given poll; a new poll is a new entity.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::{AttendancePoll, PollStatus};

/// Where a poll is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PollPhase {
    NoPoll,
    Active,
    Expired,
}

// ── PollDuration ────────────────────────────────────────────────────

/// Poll length in whole minutes, guaranteed to be within
/// [`PollDuration::MIN_MINUTES`]..=[`PollDuration::MAX_MINUTES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct PollDuration(u32);

impl PollDuration {
    pub const MIN_MINUTES: u32 = 1;
    pub const MAX_MINUTES: u32 = 60;

    pub fn from_minutes(minutes: i64) -> Result<Self, CoreError> {
        u32::try_from(minutes)
            .ok()
            .filter(|m| (Self::MIN_MINUTES..=Self::MAX_MINUTES).contains(m))
            .map(Self)
            .ok_or_else(|| CoreError::ValidationFailed {
                message: format!(
                    "poll duration must be between {} and {} minutes (got {minutes})",
                    Self::MIN_MINUTES,
                    Self::MAX_MINUTES
                ),
            })
    }

    pub const fn minutes(self) -> u32 {
        self.0
    }

    pub fn as_chrono(self) -> chrono::Duration {
        chrono::Duration::minutes(i64::from(self.0))
    }

    /// `start + duration`.
    pub fn end_time(self, start: DateTime<Utc>) -> DateTime<Utc> {
        start + self.as_chrono()
    }
}

impl TryFrom<u32> for PollDuration {
    type Error = CoreError;

    fn try_from(minutes: u32) -> Result<Self, Self::Error> {
        Self::from_minutes(i64::from(minutes))
    }
}

impl FromStr for PollDuration {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let minutes: i64 = s.trim().parse().map_err(|_| CoreError::ValidationFailed {
            message: format!("poll duration must be a whole number of minutes (got {s:?})"),
        })?;
        Self::from_minutes(minutes)
    }
}

impl fmt::Display for PollDuration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.0)
    }
}

// ── Projection ──────────────────────────────────────────────────────

/// `max(0, end - now)` in whole seconds, truncated toward zero.
pub fn remaining_seconds(end_time: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    u64::try_from((end_time - now).num_seconds()).unwrap_or(0)
}

/// Phase of an optional current poll at `now`.
pub fn phase_at(poll: Option<&AttendancePoll>, now: DateTime<Utc>) -> PollPhase {
    poll.map_or(PollPhase::NoPoll, |p| p.phase_at(now))
}

/// Project the status view of `poll` at `now`.
///
/// `is_active` is `remaining_seconds > 0 && poll.active`; the poll's
/// identity and window are reported even after it has expired.
pub fn project_status(poll: Option<&AttendancePoll>, now: DateTime<Utc>) -> PollStatus {
    let Some(poll) = poll else {
        return PollStatus::inactive();
    };
    let remaining = poll.remaining_seconds_at(now);
    PollStatus {
        is_active: remaining > 0 && poll.active,
        poll_id: Some(poll.id),
        start_time: Some(poll.start_time),
        end_time: Some(poll.end_time),
        remaining_seconds: remaining,
    }
}
