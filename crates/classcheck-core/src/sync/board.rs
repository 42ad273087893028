// ── Live attendance board ──
//
// Admin view: current status plus the running log of the open poll,
// re-fetched on a fixed two-second period.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::backend::AttendanceBackend;
use crate::error::CoreError;
use crate::model::{AttendanceLog, PollStatus};

pub const BOARD_REFRESH: Duration = Duration::from_secs(2);

pub(crate) const BOARD_FALLBACK_MESSAGE: &str = "Failed to load attendance";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BoardSnapshot {
    pub status: PollStatus,
    /// Log of the open poll; `None` while nothing is open.
    pub log: Option<AttendanceLog>,
}

impl BoardSnapshot {
    pub fn present(&self) -> u64 {
        self.log.as_ref().map_or(0, |l| l.summary.present_count)
    }

    pub fn total(&self) -> u64 {
        self.log.as_ref().map_or(0, |l| l.summary.total_students)
    }
}

/// One board refresh: status first, then the log of whatever is open.
pub async fn fetch_board<B: AttendanceBackend>(
    backend: Arc<B>,
) -> Result<BoardSnapshot, CoreError> {
    let status = backend.current_status().await?;
    let log = match status.active_poll() {
        Some(poll_id) => Some(backend.poll_log(poll_id).await?),
        None => None,
    };
    Ok(BoardSnapshot { status, log })
}
