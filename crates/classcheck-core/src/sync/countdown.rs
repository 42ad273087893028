// ── Local countdown ──
//
// Fine-grained display timer that runs between authoritative fetches.
// Every applied fetch overwrites it; it never smooths toward the server.

use serde::Serialize;
use strum::Display;

use crate::model::PollStatus;

/// Seconds at or below which the countdown is shown as a warning.
pub const WARNING_THRESHOLD_SECS: u64 = 60;
/// Seconds at or below which the countdown is shown as critical.
pub const CRITICAL_THRESHOLD_SECS: u64 = 30;

/// Display urgency for the remaining time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Urgency {
    Normal,
    Warning,
    Critical,
}

impl Urgency {
    pub fn for_remaining(secs: u64) -> Self {
        if secs <= CRITICAL_THRESHOLD_SECS {
            Self::Critical
        } else if secs <= WARNING_THRESHOLD_SECS {
            Self::Warning
        } else {
            Self::Normal
        }
    }
}

/// Outcome of one local tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Nothing is counting down.
    Idle,
    /// Still counting; carries the seconds left.
    Running(u64),
    /// Just hit zero. The caller should re-fetch rather than assume expiry.
    ReachedZero,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Countdown {
    remaining: u64,
    running: bool,
}

impl Countdown {
    /// Overwrite local state with an authoritative status.
    pub fn resync(&mut self, status: &PollStatus) {
        if status.is_active {
            self.remaining = status.remaining_seconds;
            self.running = status.remaining_seconds > 0;
        } else {
            self.remaining = 0;
            self.running = false;
        }
    }

    pub fn tick(&mut self) -> Tick {
        if !self.running {
            return Tick::Idle;
        }
        self.remaining = self.remaining.saturating_sub(1);
        if self.remaining == 0 {
            self.running = false;
            Tick::ReachedZero
        } else {
            Tick::Running(self.remaining)
        }
    }

    pub fn remaining(&self) -> u64 {
        self.remaining
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn urgency(&self) -> Urgency {
        Urgency::for_remaining(self.remaining)
    }

    /// `mm:ss`.
    pub fn display(&self) -> String {
        format_clock(self.remaining)
    }
}

/// Format seconds as zero-padded `mm:ss`.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PollId;

    fn active(remaining: u64) -> PollStatus {
        PollStatus {
            is_active: true,
            poll_id: Some(PollId::new(1)),
            start_time: None,
            end_time: None,
            remaining_seconds: remaining,
        }
    }

    #[test]
    fn ticks_down_to_zero_once() {
        let mut c = Countdown::default();
        c.resync(&active(2));
        assert_eq!(c.tick(), Tick::Running(1));
        assert_eq!(c.tick(), Tick::ReachedZero);
        assert_eq!(c.tick(), Tick::Idle);
    }

    #[test]
    fn resync_overwrites_local_value() {
        let mut c = Countdown::default();
        c.resync(&active(100));
        c.tick();
        c.tick();
        assert_eq!(c.remaining(), 98);

        c.resync(&active(120));
        assert_eq!(c.remaining(), 120);

        c.resync(&PollStatus::inactive());
        assert!(!c.is_running());
        assert_eq!(c.tick(), Tick::Idle);
    }

    #[test]
    fn clock_format() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(75), "01:15");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn urgency_thresholds() {
        assert_eq!(Urgency::for_remaining(61), Urgency::Normal);
        assert_eq!(Urgency::for_remaining(60), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(31), Urgency::Warning);
        assert_eq!(Urgency::for_remaining(30), Urgency::Critical);
        assert_eq!(Urgency::for_remaining(0), Urgency::Critical);
    }
}
