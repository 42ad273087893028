// ── Attendance records and aggregates ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{AttendancePoll, PollId, RecordId, StudentId};

/// Proof that a student was marked present for a poll. At most one exists
/// per (student, poll) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttendanceRecord {
    pub id: RecordId,
    pub student_id: StudentId,
    pub poll_id: PollId,
    pub marked_at: DateTime<Utc>,
    pub student_name: Option<String>,
    pub student_roll_no: Option<String>,
}

/// Headcount for one poll.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AttendanceSummary {
    pub total_students: u64,
    pub present_count: u64,
    pub absent_count: u64,
    pub attendance_percentage: f64,
}

impl AttendanceSummary {
    /// Derive absent count and percentage from the two raw counts.
    ///
    /// `total` is raised to `present` if the roster shrank below the
    /// number of records, so `present + absent == total` always holds.
    /// The percentage is rounded to two decimals and is 0 for an empty roster.
    #[allow(clippy::cast_precision_loss, clippy::as_conversions)]
    pub fn compute(total: u64, present: u64) -> Self {
        let total = total.max(present);
        let percentage = if total == 0 {
            0.0
        } else {
            (present as f64 / total as f64 * 100.0 * 100.0).round() / 100.0
        };
        Self {
            total_students: total,
            present_count: present,
            absent_count: total - present,
            attendance_percentage: percentage,
        }
    }
}

/// Aggregate view over one poll with its full record list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceLog {
    pub poll_id: PollId,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(flatten)]
    pub summary: AttendanceSummary,
    pub records: Vec<AttendanceRecord>,
}

impl AttendanceLog {
    /// Build a log for `poll` given the roster size and its records.
    pub fn summarize(
        poll: &AttendancePoll,
        total_students: u64,
        records: Vec<AttendanceRecord>,
    ) -> Self {
        let present = u64::try_from(records.len()).unwrap_or(u64::MAX);
        Self {
            poll_id: poll.id,
            start_time: poll.start_time,
            end_time: poll.end_time,
            summary: AttendanceSummary::compute(total_students, present),
            records,
        }
    }

    pub fn is_present(&self, student: StudentId) -> bool {
        self.records.iter().any(|r| r.student_id == student)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn half_present() {
        let s = AttendanceSummary::compute(2, 1);
        assert_eq!(s.absent_count, 1);
        assert!((s.attendance_percentage - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_roster_is_zero_percent() {
        let s = AttendanceSummary::compute(0, 0);
        assert_eq!(s.present_count + s.absent_count, s.total_students);
        assert!(s.attendance_percentage.abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_rounds_to_two_decimals() {
        let s = AttendanceSummary::compute(3, 1);
        assert!((s.attendance_percentage - 33.33).abs() < 1e-9);
        let s = AttendanceSummary::compute(3, 2);
        assert!((s.attendance_percentage - 66.67).abs() < 1e-9);
    }

    #[test]
    fn counts_always_balance() {
        for total in 0..20u64 {
            for present in 0..25u64 {
                let s = AttendanceSummary::compute(total, present);
                assert_eq!(s.present_count + s.absent_count, s.total_students);
                assert!(s.attendance_percentage <= 100.0);
            }
        }
    }
}
