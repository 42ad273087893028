// ── Wire -> domain conversion ──
//
// Maps `classcheck_api::types` payloads onto canonical model types and
// normalizes the status projection so `is_active` implies time remains.

use classcheck_api::types::{
    AttendanceLogResponse, AttendanceRecordResponse, PollResponse, PollStatusResponse,
    StudentCreateRequest, StudentResponse, StudentUpdateRequest,
};

use crate::model::{
    AttendanceLog, AttendancePoll, AttendanceRecord, AttendanceSummary, NewStudent, PollId,
    PollStatus, RecordId, Student, StudentId, StudentUpdate,
};

impl From<StudentResponse> for Student {
    fn from(s: StudentResponse) -> Self {
        Self {
            id: StudentId::new(s.id),
            name: s.name,
            roll_no: s.roll_no,
            department: s.department,
            created_at: s.created_at,
        }
    }
}

impl From<NewStudent> for StudentCreateRequest {
    fn from(s: NewStudent) -> Self {
        Self {
            name: s.name,
            roll_no: s.roll_no,
            department: s.department,
        }
    }
}

impl From<StudentUpdate> for StudentUpdateRequest {
    fn from(u: StudentUpdate) -> Self {
        Self {
            name: u.name,
            roll_no: u.roll_no,
            department: u.department,
        }
    }
}

impl From<PollResponse> for AttendancePoll {
    fn from(p: PollResponse) -> Self {
        Self {
            id: PollId::new(p.id),
            start_time: p.start_time,
            end_time: p.end_time,
            duration_minutes: p.duration_minutes,
            active: p.is_active,
            created_at: p.created_at,
        }
    }
}

impl From<PollStatusResponse> for PollStatus {
    fn from(s: PollStatusResponse) -> Self {
        let remaining = s
            .remaining_seconds
            .and_then(|r| u64::try_from(r).ok())
            .unwrap_or(0);
        Self {
            is_active: s.is_active && remaining > 0 && s.poll_id.is_some(),
            poll_id: s.poll_id.map(PollId::new),
            start_time: s.start_time,
            end_time: s.end_time,
            remaining_seconds: remaining,
        }
    }
}

impl From<AttendanceRecordResponse> for AttendanceRecord {
    fn from(r: AttendanceRecordResponse) -> Self {
        Self {
            id: RecordId::new(r.id),
            student_id: StudentId::new(r.student_id),
            poll_id: PollId::new(r.poll_id),
            marked_at: r.marked_at,
            student_name: r.student_name,
            student_roll_no: r.student_roll_no,
        }
    }
}

impl From<AttendanceLogResponse> for AttendanceLog {
    /// Absent count and percentage are re-derived from the two raw counts.
    fn from(l: AttendanceLogResponse) -> Self {
        Self {
            poll_id: PollId::new(l.poll_id),
            start_time: l.start_time,
            end_time: l.end_time,
            summary: AttendanceSummary::compute(l.total_students, l.present_count),
            records: l.records.into_iter().map(AttendanceRecord::from).collect(),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Utc;

    use super::*;

    #[test]
    fn active_flag_with_zero_remaining_is_inactive() {
        let wire = PollStatusResponse {
            is_active: true,
            poll_id: Some(3),
            start_time: Some(Utc::now()),
            end_time: Some(Utc::now()),
            remaining_seconds: Some(0),
        };
        let status = PollStatus::from(wire);
        assert!(!status.is_active);
        assert_eq!(status.poll_id, Some(PollId::new(3)));
    }

    #[test]
    fn negative_remaining_clamps_to_zero() {
        let wire = PollStatusResponse {
            is_active: true,
            poll_id: Some(3),
            start_time: None,
            end_time: None,
            remaining_seconds: Some(-12),
        };
        assert_eq!(PollStatus::from(wire).remaining_seconds, 0);
    }

    #[test]
    fn log_counts_are_rederived() {
        let wire = AttendanceLogResponse {
            poll_id: 1,
            start_time: Utc::now(),
            end_time: Utc::now(),
            total_students: 4,
            present_count: 1,
            absent_count: 99,
            attendance_percentage: 0.0,
            records: Vec::new(),
        };
        let log = AttendanceLog::from(wire);
        assert_eq!(log.summary.absent_count, 3);
        assert!((log.summary.attendance_percentage - 25.0).abs() < 1e-9);
    }
}
