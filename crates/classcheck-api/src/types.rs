// Wire types for the ClassCheck REST API.
//
// Field names mirror the JSON payloads exactly. Timestamps arrive as
// ISO-8601 strings that may omit the UTC offset; see [`timestamp`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ── Students ────────────────────────────────────────────────────────

/// A roster entry as returned by `/students/`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StudentResponse {
    pub id: u64,
    pub name: String,
    pub roll_no: String,
    pub department: String,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// Body of `POST /students/`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StudentCreateRequest {
    pub name: String,
    pub roll_no: String,
    pub department: String,
}

/// Body of `PUT /students/{id}`. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StudentUpdateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub roll_no: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
}

// ── Polls ───────────────────────────────────────────────────────────

/// Body of `POST /attendance/start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollStartRequest {
    pub duration_minutes: u32,
}

/// A poll as returned by `/attendance/start` and `/attendance/logs`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollResponse {
    pub id: u64,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    pub duration_minutes: u32,
    pub is_active: bool,
    #[serde(with = "timestamp")]
    pub created_at: DateTime<Utc>,
}

/// `GET /attendance/current`. Only `is_active` is present when no poll runs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PollStatusResponse {
    pub is_active: bool,
    #[serde(default)]
    pub poll_id: Option<u64>,
    #[serde(default, with = "timestamp::option")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, with = "timestamp::option")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub remaining_seconds: Option<i64>,
}

// ── Attendance ──────────────────────────────────────────────────────

/// Body of `POST /attendance/mark`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MarkRequest {
    pub student_id: u64,
    pub poll_id: u64,
}

/// One attendance record, with the student's name and roll number
/// denormalized in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceRecordResponse {
    pub id: u64,
    pub student_id: u64,
    pub poll_id: u64,
    #[serde(with = "timestamp")]
    pub marked_at: DateTime<Utc>,
    #[serde(default)]
    pub student_name: Option<String>,
    #[serde(default)]
    pub student_roll_no: Option<String>,
}

/// `GET /attendance/logs/{poll_id}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendanceLogResponse {
    pub poll_id: u64,
    #[serde(with = "timestamp")]
    pub start_time: DateTime<Utc>,
    #[serde(with = "timestamp")]
    pub end_time: DateTime<Utc>,
    pub total_students: u64,
    pub present_count: u64,
    pub absent_count: i64,
    pub attendance_percentage: f64,
    #[serde(default)]
    pub records: Vec<AttendanceRecordResponse>,
}

// ── Service ─────────────────────────────────────────────────────────

/// `GET /`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceInfo {
    pub message: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub docs: Option<String>,
}

/// `GET /health`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

impl HealthResponse {
    pub fn is_healthy(&self) -> bool {
        self.status.eq_ignore_ascii_case("healthy")
    }
}

// ── Timestamp codec ─────────────────────────────────────────────────

/// Lenient ISO-8601 timestamps.
///
/// Accepts RFC 3339 (`2024-05-01T09:00:00Z`, `+05:30` offsets) as well as
/// offset-less values (`2024-05-01T09:00:00.123456`), which the service emits
/// for naive UTC datetimes. Serializes as RFC 3339 in UTC.
pub mod timestamp {
    use chrono::{DateTime, NaiveDateTime, Utc};
    use serde::{Deserialize, Deserializer, Serializer};

    const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

    /// Parse a timestamp string, treating offset-less values as UTC.
    pub fn parse(raw: &str) -> Option<DateTime<Utc>> {
        if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
            return Some(dt.with_timezone(&Utc));
        }
        NAIVE_FORMATS
            .iter()
            .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
            .map(|naive| naive.and_utc())
    }

    pub fn serialize<S: Serializer>(value: &DateTime<Utc>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&value.to_rfc3339())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<DateTime<Utc>, D::Error> {
        let raw = String::deserialize(d)?;
        parse(&raw).ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {raw:?}")))
    }

    pub mod option {
        use chrono::{DateTime, Utc};
        use serde::{Deserialize, Deserializer, Serializer};

        #[allow(clippy::ref_option)]
        pub fn serialize<S: Serializer>(
            value: &Option<DateTime<Utc>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match value {
                Some(dt) => super::serialize(dt, s),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<DateTime<Utc>>, D::Error> {
            Option::<String>::deserialize(d)?
                .map(|raw| {
                    super::parse(&raw).ok_or_else(|| {
                        serde::de::Error::custom(format!("invalid timestamp: {raw:?}"))
                    })
                })
                .transpose()
        }
    }
}
