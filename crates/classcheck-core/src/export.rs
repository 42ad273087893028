// ── CSV export ──

use std::io::{self, Write};

use crate::model::{AttendanceLog, AttendanceRecord, PollId};

pub const CSV_HEADER: [&str; 4] = ["Roll No", "Name", "Status", "Marked At"];

const MARKED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub fn default_filename(poll_id: PollId) -> String {
    format!("attendance-{poll_id}.csv")
}

/// Quote a field if it contains a delimiter, quote or line break.
fn escape_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_owned()
    }
}

fn record_row(record: &AttendanceRecord) -> String {
    let marked_at = record.marked_at.format(MARKED_AT_FORMAT).to_string();
    [
        record.student_roll_no.as_deref().unwrap_or_default(),
        record.student_name.as_deref().unwrap_or_default(),
        "Present",
        marked_at.as_str(),
    ]
    .map(escape_field)
    .join(",")
}

/// Header plus one row per present student, lines joined with `\n`.
pub fn render_csv(log: &AttendanceLog) -> String {
    std::iter::once(CSV_HEADER.join(","))
        .chain(log.records.iter().map(record_row))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn write_csv<W: Write>(log: &AttendanceLog, mut out: W) -> io::Result<()> {
    out.write_all(render_csv(log).as_bytes())?;
    out.flush()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::{AttendanceSummary, RecordId, StudentId};

    fn record(id: u64, roll: &str, name: &str) -> AttendanceRecord {
        AttendanceRecord {
            id: RecordId::new(id),
            student_id: StudentId::new(id),
            poll_id: PollId::new(7),
            marked_at: Utc.with_ymd_and_hms(2024, 5, 1, 9, 2, 30).unwrap(),
            student_name: Some(name.into()),
            student_roll_no: Some(roll.into()),
        }
    }

    fn log(records: Vec<AttendanceRecord>) -> AttendanceLog {
        let present = u64::try_from(records.len()).unwrap();
        AttendanceLog {
            poll_id: PollId::new(7),
            start_time: Utc.with_ymd_and_hms(2024, 5, 1, 9, 0, 0).unwrap(),
            end_time: Utc.with_ymd_and_hms(2024, 5, 1, 9, 5, 0).unwrap(),
            summary: AttendanceSummary::compute(3, present),
            records,
        }
    }

    #[test]
    fn renders_header_and_rows() {
        let csv = render_csv(&log(vec![record(1, "CS001", "Ada Lovelace")]));
        assert_eq!(
            csv,
            "Roll No,Name,Status,Marked At\nCS001,Ada Lovelace,Present,2024-05-01 09:02:30"
        );
    }

    #[test]
    fn empty_log_is_header_only() {
        assert_eq!(render_csv(&log(vec![])), "Roll No,Name,Status,Marked At");
    }

    #[test]
    fn quotes_fields_with_delimiters() {
        let csv = render_csv(&log(vec![record(1, "CS001", "Smith, \"Jo\"")]));
        let row = csv.lines().nth(1).unwrap();
        assert_eq!(row, "CS001,\"Smith, \"\"Jo\"\"\",Present,2024-05-01 09:02:30");
    }

    #[test]
    fn writes_to_any_writer() {
        let mut buf = Vec::new();
        write_csv(&log(vec![record(2, "CS002", "Bo")]), &mut buf).unwrap();
        assert!(String::from_utf8(buf).unwrap().ends_with("CS002,Bo,Present,2024-05-01 09:02:30"));
    }

    #[test]
    fn filename_uses_poll_id() {
        assert_eq!(default_filename(PollId::new(42)), "attendance-42.csv");
    }
}
