//! Attendance log handlers: poll history, per-poll summary and CSV export.

use std::fs::File;
use std::io::BufWriter;

use tabled::Tabled;

use classcheck_core::{AttendanceLog, AttendancePoll, AttendanceRecord, Controller, export};

use crate::cli::{GlobalOpts, LogsArgs, LogsCommand};
use crate::error::CliError;
use crate::output;

/// Page size when `--limit` is not given.
const DEFAULT_POLL_LIMIT: u32 = 100;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct PollRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Started")]
    start: String,
    #[tabled(rename = "Ends")]
    end: String,
    #[tabled(rename = "Minutes")]
    minutes: String,
    #[tabled(rename = "State")]
    state: String,
}

impl From<&AttendancePoll> for PollRow {
    fn from(p: &AttendancePoll) -> Self {
        Self {
            id: p.id.to_string(),
            start: output::format_time(p.start_time),
            end: output::format_time(p.end_time),
            minutes: p.duration_minutes.to_string(),
            state: p.phase_at(chrono::Utc::now()).to_string(),
        }
    }
}

#[derive(Tabled)]
struct RecordRow {
    #[tabled(rename = "Roll No")]
    roll_no: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Marked At")]
    marked_at: String,
}

impl From<&AttendanceRecord> for RecordRow {
    fn from(r: &AttendanceRecord) -> Self {
        Self {
            roll_no: r.student_roll_no.clone().unwrap_or_default(),
            name: r.student_name.clone().unwrap_or_default(),
            marked_at: output::format_time(r.marked_at),
        }
    }
}

fn log_detail(log: &AttendanceLog) -> String {
    let s = &log.summary;
    let mut out = [
        format!("Poll:        {}", log.poll_id),
        format!(
            "Window:      {} -> {}",
            output::format_time(log.start_time),
            output::format_time(log.end_time)
        ),
        format!(
            "Present:     {} / {} ({:.2}%)",
            s.present_count, s.total_students, s.attendance_percentage
        ),
        format!("Absent:      {}", s.absent_count),
    ]
    .join("\n");
    if !log.records.is_empty() {
        let rows: Vec<RecordRow> = log.records.iter().map(RecordRow::from).collect();
        out.push_str("\n\n");
        out.push_str(&output::render_table(&rows));
    }
    out
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: LogsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        LogsCommand::List(page) => {
            let polls = controller
                .list_polls(page.skip, page.limit.unwrap_or(DEFAULT_POLL_LIMIT))
                .await?;
            let out = output::render_list(&global.output, &polls, |p| PollRow::from(p), |p| {
                p.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LogsCommand::Show { poll_id } => {
            let log = controller.poll_log(poll_id).await?;
            let out = output::render_single(&global.output, &log, log_detail, |l| {
                l.records
                    .iter()
                    .filter_map(|r| r.student_roll_no.clone())
                    .collect::<Vec<_>>()
                    .join("\n")
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        LogsCommand::Export {
            poll_id,
            file,
            stdout,
        } => {
            if stdout {
                let log = controller.poll_log(poll_id).await?;
                export::write_csv(&log, std::io::stdout().lock())?;
                return Ok(());
            }
            let path = file.unwrap_or_else(|| export::default_filename(poll_id).into());
            let rows = controller
                .export_csv(poll_id, || File::create(&path).map(BufWriter::new))
                .await?;
            if !global.quiet {
                eprintln!("Wrote {rows} record(s) to {}", path.display());
            }
            Ok(())
        }
    }
}
