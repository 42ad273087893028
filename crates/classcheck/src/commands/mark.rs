//! One-shot attendance marking by roll number.

use classcheck_core::{
    AttendanceRecord, Command as CoreCommand, CommandResult, Controller,
    submission::SUCCESS_MESSAGE,
};

use crate::cli::{GlobalOpts, MarkArgs, OutputFormat};
use crate::error::CliError;
use crate::output;

fn record_detail(r: &AttendanceRecord) -> String {
    let who = match (&r.student_name, &r.student_roll_no) {
        (Some(name), Some(roll)) => format!("{name} ({roll})"),
        _ => format!("student {}", r.student_id),
    };
    format!(
        "{SUCCESS_MESSAGE}\n{who} marked present in poll {} at {}",
        r.poll_id,
        output::format_time(r.marked_at)
    )
}

pub async fn handle(
    controller: &Controller,
    args: MarkArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let result = controller
        .execute(CoreCommand::MarkAttendance {
            roll_no: args.roll_no,
        })
        .await?;
    let CommandResult::Record(record) = result else {
        return Err(CliError::Internal(format!(
            "unexpected command result: {result:?}"
        )));
    };

    let out = match global.output {
        OutputFormat::Plain => SUCCESS_MESSAGE.to_owned(),
        _ => output::render_single(&global.output, &record, record_detail, |r| {
            r.id.to_string()
        })?,
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
