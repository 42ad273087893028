//! Student roster command handlers.

use tabled::Tabled;

use classcheck_core::{
    AttendanceRecord, Command as CoreCommand, CommandResult, Controller, NewStudent, Student,
    StudentUpdate,
};

use crate::cli::{GlobalOpts, StudentsArgs, StudentsCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Table rows ──────────────────────────────────────────────────────

#[derive(Tabled)]
struct StudentRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Roll No")]
    roll_no: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Department")]
    department: String,
}

impl From<&Student> for StudentRow {
    fn from(s: &Student) -> Self {
        Self {
            id: s.id.to_string(),
            roll_no: s.roll_no.clone(),
            name: s.name.clone(),
            department: s.department.clone(),
        }
    }
}

#[derive(Tabled)]
struct HistoryRow {
    #[tabled(rename = "Poll")]
    poll_id: String,
    #[tabled(rename = "Marked At")]
    marked_at: String,
}

impl From<&AttendanceRecord> for HistoryRow {
    fn from(r: &AttendanceRecord) -> Self {
        Self {
            poll_id: r.poll_id.to_string(),
            marked_at: output::format_time(r.marked_at),
        }
    }
}

fn detail(s: &Student) -> String {
    [
        format!("ID:          {}", s.id),
        format!("Name:        {}", s.name),
        format!("Roll No:     {}", s.roll_no),
        format!("Department:  {}", s.department),
        format!("Created:     {}", output::format_time(s.created_at)),
    ]
    .join("\n")
}

fn expect_student(result: CommandResult) -> Result<Student, CliError> {
    match result {
        CommandResult::Student(s) => Ok(s),
        other => Err(CliError::Internal(format!(
            "unexpected command result: {other:?}"
        ))),
    }
}

fn print_student(student: &Student, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, student, detail, |s| s.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: StudentsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        StudentsCommand::List(page) => {
            let students = util::page(controller.list_students().await?, page.skip, page.limit);
            let out = output::render_list(
                &global.output,
                &students,
                |s| StudentRow::from(s),
                |s| s.roll_no.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        StudentsCommand::Get { id } => {
            let student = controller.get_student(id).await?;
            print_student(&student, global)
        }

        StudentsCommand::Create {
            name,
            roll_no,
            department,
        } => {
            let new = NewStudent {
                name,
                roll_no,
                department,
            };
            let student = expect_student(
                controller
                    .execute(CoreCommand::CreateStudent(new))
                    .await?,
            )?;
            if !global.quiet {
                eprintln!("Student {} created", student.id);
            }
            print_student(&student, global)
        }

        StudentsCommand::Update {
            id,
            name,
            roll_no,
            department,
        } => {
            let update = StudentUpdate {
                name,
                roll_no,
                department,
            };
            let student = expect_student(
                controller
                    .execute(CoreCommand::UpdateStudent { id, update })
                    .await?,
            )?;
            print_student(&student, global)
        }

        StudentsCommand::Delete { id } => {
            if !util::confirm(
                "students delete",
                &format!("Delete student {id}? This cannot be undone."),
                global.yes,
            )? {
                return Ok(());
            }
            controller.execute(CoreCommand::DeleteStudent { id }).await?;
            if !global.quiet {
                eprintln!("Student {id} deleted");
            }
            Ok(())
        }

        StudentsCommand::History { id } => {
            let records = controller.student_history(id).await?;
            let out = output::render_list(
                &global.output,
                &records,
                |r| HistoryRow::from(r),
                |r| r.poll_id.to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }
    }
}
