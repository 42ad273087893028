//! Student check-in terminal.
//!
//! Shows the live poll status and accepts one roll number per line until
//! `:q`, end of input or Ctrl-C. With no terminal attached, roll numbers are
//! read from stdin, one per line.

use std::io::IsTerminal;
use std::time::Duration;

use owo_colors::OwoColorize;
use tokio::io::{AsyncBufReadExt, BufReader};

use classcheck_core::{AttendanceForm, Controller, NoticeKind, PollPhase, StatusView};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

/// Roster refresh period while the kiosk is open.
const ROSTER_REFRESH: Duration = Duration::from_secs(30);

const QUIT: &str = ":q";

fn banner(view: &StatusView, roster_size: usize, color: bool) -> String {
    let state = match view.phase() {
        PollPhase::Active => format!(
            "Attendance is open: {} remaining",
            output::paint_clock(&view.clock(), view.urgency(), color)
        ),
        phase => output::paint_phase(phase, color),
    };
    format!("{state}  [{roster_size} students]")
}

async fn next_line(
    interactive: bool,
    lines: &mut tokio::io::Lines<BufReader<tokio::io::Stdin>>,
) -> Result<Option<String>, CliError> {
    if !interactive {
        return Ok(lines.next_line().await?);
    }
    let entered = tokio::task::spawn_blocking(|| {
        dialoguer::Input::<String>::new()
            .with_prompt(format!("Roll number ({QUIT} to quit)"))
            .allow_empty(true)
            .interact_text()
    })
    .await
    .map_err(|e| CliError::Internal(format!("prompt task failed: {e}")))?
    .map_err(prompt_err)?;
    Ok(Some(entered))
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let interactive = std::io::stdin().is_terminal();

    if let Err(e) = controller.refresh_roster().await {
        tracing::warn!(error = %e, "initial roster load failed");
    }
    controller.start_roster_refresh(ROSTER_REFRESH).await;

    let roster = controller.students();
    let status = controller.watch_status();
    let mut rx = status.subscribe();
    // Marking against an unsynced view would always report no poll.
    let _ = rx
        .wait_for(|v| v.is_synced() || v.last_error.is_some())
        .await;

    let mut form = AttendanceForm::new();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if interactive && !global.quiet {
            eprintln!("{}", banner(&status.current(), roster.latest().len(), color));
        }

        let Some(entered) = next_line(interactive, &mut lines).await? else {
            break;
        };
        if entered == QUIT {
            break;
        }

        form.set_input(entered);
        if !form.can_submit() {
            continue;
        }
        let view = status.current();
        let _ = form
            .submit(controller.backend().as_ref(), controller.roster(), &view.status)
            .await;

        if let Some(notice) = form.notice() {
            let text = match (notice.kind, color) {
                (NoticeKind::Success, true) => notice.message.green().to_string(),
                (NoticeKind::Error, true) => notice.message.red().to_string(),
                (_, false) => notice.message.clone(),
            };
            output::print_output(&text, global.quiet);
        }
    }

    status.shutdown().await;
    Ok(())
}
