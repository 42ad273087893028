//! Poll command handlers: start, one-shot status and the live watch view.

use std::io::IsTerminal;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use tokio::sync::watch;

use classcheck_core::{
    AttendancePoll, BoardSnapshot, Command as CoreCommand, CommandResult, Controller, PollPhase,
    PollStatus, PollingSync, StatusView, Synced, Urgency, sync::format_clock,
};

use crate::cli::{GlobalOpts, OutputFormat, PollArgs, PollCommand};
use crate::error::CliError;
use crate::output;

// ── Detail views ────────────────────────────────────────────────────

fn poll_detail(p: &AttendancePoll) -> String {
    [
        format!("Poll:      {}", p.id),
        format!("Duration:  {} min", p.duration_minutes),
        format!("Starts:    {}", output::format_time(p.start_time)),
        format!("Ends:      {}", output::format_time(p.end_time)),
    ]
    .join("\n")
}

fn status_detail(s: &PollStatus, color: bool) -> String {
    let mut lines = vec![format!(
        "Status:     {}",
        output::paint_phase(s.phase(), color)
    )];
    if let Some(id) = s.poll_id {
        lines.push(format!("Poll:       {id}"));
    }
    if s.is_active {
        let clock = format_clock(s.remaining_seconds);
        let urgency = Urgency::for_remaining(s.remaining_seconds);
        lines.push(format!(
            "Remaining:  {}",
            output::paint_clock(&clock, urgency, color)
        ));
    }
    if let Some(end) = s.end_time {
        lines.push(format!("Ends:       {}", output::format_time(end)));
    }
    lines.join("\n")
}

/// One-line summary for the watch view.
fn status_line(view: &StatusView, board: Option<&Synced<BoardSnapshot>>, color: bool) -> String {
    if !view.is_synced() {
        return view
            .last_error
            .clone()
            .unwrap_or_else(|| "Connecting...".into());
    }

    let mut line = match view.phase() {
        PollPhase::Active => format!(
            "{}  {} remaining",
            output::paint_phase(PollPhase::Active, color),
            output::paint_clock(&view.clock(), view.urgency(), color)
        ),
        PollPhase::Expired => format!(
            "{}  poll {} closed",
            output::paint_phase(PollPhase::Expired, color),
            view.status.poll_id.map(|id| id.to_string()).unwrap_or_default()
        ),
        PollPhase::NoPoll => output::paint_phase(PollPhase::NoPoll, color),
    };

    if let Some(snapshot) = board.and_then(|b| b.value.as_ref()) {
        line.push_str(&format!(
            "  |  {}/{} present",
            snapshot.present(),
            snapshot.total()
        ));
    }
    if let Some(ref err) = view.last_error {
        line.push_str(&format!("  ({err})"));
    }
    line
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    controller: &Controller,
    args: PollArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        PollCommand::Start { duration } => {
            let result = controller
                .execute(CoreCommand::StartPoll { duration })
                .await?;
            let CommandResult::Poll(poll) = result else {
                return Err(CliError::Internal(format!(
                    "unexpected command result: {result:?}"
                )));
            };
            if !global.quiet {
                eprintln!("Attendance poll started for {duration}");
            }
            let out =
                output::render_single(&global.output, &poll, poll_detail, |p| p.id.to_string())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PollCommand::Status => {
            let status = controller.current_status().await?;
            let color = output::should_color(&global.color);
            let out = output::render_single(
                &global.output,
                &status,
                |s| status_detail(s, color),
                |s| s.phase().to_string(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        PollCommand::Watch {
            board,
            exit_on_close,
        } => watch(controller, board, exit_on_close, global).await,
    }
}

// ── Watch ───────────────────────────────────────────────────────────

async fn board_changed(rx: &mut Option<watch::Receiver<Synced<BoardSnapshot>>>) {
    match rx {
        Some(inner) => {
            if inner.changed().await.is_err() {
                *rx = None;
            }
        }
        None => std::future::pending().await,
    }
}

fn spinner() -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}

async fn watch(
    controller: &Controller,
    with_board: bool,
    exit_on_close: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let status = if with_board {
        controller.watch_admin_status()
    } else {
        controller.watch_status()
    };
    let board = with_board.then(|| controller.watch_board());

    let mut status_rx = status.subscribe();
    let mut board_rx = board.as_ref().map(PollingSync::subscribe);

    let live = matches!(global.output, OutputFormat::Table)
        && !global.quiet
        && std::io::stderr().is_terminal();
    let pb = live.then(spinner);
    let mut printed_generation = 0;

    loop {
        let view = status_rx.borrow_and_update().clone();
        let snapshot = board_rx.as_mut().map(|rx| rx.borrow_and_update().clone());

        if let Some(ref pb) = pb {
            pb.set_message(status_line(&view, snapshot.as_ref(), color));
        } else if view.is_synced() && view.generation != printed_generation {
            printed_generation = view.generation;
            let out = match global.output {
                OutputFormat::Table | OutputFormat::Plain => {
                    status_line(&view, snapshot.as_ref(), color)
                }
                _ => output::render_single(
                    &global.output,
                    &view.status,
                    |_| String::new(),
                    |_| String::new(),
                )?,
            };
            output::print_output(&out, global.quiet);
        }

        if exit_on_close && view.is_synced() && view.phase() != PollPhase::Active {
            break;
        }

        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = status_rx.changed() => {
                if changed.is_err() {
                    break;
                }
            }
            () = board_changed(&mut board_rx) => {}
        }
    }

    if let Some(pb) = pb {
        pb.finish_and_clear();
        let view = status.current();
        let snapshot = board.as_ref().map(PollingSync::current);
        output::print_output(&status_line(&view, snapshot.as_ref(), color), global.quiet);
    }
    status.shutdown().await;
    if let Some(board) = board {
        board.shutdown().await;
    }
    Ok(())
}
