//! Command dispatch: bridges CLI args -> controller calls -> output formatting.

pub mod config_cmd;
pub mod kiosk;
pub mod logs;
pub mod mark;
pub mod ping;
pub mod poll;
pub mod students;
pub mod util;

use classcheck_core::Controller;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch a service-bound command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    controller: &Controller,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Students(args) => students::handle(controller, args, global).await,
        Command::Poll(args) => poll::handle(controller, args, global).await,
        Command::Mark(args) => mark::handle(controller, args, global).await,
        Command::Kiosk => kiosk::handle(controller, global).await,
        Command::Logs(args) => logs::handle(controller, args, global).await,
        Command::Ping => ping::handle(controller, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => Err(CliError::Internal(
            "configuration commands do not need a service connection".into(),
        )),
    }
}
