//! Service health check.

use classcheck_core::{Controller, ServiceHealth};

use crate::cli::GlobalOpts;
use crate::error::CliError;
use crate::output;

fn detail(h: &ServiceHealth, url: &str) -> String {
    let mut lines = vec![format!("{url}: {}", h.status)];
    if let Some(ref version) = h.version {
        lines.push(format!("Version: {version}"));
    }
    lines.join("\n")
}

pub async fn handle(controller: &Controller, global: &GlobalOpts) -> Result<(), CliError> {
    let url = controller.config().url.to_string();
    let health = controller.health().await?;
    let out = output::render_single(
        &global.output,
        &health,
        |h| detail(h, &url),
        |h| h.status.clone(),
    )?;
    output::print_output(&out, global.quiet);
    if health.healthy {
        Ok(())
    } else {
        Err(CliError::ApiError {
            status: None,
            message: format!("service reports '{}'", health.status),
        })
    }
}
