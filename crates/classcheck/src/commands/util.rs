//! Shared helpers for command handlers.

use std::io::IsTerminal;

use crate::error::CliError;

/// Prompt for confirmation, auto-approving if `--yes` was passed.
///
/// Without a terminal there is nobody to ask, so `--yes` becomes mandatory.
pub fn confirm(action: &str, message: &str, yes_flag: bool) -> Result<bool, CliError> {
    if yes_flag {
        return Ok(true);
    }
    if !std::io::stdin().is_terminal() {
        return Err(CliError::NonInteractiveRequiresYes {
            action: action.into(),
        });
    }
    dialoguer::Confirm::new()
        .with_prompt(message)
        .default(false)
        .interact()
        .map_err(prompt_err)
}

/// Map a dialoguer / interactive I/O failure into CliError.
pub fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

/// Apply `--skip` / `--limit` to an in-memory list.
pub fn page<T>(items: Vec<T>, skip: u32, limit: Option<u32>) -> Vec<T> {
    let skip = usize::try_from(skip).unwrap_or(usize::MAX);
    let limit = limit.map_or(usize::MAX, |l| usize::try_from(l).unwrap_or(usize::MAX));
    items.into_iter().skip(skip).take(limit).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_skips_then_limits() {
        let items: Vec<u32> = (1..=10).collect();
        assert_eq!(page(items.clone(), 2, Some(3)), vec![3, 4, 5]);
        assert_eq!(page(items.clone(), 0, None).len(), 10);
        assert!(page(items, 20, None).is_empty());
    }

    #[test]
    fn yes_flag_skips_the_prompt() {
        assert!(confirm("delete", "Really?", true).unwrap_or(false));
    }
}
