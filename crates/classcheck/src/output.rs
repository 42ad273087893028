//! Output formatting: table, JSON, YAML, plain.
//!
//! Renders data in the format selected by `--output`. Table uses `tabled`,
//! structured formats use serde, plain emits one identifier per line.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use tabled::{Table, Tabled, settings::Style};

use classcheck_core::{PollPhase, Urgency};

use crate::cli::{ColorMode, OutputFormat};
use crate::error::CliError;

// ── Color helpers ────────────────────────────────────────────────────

/// Determine whether color output should be enabled.
pub fn should_color(mode: &ColorMode) -> bool {
    match mode {
        ColorMode::Always => true,
        ColorMode::Never => false,
        ColorMode::Auto => io::stdout().is_terminal() && std::env::var("NO_COLOR").is_err(),
    }
}

/// Countdown text tinted by urgency.
pub fn paint_clock(clock: &str, urgency: Urgency, color: bool) -> String {
    if !color {
        return clock.to_owned();
    }
    match urgency {
        Urgency::Normal => clock.green().to_string(),
        Urgency::Warning => clock.yellow().to_string(),
        Urgency::Critical => clock.red().bold().to_string(),
    }
}

pub fn paint_phase(phase: PollPhase, color: bool) -> String {
    let label = match phase {
        PollPhase::Active => "Active",
        PollPhase::Expired => "Expired",
        PollPhase::NoPoll => "No Active Poll",
    };
    if !color {
        return label.to_owned();
    }
    match phase {
        PollPhase::Active => label.green().to_string(),
        PollPhase::Expired => label.dimmed().to_string(),
        PollPhase::NoPoll => label.yellow().to_string(),
    }
}

// ── Render dispatchers ───────────────────────────────────────────────

/// Render a list of serde-serializable + tabled items in the chosen format.
///
/// - `table`: uses the `Tabled` derive to build a pretty table
/// - `json` / `json-compact`: serializes the original data via serde
/// - `yaml`: serializes via serde_yaml
/// - `plain`: calls `id_fn` on each item to emit one identifier per line
pub fn render_list<T, R>(
    format: &OutputFormat,
    data: &[T],
    to_row: impl Fn(&T) -> R,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
    R: Tabled,
{
    Ok(match format {
        OutputFormat::Table => {
            let rows: Vec<R> = data.iter().map(to_row).collect();
            render_table(&rows)
        }
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => data.iter().map(&id_fn).collect::<Vec<_>>().join("\n"),
    })
}

/// Render a single serde-serializable item in the chosen format.
///
/// Table rendering uses a custom `detail_fn` that returns a pre-formatted string,
/// since single-item detail views don't use `Tabled` derive.
pub fn render_single<T>(
    format: &OutputFormat,
    data: &T,
    detail_fn: impl Fn(&T) -> String,
    id_fn: impl Fn(&T) -> String,
) -> Result<String, CliError>
where
    T: serde::Serialize,
{
    Ok(match format {
        OutputFormat::Table => detail_fn(data),
        OutputFormat::Json => serde_json::to_string_pretty(data)?,
        OutputFormat::JsonCompact => serde_json::to_string(data)?,
        OutputFormat::Yaml => serde_yaml::to_string(data)?,
        OutputFormat::Plain => id_fn(data),
    })
}

/// Print the rendered output to stdout, respecting quiet mode.
pub fn print_output(output: &str, quiet: bool) {
    if quiet || output.is_empty() {
        return;
    }
    let mut stdout = io::stdout().lock();
    let _ = writeln!(stdout, "{output}");
}

pub fn render_table<R: Tabled>(rows: &[R]) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

/// `YYYY-MM-DD HH:MM:SS` in UTC.
pub fn format_time(ts: chrono::DateTime<chrono::Utc>) -> String {
    ts.format("%Y-%m-%d %H:%M:%S").to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde::Serialize;

    use super::*;

    #[derive(Serialize)]
    struct Item {
        id: u64,
        name: &'static str,
    }

    #[derive(Tabled)]
    struct Row {
        #[tabled(rename = "Name")]
        name: String,
    }

    fn items() -> Vec<Item> {
        vec![Item { id: 1, name: "Ada" }, Item { id: 2, name: "Bo" }]
    }

    #[test]
    fn plain_emits_one_id_per_line() {
        let out = render_list(
            &OutputFormat::Plain,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        )
        .unwrap();
        assert_eq!(out, "1\n2");
    }

    #[test]
    fn compact_json_is_single_line() {
        let out = render_list(
            &OutputFormat::JsonCompact,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        )
        .unwrap();
        assert_eq!(out, r#"[{"id":1,"name":"Ada"},{"id":2,"name":"Bo"}]"#);
    }

    #[test]
    fn table_has_headers() {
        let out = render_list(
            &OutputFormat::Table,
            &items(),
            |i| Row { name: i.name.into() },
            |i| i.id.to_string(),
        )
        .unwrap();
        assert!(out.contains("Name"));
        assert!(out.contains("Ada"));
    }

    #[test]
    fn uncolored_clock_is_untouched() {
        assert_eq!(paint_clock("04:59", Urgency::Critical, false), "04:59");
        assert_eq!(paint_phase(PollPhase::NoPoll, false), "No Active Poll");
    }
}
