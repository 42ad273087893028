//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` variants into user-facing errors with actionable help text.

use miette::Diagnostic;
use thiserror::Error;

use classcheck_config::ConfigError;
use classcheck_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const NOT_FOUND: i32 = 4;
    pub const CONFLICT: i32 = 6;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const POLL_NOT_ACTIVE: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Connection ───────────────────────────────────────────────────

    #[error("Could not connect to ClassCheck service at {url}")]
    #[diagnostic(
        code(classcheck::connection_failed),
        help(
            "Check that the service is running and reachable.\n\
             Reason: {reason}\n\
             Try: classcheck ping --api-url http://localhost:8000"
        )
    )]
    ConnectionFailed { url: String, reason: String },

    // ── Authentication ───────────────────────────────────────────────

    #[error("Not authorized: {message}")]
    #[diagnostic(
        code(classcheck::auth_failed),
        help(
            "Check the bearer token for this profile.\n\
             Run: classcheck config set-token"
        )
    )]
    AuthFailed { message: String },

    // ── Resources ────────────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(classcheck::not_found),
        help("Run: classcheck {list_command} to see what exists")
    )]
    NotFound {
        message: String,
        list_command: String,
    },

    #[error("Student not found. Please check your roll number.")]
    #[diagnostic(
        code(classcheck::student_not_found),
        help("Roll numbers match exactly, including case. No roster entry is '{roll_no}'.")
    )]
    StudentNotFound { roll_no: String },

    #[error("{message}")]
    #[diagnostic(code(classcheck::conflict))]
    Conflict { message: String },

    // ── Poll lifecycle ───────────────────────────────────────────────

    #[error("{message}")]
    #[diagnostic(
        code(classcheck::poll_already_active),
        help("Wait for it to close. Follow it with: classcheck poll watch")
    )]
    PollAlreadyActive { message: String },

    #[error("No Active Poll")]
    #[diagnostic(
        code(classcheck::no_active_poll),
        help("Attendance can only be marked while a poll is open. Start one with: classcheck poll start")
    )]
    NoActivePoll,

    #[error("{message}")]
    #[diagnostic(code(classcheck::poll_not_active))]
    PollNotActive { message: String },

    // ── API ──────────────────────────────────────────────────────────

    #[error("API error{}: {message}", .status.map(|s| format!(" ({s})")).unwrap_or_default())]
    #[diagnostic(code(classcheck::api_error))]
    ApiError { status: Option<u16>, message: String },

    // ── Validation ───────────────────────────────────────────────────

    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(classcheck::validation))]
    Validation { field: String, reason: String },

    // ── Configuration ────────────────────────────────────────────────

    #[error("Profile '{name}' not found in configuration")]
    #[diagnostic(
        code(classcheck::profile_not_found),
        help(
            "Available profiles: {available}\n\
             Create one with: classcheck config init"
        )
    )]
    ProfileNotFound { name: String, available: String },

    #[error(transparent)]
    #[diagnostic(code(classcheck::config))]
    Config(#[from] ConfigError),

    // ── Interactive ──────────────────────────────────────────────────

    #[error("Destructive operation '{action}' requires confirmation")]
    #[diagnostic(
        code(classcheck::confirmation_required),
        help("Use --yes (-y) to skip confirmation in non-interactive contexts.")
    )]
    NonInteractiveRequiresYes { action: String },

    // ── Timeout ──────────────────────────────────────────────────────

    #[error("{}", timeout_message(*seconds))]
    #[diagnostic(
        code(classcheck::timeout),
        help("Increase timeout with --timeout or check service responsiveness.")
    )]
    Timeout { seconds: Option<u64> },

    // ── Internal / IO / Serialization ────────────────────────────────

    #[error("{0}")]
    #[diagnostic(code(classcheck::internal))]
    Internal(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Failed to render JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Failed to render YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

fn timeout_message(seconds: Option<u64>) -> String {
    match seconds {
        Some(secs) => format!("Request timed out after {secs}s"),
        None => "Request timed out".to_owned(),
    }
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } => exit_code::CONNECTION,
            Self::AuthFailed { .. } => exit_code::AUTH,
            Self::NotFound { .. } | Self::StudentNotFound { .. } => exit_code::NOT_FOUND,
            Self::Conflict { .. } | Self::PollAlreadyActive { .. } => exit_code::CONFLICT,
            Self::NoActivePoll | Self::PollNotActive { .. } => exit_code::POLL_NOT_ACTIVE,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::Validation { .. } | Self::NonInteractiveRequiresYes { .. } => exit_code::USAGE,
            _ => exit_code::GENERAL,
        }
    }
}

// ── CoreError → CliError mapping ─────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::ConnectionFailed { url, reason } => CliError::ConnectionFailed { url, reason },

            CoreError::Timeout { timeout_secs } => CliError::Timeout {
                seconds: timeout_secs,
            },

            CoreError::Unauthorized { message } => CliError::AuthFailed { message },

            CoreError::ValidationFailed { message } => CliError::Validation {
                field: "input".into(),
                reason: message,
            },

            CoreError::StudentNotFound { roll_no } => CliError::StudentNotFound { roll_no },

            CoreError::NotFound { message } => {
                let list_command = if message.to_ascii_lowercase().contains("poll") {
                    "logs list"
                } else {
                    "students list"
                };
                CliError::NotFound {
                    message,
                    list_command: list_command.into(),
                }
            }

            CoreError::NoActivePoll => CliError::NoActivePoll,
            CoreError::PollAlreadyActive { message } => CliError::PollAlreadyActive { message },
            CoreError::PollNotActive { message } => CliError::PollNotActive { message },
            CoreError::Conflict { message } => CliError::Conflict { message },

            CoreError::Api { message, status } => CliError::ApiError { status, message },

            CoreError::Config { message } => CliError::Validation {
                field: "config".into(),
                reason: message,
            },

            CoreError::Internal(message) => CliError::Internal(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lifecycle_errors_have_stable_exit_codes() {
        assert_eq!(CliError::from(CoreError::NoActivePoll).exit_code(), 9);
        assert_eq!(
            CliError::from(CoreError::poll_not_active()).exit_code(),
            exit_code::POLL_NOT_ACTIVE
        );
        assert_eq!(
            CliError::from(CoreError::poll_already_active()).exit_code(),
            exit_code::CONFLICT
        );
        assert_eq!(
            CliError::from(CoreError::StudentNotFound {
                roll_no: "X".into()
            })
            .exit_code(),
            exit_code::NOT_FOUND
        );
    }

    #[test]
    fn timeout_without_known_limit_omits_duration() {
        let err = CliError::from(CoreError::Timeout { timeout_secs: None });
        assert_eq!(err.to_string(), "Request timed out");
        assert_eq!(err.exit_code(), exit_code::TIMEOUT);

        let err = CliError::from(CoreError::Timeout {
            timeout_secs: Some(30),
        });
        assert_eq!(err.to_string(), "Request timed out after 30s");
    }

    #[test]
    fn service_detail_is_shown_verbatim() {
        let err = CliError::from(CoreError::Conflict {
            message: "Roll number already registered".into(),
        });
        assert_eq!(err.to_string(), "Roll number already registered");
        assert_eq!(err.exit_code(), exit_code::CONFLICT);
    }

    #[test]
    fn missing_poll_points_at_logs_list() {
        let err = CliError::from(CoreError::NotFound {
            message: "Poll not found".into(),
        });
        let CliError::NotFound { list_command, .. } = err else {
            panic!("expected not found");
        };
        assert_eq!(list_command, "logs list");
    }
}
