// ── Core error types ──
//
// User-facing errors from classcheck-core. Consumers never match on HTTP
// status codes; the `From<classcheck_api::Error>` impl sorts transport
// failures into validation, conflict, not-found and connectivity variants
// while keeping the service's own detail text.

use thiserror::Error;

/// Shown when a mark attempt fails without a message from the service.
pub const MARK_FALLBACK_MESSAGE: &str = "Failed to mark attendance";

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Connection errors ────────────────────────────────────────────
    #[error("Cannot reach ClassCheck service at {url}: {reason}")]
    ConnectionFailed { url: String, reason: String },

    /// `timeout_secs` is `None` when the limit that fired is not known.
    #[error("{}", timeout_message(*timeout_secs))]
    Timeout { timeout_secs: Option<u64> },

    #[error("Not authorized: {message}")]
    Unauthorized { message: String },

    // ── Validation ───────────────────────────────────────────────────
    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    // ── Not found ────────────────────────────────────────────────────
    /// No roster entry has this exact roll number.
    #[error("Student not found. Please check your roll number.")]
    StudentNotFound { roll_no: String },

    /// The service reported a missing entity; `message` is its text.
    #[error("{message}")]
    NotFound { message: String },

    // ── Lifecycle conflicts ──────────────────────────────────────────
    /// Attempted to mark while no poll is open.
    #[error("No Active Poll")]
    NoActivePoll,

    #[error("{message}")]
    PollAlreadyActive { message: String },

    /// The targeted poll expired (or has not started).
    #[error("{message}")]
    PollNotActive { message: String },

    /// Any other state conflict (duplicate roll number, referenced student).
    #[error("{message}")]
    Conflict { message: String },

    // ── API errors (wrapped, not exposed raw) ────────────────────────
    #[error("API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    // ── Internal errors ──────────────────────────────────────────────
    #[error("Internal error: {0}")]
    Internal(String),
}

fn timeout_message(timeout_secs: Option<u64>) -> String {
    match timeout_secs {
        Some(secs) => format!("Request timed out after {secs}s"),
        None => "Request timed out".to_owned(),
    }
}

impl CoreError {
    pub fn poll_already_active() -> Self {
        Self::PollAlreadyActive {
            message: "An attendance poll is already active".into(),
        }
    }

    pub fn poll_not_active() -> Self {
        Self::PollNotActive {
            message: "Poll has expired or not yet started".into(),
        }
    }

    /// Message suitable for showing to the person who triggered the action.
    ///
    /// Anything the service said is passed through verbatim; locally detected
    /// problems use their own text; transport and internal failures collapse
    /// to `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::ConnectionFailed { .. } | Self::Timeout { .. } | Self::Internal(_) => {
                fallback.to_owned()
            }
            Self::Api { message, .. } if message.is_empty() => fallback.to_owned(),
            Self::Api { message, .. } => message.clone(),
            Self::ValidationFailed { message }
            | Self::Unauthorized { message }
            | Self::Config { message } => message.clone(),
            other => other.to_string(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. } | Self::StudentNotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::PollAlreadyActive { .. }
                | Self::PollNotActive { .. }
                | Self::NoActivePoll
                | Self::Conflict { .. }
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<classcheck_api::Error> for CoreError {
    fn from(err: classcheck_api::Error) -> Self {
        use classcheck_api::Error as ApiError;

        match err {
            ApiError::Api { status, detail } => classify_rejection(status, detail),
            ApiError::Unauthorized { detail, .. } => Self::Unauthorized { message: detail },
            ApiError::InvalidToken(message) => Self::Config { message },
            ApiError::Transport(ref e) => {
                if e.is_timeout() {
                    Self::Timeout { timeout_secs: None }
                } else if e.is_connect() || e.is_request() {
                    Self::ConnectionFailed {
                        url: e
                            .url()
                            .map_or_else(|| "<unknown>".into(), ToString::to_string),
                        reason: e.to_string(),
                    }
                } else {
                    Self::Api {
                        message: e.to_string(),
                        status: e.status().map(|s| s.as_u16()),
                    }
                }
            }
            ApiError::InvalidUrl(e) => Self::Config {
                message: format!("Invalid URL: {e}"),
            },
            ApiError::Timeout { timeout_secs } => Self::Timeout {
                timeout_secs: Some(timeout_secs),
            },
            ApiError::Tls(msg) => Self::ConnectionFailed {
                url: String::new(),
                reason: format!("TLS error: {msg}"),
            },
            ApiError::Deserialization { message, body: _ } => {
                Self::Internal(format!("Deserialization error: {message}"))
            }
        }
    }
}

/// Sort a non-success response into a domain variant, keeping the detail.
fn classify_rejection(status: u16, detail: String) -> CoreError {
    let lowered = detail.to_ascii_lowercase();
    match status {
        404 => CoreError::NotFound { message: detail },
        422 => CoreError::ValidationFailed { message: detail },
        400 | 409 if lowered.contains("expired") || lowered.contains("not yet started") => {
            CoreError::PollNotActive { message: detail }
        }
        400 | 409 if lowered.contains("already active") => {
            CoreError::PollAlreadyActive { message: detail }
        }
        400 | 409 => CoreError::Conflict { message: detail },
        _ => CoreError::Api {
            message: detail,
            status: Some(status),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn api(status: u16, detail: &str) -> CoreError {
        classcheck_api::Error::Api {
            status,
            detail: detail.into(),
        }
        .into()
    }

    #[test]
    fn expired_poll_maps_to_poll_not_active() {
        let err = api(400, "Poll has expired or not yet started");
        assert!(matches!(err, CoreError::PollNotActive { .. }));
        assert_eq!(
            err.user_message(MARK_FALLBACK_MESSAGE),
            "Poll has expired or not yet started"
        );
    }

    #[test]
    fn duplicate_roll_is_conflict() {
        let err = api(400, "Roll number already registered");
        assert!(err.is_conflict());
        assert_eq!(err.to_string(), "Roll number already registered");
    }

    #[test]
    fn timeout_message_mentions_only_a_known_limit() {
        let known: CoreError = classcheck_api::Error::Timeout { timeout_secs: 15 }.into();
        assert_eq!(known.to_string(), "Request timed out after 15s");

        let unknown = CoreError::Timeout { timeout_secs: None };
        assert_eq!(unknown.to_string(), "Request timed out");
    }

    #[test]
    fn already_active_conflict() {
        assert!(matches!(
            api(409, "An attendance poll is already active"),
            CoreError::PollAlreadyActive { .. }
        ));
    }

    #[test]
    fn not_found_keeps_detail() {
        let err = api(404, "Poll not found");
        assert!(err.is_not_found());
        assert_eq!(err.user_message("x"), "Poll not found");
    }

    #[test]
    fn network_failures_use_fallback() {
        let err = CoreError::ConnectionFailed {
            url: "http://localhost:8000".into(),
            reason: "refused".into(),
        };
        assert_eq!(
            err.user_message(MARK_FALLBACK_MESSAGE),
            MARK_FALLBACK_MESSAGE
        );
        let err = CoreError::Internal("bad json".into());
        assert_eq!(err.user_message("generic"), "generic");
    }

    #[test]
    fn server_errors_surface_detail() {
        assert_eq!(api(500, "database locked").user_message("x"), "database locked");
        assert_eq!(api(500, "").user_message("fallback"), "fallback");
    }

    #[test]
    fn local_lookup_failures_have_fixed_text() {
        let err = CoreError::StudentNotFound {
            roll_no: "CS999".into(),
        };
        assert_eq!(
            err.user_message(MARK_FALLBACK_MESSAGE),
            "Student not found. Please check your roll number."
        );
        assert_eq!(CoreError::NoActivePoll.user_message("x"), "No Active Poll");
    }
}
