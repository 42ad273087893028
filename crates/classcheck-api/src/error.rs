use thiserror::Error;

/// Top-level error type for the `classcheck-api` crate.
///
/// Covers transport failures, structured API rejections (FastAPI-style
/// `{"detail": ...}` bodies) and payload decoding. `classcheck-core` maps
/// these into domain errors with user-facing messages.
#[derive(Debug, Error)]
pub enum Error {
    // ── Authentication ──────────────────────────────────────────────
    /// The service rejected the request credentials (HTTP 401/403).
    #[error("Unauthorized (HTTP {status}): {detail}")]
    Unauthorized { status: u16, detail: String },

    /// The configured bearer token cannot be used as a header value.
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    // ── Transport ───────────────────────────────────────────────────
    /// HTTP transport error (connection refused, DNS failure, etc.)
    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// URL parsing error.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// Request timed out.
    #[error("Request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u64 },

    /// TLS handshake, certificate, or client-construction error.
    #[error("TLS error: {0}")]
    Tls(String),

    // ── API ─────────────────────────────────────────────────────────
    /// Non-success response from the service. `detail` is the server's
    /// own message when the body carried one, otherwise the status text.
    #[error("API error (HTTP {status}): {detail}")]
    Api { status: u16, detail: String },

    // ── Data ────────────────────────────────────────────────────────
    /// JSON deserialization failed, with the raw body for debugging.
    #[error("Deserialization error: {message}")]
    Deserialization { message: String, body: String },
}

impl Error {
    /// Returns `true` if this is a transient error worth retrying.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            Self::Api { status, .. } => *status >= 500,
            _ => false,
        }
    }

    /// Returns `true` if this is a "not found" error.
    pub fn is_not_found(&self) -> bool {
        match self {
            Self::Transport(e) => e.status() == Some(reqwest::StatusCode::NOT_FOUND),
            Self::Api { status: 404, .. } => true,
            _ => false,
        }
    }

    /// Returns `true` if the service refused the request because of its
    /// current state (HTTP 400 business-rule rejections and 409).
    pub fn is_conflict(&self) -> bool {
        matches!(self, Self::Api { status: 400 | 409, .. })
    }

    /// Returns `true` if the service rejected the request body (HTTP 422).
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Api { status: 422, .. })
    }

    /// The server-supplied detail message, if this error carries one.
    pub fn detail(&self) -> Option<&str> {
        match self {
            Self::Api { detail, .. } | Self::Unauthorized { detail, .. } => Some(detail),
            _ => None,
        }
    }

    /// HTTP status of the failed response, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Api { status, .. } | Self::Unauthorized { status, .. } => Some(*status),
            Self::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }
}
