// ClassCheck REST client
//
// Wraps `reqwest::Client` with base-URL handling and FastAPI-style error
// decoding. Endpoint groups (students, attendance, service) are inherent
// methods in separate files; this module only deals with transport mechanics.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::auth::Credentials;
use crate::error::Error;
use crate::transport::TransportConfig;

// ── Error response shape ────────────────────────────────────────────

/// `{"detail": "..."}` for handled errors, `{"detail": [{loc, msg}, ...]}`
/// for request validation failures.
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    detail: Option<ErrorDetail>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum ErrorDetail {
    Message(String),
    Issues(Vec<ValidationIssue>),
    Other(serde_json::Value),
}

#[derive(Deserialize)]
struct ValidationIssue {
    #[serde(default)]
    loc: Vec<serde_json::Value>,
    msg: String,
}

impl ErrorDetail {
    fn into_message(self) -> String {
        match self {
            Self::Message(msg) => msg,
            Self::Issues(issues) => issues
                .into_iter()
                .map(|issue| match issue.loc.last().and_then(serde_json::Value::as_str) {
                    Some(field) => format!("{field}: {}", issue.msg),
                    None => issue.msg,
                })
                .collect::<Vec<_>>()
                .join("; "),
            Self::Other(value) => value.to_string(),
        }
    }
}

// ── Client ───────────────────────────────────────────────────────────

/// Async client for the ClassCheck attendance service.
///
/// All paths are resolved relative to the base URL, so a service mounted
/// under a prefix (`https://host/classcheck/`) works unchanged.
pub struct ClassCheckClient {
    http: reqwest::Client,
    base_url: Url,
    timeout_secs: u64,
}

impl ClassCheckClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build a client from a base URL, credentials, and transport config.
    pub fn new(
        base_url: &str,
        credentials: &Credentials,
        transport: &TransportConfig,
    ) -> Result<Self, Error> {
        let http = transport.build_client_with_headers(credentials.headers()?)?;
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: transport.timeout_secs(),
        })
    }

    /// Wrap an existing `reqwest::Client` (caller manages auth headers).
    pub fn with_client(http: reqwest::Client, base_url: &str) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self {
            http,
            base_url,
            timeout_secs: TransportConfig::default().timeout_secs(),
        })
    }

    /// The service base URL (always ends in `/`).
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw.trim())?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    /// Join a relative path (e.g. `"students/"`) onto the base URL.
    pub(crate) fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path)?)
    }

    // ── HTTP verbs ───────────────────────────────────────────────────

    pub(crate) async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url}");

        let resp = self.send(self.http.get(url)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn get_with_params<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("GET {url} params={params:?}");

        let resp = self.send(self.http.get(url).query(params)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn post<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("POST {url}");

        let resp = self.send(self.http.post(url).json(body)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn put<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(path)?;
        debug!("PUT {url}");

        let resp = self.send(self.http.put(url).json(body)).await?;
        self.handle_response(resp).await
    }

    pub(crate) async fn delete(&self, path: &str) -> Result<(), Error> {
        let url = self.url(path)?;
        debug!("DELETE {url}");

        let resp = self.send(self.http.delete(url)).await?;
        self.handle_empty(resp).await
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response, Error> {
        request.send().await.map_err(|e| self.transport_error(e))
    }

    /// Timeouts carry the configured limit whether they hit while sending
    /// or while reading the body.
    fn transport_error(&self, e: reqwest::Error) -> Error {
        if e.is_timeout() {
            Error::Timeout {
                timeout_secs: self.timeout_secs,
            }
        } else {
            Error::Transport(e)
        }
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        resp: reqwest::Response,
    ) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await.map_err(|e| self.transport_error(e))?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn handle_empty(&self, resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(self.parse_error(status, resp).await)
        }
    }

    async fn parse_error(&self, status: reqwest::StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorResponse>(&raw)
            .ok()
            .and_then(|body| body.detail)
            .map(ErrorDetail::into_message)
            .unwrap_or_else(|| {
                status
                    .canonical_reason()
                    .map_or_else(|| status.to_string(), str::to_owned)
            });

        debug!(status = status.as_u16(), %detail, "request rejected");

        match status {
            reqwest::StatusCode::UNAUTHORIZED | reqwest::StatusCode::FORBIDDEN => {
                Error::Unauthorized {
                    status: status.as_u16(),
                    detail,
                }
            }
            _ => Error::Api {
                status: status.as_u16(),
                detail,
            },
        }
    }
}
