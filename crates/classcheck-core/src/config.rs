// ── Runtime connection configuration ──
//
// How to reach a ClassCheck service and how often the live views refresh.
// Never touches disk: the CLI builds a `ClientConfig` from its profile and
// hands it in.

use std::path::PathBuf;
use std::time::Duration;

use classcheck_api::{Credentials, TlsMode, TransportConfig};
use url::Url;

use crate::sync::{BOARD_REFRESH, SyncTiming};

pub const DEFAULT_API_URL: &str = "http://localhost:8000";

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store.
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(PathBuf),
    /// Skip verification.
    DangerAcceptInvalid,
}

impl From<TlsVerification> for TlsMode {
    fn from(tls: TlsVerification) -> Self {
        match tls {
            TlsVerification::SystemDefaults => Self::System,
            TlsVerification::CustomCa(path) => Self::CustomCa(path),
            TlsVerification::DangerAcceptInvalid => Self::DangerAcceptInvalid,
        }
    }
}

/// Configuration for talking to one service.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub url: Url,
    pub credentials: Credentials,
    pub tls: TlsVerification,
    pub timeout: Duration,
    /// Student status view refresh period.
    pub status_interval: Duration,
    /// Admin board refresh period.
    pub board_interval: Duration,
    /// Local countdown step.
    pub tick: Duration,
}

impl ClientConfig {
    pub fn new(url: Url) -> Self {
        Self {
            url,
            credentials: Credentials::Anonymous,
            tls: TlsVerification::default(),
            timeout: Duration::from_secs(30),
            status_interval: Duration::from_secs(3),
            board_interval: BOARD_REFRESH,
            tick: Duration::from_secs(1),
        }
    }

    pub fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: self.tls.clone().into(),
            timeout: self.timeout,
        }
    }

    pub fn status_timing(&self) -> SyncTiming {
        SyncTiming {
            refresh: self.status_interval,
            tick: self.tick,
        }
    }

    pub fn board_timing(&self) -> SyncTiming {
        SyncTiming {
            refresh: self.board_interval,
            tick: self.tick,
        }
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        let url = Url::parse(DEFAULT_API_URL).unwrap_or_else(|_| unreachable!());
        Self::new(url)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_stock_views() {
        let config = ClientConfig::default();
        assert_eq!(config.url.as_str(), "http://localhost:8000/");
        assert_eq!(config.status_timing().refresh, Duration::from_secs(3));
        assert_eq!(config.board_timing().refresh, Duration::from_secs(2));
        assert_eq!(config.tick, Duration::from_secs(1));
        assert!(config.credentials.is_anonymous());
    }

    #[test]
    fn tls_maps_onto_transport() {
        let mut config = ClientConfig::default();
        config.tls = TlsVerification::DangerAcceptInvalid;
        assert!(matches!(config.transport().tls, TlsMode::DangerAcceptInvalid));
    }
}
