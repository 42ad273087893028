//! Shared configuration for the ClassCheck CLI.
//!
//! TOML profiles, bearer-token resolution (env + keyring + plaintext),
//! and translation to `classcheck_core::ClientConfig`. The CLI layers its
//! global flags on top.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use classcheck_api::Credentials;
use classcheck_core::{ClientConfig, DEFAULT_API_URL, TlsVerification};

const KEYRING_SERVICE: &str = "classcheck";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("profile '{name}' not found")]
    UnknownProfile { name: String },

    #[error("keyring error: {0}")]
    Keyring(#[from] keyring::Error),

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    #[serde(default)]
    pub defaults: Defaults,

    /// Named service profiles.
    #[serde(default)]
    pub profiles: HashMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: HashMap::new(),
        }
    }
}

impl Config {
    /// The active profile name: explicit choice, then `default_profile`.
    pub fn profile_name(&self, requested: Option<&str>) -> String {
        requested
            .map(str::to_owned)
            .or_else(|| self.default_profile.clone())
            .unwrap_or_else(|| "default".into())
    }

    /// The named profile, or a stock one when it is the implicit default.
    pub fn profile(&self, name: &str) -> Result<Profile, ConfigError> {
        match self.profiles.get(name) {
            Some(p) => Ok(p.clone()),
            None if name == "default" => Ok(Profile::default()),
            None => Err(ConfigError::UnknownProfile { name: name.into() }),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    #[serde(default)]
    pub insecure: bool,

    #[serde(default = "default_timeout")]
    pub timeout: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            insecure: false,
            timeout: default_timeout(),
        }
    }
}

fn default_output() -> String {
    "table".into()
}
fn default_color() -> String {
    "auto".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_api_url() -> String {
    DEFAULT_API_URL.into()
}

/// A named service profile.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Profile {
    #[serde(default = "default_api_url")]
    pub api_url: String,

    /// Bearer token (plaintext; prefer keyring or env var).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Environment variable holding the bearer token.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token_env: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_cert: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    /// Student status view refresh period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_interval_secs: Option<u64>,

    /// Admin board refresh period.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub board_interval_secs: Option<u64>,
}

impl Default for Profile {
    fn default() -> Self {
        Self {
            api_url: default_api_url(),
            token: None,
            token_env: None,
            ca_cert: None,
            insecure: None,
            timeout: None,
            status_interval_secs: None,
            board_interval_secs: None,
        }
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("org", "classcheck", "classcheck").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("classcheck");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Defaults, then the TOML file at `path`, then `CLASSCHECK_*` variables.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("CLASSCHECK_").split("_"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file doesn't exist.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<PathBuf, ConfigError> {
    let path = config_path();
    save_config_to(cfg, &path)?;
    Ok(path)
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Token resolution ────────────────────────────────────────────────

fn keyring_entry(profile_name: &str) -> Result<keyring::Entry, ConfigError> {
    Ok(keyring::Entry::new(
        KEYRING_SERVICE,
        &format!("{profile_name}/token"),
    )?)
}

/// Resolve the bearer token, if any: `token_env` variable, then the
/// system keyring, then the plaintext `token` field.
pub fn resolve_token(profile: &Profile, profile_name: &str) -> Option<SecretString> {
    if let Some(ref env_name) = profile.token_env {
        if let Ok(val) = std::env::var(env_name) {
            return Some(SecretString::from(val));
        }
    }

    if let Ok(entry) = keyring_entry(profile_name) {
        if let Ok(secret) = entry.get_password() {
            return Some(SecretString::from(secret));
        }
    }

    profile.token.clone().map(SecretString::from)
}

/// Store a bearer token in the system keyring.
pub fn store_token(profile_name: &str, token: &SecretString) -> Result<(), ConfigError> {
    keyring_entry(profile_name)?.set_password(token.expose_secret())?;
    Ok(())
}

/// Credentials for a profile; anonymous when no token resolves.
pub fn resolve_credentials(profile: &Profile, profile_name: &str) -> Credentials {
    resolve_token(profile, profile_name).map_or(Credentials::Anonymous, |token| {
        Credentials::Bearer { token }
    })
}

// ── Translation ─────────────────────────────────────────────────────

pub fn parse_api_url(raw: &str) -> Result<url::Url, ConfigError> {
    let url: url::Url = raw.parse().map_err(|e| ConfigError::Validation {
        field: "api_url".into(),
        reason: format!("invalid URL '{raw}': {e}"),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::Validation {
            field: "api_url".into(),
            reason: format!("unsupported scheme '{}'", url.scheme()),
        });
    }
    Ok(url)
}

pub fn tls_for(profile: &Profile, defaults: &Defaults) -> TlsVerification {
    if profile.insecure.unwrap_or(defaults.insecure) {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = profile.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    }
}

/// Build a `ClientConfig` from a profile, with no CLI flag overrides.
pub fn profile_to_client_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ClientConfig, ConfigError> {
    let mut config = ClientConfig::new(parse_api_url(&profile.api_url)?);
    config.credentials = resolve_credentials(profile, profile_name);
    config.tls = tls_for(profile, defaults);
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    if let Some(secs) = profile.status_interval_secs {
        config.status_interval = interval("status_interval_secs", secs)?;
    }
    if let Some(secs) = profile.board_interval_secs {
        config.board_interval = interval("board_interval_secs", secs)?;
    }
    Ok(config)
}

fn interval(field: &str, secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::Validation {
            field: field.into(),
            reason: "must be at least 1 second".into(),
        });
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("absent.toml")).unwrap();
        assert_eq!(cfg.default_profile.as_deref(), Some("default"));
        assert_eq!(cfg.defaults.timeout, 30);
        let profile = cfg.profile("default").unwrap();
        assert_eq!(profile.api_url, "http://localhost:8000");
    }

    #[test]
    fn profiles_round_trip_through_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.profiles.insert(
            "lab".into(),
            Profile {
                api_url: "https://attendance.example.edu".into(),
                timeout: Some(5),
                status_interval_secs: Some(4),
                ..Profile::default()
            },
        );
        cfg.default_profile = Some("lab".into());
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(loaded.profile_name(None), "lab");
        assert_eq!(loaded.profile_name(Some("other")), "other");
        let lab = loaded.profile("lab").unwrap();
        assert_eq!(lab.api_url, "https://attendance.example.edu");
        assert_eq!(lab.status_interval_secs, Some(4));
    }

    #[test]
    fn unknown_named_profile_is_an_error() {
        let cfg = Config::default();
        assert!(matches!(
            cfg.profile("nope"),
            Err(ConfigError::UnknownProfile { .. })
        ));
    }

    #[test]
    fn profile_translates_to_client_config() {
        let profile = Profile {
            api_url: "http://10.0.0.5:8000".into(),
            token: Some("plain".into()),
            insecure: Some(true),
            timeout: Some(7),
            board_interval_secs: Some(5),
            ..Profile::default()
        };
        let config =
            profile_to_client_config(&profile, "translate-test", &Defaults::default()).unwrap();
        assert_eq!(config.url.as_str(), "http://10.0.0.5:8000/");
        assert_eq!(config.timeout, Duration::from_secs(7));
        assert_eq!(config.tls, TlsVerification::DangerAcceptInvalid);
        assert_eq!(config.board_interval, Duration::from_secs(5));
        assert_eq!(config.status_interval, Duration::from_secs(3));
        assert!(!config.credentials.is_anonymous());
    }

    #[test]
    fn rejects_bad_urls_and_zero_intervals() {
        assert!(parse_api_url("ftp://host").is_err());
        assert!(parse_api_url("not a url").is_err());
        let profile = Profile {
            status_interval_secs: Some(0),
            ..Profile::default()
        };
        assert!(profile_to_client_config(&profile, "zero-test", &Defaults::default()).is_err());
    }
}
