//! CLI configuration: thin wrapper around `classcheck_config` shared types.
//!
//! Re-exports the shared types and layers `GlobalOpts` flag overrides
//! (--api-url, --token, --insecure, --timeout) on top of the active profile.

use secrecy::SecretString;

use classcheck_api::Credentials;
use classcheck_config::{ConfigError, profile_to_client_config};
use classcheck_core::ClientConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use classcheck_config::{
    Config, Profile, config_path, load_config_or_default, save_config, store_token,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    config.profile_name(global.profile.as_deref())
}

pub fn available_profiles(config: &Config) -> String {
    let mut names: Vec<_> = config.profiles.keys().cloned().collect();
    if names.is_empty() {
        return "(none)".into();
    }
    names.sort();
    names.join(", ")
}

/// Build a `ClientConfig` from the config file, profile and CLI overrides.
///
/// An unknown profile is an error unless `--api-url` supplies everything
/// needed to connect.
pub fn build_client_config(global: &GlobalOpts) -> Result<ClientConfig, CliError> {
    let cfg = load_config_or_default();
    let name = active_profile_name(global, &cfg);

    let mut profile = match cfg.profile(&name) {
        Ok(profile) => profile,
        Err(ConfigError::UnknownProfile { .. }) if global.api_url.is_some() => Profile::default(),
        Err(ConfigError::UnknownProfile { name }) => {
            return Err(CliError::ProfileNotFound {
                available: available_profiles(&cfg),
                name,
            });
        }
        Err(e) => return Err(e.into()),
    };

    // Flags beat profile values.
    if let Some(ref url) = global.api_url {
        profile.api_url.clone_from(url);
    }
    if global.insecure {
        profile.insecure = Some(true);
    }
    if let Some(secs) = global.timeout {
        profile.timeout = Some(secs);
    }

    let mut client = profile_to_client_config(&profile, &name, &cfg.defaults)?;
    if let Some(ref token) = global.token {
        client.credentials = Credentials::Bearer {
            token: SecretString::from(token.clone()),
        };
    }
    tracing::debug!(profile = %name, url = %client.url, "resolved client config");
    Ok(client)
}
