//! Config subcommand handlers.

use std::collections::HashMap;

use dialoguer::{Input, Select};
use secrecy::SecretString;

use classcheck_config::{Defaults, parse_api_url};
use classcheck_core::DEFAULT_API_URL;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

use super::util::prompt_err;

const VALID_KEYS: &str = "api_url, token, token_env, ca_cert, insecure, timeout, \
                          status_interval_secs, board_interval_secs";

// ── Helpers ─────────────────────────────────────────────────────────

fn redact(cfg: &mut Config) {
    for profile in cfg.profiles.values_mut() {
        if profile.token.is_some() {
            profile.token = Some("****".into());
        }
    }
}

/// Format config for display. Tokens must already be redacted.
fn format_config(cfg: &Config) -> String {
    use std::fmt::Write;
    let mut out = String::new();

    if let Some(ref default) = cfg.default_profile {
        let _ = writeln!(out, "default_profile = \"{default}\"");
    }
    let _ = writeln!(out);
    let _ = writeln!(out, "[defaults]");
    let _ = writeln!(out, "output = \"{}\"", cfg.defaults.output);
    let _ = writeln!(out, "color = \"{}\"", cfg.defaults.color);
    let _ = writeln!(out, "insecure = {}", cfg.defaults.insecure);
    let _ = write!(out, "timeout = {}", cfg.defaults.timeout);

    let mut names: Vec<_> = cfg.profiles.iter().collect();
    names.sort_by_key(|(name, _)| name.as_str());
    for (name, p) in names {
        let _ = writeln!(out, "\n\n[profiles.{name}]");
        let _ = write!(out, "api_url = \"{}\"", p.api_url);
        if let Some(ref token) = p.token {
            let _ = write!(out, "\ntoken = \"{token}\"");
        }
        if let Some(ref env) = p.token_env {
            let _ = write!(out, "\ntoken_env = \"{env}\"");
        }
        if let Some(ref ca) = p.ca_cert {
            let _ = write!(out, "\nca_cert = \"{}\"", ca.display());
        }
        if let Some(insecure) = p.insecure {
            let _ = write!(out, "\ninsecure = {insecure}");
        }
        if let Some(timeout) = p.timeout {
            let _ = write!(out, "\ntimeout = {timeout}");
        }
        if let Some(secs) = p.status_interval_secs {
            let _ = write!(out, "\nstatus_interval_secs = {secs}");
        }
        if let Some(secs) = p.board_interval_secs {
            let _ = write!(out, "\nboard_interval_secs = {secs}");
        }
    }

    out
}

fn parse_value<T: std::str::FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}"),
    })
}

/// Apply `config set <key> <value>` to a profile.
fn set_key(profile: &mut Profile, key: &str, value: String) -> Result<(), CliError> {
    match key {
        "api_url" | "api-url" => {
            parse_api_url(&value)?;
            profile.api_url = value;
        }
        "token" => profile.token = Some(value),
        "token_env" | "token-env" => profile.token_env = Some(value),
        "ca_cert" | "ca-cert" => profile.ca_cert = Some(value.into()),
        "insecure" => profile.insecure = Some(parse_value(key, &value, "'true' or 'false'")?),
        "timeout" => profile.timeout = Some(parse_value(key, &value, "a number (seconds)")?),
        "status_interval_secs" | "status-interval-secs" => {
            profile.status_interval_secs =
                Some(parse_value(key, &value, "a number (seconds)")?);
        }
        "board_interval_secs" | "board-interval-secs" => {
            profile.board_interval_secs =
                Some(parse_value(key, &value, "a number (seconds)")?);
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {VALID_KEYS}"),
            });
        }
    }
    Ok(())
}

/// Ask for a token and store it in the keyring, or return it for the
/// plaintext config when the user prefers that.
fn prompt_token(profile_name: &str) -> Result<Option<String>, CliError> {
    let token = rpassword::prompt_password("Bearer token (leave empty for none): ")
        .map_err(prompt_err)?;
    if token.is_empty() {
        return Ok(None);
    }

    let choices = &[
        "Store in system keyring (recommended)",
        "Save to config file (plaintext)",
    ];
    let selection = Select::new()
        .with_prompt("Where to store the token?")
        .items(choices)
        .default(0)
        .interact()
        .map_err(prompt_err)?;

    if selection == 0 {
        config::store_token(profile_name, &SecretString::from(token))?;
        eprintln!("   Token stored in system keyring");
        Ok(None)
    } else {
        Ok(Some(token))
    }
}

// ── Handler ─────────────────────────────────────────────────────────

#[allow(clippy::too_many_lines)]
pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init => {
            let config_path = config::config_path();
            eprintln!("ClassCheck CLI configuration");
            eprintln!("   Config path: {}\n", config_path.display());

            let profile_name: String = Input::new()
                .with_prompt("Profile name")
                .default("default".into())
                .interact_text()
                .map_err(prompt_err)?;

            let api_url: String = Input::new()
                .with_prompt("Service URL")
                .default(DEFAULT_API_URL.into())
                .interact_text()
                .map_err(prompt_err)?;
            parse_api_url(&api_url)?;

            let token = prompt_token(&profile_name)?;

            let profile = Profile {
                api_url,
                token,
                ..Profile::default()
            };
            let mut profiles = HashMap::new();
            profiles.insert(profile_name.clone(), profile);

            let cfg = Config {
                default_profile: Some(profile_name.clone()),
                defaults: Defaults::default(),
                profiles,
            };
            let path = config::save_config(&cfg)?;

            eprintln!("\nConfiguration written to {}", path.display());
            eprintln!("  Active profile: {profile_name}");
            eprintln!("\n  Test it: classcheck ping");
            Ok(())
        }

        ConfigCommand::Show => {
            let mut cfg = config::load_config_or_default();
            redact(&mut cfg);
            let out =
                output::render_single(&global.output, &cfg, format_config, |_| "config".into())?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Set { key, value } => {
            let mut cfg = config::load_config_or_default();
            let profile_name = config::active_profile_name(global, &cfg);
            let profile = cfg.profiles.entry(profile_name.clone()).or_default();
            set_key(profile, &key, value)?;
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Set {key} on profile '{profile_name}'");
            }
            Ok(())
        }

        ConfigCommand::Profiles => {
            let cfg = config::load_config_or_default();
            if cfg.profiles.is_empty() {
                eprintln!("No profiles configured. Run: classcheck config init");
                return Ok(());
            }
            let default = cfg.default_profile.as_deref().unwrap_or("default");
            let mut names: Vec<_> = cfg.profiles.keys().collect();
            names.sort();
            let out = names
                .into_iter()
                .map(|name| {
                    if name == default {
                        format!("{name} *")
                    } else {
                        name.clone()
                    }
                })
                .collect::<Vec<_>>()
                .join("\n");
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::Use { name } => {
            let mut cfg = config::load_config_or_default();
            if !cfg.profiles.contains_key(&name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name,
                });
            }
            cfg.default_profile = Some(name.clone());
            config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("Default profile set to '{name}'");
            }
            Ok(())
        }

        ConfigCommand::SetToken { profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile.unwrap_or_else(|| config::active_profile_name(global, &cfg));
            if profile_name != "default" && !cfg.profiles.contains_key(&profile_name) {
                return Err(CliError::ProfileNotFound {
                    available: config::available_profiles(&cfg),
                    name: profile_name,
                });
            }
            let token = rpassword::prompt_password("Bearer token: ").map_err(prompt_err)?;
            if token.is_empty() {
                return Err(CliError::Validation {
                    field: "token".into(),
                    reason: "token cannot be empty".into(),
                });
            }
            config::store_token(&profile_name, &SecretString::from(token))?;
            if !global.quiet {
                eprintln!("Token for '{profile_name}' stored in system keyring");
            }
            Ok(())
        }
    }
}
