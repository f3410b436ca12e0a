//! Shared configuration for windhager tools.
//!
//! TOML profiles, credential resolution (env + keyring + plaintext),
//! host normalization, and translation to `windhager_core::ControllerConfig`.
//! The CLI layers its flag overrides on top.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use url::Url;

use windhager_core::{ControllerConfig, DEFAULT_USERNAME};

/// Keyring service name under which passwords are stored.
pub const KEYRING_SERVICE: &str = "windhager";

/// Environment variable holding the appliance password.
pub const PASSWORD_ENV: &str = "WINDHAGER_PASSWORD";

/// Environment variable overriding the config file location.
pub const CONFIG_PATH_ENV: &str = "WINDHAGER_CONFIG";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no password configured for profile '{profile}'")]
    NoCredentials { profile: String },

    #[error("profile '{name}' not found")]
    ProfileNotFound { name: String },

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

/// Top-level TOML configuration.
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    /// Default profile name.
    pub default_profile: Option<String>,

    /// Global defaults.
    #[serde(default)]
    pub defaults: Defaults,

    /// Named appliance profiles.
    #[serde(default)]
    pub profiles: BTreeMap<String, Profile>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_profile: Some("default".into()),
            defaults: Defaults::default(),
            profiles: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Deserialize, Serialize)]
pub struct Defaults {
    #[serde(default = "default_output")]
    pub output: String,

    #[serde(default = "default_color")]
    pub color: String,

    /// Per-request timeout, seconds.
    #[serde(default = "default_timeout")]
    pub timeout: u64,

    /// Whole poll cycle timeout, seconds.
    #[serde(default = "default_poll_timeout")]
    pub poll_timeout: u64,

    /// Seconds between refreshes in `watch`.
    #[serde(default = "default_refresh_interval")]
    pub refresh_interval: u64,
}

impl Default for Defaults {
    fn default() -> Self {
        Self {
            output: default_output(),
            color: default_color(),
            timeout: default_timeout(),
            poll_timeout: default_poll_timeout(),
            refresh_interval: default_refresh_interval(),
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
    windhager_core::config::DEFAULT_TIMEOUT.as_secs()
}
fn default_poll_timeout() -> u64 {
    windhager_core::config::DEFAULT_POLL_TIMEOUT.as_secs()
}
fn default_refresh_interval() -> u64 {
    windhager_core::config::DEFAULT_REFRESH_INTERVAL_SECS
}

/// A named appliance profile.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Profile {
    /// Appliance host or URL (e.g. "192.168.1.20" or "http://heater.local").
    pub host: String,

    /// Digest username; the appliance's web account is "USER".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    /// Password (plaintext; prefer keyring or env var).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Environment variable name containing the password.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_env: Option<String>,

    /// Accept invalid TLS certificates for `https` hosts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insecure: Option<bool>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poll_timeout: Option<u64>,
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path: `WINDHAGER_CONFIG`, else platform
/// conventions.
pub fn config_path() -> PathBuf {
    if let Some(path) = std::env::var_os(CONFIG_PATH_ENV) {
        return PathBuf::from(path);
    }
    ProjectDirs::from("com", "windhager", "windhager").map_or_else(
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
    p.push("windhager");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the default path + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load config from `path`, layered as defaults, then file, then
/// `WINDHAGER_`-prefixed env vars (`__` separates nested keys).
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("WINDHAGER_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
}

/// Load config, returning a default if the file is missing or invalid.
pub fn load_config_or_default() -> Config {
    load_config().unwrap_or_default()
}

// ── Config saving ───────────────────────────────────────────────────

/// Serialize config to TOML and write to the canonical config path.
pub fn save_config(cfg: &Config) -> Result<(), ConfigError> {
    save_config_to(cfg, &config_path())
}

pub fn save_config_to(cfg: &Config, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let toml_str = toml::to_string_pretty(cfg)?;
    std::fs::write(path, toml_str)?;
    Ok(())
}

// ── Host handling ───────────────────────────────────────────────────

/// Reduce user input to `host[:port]`: strips whitespace, scheme, path
/// and trailing slashes.
pub fn normalize_host(input: &str) -> Result<String, ConfigError> {
    let trimmed = input.trim();
    let without_scheme = strip_scheme(trimmed).map_or(trimmed, |(_, rest)| rest);
    let host = without_scheme
        .split('/')
        .next()
        .unwrap_or_default()
        .trim();

    if host.is_empty() {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("no host in {input:?}"),
        });
    }
    if host.chars().any(char::is_whitespace) {
        return Err(ConfigError::Validation {
            field: "host".into(),
            reason: format!("host must not contain whitespace: {input:?}"),
        });
    }
    Ok(host.to_owned())
}

/// Base URL for `input`. `https://` is kept when given, otherwise the
/// appliance is reached over plain `http`.
pub fn base_url(input: &str) -> Result<Url, ConfigError> {
    let host = normalize_host(input)?;
    let scheme = match strip_scheme(input.trim()) {
        Some((scheme, _)) if scheme.eq_ignore_ascii_case("https") => "https",
        _ => "http",
    };
    Url::parse(&format!("{scheme}://{host}")).map_err(|e| ConfigError::Validation {
        field: "host".into(),
        reason: format!("{input:?} is not a valid host: {e}"),
    })
}

fn strip_scheme(input: &str) -> Option<(&str, &str)> {
    let (scheme, rest) = input.split_once("://")?;
    Some((scheme, rest))
}

// ── Credential resolution ───────────────────────────────────────────

fn keyring_user(profile_name: &str) -> String {
    format!("{profile_name}/password")
}

/// Resolve the password: `password_env` → `WINDHAGER_PASSWORD` →
/// system keyring → plaintext in the profile.
pub fn resolve_password(profile: &Profile, profile_name: &str) -> Result<SecretString, ConfigError> {
    resolve_password_with(
        profile,
        profile_name,
        |name| std::env::var(name).ok(),
        |user| {
            keyring::Entry::new(KEYRING_SERVICE, user)
                .and_then(|entry| entry.get_password())
                .ok()
        },
    )
}

/// [`resolve_password`] with injectable env and keyring lookups.
pub fn resolve_password_with(
    profile: &Profile,
    profile_name: &str,
    env: impl Fn(&str) -> Option<String>,
    keyring: impl Fn(&str) -> Option<String>,
) -> Result<SecretString, ConfigError> {
    // 1. Profile's password_env → env var lookup
    if let Some(pw) = profile.password_env.as_deref().and_then(&env) {
        return Ok(SecretString::from(pw));
    }

    // 2. Global env var
    if let Some(pw) = env(PASSWORD_ENV) {
        return Ok(SecretString::from(pw));
    }

    // 3. System keyring
    if let Some(pw) = keyring(&keyring_user(profile_name)) {
        return Ok(SecretString::from(pw));
    }

    // 4. Plaintext in config
    if let Some(ref pw) = profile.password {
        return Ok(SecretString::from(pw.clone()));
    }

    Err(ConfigError::NoCredentials {
        profile: profile_name.into(),
    })
}

/// Store a profile's password in the system keyring.
pub fn store_password(profile_name: &str, password: &str) -> Result<(), ConfigError> {
    let entry = keyring::Entry::new(KEYRING_SERVICE, &keyring_user(profile_name))?;
    entry.set_password(password)?;
    Ok(())
}

// ── Translation ─────────────────────────────────────────────────────

/// Build a `ControllerConfig` from a profile, no CLI overrides.
pub fn profile_to_controller_config(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
) -> Result<ControllerConfig, ConfigError> {
    let url = base_url(&profile.host)?;
    let password = resolve_password(profile, profile_name)?;
    Ok(controller_config(profile, defaults, url, password))
}

/// Assemble a `ControllerConfig` from resolved parts.
pub fn controller_config(
    profile: &Profile,
    defaults: &Defaults,
    url: Url,
    password: SecretString,
) -> ControllerConfig {
    let mut config = ControllerConfig::new(url, password);
    config.username = profile
        .username
        .clone()
        .unwrap_or_else(|| DEFAULT_USERNAME.to_owned());
    config.timeout = Duration::from_secs(profile.timeout.unwrap_or(defaults.timeout));
    config.poll_timeout =
        Duration::from_secs(profile.poll_timeout.unwrap_or(defaults.poll_timeout));
    config.refresh_interval_secs = defaults.refresh_interval;
    config.accept_invalid_certs = profile.insecure.unwrap_or(false);
    config
}
