//! CLI configuration: a thin wrapper around `windhager_config` shared types.
//!
//! Re-exports the shared types and adds CLI-specific resolution that
//! respects `GlobalOpts` flag overrides (--host, --password, etc.).

use std::time::Duration;

use secrecy::SecretString;

use windhager_core::ControllerConfig;

use crate::cli::GlobalOpts;
use crate::error::CliError;

// ── Re-exports from shared crate ────────────────────────────────────

pub use windhager_config::{
    Config, Defaults, Profile, config_path, load_config_or_default, save_config,
};

// ── CLI-specific helpers ────────────────────────────────────────────

/// Resolve the active profile name from CLI flags and config.
pub fn active_profile_name(global: &GlobalOpts, config: &Config) -> String {
    global
        .profile
        .clone()
        .or_else(|| config.default_profile.clone())
        .unwrap_or_else(|| "default".into())
}

/// Comma-separated profile names, for help text.
pub fn available_profiles(config: &Config) -> String {
    if config.profiles.is_empty() {
        return "(none)".into();
    }
    config
        .profiles
        .keys()
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Build a `ControllerConfig` from the config file, profile, and CLI overrides.
pub fn build_controller_config(global: &GlobalOpts) -> Result<ControllerConfig, CliError> {
    let cfg = load_config_or_default();
    let profile_name = active_profile_name(global, &cfg);

    if let Some(profile) = cfg.profiles.get(&profile_name) {
        return resolve_profile(profile, &profile_name, &cfg.defaults, global);
    }

    // No profile: flags and env vars alone
    if global.host.is_none() {
        if global.profile.is_some() {
            return Err(CliError::ProfileNotFound {
                name: profile_name,
                available: available_profiles(&cfg),
            });
        }
        return Err(CliError::NoConfig {
            path: config_path().display().to_string(),
        });
    }
    resolve_profile(&Profile::default(), &profile_name, &cfg.defaults, global)
}

/// Translate a `Profile` + global flags into a `ControllerConfig`.
///
/// CLI flag overrides take priority over profile values.
pub fn resolve_profile(
    profile: &Profile,
    profile_name: &str,
    defaults: &Defaults,
    global: &GlobalOpts,
) -> Result<ControllerConfig, CliError> {
    // 1. Host (flag > env > profile)
    let host = global.host.as_deref().unwrap_or(&profile.host);
    let url = windhager_config::base_url(host)?;

    // 2. Password (flag > profile chain)
    let password = match global.password {
        Some(ref pw) => SecretString::from(pw.clone()),
        None => windhager_config::resolve_password(profile, profile_name)?,
    };

    let mut config = windhager_config::controller_config(profile, defaults, url, password);

    // 3. Remaining overrides
    if let Some(ref username) = global.username {
        config.username.clone_from(username);
    }
    if let Some(secs) = global.timeout {
        config.timeout = Duration::from_secs(secs);
    }
    if global.insecure {
        config.accept_invalid_certs = true;
    }
    Ok(config)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use clap::Parser;
    use secrecy::ExposeSecret;

    use super::*;
    use crate::cli::Cli;

    fn global(args: &[&str]) -> GlobalOpts {
        let mut argv = vec!["windhager"];
        argv.extend_from_slice(args);
        argv.push("scan");
        Cli::try_parse_from(argv).unwrap().global
    }

    fn profile() -> Profile {
        Profile {
            host: "192.168.1.20".into(),
            username: Some("ADMIN".into()),
            password: Some("from-file".into()),
            timeout: Some(15),
            ..Profile::default()
        }
    }

    #[test]
    fn profile_values_apply_without_flags() {
        let opts = global(&["--password", "pw"]);
        let cfg = resolve_profile(&profile(), "home", &Defaults::default(), &opts).unwrap();

        assert_eq!(cfg.url.as_str(), "http://192.168.1.20/");
        assert_eq!(cfg.username, "ADMIN");
        assert_eq!(cfg.timeout, Duration::from_secs(15));
        assert!(!cfg.accept_invalid_certs);
    }

    #[test]
    fn flags_override_profile() {
        let opts = global(&[
            "--host",
            "https://heater.local",
            "--username",
            "USER",
            "--password",
            "from-flag",
            "--timeout",
            "3",
            "--insecure",
        ]);
        let cfg = resolve_profile(&profile(), "home", &Defaults::default(), &opts).unwrap();

        assert_eq!(cfg.url.as_str(), "https://heater.local/");
        assert_eq!(cfg.username, "USER");
        assert_eq!(cfg.password.expose_secret(), "from-flag");
        assert_eq!(cfg.timeout, Duration::from_secs(3));
        assert!(cfg.accept_invalid_certs);
    }

    #[test]
    fn profile_flag_wins_over_default_profile() {
        let config = Config::default();
        assert_eq!(active_profile_name(&global(&[]), &config), "default");
        assert_eq!(
            active_profile_name(&global(&["--profile", "cellar"]), &config),
            "cellar"
        );
    }
}
