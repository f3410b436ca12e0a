//! Config subcommand handlers.

use dialoguer::{Input, Select};

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts, InitArgs, PasswordStore};
use crate::config::{self, Config, Profile};
use crate::error::CliError;
use crate::output;

const REDACTED: &str = "********";

// ── Helpers ─────────────────────────────────────────────────────────

/// Map a dialoguer / interactive I/O failure into CliError.
fn prompt_err(e: impl std::fmt::Display) -> CliError {
    CliError::Validation {
        field: "interactive".into(),
        reason: format!("prompt failed: {e}"),
    }
}

fn missing(field: &str) -> CliError {
    CliError::Validation {
        field: field.into(),
        reason: "required with --no-input".into(),
    }
}

/// The password from `--password`, or an interactive prompt.
fn password(global: &GlobalOpts, no_input: bool) -> Result<String, CliError> {
    if let Some(ref pw) = global.password {
        return Ok(pw.clone());
    }
    if no_input {
        return Err(missing("password"));
    }
    let pw = rpassword::prompt_password("Password: ").map_err(prompt_err)?;
    if pw.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(pw)
}

fn redacted(mut cfg: Config) -> Config {
    for profile in cfg.profiles.values_mut() {
        if profile.password.is_some() {
            profile.password = Some(REDACTED.into());
        }
    }
    cfg
}

// ── Init ────────────────────────────────────────────────────────────

fn init(args: &InitArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let config_path = config::config_path();
    if !args.no_input {
        eprintln!("Windhager CLI configuration");
        eprintln!("   Config path: {}\n", config_path.display());
    }

    // 1. Profile name
    let profile_name = match args.name {
        Some(ref name) => name.clone(),
        None if args.no_input => "default".into(),
        None => Input::new()
            .with_prompt("Profile name")
            .default("default".into())
            .interact_text()
            .map_err(prompt_err)?,
    };

    // 2. Appliance host
    let host = match global.host {
        Some(ref host) => host.clone(),
        None if args.no_input => return Err(missing("host")),
        None => Input::new()
            .with_prompt("Appliance host or URL")
            .interact_text()
            .map_err(prompt_err)?,
    };
    windhager_config::base_url(&host)?;

    // 3. Password storage
    let store = match args.store {
        Some(store) => store,
        None if args.no_input => PasswordStore::None,
        None => {
            let choices = &[
                "Store in system keyring (recommended)",
                "Save to config file (plaintext)",
                "Don't store (use WINDHAGER_PASSWORD)",
            ];
            match Select::new()
                .with_prompt("Where to store the password?")
                .items(choices)
                .default(0)
                .interact()
                .map_err(prompt_err)?
            {
                0 => PasswordStore::Keyring,
                1 => PasswordStore::Plaintext,
                _ => PasswordStore::None,
            }
        }
    };

    let plaintext = match store {
        PasswordStore::Keyring => {
            let pw = password(global, args.no_input)?;
            windhager_config::store_password(&profile_name, &pw)?;
            output::print_success("Password stored in system keyring", global.color, global.quiet);
            None
        }
        PasswordStore::Plaintext => Some(password(global, args.no_input)?),
        PasswordStore::None => None,
    };

    // 4. Build profile and merge into the existing config
    let profile = Profile {
        host: host.trim().to_owned(),
        username: global.username.clone(),
        password: plaintext,
        insecure: global.insecure.then_some(true),
        timeout: global.timeout,
        ..Profile::default()
    };

    let mut cfg = config::load_config_or_default();
    cfg.profiles.insert(profile_name.clone(), profile);
    let default_exists = cfg
        .default_profile
        .as_ref()
        .is_some_and(|name| cfg.profiles.contains_key(name));
    if !default_exists {
        cfg.default_profile = Some(profile_name.clone());
    }

    config::save_config(&cfg)?;
    output::print_success(
        &format!(
            "Profile '{profile_name}' written to {}",
            config_path.display()
        ),
        global.color,
        global.quiet,
    );
    Ok(())
}

// ── Handler ─────────────────────────────────────────────────────────

pub fn handle(args: &ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        ConfigCommand::Init(ref init_args) => init(init_args, global),

        ConfigCommand::Show => {
            let cfg = redacted(config::load_config_or_default());
            let out = output::render_single(
                global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|e| format!("# unrenderable: {e}")),
                |c| c.profiles.keys().cloned().collect::<Vec<_>>().join("\n"),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        ConfigCommand::SetPassword { ref profile } => {
            let cfg = config::load_config_or_default();
            let profile_name = profile
                .clone()
                .unwrap_or_else(|| config::active_profile_name(global, &cfg));
            let pw = password(global, false)?;
            windhager_config::store_password(&profile_name, &pw)?;
            output::print_success(
                &format!("Password for profile '{profile_name}' stored in system keyring"),
                global.color,
                global.quiet,
            );
            Ok(())
        }

        ConfigCommand::Path => {
            output::print_output(&config::config_path().display().to_string(), false);
            Ok(())
        }
    }
}
