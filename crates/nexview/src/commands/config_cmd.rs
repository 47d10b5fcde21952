//! Config subcommand handlers.

use std::str::FromStr;

use nexview_config::Config;

use crate::cli::{ConfigArgs, ConfigCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

const KEYS: &str = "server.host, server.port, session.reconnect_delay_secs, \
                    session.max_reconnect_delay_secs, session.timeout_secs, session.insecure, \
                    session.ca_cert, weather.latitude, weather.longitude, weather.base_url";

fn parse<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<T, CliError> {
    value.parse().map_err(|_| CliError::Validation {
        field: key.into(),
        reason: format!("must be {expected}, got '{value}'"),
    })
}

/// Optional values accept `none` to clear.
fn parse_opt<T: FromStr>(key: &str, value: &str, expected: &str) -> Result<Option<T>, CliError> {
    if value.eq_ignore_ascii_case("none") {
        return Ok(None);
    }
    parse(key, value, expected).map(Some)
}

fn set_key(cfg: &mut Config, key: &str, value: &str) -> Result<(), CliError> {
    match key {
        "server.host" => cfg.server.host = parse_opt(key, value, "a hostname")?,
        "server.port" => cfg.server.port = parse(key, value, "a port (0-65535)")?,
        "session.reconnect_delay_secs" => {
            cfg.session.reconnect_delay_secs = parse(key, value, "a number (seconds)")?;
        }
        "session.max_reconnect_delay_secs" => {
            cfg.session.max_reconnect_delay_secs = parse_opt(key, value, "a number (seconds)")?;
        }
        "session.timeout_secs" => cfg.session.timeout_secs = parse(key, value, "a number (seconds)")?,
        "session.insecure" => cfg.session.insecure = parse(key, value, "'true' or 'false'")?,
        "session.ca_cert" => cfg.session.ca_cert = parse_opt(key, value, "a file path")?,
        "weather.latitude" => cfg.weather.latitude = parse_opt(key, value, "a number (degrees)")?,
        "weather.longitude" => cfg.weather.longitude = parse_opt(key, value, "a number (degrees)")?,
        "weather.base_url" => {
            let url: url::Url = parse(key, value, "a URL")?;
            cfg.weather.base_url = url.to_string();
        }
        other => {
            return Err(CliError::Validation {
                field: other.into(),
                reason: format!("unknown config key '{other}'. Valid keys: {KEYS}"),
            });
        }
    }
    Ok(())
}

pub fn handle(args: ConfigArgs, global: &GlobalOpts) -> Result<(), CliError> {
    match args.command {
        // ── Show ────────────────────────────────────────────────────
        ConfigCommand::Show => {
            let mut cfg = nexview_config::load_config()?;
            if cfg.server.token.is_some() {
                cfg.server.token = Some("<redacted>".into());
            }
            let out = output::render_single(
                &global.output,
                &cfg,
                |c| toml::to_string_pretty(c).unwrap_or_else(|_| format!("{c:#?}")),
                |_| nexview_config::config_path().display().to_string(),
            );
            output::print_output(&out, global.quiet);
            Ok(())
        }

        // ── Path ────────────────────────────────────────────────────
        ConfigCommand::Path => {
            println!("{}", nexview_config::config_path().display());
            Ok(())
        }

        // ── Set <key> <value> ───────────────────────────────────────
        ConfigCommand::Set { key, value } => {
            let mut cfg = nexview_config::load_config()?;
            set_key(&mut cfg, &key, &value)?;
            nexview_config::to_session_config(&cfg)?;
            nexview_config::save_config(&cfg)?;
            if !global.quiet {
                eprintln!("✓ Set {key}");
            }
            Ok(())
        }
    }
}
