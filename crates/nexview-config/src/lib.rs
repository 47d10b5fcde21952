//! Persistent configuration for nexview.
//!
//! A TOML file at the platform config dir, overlaid with `NEXVIEW_*`
//! environment variables, plus the credential store: the bearer token
//! lives in the system keyring, with `NEXVIEW_TOKEN` and a plaintext
//! `server.token` entry as fallbacks. Translates to
//! `nexview_core::SessionConfig` for the session manager.

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
use tracing::{debug, warn};

use nexview_core::{DEFAULT_WEATHER_URL, Endpoint, ReconnectPolicy, SessionConfig, TlsVerification};

/// Default telemetry server port.
pub const DEFAULT_PORT: u16 = 9384;

/// Environment variable that overrides the stored token.
pub const TOKEN_ENV: &str = "NEXVIEW_TOKEN";

const KEYRING_SERVICE: &str = "nexview";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("not logged in: no server configured")]
    NoServer,

    #[error("no token stored for {endpoint}")]
    NoCredentials { endpoint: String },

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
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Config {
    /// Saved endpoint. Written by `login`, cleared by `logout`.
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionSettings,

    #[serde(default)]
    pub weather: WeatherSettings,
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: Option<String>,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Username used at the last login, for display only.
    pub username: Option<String>,

    /// Bearer token (plaintext; only written when no keyring is available).
    pub token: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: None,
            port: default_port(),
            username: None,
            token: None,
        }
    }
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct SessionSettings {
    /// Delay before each reconnection attempt.
    #[serde(default = "default_reconnect_delay")]
    pub reconnect_delay_secs: u64,

    /// When set, reconnect delays double per failure up to this cap.
    pub max_reconnect_delay_secs: Option<u64>,

    /// Bootstrap request and socket handshake timeout.
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    /// Accept self-signed certificates.
    #[serde(default)]
    pub insecure: bool,

    /// Path to a custom CA certificate.
    pub ca_cert: Option<PathBuf>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            reconnect_delay_secs: default_reconnect_delay(),
            max_reconnect_delay_secs: None,
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
        }
    }
}

fn default_reconnect_delay() -> u64 {
    5
}
fn default_timeout() -> u64 {
    30
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct WeatherSettings {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,

    #[serde(default = "default_weather_url")]
    pub base_url: String,
}

impl Default for WeatherSettings {
    fn default() -> Self {
        Self {
            latitude: None,
            longitude: None,
            base_url: default_weather_url(),
        }
    }
}

fn default_weather_url() -> String {
    DEFAULT_WEATHER_URL.into()
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "nexview", "nexview").map_or_else(
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
    p.push("nexview");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load the full Config from the canonical file + environment.
pub fn load_config() -> Result<Config, ConfigError> {
    load_config_from(&config_path())
}

/// Load from `path` + environment. A missing file yields defaults.
///
/// Nested keys use a double underscore: `NEXVIEW_SESSION__TIMEOUT_SECS=10`.
pub fn load_config_from(path: &Path) -> Result<Config, ConfigError> {
    let figment = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(path))
        .merge(Env::prefixed("NEXVIEW_").split("__"));

    let config: Config = figment.extract()?;
    Ok(config)
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

// ── Credential store ────────────────────────────────────────────────

/// Where [`store_credentials`] put the token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenStorage {
    Keyring,
    Plaintext,
}

fn keyring_entry(endpoint: &Endpoint) -> Option<keyring::Entry> {
    keyring::Entry::new(KEYRING_SERVICE, &format!("{endpoint}/token")).ok()
}

/// Record a successful login: endpoint and username into `cfg`, the
/// token into the keyring, or into `cfg` when no keyring is available.
///
/// The caller saves `cfg`.
pub fn store_credentials(
    cfg: &mut Config,
    endpoint: &Endpoint,
    username: &str,
    token: &SecretString,
) -> TokenStorage {
    cfg.server.host = Some(endpoint.host().to_owned());
    cfg.server.port = endpoint.port();
    cfg.server.username = Some(username.to_owned());

    let stored = keyring_entry(endpoint).is_some_and(|entry| {
        entry
            .set_password(token.expose_secret())
            .map_err(|e| warn!(error = %e, "keyring unavailable, storing token in config file"))
            .is_ok()
    });

    if stored {
        cfg.server.token = None;
        TokenStorage::Keyring
    } else {
        cfg.server.token = Some(token.expose_secret().to_owned());
        TokenStorage::Plaintext
    }
}

/// Resolve the bearer token: `NEXVIEW_TOKEN`, then keyring, then plaintext.
pub fn resolve_token(cfg: &Config) -> Result<SecretString, ConfigError> {
    resolve_token_with(cfg, std::env::var(TOKEN_ENV).ok())
}

fn resolve_token_with(cfg: &Config, env_token: Option<String>) -> Result<SecretString, ConfigError> {
    // 1. Env var
    if let Some(token) = env_token.filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token));
    }

    let endpoint = endpoint(cfg)?;

    // 2. System keyring
    if let Some(entry) = keyring_entry(&endpoint) {
        if let Ok(secret) = entry.get_password() {
            return Ok(SecretString::from(secret));
        }
    }

    // 3. Plaintext in config
    if let Some(token) = cfg.server.token.as_ref().filter(|t| !t.is_empty()) {
        return Ok(SecretString::from(token.clone()));
    }

    Err(ConfigError::NoCredentials {
        endpoint: endpoint.to_string(),
    })
}

/// Forget the endpoint and token. Keyring errors are logged, not returned.
///
/// The caller saves `cfg`.
pub fn clear_credentials(cfg: &mut Config) {
    if let Ok(endpoint) = endpoint(cfg) {
        if let Some(entry) = keyring_entry(&endpoint) {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => warn!(error = %e, "failed to remove token from keyring"),
            }
        }
    }
    debug!("clearing stored credentials");
    cfg.server = ServerConfig::default();
}

// ── Translation to runtime config ───────────────────────────────────

/// The saved endpoint.
pub fn endpoint(cfg: &Config) -> Result<Endpoint, ConfigError> {
    let host = cfg
        .server
        .host
        .as_deref()
        .filter(|h| !h.is_empty())
        .ok_or(ConfigError::NoServer)?;
    Ok(Endpoint::new(host, cfg.server.port))
}

/// Build a `SessionConfig` from the `[session]` table.
pub fn to_session_config(cfg: &Config) -> Result<SessionConfig, ConfigError> {
    let s = &cfg.session;
    if s.reconnect_delay_secs == 0 {
        return Err(ConfigError::Validation {
            field: "session.reconnect_delay_secs".into(),
            reason: "must be at least 1".into(),
        });
    }
    if s.timeout_secs == 0 {
        return Err(ConfigError::Validation {
            field: "session.timeout_secs".into(),
            reason: "must be at least 1".into(),
        });
    }

    let delay = Duration::from_secs(s.reconnect_delay_secs);
    let reconnect = match s.max_reconnect_delay_secs {
        Some(max) if max < s.reconnect_delay_secs => {
            return Err(ConfigError::Validation {
                field: "session.max_reconnect_delay_secs".into(),
                reason: "must not be below reconnect_delay_secs".into(),
            });
        }
        Some(max) => ReconnectPolicy::exponential(delay, Duration::from_secs(max)),
        None => ReconnectPolicy::fixed(delay),
    };

    let tls = if s.insecure {
        TlsVerification::DangerAcceptInvalid
    } else if let Some(ref ca_path) = s.ca_cert {
        TlsVerification::CustomCa(ca_path.clone())
    } else {
        TlsVerification::SystemDefaults
    };

    Ok(SessionConfig {
        timeout: Duration::from_secs(s.timeout_secs),
        tls,
        reconnect,
    })
}

/// Configured weather location, if both coordinates are set.
pub fn weather_location(cfg: &Config) -> Option<(f64, f64)> {
    Some((cfg.weather.latitude?, cfg.weather.longitude?))
}

pub fn weather_url(cfg: &Config) -> Result<url::Url, ConfigError> {
    cfg.weather
        .base_url
        .parse()
        .map_err(|e: url::ParseError| ConfigError::Validation {
            field: "weather.base_url".into(),
            reason: e.to_string(),
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = load_config_from(&dir.path().join("config.toml")).unwrap();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.session.reconnect_delay_secs, 5);
        assert_eq!(cfg.weather.base_url, DEFAULT_WEATHER_URL);
        assert!(matches!(endpoint(&cfg), Err(ConfigError::NoServer)));
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.server.host = Some("10.0.0.5".into());
        cfg.weather.latitude = Some(52.52);
        cfg.weather.longitude = Some(13.41);
        save_config_to(&cfg, &path).unwrap();

        let loaded = load_config_from(&path).unwrap();
        assert_eq!(endpoint(&loaded).unwrap(), Endpoint::new("10.0.0.5", 9384));
        assert_eq!(weather_location(&loaded), Some((52.52, 13.41)));
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[server]\nhost = \"pi.local\"\n\n[session]\ntimeout_secs = 10\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.server.port, DEFAULT_PORT);
        assert_eq!(cfg.session.timeout_secs, 10);
        assert_eq!(cfg.session.reconnect_delay_secs, 5);
    }

    #[test]
    fn stale_defaults_section_is_dropped_on_save() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[defaults]\noutput = \"json\"\n\n[server]\nhost = \"pi.local\"\n").unwrap();

        let cfg = load_config_from(&path).unwrap();
        assert_eq!(cfg.server.host.as_deref(), Some("pi.local"));
        save_config_to(&cfg, &path).unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains("[defaults]"));
    }

    #[test]
    fn session_config_defaults_to_fixed_delay() {
        let sc = to_session_config(&Config::default()).unwrap();
        assert_eq!(sc.reconnect, ReconnectPolicy::fixed(Duration::from_secs(5)));
        assert_eq!(sc.timeout, Duration::from_secs(30));
        assert_eq!(sc.tls, TlsVerification::SystemDefaults);
    }

    #[test]
    fn session_config_opt_in_backoff() {
        let mut cfg = Config::default();
        cfg.session.max_reconnect_delay_secs = Some(60);
        cfg.session.insecure = true;
        let sc = to_session_config(&cfg).unwrap();
        assert_eq!(sc.reconnect.max_delay, Some(Duration::from_secs(60)));
        assert_eq!(sc.tls, TlsVerification::DangerAcceptInvalid);

        cfg.session.max_reconnect_delay_secs = Some(1);
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn zero_delay_is_rejected() {
        let mut cfg = Config::default();
        cfg.session.reconnect_delay_secs = 0;
        assert!(matches!(
            to_session_config(&cfg),
            Err(ConfigError::Validation { .. })
        ));
    }

    #[test]
    fn token_from_env_wins() {
        let cfg = Config::default();
        let token = resolve_token_with(&cfg, Some("from-env".into())).unwrap();
        assert_eq!(token.expose_secret(), "from-env");
    }

    #[test]
    fn plaintext_token_fallback() {
        let mut cfg = Config::default();
        cfg.server.host = Some("nexview-test.invalid".into());
        cfg.server.token = Some("plain".into());
        let token = resolve_token_with(&cfg, None).unwrap();
        assert_eq!(token.expose_secret(), "plain");
    }

    #[test]
    fn no_token_without_server() {
        let cfg = Config::default();
        assert!(matches!(
            resolve_token_with(&cfg, None),
            Err(ConfigError::NoServer)
        ));
    }

    #[test]
    fn clear_forgets_endpoint_and_token() {
        let mut cfg = Config::default();
        cfg.server.host = Some("nexview-test.invalid".into());
        cfg.server.username = Some("admin".into());
        cfg.server.token = Some("plain".into());

        clear_credentials(&mut cfg);
        assert_eq!(cfg.server, ServerConfig::default());
        assert!(matches!(endpoint(&cfg), Err(ConfigError::NoServer)));
    }
}
