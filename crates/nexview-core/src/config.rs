// ── Runtime connection configuration ──
//
// These types describe *where* and *how* to connect to a telemetry
// server. They never touch disk: the CLI builds a `SessionConfig` from
// its config file and flags and hands it in.

use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use nexview_api::transport::{TlsMode, TransportConfig};
use url::Url;

use crate::error::CoreError;
use crate::reconnect::ReconnectPolicy;

/// Server address. Immutable for the lifetime of a session.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    host: String,
    port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// HTTP root of the server API, e.g. `http://10.0.0.5:9384/`.
    pub fn base_url(&self) -> Result<Url, CoreError> {
        Url::parse(&format!("http://{self}/")).map_err(|e| CoreError::Config {
            message: format!("invalid endpoint '{self}': {e}"),
        })
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

impl FromStr for Endpoint {
    type Err = CoreError;

    /// Parse `host:port` (IPv6 hosts in brackets).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| CoreError::Config {
            message: format!("invalid endpoint '{s}': {reason}"),
        };

        let (host, port) = s.trim().rsplit_once(':').ok_or_else(|| invalid("expected host:port"))?;
        let host = host.trim_start_matches('[').trim_end_matches(']');
        if host.is_empty() {
            return Err(invalid("empty host"));
        }
        let port = port.parse::<u16>().map_err(|_| invalid("port must be 0-65535"))?;
        Ok(Self::new(host, port))
    }
}

/// TLS verification strategy.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum TlsVerification {
    /// System CA store (strict).
    #[default]
    SystemDefaults,
    /// Custom CA certificate file.
    CustomCa(std::path::PathBuf),
    /// Skip verification (self-signed certs).
    DangerAcceptInvalid,
}

/// Configuration for a [`Session`](crate::Session).
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Timeout for the bootstrap request and the socket handshake.
    pub timeout: Duration,
    /// TLS verification strategy.
    pub tls: TlsVerification,
    /// Delay policy between reconnection attempts.
    pub reconnect: ReconnectPolicy,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            tls: TlsVerification::default(),
            reconnect: ReconnectPolicy::default(),
        }
    }
}

impl SessionConfig {
    /// HTTP transport settings for the bootstrap, login, and weather calls.
    pub(crate) fn transport(&self) -> TransportConfig {
        TransportConfig {
            tls: match &self.tls {
                TlsVerification::SystemDefaults => TlsMode::System,
                TlsVerification::CustomCa(path) => TlsMode::CustomCa(path.clone()),
                TlsVerification::DangerAcceptInvalid => TlsMode::DangerAcceptInvalid,
            },
            timeout: self.timeout,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn parse_host_port() {
        let ep: Endpoint = "10.0.0.5:9384".parse().unwrap();
        assert_eq!(ep.host(), "10.0.0.5");
        assert_eq!(ep.port(), 9384);
        assert_eq!(ep.base_url().unwrap().as_str(), "http://10.0.0.5:9384/");
    }

    #[test]
    fn parse_ipv6() {
        let ep: Endpoint = "[fe80::1]:9384".parse().unwrap();
        assert_eq!(ep.host(), "fe80::1");
        assert_eq!(ep.to_string(), "[fe80::1]:9384");
        assert_eq!(ep.base_url().unwrap().as_str(), "http://[fe80::1]:9384/");
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!("10.0.0.5".parse::<Endpoint>().is_err());
        assert!(":9384".parse::<Endpoint>().is_err());
        assert!("host:99999".parse::<Endpoint>().is_err());
    }

    #[test]
    fn transport_follows_tls_setting() {
        let config = SessionConfig {
            tls: TlsVerification::DangerAcceptInvalid,
            timeout: Duration::from_secs(3),
            ..SessionConfig::default()
        };
        let transport = config.transport();
        assert!(matches!(transport.tls, TlsMode::DangerAcceptInvalid));
        assert_eq!(transport.timeout_secs(), 3);
    }
}
