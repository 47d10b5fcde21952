// Telemetry server HTTP client
//
// Wraps `reqwest::Client` with URL construction under `/v1/`, bearer
// auth, and status/body handling. The two calls the server exposes are
// the password login and the streaming-socket bootstrap.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::models::{LoginRequest, LoginResponse, SocketResponse, SocketTicket};
use crate::transport::TransportConfig;

/// Raw HTTP client for a single telemetry server.
pub struct ApiClient {
    http: reqwest::Client,
    base_url: Url,
}

impl ApiClient {
    /// Create a new client from a `TransportConfig`.
    ///
    /// `base_url` is the server root, e.g. `http://10.0.0.5:9384/`.
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Ok(Self { http, base_url })
    }

    /// Create a client with a pre-built `reqwest::Client`.
    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// The server base URL.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Build `{base}/v1/{path}`.
    fn api_url(&self, path: &str) -> Result<Url, Error> {
        let mut base = self.base_url.clone();
        if !base.path().ends_with('/') {
            let with_slash = format!("{}/", base.path());
            base.set_path(&with_slash);
        }
        Ok(base.join(&format!("v1/{path}"))?)
    }

    /// Exchange username/password for the long-lived bearer token.
    pub async fn login(&self, username: &str, password: &SecretString) -> Result<SecretString, Error> {
        let url = self.api_url("login")?;
        debug!("logging in at {}", url);

        let resp = self
            .http
            .post(url)
            .json(&LoginRequest::new(username, password.expose_secret()))
            .send()
            .await?;

        let status = resp.status();
        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN {
            let body = resp.text().await.unwrap_or_default();
            return Err(Error::Authentication {
                message: format!("login failed (HTTP {status}): {body}"),
            });
        }

        let login: LoginResponse = parse_json(resp).await?;
        if login.token.is_empty() {
            return Err(Error::Authentication {
                message: "server returned an empty token".into(),
            });
        }

        debug!("login successful");
        Ok(SecretString::from(login.token))
    }

    /// Fetch the streaming-socket address and a one-time ticket.
    ///
    /// `GET /v1/websocket` with `Authorization: Bearer <token>`.
    pub async fn socket_ticket(&self, token: &SecretString) -> Result<SocketTicket, Error> {
        let url = self.api_url("websocket")?;
        debug!("GET {}", url);

        let resp = self
            .http
            .get(url)
            .bearer_auth(token.expose_secret())
            .send()
            .await?;

        if resp.status() == reqwest::StatusCode::UNAUTHORIZED {
            return Err(Error::SessionExpired);
        }

        let envelope: SocketResponse = parse_json(resp).await?;
        Ok(envelope.data)
    }
}

/// Check the status, then decode the body as `T`.
pub(crate) async fn parse_json<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
    let status = resp.status();
    let body = resp.text().await?;

    if !status.is_success() {
        return Err(Error::Http {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|e| Error::Deserialization {
        message: e.to_string(),
        body,
    })
}
