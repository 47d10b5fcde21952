// ── One-shot requests ──
//
// Calls that do not need a session: login and the weather lookup. Each
// is a single request with no retry; failures come back as `CoreError`.

use secrecy::SecretString;
use tracing::info;
use url::Url;

use nexview_api::{ApiClient, WeatherClient, WeatherInfo};

use crate::config::{Endpoint, SessionConfig};
use crate::error::CoreError;

/// Exchange username and password for a bearer token.
pub async fn login(
    endpoint: &Endpoint,
    username: &str,
    password: &SecretString,
    config: &SessionConfig,
) -> Result<SecretString, CoreError> {
    let client = ApiClient::new(endpoint.base_url()?, &config.transport())?;
    let token = client
        .login(username, password)
        .await
        .map_err(|e| with_timeout(e.into(), config))?;
    info!(endpoint = %endpoint, username, "logged in");
    Ok(token)
}

/// Current conditions at a location from the open-meteo API at `base_url`.
pub async fn current_weather(
    base_url: Url,
    latitude: f64,
    longitude: f64,
    config: &SessionConfig,
) -> Result<WeatherInfo, CoreError> {
    if !(-90.0..=90.0).contains(&latitude) || !(-180.0..=180.0).contains(&longitude) {
        return Err(CoreError::Config {
            message: format!("location out of range: {latitude}, {longitude}"),
        });
    }
    let client = WeatherClient::new(base_url, &config.transport())?;
    client
        .current(latitude, longitude)
        .await
        .map_err(|e| with_timeout(e.into(), config))
}

/// reqwest timeouts carry no duration; fill in the configured one.
fn with_timeout(err: CoreError, config: &SessionConfig) -> CoreError {
    match err {
        CoreError::Timeout { timeout_secs: 0 } => CoreError::Timeout {
            timeout_secs: config.timeout.as_secs(),
        },
        other => other,
    }
}
