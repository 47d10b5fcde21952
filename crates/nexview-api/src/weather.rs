// Current-conditions lookup against the open-meteo forecast API.
//
// Single request, no retry, no caching.

use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use crate::client::parse_json;
use crate::error::Error;
use crate::transport::TransportConfig;

/// Public open-meteo endpoint.
pub const DEFAULT_WEATHER_URL: &str = "https://api.open-meteo.com/";

/// Current weather at a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherInfo {
    /// Air temperature in °C.
    pub temperature: f64,
    /// Whether the sun is up at the location.
    pub is_day: bool,
}

#[derive(Deserialize)]
struct ForecastResponse {
    current_weather: CurrentWeather,
}

#[derive(Deserialize)]
struct CurrentWeather {
    temperature: f64,
    #[serde(default)]
    is_day: u8,
}

pub struct WeatherClient {
    http: reqwest::Client,
    base_url: Url,
}

impl WeatherClient {
    pub fn new(base_url: Url, transport: &TransportConfig) -> Result<Self, Error> {
        Ok(Self {
            http: transport.build_client()?,
            base_url,
        })
    }

    pub fn with_client(http: reqwest::Client, base_url: Url) -> Self {
        Self { http, base_url }
    }

    /// Fetch current conditions for a latitude/longitude pair.
    pub async fn current(&self, latitude: f64, longitude: f64) -> Result<WeatherInfo, Error> {
        let mut url = self.base_url.join("v1/forecast")?;
        url.query_pairs_mut()
            .append_pair("latitude", &latitude.to_string())
            .append_pair("longitude", &longitude.to_string())
            .append_pair("current_weather", "true");

        debug!("GET {}", url);
        let resp = self.http.get(url).send().await?;
        let forecast: ForecastResponse = parse_json(resp).await?;

        Ok(WeatherInfo {
            temperature: forecast.current_weather.temperature,
            is_day: forecast.current_weather.is_day != 0,
        })
    }
}
