//! OpenWeatherMap upstream client.

use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

use skydash_core::model::{ConditionInfo, LocationQuery, WeatherReading};

pub const OPENWEATHER_API_BASE: &str = "https://api.openweathermap.org";

const CURRENT_TIMEOUT: Duration = Duration::from_secs(5);
const FORECAST_TIMEOUT: Duration = Duration::from_secs(6);

#[derive(Debug, thiserror::Error)]
pub enum UpstreamError {
    #[error("failed to reach the weather service: {source}")]
    Unreachable {
        #[source]
        source: reqwest::Error,
    },

    /// Upstream answered with a non-2xx status; its body is forwarded as the
    /// error detail.
    #[error("weather service returned status {status}")]
    Status { status: u16, body: String },

    #[error("unreadable weather service response: {source}")]
    Decode {
        #[source]
        source: serde_json::Error,
    },
}

/// One 3-hourly slot of the raw 5-day forecast.
#[derive(Debug, Clone, Deserialize)]
pub struct OwSlot {
    pub dt_txt: String,
    pub main: Option<OwSlotMain>,
    #[serde(default)]
    pub weather: Vec<ConditionInfo>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct OwSlotMain {
    pub temp: f64,
    pub temp_min: f64,
    pub temp_max: f64,
}

#[derive(Debug, Deserialize)]
pub struct OwForecastResponse {
    #[serde(default)]
    pub list: Vec<OwSlot>,
}

#[derive(Debug, Clone)]
pub struct UpstreamClient {
    base_url: String,
    http: Client,
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new(OPENWEATHER_API_BASE)
    }
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http: Client::new() }
    }

    /// Current conditions. Deserializing into the shared `WeatherReading`
    /// does the projection the dashboard needs; everything else the
    /// upstream sends is dropped.
    pub async fn current(
        &self,
        api_key: &str,
        query: &LocationQuery,
    ) -> Result<WeatherReading, UpstreamError> {
        let url = format!("{}/data/2.5/weather", self.base_url);
        self.get_json(&url, api_key, query, CURRENT_TIMEOUT).await
    }

    /// Raw 5-day / 3-hourly forecast; callers aggregate it per day.
    pub async fn forecast(
        &self,
        api_key: &str,
        query: &LocationQuery,
    ) -> Result<OwForecastResponse, UpstreamError> {
        let url = format!("{}/data/2.5/forecast", self.base_url);
        self.get_json(&url, api_key, query, FORECAST_TIMEOUT).await
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        url: &str,
        api_key: &str,
        query: &LocationQuery,
        timeout: Duration,
    ) -> Result<T, UpstreamError> {
        let mut pairs = query.query_pairs();
        pairs.push(("appid", api_key.to_string()));
        pairs.push(("units", "metric".to_string()));

        let res = self
            .http
            .get(url)
            .query(&pairs)
            .timeout(timeout)
            .send()
            .await
            .map_err(|source| UpstreamError::Unreachable { source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| UpstreamError::Unreachable { source })?;

        if !status.is_success() {
            tracing::warn!(%url, status = status.as_u16(), "upstream error");
            return Err(UpstreamError::Status { status: status.as_u16(), body });
        }

        serde_json::from_str(&body).map_err(|source| UpstreamError::Decode { source })
    }
}
