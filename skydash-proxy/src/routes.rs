use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

use skydash_core::model::{
    ApiError, ForecastDay, ForecastPayload, LocationQuery, WeatherPayload, WeatherReading,
};

use crate::aggregate::daily_summaries;
use crate::cache::TtlCache;
use crate::upstream::{UpstreamClient, UpstreamError};

pub const CACHE_TTL: Duration = Duration::from_secs(300);

#[derive(Debug)]
pub struct AppState {
    upstream: UpstreamClient,
    api_key: Option<String>,
    weather_cache: TtlCache<WeatherReading>,
    forecast_cache: TtlCache<Vec<ForecastDay>>,
}

impl AppState {
    pub fn new(upstream: UpstreamClient, api_key: Option<String>) -> Self {
        Self {
            upstream,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            weather_cache: TtlCache::new(CACHE_TTL),
            forecast_cache: TtlCache::new(CACHE_TTL),
        }
    }

    fn api_key(&self) -> Result<&str, ProxyError> {
        self.api_key.as_deref().ok_or(ProxyError::MissingKey)
    }
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/weather", get(weather))
        .route("/api/forecast", get(forecast))
        .with_state(state)
}

/// Raw query string: `q=<city>` or `lat=<lat>&lon=<lon>`.
#[derive(Debug, Deserialize)]
pub struct LocationParams {
    q: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

impl LocationParams {
    fn into_query(self) -> Result<LocationQuery, ProxyError> {
        match self.q {
            Some(q) if !q.is_empty() => Ok(LocationQuery::City(q)),
            _ => match (self.lat, self.lon) {
                (Some(lat), Some(lon)) => Ok(LocationQuery::Coords { lat, lon }),
                _ => Err(ProxyError::BadQuery),
            },
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ProxyError {
    #[error("Provide q=city or lat & lon")]
    BadQuery,

    #[error("Server misconfigured: OPENWEATHER_API_KEY not set")]
    MissingKey,

    #[error("Failed to reach {service} service")]
    Unreachable { service: &'static str, detail: String },

    #[error("Weather API error")]
    UpstreamStatus { status: u16, detail: String },

    #[error("Invalid weather service response")]
    UpstreamDecode { detail: String },
}

impl ProxyError {
    fn from_upstream(service: &'static str, err: UpstreamError) -> Self {
        match err {
            UpstreamError::Unreachable { source } => {
                ProxyError::Unreachable { service, detail: source.to_string() }
            }
            UpstreamError::Status { status, body } => {
                ProxyError::UpstreamStatus { status, detail: body }
            }
            UpstreamError::Decode { source } => {
                ProxyError::UpstreamDecode { detail: source.to_string() }
            }
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        let error = self.to_string();
        let (status, detail) = match self {
            ProxyError::BadQuery => (StatusCode::BAD_REQUEST, None),
            ProxyError::MissingKey => (StatusCode::INTERNAL_SERVER_ERROR, None),
            ProxyError::Unreachable { detail, .. } => (StatusCode::BAD_GATEWAY, Some(detail)),
            ProxyError::UpstreamStatus { status, detail } => (
                // Pass the upstream status through, as-is when representable.
                StatusCode::from_u16(status).unwrap_or(StatusCode::BAD_GATEWAY),
                Some(detail),
            ),
            ProxyError::UpstreamDecode { detail } => (StatusCode::BAD_GATEWAY, Some(detail)),
        };
        (status, Json(ApiError { error, detail })).into_response()
    }
}

fn cache_key(prefix: &str, query: &LocationQuery) -> String {
    match query {
        LocationQuery::City(q) => format!("{prefix}q:{q}"),
        LocationQuery::Coords { lat, lon } => format!("{prefix}lat:{lat}|lon:{lon}"),
    }
}

async fn weather(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<WeatherPayload>, ProxyError> {
    let api_key = state.api_key()?.to_string();
    let query = params.into_query()?;

    let key = cache_key("", &query);
    if let Some(data) = state.weather_cache.get(&key) {
        tracing::debug!(%query, "weather cache hit");
        return Ok(Json(WeatherPayload { cached: true, data }));
    }

    let data = state
        .upstream
        .current(&api_key, &query)
        .await
        .map_err(|e| ProxyError::from_upstream("weather", e))?;

    state.weather_cache.insert(key, data.clone());
    tracing::info!(%query, "weather served from upstream");
    Ok(Json(WeatherPayload { cached: false, data }))
}

async fn forecast(
    State(state): State<Arc<AppState>>,
    Query(params): Query<LocationParams>,
) -> Result<Json<ForecastPayload>, ProxyError> {
    let api_key = state.api_key()?.to_string();
    let query = params.into_query()?;

    let key = cache_key("forecast:", &query);
    if let Some(data) = state.forecast_cache.get(&key) {
        tracing::debug!(%query, "forecast cache hit");
        return Ok(Json(ForecastPayload { cached: true, data }));
    }

    let raw = state
        .upstream
        .forecast(&api_key, &query)
        .await
        .map_err(|e| ProxyError::from_upstream("forecast", e))?;

    let data = daily_summaries(&raw.list);
    state.forecast_cache.insert(key, data.clone());
    tracing::info!(%query, days = data.len(), "forecast served from upstream");
    Ok(Json(ForecastPayload { cached: false, data }))
}
