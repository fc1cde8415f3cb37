use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::fmt::Debug;

use crate::model::{ApiError, ForecastPayload, LocationQuery, WeatherPayload};

/// Failure of one dashboard request. The `Display` text is what the status
/// line shows after its "Error: " prefix.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("failed to reach the {endpoint} endpoint: {source}")]
    Transport {
        endpoint: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Non-2xx response; `message` is the body's `error` field when the body
    /// was a well-formed error envelope, the raw body otherwise.
    #[error("{message}")]
    Api { status: u16, message: String },

    #[error("unreadable {endpoint} response: {source}")]
    Decode {
        endpoint: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Seam between the dashboard and its backend. The dashboard only ever
/// issues these two reads.
#[async_trait]
pub trait Backend: Send + Sync + Debug {
    async fn current_weather(
        &self,
        query: &LocationQuery,
    ) -> Result<WeatherPayload, BackendError>;

    async fn forecast(&self, query: &LocationQuery) -> Result<ForecastPayload, BackendError>;
}

/// HTTP implementation against the proxy's `/api/weather` and
/// `/api/forecast` endpoints.
#[derive(Debug, Clone)]
pub struct HttpBackend {
    base_url: String,
    http: Client,
}

impl HttpBackend {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, http: Client::new() }
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        endpoint: &'static str,
        query: &LocationQuery,
    ) -> Result<T, BackendError> {
        let url = format!("{}/api/{endpoint}", self.base_url);

        let res = self
            .http
            .get(&url)
            .query(&query.query_pairs())
            .send()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;

        let status = res.status();
        let body = res
            .text()
            .await
            .map_err(|source| BackendError::Transport { endpoint, source })?;

        if !status.is_success() {
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|e| e.error)
                .unwrap_or_else(|_| truncate_body(&body));
            tracing::warn!(endpoint, status = status.as_u16(), %message, "backend error");
            return Err(BackendError::Api { status: status.as_u16(), message });
        }

        serde_json::from_str(&body).map_err(|source| BackendError::Decode { endpoint, source })
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn current_weather(
        &self,
        query: &LocationQuery,
    ) -> Result<WeatherPayload, BackendError> {
        tracing::debug!(%query, "fetching current weather");
        self.get_json("weather", query).await
    }

    async fn forecast(&self, query: &LocationQuery) -> Result<ForecastPayload, BackendError> {
        tracing::debug!(%query, "fetching forecast");
        self.get_json("forecast", query).await
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() > MAX { format!("{}...", &body[..MAX]) } else { body.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn current_weather_decodes_success_envelope() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .and(query_param("q", "Paris"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cached": true,
                "data": {
                    "name": "Paris",
                    "main": {"temp": 18, "humidity": 60},
                    "weather": [{"description": "clear sky"}],
                    "wind": {"speed": 3},
                    "coord": {"lat": 48.85, "lon": 2.35}
                }
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri());
        let payload = backend
            .current_weather(&LocationQuery::City("Paris".to_string()))
            .await
            .expect("request succeeds");

        assert!(payload.cached);
        assert_eq!(payload.data.name.as_deref(), Some("Paris"));
    }

    #[tokio::test]
    async fn forecast_sends_coordinates_as_query_params() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .and(query_param("lat", "48.85"))
            .and(query_param("lon", "2.35"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "cached": false,
                "data": []
            })))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri());
        let payload = backend
            .forecast(&LocationQuery::Coords { lat: 48.85, lon: 2.35 })
            .await
            .expect("request succeeds");

        assert!(payload.data.is_empty());
    }

    #[tokio::test]
    async fn error_envelope_surfaces_its_message() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(
                ResponseTemplate::new(404)
                    .set_body_json(json!({"error": "city not found", "detail": "404"})),
            )
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri());
        let err = backend
            .current_weather(&LocationQuery::City("Atlantis".to_string()))
            .await
            .expect_err("request fails");

        match err {
            BackendError::Api { status, message } => {
                assert_eq!(status, 404);
                assert_eq!(message, "city not found");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_error_body_is_passed_through_truncated() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/weather"))
            .respond_with(ResponseTemplate::new(502).set_body_string("upstream blew up"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri());
        let err = backend
            .current_weather(&LocationQuery::City("Paris".to_string()))
            .await
            .expect_err("request fails");

        assert_eq!(err.to_string(), "upstream blew up");
    }

    #[tokio::test]
    async fn garbage_success_body_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/forecast"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let backend = HttpBackend::new(server.uri());
        let err = backend
            .forecast(&LocationQuery::City("Paris".to_string()))
            .await
            .expect_err("request fails");

        assert!(matches!(err, BackendError::Decode { endpoint: "forecast", .. }));
    }

    #[test]
    fn long_bodies_are_truncated() {
        let body = "x".repeat(300);
        let out = truncate_body(&body);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
    }
}
