//! Machine location via IP geolocation.
//!
//! The free ip-api.com tier is HTTP-only; coordinates for a weather lookup
//! are not sensitive enough to warrant a paid HTTPS plan.

use serde::Deserialize;
use std::time::Duration;

use crate::model::Coord;

const LOCATE_URL: &str = "http://ip-api.com/json/?fields=status,message,lat,lon";
const LOCATE_TIMEOUT: Duration = Duration::from_secs(3);

/// Why a location lookup failed. Surfaced as a status message, never
/// propagated past the dashboard's event loop.
#[derive(Debug, thiserror::Error)]
pub enum LocationError {
    #[error("location service unavailable")]
    Unavailable,
    #[error("location request timed out")]
    Timeout,
    #[error("{0}")]
    Other(String),
}

#[derive(Debug, Deserialize)]
struct LocateResponse {
    status: String,
    message: Option<String>,
    lat: Option<f64>,
    lon: Option<f64>,
}

/// Resolve the machine's coordinates from its public IP.
pub async fn locate() -> Result<Coord, LocationError> {
    locate_with(LOCATE_URL).await
}

async fn locate_with(url: &str) -> Result<Coord, LocationError> {
    let client = reqwest::Client::builder()
        .timeout(LOCATE_TIMEOUT)
        .build()
        .map_err(|e| LocationError::Other(e.to_string()))?;

    let res = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            LocationError::Timeout
        } else if e.is_connect() {
            LocationError::Unavailable
        } else {
            LocationError::Other(e.to_string())
        }
    })?;

    if !res.status().is_success() {
        tracing::debug!(status = res.status().as_u16(), "location lookup rejected");
        return Err(LocationError::Unavailable);
    }

    let body: LocateResponse =
        res.json().await.map_err(|e| LocationError::Other(e.to_string()))?;

    if body.status != "success" {
        return Err(LocationError::Other(
            body.message.unwrap_or_else(|| "location lookup failed".to_string()),
        ));
    }

    match (body.lat, body.lon) {
        (Some(lat), Some(lon)) => {
            tracing::info!(lat, lon, "located via IP");
            Ok(Coord { lat, lon })
        }
        _ => Err(LocationError::Other("location lookup returned no coordinates".to_string())),
    }
}
