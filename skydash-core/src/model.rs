use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// The query half of every dashboard request: a city name or a coordinate
/// pair. Renders to the `q=` / `lat=&lon=` parameters the backend expects.
#[derive(Debug, Clone, PartialEq)]
pub enum LocationQuery {
    City(String),
    Coords { lat: f64, lon: f64 },
}

impl LocationQuery {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        match self {
            LocationQuery::City(city) => vec![("q", city.clone())],
            LocationQuery::Coords { lat, lon } => {
                vec![("lat", lat.to_string()), ("lon", lon.to_string())]
            }
        }
    }
}

impl std::fmt::Display for LocationQuery {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LocationQuery::City(city) => f.write_str(city),
            LocationQuery::Coords { lat, lon } => write!(f, "{lat}, {lon}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coord {
    pub lat: f64,
    pub lon: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionInfo {
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MainReadings {
    pub temp: f64,
    pub humidity: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Wind {
    pub speed: f64,
}

/// One current-weather snapshot, exactly as `/api/weather` ships it.
///
/// Every branch is optional: the backend forwards whatever the upstream
/// returned, and the display layer substitutes placeholders for the rest.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherReading {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coord: Option<Coord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub weather: Vec<ConditionInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub main: Option<MainReadings>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wind: Option<Wind>,
}

/// Success envelope of `GET /api/weather`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPayload {
    pub cached: bool,
    pub data: WeatherReading,
}

/// One day of the aggregated forecast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastDay {
    pub date: NaiveDate,
    pub temp_avg: Option<f64>,
    pub temp_min: Option<f64>,
    pub temp_max: Option<f64>,
    pub icon: Option<String>,
    pub description: Option<String>,
}

/// Success envelope of `GET /api/forecast`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ForecastPayload {
    pub cached: bool,
    pub data: Vec<ForecastDay>,
}

/// Error envelope carried by any non-2xx backend response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApiError {
    pub error: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}
