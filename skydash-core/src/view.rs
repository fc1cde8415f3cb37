//! Projection of backend payloads into the strings and series the dashboard
//! draws. Everything here is pure so the rendering contract can be tested
//! without a terminal or a network.

use crate::model::{ForecastDay, WeatherReading};

/// Shown wherever a source field is absent.
pub const PLACEHOLDER: &str = "-";

/// Legend of the chart's single dataset.
pub const CHART_DATASET_LABEL: &str = "Avg Temp (°C)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusKind {
    Info,
    Error,
}

/// The shared status line. One per dashboard; whichever request finishes
/// last owns it.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusLine {
    pub text: String,
    pub kind: StatusKind,
}

impl StatusLine {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: StatusKind::Info }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), kind: StatusKind::Error }
    }

    pub fn idle() -> Self {
        Self::info("Ready")
    }

    pub fn loading() -> Self {
        Self::info("Loading...")
    }

    pub fn loaded(cached: bool) -> Self {
        Self::info(if cached { "Loaded (cached)" } else { "Loaded" })
    }

    pub fn loading_forecast() -> Self {
        Self::info("Loading forecast...")
    }

    pub fn forecast_loaded() -> Self {
        Self::info("Forecast loaded")
    }

    pub fn locating() -> Self {
        Self::info("Getting location...")
    }

    pub fn empty_city() -> Self {
        Self::error("Please enter a city")
    }

    pub fn fetch_error(message: &str) -> Self {
        Self::error(format!("Error: {message}"))
    }

    pub fn forecast_error(message: &str) -> Self {
        Self::error(format!("Forecast error: {message}"))
    }

    pub fn location_error(message: &str) -> Self {
        Self::error(format!("Geolocation error: {message}"))
    }

    pub fn is_error(&self) -> bool {
        self.kind == StatusKind::Error
    }
}

/// Current conditions, formatted for display. A reading with gaps renders
/// placeholders instead of failing.
#[derive(Debug, Clone, PartialEq)]
pub struct ReadingView {
    /// Location name; empty when the backend had none.
    pub location: String,
    /// "18 °C"
    pub temperature: String,
    /// "clear sky"
    pub condition: String,
    /// "60%"
    pub humidity: String,
    /// "3 m/s"
    pub wind: String,
    /// "48.85, 2.35"
    pub coord: String,
}

impl From<&WeatherReading> for ReadingView {
    fn from(reading: &WeatherReading) -> Self {
        let main = reading.main.as_ref();
        Self {
            location: reading.name.clone().unwrap_or_default(),
            temperature: main
                .map(|m| format!("{} °C", m.temp))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            condition: reading
                .weather
                .first()
                .map(|w| w.description.clone())
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            humidity: main
                .map(|m| format!("{}%", m.humidity))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            wind: reading
                .wind
                .as_ref()
                .map(|w| format!("{} m/s", w.speed))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
            coord: reading
                .coord
                .as_ref()
                .map(|c| format!("{}, {}", c.lat, c.lon))
                .unwrap_or_else(|| PLACEHOLDER.to_string()),
        }
    }
}

/// One forecast card: date, condition glyph, description, min/max band.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastCard {
    pub date: String,
    pub icon: String,
    pub description: String,
    /// "9.1° / 15°", dash per missing bound.
    pub temps: String,
}

impl From<&ForecastDay> for ForecastCard {
    fn from(day: &ForecastDay) -> Self {
        Self {
            date: day.date.to_string(),
            icon: day.icon.as_deref().map(icon_glyph).unwrap_or_default(),
            description: day.description.clone().unwrap_or_default(),
            temps: format!(
                "{}° / {}°",
                fmt_temp_bound(day.temp_min),
                fmt_temp_bound(day.temp_max)
            ),
        }
    }
}

fn fmt_temp_bound(bound: Option<f64>) -> String {
    bound.map(|t| t.to_string()).unwrap_or_else(|| PLACEHOLDER.to_string())
}

/// Map an OpenWeatherMap icon code ("01d", "10n", ...) to a terminal glyph.
/// Unknown families fall back to the raw code.
fn icon_glyph(code: &str) -> String {
    let glyph = match code.get(..2) {
        Some("01") => "☀",
        Some("02") => "⛅",
        Some("03") | Some("04") => "☁",
        Some("09") | Some("10") => "☂",
        Some("11") => "⚡",
        Some("13") => "❄",
        Some("50") => "≡",
        _ => return code.to_string(),
    };
    glyph.to_string()
}

/// Data series behind the temperature line chart: one point per day that
/// has an average, labelled with the day's date.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartSeries {
    pub labels: Vec<String>,
    /// (day index, avg temp) pairs; days without an average are skipped.
    pub points: Vec<(f64, f64)>,
    pub x_bounds: [f64; 2],
    /// Padded around the observed range, never forced through zero.
    pub y_bounds: [f64; 2],
}

impl ChartSeries {
    fn from_days(days: &[ForecastDay]) -> Self {
        let labels = days.iter().map(|d| d.date.to_string()).collect::<Vec<_>>();
        let points = days
            .iter()
            .enumerate()
            .filter_map(|(i, d)| d.temp_avg.map(|t| (i as f64, t)))
            .collect::<Vec<_>>();

        let x_bounds = [0.0, (days.len().saturating_sub(1)).max(1) as f64];
        let y_bounds = match points.iter().map(|&(_, t)| t).fold(None, min_max) {
            Some((lo, hi)) => [lo - 1.0, hi + 1.0],
            None => [0.0, 1.0],
        };

        Self { labels, points, x_bounds, y_bounds }
    }
}

fn min_max(acc: Option<(f64, f64)>, t: f64) -> Option<(f64, f64)> {
    match acc {
        None => Some((t, t)),
        Some((lo, hi)) => Some((lo.min(t), hi.max(t))),
    }
}

/// The whole forecast section. Replaced on every successful forecast fetch;
/// `from_days` returns `None` for an empty list, which hides the section.
#[derive(Debug, Clone, PartialEq)]
pub struct ForecastView {
    pub cards: Vec<ForecastCard>,
    pub chart: ChartSeries,
}

impl ForecastView {
    pub fn from_days(days: &[ForecastDay]) -> Option<Self> {
        if days.is_empty() {
            return None;
        }
        Some(Self {
            cards: days.iter().map(ForecastCard::from).collect(),
            chart: ChartSeries::from_days(days),
        })
    }
}
