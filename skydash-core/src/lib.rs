//! Core library for the skydash weather dashboard.
//!
//! This crate defines:
//! - The wire model shared by the backend proxy and the terminal UI
//! - The backend client seam the dashboard issues its reads through
//! - Pure view projection (status line, reading fields, cards, chart series)
//! - IP geolocation and on-disk configuration
//!
//! It is used by `skydash-tui` and `skydash-proxy`, but can also be reused
//! by other frontends or services.

pub mod backend;
pub mod config;
pub mod location;
pub mod model;
pub mod view;

pub use backend::{Backend, BackendError, HttpBackend};
pub use config::{Config, DEFAULT_BACKEND_URL};
pub use location::{LocationError, locate};
pub use model::{
    ApiError, Coord, ForecastDay, ForecastPayload, LocationQuery, WeatherPayload, WeatherReading,
};
pub use view::{ForecastView, ReadingView, StatusLine};
