//! Backend proxy for the skydash dashboard.
//!
//! Exposes `/api/weather` and `/api/forecast` over the OpenWeatherMap API,
//! with a short-lived response cache and per-day forecast aggregation.

use anyhow::Context;
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

mod aggregate;
mod cache;
mod routes;
mod upstream;

use routes::AppState;
use upstream::UpstreamClient;

#[derive(Debug, Parser)]
#[command(name = "skydash-proxy", version, about = "Weather dashboard backend proxy")]
struct Args {
    /// Port to listen on.
    #[arg(long, env = "PORT", default_value_t = 5000)]
    port: u16,

    /// OpenWeatherMap API key.
    #[arg(long, env = "OPENWEATHER_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    let args = Args::parse();
    if args.api_key.is_none() {
        tracing::warn!("OPENWEATHER_API_KEY not set; every request will fail with 500");
    }

    let state = Arc::new(AppState::new(UpstreamClient::default(), args.api_key));
    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], args.port));
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    tracing::info!("listening on http://{addr}");
    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
