mod config;
mod error;
mod gemini;
mod models;
mod prompt;
mod routes;
mod session;
mod validation;

use routes::AppState;
use std::net::SocketAddr;
use tracing_subscriber::{fmt, EnvFilter};
use std::sync::Arc;

use crate::{config::AppConfig, gemini::LayoutClient};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    // Init tracing
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = AppConfig::from_env();
    tracing::info!(model = %config.model, base = %config.api_base, mock = config.mock_mode(), "Layout client configured");

    let state = AppState {
        sessions: Arc::default(),
        layouts: Arc::new(LayoutClient::from_config(&config)?),
    };

    let app = routes::router(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!(%addr, "Starting server");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
