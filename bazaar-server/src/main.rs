//! bazaar-server: multi-shop bazaar back office
//!
//! Long-running service that:
//! - Takes storefront checkouts (cash on delivery or prepaid)
//! - Drives orders through payment, confirmation and delivery
//! - Keeps per-shop stock levels and their movement history
//! - Provides staff endpoints behind JWT authentication

mod api;
mod auth;
mod config;
mod db;
mod error;
mod gateway;
mod state;
mod stock;
mod util;
mod workflow;

use config::Config;
use state::AppState;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

#[tokio::main]
async fn main() -> Result<(), BoxError> {
    // Load .env file
    let _ = dotenvy::dotenv();

    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "bazaar_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting bazaar-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    let app = api::create_router(state);

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("bazaar-server HTTP listening on {http_addr}");

    axum::serve(listener, app).await?;

    Ok(())
}
