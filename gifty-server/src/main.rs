//! gifty-server: gift card marketplace service
//!
//! Long-running HTTP service that:
//! - Admits businesses through applications, invites and admin review
//! - Issues, validates and redeems gift cards against a remaining balance
//! - Sells gift cards through split payments to each business's sub-account
//! - Sweeps expired cards periodically

mod api;
mod auth;
mod config;
mod db;
mod email;
mod error;
mod services;
mod state;
mod stripe;
mod util;
mod wix;

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
                .unwrap_or_else(|_| "gifty_server=info,tower_http=info".into()),
        )
        .init();

    let config = Config::from_env()?;

    tracing::info!("Starting gifty-server (env: {})", config.environment);

    let state = AppState::new(&config).await?;

    let app = api::router(state.clone());

    // Periodic rate limiter cleanup (every 5 minutes)
    let rate_limiter = state.rate_limiter.clone();
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(std::time::Duration::from_secs(300));
        loop {
            interval.tick().await;
            rate_limiter.cleanup().await;
        }
    });

    // Periodic expiry sweep
    let pool = state.pool.clone();
    let sweep_period = std::time::Duration::from_secs(config.expiry_sweep_secs.max(1));
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(sweep_period);
        loop {
            interval.tick().await;
            match services::expiry::sweep(&pool).await {
                Ok(0) => {}
                Ok(count) => tracing::info!(count, "Expired gift cards swept"),
                Err(e) => tracing::error!(error = %e, "Expiry sweep failed"),
            }
        }
    });

    let http_addr = format!("0.0.0.0:{}", config.http_port);
    let listener = tokio::net::TcpListener::bind(&http_addr).await?;
    tracing::info!("gifty-server HTTP listening on {http_addr}");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<std::net::SocketAddr>(),
    )
    .await?;

    Ok(())
}
