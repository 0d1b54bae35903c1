//! Application state for gifty-server

use sqlx::PgPool;
use std::time::Duration;

use crate::auth::rate_limit::RateLimiter;
use crate::config::{Config, WixConfig};
use crate::email::Mailer;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Timeout applied to every outbound provider call
const PROVIDER_TIMEOUT: Duration = Duration::from_secs(30);

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// PostgreSQL connection pool
    pub pool: PgPool,
    /// HTTP client for Stripe, Resend and Wix
    pub http: reqwest::Client,
    /// Transactional email sender
    pub mailer: Mailer,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// JWT secret
    pub jwt_secret: String,
    pub jwt_expiry_hours: i64,
    /// Storefront base URL
    pub frontend_url: String,
    pub gift_card_ttl_days: i64,
    pub invite_ttl_days: i64,
    /// Wix storefront credentials, if configured
    pub wix: Option<WixConfig>,
    /// Rate limiter for login/registration routes
    pub rate_limiter: RateLimiter,
}

impl AppState {
    /// Create a new AppState: connect, migrate, bootstrap the first admin
    pub async fn new(config: &Config) -> Result<Self, BoxError> {
        let pool = PgPool::connect(&config.database_url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;

        if let Some((email, password)) = &config.bootstrap_admin {
            crate::services::accounts::ensure_bootstrap_admin(&pool, email, password).await?;
        }

        let http = reqwest::Client::builder()
            .timeout(PROVIDER_TIMEOUT)
            .build()?;

        let mailer = Mailer::new(
            http.clone(),
            config.resend_api_key.clone(),
            config.email_from.clone(),
            config.disable_emails,
        );

        Ok(Self {
            pool,
            http,
            mailer,
            stripe_secret_key: config.stripe_secret_key.clone(),
            stripe_webhook_secret: config.stripe_webhook_secret.clone(),
            jwt_secret: config.jwt_secret.clone(),
            jwt_expiry_hours: config.jwt_expiry_hours,
            frontend_url: config.frontend_url.clone(),
            gift_card_ttl_days: config.gift_card_ttl_days,
            invite_ttl_days: config.invite_ttl_days,
            wix: config.wix.clone(),
            rate_limiter: RateLimiter::new(),
        })
    }
}
