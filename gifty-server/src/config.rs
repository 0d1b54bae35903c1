//! Service configuration

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Service configuration, read once at startup
#[derive(Debug, Clone)]
pub struct Config {
    /// PostgreSQL connection URL
    pub database_url: String,
    /// HTTP port
    pub http_port: u16,
    /// Environment: development | staging | production
    pub environment: String,
    /// JWT signing secret (HS256)
    pub jwt_secret: String,
    /// JWT lifetime in hours
    pub jwt_expiry_hours: i64,
    /// Stripe secret key
    pub stripe_secret_key: String,
    /// Stripe webhook signing secret
    pub stripe_webhook_secret: String,
    /// Resend API key; emails are skipped when absent
    pub resend_api_key: Option<String>,
    /// Sender address for transactional email
    pub email_from: String,
    /// Kill switch for all outbound email
    pub disable_emails: bool,
    /// Storefront base URL (invite links, onboarding redirects)
    pub frontend_url: String,
    /// Gift card lifetime
    pub gift_card_ttl_days: i64,
    /// Business invite lifetime
    pub invite_ttl_days: i64,
    /// Wix storefront credentials; product creation is skipped when absent
    pub wix: Option<WixConfig>,
    /// Bootstrap admin, created at startup when no admin exists
    pub bootstrap_admin: Option<(String, String)>,
    /// Expiry sweep period in seconds
    pub expiry_sweep_secs: u64,
}

#[derive(Debug, Clone)]
pub struct WixConfig {
    pub api_token: String,
    pub site_id: String,
}

fn env_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn env_opt(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

impl Config {
    /// Require a secret env var: must be set and non-empty in non-development environments.
    fn require_secret(name: &str, environment: &str) -> Result<String, BoxError> {
        let val = match std::env::var(name) {
            Ok(v) => v,
            Err(_) => {
                if environment != "development" {
                    return Err(format!("{name} must be set in {environment} environment").into());
                }
                format!("dev-{name}-not-for-production")
            }
        };
        if val.is_empty() && environment != "development" {
            return Err(format!("{name} must not be empty in {environment} environment").into());
        }
        Ok(val)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, BoxError> {
        let environment = std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into());

        let wix = match (env_opt("WIX_API_TOKEN"), env_opt("WIX_SITE_ID")) {
            (Some(api_token), Some(site_id)) => Some(WixConfig { api_token, site_id }),
            _ => None,
        };
        let bootstrap_admin = match (env_opt("ADMIN_EMAIL"), env_opt("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some((email, password)),
            _ => None,
        };

        Ok(Self {
            database_url: std::env::var("DATABASE_URL").map_err(|_| "DATABASE_URL must be set")?,
            http_port: env_or("HTTP_PORT", 8080),
            environment: environment.clone(),
            jwt_secret: Self::require_secret("JWT_SECRET", &environment)?,
            jwt_expiry_hours: env_or("JWT_EXPIRY_HOURS", 24),
            stripe_secret_key: Self::require_secret("STRIPE_SECRET_KEY", &environment)?,
            stripe_webhook_secret: Self::require_secret("STRIPE_WEBHOOK_SECRET", &environment)?,
            resend_api_key: env_opt("RESEND_API_KEY"),
            email_from: std::env::var("EMAIL_FROM")
                .unwrap_or_else(|_| "Gifty <noreply@giftysv.com>".into()),
            disable_emails: env_or("DISABLE_EMAILS", false),
            frontend_url: std::env::var("FRONTEND_URL")
                .unwrap_or_else(|_| "http://localhost:3000".into())
                .trim_end_matches('/')
                .to_string(),
            gift_card_ttl_days: env_or("GIFT_CARD_TTL_DAYS", 365),
            invite_ttl_days: env_or("INVITE_TTL_DAYS", 7),
            wix,
            bootstrap_admin,
            expiry_sweep_secs: env_or("EXPIRY_SWEEP_SECS", 3600),
        })
    }
}
