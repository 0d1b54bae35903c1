//! JWT authentication for users, businesses and admins

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use http::HeaderMap;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use shared::error::{AppError, ErrorCode};
use shared::models::Role;

use crate::state::AppState;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Principal id (user, business or admin row id)
    pub sub: String,
    pub role: Role,
    pub email: String,
    /// Expiration (Unix timestamp seconds)
    pub exp: usize,
    /// Issued at (Unix timestamp seconds)
    pub iat: usize,
}

/// Authenticated principal extracted from a verified JWT
#[derive(Debug, Clone)]
pub struct Identity {
    pub id: i64,
    pub role: Role,
    pub email: String,
}

impl Identity {
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// The business this principal acts for, if it is a business
    pub fn business_id(&self) -> Option<i64> {
        (self.role == Role::Business).then_some(self.id)
    }
}

/// Create a signed token for a principal
pub fn create_token(
    id: i64,
    role: Role,
    email: &str,
    secret: &str,
    expiry_hours: i64,
) -> Result<String, jsonwebtoken::errors::Error> {
    let now = chrono::Utc::now();
    let claims = Claims {
        sub: id.to_string(),
        role,
        email: email.to_string(),
        exp: (now + chrono::Duration::hours(expiry_hours)).timestamp() as usize,
        iat: now.timestamp() as usize,
    };

    jsonwebtoken::encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

/// Decode and verify a token
pub fn decode_token(token: &str, secret: &str) -> Result<Identity, AppError> {
    let token_data = jsonwebtoken::decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| {
        tracing::debug!("JWT validation failed: {e}");
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AppError::token_expired(),
            _ => AppError::invalid_token("Invalid or expired token"),
        }
    })?;

    let id = token_data
        .claims
        .sub
        .parse()
        .map_err(|_| AppError::invalid_token("Invalid token subject"))?;

    Ok(Identity {
        id,
        role: token_data.claims.role,
        email: token_data.claims.email,
    })
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, AppError> {
    let auth_header = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| {
            AppError::with_message(ErrorCode::NotAuthenticated, "Missing Authorization header")
        })?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or_else(|| AppError::invalid_token("Invalid Authorization format"))
}

/// Identity for routes where login is optional (guest checkout).
/// A missing or invalid token yields `None`.
pub fn optional_identity(headers: &HeaderMap, secret: &str) -> Option<Identity> {
    let token = bearer_token(headers).ok()?;
    decode_token(token, secret).ok()
}

async fn authorize(
    state: &AppState,
    mut request: Request,
    next: Next,
    allowed: &[Role],
) -> Result<Response, AppError> {
    let token = bearer_token(request.headers())?;
    let identity = decode_token(token, &state.jwt_secret)?;
    check_role(&identity, allowed)?;

    request.extensions_mut().insert(identity);
    Ok(next.run(request).await)
}

fn check_role(identity: &Identity, allowed: &[Role]) -> Result<(), AppError> {
    if allowed.contains(&identity.role) {
        return Ok(());
    }
    tracing::warn!(
        principal_id = identity.id,
        role = identity.role.as_str(),
        "Access denied for role"
    );
    let code = if allowed == [Role::Admin] {
        ErrorCode::AdminRequired
    } else {
        ErrorCode::RoleRequired
    };
    Err(AppError::new(code))
}

/// Storefront users only
pub async fn require_user(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, &[Role::User]).await
}

/// Business accounts only
pub async fn require_business(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, &[Role::Business]).await
}

/// Admins only
pub async fn require_admin(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, &[Role::Admin]).await
}

/// Businesses and admins (gift card operations)
pub async fn require_staff(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    authorize(&state, request, next, &[Role::Business, Role::Admin]).await
}
