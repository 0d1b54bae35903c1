//! HTTP routes for gifty-server

pub mod admin;
pub mod admin_auth;
pub mod auth;
pub mod business_auth;
pub mod businesses;
pub mod gift_cards;
pub mod health;
pub mod payments;
pub mod stripe_webhook;
pub mod users;

use std::time::Duration;

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, post, put};
use axum::{Router, middleware};
use http::{HeaderName, HeaderValue, StatusCode};
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::request_id::{
    MakeRequestId, PropagateRequestIdLayer, RequestId, SetRequestIdLayer,
};
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::jwt::{require_admin, require_business, require_staff, require_user};
use crate::auth::rate_limit::{login_rate_limit, register_rate_limit};
use crate::state::AppState;

pub type ApiResult<T> = Result<axum::Json<T>, AppError>;

/// Log a database error and hide it behind `InternalError`
pub fn db_error(e: sqlx::Error) -> AppError {
    tracing::error!(error = %e, "Database error");
    AppError::new(ErrorCode::InternalError)
}

const DEFAULT_PAGE_SIZE: i64 = 50;
const MAX_PAGE_SIZE: i64 = 200;

/// `?limit=&offset=` query
#[derive(Debug, Default, Deserialize)]
pub struct Page {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl Page {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Clone)]
struct XRequestId;

impl MakeRequestId for XRequestId {
    fn make_request_id<B>(&mut self, _request: &http::Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&uuid::Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Build the full application router
pub fn router(state: AppState) -> Router {
    let request_id = HeaderName::from_static("x-request-id");

    // Login (5/min per IP)
    let login = Router::new()
        .route("/api/auth/login", post(auth::login))
        .route("/api/business-auth/login", post(business_auth::login))
        .route("/api/admin-auth/login", post(admin_auth::login))
        .layer(middleware::from_fn_with_state(state.clone(), login_rate_limit));

    // Registration (3/min per IP)
    let registration = Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/business-auth/register", post(business_auth::register))
        .layer(middleware::from_fn_with_state(state.clone(), register_rate_limit));

    // Public storefront
    let public = Router::new()
        .route("/health", get(health::health_check))
        .route("/api/businesses", get(businesses::list_public))
        .route("/api/businesses/{slug}", get(businesses::get_by_slug))
        .route("/api/payments/purchase-gift-card", post(payments::purchase_gift_card))
        .route("/api/payments/webhook", post(stripe_webhook::handle_webhook));

    // Storefront user
    let user = Router::new()
        .route("/api/users/me/gift-cards", get(users::my_gift_cards))
        .layer(middleware::from_fn_with_state(state.clone(), require_user));

    // Business owner
    let business = Router::new()
        .route(
            "/api/businesses/me",
            get(businesses::get_me).put(businesses::update_me),
        )
        .route("/api/businesses/me/status", put(businesses::set_my_status))
        .route("/api/businesses/me/gift-cards", get(businesses::my_gift_cards))
        .route("/api/businesses/me/transactions", get(businesses::my_transactions))
        .route("/api/payments/connect-account", post(payments::connect_account))
        .route("/api/payments/connect-account-link", post(payments::connect_account_link))
        .layer(middleware::from_fn_with_state(state.clone(), require_business));

    // Gift card operations (business or admin)
    let staff = Router::new()
        .route("/api/gift-cards/issue", post(gift_cards::issue))
        .route("/api/gift-cards/validate", post(gift_cards::validate))
        .route("/api/gift-cards/redeem", post(gift_cards::redeem))
        .route("/api/gift-cards/{code}/activity", get(gift_cards::activity))
        .route("/api/gift-cards/{code}/email", post(gift_cards::email))
        .layer(middleware::from_fn_with_state(state.clone(), require_staff));

    // Platform administration
    let admin = Router::new()
        .route("/api/admin-auth/register", post(admin_auth::register))
        .route("/api/admin/dashboard", get(admin::system::dashboard))
        .route("/api/admin/health", get(admin::system::health))
        .route("/api/admin/users", get(admin::system::list_users))
        .route(
            "/api/admin/users/{id}/status",
            put(admin::system::set_user_status),
        )
        .route("/api/admin/applications", get(admin::applications::list))
        .route(
            "/api/admin/applications/{id}/approve",
            post(admin::applications::approve),
        )
        .route(
            "/api/admin/applications/{id}/reject",
            post(admin::applications::reject),
        )
        .route(
            "/api/admin/invites",
            get(admin::invites::list).post(admin::invites::send),
        )
        .route("/api/admin/invites/{id}", delete(admin::invites::revoke))
        .route("/api/admin/businesses", get(admin::businesses::list))
        .route("/api/admin/businesses/{id}", delete(admin::businesses::remove))
        .route(
            "/api/admin/businesses/{id}/status",
            put(admin::businesses::set_status),
        )
        .route(
            "/api/admin/fees",
            get(admin::fees::get_fees).put(admin::fees::update_fees),
        )
        .route("/api/admin/transactions", get(admin::transactions::list))
        .route(
            "/api/admin/reconciliations",
            get(admin::transactions::list_reconciliations),
        )
        .route(
            "/api/admin/reconciliations/{id}/resolve",
            post(admin::transactions::resolve_reconciliation),
        )
        .layer(middleware::from_fn_with_state(state.clone(), require_admin));

    Router::new()
        .merge(public)
        .merge(login)
        .merge(registration)
        .merge(user)
        .merge(business)
        .merge(staff)
        .merge(admin)
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(request_id.clone(), XRequestId))
                .layer(TraceLayer::new_for_http())
                .layer(PropagateRequestIdLayer::new(request_id))
                .layer(CorsLayer::permissive())
                .layer(TimeoutLayer::with_status_code(
                    StatusCode::REQUEST_TIMEOUT,
                    Duration::from_secs(60),
                )),
        )
        .with_state(state)
}
