//! Dashboard, integration health and user listing
//!
//! GET /api/admin/dashboard
//! GET /api/admin/health
//! GET /api/admin/users?limit=&offset=
//! PUT /api/admin/users/{id}/status

use axum::Json;
use axum::extract::{Path, Query, State};
use serde_json::{Value, json};
use shared::models::User;

use crate::api::businesses::StatusRequest;
use crate::db;
use crate::services::accounts;
use crate::state::AppState;

use super::super::{ApiResult, Page, db_error};

pub async fn dashboard(State(state): State<AppState>) -> ApiResult<Value> {
    let pool = &state.pool;
    let (businesses, pending_applications, users, gift_cards, outstanding) = tokio::try_join!(
        db::businesses::count(pool),
        db::applications::count_pending(pool),
        db::accounts::count_users(pool),
        db::gift_cards::count(pool),
        db::gift_cards::outstanding_balance(pool),
    )
    .map_err(db_error)?;

    Ok(Json(json!({
        "businesses": businesses,
        "pendingApplications": pending_applications,
        "users": users,
        "giftCards": gift_cards,
        "outstandingBalance": outstanding,
    })))
}

pub async fn health(State(state): State<AppState>) -> Json<Value> {
    let db_ok = sqlx::query("SELECT 1").execute(&state.pool).await.is_ok();
    Json(json!({
        "status": if db_ok { "ok" } else { "degraded" },
        "database": db_ok,
        "integrations": {
            "email": state.mailer.is_configured(),
            "wix": state.wix.is_some(),
            "stripe": !state.stripe_secret_key.is_empty(),
        },
    }))
}

pub async fn list_users(State(state): State<AppState>, Query(page): Query<Page>) -> ApiResult<Value> {
    let users = db::accounts::list_users(&state.pool, page.limit(), page.offset())
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "users": users })))
}

/// Suspend or reinstate a storefront user
pub async fn set_user_status(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<User> {
    let user = accounts::set_user_status(&state, id, req.is_active).await?;
    Ok(Json(user))
}
