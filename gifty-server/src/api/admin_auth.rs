//! Admin accounts
//!
//! POST /api/admin-auth/login
//! POST /api/admin-auth/register (admin only)

use axum::extract::State;
use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::auth::Identity;
use crate::services::accounts;
use crate::state::AppState;

use super::ApiResult;
use super::auth::{LoginRequest, RegisterRequest};

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Value> {
    let (token, admin) = accounts::login_admin(&state, &req.email, &req.password).await?;
    Ok(Json(json!({ "token": token, "admin": admin })))
}

pub async fn register(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let admin =
        accounts::register_admin(&state.pool, &req.email, &req.password, req.name.as_deref())
            .await?;
    tracing::info!(admin_id = admin.id, created_by = identity.id, "Admin account created");
    Ok(Json(json!({ "admin": admin })))
}
