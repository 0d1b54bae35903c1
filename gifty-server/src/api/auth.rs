//! Storefront user accounts
//!
//! POST /api/auth/register
//! POST /api/auth/login

use axum::Json;
use axum::extract::State;
use serde::Deserialize;
use serde_json::{Value, json};

use crate::services::accounts;
use crate::state::AppState;

use super::ApiResult;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

pub async fn register(
    State(state): State<AppState>,
    Json(req): Json<RegisterRequest>,
) -> ApiResult<Value> {
    let (token, user) =
        accounts::register_user(&state, &req.email, &req.password, req.name.as_deref()).await?;
    Ok(Json(json!({ "token": token, "user": user })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Value> {
    let (token, user) = accounts::login_user(&state, &req.email, &req.password).await?;
    Ok(Json(json!({ "token": token, "user": user })))
}
