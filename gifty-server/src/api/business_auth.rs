//! Business applications and login
//!
//! POST /api/business-auth/register: submit an application (optionally invited)
//! POST /api/business-auth/login   : approved and active businesses only

use axum::Json;
use axum::extract::State;
use serde_json::{Value, json};

use crate::services::accounts::{self, ApplicationForm};
use crate::state::AppState;

use super::ApiResult;
use super::auth::LoginRequest;

pub async fn register(
    State(state): State<AppState>,
    Json(form): Json<ApplicationForm>,
) -> ApiResult<Value> {
    let application = accounts::submit_application(&state.pool, &form).await?;
    Ok(Json(json!({
        "message": "Application submitted for review",
        "application": application,
    })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Value> {
    let (token, business) = accounts::login_business(&state, &req.email, &req.password).await?;
    Ok(Json(json!({ "token": token, "business": business })))
}
