//! Business invites
//!
//! GET    /api/admin/invites
//! POST   /api/admin/invites
//! DELETE /api/admin/invites/{id}

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};

use crate::auth::Identity;
use crate::db;
use crate::services::invites;
use crate::state::AppState;

use super::super::{ApiResult, db_error};

pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let invites = db::invites::list(&state.pool).await.map_err(db_error)?;
    Ok(Json(json!({ "invites": invites })))
}

#[derive(Deserialize)]
pub struct SendInviteRequest {
    pub email: String,
    pub message: Option<String>,
}

pub async fn send(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<SendInviteRequest>,
) -> ApiResult<Value> {
    let (invite, email_sent) =
        invites::send(&state, identity.id, &req.email, req.message.as_deref()).await?;
    Ok(Json(json!({
        "invite": invite,
        "emailSent": email_sent,
    })))
}

pub async fn revoke(State(state): State<AppState>, Path(id): Path<i64>) -> ApiResult<Value> {
    invites::revoke(&state, id).await?;
    Ok(Json(json!({ "message": "Invite revoked" })))
}
