//! Business application review
//!
//! GET  /api/admin/applications?status=
//! POST /api/admin/applications/{id}/approve
//! POST /api/admin/applications/{id}/reject

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::AppError;
use shared::models::ApplicationStatus;

use crate::auth::Identity;
use crate::db;
use crate::services::applications;
use crate::state::AppState;

use super::super::{ApiResult, db_error};

#[derive(Deserialize)]
pub struct ListQuery {
    pub status: Option<String>,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Value> {
    let status = match query.status.as_deref().filter(|s| !s.is_empty() && *s != "all") {
        Some(s) => Some(ApplicationStatus::from_db(s).ok_or_else(|| {
            AppError::validation("Unknown application status").with_detail("status", s.to_string())
        })?),
        None => None,
    };
    let applications = db::applications::list(&state.pool, status)
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "applications": applications })))
}

pub async fn approve(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    let (business, application) = applications::approve(&state, id).await?;
    tracing::info!(application_id = id, admin_id = identity.id, "Approved by admin");
    Ok(Json(json!({
        "message": "Application approved",
        "business": business,
        "application": application,
    })))
}

#[derive(Deserialize, Default)]
pub struct RejectRequest {
    pub reason: Option<String>,
}

pub async fn reject(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    body: Option<Json<RejectRequest>>,
) -> ApiResult<Value> {
    let Json(req) = body.unwrap_or_default();
    let application = applications::reject(&state, id, req.reason.as_deref()).await?;
    tracing::info!(application_id = id, admin_id = identity.id, "Rejected by admin");
    Ok(Json(json!({
        "message": "Application rejected",
        "application": application,
    })))
}
