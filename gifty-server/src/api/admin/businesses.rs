//! Business administration
//!
//! GET    /api/admin/businesses
//! PUT    /api/admin/businesses/{id}/status
//! DELETE /api/admin/businesses/{id}

use axum::extract::{Path, State};
use axum::{Extension, Json};
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::Business;
use shared::util::now_millis;

use crate::api::businesses::StatusRequest;
use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::super::{ApiResult, db_error};

pub async fn list(State(state): State<AppState>) -> ApiResult<Value> {
    let businesses = db::businesses::list_all(&state.pool).await.map_err(db_error)?;
    Ok(Json(json!({ "businesses": businesses })))
}

pub async fn set_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Business> {
    let business = db::businesses::set_active(&state.pool, id, req.is_active, now_millis())
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    tracing::info!(
        business_id = id,
        is_active = req.is_active,
        admin_id = identity.id,
        "Business status changed by admin"
    );
    Ok(Json(business))
}

/// Hard delete. Refused while the business owns gift cards, which are never deleted.
pub async fn remove(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<Value> {
    if db::businesses::has_gift_cards(&state.pool, id)
        .await
        .map_err(db_error)?
    {
        return Err(AppError::new(ErrorCode::BusinessHasGiftCards).with_detail("businessId", id));
    }
    if !db::businesses::delete(&state.pool, id).await.map_err(db_error)? {
        return Err(AppError::new(ErrorCode::BusinessNotFound));
    }
    tracing::warn!(business_id = id, admin_id = identity.id, "Business deleted");
    Ok(Json(json!({ "message": "Business deleted" })))
}
