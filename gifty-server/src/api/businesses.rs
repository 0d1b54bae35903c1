//! Business directory and owner self-service
//!
//! Public: GET /api/businesses, GET /api/businesses/{slug}
//! Owner:  GET|PUT /api/businesses/me, PUT /api/businesses/me/status,
//!         GET /api/businesses/me/gift-cards, GET /api/businesses/me/transactions

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::{Business, BusinessSummary, BusinessUpdate};
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::{ApiResult, Page, db_error};

pub async fn list_public(State(state): State<AppState>) -> ApiResult<Value> {
    let businesses = db::businesses::list_public(&state.pool)
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "businesses": businesses })))
}

pub async fn get_by_slug(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> ApiResult<BusinessSummary> {
    let business = db::businesses::find_public_by_slug(&state.pool, &slug)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    Ok(Json(business))
}

async fn own_business(state: &AppState, identity: &Identity) -> Result<Business, AppError> {
    db::businesses::find_by_id(&state.pool, identity.id)
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))
}

pub async fn get_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Business> {
    Ok(Json(own_business(&state, &identity).await?))
}

pub async fn update_me(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(mut update): Json<BusinessUpdate>,
) -> ApiResult<Business> {
    if let Some(name) = update.name.as_mut() {
        let trimmed = name.trim();
        if trimmed.is_empty() {
            return Err(AppError::validation("Business name cannot be empty")
                .with_detail("field", "name"));
        }
        *name = trimmed.to_string();
    }

    let business = db::businesses::update_profile(&state.pool, identity.id, &update, now_millis())
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    tracing::info!(business_id = business.id, "Business profile updated");
    Ok(Json(business))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusRequest {
    pub is_active: bool,
}

/// Pause or resume sales. A paused business cannot log in again until an
/// admin reactivates it.
pub async fn set_my_status(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<StatusRequest>,
) -> ApiResult<Business> {
    let business = db::businesses::set_active(&state.pool, identity.id, req.is_active, now_millis())
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    tracing::info!(business_id = business.id, is_active = req.is_active, "Business status changed by owner");
    Ok(Json(business))
}

pub async fn my_gift_cards(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(page): Query<Page>,
) -> ApiResult<Value> {
    let cards = db::gift_cards::list_for_business(&state.pool, identity.id, page.limit(), page.offset())
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "giftCards": cards })))
}

pub async fn my_transactions(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(page): Query<Page>,
) -> ApiResult<Value> {
    let transactions =
        db::ledger::list_for_business(&state.pool, identity.id, page.limit(), page.offset())
            .await
            .map_err(db_error)?;
    Ok(Json(json!({ "transactions": transactions })))
}
