//! Payments
//!
//! POST /api/payments/connect-account       (business) create a Stripe Express account
//! POST /api/payments/connect-account-link  (business) onboarding link
//! POST /api/payments/purchase-gift-card    (public, optional user token)

use axum::extract::State;
use axum::{Extension, Json};
use http::HeaderMap;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::models::Role;

use crate::auth::Identity;
use crate::auth::jwt::optional_identity;
use crate::services::purchase::{self, PurchaseOutcome, PurchaseRequest};
use crate::state::AppState;

use super::ApiResult;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectAccountRequest {
    pub country: String,
    pub business_type: String,
}

pub async fn connect_account(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ConnectAccountRequest>,
) -> ApiResult<Value> {
    let account_id =
        purchase::create_connect_account(&state, identity.id, &req.country, &req.business_type)
            .await?;
    Ok(Json(json!({
        "message": "Stripe Connect account created",
        "accountId": account_id,
    })))
}

pub async fn connect_account_link(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
) -> ApiResult<Value> {
    let url = purchase::create_connect_account_link(&state, identity.id).await?;
    Ok(Json(json!({ "url": url })))
}

/// Guest checkout is allowed; a valid user token links the purchase to the user
pub async fn purchase_gift_card(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PurchaseRequest>,
) -> ApiResult<PurchaseOutcome> {
    let purchaser = optional_identity(&headers, &state.jwt_secret)
        .filter(|i| i.role == Role::User)
        .map(|i| i.id);
    let outcome = purchase::purchase(&state, &req, purchaser).await?;
    Ok(Json(outcome))
}
