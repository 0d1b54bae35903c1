//! Storefront user self-service
//!
//! GET /api/users/me/gift-cards

use axum::extract::{Query, State};
use axum::{Extension, Json};
use serde_json::{Value, json};

use crate::auth::Identity;
use crate::db;
use crate::services::accounts;
use crate::state::AppState;

use super::{ApiResult, Page, db_error};

/// Gift cards the user bought while logged in
pub async fn my_gift_cards(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Query(page): Query<Page>,
) -> ApiResult<Value> {
    // Tokens outlive a suspension; re-check the account
    let user = accounts::active_user(&state, identity.id).await?;
    let cards = db::gift_cards::list_for_purchaser(&state.pool, user.id, page.limit(), page.offset())
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "giftCards": cards })))
}
