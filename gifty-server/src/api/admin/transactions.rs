//! Ledger and payment reconciliations
//!
//! GET  /api/admin/transactions?limit=&offset=
//! GET  /api/admin/reconciliations
//! POST /api/admin/reconciliations/{id}/resolve

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use serde_json::{Value, json};
use shared::error::AppError;
use shared::models::PaymentReconciliation;
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::super::{ApiResult, Page, db_error};

pub async fn list(State(state): State<AppState>, Query(page): Query<Page>) -> ApiResult<Value> {
    let transactions = db::ledger::list_all(&state.pool, page.limit(), page.offset())
        .await
        .map_err(db_error)?;
    Ok(Json(json!({
        "transactions": transactions,
        "limit": page.limit(),
        "offset": page.offset(),
    })))
}

pub async fn list_reconciliations(State(state): State<AppState>) -> ApiResult<Value> {
    let open = db::ledger::list_open_reconciliations(&state.pool)
        .await
        .map_err(db_error)?;
    Ok(Json(json!({ "reconciliations": open })))
}

pub async fn resolve_reconciliation(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<i64>,
) -> ApiResult<PaymentReconciliation> {
    let resolved = db::ledger::resolve_reconciliation(&state.pool, id, &identity.email, now_millis())
        .await
        .map_err(db_error)?
        .ok_or_else(|| AppError::not_found("Open reconciliation"))?;
    tracing::info!(reconciliation_id = id, admin_id = identity.id, "Reconciliation resolved");
    Ok(Json(resolved))
}
