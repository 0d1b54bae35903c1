//! Gift card endpoints (business or admin)
//!
//! POST /api/gift-cards/issue
//! POST /api/gift-cards/validate
//! POST /api/gift-cards/redeem
//! GET  /api/gift-cards/{code}/activity
//! POST /api/gift-cards/{code}/email

use axum::extract::{Path, State};
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::models::GiftCardSource;

use crate::auth::Identity;
use crate::services::gift_cards::{
    self, IssueOrder, Issued, RedeemRequest, Redemption, ResendRequest, Validation,
};
use crate::state::AppState;

use super::ApiResult;

fn default_quantity() -> u32 {
    1
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IssueRequest {
    /// Required for admins; businesses always issue for themselves
    pub business_id: Option<i64>,
    pub amount: Decimal,
    pub currency: Option<String>,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub order_id: Option<String>,
    pub line_item_id: Option<String>,
    pub metadata: Option<Value>,
}

/// Business the caller may issue for
fn issuing_business(identity: &Identity, requested: Option<i64>) -> Result<i64, AppError> {
    match (identity.business_id(), requested) {
        (Some(own), Some(other)) if own != other => Err(AppError::permission_denied(
            "Businesses can only issue their own gift cards",
        )),
        (Some(own), _) => Ok(own),
        (None, Some(id)) if identity.is_admin() => Ok(id),
        (None, None) if identity.is_admin() => Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "businessId")),
        _ => Err(AppError::new(ErrorCode::RoleRequired)),
    }
}

pub async fn issue(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<IssueRequest>,
) -> ApiResult<Issued> {
    let business_id = issuing_business(&identity, req.business_id)?;
    let issued = gift_cards::issue(
        &state,
        &IssueOrder {
            business_id,
            amount: req.amount,
            currency: req.currency.as_deref(),
            quantity: req.quantity,
            customer_email: &req.customer_email,
            customer_name: req.customer_name.as_deref(),
            order_id: req.order_id.as_deref(),
            line_item_id: req.line_item_id.as_deref(),
            metadata: req.metadata.as_ref(),
            source: GiftCardSource::Manual,
            performed_by: &identity.email,
        },
    )
    .await?;
    Ok(Json(issued))
}

#[derive(Deserialize)]
pub struct ValidateRequest {
    pub code: String,
}

pub async fn validate(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<ValidateRequest>,
) -> ApiResult<Validation> {
    let validation =
        gift_cards::validate(&state, &req.code, identity.business_id(), &identity.email).await?;
    Ok(Json(validation))
}

pub async fn redeem(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<RedeemRequest>,
) -> ApiResult<Redemption> {
    let redemption =
        gift_cards::redeem(&state, &req, identity.business_id(), &identity.email).await?;
    Ok(Json(redemption))
}

pub async fn activity(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
) -> ApiResult<Value> {
    let entries = gift_cards::activity(&state, &code, identity.business_id()).await?;
    Ok(Json(json!({ "activity": entries })))
}

/// Re-send the card email; the body may redirect it to another address
pub async fn email(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(code): Path<String>,
    body: Option<Json<ResendRequest>>,
) -> ApiResult<Value> {
    let request = body.map(|Json(r)| r).unwrap_or_default();
    let email_sent = gift_cards::resend_email(
        &state,
        &code,
        &request,
        identity.business_id(),
        &identity.email,
    )
    .await?;
    Ok(Json(json!({ "emailSent": email_sent })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::models::Role;

    fn identity(id: i64, role: Role) -> Identity {
        Identity {
            id,
            role,
            email: "someone@gifty.sv".to_string(),
        }
    }

    #[test]
    fn test_business_issues_for_itself() {
        let owner = identity(5, Role::Business);
        assert_eq!(issuing_business(&owner, None).unwrap(), 5);
        assert_eq!(issuing_business(&owner, Some(5)).unwrap(), 5);
        assert_eq!(
            issuing_business(&owner, Some(6)).unwrap_err().code,
            ErrorCode::PermissionDenied
        );
    }

    #[test]
    fn test_admin_must_name_business() {
        let admin = identity(1, Role::Admin);
        assert_eq!(issuing_business(&admin, Some(9)).unwrap(), 9);
        assert_eq!(
            issuing_business(&admin, None).unwrap_err().code,
            ErrorCode::RequiredField
        );
    }

    #[test]
    fn test_issue_request_defaults() {
        let req: IssueRequest = serde_json::from_value(json!({
            "amount": 25,
            "customerEmail": "ana@example.com"
        }))
        .unwrap();
        assert_eq!(req.quantity, 1);
        assert_eq!(req.amount, Decimal::from(25));
        assert!(req.business_id.is_none());
    }
}
