//! Platform fee configuration
//!
//! GET /api/admin/fees
//! PUT /api/admin/fees: both percentages required, each within 0..=100

use axum::extract::State;
use axum::{Extension, Json};
use rust_decimal::Decimal;
use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::gift_card::validate_fee_percentage;
use shared::models::FeeSettings;
use shared::util::now_millis;

use crate::auth::Identity;
use crate::db;
use crate::state::AppState;

use super::super::{ApiResult, db_error};

pub async fn get_fees(State(state): State<AppState>) -> ApiResult<FeeSettings> {
    let rows = db::fees::load(&state.pool).await.map_err(db_error)?;
    let fees = FeeSettings::from_rows(&rows).ok_or_else(|| AppError::new(ErrorCode::FeeConfigMissing))?;
    Ok(Json(fees))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateFeesRequest {
    pub platform_fee_percentage: Option<Decimal>,
    pub customer_fee_percentage: Option<Decimal>,
}

impl UpdateFeesRequest {
    /// Both fields present and within range
    fn validated(&self) -> Result<FeeSettings, AppError> {
        let required = |value: Option<Decimal>, field: &'static str| {
            value.ok_or_else(|| AppError::new(ErrorCode::RequiredField).with_detail("field", field))
        };
        let platform = required(self.platform_fee_percentage, "platformFeePercentage")?;
        let customer = required(self.customer_fee_percentage, "customerFeePercentage")?;
        Ok(FeeSettings {
            platform_fee_percentage: validate_fee_percentage(platform, "platformFeePercentage")?,
            customer_fee_percentage: validate_fee_percentage(customer, "customerFeePercentage")?,
        })
    }
}

pub async fn update_fees(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Json(req): Json<UpdateFeesRequest>,
) -> ApiResult<FeeSettings> {
    let fees = req.validated()?;
    let rows = db::fees::update(
        &state.pool,
        fees.platform_fee_percentage,
        fees.customer_fee_percentage,
        now_millis(),
    )
    .await
    .map_err(db_error)?;
    tracing::info!(
        admin_id = identity.id,
        platform = %fees.platform_fee_percentage,
        customer = %fees.customer_fee_percentage,
        "Platform fees updated"
    );
    let fees = FeeSettings::from_rows(&rows).ok_or_else(|| AppError::new(ErrorCode::FeeConfigMissing))?;
    Ok(Json(fees))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request(body: serde_json::Value) -> UpdateFeesRequest {
        serde_json::from_value(body).unwrap()
    }

    #[test]
    fn test_valid_fees() {
        let fees = request(json!({ "platformFeePercentage": 2.5, "customerFeePercentage": 0 }))
            .validated()
            .unwrap();
        assert_eq!(fees.platform_fee_percentage, Decimal::new(25, 1));
        assert_eq!(fees.customer_fee_percentage, Decimal::ZERO);
    }

    #[test]
    fn test_bounds_are_inclusive() {
        assert!(request(json!({ "platformFeePercentage": 100, "customerFeePercentage": 0 }))
            .validated()
            .is_ok());
    }

    #[test]
    fn test_out_of_range_rejected() {
        let err = request(json!({ "platformFeePercentage": 101, "customerFeePercentage": 1 }))
            .validated()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFeePercentage);

        let err = request(json!({ "platformFeePercentage": 1, "customerFeePercentage": -0.5 }))
            .validated()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFeePercentage);
    }

    #[test]
    fn test_missing_field_rejected() {
        let err = request(json!({ "platformFeePercentage": 2.5 }))
            .validated()
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);
        assert_eq!(err.http_status(), http::StatusCode::BAD_REQUEST);
    }
}
