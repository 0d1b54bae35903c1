//! Error type and the JSON body it renders to

use super::category::ErrorCategory;
use super::codes::ErrorCode;
use http::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use thiserror::Error;

/// Application error: a stable code, a message, and optional details
///
/// Details carry structured context for the client (the offending field,
/// the card code, the provider name). Provider error text is never put here.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct AppError {
    pub code: ErrorCode,
    pub message: String,
    pub details: Option<HashMap<String, Value>>,
}

impl AppError {
    /// Error with the default message for `code`
    pub fn new(code: ErrorCode) -> Self {
        Self {
            message: code.message().to_string(),
            code,
            details: None,
        }
    }

    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into());
        self
    }

    pub fn http_status(&self) -> StatusCode {
        self.code.http_status()
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::ValidationFailed, msg)
    }

    pub fn not_found(resource: impl Into<String>) -> Self {
        let r = resource.into();
        Self::with_message(ErrorCode::NotFound, format!("{r} not found")).with_detail("resource", r)
    }

    pub fn permission_denied(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::PermissionDenied, msg)
    }

    pub fn invalid_token(msg: impl Into<String>) -> Self {
        Self::with_message(ErrorCode::TokenInvalid, msg)
    }

    pub fn token_expired() -> Self {
        Self::new(ErrorCode::TokenExpired)
    }

    /// Same error for unknown email and wrong password
    pub fn invalid_credentials() -> Self {
        Self::new(ErrorCode::InvalidCredentials)
    }

    /// Third-party provider failure
    ///
    /// The provider name is kept in `details`; the provider's own error text
    /// belongs in the log, never in the response.
    pub fn upstream(provider: &'static str) -> Self {
        Self::new(ErrorCode::UpstreamError).with_detail("provider", provider)
    }

    pub fn invalid_amount(field: &'static str) -> Self {
        Self::new(ErrorCode::InvalidAmount).with_detail("field", field)
    }

    pub fn gift_card_not_found(code: impl Into<String>) -> Self {
        Self::new(ErrorCode::GiftCardNotFound).with_detail("code", code.into())
    }
}

/// Wire form of an [`AppError`]
///
/// ```json
/// { "code": 4002, "message": "Gift card has expired", "details": { "code": "ABCD-EFGH23" } }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub code: u16,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<HashMap<String, Value>>,
}

impl From<&AppError> for ErrorBody {
    fn from(err: &AppError) -> Self {
        Self {
            code: err.code.code(),
            message: err.message.clone(),
            details: err.details.clone(),
        }
    }
}

pub type AppResult<T> = Result<T, AppError>;

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.code.category() == ErrorCategory::System {
            tracing::error!(code = %self.code, message = %self.message, "System error occurred");
        }
        (self.http_status(), axum::Json(ErrorBody::from(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn test_default_message() {
        let err = AppError::new(ErrorCode::GiftCardExpired);
        assert_eq!(err.message, "Gift card has expired");
        assert!(err.details.is_none());
        assert_eq!(err.to_string(), "Gift card has expired");
    }

    #[test]
    fn test_details_accumulate() {
        let err = AppError::validation("Missing required fields")
            .with_detail("field", "customerEmail")
            .with_detail("reason", "required");

        assert_eq!(err.code, ErrorCode::ValidationFailed);
        let details = err.details.unwrap();
        assert_eq!(details["field"], "customerEmail");
        assert_eq!(details["reason"], "required");
    }

    #[test]
    fn test_not_found_names_resource() {
        let err = AppError::not_found("Open reconciliation");
        assert_eq!(err.message, "Open reconciliation not found");
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);
        assert!(err.details.as_ref().unwrap().contains_key("resource"));
    }

    #[test]
    fn test_upstream_error_hides_provider_detail() {
        let err = AppError::upstream("stripe");
        assert_eq!(err.code, ErrorCode::UpstreamError);
        assert_eq!(err.message, "Upstream provider error");
        assert_eq!(err.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(err.details.unwrap()["provider"], "stripe");
    }

    #[test]
    fn test_gift_card_constructors() {
        let err = AppError::gift_card_not_found("ABCD-EFGH23");
        assert_eq!(err.code, ErrorCode::GiftCardNotFound);
        assert_eq!(err.http_status(), StatusCode::NOT_FOUND);

        let err = AppError::invalid_amount("partialAmount");
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert_eq!(err.details.unwrap()["field"], "partialAmount");
    }

    #[test]
    fn test_error_body_shape() {
        let err = AppError::gift_card_not_found("ABCD-EFGH23");
        let json = serde_json::to_value(ErrorBody::from(&err)).unwrap();
        assert_eq!(json["code"], 4001);
        assert_eq!(json["message"], "Gift card not found");
        assert_eq!(json["details"]["code"], "ABCD-EFGH23");

        let json = serde_json::to_value(ErrorBody::from(&AppError::token_expired())).unwrap();
        assert!(json.get("details").is_none());
    }

    #[test]
    fn test_into_response_status() {
        let response = AppError::invalid_credentials().into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let response = AppError::new(ErrorCode::RedemptionConflict).into_response();
        assert_eq!(response.status(), StatusCode::CONFLICT);
    }
}
