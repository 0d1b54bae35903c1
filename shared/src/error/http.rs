//! HTTP status code mapping for error codes

use super::codes::ErrorCode;
use http::StatusCode;

impl ErrorCode {
    /// Get the appropriate HTTP status code for this error code
    pub fn http_status(&self) -> StatusCode {
        match self {
            // 404 Not Found
            Self::NotFound
            | Self::BusinessNotFound
            | Self::ApplicationNotFound
            | Self::InviteNotFound
            | Self::GiftCardNotFound => StatusCode::NOT_FOUND,

            // 409 Conflict
            Self::BusinessHasGiftCards
            | Self::ApplicationAlreadyReviewed
            | Self::ApplicationPending
            | Self::InvitePending
            | Self::RedemptionConflict
            | Self::EmailAlreadyRegistered => StatusCode::CONFLICT,

            // 401 Unauthorized
            Self::NotAuthenticated
            | Self::InvalidCredentials
            | Self::TokenExpired
            | Self::TokenInvalid => StatusCode::UNAUTHORIZED,

            // 403 Forbidden
            Self::PermissionDenied
            | Self::RoleRequired
            | Self::AdminRequired
            | Self::BusinessNotApproved
            | Self::BusinessInactive
            | Self::AccountSuspended => StatusCode::FORBIDDEN,

            // 402 Payment Required
            Self::PaymentFailed => StatusCode::PAYMENT_REQUIRED,

            // 429
            Self::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,

            // 502 Bad Gateway (Stripe, Wix, email provider)
            Self::UpstreamError => StatusCode::BAD_GATEWAY,

            // 500 Internal Server Error
            Self::InternalError
            | Self::FeeConfigMissing
            | Self::CodeGenerationFailed => StatusCode::INTERNAL_SERVER_ERROR,

            // 400 Bad Request (default for validation/business errors)
            _ => StatusCode::BAD_REQUEST,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(ErrorCode::GiftCardNotFound.http_status(), StatusCode::NOT_FOUND);
        assert_eq!(ErrorCode::GiftCardExpired.http_status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ErrorCode::GiftCardFullyRedeemed.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::RedemptionConflict.http_status(), StatusCode::CONFLICT);
        assert_eq!(
            ErrorCode::InvalidFeePercentage.http_status(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(ErrorCode::TokenInvalid.http_status(), StatusCode::UNAUTHORIZED);
        assert_eq!(ErrorCode::AdminRequired.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::AccountSuspended.http_status(), StatusCode::FORBIDDEN);
        assert_eq!(ErrorCode::UpstreamError.http_status(), StatusCode::BAD_GATEWAY);
        assert_eq!(
            ErrorCode::InternalError.http_status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
