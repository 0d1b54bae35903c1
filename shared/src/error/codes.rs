//! Unified error codes for the Gifty marketplace
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 2xxx: Permission errors
//! - 3xxx: Business / application / invite errors
//! - 4xxx: Gift card errors
//! - 5xxx: Payment and fee errors
//! - 6xxx: Customer / user account errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so the storefront and the
/// admin dashboard can switch on them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource not found
    NotFound = 3,
    /// Required field missing
    RequiredField = 7,
    /// Value out of range
    ValueOutOfRange = 8,
    /// Too many requests from this client
    TooManyRequests = 9,

    // ==================== 1xxx: Auth ====================
    /// Caller is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,

    // ==================== 2xxx: Permission ====================
    /// Permission denied
    PermissionDenied = 2001,
    /// Specific role required
    RoleRequired = 2002,
    /// Admin role required
    AdminRequired = 2003,

    // ==================== 3xxx: Business ====================
    /// Business not found
    BusinessNotFound = 3001,
    /// Business has not been approved yet
    BusinessNotApproved = 3002,
    /// Business account is paused or suspended
    BusinessInactive = 3003,
    /// Business has no payment sub-account configured
    PaymentAccountMissing = 3004,
    /// Business payment sub-account cannot receive transfers yet
    TransfersNotActive = 3005,
    /// Business still owns gift cards and cannot be deleted
    BusinessHasGiftCards = 3006,
    /// Business application not found
    ApplicationNotFound = 3101,
    /// Business application was already reviewed
    ApplicationAlreadyReviewed = 3102,
    /// A pending application already exists for this email
    ApplicationPending = 3103,
    /// Business invite not found
    InviteNotFound = 3201,
    /// Business invite has expired or was already used
    InviteExpired = 3202,
    /// A pending invite already exists for this email
    InvitePending = 3203,

    // ==================== 4xxx: Gift card ====================
    /// Gift card not found
    GiftCardNotFound = 4001,
    /// Gift card has expired
    GiftCardExpired = 4002,
    /// Gift card balance is already zero
    GiftCardFullyRedeemed = 4003,
    /// Gift card is not in a redeemable state (pending, failed, ...)
    GiftCardNotRedeemable = 4004,
    /// Balance changed concurrently, redemption not applied
    RedemptionConflict = 4005,
    /// Could not allocate a unique gift card code
    CodeGenerationFailed = 4006,
    /// Amount must be positive
    InvalidAmount = 4007,

    // ==================== 5xxx: Payment ====================
    /// Payment processing failed
    PaymentFailed = 5001,
    /// Fee configuration rows are missing
    FeeConfigMissing = 5002,
    /// Fee percentage outside 0-100
    InvalidFeePercentage = 5003,

    // ==================== 6xxx: Accounts ====================
    /// Email already registered
    EmailAlreadyRegistered = 6002,
    /// Password too short
    PasswordTooShort = 6003,
    /// Email address is malformed
    InvalidEmail = 6004,
    /// User account suspended by an admin
    AccountSuspended = 6005,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Third-party provider (Stripe, Wix, email) failed
    UpstreamError = 9006,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::NotFound => "Resource not found",
            ErrorCode::RequiredField => "Required field is missing",
            ErrorCode::ValueOutOfRange => "Value is out of range",
            ErrorCode::TooManyRequests => "Too many requests, try again later",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid credentials",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",

            // Permission
            ErrorCode::PermissionDenied => "Permission denied",
            ErrorCode::RoleRequired => "Specific role is required",
            ErrorCode::AdminRequired => "Administrator role is required",

            // Business
            ErrorCode::BusinessNotFound => "Business not found",
            ErrorCode::BusinessNotApproved => "Business application is awaiting admin approval",
            ErrorCode::BusinessInactive => "Business account is inactive",
            ErrorCode::PaymentAccountMissing => "Business is not configured for payments",
            ErrorCode::TransfersNotActive => "Business payment account cannot receive transfers",
            ErrorCode::BusinessHasGiftCards => "Business has issued gift cards",
            ErrorCode::ApplicationNotFound => "Business application not found",
            ErrorCode::ApplicationAlreadyReviewed => "Business application was already reviewed",
            ErrorCode::ApplicationPending => "An application for this email is already pending",
            ErrorCode::InviteNotFound => "Invite not found",
            ErrorCode::InviteExpired => "Invite has expired or was already used",
            ErrorCode::InvitePending => "This email already has a pending invite",

            // Gift card
            ErrorCode::GiftCardNotFound => "Gift card not found",
            ErrorCode::GiftCardExpired => "Gift card has expired",
            ErrorCode::GiftCardFullyRedeemed => "Gift card has already been fully redeemed",
            ErrorCode::GiftCardNotRedeemable => "Gift card is not redeemable",
            ErrorCode::RedemptionConflict => "Gift card balance changed, retry the redemption",
            ErrorCode::CodeGenerationFailed => "Could not generate a unique gift card code",
            ErrorCode::InvalidAmount => "Amount must be greater than zero",

            // Payment
            ErrorCode::PaymentFailed => "Payment processing failed",
            ErrorCode::FeeConfigMissing => "Fee configuration missing",
            ErrorCode::InvalidFeePercentage => "Fee percentages must be between 0 and 100",

            // Accounts
            ErrorCode::EmailAlreadyRegistered => "Email already registered",
            ErrorCode::PasswordTooShort => "Password must be at least 8 characters",
            ErrorCode::InvalidEmail => "Invalid email address",
            ErrorCode::AccountSuspended => "Account has been suspended",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::UpstreamError => "Upstream provider error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            3 => Ok(ErrorCode::NotFound),
            7 => Ok(ErrorCode::RequiredField),
            8 => Ok(ErrorCode::ValueOutOfRange),
            9 => Ok(ErrorCode::TooManyRequests),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),

            // Permission
            2001 => Ok(ErrorCode::PermissionDenied),
            2002 => Ok(ErrorCode::RoleRequired),
            2003 => Ok(ErrorCode::AdminRequired),

            // Business
            3001 => Ok(ErrorCode::BusinessNotFound),
            3002 => Ok(ErrorCode::BusinessNotApproved),
            3003 => Ok(ErrorCode::BusinessInactive),
            3004 => Ok(ErrorCode::PaymentAccountMissing),
            3005 => Ok(ErrorCode::TransfersNotActive),
            3006 => Ok(ErrorCode::BusinessHasGiftCards),
            3101 => Ok(ErrorCode::ApplicationNotFound),
            3102 => Ok(ErrorCode::ApplicationAlreadyReviewed),
            3103 => Ok(ErrorCode::ApplicationPending),
            3201 => Ok(ErrorCode::InviteNotFound),
            3202 => Ok(ErrorCode::InviteExpired),
            3203 => Ok(ErrorCode::InvitePending),

            // Gift card
            4001 => Ok(ErrorCode::GiftCardNotFound),
            4002 => Ok(ErrorCode::GiftCardExpired),
            4003 => Ok(ErrorCode::GiftCardFullyRedeemed),
            4004 => Ok(ErrorCode::GiftCardNotRedeemable),
            4005 => Ok(ErrorCode::RedemptionConflict),
            4006 => Ok(ErrorCode::CodeGenerationFailed),
            4007 => Ok(ErrorCode::InvalidAmount),

            // Payment
            5001 => Ok(ErrorCode::PaymentFailed),
            5002 => Ok(ErrorCode::FeeConfigMissing),
            5003 => Ok(ErrorCode::InvalidFeePercentage),

            // Accounts
            6002 => Ok(ErrorCode::EmailAlreadyRegistered),
            6003 => Ok(ErrorCode::PasswordTooShort),
            6004 => Ok(ErrorCode::InvalidEmail),
            6005 => Ok(ErrorCode::AccountSuspended),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9006 => Ok(ErrorCode::UpstreamError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_code_roundtrip_through_u16() {
        for code in [
            ErrorCode::ValidationFailed,
            ErrorCode::InvalidCredentials,
            ErrorCode::BusinessNotFound,
            ErrorCode::InviteExpired,
            ErrorCode::GiftCardExpired,
            ErrorCode::InvalidFeePercentage,
            ErrorCode::EmailAlreadyRegistered,
            ErrorCode::AccountSuspended,
            ErrorCode::UpstreamError,
        ] {
            assert_eq!(ErrorCode::try_from(code.code()), Ok(code));
        }
    }

    #[test]
    fn test_invalid_code_rejected() {
        assert_eq!(ErrorCode::try_from(4999), Err(InvalidErrorCode(4999)));
        assert_eq!(
            InvalidErrorCode(42).to_string(),
            "invalid error code: 42"
        );
    }

    #[test]
    fn test_serialize_as_number() {
        let json = serde_json::to_string(&ErrorCode::GiftCardNotFound).unwrap();
        assert_eq!(json, "4001");
        let code: ErrorCode = serde_json::from_str("4003").unwrap();
        assert_eq!(code, ErrorCode::GiftCardFullyRedeemed);
    }

    #[test]
    fn test_messages() {
        assert_eq!(ErrorCode::RedemptionConflict.code(), 4005);
        assert_eq!(ErrorCode::GiftCardExpired.message(), "Gift card has expired");
    }
}
