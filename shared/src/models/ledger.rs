//! Append-only ledger: transactions, activity log, reconciliations

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Monetary event kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    Purchase,
    Redemption,
    PlatformFeeCustomer,
    PlatformFeeBusiness,
    Payout,
}

impl TransactionType {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Purchase => "purchase",
            Self::Redemption => "redemption",
            Self::PlatformFeeCustomer => "platform_fee_customer",
            Self::PlatformFeeBusiness => "platform_fee_business",
            Self::Payout => "payout",
        }
    }

    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "purchase" => Some(Self::Purchase),
            "redemption" => Some(Self::Redemption),
            "platform_fee_customer" => Some(Self::PlatformFeeCustomer),
            "platform_fee_business" => Some(Self::PlatformFeeBusiness),
            "payout" => Some(Self::Payout),
            _ => None,
        }
    }
}

/// Ledger row, never updated after insert
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Transaction {
    pub id: i64,
    pub transaction_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub gift_card_id: Option<i64>,
    pub business_id: Option<i64>,
    pub payment_provider: Option<String>,
    pub payment_id: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub metadata: Option<Value>,
    pub created_at: i64,
}

/// Ledger row joined with the business name, for admin listings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct TransactionWithBusiness {
    pub id: i64,
    pub transaction_type: String,
    pub amount: Decimal,
    pub currency: String,
    pub gift_card_id: Option<i64>,
    pub business_id: Option<i64>,
    pub business_name: Option<String>,
    pub payment_provider: Option<String>,
    pub payment_id: Option<String>,
    pub status: String,
    pub description: Option<String>,
    pub created_at: i64,
}

/// Gift-card audit action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityAction {
    Issued,
    Validated,
    ValidationFailed,
    Redeemed,
    Emailed,
    Expired,
}

impl ActivityAction {
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Issued => "issued",
            Self::Validated => "validated",
            Self::ValidationFailed => "validation_failed",
            Self::Redeemed => "redeemed",
            Self::Emailed => "emailed",
            Self::Expired => "expired",
        }
    }
}

/// Audit trail entry. `gift_card_id` is absent when the looked-up code did not exist.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct ActivityEntry {
    pub id: i64,
    pub gift_card_id: Option<i64>,
    pub code: Option<String>,
    pub action: String,
    pub performed_by: String,
    pub details: Option<Value>,
    pub created_at: i64,
}

/// A charge that succeeded but whose follow-up writes did not
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PaymentReconciliation {
    pub id: i64,
    /// Set when a card exists for the charge
    pub gift_card_id: Option<i64>,
    pub business_id: Option<i64>,
    pub payment_intent_id: Option<String>,
    /// Set for storefront checkouts that never produced a card
    pub checkout_session_id: Option<String>,
    pub amount: Decimal,
    pub currency: String,
    pub reason: String,
    pub status: String,
    pub resolved_by: Option<String>,
    pub resolved_at: Option<i64>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transaction_type_db_mapping() {
        for kind in [
            TransactionType::Purchase,
            TransactionType::Redemption,
            TransactionType::PlatformFeeCustomer,
            TransactionType::PlatformFeeBusiness,
            TransactionType::Payout,
        ] {
            assert_eq!(TransactionType::from_db(kind.as_db()), Some(kind));
        }
    }

    #[test]
    fn test_activity_action_wire_matches_db() {
        let json = serde_json::to_string(&ActivityAction::ValidationFailed).unwrap();
        assert_eq!(json, "\"validation_failed\"");
        assert_eq!(ActivityAction::ValidationFailed.as_db(), "validation_failed");
    }
}
