//! Gift card model

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Gift card lifecycle state
///
/// `Pending` and `Failed` belong to the paid checkout flow; only
/// `Issued`, `Purchased` and `PartiallyRedeemed` hold spendable balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardStatus {
    /// Created before payment, not yet charged
    Pending,
    /// Issued directly (admin, business or storefront order)
    Issued,
    /// Paid through checkout
    Purchased,
    PartiallyRedeemed,
    Redeemed,
    Expired,
    /// Payment did not succeed
    Failed,
}

impl GiftCardStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "issued" => Some(Self::Issued),
            "purchased" => Some(Self::Purchased),
            "partially_redeemed" => Some(Self::PartiallyRedeemed),
            "redeemed" => Some(Self::Redeemed),
            "expired" => Some(Self::Expired),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Issued => "issued",
            Self::Purchased => "purchased",
            Self::PartiallyRedeemed => "partially_redeemed",
            Self::Redeemed => "redeemed",
            Self::Expired => "expired",
            Self::Failed => "failed",
        }
    }

    /// Can balance be spent from a card in this state?
    pub fn is_redeemable(&self) -> bool {
        matches!(
            self,
            Self::Issued | Self::Purchased | Self::PartiallyRedeemed
        )
    }

    /// Database values of all redeemable states, for `= ANY($n)` filters
    pub const REDEEMABLE_DB: [&'static str; 3] = ["issued", "purchased", "partially_redeemed"];
}

/// How a card came into existence
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiftCardSource {
    Manual,
    Stripe,
    Wix,
}

impl GiftCardSource {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "manual" => Some(Self::Manual),
            "stripe" => Some(Self::Stripe),
            "wix" => Some(Self::Wix),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::Stripe => "stripe",
            Self::Wix => "wix",
        }
    }
}

/// Gift card row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct GiftCard {
    pub id: i64,
    /// Canonical `XXXX-XXXXXX` code, immutable after insert
    pub code: String,
    pub business_id: i64,
    pub customer_id: Option<i64>,
    /// Storefront user who paid, when bought while logged in
    pub purchaser_user_id: Option<i64>,
    pub amount: Decimal,
    pub remaining_balance: Decimal,
    pub currency: String,
    pub status: String,
    pub source: String,
    pub order_id: Option<String>,
    pub line_item_id: Option<String>,
    pub recipient_email: Option<String>,
    pub personal_message: Option<String>,
    pub payment_intent_id: Option<String>,
    pub metadata: Option<Value>,
    pub issued_at: i64,
    pub expires_at: i64,
    pub redeemed_at: Option<i64>,
    pub redeemed_by: Option<String>,
    pub redemption_notes: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl GiftCard {
    /// Parsed status; unknown values are treated as non-redeemable by callers
    pub fn status(&self) -> Option<GiftCardStatus> {
        GiftCardStatus::from_db(&self.status)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_db_mapping() {
        for status in [
            GiftCardStatus::Pending,
            GiftCardStatus::Issued,
            GiftCardStatus::Purchased,
            GiftCardStatus::PartiallyRedeemed,
            GiftCardStatus::Redeemed,
            GiftCardStatus::Expired,
            GiftCardStatus::Failed,
        ] {
            assert_eq!(GiftCardStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(GiftCardStatus::from_db("active"), None);
    }

    #[test]
    fn test_redeemable_states() {
        assert!(GiftCardStatus::Issued.is_redeemable());
        assert!(GiftCardStatus::Purchased.is_redeemable());
        assert!(GiftCardStatus::PartiallyRedeemed.is_redeemable());
        assert!(!GiftCardStatus::Pending.is_redeemable());
        assert!(!GiftCardStatus::Redeemed.is_redeemable());
        assert!(!GiftCardStatus::Expired.is_redeemable());
        assert!(!GiftCardStatus::Failed.is_redeemable());

        for db in GiftCardStatus::REDEEMABLE_DB {
            assert!(GiftCardStatus::from_db(db).unwrap().is_redeemable());
        }
    }

    #[test]
    fn test_status_serde_matches_db() {
        let json = serde_json::to_string(&GiftCardStatus::PartiallyRedeemed).unwrap();
        assert_eq!(json, format!("\"{}\"", GiftCardStatus::PartiallyRedeemed.as_db()));
    }
}
