//! Platform fee configuration

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Fee row kinds stored in `platform_fees`
pub const FEE_TYPE_PLATFORM: &str = "platform";
pub const FEE_TYPE_CUSTOMER: &str = "customer";

/// One `platform_fees` row
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct PlatformFee {
    pub fee_type: String,
    pub percentage: Decimal,
    pub updated_at: i64,
}

/// Both fee percentages, as read at the start of a purchase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSettings {
    /// Deducted from the business payout
    pub platform_fee_percentage: Decimal,
    /// Added on top of the customer's charge
    pub customer_fee_percentage: Decimal,
}

impl FeeSettings {
    /// Build from the two config rows; `None` if either is missing
    pub fn from_rows(rows: &[PlatformFee]) -> Option<Self> {
        let find = |kind: &str| {
            rows.iter()
                .find(|r| r.fee_type == kind)
                .map(|r| r.percentage)
        };
        Some(Self {
            platform_fee_percentage: find(FEE_TYPE_PLATFORM)?,
            customer_fee_percentage: find(FEE_TYPE_CUSTOMER)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(kind: &str, pct: Decimal) -> PlatformFee {
        PlatformFee {
            fee_type: kind.to_string(),
            percentage: pct,
            updated_at: 0,
        }
    }

    #[test]
    fn test_from_rows() {
        let rows = vec![row("customer", Decimal::ONE), row("platform", Decimal::new(25, 1))];
        let fees = FeeSettings::from_rows(&rows).unwrap();
        assert_eq!(fees.platform_fee_percentage, Decimal::new(25, 1));
        assert_eq!(fees.customer_fee_percentage, Decimal::ONE);
    }

    #[test]
    fn test_from_rows_missing() {
        assert!(FeeSettings::from_rows(&[row("platform", Decimal::new(25, 1))]).is_none());
        assert!(FeeSettings::from_rows(&[]).is_none());
    }
}
