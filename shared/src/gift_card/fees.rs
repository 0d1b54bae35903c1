//! Purchase fee split
//!
//! The customer pays `amount + customer_fee`. The business receives
//! `amount - platform_fee`. The platform keeps both fees as the
//! processor's application fee.

use super::lifecycle::round_money;
use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::FeeSettings;
use rust_decimal::prelude::*;
use serde::Serialize;

const HUNDRED: Decimal = Decimal::ONE_HUNDRED;

/// All figures of one purchase, rounded to cents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FeeSplit {
    pub amount: Decimal,
    pub customer_fee: Decimal,
    pub total_charged: Decimal,
    pub platform_fee_from_business: Decimal,
    pub net_to_business: Decimal,
}

/// `percentage`% of `amount`, rounded to cents; `None` on overflow
fn percent_of(amount: Decimal, percentage: Decimal) -> Option<Decimal> {
    amount.checked_mul(percentage)?.checked_div(HUNDRED).map(round_money)
}

impl FeeSplit {
    /// Split `amount` by the configured fee percentages.
    ///
    /// Fails with `InvalidAmount` when any figure overflows.
    pub fn compute(amount: Decimal, fees: &FeeSettings) -> AppResult<Self> {
        let amount = round_money(amount);
        let overflow = || AppError::invalid_amount("amount");
        let customer_fee =
            percent_of(amount, fees.customer_fee_percentage).ok_or_else(overflow)?;
        let platform_fee =
            percent_of(amount, fees.platform_fee_percentage).ok_or_else(overflow)?;
        Ok(Self {
            amount,
            customer_fee,
            total_charged: amount.checked_add(customer_fee).ok_or_else(overflow)?,
            platform_fee_from_business: platform_fee,
            net_to_business: amount - platform_fee,
        })
    }

    /// What the platform retains from the charge
    pub fn application_fee(&self) -> Decimal {
        self.customer_fee + self.platform_fee_from_business
    }
}

/// Convert a cent-rounded amount to integer minor units (cents)
pub fn to_minor_units(value: Decimal) -> Option<i64> {
    round_money(value).checked_mul(HUNDRED)?.to_i64()
}

/// Fee percentages must lie within 0..=100
pub fn validate_fee_percentage(value: Decimal, field: &'static str) -> AppResult<Decimal> {
    if value < Decimal::ZERO || value > HUNDRED {
        return Err(AppError::new(ErrorCode::InvalidFeePercentage)
            .with_detail("field", field)
            .with_detail("value", value.to_string()));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gift_card::lifecycle::MAX_AMOUNT;

    fn settings(platform: Decimal, customer: Decimal) -> FeeSettings {
        FeeSettings {
            platform_fee_percentage: platform,
            customer_fee_percentage: customer,
        }
    }

    #[test]
    fn test_reference_split() {
        let fees = settings(Decimal::new(25, 1), Decimal::ONE);
        let split = FeeSplit::compute(Decimal::from(100), &fees).unwrap();
        assert_eq!(split.customer_fee, Decimal::new(100, 2));
        assert_eq!(split.total_charged, Decimal::new(10100, 2));
        assert_eq!(split.platform_fee_from_business, Decimal::new(250, 2));
        assert_eq!(split.net_to_business, Decimal::new(9750, 2));
        assert_eq!(split.application_fee(), Decimal::new(350, 2));

        assert_eq!(to_minor_units(split.total_charged), Some(10100));
        assert_eq!(to_minor_units(split.application_fee()), Some(350));
    }

    #[test]
    fn test_ledger_rows_balance() {
        // purchase == payout + business fee + customer fee, for awkward amounts too
        let fees = settings(Decimal::new(25, 1), Decimal::ONE);
        for amount in [
            Decimal::from(100),
            Decimal::new(3333, 2),
            Decimal::new(1, 2),
            Decimal::new(99999, 2),
        ] {
            let s = FeeSplit::compute(amount, &fees).unwrap();
            assert_eq!(
                s.total_charged,
                s.net_to_business + s.platform_fee_from_business + s.customer_fee
            );
            assert_eq!(s.total_charged - s.application_fee(), s.net_to_business);
        }
    }

    #[test]
    fn test_rounding_half_away_from_zero() {
        // 2.5% of 10.10 = 0.2525 -> 0.25; 1% of 10.50 = 0.105 -> 0.11
        let fees = settings(Decimal::new(25, 1), Decimal::ONE);
        assert_eq!(
            FeeSplit::compute(Decimal::new(1010, 2), &fees).unwrap().platform_fee_from_business,
            Decimal::new(25, 2)
        );
        assert_eq!(
            FeeSplit::compute(Decimal::new(1050, 2), &fees).unwrap().customer_fee,
            Decimal::new(11, 2)
        );
    }

    #[test]
    fn test_zero_fees() {
        let split =
            FeeSplit::compute(Decimal::from(40), &settings(Decimal::ZERO, Decimal::ZERO)).unwrap();
        assert_eq!(split.total_charged, Decimal::from(40));
        assert_eq!(split.net_to_business, Decimal::from(40));
        assert!(split.application_fee().is_zero());
    }

    #[test]
    fn test_overflow_is_an_error() {
        let fees = settings(Decimal::new(25, 1), Decimal::from(50));
        let huge = Decimal::from_scientific("7e28").unwrap();
        let err = FeeSplit::compute(huge, &fees).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);

        assert_eq!(to_minor_units(Decimal::MAX), None);
    }

    #[test]
    fn test_largest_amount_splits() {
        let fees = settings(Decimal::ONE_HUNDRED, Decimal::ONE_HUNDRED);
        let split = FeeSplit::compute(MAX_AMOUNT, &fees).unwrap();
        assert_eq!(split.total_charged, MAX_AMOUNT + MAX_AMOUNT);
        assert!(split.net_to_business.is_zero());
        assert_eq!(to_minor_units(split.total_charged), Some(1_999_999_999_998));
    }

    #[test]
    fn test_fee_percentage_bounds() {
        assert!(validate_fee_percentage(Decimal::ZERO, "platformFeePercentage").is_ok());
        assert!(validate_fee_percentage(Decimal::ONE_HUNDRED, "platformFeePercentage").is_ok());
        let err = validate_fee_percentage(Decimal::new(1001, 1), "customerFeePercentage")
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidFeePercentage);
        assert!(validate_fee_percentage(Decimal::new(-1, 2), "platformFeePercentage").is_err());
    }
}
