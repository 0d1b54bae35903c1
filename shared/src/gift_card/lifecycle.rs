//! Gift card lifecycle evaluation and redemption planning
//!
//! Expiry is always recomputed from `expires_at` against the caller's
//! clock; the stored status may lag behind until the expiry sweep runs.

use crate::error::{AppError, AppResult, ErrorCode};
use crate::models::{GiftCard, GiftCardStatus};
use rust_decimal::prelude::*;
use serde::Serialize;

/// Monetary precision (cents)
pub const DECIMAL_PLACES: u32 = 2;

/// Round a monetary value to cents, half away from zero
#[inline]
pub fn round_money(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(DECIMAL_PLACES, RoundingStrategy::MidpointAwayFromZero)
}

/// Largest amount a `NUMERIC(12,2)` column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

/// Round `amount` to cents and require it to lie within `0 < amount <= MAX_AMOUNT`
pub fn validate_amount(amount: Decimal, field: &'static str) -> AppResult<Decimal> {
    let rounded = round_money(amount);
    if rounded <= Decimal::ZERO || rounded > MAX_AMOUNT {
        return Err(AppError::invalid_amount(field));
    }
    Ok(rounded)
}

/// Derived flags reported by validation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CardState {
    pub valid: bool,
    pub is_expired: bool,
    pub is_redeemed: bool,
}

impl CardState {
    /// Evaluate a card at `now` (epoch millis)
    pub fn of(card: &GiftCard, now: i64) -> Self {
        Self::evaluate(card.status(), card.remaining_balance, card.expires_at, now)
    }

    pub fn evaluate(
        status: Option<GiftCardStatus>,
        remaining_balance: Decimal,
        expires_at: i64,
        now: i64,
    ) -> Self {
        let is_expired = now > expires_at || status == Some(GiftCardStatus::Expired);
        let is_redeemed =
            remaining_balance <= Decimal::ZERO || status == Some(GiftCardStatus::Redeemed);
        let redeemable = status.is_some_and(|s| s.is_redeemable());
        Self {
            valid: !is_expired && !is_redeemed && redeemable,
            is_expired,
            is_redeemed,
        }
    }
}

/// Outcome of a redemption, computed before anything is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RedemptionPlan {
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    pub fully_redeemed: bool,
    pub new_status: GiftCardStatus,
}

/// Decide how much to take from a card.
///
/// `partial` of `None` redeems the whole remaining balance; a partial larger
/// than the balance is capped at the balance.
pub fn plan_redemption(
    card: &GiftCard,
    partial: Option<Decimal>,
    now: i64,
) -> AppResult<RedemptionPlan> {
    let state = CardState::of(card, now);
    if state.is_expired {
        return Err(AppError::new(ErrorCode::GiftCardExpired).with_detail("code", card.code.clone()));
    }
    if state.is_redeemed {
        return Err(
            AppError::new(ErrorCode::GiftCardFullyRedeemed).with_detail("code", card.code.clone())
        );
    }
    if !state.valid {
        return Err(AppError::new(ErrorCode::GiftCardNotRedeemable)
            .with_detail("code", card.code.clone())
            .with_detail("status", card.status.clone()));
    }

    let balance = card.remaining_balance;
    let amount = match partial {
        Some(requested) => validate_amount(requested, "partialAmount")?.min(balance),
        None => balance,
    };
    let new_balance = balance - amount;
    let fully_redeemed = new_balance.is_zero();

    Ok(RedemptionPlan {
        amount,
        previous_balance: balance,
        new_balance,
        fully_redeemed,
        new_status: if fully_redeemed {
            GiftCardStatus::Redeemed
        } else {
            GiftCardStatus::PartiallyRedeemed
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const NOW: i64 = 1_760_000_000_000;

    fn card(status: GiftCardStatus, amount: i64, balance: Decimal) -> GiftCard {
        GiftCard {
            id: 1,
            code: "ABCD-EFGH23".to_string(),
            business_id: 1,
            customer_id: Some(1),
            purchaser_user_id: None,
            amount: Decimal::from(amount),
            remaining_balance: balance,
            currency: "USD".to_string(),
            status: status.as_db().to_string(),
            source: "manual".to_string(),
            order_id: None,
            line_item_id: None,
            recipient_email: None,
            personal_message: None,
            payment_intent_id: None,
            metadata: None,
            issued_at: NOW - 1_000,
            expires_at: NOW + 86_400_000,
            redeemed_at: None,
            redeemed_by: None,
            redemption_notes: None,
            created_at: NOW - 1_000,
            updated_at: NOW - 1_000,
        }
    }

    /// Apply a plan the way the database update does
    fn apply(card: &mut GiftCard, plan: &RedemptionPlan) {
        card.remaining_balance = plan.new_balance;
        card.status = plan.new_status.as_db().to_string();
    }

    #[test]
    fn test_fresh_card_is_valid() {
        let c = card(GiftCardStatus::Issued, 50, Decimal::from(50));
        let state = CardState::of(&c, NOW);
        assert_eq!(
            state,
            CardState {
                valid: true,
                is_expired: false,
                is_redeemed: false
            }
        );
        let purchased = card(GiftCardStatus::Purchased, 50, Decimal::from(50));
        assert!(CardState::of(&purchased, NOW).valid);
    }

    #[test]
    fn test_expired_by_clock() {
        let c = card(GiftCardStatus::Issued, 50, Decimal::from(50));
        let state = CardState::of(&c, c.expires_at + 1);
        assert!(state.is_expired);
        assert!(!state.valid);
        // Boundary: still valid at the exact expiry instant
        assert!(CardState::of(&c, c.expires_at).valid);
    }

    #[test]
    fn test_pending_and_failed_not_valid() {
        for status in [GiftCardStatus::Pending, GiftCardStatus::Failed] {
            let c = card(status, 50, Decimal::from(50));
            let state = CardState::of(&c, NOW);
            assert!(!state.valid);
            assert!(!state.is_expired);
            assert!(!state.is_redeemed);
        }
    }

    #[test]
    fn test_full_redemption_then_invalid() {
        let mut c = card(GiftCardStatus::Issued, 50, Decimal::from(50));
        let plan = plan_redemption(&c, None, NOW).unwrap();
        assert_eq!(plan.amount, Decimal::from(50));
        assert_eq!(plan.previous_balance, Decimal::from(50));
        assert_eq!(plan.new_balance, Decimal::ZERO);
        assert!(plan.fully_redeemed);
        assert_eq!(plan.new_status, GiftCardStatus::Redeemed);

        apply(&mut c, &plan);
        let state = CardState::of(&c, NOW);
        assert!(!state.valid);
        assert!(state.is_redeemed);

        let err = plan_redemption(&c, None, NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::GiftCardFullyRedeemed);
    }

    #[test]
    fn test_partial_redemptions_until_zero() {
        let mut c = card(GiftCardStatus::Issued, 50, Decimal::from(50));

        let plan = plan_redemption(&c, Some(Decimal::from(20)), NOW).unwrap();
        assert_eq!(plan.amount, Decimal::from(20));
        assert_eq!(plan.new_balance, Decimal::from(30));
        assert!(!plan.fully_redeemed);
        assert_eq!(plan.new_status, GiftCardStatus::PartiallyRedeemed);
        apply(&mut c, &plan);
        assert!(CardState::of(&c, NOW).valid);

        let plan = plan_redemption(&c, Some(Decimal::new(2999, 2)), NOW).unwrap();
        assert_eq!(plan.new_balance, Decimal::new(1, 2));
        apply(&mut c, &plan);

        let plan = plan_redemption(&c, None, NOW).unwrap();
        assert_eq!(plan.amount, Decimal::new(1, 2));
        assert!(plan.fully_redeemed);
        apply(&mut c, &plan);

        assert_eq!(c.remaining_balance, Decimal::ZERO);
        assert!(CardState::of(&c, NOW).is_redeemed);
    }

    #[test]
    fn test_partial_capped_at_balance() {
        let c = card(GiftCardStatus::PartiallyRedeemed, 50, Decimal::from(10));
        let plan = plan_redemption(&c, Some(Decimal::from(25)), NOW).unwrap();
        assert_eq!(plan.amount, Decimal::from(10));
        assert!(plan.fully_redeemed);
    }

    #[test]
    fn test_balance_stays_within_bounds() {
        let mut c = card(GiftCardStatus::Issued, 100, Decimal::from(100));
        for partial in [
            Some(Decimal::new(3333, 2)),
            Some(Decimal::new(5, 1)),
            Some(Decimal::from(1_000)),
        ] {
            let plan = plan_redemption(&c, partial, NOW).unwrap();
            apply(&mut c, &plan);
            assert!(c.remaining_balance >= Decimal::ZERO);
            assert!(c.remaining_balance <= c.amount);
        }
        assert!(c.remaining_balance.is_zero());
    }

    #[test]
    fn test_rejects_expired() {
        let c = card(GiftCardStatus::Issued, 50, Decimal::from(50));
        let err = plan_redemption(&c, None, c.expires_at + 1).unwrap_err();
        assert_eq!(err.code, ErrorCode::GiftCardExpired);

        let swept = card(GiftCardStatus::Expired, 50, Decimal::from(50));
        let err = plan_redemption(&swept, None, NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::GiftCardExpired);
    }

    #[test]
    fn test_rejects_non_positive_partial() {
        let c = card(GiftCardStatus::Issued, 50, Decimal::from(50));
        for bad in [Decimal::ZERO, Decimal::from(-5), Decimal::new(4, 3)] {
            let err = plan_redemption(&c, Some(bad), NOW).unwrap_err();
            assert_eq!(err.code, ErrorCode::InvalidAmount);
        }
    }

    #[test]
    fn test_rejects_pending_card() {
        let c = card(GiftCardStatus::Pending, 50, Decimal::from(50));
        let err = plan_redemption(&c, None, NOW).unwrap_err();
        assert_eq!(err.code, ErrorCode::GiftCardNotRedeemable);
    }

    #[test]
    fn test_validate_amount_rounds_to_cents() {
        assert_eq!(
            validate_amount(Decimal::new(10005, 3), "amount").unwrap(),
            Decimal::new(1001, 2)
        );
        assert!(validate_amount(Decimal::new(-1, 0), "amount").is_err());
    }

    #[test]
    fn test_validate_amount_upper_bound() {
        assert_eq!(MAX_AMOUNT, Decimal::new(999_999_999_999, 2));
        assert_eq!(validate_amount(MAX_AMOUNT, "amount").unwrap(), MAX_AMOUNT);

        let err = validate_amount(MAX_AMOUNT + Decimal::new(1, 2), "amount").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidAmount);
        assert!(validate_amount(Decimal::from_scientific("7e28").unwrap(), "amount").is_err());
        assert!(validate_amount(Decimal::MAX, "partialAmount").is_err());
    }
}
