//! Gift card rows
//!
//! Balance changes go through conditional updates so that concurrent
//! redemptions of the same card cannot overdraw it.

use rust_decimal::Decimal;
use serde_json::Value;
use shared::gift_card::RedemptionPlan;
use shared::models::{GiftCard, GiftCardSource, GiftCardStatus};
use sqlx::{PgExecutor, PgPool};

const REDEEMABLE: &[&str] = &GiftCardStatus::REDEEMABLE_DB;

/// Insert payload; `remaining_balance` starts equal to `amount`
pub struct NewGiftCard<'a> {
    pub code: String,
    pub business_id: i64,
    pub customer_id: Option<i64>,
    pub purchaser_user_id: Option<i64>,
    pub amount: Decimal,
    pub currency: &'a str,
    pub status: GiftCardStatus,
    pub source: GiftCardSource,
    pub order_id: Option<&'a str>,
    pub line_item_id: Option<&'a str>,
    pub recipient_email: Option<&'a str>,
    pub personal_message: Option<&'a str>,
    pub metadata: Option<&'a Value>,
    pub expires_at: i64,
}

/// Insert a card. Returns `None` when the code is already taken.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    new: &NewGiftCard<'_>,
    now: i64,
) -> Result<Option<GiftCard>, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO gift_cards (
            code, business_id, customer_id, purchaser_user_id, amount, remaining_balance,
            currency, status, source, order_id, line_item_id, recipient_email,
            personal_message, metadata, issued_at, expires_at, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $14, $14)
         ON CONFLICT (code) DO NOTHING
         RETURNING *",
    )
    .bind(&new.code)
    .bind(new.business_id)
    .bind(new.customer_id)
    .bind(new.purchaser_user_id)
    .bind(new.amount)
    .bind(new.currency)
    .bind(new.status.as_db())
    .bind(new.source.as_db())
    .bind(new.order_id)
    .bind(new.line_item_id)
    .bind(new.recipient_email)
    .bind(new.personal_message)
    .bind(new.metadata)
    .bind(now)
    .bind(new.expires_at)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_code(pool: &PgPool, code: &str) -> Result<Option<GiftCard>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM gift_cards WHERE code = $1")
        .bind(code)
        .fetch_optional(pool)
        .await
}

pub async fn list_for_business(
    pool: &PgPool,
    business_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<GiftCard>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM gift_cards WHERE business_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(business_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Cards bought by a logged-in storefront user, newest first
pub async fn list_for_purchaser(
    pool: &PgPool,
    user_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<GiftCard>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM gift_cards WHERE purchaser_user_id = $1
         ORDER BY created_at DESC LIMIT $2 OFFSET $3",
    )
    .bind(user_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Take `plan.amount` off the card's balance.
///
/// The update only matches while the card is still redeemable, unexpired
/// at `now` and holds at least `plan.amount`; `None` means another
/// redemption (or the expiry sweep) got there first.
pub async fn apply_redemption(
    executor: impl PgExecutor<'_>,
    id: i64,
    plan: &RedemptionPlan,
    redeemed_by: &str,
    notes: Option<&str>,
    now: i64,
) -> Result<Option<GiftCard>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE gift_cards SET
            remaining_balance = remaining_balance - $2,
            status = CASE WHEN remaining_balance - $2 = 0 THEN 'redeemed' ELSE 'partially_redeemed' END,
            redeemed_at = CASE WHEN remaining_balance - $2 = 0 THEN $3 ELSE redeemed_at END,
            redeemed_by = CASE WHEN remaining_balance - $2 = 0 THEN $4 ELSE redeemed_by END,
            redemption_notes = CASE WHEN remaining_balance - $2 = 0 THEN $5 ELSE redemption_notes END,
            updated_at = $3
         WHERE id = $1
           AND remaining_balance >= $2
           AND status = ANY($6)
           AND expires_at >= $3
         RETURNING *",
    )
    .bind(id)
    .bind(plan.amount)
    .bind(now)
    .bind(redeemed_by)
    .bind(notes)
    .bind(REDEEMABLE)
    .fetch_optional(executor)
    .await
}

/// Flip a `pending` checkout card to `purchased`
pub async fn mark_purchased(
    executor: impl PgExecutor<'_>,
    id: i64,
    payment_intent_id: &str,
    now: i64,
) -> Result<Option<GiftCard>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE gift_cards SET status = 'purchased', payment_intent_id = $2, issued_at = $3, updated_at = $3
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .bind(payment_intent_id)
    .bind(now)
    .fetch_optional(executor)
    .await
}

/// Mark a `pending` checkout card as `failed`
pub async fn mark_failed(
    pool: &PgPool,
    id: i64,
    payment_intent_id: Option<&str>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE gift_cards SET status = 'failed', payment_intent_id = COALESCE($2, payment_intent_id), updated_at = $3
         WHERE id = $1 AND status = 'pending'",
    )
    .bind(id)
    .bind(payment_intent_id)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(())
}

/// Expire every redeemable card with balance whose `expires_at` is before `now`.
/// Returns `(id, code)` of each card touched.
pub async fn expire_due(
    executor: impl PgExecutor<'_>,
    now: i64,
) -> Result<Vec<(i64, String)>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE gift_cards SET status = 'expired', updated_at = $1
         WHERE expires_at < $1 AND remaining_balance > 0 AND status = ANY($2)
         RETURNING id, code",
    )
    .bind(now)
    .bind(REDEEMABLE)
    .fetch_all(executor)
    .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM gift_cards")
        .fetch_one(pool)
        .await
}

/// Unspent balance across all redeemable cards
pub async fn outstanding_balance(pool: &PgPool) -> Result<Decimal, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT COALESCE(SUM(remaining_balance), 0) FROM gift_cards WHERE status = ANY($1)",
    )
    .bind(REDEEMABLE)
    .fetch_one(pool)
    .await
}
