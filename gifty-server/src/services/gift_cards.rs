//! Gift card issuance, validation and redemption

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::gift_card::{
    CardState, fallback_code, generate_code, normalize_code, plan_redemption, validate_amount,
};
use shared::models::{
    ActivityAction, ActivityEntry, BusinessSummary, Customer, GiftCard, GiftCardSource,
    GiftCardStatus, TransactionType,
};
use shared::util::{add_days, now_millis};
use sqlx::PgConnection;

use crate::db;
use crate::db::gift_cards::NewGiftCard;
use crate::db::ledger::NewTransaction;
use crate::email::{self, CardLine};
use crate::error::ServiceResult;
use crate::services::accounts::checked_email;
use crate::state::AppState;

/// Random codes tried before falling back to a UUID-derived code
const MAX_CODE_ATTEMPTS: usize = 5;

/// Upper bound on cards per issuance
pub const MAX_QUANTITY: u32 = 50;

pub const DEFAULT_CURRENCY: &str = "USD";

/// Uppercase ISO-4217 style code; absent means USD
pub fn normalize_currency(currency: Option<&str>) -> Result<String, AppError> {
    let currency = currency.map(str::trim).filter(|c| !c.is_empty());
    match currency {
        None => Ok(DEFAULT_CURRENCY.to_string()),
        Some(c) if c.len() == 3 && c.chars().all(|ch| ch.is_ascii_alphabetic()) => {
            Ok(c.to_ascii_uppercase())
        }
        Some(c) => Err(AppError::validation("Currency must be a three-letter code")
            .with_detail("currency", c.to_string())),
    }
}

/// Insert `new` under a fresh unique code, retrying on collision.
///
/// `new.code` is overwritten on every attempt.
pub async fn insert_with_unique_code(
    conn: &mut PgConnection,
    new: &mut NewGiftCard<'_>,
    now: i64,
) -> ServiceResult<GiftCard> {
    for attempt in 0..=MAX_CODE_ATTEMPTS {
        new.code = if attempt < MAX_CODE_ATTEMPTS {
            generate_code()
        } else {
            fallback_code(uuid::Uuid::new_v4())
        };
        if let Some(card) = db::gift_cards::insert(&mut *conn, new, now).await? {
            return Ok(card);
        }
        tracing::warn!(attempt, "Gift card code collision");
    }
    Err(AppError::new(ErrorCode::CodeGenerationFailed).into())
}

// ── Issue ──

/// Cards to issue for one business and customer
#[derive(Debug, Clone)]
pub struct IssueOrder<'a> {
    pub business_id: i64,
    pub amount: Decimal,
    pub currency: Option<&'a str>,
    pub quantity: u32,
    pub customer_email: &'a str,
    pub customer_name: Option<&'a str>,
    pub order_id: Option<&'a str>,
    pub line_item_id: Option<&'a str>,
    pub metadata: Option<&'a Value>,
    pub source: GiftCardSource,
    /// Principal recorded in the activity log
    pub performed_by: &'a str,
}

/// Public fields of an issued card
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IssuedCard {
    pub id: i64,
    pub code: String,
    pub amount: Decimal,
    pub currency: String,
    pub business_name: String,
    pub status: String,
    pub expires_at: i64,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Issued {
    pub business_id: i64,
    pub business_name: String,
    pub customer_id: i64,
    pub gift_cards: Vec<IssuedCard>,
    pub email_sent: bool,
}

/// Issue `quantity` cards to a customer, then email them (best effort).
pub async fn issue(state: &AppState, order: &IssueOrder<'_>) -> ServiceResult<Issued> {
    let amount = validate_amount(order.amount, "amount")?;
    if order.quantity == 0 || order.quantity > MAX_QUANTITY {
        return Err(AppError::new(ErrorCode::ValueOutOfRange)
            .with_detail("field", "quantity")
            .with_detail("max", MAX_QUANTITY)
            .into());
    }
    let currency = normalize_currency(order.currency)?;
    let customer_email = checked_email(order.customer_email)?;

    let business = db::businesses::find_by_id(&state.pool, order.business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    if !business.is_approved {
        return Err(AppError::new(ErrorCode::BusinessNotApproved).into());
    }
    if !business.is_active {
        return Err(AppError::new(ErrorCode::BusinessInactive).into());
    }

    let now = now_millis();
    let expires_at = add_days(now, state.gift_card_ttl_days);

    let mut tx = state.pool.begin().await?;
    let customer =
        db::accounts::find_or_create_customer(&mut *tx, &customer_email, order.customer_name, now)
            .await?;

    let mut new = NewGiftCard {
        code: String::new(),
        business_id: business.id,
        customer_id: Some(customer.id),
        purchaser_user_id: None,
        amount,
        currency: &currency,
        status: GiftCardStatus::Issued,
        source: order.source,
        order_id: order.order_id,
        line_item_id: order.line_item_id,
        recipient_email: Some(customer_email.as_str()),
        personal_message: None,
        metadata: order.metadata,
        expires_at,
    };

    let mut cards = Vec::with_capacity(order.quantity as usize);
    for _ in 0..order.quantity {
        let card = insert_with_unique_code(&mut *tx, &mut new, now).await?;
        db::ledger::log_activity(
            &mut *tx,
            Some(card.id),
            &card.code,
            ActivityAction::Issued,
            order.performed_by,
            Some(json!({ "amount": amount, "currency": currency, "source": order.source })),
            now,
        )
        .await?;
        let mut ledger = NewTransaction::new(TransactionType::Purchase, amount, &currency)
            .card(card.id, business.id)
            .description(format!("Gift card {} issued", card.code));
        if let Some(order_id) = order.order_id {
            ledger = ledger.metadata(json!({ "orderId": order_id }));
        }
        db::ledger::insert_transaction(&mut *tx, &ledger, now).await?;
        cards.push(card);
    }
    tx.commit().await?;

    tracing::info!(
        business_id = business.id,
        customer_id = customer.id,
        count = cards.len(),
        source = order.source.as_db(),
        "Gift cards issued"
    );

    // Email failure never undoes the issuance
    let lines: Vec<CardLine<'_>> = cards
        .iter()
        .map(|c| CardLine {
            code: &c.code,
            amount: c.amount,
            currency: &c.currency,
            expires_at: c.expires_at,
        })
        .collect();
    let message = email::gift_cards_issued(&business.name, customer.name.as_deref(), &lines);
    let email_sent = state.mailer.send_best_effort(&customer.email, &message).await;
    if email_sent {
        for card in &cards {
            if let Err(e) = db::ledger::log_activity(
                &state.pool,
                Some(card.id),
                &card.code,
                ActivityAction::Emailed,
                order.performed_by,
                Some(json!({ "to": customer.email })),
                now_millis(),
            )
            .await
            {
                tracing::warn!(gift_card_id = card.id, error = %e, "Failed to log email activity");
            }
        }
    }

    Ok(Issued {
        business_id: business.id,
        business_name: business.name.clone(),
        customer_id: customer.id,
        gift_cards: cards
            .into_iter()
            .map(|c| IssuedCard {
                id: c.id,
                code: c.code,
                amount: c.amount,
                currency: c.currency,
                business_name: business.name.clone(),
                status: c.status,
                expires_at: c.expires_at,
            })
            .collect(),
        email_sent,
    })
}

// ── Validate ──

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Validation {
    #[serde(flatten)]
    pub state: CardState,
    pub gift_card: GiftCard,
    pub business: Option<BusinessSummary>,
}

/// Look up a card without changing it. Every lookup is logged, including misses.
///
/// `scope` restricts visibility to one business; cards of other businesses
/// are reported as not found.
pub async fn validate(
    state: &AppState,
    raw_code: &str,
    scope: Option<i64>,
    performed_by: &str,
) -> ServiceResult<Validation> {
    let code = normalize_code(raw_code);
    if code.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "code")
            .into());
    }
    let now = now_millis();

    let found = db::gift_cards::find_by_code(&state.pool, &code).await?;
    let card = match found {
        Some(card) if scope.is_none_or(|b| b == card.business_id) => card,
        other => {
            let reason = if other.is_some() { "foreign_business" } else { "not_found" };
            db::ledger::log_activity(
                &state.pool,
                other.as_ref().map(|c| c.id),
                &code,
                ActivityAction::ValidationFailed,
                performed_by,
                Some(json!({ "reason": reason })),
                now,
            )
            .await?;
            return Err(AppError::gift_card_not_found(code).into());
        }
    };

    let card_state = CardState::of(&card, now);
    db::ledger::log_activity(
        &state.pool,
        Some(card.id),
        &card.code,
        ActivityAction::Validated,
        performed_by,
        Some(json!(card_state)),
        now,
    )
    .await?;

    let business = db::businesses::find_by_id(&state.pool, card.business_id)
        .await?
        .map(|b| BusinessSummary::from(&b));

    Ok(Validation {
        state: card_state,
        gift_card: card,
        business,
    })
}

// ── Redeem ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RedeemRequest {
    pub code: String,
    /// Omitted means the whole remaining balance
    pub partial_amount: Option<Decimal>,
    pub redeemed_by: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Redemption {
    pub code: String,
    pub redeemed_amount: Decimal,
    pub previous_balance: Decimal,
    pub remaining_balance: Decimal,
    pub fully_redeemed: bool,
    pub status: String,
    pub gift_card: GiftCard,
}

/// Redeem all or part of a card's balance.
///
/// Rejections (unknown, expired, spent) leave the card untouched. The
/// balance update is conditional, so a concurrent redemption that drained
/// the card first turns this one into a conflict instead of an overdraft.
pub async fn redeem(
    state: &AppState,
    request: &RedeemRequest,
    scope: Option<i64>,
    principal_email: &str,
) -> ServiceResult<Redemption> {
    let code = normalize_code(&request.code);
    if code.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "code")
            .into());
    }

    let card = db::gift_cards::find_by_code(&state.pool, &code)
        .await?
        .ok_or_else(|| AppError::gift_card_not_found(code.clone()))?;
    if let Some(business_id) = scope
        && business_id != card.business_id
    {
        tracing::warn!(gift_card_id = card.id, business_id, "Redemption by foreign business refused");
        return Err(AppError::permission_denied("Gift card belongs to another business").into());
    }

    let now = now_millis();
    let plan = plan_redemption(&card, request.partial_amount, now)?;
    let redeemed_by = request
        .redeemed_by
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(principal_email);
    let notes = request.notes.as_deref().map(str::trim).filter(|s| !s.is_empty());

    let mut tx = state.pool.begin().await?;
    let updated = db::gift_cards::apply_redemption(&mut *tx, card.id, &plan, redeemed_by, notes, now)
        .await?
        .ok_or_else(|| {
            AppError::new(ErrorCode::RedemptionConflict).with_detail("code", card.code.clone())
        })?;

    db::ledger::log_activity(
        &mut *tx,
        Some(updated.id),
        &updated.code,
        ActivityAction::Redeemed,
        principal_email,
        Some(json!({
            "amount": plan.amount,
            "previousBalance": plan.previous_balance,
            "remainingBalance": updated.remaining_balance,
            "redeemedBy": redeemed_by,
            "notes": notes,
        })),
        now,
    )
    .await?;
    let ledger = NewTransaction::new(TransactionType::Redemption, plan.amount, &updated.currency)
        .card(updated.id, updated.business_id)
        .description(format!("Gift card {} redeemed by {redeemed_by}", updated.code));
    db::ledger::insert_transaction(&mut *tx, &ledger, now).await?;
    tx.commit().await?;

    tracing::info!(
        gift_card_id = updated.id,
        amount = %plan.amount,
        remaining = %updated.remaining_balance,
        "Gift card redeemed"
    );

    Ok(Redemption {
        code: updated.code.clone(),
        redeemed_amount: plan.amount,
        previous_balance: plan.previous_balance,
        remaining_balance: updated.remaining_balance,
        fully_redeemed: updated.remaining_balance.is_zero(),
        status: updated.status.clone(),
        gift_card: updated,
    })
}

/// Activity trail of a card, oldest first
pub async fn activity(
    state: &AppState,
    raw_code: &str,
    scope: Option<i64>,
) -> ServiceResult<Vec<ActivityEntry>> {
    let code = normalize_code(raw_code);
    let card = db::gift_cards::find_by_code(&state.pool, &code)
        .await?
        .filter(|c| scope.is_none_or(|b| b == c.business_id))
        .ok_or_else(|| AppError::gift_card_not_found(code.clone()))?;
    Ok(db::ledger::list_activity_for_card(&state.pool, card.id).await?)
}

// ── Resend ──

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResendRequest {
    /// Send somewhere other than the address on file
    pub customer_email: Option<String>,
    pub customer_name: Option<String>,
}

/// Who gets a resent card: the requested address, else the gift recipient,
/// else the customer the card was issued to.
fn resend_recipient(
    request: &ResendRequest,
    card: &GiftCard,
    customer: Option<&Customer>,
) -> Result<(String, Option<String>), AppError> {
    let customer_name = customer.and_then(|c| c.name.clone());
    let name = request
        .customer_name
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .or(customer_name);

    if let Some(email) = request.customer_email.as_deref().filter(|e| !e.trim().is_empty()) {
        return Ok((checked_email(email)?, name));
    }
    if let Some(email) = card.recipient_email.as_deref().filter(|e| !e.trim().is_empty()) {
        return Ok((checked_email(email)?, name));
    }
    match customer {
        Some(c) => Ok((c.email.clone(), name)),
        None => Err(AppError::new(ErrorCode::RequiredField).with_detail("field", "customerEmail")),
    }
}

/// Cards that were never paid for are not sent out
fn ensure_sendable(card: &GiftCard) -> Result<(), AppError> {
    match GiftCardStatus::from_db(&card.status) {
        Some(GiftCardStatus::Pending | GiftCardStatus::Failed) | None => {
            Err(AppError::new(ErrorCode::GiftCardNotRedeemable)
                .with_detail("code", card.code.clone())
                .with_detail("status", card.status.clone()))
        }
        Some(_) => Ok(()),
    }
}

/// Re-send a card's email, e.g. after a bounce. Returns whether the
/// provider accepted it; a send failure is not an error.
pub async fn resend_email(
    state: &AppState,
    raw_code: &str,
    request: &ResendRequest,
    scope: Option<i64>,
    performed_by: &str,
) -> ServiceResult<bool> {
    let code = normalize_code(raw_code);
    let card = db::gift_cards::find_by_code(&state.pool, &code)
        .await?
        .filter(|c| scope.is_none_or(|b| b == c.business_id))
        .ok_or_else(|| AppError::gift_card_not_found(code.clone()))?;
    ensure_sendable(&card)?;

    let customer = match card.customer_id {
        Some(id) => db::accounts::find_customer_by_id(&state.pool, id).await?,
        None => None,
    };
    let (to, name) = resend_recipient(request, &card, customer.as_ref())?;
    let business = db::businesses::find_by_id(&state.pool, card.business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;

    let line = CardLine {
        code: &card.code,
        amount: card.amount,
        currency: &card.currency,
        expires_at: card.expires_at,
    };
    let message = email::gift_cards_issued(&business.name, name.as_deref(), &[line]);
    let email_sent = state.mailer.send_best_effort(&to, &message).await;
    if email_sent {
        db::ledger::log_activity(
            &state.pool,
            Some(card.id),
            &card.code,
            ActivityAction::Emailed,
            performed_by,
            Some(json!({ "to": to, "resend": true })),
            now_millis(),
        )
        .await?;
    }
    tracing::info!(gift_card_id = card.id, email_sent, "Gift card email resent");
    Ok(email_sent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card(status: &str, recipient_email: Option<&str>) -> GiftCard {
        serde_json::from_value(json!({
            "id": 1, "code": "ABCD-EFGH23", "business_id": 2, "customer_id": 3,
            "purchaser_user_id": null, "amount": 25.0, "remaining_balance": 25.0,
            "currency": "USD", "status": status, "source": "manual", "order_id": null,
            "line_item_id": null, "recipient_email": recipient_email, "personal_message": null,
            "payment_intent_id": null, "metadata": null, "issued_at": 0, "expires_at": 10,
            "redeemed_at": null, "redeemed_by": null, "redemption_notes": null,
            "created_at": 0, "updated_at": 0
        }))
        .unwrap()
    }

    fn customer() -> Customer {
        Customer {
            id: 3,
            email: "ana@example.com".into(),
            name: Some("Ana".into()),
            created_at: 0,
        }
    }

    #[test]
    fn test_resend_recipient_precedence() {
        let plain = card("issued", None);
        let gifted = card("issued", Some("Friend@Example.com"));
        let none = ResendRequest::default();

        let (to, name) = resend_recipient(&none, &plain, Some(&customer())).unwrap();
        assert_eq!(to, "ana@example.com");
        assert_eq!(name.as_deref(), Some("Ana"));

        let (to, _) = resend_recipient(&none, &gifted, Some(&customer())).unwrap();
        assert_eq!(to, "friend@example.com");

        let redirect = ResendRequest {
            customer_email: Some(" New@Mail.sv ".into()),
            customer_name: Some("Bea".into()),
        };
        let (to, name) = resend_recipient(&redirect, &gifted, Some(&customer())).unwrap();
        assert_eq!(to, "new@mail.sv");
        assert_eq!(name.as_deref(), Some("Bea"));
    }

    #[test]
    fn test_resend_needs_an_address() {
        let err = resend_recipient(&ResendRequest::default(), &card("issued", None), None).unwrap_err();
        assert_eq!(err.code, ErrorCode::RequiredField);

        let bad = ResendRequest {
            customer_email: Some("nope".into()),
            customer_name: None,
        };
        let err = resend_recipient(&bad, &card("issued", None), Some(&customer())).unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidEmail);
    }

    #[test]
    fn test_unpaid_cards_not_sendable() {
        assert!(ensure_sendable(&card("issued", None)).is_ok());
        assert!(ensure_sendable(&card("redeemed", None)).is_ok());
        let err = ensure_sendable(&card("pending", None)).unwrap_err();
        assert_eq!(err.code, ErrorCode::GiftCardNotRedeemable);
        assert!(ensure_sendable(&card("failed", None)).is_err());
    }

    #[test]
    fn test_normalize_currency() {
        assert_eq!(normalize_currency(None).unwrap(), "USD");
        assert_eq!(normalize_currency(Some(" ")).unwrap(), "USD");
        assert_eq!(normalize_currency(Some("eur")).unwrap(), "EUR");
        assert_eq!(
            normalize_currency(Some("dollars")).unwrap_err().code,
            ErrorCode::ValidationFailed
        );
        assert!(normalize_currency(Some("U$D")).is_err());
    }

    #[test]
    fn test_redeem_request_wire_shape() {
        let req: RedeemRequest = serde_json::from_value(json!({
            "code": "abcd efgh23",
            "partialAmount": 12.5
        }))
        .unwrap();
        assert_eq!(req.partial_amount, Some(Decimal::new(125, 1)));
        assert!(req.redeemed_by.is_none());
    }

    #[test]
    fn test_validation_flattens_state() {
        let card: GiftCard = serde_json::from_value(json!({
            "id": 1, "code": "ABCD-EFGH23", "business_id": 2, "customer_id": null,
            "purchaser_user_id": null, "amount": 25.0, "remaining_balance": 25.0,
            "currency": "USD", "status": "issued", "source": "manual", "order_id": null,
            "line_item_id": null, "recipient_email": null, "personal_message": null,
            "payment_intent_id": null, "metadata": null, "issued_at": 0, "expires_at": 10,
            "redeemed_at": null, "redeemed_by": null, "redemption_notes": null,
            "created_at": 0, "updated_at": 0
        }))
        .unwrap();
        let validation = Validation {
            state: CardState::of(&card, 5),
            gift_card: card,
            business: None,
        };
        let v = serde_json::to_value(&validation).unwrap();
        assert_eq!(v["valid"], true);
        assert_eq!(v["isExpired"], false);
        assert_eq!(v["isRedeemed"], false);
        assert_eq!(v["giftCard"]["code"], "ABCD-EFGH23");
    }
}
