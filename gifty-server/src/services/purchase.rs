//! Paid checkout: Stripe Connect onboarding, the purchase saga and
//! storefront checkout fulfilment
//!
//! The purchase runs as a saga:
//! 1. insert the card as `pending`
//! 2. charge through a destination PaymentIntent, keyed by the card id
//! 3. on failure mark the card `failed` and stop
//! 4. on success mark it `purchased` and write the ledger in one transaction
//! 5. if step 4 fails the charge is kept and a reconciliation is recorded

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use shared::error::{AppError, ErrorCode};
use shared::gift_card::{FeeSplit, MAX_AMOUNT, to_minor_units, validate_amount};
use shared::models::{
    ActivityAction, Business, FeeSettings, GiftCard, GiftCardSource, GiftCardStatus,
    PaymentReconciliation, TransactionType,
};
use shared::util::{add_days, now_millis};

use crate::db;
use crate::db::gift_cards::NewGiftCard;
use crate::db::ledger::{NewReconciliation, NewTransaction};
use crate::email::{self, CardLine};
use crate::error::{ServiceError, ServiceResult};
use crate::services::accounts::checked_email;
use crate::services::gift_cards::{
    self, DEFAULT_CURRENCY, IssueOrder, Issued, MAX_QUANTITY, insert_with_unique_code,
    normalize_currency,
};
use crate::state::AppState;
use crate::stripe::{self, PaymentIntent, PaymentIntentParams};

const PROVIDER: &str = "stripe";

fn stripe_error(op: &str, e: impl std::fmt::Display) -> AppError {
    tracing::error!(op, error = %e, "Stripe call failed");
    AppError::upstream(PROVIDER)
}

// ── Connect onboarding ──

/// Create an Express account for the business and store its id
pub async fn create_connect_account(
    state: &AppState,
    business_id: i64,
    country: &str,
    business_type: &str,
) -> ServiceResult<String> {
    let country = country.trim();
    let business_type = business_type.trim();
    if country.is_empty() || business_type.is_empty() {
        return Err(AppError::validation("Country and business type are required").into());
    }
    let business = db::businesses::find_by_id(&state.pool, business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;

    let account_id = stripe::create_express_account(
        &state.http,
        &state.stripe_secret_key,
        &business.email,
        &country.to_ascii_uppercase(),
        business_type,
        business.id,
    )
    .await
    .map_err(|e| stripe_error("create_account", e))?;

    db::businesses::set_stripe_account(&state.pool, business.id, &account_id, now_millis()).await?;
    tracing::info!(business_id = business.id, account_id = %account_id, "Stripe Connect account created");
    Ok(account_id)
}

/// Onboarding link for the business's connected account
pub async fn create_connect_account_link(state: &AppState, business_id: i64) -> ServiceResult<String> {
    let business = db::businesses::find_by_id(&state.pool, business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    let account_id = business
        .stripe_account_id
        .as_deref()
        .ok_or_else(|| AppError::new(ErrorCode::PaymentAccountMissing))?;

    let url = stripe::create_account_link(
        &state.http,
        &state.stripe_secret_key,
        account_id,
        &format!("{}/reauth", state.frontend_url),
        &format!("{}/return", state.frontend_url),
    )
    .await
    .map_err(|e| stripe_error("create_account_link", e))?;

    tracing::info!(business_id = business.id, "Stripe onboarding link generated");
    Ok(url)
}

// ── Purchase saga ──

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    pub business_id: i64,
    pub amount: Decimal,
    pub currency: Option<String>,
    pub payment_method_id: String,
    pub recipient_email: String,
    pub recipient_name: Option<String>,
    pub personal_message: Option<String>,
    /// Explicit expiry (epoch millis); defaults to the configured TTL
    pub expires_at: Option<i64>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseOutcome {
    pub gift_card: GiftCard,
    pub fees: FeeSplit,
    pub payment_intent_id: String,
    /// The charge went through but the ledger write did not; an admin must reconcile
    pub reconciliation_pending: bool,
    pub email_sent: bool,
}

/// Business must be open and able to receive transfers
async fn checkout_business(state: &AppState, business_id: i64) -> ServiceResult<(Business, String)> {
    let business = db::businesses::find_by_id(&state.pool, business_id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::BusinessNotFound))?;
    if !business.is_approved {
        return Err(AppError::new(ErrorCode::BusinessNotApproved).into());
    }
    if !business.is_active {
        return Err(AppError::new(ErrorCode::BusinessInactive).into());
    }
    let account_id = business
        .stripe_account_id
        .clone()
        .ok_or_else(|| AppError::new(ErrorCode::PaymentAccountMissing))?;

    let account = stripe::retrieve_account(&state.http, &state.stripe_secret_key, &account_id)
        .await
        .map_err(|e| stripe_error("retrieve_account", e))?;
    if !stripe::transfers_active(&account) {
        tracing::warn!(business_id = business.id, "Connected account cannot receive transfers");
        return Err(AppError::new(ErrorCode::TransfersNotActive).into());
    }
    Ok((business, account_id))
}

/// Fee percentages, read fresh for every purchase
async fn current_fees(state: &AppState) -> ServiceResult<FeeSettings> {
    let rows = db::fees::load(&state.pool).await?;
    FeeSettings::from_rows(&rows).ok_or_else(|| AppError::new(ErrorCode::FeeConfigMissing).into())
}

/// The four ledger rows of a successful purchase
fn purchase_ledger<'a>(
    card: &'a GiftCard,
    business: &Business,
    split: &FeeSplit,
    intent_id: &'a str,
) -> [NewTransaction<'a>; 4] {
    let row = |kind, amount| {
        NewTransaction::new(kind, amount, &card.currency)
            .card(card.id, card.business_id)
            .payment(PROVIDER, intent_id)
    };
    [
        row(TransactionType::Purchase, split.total_charged)
            .description(format!("Gift card {} purchased", card.code)),
        row(TransactionType::PlatformFeeCustomer, split.customer_fee)
            .description(format!("Customer fee for gift card {}", card.code)),
        row(TransactionType::PlatformFeeBusiness, split.platform_fee_from_business)
            .description(format!("Business fee for gift card {}", card.code)),
        row(TransactionType::Payout, split.net_to_business)
            .description(format!("Payout to {} for gift card {}", business.name, card.code)),
    ]
}

/// Flip the card to `purchased` and write its ledger atomically
async fn record_purchase(
    state: &AppState,
    card: &GiftCard,
    business: &Business,
    split: &FeeSplit,
    intent: &PaymentIntent,
) -> ServiceResult<GiftCard> {
    let now = now_millis();
    let mut tx = state.pool.begin().await?;

    let purchased = db::gift_cards::mark_purchased(&mut *tx, card.id, &intent.id, now)
        .await?
        .ok_or_else(|| ServiceError::Db(format!("gift card {} no longer pending", card.id).into()))?;
    for row in purchase_ledger(&purchased, business, split, &intent.id) {
        db::ledger::insert_transaction(&mut *tx, &row, now).await?;
    }
    db::ledger::log_activity(
        &mut *tx,
        Some(purchased.id),
        &purchased.code,
        ActivityAction::Issued,
        PROVIDER,
        Some(json!({ "paymentIntentId": intent.id, "fees": split })),
        now,
    )
    .await?;

    tx.commit().await?;
    Ok(purchased)
}

/// Charge a customer for a new gift card and pay the business its share.
pub async fn purchase(
    state: &AppState,
    request: &PurchaseRequest,
    purchaser_user_id: Option<i64>,
) -> ServiceResult<PurchaseOutcome> {
    let amount = validate_amount(request.amount, "amount")?;
    let currency = normalize_currency(request.currency.as_deref())?;
    let recipient_email = checked_email(&request.recipient_email)?;
    let payment_method = request.payment_method_id.trim();
    if payment_method.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "paymentMethodId")
            .into());
    }
    let now = now_millis();
    let expires_at = match request.expires_at {
        Some(at) if at <= now => {
            return Err(AppError::new(ErrorCode::ValueOutOfRange)
                .with_detail("field", "expiresAt")
                .into());
        }
        Some(at) => at,
        None => add_days(now, state.gift_card_ttl_days),
    };

    let (business, destination) = checkout_business(state, request.business_id).await?;
    let fees = current_fees(state).await?;
    let split = FeeSplit::compute(amount, &fees)?;
    let (Some(amount_cents), Some(fee_cents)) =
        (to_minor_units(split.total_charged), to_minor_units(split.application_fee()))
    else {
        return Err(AppError::invalid_amount("amount").into());
    };

    // Step 1: pending card
    let personal_message = request.personal_message.as_deref().map(str::trim).filter(|m| !m.is_empty());
    let mut conn = state.pool.acquire().await?;
    let customer = db::accounts::find_or_create_customer(
        &mut *conn,
        &recipient_email,
        request.recipient_name.as_deref(),
        now,
    )
    .await?;
    let mut new = NewGiftCard {
        code: String::new(),
        business_id: business.id,
        customer_id: Some(customer.id),
        purchaser_user_id,
        amount,
        currency: &currency,
        status: GiftCardStatus::Pending,
        source: GiftCardSource::Stripe,
        order_id: None,
        line_item_id: None,
        recipient_email: Some(recipient_email.as_str()),
        personal_message,
        metadata: None,
        expires_at,
    };
    let card = insert_with_unique_code(&mut *conn, &mut new, now).await?;
    drop(conn);

    // Step 2: charge
    let params = PaymentIntentParams {
        amount_cents,
        currency: &currency,
        payment_method,
        application_fee_cents: fee_cents,
        destination: &destination,
        receipt_email: &recipient_email,
        return_url: &format!("{}/purchase-success", state.frontend_url),
        metadata: vec![
            ("giftCardId", card.id.to_string()),
            ("businessId", business.id.to_string()),
            (
                "purchaserUserId",
                purchaser_user_id.map(|id| id.to_string()).unwrap_or_default(),
            ),
        ],
    };
    let idempotency_key = format!("gift-card-{}", card.id);
    let intent = match stripe::create_payment_intent(
        &state.http,
        &state.stripe_secret_key,
        &params,
        &idempotency_key,
    )
    .await
    {
        Ok(intent) => intent,
        Err(e) => {
            // Step 3: compensate
            db::gift_cards::mark_failed(&state.pool, card.id, None, now_millis()).await?;
            return Err(stripe_error("create_payment_intent", e).into());
        }
    };

    if !intent.succeeded() {
        tracing::warn!(
            gift_card_id = card.id,
            payment_intent_id = %intent.id,
            status = %intent.status,
            "Payment did not succeed"
        );
        db::gift_cards::mark_failed(&state.pool, card.id, Some(&intent.id), now_millis()).await?;
        return Err(AppError::new(ErrorCode::PaymentFailed)
            .with_detail("status", intent.status)
            .with_detail("paymentIntentId", intent.id)
            .into());
    }

    // Step 4: record, or step 5: reconcile
    let (gift_card, reconciliation_pending) =
        match record_purchase(state, &card, &business, &split, &intent).await {
            Ok(purchased) => (purchased, false),
            Err(e) => {
                let reason = match &e {
                    ServiceError::Db(err) => err.to_string(),
                    ServiceError::App(err) => err.message.clone(),
                };
                tracing::error!(
                    gift_card_id = card.id,
                    payment_intent_id = %intent.id,
                    error = %reason,
                    "Charge succeeded but purchase could not be recorded"
                );
                let rec = NewReconciliation {
                    gift_card_id: Some(card.id),
                    business_id: Some(business.id),
                    payment_intent_id: Some(intent.id.as_str()),
                    checkout_session_id: None,
                    amount: split.total_charged,
                    currency: &currency,
                    reason,
                };
                match db::ledger::create_reconciliation(&state.pool, &rec, now_millis()).await
                {
                    Ok(rec) => tracing::warn!(reconciliation_id = rec.id, "Payment reconciliation recorded"),
                    Err(rec_err) => tracing::error!(
                        gift_card_id = card.id,
                        payment_intent_id = %intent.id,
                        error = %rec_err,
                        "Failed to record payment reconciliation"
                    ),
                }
                (card, true)
            }
        };

    tracing::info!(
        gift_card_id = gift_card.id,
        business_id = business.id,
        payment_intent_id = %intent.id,
        total = %split.total_charged,
        "Gift card purchased"
    );

    let line = CardLine {
        code: &gift_card.code,
        amount: gift_card.amount,
        currency: &gift_card.currency,
        expires_at: gift_card.expires_at,
    };
    let message = email::gift_card_purchased(&business.name, &line, personal_message);
    let email_sent = state.mailer.send_best_effort(&recipient_email, &message).await;

    Ok(PurchaseOutcome {
        gift_card,
        fees: split,
        payment_intent_id: intent.id,
        reconciliation_pending,
        email_sent,
    })
}

// ── Storefront checkout ──

/// Principal recorded for cards issued from checkout webhooks
pub const WEBHOOK_ACTOR: &str = "stripe-webhook";

/// Gift card order carried in a completed Checkout Session
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutOrder {
    pub session_id: String,
    pub business_id: i64,
    pub amount: Decimal,
    pub quantity: u32,
    pub currency: Option<String>,
    pub customer_email: String,
    pub customer_name: Option<String>,
    pub source: GiftCardSource,
    pub payment_intent: Option<String>,
    /// What Stripe charged, from `amount_total` (minor units)
    pub amount_total: Option<Decimal>,
}

impl CheckoutOrder {
    /// Read the order from a `checkout.session` object. `None` when the
    /// session does not carry gift card metadata.
    pub fn from_session(session: &Value) -> Option<Self> {
        let metadata = &session["metadata"];
        let text = |v: &Value| -> Option<String> {
            match v {
                Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
                Value::Number(n) => Some(n.to_string()),
                _ => None,
            }
        };

        let business_id = text(&metadata["businessId"])?.parse().ok()?;
        let amount = text(&metadata["amount"])?.parse().ok()?;
        let quantity = match text(&metadata["quantity"]) {
            Some(q) => q.parse().ok()?,
            None => 1,
        };
        let customer_email = text(&session["customer_details"]["email"])?;
        let source = match metadata["source"].as_str() {
            Some("wix") => GiftCardSource::Wix,
            _ => GiftCardSource::Stripe,
        };

        Some(Self {
            session_id: text(&session["id"])?,
            business_id,
            amount,
            quantity,
            currency: text(&session["currency"]),
            customer_email,
            customer_name: text(&session["customer_details"]["name"]),
            source,
            payment_intent: text(&session["payment_intent"]),
            amount_total: session["amount_total"].as_i64().map(|cents| Decimal::new(cents, 2)),
        })
    }

    /// Amount the customer paid. Falls back to `amount * quantity` when the
    /// session omits `amount_total`, and to zero when that is out of range.
    pub fn charged(&self) -> Decimal {
        let ceiling = MAX_AMOUNT * Decimal::from(MAX_QUANTITY);
        self.amount_total
            .or_else(|| self.amount.checked_mul(Decimal::from(self.quantity)))
            .filter(|total| *total >= Decimal::ZERO && *total <= ceiling)
            .unwrap_or(Decimal::ZERO)
    }

    /// Reconciliation for a paid session that produced no card
    pub fn unfulfilled<'a>(&'a self, error: &AppError) -> NewReconciliation<'a> {
        NewReconciliation {
            gift_card_id: None,
            business_id: Some(self.business_id),
            payment_intent_id: self.payment_intent.as_deref(),
            checkout_session_id: Some(self.session_id.as_str()),
            amount: self.charged(),
            currency: self.currency.as_deref().unwrap_or(DEFAULT_CURRENCY),
            reason: format!("checkout not fulfilled ({}): {}", error.code, error.message),
        }
    }
}

/// Record a paid checkout that could not be turned into cards, so the
/// charge is refunded or fulfilled by hand instead of being lost.
pub async fn reconcile_unfulfilled(
    state: &AppState,
    order: &CheckoutOrder,
    error: &AppError,
) -> Result<PaymentReconciliation, sqlx::Error> {
    let rec = order.unfulfilled(error);
    let rec = db::ledger::create_reconciliation(&state.pool, &rec, now_millis()).await?;
    tracing::warn!(
        reconciliation_id = rec.id,
        session_id = %order.session_id,
        business_id = order.business_id,
        amount = %rec.amount,
        "Unfulfilled checkout recorded for reconciliation"
    );
    Ok(rec)
}

/// Issue the cards paid for in a storefront checkout
pub async fn fulfil_checkout(state: &AppState, order: &CheckoutOrder) -> ServiceResult<Issued> {
    let metadata = json!({
        "sessionId": order.session_id,
        "paymentIntent": order.payment_intent,
    });
    gift_cards::issue(
        state,
        &IssueOrder {
            business_id: order.business_id,
            amount: order.amount,
            currency: order.currency.as_deref(),
            quantity: order.quantity,
            customer_email: &order.customer_email,
            customer_name: order.customer_name.as_deref(),
            order_id: Some(&order.session_id),
            line_item_id: None,
            metadata: Some(&metadata),
            source: order.source,
            performed_by: WEBHOOK_ACTOR,
        },
    )
    .await
}

#[cfg(test)]
mod tests {
    use super::*;

    fn card() -> GiftCard {
        serde_json::from_value(json!({
            "id": 7, "code": "ABCD-EFGH23", "business_id": 3, "customer_id": 1,
            "purchaser_user_id": null, "amount": 100.0, "remaining_balance": 100.0,
            "currency": "USD", "status": "purchased", "source": "stripe", "order_id": null,
            "line_item_id": null, "recipient_email": "ana@example.com", "personal_message": null,
            "payment_intent_id": "pi_1", "metadata": null, "issued_at": 0, "expires_at": 10,
            "redeemed_at": null, "redeemed_by": null, "redemption_notes": null,
            "created_at": 0, "updated_at": 0
        }))
        .unwrap()
    }

    fn business() -> Business {
        serde_json::from_value(json!({
            "id": 3, "name": "Café Luna", "slug": "caf-luna", "email": "owner@luna.sv",
            "contact_name": null, "contact_phone": null, "address": null, "description": null,
            "website": null, "logo_url": null, "is_approved": true, "is_active": true,
            "wix_product_id": null, "stripe_account_id": "acct_1",
            "created_at": 0, "updated_at": 0
        }))
        .unwrap()
    }

    #[test]
    fn test_purchase_ledger_balances() {
        let fees = FeeSettings {
            platform_fee_percentage: Decimal::new(25, 1),
            customer_fee_percentage: Decimal::ONE,
        };
        let split = FeeSplit::compute(Decimal::from(100), &fees).unwrap();
        let card = card();
        let business = business();
        let rows = purchase_ledger(&card, &business, &split, "pi_1");

        let kinds: Vec<_> = rows.iter().map(|r| r.transaction_type).collect();
        assert_eq!(
            kinds,
            vec![
                TransactionType::Purchase,
                TransactionType::PlatformFeeCustomer,
                TransactionType::PlatformFeeBusiness,
                TransactionType::Payout,
            ]
        );
        assert_eq!(rows[0].amount, Decimal::new(10100, 2));
        assert_eq!(rows[1].amount, Decimal::new(100, 2));
        assert_eq!(rows[2].amount, Decimal::new(250, 2));
        assert_eq!(rows[3].amount, Decimal::new(9750, 2));
        // Charge = payout + both fees
        assert_eq!(rows[0].amount, rows[1].amount + rows[2].amount + rows[3].amount);
        assert!(rows.iter().all(|r| r.payment_id == Some("pi_1")));
        assert!(rows.iter().all(|r| r.gift_card_id == Some(7)));
    }

    #[test]
    fn test_checkout_order_from_session() {
        let session = json!({
            "id": "cs_test_1",
            "currency": "usd",
            "payment_intent": "pi_9",
            "metadata": { "businessId": "12", "amount": "25.50", "quantity": "2" },
            "customer_details": { "email": "Ana@Example.com", "name": "Ana" }
        });
        let order = CheckoutOrder::from_session(&session).unwrap();
        assert_eq!(order.business_id, 12);
        assert_eq!(order.amount, Decimal::new(2550, 2));
        assert_eq!(order.quantity, 2);
        assert_eq!(order.customer_email, "Ana@Example.com");
        assert_eq!(order.source, GiftCardSource::Stripe);
        assert_eq!(order.payment_intent.as_deref(), Some("pi_9"));
        assert!(order.amount_total.is_none());
        assert_eq!(order.charged(), Decimal::new(5100, 2));
    }

    #[test]
    fn test_unfulfilled_checkout_reconciliation() {
        let session = json!({
            "id": "cs_test_4",
            "currency": "usd",
            "payment_intent": "pi_4",
            "amount_total": 7650,
            "metadata": { "businessId": "12", "amount": "25.50", "quantity": "3" },
            "customer_details": { "email": "ana@example.com" }
        });
        let order = CheckoutOrder::from_session(&session).unwrap();
        let err = AppError::new(ErrorCode::BusinessInactive);
        let rec = order.unfulfilled(&err);

        assert_eq!(rec.gift_card_id, None);
        assert_eq!(rec.business_id, Some(12));
        assert_eq!(rec.checkout_session_id, Some("cs_test_4"));
        assert_eq!(rec.payment_intent_id, Some("pi_4"));
        assert_eq!(rec.amount, Decimal::new(7650, 2));
        assert_eq!(rec.currency, "usd");
        assert!(rec.reason.contains("3003"));
        assert!(rec.reason.contains("inactive"));
    }

    #[test]
    fn test_unfulfilled_amount_stays_in_range() {
        let session = json!({
            "id": "cs_test_5",
            "metadata": { "businessId": "1", "amount": "79228162514264337593543950335", "quantity": "60" },
            "customer_details": { "email": "ana@example.com" }
        });
        let order = CheckoutOrder::from_session(&session).unwrap();
        let rec = order.unfulfilled(&AppError::invalid_amount("amount"));
        assert_eq!(rec.amount, Decimal::ZERO);
        assert_eq!(rec.currency, DEFAULT_CURRENCY);
        assert_eq!(rec.payment_intent_id, None);
    }

    #[test]
    fn test_checkout_order_defaults_and_missing_metadata() {
        let session = json!({
            "id": "cs_test_2",
            "metadata": { "businessId": 4, "amount": 50, "source": "wix" },
            "customer_details": { "email": "bo@example.com" }
        });
        let order = CheckoutOrder::from_session(&session).unwrap();
        assert_eq!(order.quantity, 1);
        assert_eq!(order.source, GiftCardSource::Wix);
        assert!(order.customer_name.is_none());

        let no_metadata = json!({ "id": "cs_3", "customer_details": { "email": "x@y.z" } });
        assert!(CheckoutOrder::from_session(&no_metadata).is_none());
    }
}
