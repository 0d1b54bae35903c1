//! Append-only ledger tables: transactions, gift-card activity, reconciliations

use rust_decimal::Decimal;
use serde_json::Value;
use shared::models::{
    ActivityAction, ActivityEntry, PaymentReconciliation, Transaction, TransactionType,
    TransactionWithBusiness,
};
use sqlx::{PgExecutor, PgPool};

pub struct NewTransaction<'a> {
    pub transaction_type: TransactionType,
    pub amount: Decimal,
    pub currency: &'a str,
    pub gift_card_id: Option<i64>,
    pub business_id: Option<i64>,
    pub payment_provider: Option<&'a str>,
    pub payment_id: Option<&'a str>,
    pub description: Option<String>,
    pub metadata: Option<Value>,
}

impl<'a> NewTransaction<'a> {
    pub fn new(transaction_type: TransactionType, amount: Decimal, currency: &'a str) -> Self {
        Self {
            transaction_type,
            amount,
            currency,
            gift_card_id: None,
            business_id: None,
            payment_provider: None,
            payment_id: None,
            description: None,
            metadata: None,
        }
    }

    pub fn card(mut self, gift_card_id: i64, business_id: i64) -> Self {
        self.gift_card_id = Some(gift_card_id);
        self.business_id = Some(business_id);
        self
    }

    pub fn payment(mut self, provider: &'a str, payment_id: &'a str) -> Self {
        self.payment_provider = Some(provider);
        self.payment_id = Some(payment_id);
        self
    }

    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn metadata(mut self, metadata: Value) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

pub async fn insert_transaction(
    executor: impl PgExecutor<'_>,
    tx: &NewTransaction<'_>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO transactions (
            transaction_type, amount, currency, gift_card_id, business_id,
            payment_provider, payment_id, status, description, metadata, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'completed', $8, $9, $10)",
    )
    .bind(tx.transaction_type.as_db())
    .bind(tx.amount)
    .bind(tx.currency)
    .bind(tx.gift_card_id)
    .bind(tx.business_id)
    .bind(tx.payment_provider)
    .bind(tx.payment_id)
    .bind(tx.description.as_deref())
    .bind(tx.metadata.as_ref())
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_for_business(
    pool: &PgPool,
    business_id: i64,
    limit: i64,
    offset: i64,
) -> Result<Vec<Transaction>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM transactions WHERE business_id = $1
         ORDER BY created_at DESC, id DESC LIMIT $2 OFFSET $3",
    )
    .bind(business_id)
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

pub async fn list_all(
    pool: &PgPool,
    limit: i64,
    offset: i64,
) -> Result<Vec<TransactionWithBusiness>, sqlx::Error> {
    sqlx::query_as(
        "SELECT t.id, t.transaction_type, t.amount, t.currency, t.gift_card_id, t.business_id,
                b.name AS business_name, t.payment_provider, t.payment_id, t.status,
                t.description, t.created_at
         FROM transactions t
         LEFT JOIN businesses b ON b.id = t.business_id
         ORDER BY t.created_at DESC, t.id DESC
         LIMIT $1 OFFSET $2",
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(pool)
    .await
}

/// Append an activity entry. `gift_card_id` is `None` for lookups of unknown codes.
pub async fn log_activity(
    executor: impl PgExecutor<'_>,
    gift_card_id: Option<i64>,
    code: &str,
    action: ActivityAction,
    performed_by: &str,
    details: Option<Value>,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "INSERT INTO gift_card_activity (gift_card_id, code, action, performed_by, details, created_at)
         VALUES ($1, $2, $3, $4, $5, $6)",
    )
    .bind(gift_card_id)
    .bind(code)
    .bind(action.as_db())
    .bind(performed_by)
    .bind(details)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn list_activity_for_card(
    pool: &PgPool,
    gift_card_id: i64,
) -> Result<Vec<ActivityEntry>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM gift_card_activity WHERE gift_card_id = $1 ORDER BY created_at, id",
    )
    .bind(gift_card_id)
    .fetch_all(pool)
    .await
}

/// Charge the ledger does not yet account for
#[derive(Debug, Clone, PartialEq)]
pub struct NewReconciliation<'a> {
    pub gift_card_id: Option<i64>,
    pub business_id: Option<i64>,
    pub payment_intent_id: Option<&'a str>,
    pub checkout_session_id: Option<&'a str>,
    pub amount: Decimal,
    pub currency: &'a str,
    pub reason: String,
}

pub async fn create_reconciliation(
    executor: impl PgExecutor<'_>,
    rec: &NewReconciliation<'_>,
    now: i64,
) -> Result<PaymentReconciliation, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO payment_reconciliations (
            gift_card_id, business_id, payment_intent_id, checkout_session_id,
            amount, currency, reason, status, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, 'open', $8)
         RETURNING *",
    )
    .bind(rec.gift_card_id)
    .bind(rec.business_id)
    .bind(rec.payment_intent_id)
    .bind(rec.checkout_session_id)
    .bind(rec.amount)
    .bind(rec.currency)
    .bind(&rec.reason)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn list_open_reconciliations(
    pool: &PgPool,
) -> Result<Vec<PaymentReconciliation>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM payment_reconciliations WHERE status = 'open' ORDER BY created_at",
    )
    .fetch_all(pool)
    .await
}

/// Close an open reconciliation. `None` if it does not exist or is already resolved.
pub async fn resolve_reconciliation(
    pool: &PgPool,
    id: i64,
    resolved_by: &str,
    now: i64,
) -> Result<Option<PaymentReconciliation>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE payment_reconciliations SET status = 'resolved', resolved_by = $2, resolved_at = $3
         WHERE id = $1 AND status = 'open'
         RETURNING *",
    )
    .bind(id)
    .bind(resolved_by)
    .bind(now)
    .fetch_optional(pool)
    .await
}
