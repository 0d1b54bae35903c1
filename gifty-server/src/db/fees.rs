//! Platform fee configuration rows

use rust_decimal::Decimal;
use shared::models::{FEE_TYPE_CUSTOMER, FEE_TYPE_PLATFORM, PlatformFee};
use sqlx::PgPool;

pub async fn load(pool: &PgPool) -> Result<Vec<PlatformFee>, sqlx::Error> {
    sqlx::query_as("SELECT fee_type, percentage, updated_at FROM platform_fees ORDER BY fee_type")
        .fetch_all(pool)
        .await
}

/// Replace both percentages atomically
pub async fn update(
    pool: &PgPool,
    platform: Decimal,
    customer: Decimal,
    now: i64,
) -> Result<Vec<PlatformFee>, sqlx::Error> {
    let mut tx = pool.begin().await?;
    for (fee_type, percentage) in [(FEE_TYPE_PLATFORM, platform), (FEE_TYPE_CUSTOMER, customer)] {
        sqlx::query(
            "INSERT INTO platform_fees (fee_type, percentage, updated_at) VALUES ($1, $2, $3)
             ON CONFLICT (fee_type) DO UPDATE SET percentage = EXCLUDED.percentage, updated_at = EXCLUDED.updated_at",
        )
        .bind(fee_type)
        .bind(percentage)
        .bind(now)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;
    load(pool).await
}
