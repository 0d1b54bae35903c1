//! Periodic expiry sweep
//!
//! Only keeps the stored status in line with `expires_at`; validation and
//! redemption recompute expiry themselves.

use shared::models::ActivityAction;
use shared::util::now_millis;
use sqlx::PgPool;

use crate::db;

/// Principal recorded on sweep activity entries
const SWEEP_ACTOR: &str = "system";

/// Expire due cards and log each one. Returns how many were expired.
pub async fn sweep(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let now = now_millis();
    let mut tx = pool.begin().await?;

    let expired = db::gift_cards::expire_due(&mut *tx, now).await?;
    for (id, code) in &expired {
        db::ledger::log_activity(
            &mut *tx,
            Some(*id),
            code,
            ActivityAction::Expired,
            SWEEP_ACTOR,
            None,
            now,
        )
        .await?;
    }

    tx.commit().await?;
    Ok(expired.len() as u64)
}
