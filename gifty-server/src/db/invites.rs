//! Business invites

use shared::models::BusinessInvite;
use sqlx::{PgExecutor, PgPool};

pub async fn create(
    pool: &PgPool,
    email: &str,
    token: &str,
    message: Option<&str>,
    invited_by: i64,
    expires_at: i64,
    now: i64,
) -> Result<BusinessInvite, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO business_invites (email, token, message, status, invited_by, expires_at, created_at)
         VALUES ($1, $2, $3, 'pending', $4, $5, $6)
         RETURNING *",
    )
    .bind(email)
    .bind(token)
    .bind(message)
    .bind(invited_by)
    .bind(expires_at)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_by_token(
    pool: &PgPool,
    token: &str,
) -> Result<Option<BusinessInvite>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM business_invites WHERE token = $1")
        .bind(token)
        .fetch_optional(pool)
        .await
}

/// Is there a pending invite for `email` that has not expired at `now`?
pub async fn pending_exists(pool: &PgPool, email: &str, now: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(
            SELECT 1 FROM business_invites
            WHERE email = $1 AND status = 'pending' AND expires_at > $2
         )",
    )
    .bind(email)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn list(pool: &PgPool) -> Result<Vec<BusinessInvite>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM business_invites ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

/// Accept a pending, unexpired invite. `false` if it was already used or expired.
pub async fn mark_accepted(
    executor: impl PgExecutor<'_>,
    id: i64,
    now: i64,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE business_invites SET status = 'accepted', accepted_at = $2
         WHERE id = $1 AND status = 'pending' AND expires_at > $2",
    )
    .bind(id)
    .bind(now)
    .execute(executor)
    .await?;
    Ok(result.rows_affected() > 0)
}

/// Revoke (hard delete). Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM business_invites WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
