//! Business applications

use shared::models::{ApplicationStatus, BusinessApplication};
use sqlx::{PgExecutor, PgPool};

pub struct NewApplication<'a> {
    pub business_name: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub contact_name: &'a str,
    pub contact_phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
    pub website: Option<&'a str>,
    pub invite_id: Option<i64>,
}

pub async fn create(
    executor: impl PgExecutor<'_>,
    new: &NewApplication<'_>,
    now: i64,
) -> Result<BusinessApplication, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO business_applications (
            business_name, email, password_hash, contact_name, contact_phone,
            address, description, website, invite_id, status, created_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, 'pending', $10)
         RETURNING *",
    )
    .bind(new.business_name)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.contact_name)
    .bind(new.contact_phone)
    .bind(new.address)
    .bind(new.description)
    .bind(new.website)
    .bind(new.invite_id)
    .bind(now)
    .fetch_one(executor)
    .await
}

pub async fn find_by_id(
    pool: &PgPool,
    id: i64,
) -> Result<Option<BusinessApplication>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM business_applications WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest first, optionally filtered by status
pub async fn list(
    pool: &PgPool,
    status: Option<ApplicationStatus>,
) -> Result<Vec<BusinessApplication>, sqlx::Error> {
    sqlx::query_as(
        "SELECT * FROM business_applications
         WHERE ($1::TEXT IS NULL OR status = $1)
         ORDER BY created_at DESC",
    )
    .bind(status.map(|s| s.as_db()))
    .fetch_all(pool)
    .await
}

pub async fn pending_exists_for_email(pool: &PgPool, email: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM business_applications WHERE email = $1 AND status = 'pending')",
    )
    .bind(email)
    .fetch_one(pool)
    .await
}

pub async fn count_pending(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM business_applications WHERE status = 'pending'")
        .fetch_one(pool)
        .await
}

/// Move a pending application to `approved` or `rejected`.
///
/// Returns `None` if the application was no longer pending, so two
/// concurrent reviews cannot both succeed.
pub async fn mark_reviewed(
    executor: impl PgExecutor<'_>,
    id: i64,
    status: ApplicationStatus,
    business_id: Option<i64>,
    rejection_reason: Option<&str>,
    now: i64,
) -> Result<Option<BusinessApplication>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE business_applications
         SET status = $2, business_id = $3, rejection_reason = $4, reviewed_at = $5
         WHERE id = $1 AND status = 'pending'
         RETURNING *",
    )
    .bind(id)
    .bind(status.as_db())
    .bind(business_id)
    .bind(rejection_reason)
    .bind(now)
    .fetch_optional(executor)
    .await
}
