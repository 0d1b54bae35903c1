//! Business records

use shared::models::{Business, BusinessSummary, BusinessUpdate};
use sqlx::{PgExecutor, PgPool};

/// Fields copied from an approved application
pub struct NewBusiness<'a> {
    pub name: &'a str,
    pub slug: &'a str,
    pub email: &'a str,
    pub password_hash: &'a str,
    pub contact_name: Option<&'a str>,
    pub contact_phone: Option<&'a str>,
    pub address: Option<&'a str>,
    pub description: Option<&'a str>,
    pub website: Option<&'a str>,
}

/// Insert an approved, active business. Returns `None` on slug collision.
pub async fn insert(
    executor: impl PgExecutor<'_>,
    new: &NewBusiness<'_>,
    now: i64,
) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO businesses (
            name, slug, email, password_hash, contact_name, contact_phone,
            address, description, website, is_approved, is_active, created_at, updated_at
         ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, TRUE, TRUE, $10, $10)
         ON CONFLICT (slug) DO NOTHING
         RETURNING *",
    )
    .bind(new.name)
    .bind(new.slug)
    .bind(new.email)
    .bind(new.password_hash)
    .bind(new.contact_name)
    .bind(new.contact_phone)
    .bind(new.address)
    .bind(new.description)
    .bind(new.website)
    .bind(now)
    .fetch_optional(executor)
    .await
}

pub async fn find_by_id(pool: &PgPool, id: i64) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM businesses WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM businesses WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

/// Public lookup: approved and active only
pub async fn find_public_by_slug(
    pool: &PgPool,
    slug: &str,
) -> Result<Option<BusinessSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, slug, description, address, website, logo_url
         FROM businesses WHERE slug = $1 AND is_approved AND is_active",
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
}

pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM businesses WHERE slug = $1)")
        .bind(slug)
        .fetch_one(pool)
        .await
}

pub async fn list_public(pool: &PgPool) -> Result<Vec<BusinessSummary>, sqlx::Error> {
    sqlx::query_as(
        "SELECT id, name, slug, description, address, website, logo_url
         FROM businesses WHERE is_approved AND is_active ORDER BY name",
    )
    .fetch_all(pool)
    .await
}

pub async fn list_all(pool: &PgPool) -> Result<Vec<Business>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM businesses ORDER BY created_at DESC")
        .fetch_all(pool)
        .await
}

pub async fn count(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM businesses")
        .fetch_one(pool)
        .await
}

/// Apply a profile edit; absent fields keep their value
pub async fn update_profile(
    pool: &PgPool,
    id: i64,
    update: &BusinessUpdate,
    now: i64,
) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as(
        "UPDATE businesses SET
            name = COALESCE($2, name),
            contact_name = COALESCE($3, contact_name),
            contact_phone = COALESCE($4, contact_phone),
            address = COALESCE($5, address),
            description = COALESCE($6, description),
            website = COALESCE($7, website),
            logo_url = COALESCE($8, logo_url),
            updated_at = $9
         WHERE id = $1
         RETURNING *",
    )
    .bind(id)
    .bind(update.name.as_deref())
    .bind(update.contact_name.as_deref())
    .bind(update.contact_phone.as_deref())
    .bind(update.address.as_deref())
    .bind(update.description.as_deref())
    .bind(update.website.as_deref())
    .bind(update.logo_url.as_deref())
    .bind(now)
    .fetch_optional(pool)
    .await
}

pub async fn set_active(
    pool: &PgPool,
    id: i64,
    is_active: bool,
    now: i64,
) -> Result<Option<Business>, sqlx::Error> {
    sqlx::query_as("UPDATE businesses SET is_active = $2, updated_at = $3 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(is_active)
        .bind(now)
        .fetch_optional(pool)
        .await
}

pub async fn set_stripe_account(
    pool: &PgPool,
    id: i64,
    account_id: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE businesses SET stripe_account_id = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(account_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn set_wix_product(
    pool: &PgPool,
    id: i64,
    product_id: &str,
    now: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE businesses SET wix_product_id = $2, updated_at = $3 WHERE id = $1")
        .bind(id)
        .bind(product_id)
        .bind(now)
        .execute(pool)
        .await?;
    Ok(())
}

pub async fn has_gift_cards(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM gift_cards WHERE business_id = $1)")
        .bind(id)
        .fetch_one(pool)
        .await
}

/// Hard delete. Returns whether a row was removed.
pub async fn delete(pool: &PgPool, id: i64) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM businesses WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
