//! Users, admins and gift-card customers

use shared::models::{Admin, Customer, User};
use sqlx::{PgExecutor, PgPool};

pub async fn create_user(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
    now: i64,
) -> Result<User, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO users (email, password_hash, name, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_user_by_email(pool: &PgPool, email: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn find_user_by_id(pool: &PgPool, id: i64) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Suspend or reinstate a user; `None` when the id is unknown
pub async fn set_user_active(pool: &PgPool, id: i64, is_active: bool) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("UPDATE users SET is_active = $2 WHERE id = $1 RETURNING *")
        .bind(id)
        .bind(is_active)
        .fetch_optional(pool)
        .await
}

pub async fn list_users(pool: &PgPool, limit: i64, offset: i64) -> Result<Vec<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users ORDER BY created_at DESC LIMIT $1 OFFSET $2")
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await
}

pub async fn count_users(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM users")
        .fetch_one(pool)
        .await
}

pub async fn create_admin(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    name: Option<&str>,
    now: i64,
) -> Result<Admin, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO admins (email, password_hash, name, created_at)
         VALUES ($1, $2, $3, $4)
         RETURNING *",
    )
    .bind(email)
    .bind(password_hash)
    .bind(name)
    .bind(now)
    .fetch_one(pool)
    .await
}

pub async fn find_admin_by_email(
    pool: &PgPool,
    email: &str,
) -> Result<Option<Admin>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM admins WHERE email = $1")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn count_admins(pool: &PgPool) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM admins")
        .fetch_one(pool)
        .await
}

pub async fn find_customer_by_id(pool: &PgPool, id: i64) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM customers WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Resolve a customer by (already normalized) email, creating it on first use.
/// A name is only filled in when the existing row has none.
pub async fn find_or_create_customer(
    executor: impl PgExecutor<'_>,
    email: &str,
    name: Option<&str>,
    now: i64,
) -> Result<Customer, sqlx::Error> {
    sqlx::query_as(
        "INSERT INTO customers (email, name, created_at)
         VALUES ($1, $2, $3)
         ON CONFLICT (email) DO UPDATE SET name = COALESCE(customers.name, EXCLUDED.name)
         RETURNING *",
    )
    .bind(email)
    .bind(name)
    .bind(now)
    .fetch_one(executor)
    .await
}
