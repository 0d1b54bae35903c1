//! Registration and login for users, businesses and admins

use serde::Deserialize;
use shared::error::{AppError, ErrorCode};
use shared::models::{Admin, Business, BusinessApplication, Role, User};
use shared::util::{is_valid_email, normalize_email, now_millis};
use sqlx::PgPool;

use crate::auth::jwt::create_token;
use crate::db;
use crate::db::applications::NewApplication;
use crate::error::{ServiceError, ServiceResult, is_unique_violation};
use crate::state::AppState;
use crate::util::{hash_password, verify_password};

type BoxError = Box<dyn std::error::Error + Send + Sync>;

pub const MIN_PASSWORD_LEN: usize = 8;

/// Normalize and shape-check an email
pub fn checked_email(email: &str) -> Result<String, AppError> {
    let email = normalize_email(email);
    if !is_valid_email(&email) {
        return Err(AppError::new(ErrorCode::InvalidEmail).with_detail("email", email));
    }
    Ok(email)
}

pub fn check_password(password: &str) -> Result<(), AppError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::new(ErrorCode::PasswordTooShort)
            .with_detail("minLength", MIN_PASSWORD_LEN as u64));
    }
    Ok(())
}

fn hash(password: &str) -> ServiceResult<String> {
    hash_password(password).map_err(|e| ServiceError::Db(format!("password hash: {e}").into()))
}

fn token_for(state: &AppState, id: i64, role: Role, email: &str) -> ServiceResult<String> {
    create_token(id, role, email, &state.jwt_secret, state.jwt_expiry_hours)
        .map_err(|e| ServiceError::Db(e.into()))
}

/// Create the first admin when the table is empty
pub async fn ensure_bootstrap_admin(
    pool: &PgPool,
    email: &str,
    password: &str,
) -> Result<(), BoxError> {
    if db::accounts::count_admins(pool).await? > 0 {
        return Ok(());
    }
    let email = normalize_email(email);
    let password_hash = hash_password(password).map_err(|e| format!("password hash: {e}"))?;
    let admin = db::accounts::create_admin(pool, &email, &password_hash, None, now_millis()).await?;
    tracing::info!(admin_id = admin.id, email = %admin.email, "Bootstrap admin created");
    Ok(())
}

// ── Storefront users ──

pub async fn register_user(
    state: &AppState,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> ServiceResult<(String, User)> {
    let email = checked_email(email)?;
    check_password(password)?;
    let password_hash = hash(password)?;

    let user = match db::accounts::create_user(&state.pool, &email, &password_hash, name, now_millis()).await {
        Ok(user) => user,
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
        }
        Err(e) => return Err(e.into()),
    };

    tracing::info!(user_id = user.id, "User registered");
    let token = token_for(state, user.id, Role::User, &user.email)?;
    Ok((token, user))
}

pub async fn login_user(state: &AppState, email: &str, password: &str) -> ServiceResult<(String, User)> {
    let email = normalize_email(email);
    let user = db::accounts::find_user_by_email(&state.pool, &email)
        .await?
        .filter(|u| verify_password(password, &u.password_hash))
        .ok_or_else(AppError::invalid_credentials)?;
    ensure_active(&user)?;

    let token = token_for(state, user.id, Role::User, &user.email)?;
    Ok((token, user))
}

/// Refuse suspended users. Checked after the password so a wrong password
/// never reveals the suspension.
pub fn ensure_active(user: &User) -> Result<(), AppError> {
    if !user.is_active {
        tracing::warn!(user_id = user.id, "Suspended user refused");
        return Err(AppError::new(ErrorCode::AccountSuspended));
    }
    Ok(())
}

/// Load the user behind a token, refusing deleted or suspended accounts
pub async fn active_user(state: &AppState, user_id: i64) -> ServiceResult<User> {
    let user = db::accounts::find_user_by_id(&state.pool, user_id)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    ensure_active(&user)?;
    Ok(user)
}

/// Admin suspend/reinstate
pub async fn set_user_status(state: &AppState, user_id: i64, is_active: bool) -> ServiceResult<User> {
    let user = db::accounts::set_user_active(&state.pool, user_id, is_active)
        .await?
        .ok_or_else(|| AppError::not_found("User"))?;
    tracing::info!(user_id = user.id, is_active, "User status changed");
    Ok(user)
}

// ── Businesses ──

/// Business login: only approved and active businesses get a token
pub async fn login_business(
    state: &AppState,
    email: &str,
    password: &str,
) -> ServiceResult<(String, Business)> {
    let email = normalize_email(email);
    let business = db::businesses::find_by_email(&state.pool, &email)
        .await?
        .filter(|b| verify_password(password, &b.password_hash))
        .ok_or_else(AppError::invalid_credentials)?;

    if !business.is_approved {
        return Err(AppError::new(ErrorCode::BusinessNotApproved).into());
    }
    if !business.is_active {
        return Err(AppError::new(ErrorCode::BusinessInactive).into());
    }

    let token = token_for(state, business.id, Role::Business, &business.email)?;
    Ok((token, business))
}

/// Business application form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApplicationForm {
    pub business_name: String,
    pub email: String,
    pub password: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub invite_token: Option<String>,
}

/// Submit a business application, consuming the invite if one is given
pub async fn submit_application(
    pool: &PgPool,
    form: &ApplicationForm,
) -> ServiceResult<BusinessApplication> {
    let business_name = form.business_name.trim();
    if business_name.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "businessName")
            .into());
    }
    let contact_name = form.contact_name.trim();
    if contact_name.is_empty() {
        return Err(AppError::new(ErrorCode::RequiredField)
            .with_detail("field", "contactName")
            .into());
    }
    let email = checked_email(&form.email)?;
    check_password(&form.password)?;
    let now = now_millis();

    let invite = match form.invite_token.as_deref().filter(|t| !t.is_empty()) {
        Some(token) => {
            let invite = db::invites::find_by_token(pool, token)
                .await?
                .ok_or_else(|| AppError::new(ErrorCode::InviteNotFound))?;
            if !invite.is_usable(now) {
                return Err(AppError::new(ErrorCode::InviteExpired).into());
            }
            Some(invite)
        }
        None => None,
    };

    if db::businesses::find_by_email(pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }
    if db::applications::pending_exists_for_email(pool, &email).await? {
        return Err(AppError::new(ErrorCode::ApplicationPending).into());
    }

    let password_hash = hash(&form.password)?;
    let new = NewApplication {
        business_name,
        email: &email,
        password_hash: &password_hash,
        contact_name,
        contact_phone: form.contact_phone.as_deref(),
        address: form.address.as_deref(),
        description: form.description.as_deref(),
        website: form.website.as_deref(),
        invite_id: invite.as_ref().map(|i| i.id),
    };

    let mut tx = pool.begin().await?;
    if let Some(invite) = &invite
        && !db::invites::mark_accepted(&mut *tx, invite.id, now).await?
    {
        return Err(AppError::new(ErrorCode::InviteExpired).into());
    }
    let application = match db::applications::create(&mut *tx, &new, now).await {
        Ok(application) => application,
        // Partial unique index on pending email
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::new(ErrorCode::ApplicationPending).into());
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit().await?;

    tracing::info!(
        application_id = application.id,
        invited = application.invite_id.is_some(),
        "Business application submitted"
    );
    Ok(application)
}

// ── Admins ──

pub async fn login_admin(state: &AppState, email: &str, password: &str) -> ServiceResult<(String, Admin)> {
    let email = normalize_email(email);
    let admin = db::accounts::find_admin_by_email(&state.pool, &email)
        .await?
        .filter(|a| verify_password(password, &a.password_hash))
        .ok_or_else(AppError::invalid_credentials)?;

    let token = token_for(state, admin.id, Role::Admin, &admin.email)?;
    Ok((token, admin))
}

/// Create another admin (admin-only route)
pub async fn register_admin(
    pool: &PgPool,
    email: &str,
    password: &str,
    name: Option<&str>,
) -> ServiceResult<Admin> {
    let email = checked_email(email)?;
    check_password(password)?;
    let password_hash = hash(password)?;

    match db::accounts::create_admin(pool, &email, &password_hash, name, now_millis()).await {
        Ok(admin) => {
            tracing::info!(admin_id = admin.id, "Admin registered");
            Ok(admin)
        }
        Err(e) if is_unique_violation(&e) => Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checked_email() {
        assert_eq!(checked_email(" Owner@Luna.SV ").unwrap(), "owner@luna.sv");
        let err = checked_email("not-an-email").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidEmail);
    }

    #[test]
    fn test_password_length() {
        assert!(check_password("12345678").is_ok());
        let err = check_password("short").unwrap_err();
        assert_eq!(err.code, ErrorCode::PasswordTooShort);
    }

    fn user(is_active: bool) -> User {
        User {
            id: 7,
            email: "buyer@mail.sv".into(),
            password_hash: String::new(),
            name: None,
            is_active,
            created_at: 0,
        }
    }

    #[test]
    fn test_suspended_user_refused() {
        assert!(ensure_active(&user(true)).is_ok());
        let err = ensure_active(&user(false)).unwrap_err();
        assert_eq!(err.code, ErrorCode::AccountSuspended);
        assert_eq!(err.http_status(), http::StatusCode::FORBIDDEN);
    }

    #[test]
    fn test_application_form_wire_shape() {
        let form: ApplicationForm = serde_json::from_value(serde_json::json!({
            "businessName": "Café Luna",
            "email": "owner@luna.sv",
            "password": "secret-pass",
            "contactName": "Ana",
            "inviteToken": "abc"
        }))
        .unwrap();
        assert_eq!(form.business_name, "Café Luna");
        assert_eq!(form.invite_token.as_deref(), Some("abc"));
        assert!(form.address.is_none());
    }
}
