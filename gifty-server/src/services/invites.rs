//! Business invites: token-bearing invitations to apply

use shared::error::{AppError, ErrorCode};
use shared::models::BusinessInvite;
use shared::util::{add_days, now_millis};

use crate::db;
use crate::email;
use crate::error::ServiceResult;
use crate::services::accounts::checked_email;
use crate::state::AppState;
use crate::util::generate_token;

/// Registration link sent in the invite email
pub fn registration_url(frontend_url: &str, token: &str) -> String {
    format!("{frontend_url}/register/{token}")
}

/// Create an invite and email it. Returns the invite and whether the email went out.
pub async fn send(
    state: &AppState,
    admin_id: i64,
    email: &str,
    message: Option<&str>,
) -> ServiceResult<(BusinessInvite, bool)> {
    let email = checked_email(email)?;
    let now = now_millis();

    if db::invites::pending_exists(&state.pool, &email, now).await? {
        return Err(AppError::new(ErrorCode::InvitePending).into());
    }
    if db::businesses::find_by_email(&state.pool, &email).await?.is_some() {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }

    let message = message.map(str::trim).filter(|m| !m.is_empty());
    let token = generate_token();
    let expires_at = add_days(now, state.invite_ttl_days);
    let invite =
        db::invites::create(&state.pool, &email, &token, message, admin_id, expires_at, now)
            .await?;

    tracing::info!(invite_id = invite.id, invited_by = admin_id, "Business invite created");

    let url = registration_url(&state.frontend_url, &invite.token);
    let sent = state
        .mailer
        .send_best_effort(&invite.email, &email::business_invite(&url, message, expires_at))
        .await;

    Ok((invite, sent))
}

/// Revoke an invite by deleting it
pub async fn revoke(state: &AppState, id: i64) -> ServiceResult<()> {
    if !db::invites::delete(&state.pool, id).await? {
        return Err(AppError::new(ErrorCode::InviteNotFound).into());
    }
    tracing::info!(invite_id = id, "Business invite revoked");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registration_url() {
        assert_eq!(
            registration_url("https://gifty.sv", "abc123"),
            "https://gifty.sv/register/abc123"
        );
    }
}
