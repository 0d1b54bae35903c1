//! Admin review of business applications

use shared::error::{AppError, ErrorCode};
use shared::models::{ApplicationStatus, Business, BusinessApplication};
use shared::util::now_millis;

use crate::db;
use crate::db::businesses::NewBusiness;
use crate::error::{ServiceError, ServiceResult};
use crate::state::AppState;
use crate::util::{slug_suffix, slugify};
use crate::wix;

/// Slug attempts before giving up (first is the bare name)
const MAX_SLUG_ATTEMPTS: usize = 5;

async fn load_pending(state: &AppState, id: i64) -> ServiceResult<BusinessApplication> {
    let application = db::applications::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ApplicationNotFound))?;
    if application.status() != Some(ApplicationStatus::Pending) {
        return Err(AppError::new(ErrorCode::ApplicationAlreadyReviewed)
            .with_detail("status", application.status.clone())
            .into());
    }
    Ok(application)
}

/// Approve an application: create the business and, when Wix is
/// configured, its storefront product.
///
/// The business row and the review mark commit together. A Wix failure
/// afterwards is reported as an upstream error but leaves the approved
/// business in place.
pub async fn approve(state: &AppState, id: i64) -> ServiceResult<(Business, BusinessApplication)> {
    let application = load_pending(state, id).await?;

    if db::businesses::find_by_email(&state.pool, &application.email)
        .await?
        .is_some()
    {
        return Err(AppError::new(ErrorCode::EmailAlreadyRegistered).into());
    }

    let base_slug = slugify(&application.business_name);
    let now = now_millis();
    let mut created = None;

    for attempt in 0..MAX_SLUG_ATTEMPTS {
        let slug = if attempt == 0 {
            base_slug.clone()
        } else {
            format!("{base_slug}{}", slug_suffix())
        };
        if db::businesses::slug_exists(&state.pool, &slug).await? {
            continue;
        }

        let new = NewBusiness {
            name: &application.business_name,
            slug: &slug,
            email: &application.email,
            password_hash: &application.password_hash,
            contact_name: Some(&application.contact_name),
            contact_phone: application.contact_phone.as_deref(),
            address: application.address.as_deref(),
            description: application.description.as_deref(),
            website: application.website.as_deref(),
        };

        let mut tx = state.pool.begin().await?;
        // Lost a race for the slug; roll back and try another
        let Some(business) = db::businesses::insert(&mut *tx, &new, now).await? else {
            continue;
        };
        let reviewed = db::applications::mark_reviewed(
            &mut *tx,
            id,
            ApplicationStatus::Approved,
            Some(business.id),
            None,
            now,
        )
        .await?
        .ok_or_else(|| AppError::new(ErrorCode::ApplicationAlreadyReviewed))?;
        tx.commit().await?;

        created = Some((business, reviewed));
        break;
    }

    let Some((mut business, reviewed)) = created else {
        return Err(ServiceError::Db(
            format!("no free slug for '{base_slug}' after {MAX_SLUG_ATTEMPTS} attempts").into(),
        ));
    };

    tracing::info!(
        application_id = id,
        business_id = business.id,
        slug = %business.slug,
        "Business application approved"
    );

    if let Some(wix_config) = &state.wix {
        let product_id = wix::create_gift_card_product(&state.http, wix_config, &business.name)
            .await
            .map_err(|e| {
                tracing::error!(business_id = business.id, error = %e, "Wix product creation failed");
                AppError::upstream("wix")
            })?;
        db::businesses::set_wix_product(&state.pool, business.id, &product_id, now_millis())
            .await?;
        tracing::info!(business_id = business.id, product_id = %product_id, "Wix product linked");
        business.wix_product_id = Some(product_id);
    }

    Ok((business, reviewed))
}

pub async fn reject(
    state: &AppState,
    id: i64,
    reason: Option<&str>,
) -> ServiceResult<BusinessApplication> {
    load_pending(state, id).await?;
    let reason = reason.map(str::trim).filter(|r| !r.is_empty());

    let rejected = db::applications::mark_reviewed(
        &state.pool,
        id,
        ApplicationStatus::Rejected,
        None,
        reason,
        now_millis(),
    )
    .await?
    .ok_or_else(|| AppError::new(ErrorCode::ApplicationAlreadyReviewed))?;

    tracing::info!(application_id = id, "Business application rejected");
    Ok(rejected)
}
