//! Stripe webhook handler
//!
//! POST /api/payments/webhook: raw body, signature-verified, idempotent on event id

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use serde_json::Value;
use shared::util::now_millis;

use crate::error::ServiceError;
use crate::services::purchase::{self, CheckoutOrder};
use crate::state::AppState;
use crate::{db, stripe};

/// Forget a claimed event so Stripe's redelivery is processed
async fn release(state: &AppState, event_id: &str) {
    if let Err(e) = db::webhook_events::unmark(&state.pool, event_id).await {
        tracing::error!(%e, event_id, "Failed to release webhook event");
    }
}

/// Handle incoming Stripe webhook events
///
/// Must receive the raw body (not JSON) for HMAC signature verification.
pub async fn handle_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    let Some(sig_header) = headers
        .get("stripe-signature")
        .and_then(|v| v.to_str().ok())
    else {
        tracing::warn!("Missing Stripe-Signature header");
        return StatusCode::BAD_REQUEST;
    };

    if let Err(e) =
        stripe::verify_webhook_signature(&body, sig_header, &state.stripe_webhook_secret)
    {
        tracing::warn!(error = e, "Webhook signature verification failed");
        return StatusCode::BAD_REQUEST;
    }

    let event: Value = match serde_json::from_slice(&body) {
        Ok(v) => v,
        Err(e) => {
            tracing::warn!(%e, "Failed to parse webhook JSON");
            return StatusCode::BAD_REQUEST;
        }
    };

    let event_type = event["type"].as_str().unwrap_or("");
    let Some(event_id) = event["id"].as_str() else {
        tracing::warn!("Webhook event missing id");
        return StatusCode::BAD_REQUEST;
    };
    tracing::info!(event_id, event_type, "Received Stripe webhook");

    // Claim the event first; a redelivery finds it already recorded
    match db::webhook_events::mark_processed(&state.pool, event_id, event_type, now_millis()).await {
        Ok(false) => {
            tracing::info!(event_id, "Duplicate webhook event, skipping");
            return StatusCode::OK;
        }
        Ok(true) => {}
        Err(e) => {
            tracing::error!(%e, "Failed to record webhook event");
            return StatusCode::INTERNAL_SERVER_ERROR;
        }
    }

    let object = &event["data"]["object"];
    match event_type {
        "checkout.session.completed" => {
            let Some(order) = CheckoutOrder::from_session(object) else {
                tracing::warn!(event_id, "Checkout session without gift card metadata");
                return StatusCode::OK;
            };
            match purchase::fulfil_checkout(&state, &order).await {
                Ok(issued) => {
                    tracing::info!(
                        session_id = %order.session_id,
                        business_id = issued.business_id,
                        count = issued.gift_cards.len(),
                        "Checkout fulfilled"
                    );
                }
                // Paid but not fulfillable: retrying will not help, so the
                // charge goes to reconciliation instead
                Err(ServiceError::App(e)) => {
                    tracing::error!(
                        session_id = %order.session_id,
                        code = e.code.code(),
                        error = %e,
                        "Checkout could not be fulfilled"
                    );
                    if let Err(rec_err) = purchase::reconcile_unfulfilled(&state, &order, &e).await {
                        tracing::error!(
                            session_id = %order.session_id,
                            error = %rec_err,
                            "Failed to record reconciliation, releasing event for retry"
                        );
                        release(&state, event_id).await;
                        return StatusCode::INTERNAL_SERVER_ERROR;
                    }
                }
                Err(ServiceError::Db(e)) => {
                    tracing::error!(
                        session_id = %order.session_id,
                        error = %e,
                        "Checkout fulfilment failed, releasing event for retry"
                    );
                    release(&state, event_id).await;
                    return StatusCode::INTERNAL_SERVER_ERROR;
                }
            }
        }
        "payment_intent.succeeded" => {
            tracing::info!(payment_intent_id = object["id"].as_str().unwrap_or(""), "Payment succeeded");
        }
        "payment_intent.payment_failed" => {
            tracing::warn!(payment_intent_id = object["id"].as_str().unwrap_or(""), "Payment failed");
        }
        _ => {
            tracing::debug!(event_type, "Unhandled webhook event type");
        }
    }

    StatusCode::OK
}
