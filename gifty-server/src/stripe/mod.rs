//! Stripe integration via REST API (no SDK dependency)
//!
//! Connect accounts, destination-charge PaymentIntents and webhook
//! signature verification.

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha256;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const API_BASE: &str = "https://api.stripe.com/v1";

/// Webhook replay window in seconds
const WEBHOOK_TOLERANCE_SECS: i64 = 300;

async fn parse_response(resp: reqwest::Response, op: &str) -> Result<Value, BoxError> {
    let status = resp.status();
    let body: Value = resp.json().await?;
    if !status.is_success() {
        let message = body["error"]["message"].as_str().unwrap_or("unknown error");
        return Err(format!("Stripe {op} failed ({status}): {message}").into());
    }
    Ok(body)
}

/// Retrieve a connected account
pub async fn retrieve_account(
    http: &reqwest::Client,
    secret_key: &str,
    account_id: &str,
) -> Result<Value, BoxError> {
    let resp = http
        .get(format!("{API_BASE}/accounts/{account_id}"))
        .basic_auth(secret_key, None::<&str>)
        .send()
        .await?;
    parse_response(resp, "retrieve_account").await
}

/// Can this connected account receive transfers?
pub fn transfers_active(account: &Value) -> bool {
    account["capabilities"]["transfers"].as_str() == Some("active")
}

/// Create an Express connected account for a business
pub async fn create_express_account(
    http: &reqwest::Client,
    secret_key: &str,
    email: &str,
    country: &str,
    business_type: &str,
    business_id: i64,
) -> Result<String, BoxError> {
    let business_id = business_id.to_string();
    let resp = http
        .post(format!("{API_BASE}/accounts"))
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("type", "express"),
            ("country", country),
            ("email", email),
            ("business_type", business_type),
            ("capabilities[card_payments][requested]", "true"),
            ("capabilities[transfers][requested]", "true"),
            ("metadata[business_id]", business_id.as_str()),
        ])
        .send()
        .await?;
    let body = parse_response(resp, "create_account").await?;

    body["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| format!("Stripe create_account returned no id: {body}").into())
}

/// Create an onboarding link for a connected account
pub async fn create_account_link(
    http: &reqwest::Client,
    secret_key: &str,
    account_id: &str,
    refresh_url: &str,
    return_url: &str,
) -> Result<String, BoxError> {
    let resp = http
        .post(format!("{API_BASE}/account_links"))
        .basic_auth(secret_key, None::<&str>)
        .form(&[
            ("account", account_id),
            ("refresh_url", refresh_url),
            ("return_url", return_url),
            ("type", "account_onboarding"),
        ])
        .send()
        .await?;
    let body = parse_response(resp, "create_account_link").await?;

    body["url"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| format!("Stripe create_account_link returned no url: {body}").into())
}

/// Destination charge: the full amount is charged on the platform, the
/// application fee stays, the rest is transferred to `destination`.
#[derive(Debug, Clone)]
pub struct PaymentIntentParams<'a> {
    /// Total charged, in minor units
    pub amount_cents: i64,
    pub currency: &'a str,
    pub payment_method: &'a str,
    /// Platform share, in minor units
    pub application_fee_cents: i64,
    pub destination: &'a str,
    pub receipt_email: &'a str,
    pub return_url: &'a str,
    pub metadata: Vec<(&'static str, String)>,
}

impl PaymentIntentParams<'_> {
    fn to_form(&self) -> Vec<(String, String)> {
        let mut form = vec![
            ("amount".to_string(), self.amount_cents.to_string()),
            ("currency".to_string(), self.currency.to_lowercase()),
            ("payment_method".to_string(), self.payment_method.to_string()),
            ("confirm".to_string(), "true".to_string()),
            (
                "application_fee_amount".to_string(),
                self.application_fee_cents.to_string(),
            ),
            (
                "transfer_data[destination]".to_string(),
                self.destination.to_string(),
            ),
            ("on_behalf_of".to_string(), self.destination.to_string()),
            ("receipt_email".to_string(), self.receipt_email.to_string()),
            ("return_url".to_string(), self.return_url.to_string()),
        ];
        form.extend(
            self.metadata
                .iter()
                .map(|(k, v)| (format!("metadata[{k}]"), v.clone())),
        );
        form
    }
}

/// Result of a confirmed PaymentIntent
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentIntent {
    pub id: String,
    pub status: String,
}

impl PaymentIntent {
    pub fn succeeded(&self) -> bool {
        self.status == "succeeded"
    }
}

/// Create and confirm a PaymentIntent. Retries with the same
/// `idempotency_key` return the original intent instead of charging again.
pub async fn create_payment_intent(
    http: &reqwest::Client,
    secret_key: &str,
    params: &PaymentIntentParams<'_>,
    idempotency_key: &str,
) -> Result<PaymentIntent, BoxError> {
    let resp = http
        .post(format!("{API_BASE}/payment_intents"))
        .basic_auth(secret_key, None::<&str>)
        .header("Idempotency-Key", idempotency_key)
        .form(&params.to_form())
        .send()
        .await?;

    let status = resp.status();
    let body: Value = resp.json().await?;

    // Card declines come back as 402 with the intent attached to the error
    let intent = if status.is_success() {
        &body
    } else {
        &body["error"]["payment_intent"]
    };

    match (intent["id"].as_str(), intent["status"].as_str()) {
        (Some(id), Some(status)) => Ok(PaymentIntent {
            id: id.to_string(),
            status: status.to_string(),
        }),
        _ => {
            let message = body["error"]["message"].as_str().unwrap_or("unknown error");
            Err(format!("Stripe create_payment_intent failed ({status}): {message}").into())
        }
    }
}

/// Verify Stripe webhook signature (HMAC-SHA256)
pub fn verify_webhook_signature(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
) -> Result<(), &'static str> {
    verify_webhook_signature_at(payload, sig_header, secret, chrono::Utc::now().timestamp())
}

fn verify_webhook_signature_at(
    payload: &[u8],
    sig_header: &str,
    secret: &str,
    now: i64,
) -> Result<(), &'static str> {
    let mut timestamp = "";
    let mut signatures = Vec::new();
    for part in sig_header.split(',') {
        if let Some(t) = part.trim().strip_prefix("t=") {
            timestamp = t;
        } else if let Some(v) = part.trim().strip_prefix("v1=") {
            signatures.push(v);
        }
    }

    if timestamp.is_empty() || signatures.is_empty() {
        return Err("Invalid Stripe-Signature header");
    }

    let mut mac =
        Hmac::<Sha256>::new_from_slice(secret.as_bytes()).map_err(|_| "HMAC key error")?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);

    // Stripe may send several v1 signatures during secret rotation
    let matched = signatures.iter().any(|sig| {
        hex::decode(sig)
            .map(|bytes| mac.clone().verify_slice(&bytes).is_ok())
            .unwrap_or(false)
    });
    if !matched {
        return Err("Webhook signature mismatch");
    }

    // Reject events older than 5 minutes to prevent replay attacks
    let ts: i64 = timestamp.parse().map_err(|_| "Invalid timestamp")?;
    if (now - ts).abs() > WEBHOOK_TOLERANCE_SECS {
        return Err("Webhook timestamp too old");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "whsec_test";

    fn sign(payload: &[u8], ts: i64) -> String {
        let mut mac = Hmac::<Sha256>::new_from_slice(SECRET.as_bytes()).unwrap();
        mac.update(format!("{ts}.").as_bytes());
        mac.update(payload);
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature() {
        let payload = br#"{"id":"evt_1","type":"checkout.session.completed"}"#;
        let ts = 1_760_000_000;
        let header = format!("t={ts},v1={}", sign(payload, ts));
        assert!(verify_webhook_signature_at(payload, &header, SECRET, ts + 10).is_ok());
    }

    #[test]
    fn test_rotated_secret_second_signature() {
        let payload = b"{}";
        let ts = 1_760_000_000;
        let header = format!("t={ts},v1={},v1={}", "00".repeat(32), sign(payload, ts));
        assert!(verify_webhook_signature_at(payload, &header, SECRET, ts).is_ok());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let ts = 1_760_000_000;
        let header = format!("t={ts},v1={}", sign(b"{\"amount\":10}", ts));
        assert_eq!(
            verify_webhook_signature_at(b"{\"amount\":99}", &header, SECRET, ts),
            Err("Webhook signature mismatch")
        );
    }

    #[test]
    fn test_stale_timestamp_rejected() {
        let payload = b"{}";
        let ts = 1_760_000_000;
        let header = format!("t={ts},v1={}", sign(payload, ts));
        assert_eq!(
            verify_webhook_signature_at(payload, &header, SECRET, ts + 301),
            Err("Webhook timestamp too old")
        );
    }

    #[test]
    fn test_malformed_header() {
        assert_eq!(
            verify_webhook_signature_at(b"{}", "v1=abc", SECRET, 0),
            Err("Invalid Stripe-Signature header")
        );
    }

    #[test]
    fn test_transfers_active() {
        let active = serde_json::json!({"capabilities": {"transfers": "active"}});
        let pending = serde_json::json!({"capabilities": {"transfers": "pending"}});
        assert!(transfers_active(&active));
        assert!(!transfers_active(&pending));
        assert!(!transfers_active(&serde_json::json!({})));
    }

    #[test]
    fn test_payment_intent_form() {
        let params = PaymentIntentParams {
            amount_cents: 10100,
            currency: "USD",
            payment_method: "pm_card_visa",
            application_fee_cents: 350,
            destination: "acct_123",
            receipt_email: "friend@mail.sv",
            return_url: "http://localhost:3000/purchase-success",
            metadata: vec![("giftCardId", "17".to_string())],
        };
        let form = params.to_form();
        let get = |k: &str| {
            form.iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("amount"), Some("10100"));
        assert_eq!(get("currency"), Some("usd"));
        assert_eq!(get("application_fee_amount"), Some("350"));
        assert_eq!(get("transfer_data[destination]"), Some("acct_123"));
        assert_eq!(get("on_behalf_of"), Some("acct_123"));
        assert_eq!(get("metadata[giftCardId]"), Some("17"));
    }
}
