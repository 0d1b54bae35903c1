//! Transactional email via the Resend REST API (no SDK dependency)
//!
//! Every caller treats email as best-effort: a failed send is logged and
//! never rolls back the operation that triggered it.

use rust_decimal::Decimal;
use serde_json::json;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Clone)]
pub struct Mailer {
    http: reqwest::Client,
    api_key: Option<String>,
    from: String,
    disabled: bool,
}

/// One rendered message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub html: String,
    pub text: String,
}

/// Card fields shown in customer emails
pub struct CardLine<'a> {
    pub code: &'a str,
    pub amount: Decimal,
    pub currency: &'a str,
    pub expires_at: i64,
}

impl Mailer {
    pub fn new(
        http: reqwest::Client,
        api_key: Option<String>,
        from: String,
        disabled: bool,
    ) -> Self {
        Self {
            http,
            api_key,
            from,
            disabled,
        }
    }

    pub fn is_configured(&self) -> bool {
        !self.disabled && self.api_key.is_some()
    }

    /// Send one email. `Ok(false)` when sending is disabled or unconfigured.
    pub async fn send(&self, to: &str, email: &Email) -> Result<bool, BoxError> {
        if self.disabled {
            tracing::debug!(to = to, "Emails disabled, skipping");
            return Ok(false);
        }
        let Some(api_key) = &self.api_key else {
            tracing::warn!(to = to, "RESEND_API_KEY not set, skipping email");
            return Ok(false);
        };

        let resp = self
            .http
            .post(RESEND_URL)
            .bearer_auth(api_key)
            .json(&json!({
                "from": self.from,
                "to": [to],
                "subject": email.subject,
                "html": email.html,
                "text": email.text,
            }))
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let body = resp.text().await.unwrap_or_default();
            return Err(format!("Resend send failed ({status}): {body}").into());
        }

        tracing::info!(to = to, subject = %email.subject, "Email sent");
        Ok(true)
    }

    /// Send and log failures; returns whether the email went out
    pub async fn send_best_effort(&self, to: &str, email: &Email) -> bool {
        match self.send(to, email).await {
            Ok(sent) => sent,
            Err(e) => {
                tracing::error!(to = to, error = %e, "Failed to send email");
                false
            }
        }
    }
}

fn format_date(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_default()
}

/// Minimal HTML escaping for user-provided text
fn escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Issued cards for a customer
pub fn gift_cards_issued(
    business_name: &str,
    customer_name: Option<&str>,
    cards: &[CardLine<'_>],
) -> Email {
    let plural = if cards.len() > 1 { "s" } else { "" };
    let greeting = escape(customer_name.unwrap_or("there"));

    let mut html = format!(
        "<h2>Gift Card{plural} for {}</h2><p>Hi {greeting}, thank you for your purchase!</p>",
        escape(business_name)
    );
    let mut text = format!("Hi {}, here are your gift card{plural} for {business_name}:\n", customer_name.unwrap_or("there"));
    for card in cards {
        let expires = format_date(card.expires_at);
        html.push_str(&format!(
            "<div style=\"border:1px solid #ddd;padding:12px;margin:8px 0\">\
             <p><strong>{}</strong></p><p>{} {}</p><p>Expires {expires}</p></div>",
            card.code, card.amount, card.currency
        ));
        text.push_str(&format!(
            "- {} : {} {} (expires {expires})\n",
            card.code, card.amount, card.currency
        ));
    }
    html.push_str(&format!(
        "<p>Present the code at {} to redeem.</p>",
        escape(business_name)
    ));

    Email {
        subject: format!("Your {business_name} Gift Card{plural}"),
        html,
        text,
    }
}

/// Purchased card for its recipient
pub fn gift_card_purchased(
    business_name: &str,
    card: &CardLine<'_>,
    personal_message: Option<&str>,
) -> Email {
    let expires = format_date(card.expires_at);
    let message_html = personal_message
        .map(|m| format!("<p><em>{}</em></p>", escape(m)))
        .unwrap_or_default();
    Email {
        subject: format!("Your Gifty Gift Card from {business_name}"),
        html: format!(
            "<h1>Your Gifty Gift Card!</h1>\
             <p>You've received a gift card from {}.</p>\
             <p>Value: {} {}</p><p>Code: <strong>{}</strong></p>{message_html}\
             <p>Expires on {expires}</p>",
            escape(business_name),
            card.amount,
            card.currency,
            card.code
        ),
        text: format!(
            "You've received a gift card from {business_name} worth {} {}. Your code is {} (expires {expires}).",
            card.amount, card.currency, card.code
        ),
    }
}

/// Invitation to apply as a business
pub fn business_invite(registration_url: &str, message: Option<&str>, expires_at: i64) -> Email {
    let message_html = message
        .map(|m| format!("<p>{}</p>", escape(m)))
        .unwrap_or_default();
    let expires = format_date(expires_at);
    Email {
        subject: "You're invited to sell gift cards on Gifty".to_string(),
        html: format!(
            "<h2>Join Gifty</h2>{message_html}\
             <p><a href=\"{registration_url}\">Complete your business application</a></p>\
             <p>This invitation expires on {expires}.</p>"
        ),
        text: format!(
            "You're invited to join Gifty. Apply here: {registration_url} (expires {expires})"
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gift_cards_issued_lists_every_code() {
        let cards = [
            CardLine {
                code: "ABCD-EFGH23",
                amount: Decimal::from(25),
                currency: "USD",
                expires_at: 1_767_225_600_000,
            },
            CardLine {
                code: "WXYZ-234567",
                amount: Decimal::from(25),
                currency: "USD",
                expires_at: 1_767_225_600_000,
            },
        ];
        let email = gift_cards_issued("Café <Luna>", Some("Ana"), &cards);
        assert_eq!(email.subject, "Your Café <Luna> Gift Cards");
        assert!(email.html.contains("ABCD-EFGH23"));
        assert!(email.html.contains("WXYZ-234567"));
        assert!(email.html.contains("Café &lt;Luna&gt;"));
        assert!(email.text.contains("2026-01-01"));
    }

    #[test]
    fn test_single_card_subject() {
        let cards = [CardLine {
            code: "ABCD-EFGH23",
            amount: Decimal::from(10),
            currency: "USD",
            expires_at: 0,
        }];
        let email = gift_cards_issued("Luna", None, &cards);
        assert_eq!(email.subject, "Your Luna Gift Card");
        assert!(email.text.starts_with("Hi there"));
    }

    #[test]
    fn test_invite_contains_link() {
        let email = business_invite("https://gifty.sv/register/abc", Some("Welcome!"), 0);
        assert!(email.html.contains("https://gifty.sv/register/abc"));
        assert!(email.html.contains("Welcome!"));
    }

    #[tokio::test]
    async fn test_unconfigured_mailer_skips() {
        let mailer = Mailer::new(reqwest::Client::new(), None, "a@b.co".into(), false);
        assert!(!mailer.is_configured());
        let email = business_invite("x", None, 0);
        assert!(!mailer.send_best_effort("c@d.co", &email).await);

        let disabled = Mailer::new(reqwest::Client::new(), Some("key".into()), "a@b.co".into(), true);
        assert!(!disabled.is_configured());
        assert!(!disabled.send("c@d.co", &email).await.unwrap());
    }
}
