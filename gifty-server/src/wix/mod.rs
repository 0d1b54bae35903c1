//! Wix Stores REST client: one hidden gift-card product per approved business

use serde_json::{Value, json};

use crate::config::WixConfig;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

const PRODUCTS_URL: &str = "https://www.wixapis.com/stores/v3/products-with-inventory";

const OPTION_NAME: &str = "Gift Amount";

/// Face values offered as variants; price adds a flat processing fee
const GIFT_AMOUNTS: [u32; 6] = [25, 50, 75, 100, 125, 150];
const PROCESSING_FEE: u32 = 3;

/// Product payload for a business's gift card
pub fn product_payload(business_name: &str) -> Value {
    let choice_name = |amount: u32| format!("${amount}");

    let choices: Vec<Value> = GIFT_AMOUNTS
        .iter()
        .map(|a| json!({ "choiceType": "CHOICE_TEXT", "name": choice_name(*a) }))
        .collect();

    let variants: Vec<Value> = GIFT_AMOUNTS
        .iter()
        .map(|a| {
            json!({
                "visible": true,
                "choices": [{
                    "optionChoiceNames": {
                        "optionName": OPTION_NAME,
                        "choiceName": choice_name(*a),
                        "renderType": "TEXT_CHOICES"
                    }
                }],
                "price": { "actualPrice": { "amount": (a + PROCESSING_FEE).to_string() } },
                "inventoryItem": { "inStock": true },
                "physicalProperties": {}
            })
        })
        .collect();

    json!({
        "product": {
            "name": format!("{business_name} Gift Card"),
            "productType": "PHYSICAL",
            "visible": false,
            "physicalProperties": {},
            "options": [{
                "name": OPTION_NAME,
                "optionRenderType": "TEXT_CHOICES",
                "choicesSettings": { "choices": choices }
            }],
            "variantsInfo": { "variants": variants }
        }
    })
}

/// Create the product and return its id
pub async fn create_gift_card_product(
    http: &reqwest::Client,
    config: &WixConfig,
    business_name: &str,
) -> Result<String, BoxError> {
    let auth = if config.api_token.starts_with("Bearer ") {
        config.api_token.clone()
    } else {
        format!("Bearer {}", config.api_token)
    };

    let resp = http
        .post(PRODUCTS_URL)
        .header("Authorization", auth)
        .header("wix-site-id", &config.site_id)
        .json(&product_payload(business_name))
        .send()
        .await?;

    let status = resp.status();
    let body: Value = resp.json().await?;
    if !status.is_success() {
        return Err(format!("Wix product creation failed ({status}): {body}").into());
    }

    body["product"]["id"]
        .as_str()
        .map(String::from)
        .ok_or_else(|| format!("Wix response has no product id: {body}").into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_product_payload() {
        let payload = product_payload("Café Luna");
        let product = &payload["product"];
        assert_eq!(product["name"], "Café Luna Gift Card");
        assert_eq!(product["visible"], false);

        let variants = product["variantsInfo"]["variants"].as_array().unwrap();
        assert_eq!(variants.len(), GIFT_AMOUNTS.len());
        assert_eq!(variants[0]["price"]["actualPrice"]["amount"], "28");
        assert_eq!(
            variants[3]["choices"][0]["optionChoiceNames"]["choiceName"],
            "$100"
        );

        let choices = product["options"][0]["choicesSettings"]["choices"]
            .as_array()
            .unwrap();
        assert_eq!(choices.len(), 6);
    }
}
