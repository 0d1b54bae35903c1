//! Business Model

use serde::{Deserialize, Serialize};

/// Business entity, created when an application is approved
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Business {
    pub id: i64,
    pub name: String,
    pub slug: String,
    /// Login email, unique and stored lowercase
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
    pub is_approved: bool,
    pub is_active: bool,
    /// Storefront product created for this business on approval
    pub wix_product_id: Option<String>,
    /// Payment processor connected-account id
    pub stripe_account_id: Option<String>,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Business {
    /// Can this business sell and redeem gift cards?
    pub fn is_open(&self) -> bool {
        self.is_approved && self.is_active
    }
}

/// Public listing view of a business
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BusinessSummary {
    pub id: i64,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

impl From<&Business> for BusinessSummary {
    fn from(b: &Business) -> Self {
        Self {
            id: b.id,
            name: b.name.clone(),
            slug: b.slug.clone(),
            description: b.description.clone(),
            address: b.address.clone(),
            website: b.website.clone(),
            logo_url: b.logo_url.clone(),
        }
    }
}

/// Owner profile edit payload; absent fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BusinessUpdate {
    pub name: Option<String>,
    pub contact_name: Option<String>,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub logo_url: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn business() -> Business {
        Business {
            id: 7,
            name: "Café Luna".to_string(),
            slug: "caf-luna".to_string(),
            email: "owner@luna.sv".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            contact_name: None,
            contact_phone: None,
            address: Some("San Salvador".to_string()),
            description: None,
            website: None,
            logo_url: None,
            is_approved: true,
            is_active: true,
            wix_product_id: None,
            stripe_account_id: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_password_hash_never_serialized() {
        let json = serde_json::to_string(&business()).unwrap();
        assert!(!json.contains("password_hash"));
        assert!(!json.contains("argon2"));
    }

    #[test]
    fn test_update_payload_is_camel_case() {
        let update: BusinessUpdate =
            serde_json::from_str(r#"{"contactPhone":"2222-0000","logoUrl":null}"#).unwrap();
        assert_eq!(update.contact_phone.as_deref(), Some("2222-0000"));
        assert!(update.name.is_none());
        assert!(update.logo_url.is_none());
    }

    #[test]
    fn test_is_open() {
        let mut b = business();
        assert!(b.is_open());
        b.is_active = false;
        assert!(!b.is_open());
        b.is_active = true;
        b.is_approved = false;
        assert!(!b.is_open());
    }

    #[test]
    fn test_summary_from_business() {
        let summary = BusinessSummary::from(&business());
        assert_eq!(summary.id, 7);
        assert_eq!(summary.slug, "caf-luna");
        assert_eq!(summary.address.as_deref(), Some("San Salvador"));
    }
}
