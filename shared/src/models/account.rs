//! Customer, user and admin accounts

use serde::{Deserialize, Serialize};

/// Authenticated principal role, carried in the JWT
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Business,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Business => "business",
            Self::Admin => "admin",
        }
    }
}

/// Gift-card holder, keyed by lowercase email. Created lazily on issuance.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: i64,
}

/// Registered storefront user. Suspended users cannot log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct User {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: i64,
}

fn default_active() -> bool {
    true
}

/// Platform administrator
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct Admin {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub name: Option<String>,
    pub created_at: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_wire_format() {
        assert_eq!(serde_json::to_string(&Role::Business).unwrap(), "\"business\"");
        let role: Role = serde_json::from_str("\"admin\"").unwrap();
        assert_eq!(role, Role::Admin);
        assert_eq!(Role::User.as_str(), "user");
    }

    #[test]
    fn test_user_active_by_default() {
        let user: User =
            serde_json::from_str(r#"{"id":1,"email":"a@b.co","name":null,"created_at":0}"#).unwrap();
        assert!(user.is_active);
        assert!(user.password_hash.is_empty());
    }
}
