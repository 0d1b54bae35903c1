//! Business application and invite models

use serde::{Deserialize, Serialize};

/// Review state of a business application
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicationStatus {
    Pending,
    Approved,
    Rejected,
}

impl ApplicationStatus {
    /// Parse from database string value
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "approved" => Some(Self::Approved),
            "rejected" => Some(Self::Rejected),
            _ => None,
        }
    }

    /// Database string representation
    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Approved => "approved",
            Self::Rejected => "rejected",
        }
    }
}

/// A request for marketplace admission, reviewed by an admin
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BusinessApplication {
    pub id: i64,
    pub business_name: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub contact_name: String,
    pub contact_phone: Option<String>,
    pub address: Option<String>,
    pub description: Option<String>,
    pub website: Option<String>,
    pub invite_id: Option<i64>,
    pub status: String,
    pub rejection_reason: Option<String>,
    pub business_id: Option<i64>,
    pub reviewed_at: Option<i64>,
    pub created_at: i64,
}

impl BusinessApplication {
    pub fn status(&self) -> Option<ApplicationStatus> {
        ApplicationStatus::from_db(&self.status)
    }
}

/// Invite lifecycle. Revoked invites are deleted, not flagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InviteStatus {
    Pending,
    Accepted,
}

impl InviteStatus {
    pub fn from_db(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "accepted" => Some(Self::Accepted),
            _ => None,
        }
    }

    pub fn as_db(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Accepted => "accepted",
        }
    }
}

/// Token-bearing invitation for a business to apply
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "db", derive(sqlx::FromRow))]
pub struct BusinessInvite {
    pub id: i64,
    pub email: String,
    pub token: String,
    pub message: Option<String>,
    pub status: String,
    pub invited_by: Option<i64>,
    pub expires_at: i64,
    pub accepted_at: Option<i64>,
    pub created_at: i64,
}

impl BusinessInvite {
    /// Pending and not yet expired at `now`
    pub fn is_usable(&self, now: i64) -> bool {
        InviteStatus::from_db(&self.status) == Some(InviteStatus::Pending) && now < self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_status_db_mapping() {
        for status in [
            ApplicationStatus::Pending,
            ApplicationStatus::Approved,
            ApplicationStatus::Rejected,
        ] {
            assert_eq!(ApplicationStatus::from_db(status.as_db()), Some(status));
        }
        assert_eq!(ApplicationStatus::from_db("PENDING"), None);
    }

    #[test]
    fn test_invite_usable() {
        let invite = BusinessInvite {
            id: 1,
            email: "owner@luna.sv".to_string(),
            token: "tok".to_string(),
            message: None,
            status: "pending".to_string(),
            invited_by: Some(1),
            expires_at: 1_000,
            accepted_at: None,
            created_at: 0,
        };
        assert!(invite.is_usable(999));
        assert!(!invite.is_usable(1_000));

        let accepted = BusinessInvite {
            status: "accepted".to_string(),
            ..invite
        };
        assert!(!accepted.is_usable(0));
    }
}
