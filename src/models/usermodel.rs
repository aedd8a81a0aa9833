// models/usermodel.rs
use chrono::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize, Serialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    Manager,
    Cleaner,
}

impl UserRole {
    pub fn to_str(&self) -> &str {
        match self {
            UserRole::Admin => "admin",
            UserRole::Manager => "manager",
            UserRole::Cleaner => "cleaner",
        }
    }

    /// Roles allowed to review tasks, charge clients and issue invoices.
    pub fn can_manage_payments(&self) -> bool {
        matches!(self, UserRole::Admin | UserRole::Manager)
    }
}

#[derive(Debug, Deserialize, Serialize, sqlx::FromRow, Clone)]
pub struct User {
    pub id: uuid::Uuid,
    pub name: String,
    pub email: String,
    // None until the invited user sets a password
    pub password_hash: Option<String>,
    pub role: UserRole,
    pub is_active: bool,
    // Stripe connected-account id; None until the cleaner finishes onboarding
    pub payout_account_id: Option<String>,
    pub invite_token: Option<String>,
    pub invite_expires_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl User {
    pub fn is_onboarded_for_payouts(&self) -> bool {
        self.payout_account_id
            .as_deref()
            .map(|id| !id.is_empty())
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cleaner(payout_account_id: Option<&str>) -> User {
        User {
            id: uuid::Uuid::new_v4(),
            name: "Maria".to_string(),
            email: "maria@example.com".to_string(),
            password_hash: None,
            role: UserRole::Cleaner,
            is_active: true,
            payout_account_id: payout_account_id.map(|s| s.to_string()),
            invite_token: None,
            invite_expires_at: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn test_payout_onboarding_check() {
        assert!(cleaner(Some("acct_123")).is_onboarded_for_payouts());
        assert!(!cleaner(None).is_onboarded_for_payouts());
        assert!(!cleaner(Some("")).is_onboarded_for_payouts());
    }

    #[test]
    fn test_payment_management_roles() {
        assert!(UserRole::Admin.can_manage_payments());
        assert!(UserRole::Manager.can_manage_payments());
        assert!(!UserRole::Cleaner.can_manage_payments());
    }
}
