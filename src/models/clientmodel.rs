// models/clientmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Client {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    // External payer identifier at the payment gateway, unique when present
    pub stripe_customer_id: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Client {
    /// Placeholder contact used when a charge arrives carrying only the
    /// gateway customer id and no known client record.
    pub fn placeholder_email(stripe_customer_id: &str) -> String {
        format!("guest_{}@placeholder.local", stripe_customer_id)
    }
}
