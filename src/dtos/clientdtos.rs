use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::clientmodel::Client;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateClientDto {
    #[validate(length(min = 1, message = "Name is required"))]
    pub name: String,

    #[validate(
        length(min = 1, message = "Email is required"),
        email(message = "Email is invalid")
    )]
    pub email: String,

    pub phone: Option<String>,

    #[serde(rename = "stripeCustomerId")]
    pub stripe_customer_id: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterClientDto {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    #[serde(rename = "stripeCustomerId")]
    pub stripe_customer_id: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FilterClientDto {
    pub fn filter_client(client: &Client) -> Self {
        FilterClientDto {
            id: client.id.to_string(),
            name: client.name.to_owned(),
            email: client.email.to_owned(),
            phone: client.phone.clone(),
            stripe_customer_id: client.stripe_customer_id.clone(),
            created_at: client.created_at,
        }
    }

    pub fn filter_clients(clients: &[Client]) -> Vec<FilterClientDto> {
        clients.iter().map(FilterClientDto::filter_client).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientResponseDto {
    pub status: String,
    pub client: FilterClientDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ClientListResponseDto {
    pub status: String,
    pub clients: Vec<FilterClientDto>,
    pub results: usize,
}
