use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::invoicemodel::{Invoice, InvoiceRecipientType};
use crate::utils::currency::format_cents_as_dollars;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LineItemDto {
    pub description: String,
    pub quantity: i64,
    /// Unit rate in dollars.
    pub rate: f64,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct CreateInvoiceDto {
    #[serde(rename = "recipientType")]
    pub recipient_type: InvoiceRecipientType,

    #[serde(rename = "clientId")]
    pub client_id: Option<Uuid>,

    #[serde(rename = "cleanerId")]
    pub cleaner_id: Option<Uuid>,

    #[validate(length(min = 1, message = "At least one line item is required"))]
    #[serde(rename = "lineItems")]
    pub line_items: Vec<LineItemDto>,

    /// Tax in dollars.
    #[validate(range(min = 0.0, message = "Tax cannot be negative"))]
    #[serde(default)]
    pub tax: f64,

    /// Discount in dollars.
    #[validate(range(min = 0.0, message = "Discount cannot be negative"))]
    #[serde(default)]
    pub discount: f64,

    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,

    pub notes: Option<String>,
    pub terms: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateInvoiceStatusDto {
    pub status: crate::models::invoicemodel::InvoiceStatus,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct InvoiceQueryDto {
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterInvoiceDto {
    pub id: String,
    #[serde(rename = "invoiceNumber")]
    pub invoice_number: String,
    #[serde(rename = "recipientType")]
    pub recipient_type: InvoiceRecipientType,
    #[serde(rename = "clientId")]
    pub client_id: Option<String>,
    #[serde(rename = "cleanerId")]
    pub cleaner_id: Option<String>,
    pub status: String,
    #[serde(rename = "lineItems")]
    pub line_items: serde_json::Value,
    pub subtotal: String,
    pub tax: String,
    pub discount: String,
    pub total: String,
    #[serde(rename = "dueDate")]
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FilterInvoiceDto {
    pub fn filter_invoice(invoice: &Invoice) -> Self {
        FilterInvoiceDto {
            id: invoice.id.to_string(),
            invoice_number: invoice.invoice_number.to_owned(),
            recipient_type: invoice.recipient_type,
            client_id: invoice.client_id.map(|id| id.to_string()),
            cleaner_id: invoice.cleaner_id.map(|id| id.to_string()),
            status: format!("{:?}", invoice.status).to_uppercase(),
            line_items: invoice.line_items.clone(),
            subtotal: format_cents_as_dollars(invoice.subtotal),
            tax: format_cents_as_dollars(invoice.tax),
            discount: format_cents_as_dollars(invoice.discount),
            total: format_cents_as_dollars(invoice.total),
            due_date: invoice.due_date,
            notes: invoice.notes.clone(),
            terms: invoice.terms.clone(),
            created_at: invoice.created_at,
        }
    }

    pub fn filter_invoices(invoices: &[Invoice]) -> Vec<FilterInvoiceDto> {
        invoices.iter().map(FilterInvoiceDto::filter_invoice).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceResponseDto {
    pub status: String,
    pub invoice: FilterInvoiceDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InvoiceListResponseDto {
    pub status: String,
    pub invoices: Vec<FilterInvoiceDto>,
    pub results: usize,
}
