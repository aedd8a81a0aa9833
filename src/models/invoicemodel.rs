// models/invoicemodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "invoice_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    Draft,
    Sent,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    pub fn can_transition_to(&self, to: InvoiceStatus) -> bool {
        matches!(
            (self, to),
            (InvoiceStatus::Draft, InvoiceStatus::Sent)
                | (InvoiceStatus::Draft, InvoiceStatus::Cancelled)
                | (InvoiceStatus::Sent, InvoiceStatus::Paid)
                | (InvoiceStatus::Sent, InvoiceStatus::Overdue)
                | (InvoiceStatus::Sent, InvoiceStatus::Cancelled)
                | (InvoiceStatus::Overdue, InvoiceStatus::Paid)
                | (InvoiceStatus::Overdue, InvoiceStatus::Cancelled)
        )
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "invoice_recipient_type", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceRecipientType {
    Client,
    Cleaner,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct InvoiceLineItem {
    pub description: String,
    pub quantity: i64,
    // Unit rate in cents
    pub rate: i64,
}

impl InvoiceLineItem {
    pub fn amount(&self) -> i64 {
        self.quantity * self.rate
    }
}

/// Manually issued invoice. Amounts are cents; `total = subtotal + tax - discount`.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invoice {
    pub id: Uuid,
    pub invoice_number: String,
    pub recipient_type: InvoiceRecipientType,
    pub client_id: Option<Uuid>,
    pub cleaner_id: Option<Uuid>,
    pub manager_id: Uuid,
    pub status: InvoiceStatus,
    pub line_items: serde_json::Value,
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub terms: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum InvoiceError {
    #[error("Invoice totals do not reconcile: {subtotal} + {tax} - {discount} != {total}")]
    TotalMismatch {
        subtotal: i64,
        tax: i64,
        discount: i64,
        total: i64,
    },
    #[error("Invoice must have at least one line item")]
    NoLineItems,
    #[error("Line items do not sum to the subtotal")]
    SubtotalMismatch,
    #[error("Invoice must target exactly one of client or cleaner")]
    AmbiguousRecipient,
}

/// Check the numeric and recipient invariants before an invoice is persisted.
pub fn validate_invoice_terms(
    line_items: &[InvoiceLineItem],
    subtotal: i64,
    tax: i64,
    discount: i64,
    total: i64,
    client_id: Option<Uuid>,
    cleaner_id: Option<Uuid>,
) -> Result<(), InvoiceError> {
    if line_items.is_empty() {
        return Err(InvoiceError::NoLineItems);
    }
    if line_items.iter().map(InvoiceLineItem::amount).sum::<i64>() != subtotal {
        return Err(InvoiceError::SubtotalMismatch);
    }
    if subtotal + tax - discount != total {
        return Err(InvoiceError::TotalMismatch {
            subtotal,
            tax,
            discount,
            total,
        });
    }
    if client_id.is_some() == cleaner_id.is_some() {
        return Err(InvoiceError::AmbiguousRecipient);
    }
    Ok(())
}

pub fn format_invoice_number(sequence: i64) -> String {
    format!("INV-{:05}", sequence)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn items() -> Vec<InvoiceLineItem> {
        vec![
            InvoiceLineItem {
                description: "Deep clean, 2BR apartment".to_string(),
                quantity: 1,
                rate: 12000,
            },
            InvoiceLineItem {
                description: "Laundry service".to_string(),
                quantity: 2,
                rate: 1500,
            },
        ]
    }

    #[test]
    fn test_valid_invoice_passes() {
        let client = Some(Uuid::new_v4());
        assert_eq!(
            validate_invoice_terms(&items(), 15000, 1200, 200, 16000, client, None),
            Ok(())
        );
    }

    #[test]
    fn test_total_mismatch_rejected() {
        let client = Some(Uuid::new_v4());
        assert!(matches!(
            validate_invoice_terms(&items(), 15000, 1200, 200, 15000, client, None),
            Err(InvoiceError::TotalMismatch { .. })
        ));
    }

    #[test]
    fn test_subtotal_must_match_line_items() {
        let client = Some(Uuid::new_v4());
        assert_eq!(
            validate_invoice_terms(&items(), 14000, 0, 0, 14000, client, None),
            Err(InvoiceError::SubtotalMismatch)
        );
    }

    #[test]
    fn test_recipient_is_exclusive() {
        let id = Some(Uuid::new_v4());
        assert_eq!(
            validate_invoice_terms(&items(), 15000, 0, 0, 15000, id, id),
            Err(InvoiceError::AmbiguousRecipient)
        );
        assert_eq!(
            validate_invoice_terms(&items(), 15000, 0, 0, 15000, None, None),
            Err(InvoiceError::AmbiguousRecipient)
        );
    }

    #[test]
    fn test_status_flow() {
        assert!(InvoiceStatus::Draft.can_transition_to(InvoiceStatus::Sent));
        assert!(InvoiceStatus::Sent.can_transition_to(InvoiceStatus::Paid));
        assert!(InvoiceStatus::Sent.can_transition_to(InvoiceStatus::Overdue));
        assert!(!InvoiceStatus::Paid.can_transition_to(InvoiceStatus::Draft));
        assert!(!InvoiceStatus::Cancelled.can_transition_to(InvoiceStatus::Sent));
    }

    #[test]
    fn test_invoice_number_format() {
        assert_eq!(format_invoice_number(1), "INV-00001");
        assert_eq!(format_invoice_number(42), "INV-00042");
    }
}
