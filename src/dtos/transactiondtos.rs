use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::models::transactionmodel::{FeeMode, Transaction};
use crate::service::approval_service::ChargeBreakdown;
use crate::utils::currency::format_cents_as_dollars;

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct DirectChargeDto {
    #[serde(rename = "clientId")]
    pub client_id: Uuid,

    #[serde(rename = "cleanerId")]
    pub cleaner_id: Option<Uuid>,

    #[serde(rename = "taskId")]
    pub task_id: Option<Uuid>,

    /// Amount to charge the client, in dollars.
    #[validate(range(min = 0.01, message = "Amount must be positive"))]
    pub amount: f64,

    #[serde(rename = "feeMode")]
    pub fee_mode: FeeMode,

    /// Cleaner payout in dollars, required when feeMode is MANUAL.
    #[serde(rename = "cleanerAmount")]
    pub cleaner_amount: Option<f64>,

    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct TransactionQueryDto {
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterTransactionDto {
    pub id: String,
    pub reference: String,
    #[serde(rename = "taskId")]
    pub task_id: Option<String>,
    #[serde(rename = "clientId")]
    pub client_id: String,
    #[serde(rename = "cleanerId")]
    pub cleaner_id: Option<String>,
    #[serde(rename = "amountCharged")]
    pub amount_charged: String,
    #[serde(rename = "cleanerPayout")]
    pub cleaner_payout: String,
    #[serde(rename = "platformFee")]
    pub platform_fee: String,
    #[serde(rename = "feeMode")]
    pub fee_mode: FeeMode,
    pub status: String,
    #[serde(rename = "chargeReference")]
    pub charge_reference: Option<String>,
    pub notes: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FilterTransactionDto {
    pub fn filter_transaction(transaction: &Transaction) -> Self {
        FilterTransactionDto {
            id: transaction.id.to_string(),
            reference: transaction.reference.to_owned(),
            task_id: transaction.task_id.map(|id| id.to_string()),
            client_id: transaction.client_id.to_string(),
            cleaner_id: transaction.cleaner_id.map(|id| id.to_string()),
            amount_charged: format_cents_as_dollars(transaction.amount_charged),
            cleaner_payout: format_cents_as_dollars(transaction.cleaner_payout),
            platform_fee: format_cents_as_dollars(transaction.platform_fee),
            fee_mode: transaction.fee_mode,
            status: format!("{:?}", transaction.status).to_uppercase(),
            charge_reference: transaction.charge_reference.clone(),
            notes: transaction.notes.clone(),
            created_at: transaction.created_at,
        }
    }

    pub fn filter_transactions(transactions: &[Transaction]) -> Vec<FilterTransactionDto> {
        transactions
            .iter()
            .map(FilterTransactionDto::filter_transaction)
            .collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TransactionListResponseDto {
    pub status: String,
    pub transactions: Vec<FilterTransactionDto>,
    pub results: usize,
}

#[derive(Debug, Serialize)]
pub struct ApprovalResponseDto {
    pub status: String,
    pub message: String,
    pub transaction: FilterTransactionDto,
}

#[derive(Debug, Serialize)]
pub struct DirectChargeResponseDto {
    pub status: String,
    pub message: String,
    pub transaction: FilterTransactionDto,
    pub breakdown: ChargeBreakdown,
}
