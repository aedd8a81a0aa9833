// service/error.rs
use axum::http::StatusCode;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    error::HttpError,
    models::{invoicemodel::InvoiceError, taskmodel::TaskStatus, transactionmodel::LedgerError},
    service::payment_provider::GatewayError,
    utils::currency::format_cents_as_dollars,
};

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("Task {0} not found")]
    TaskNotFound(Uuid),

    #[error("Task {0} is not reviewable in status {1:?}")]
    TaskNotReviewable(Uuid, TaskStatus),

    #[error("Task {0} has no assigned cleaner")]
    NoCleanerAssigned(Uuid),

    #[error("Cleaner {0} has not connected a payout account")]
    CleanerNotOnboarded(Uuid),

    #[error("Client {0} not found")]
    ClientNotFound(Uuid),

    #[error("Client {0} has no stored payment method at the gateway")]
    ClientNotChargeable(Uuid),

    #[error("Invalid amount: {0} cents (must be positive)")]
    InvalidAmount(i64),

    #[error("Invalid split: payout {payout} cents against charge of {charge} cents")]
    InvalidSplit { payout: i64, charge: i64 },

    #[error("Payment gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error(
        "Partial settlement on transaction {transaction_id}: client was charged \
         ({charge_reference}) but the cleaner payout failed; manual reconciliation required"
    )]
    PartialSettlement {
        transaction_id: Uuid,
        charge_reference: String,
    },

    #[error("Ledger invariant violation: {0}")]
    InvariantViolation(#[from] LedgerError),

    #[error("Invoice invariant violation: {0}")]
    InvoiceInvariant(#[from] InvoiceError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl ServiceError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::TaskNotFound(_) | ServiceError::ClientNotFound(_) => {
                StatusCode::NOT_FOUND
            }

            ServiceError::TaskNotReviewable(_, _)
            | ServiceError::NoCleanerAssigned(_)
            | ServiceError::CleanerNotOnboarded(_)
            | ServiceError::ClientNotChargeable(_)
            | ServiceError::InvalidAmount(_)
            | ServiceError::InvalidSplit { .. }
            | ServiceError::InvoiceInvariant(_)
            | ServiceError::Validation(_) => StatusCode::BAD_REQUEST,

            ServiceError::Gateway(_) | ServiceError::PartialSettlement { .. } => {
                StatusCode::PAYMENT_REQUIRED
            }

            ServiceError::InvariantViolation(_) | ServiceError::Database(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Whether money may already have moved when this error surfaced. The
    /// acting manager needs this distinction in every failure message.
    pub fn money_may_have_moved(&self) -> bool {
        matches!(
            self,
            ServiceError::Gateway(_) | ServiceError::PartialSettlement { .. }
        )
    }
}

impl From<ServiceError> for HttpError {
    fn from(error: ServiceError) -> Self {
        let status = error.status_code();
        HttpError::new(error.to_string(), status)
    }
}

/// Human-readable split summary for breakdown responses.
pub fn describe_split(charge: i64, payout: i64, platform_fee: i64) -> String {
    format!(
        "charge {} / payout {} / platform fee {}",
        format_cents_as_dollars(charge),
        format_cents_as_dollars(payout),
        format_cents_as_dollars(platform_fee),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_precondition_errors_are_bad_request() {
        let err = ServiceError::NoCleanerAssigned(Uuid::new_v4());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(!err.money_may_have_moved());
    }

    #[test]
    fn test_partial_settlement_is_payment_required_and_flags_money_moved() {
        let err = ServiceError::PartialSettlement {
            transaction_id: Uuid::new_v4(),
            charge_reference: "pi_789".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::PAYMENT_REQUIRED);
        assert!(err.money_may_have_moved());
        assert!(err.to_string().contains("pi_789"));
    }

    #[test]
    fn test_http_conversion_keeps_specific_message() {
        let task_id = Uuid::new_v4();
        let http: HttpError = ServiceError::TaskNotFound(task_id).into();
        assert_eq!(http.status, StatusCode::NOT_FOUND);
        assert!(http.message.contains(&task_id.to_string()));
    }
}
