// models/transactionmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "fee_mode", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FeeMode {
    AutoPercent,
    Manual,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "transaction_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Charged,
    Completed,
    Failed,
}

/// One immutable row per settlement attempt. Amounts are cents.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Transaction {
    pub id: Uuid,
    pub task_id: Option<Uuid>,
    pub client_id: Uuid,
    pub cleaner_id: Option<Uuid>,
    // The authenticated manager/admin who triggered the attempt
    pub manager_id: Uuid,
    pub amount_charged: i64,
    pub cleaner_payout: i64,
    pub platform_fee: i64,
    pub fee_mode: FeeMode,
    pub status: TransactionStatus,
    pub reference: String,
    pub charge_reference: Option<String>,
    pub payout_reference: Option<String>,
    pub notes: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum LedgerError {
    #[error("Charged amount must be positive, got {0} cents")]
    NonPositiveCharge(i64),
    #[error("Cleaner payout cannot be negative, got {0} cents")]
    NegativePayout(i64),
    #[error("Platform fee mismatch: charged {charged} - payout {payout} != fee {fee}")]
    FeeMismatch { charged: i64, payout: i64, fee: i64 },
}

/// Validated input for the ledger writer. Constructing one enforces the
/// commercial invariants so a corrupt row can never reach the database.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub task_id: Option<Uuid>,
    pub client_id: Uuid,
    pub cleaner_id: Option<Uuid>,
    pub manager_id: Uuid,
    pub amount_charged: i64,
    pub cleaner_payout: i64,
    pub platform_fee: i64,
    pub fee_mode: FeeMode,
    pub status: TransactionStatus,
    pub reference: String,
    pub charge_reference: Option<String>,
    pub payout_reference: Option<String>,
    pub notes: Option<String>,
}

impl NewTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        task_id: Option<Uuid>,
        client_id: Uuid,
        cleaner_id: Option<Uuid>,
        manager_id: Uuid,
        amount_charged: i64,
        cleaner_payout: i64,
        fee_mode: FeeMode,
        status: TransactionStatus,
        reference: String,
        charge_reference: Option<String>,
        payout_reference: Option<String>,
        notes: Option<String>,
    ) -> Result<Self, LedgerError> {
        if amount_charged <= 0 {
            return Err(LedgerError::NonPositiveCharge(amount_charged));
        }
        if cleaner_payout < 0 {
            return Err(LedgerError::NegativePayout(cleaner_payout));
        }

        let platform_fee = amount_charged - cleaner_payout;
        if platform_fee < 0 {
            return Err(LedgerError::FeeMismatch {
                charged: amount_charged,
                payout: cleaner_payout,
                fee: platform_fee,
            });
        }

        Ok(NewTransaction {
            task_id,
            client_id,
            cleaner_id,
            manager_id,
            amount_charged,
            cleaner_payout,
            platform_fee,
            fee_mode,
            status,
            reference,
            charge_reference,
            payout_reference,
            notes,
        })
    }
}

pub fn generate_transaction_reference() -> String {
    format!(
        "TXN_{}",
        &Uuid::new_v4().to_string().replace('-', "").to_uppercase()[..16]
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attempt(charged: i64, payout: i64) -> Result<NewTransaction, LedgerError> {
        NewTransaction::new(
            None,
            Uuid::new_v4(),
            None,
            Uuid::new_v4(),
            charged,
            payout,
            FeeMode::AutoPercent,
            TransactionStatus::Completed,
            generate_transaction_reference(),
            Some("pi_123".to_string()),
            Some("tr_456".to_string()),
            None,
        )
    }

    #[test]
    fn test_platform_fee_is_derived() {
        let txn = attempt(6000, 5000).unwrap();
        assert_eq!(txn.platform_fee, 1000);
        assert_eq!(txn.amount_charged - txn.cleaner_payout, txn.platform_fee);
    }

    #[test]
    fn test_zero_or_negative_charge_rejected() {
        assert!(matches!(attempt(0, 0), Err(LedgerError::NonPositiveCharge(0))));
        assert!(matches!(attempt(-100, 0), Err(LedgerError::NonPositiveCharge(-100))));
    }

    #[test]
    fn test_payout_exceeding_charge_rejected() {
        assert!(matches!(
            attempt(5000, 6000),
            Err(LedgerError::FeeMismatch { fee: -1000, .. })
        ));
    }

    #[test]
    fn test_negative_payout_rejected() {
        assert!(matches!(attempt(5000, -1), Err(LedgerError::NegativePayout(-1))));
    }

    #[test]
    fn test_reference_shape() {
        let reference = generate_transaction_reference();
        assert!(reference.starts_with("TXN_"));
        assert_eq!(reference.len(), 20);
    }
}
