// db/transactiondb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::transactionmodel::{NewTransaction, Transaction, TransactionStatus};

#[async_trait]
pub trait TransactionExt {
    /// Append a settlement record. The ledger is insert only; money
    /// movement is never rewritten after the fact.
    async fn record_transaction(
        &self,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, sqlx::Error>;

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, sqlx::Error>;

    async fn get_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, sqlx::Error>;

    async fn get_transactions(
        &self,
        status: Option<TransactionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error>;

    async fn get_transactions_for_task(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<Transaction>, sqlx::Error>;
}

#[async_trait]
impl TransactionExt for DBClient {
    async fn record_transaction(
        &self,
        new_transaction: &NewTransaction,
    ) -> Result<Transaction, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            INSERT INTO transactions (
                task_id, client_id, cleaner_id, manager_id,
                amount_charged, cleaner_payout, platform_fee,
                fee_mode, status, reference,
                charge_reference, payout_reference, notes
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, task_id, client_id, cleaner_id, manager_id,
                amount_charged, cleaner_payout, platform_fee,
                fee_mode, status, reference,
                charge_reference, payout_reference, notes, created_at
            "#,
        )
        .bind(new_transaction.task_id)
        .bind(new_transaction.client_id)
        .bind(new_transaction.cleaner_id)
        .bind(new_transaction.manager_id)
        .bind(new_transaction.amount_charged)
        .bind(new_transaction.cleaner_payout)
        .bind(new_transaction.platform_fee)
        .bind(new_transaction.fee_mode)
        .bind(new_transaction.status)
        .bind(&new_transaction.reference)
        .bind(&new_transaction.charge_reference)
        .bind(&new_transaction.payout_reference)
        .bind(&new_transaction.notes)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_transaction(
        &self,
        transaction_id: Uuid,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, task_id, client_id, cleaner_id, manager_id,
                amount_charged, cleaner_payout, platform_fee,
                fee_mode, status, reference,
                charge_reference, payout_reference, notes, created_at
            FROM transactions
            WHERE id = $1
            "#,
        )
        .bind(transaction_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_transaction_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, task_id, client_id, cleaner_id, manager_id,
                amount_charged, cleaner_payout, platform_fee,
                fee_mode, status, reference,
                charge_reference, payout_reference, notes, created_at
            FROM transactions
            WHERE reference = $1
            "#,
        )
        .bind(reference)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_transactions(
        &self,
        status: Option<TransactionStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Transaction>(
                    r#"
                    SELECT
                        id, task_id, client_id, cleaner_id, manager_id,
                        amount_charged, cleaner_payout, platform_fee,
                        fee_mode, status, reference,
                        charge_reference, payout_reference, notes, created_at
                    FROM transactions
                    WHERE status = $1
                    ORDER BY created_at DESC
                    LIMIT $2 OFFSET $3
                    "#,
                )
                .bind(status)
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
            None => {
                sqlx::query_as::<_, Transaction>(
                    r#"
                    SELECT
                        id, task_id, client_id, cleaner_id, manager_id,
                        amount_charged, cleaner_payout, platform_fee,
                        fee_mode, status, reference,
                        charge_reference, payout_reference, notes, created_at
                    FROM transactions
                    ORDER BY created_at DESC
                    LIMIT $1 OFFSET $2
                    "#,
                )
                .bind(limit)
                .bind(offset)
                .fetch_all(&self.pool)
                .await
            }
        }
    }

    async fn get_transactions_for_task(
        &self,
        task_id: Uuid,
    ) -> Result<Vec<Transaction>, sqlx::Error> {
        sqlx::query_as::<_, Transaction>(
            r#"
            SELECT
                id, task_id, client_id, cleaner_id, manager_id,
                amount_charged, cleaner_payout, platform_fee,
                fee_mode, status, reference,
                charge_reference, payout_reference, notes, created_at
            FROM transactions
            WHERE task_id = $1
            ORDER BY created_at DESC
            "#,
        )
        .bind(task_id)
        .fetch_all(&self.pool)
        .await
    }
}
