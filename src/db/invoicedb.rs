// db/invoicedb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::invoicemodel::{
    format_invoice_number, Invoice, InvoiceRecipientType, InvoiceStatus,
};

pub struct NewInvoice {
    pub recipient_type: InvoiceRecipientType,
    pub client_id: Option<Uuid>,
    pub cleaner_id: Option<Uuid>,
    pub manager_id: Uuid,
    pub line_items: serde_json::Value,
    pub subtotal: i64,
    pub tax: i64,
    pub discount: i64,
    pub total: i64,
    pub due_date: DateTime<Utc>,
    pub notes: Option<String>,
    pub terms: Option<String>,
}

#[async_trait]
pub trait InvoiceExt {
    /// Create an invoice numbered from the `invoice_number_seq` sequence.
    /// `nextval` is atomic, so concurrent creates cannot mint the same
    /// number; a create that fails after drawing leaves a gap.
    async fn create_invoice(&self, new_invoice: NewInvoice) -> Result<Invoice, sqlx::Error>;

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, sqlx::Error>;

    async fn get_invoices(
        &self,
        status: Option<InvoiceStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, sqlx::Error>;

    async fn update_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Invoice, sqlx::Error>;
}

#[async_trait]
impl InvoiceExt for DBClient {
    async fn create_invoice(&self, new_invoice: NewInvoice) -> Result<Invoice, sqlx::Error> {
        let row = sqlx::query("SELECT nextval('invoice_number_seq') AS seq")
            .fetch_one(&self.pool)
            .await?;
        let seq: i64 = row.get("seq");
        let invoice_number = format_invoice_number(seq);

        let invoice = sqlx::query_as::<_, Invoice>(
            r#"
            INSERT INTO invoices (
                invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                status, line_items, subtotal, tax, discount, total,
                due_date, notes, terms
            )
            VALUES ($1, $2, $3, $4, $5, 'draft'::invoice_status, $6, $7, $8, $9, $10, $11, $12, $13)
            RETURNING
                id, invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                status, line_items, subtotal, tax, discount, total,
                due_date, notes, terms, created_at, updated_at
            "#,
        )
        .bind(invoice_number)
        .bind(new_invoice.recipient_type)
        .bind(new_invoice.client_id)
        .bind(new_invoice.cleaner_id)
        .bind(new_invoice.manager_id)
        .bind(new_invoice.line_items)
        .bind(new_invoice.subtotal)
        .bind(new_invoice.tax)
        .bind(new_invoice.discount)
        .bind(new_invoice.total)
        .bind(new_invoice.due_date)
        .bind(new_invoice.notes)
        .bind(new_invoice.terms)
        .fetch_one(&self.pool)
        .await?;

        Ok(invoice)
    }

    async fn get_invoice(&self, invoice_id: Uuid) -> Result<Option<Invoice>, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            SELECT
                id, invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                status, line_items, subtotal, tax, discount, total,
                due_date, notes, terms, created_at, updated_at
            FROM invoices
            WHERE id = $1
            "#,
        )
        .bind(invoice_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_invoices(
        &self,
        status: Option<InvoiceStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Invoice>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Invoice>(
                    r#"
                    SELECT
                        id, invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                        status, line_items, subtotal, tax, discount, total,
                        due_date, notes, terms, created_at, updated_at
                    FROM invoices
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
                sqlx::query_as::<_, Invoice>(
                    r#"
                    SELECT
                        id, invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                        status, line_items, subtotal, tax, discount, total,
                        due_date, notes, terms, created_at, updated_at
                    FROM invoices
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

    async fn update_invoice_status(
        &self,
        invoice_id: Uuid,
        status: InvoiceStatus,
    ) -> Result<Invoice, sqlx::Error> {
        sqlx::query_as::<_, Invoice>(
            r#"
            UPDATE invoices
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, invoice_number, recipient_type, client_id, cleaner_id, manager_id,
                status, line_items, subtotal, tax, discount, total,
                due_date, notes, terms, created_at, updated_at
            "#,
        )
        .bind(invoice_id)
        .bind(status)
        .fetch_one(&self.pool)
        .await
    }
}
