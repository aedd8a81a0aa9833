// db/clientdb.rs
use async_trait::async_trait;
use uuid::Uuid;

use super::db::DBClient;

use crate::models::clientmodel::Client;

#[async_trait]
pub trait ClientExt {
    async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>, sqlx::Error>;

    async fn get_clients(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Client>, sqlx::Error>;

    async fn create_client(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        stripe_customer_id: Option<String>,
    ) -> Result<Client, sqlx::Error>;

    /// Resolve a billing record for a gateway customer id, creating a
    /// placeholder client when the payer has never been seen before.
    async fn find_or_create_client_by_customer_id(
        &self,
        stripe_customer_id: &str,
        name: Option<&str>,
    ) -> Result<Client, sqlx::Error>;
}

#[async_trait]
impl ClientExt for DBClient {
    async fn get_client(&self, client_id: Uuid) -> Result<Option<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, name, email, phone, stripe_customer_id,
                created_at, updated_at
            FROM clients
            WHERE id = $1
            "#,
        )
        .bind(client_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_clients(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Client>, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, name, email, phone, stripe_customer_id,
                created_at, updated_at
            FROM clients
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn create_client(
        &self,
        name: String,
        email: String,
        phone: Option<String>,
        stripe_customer_id: Option<String>,
    ) -> Result<Client, sqlx::Error> {
        sqlx::query_as::<_, Client>(
            r#"
            INSERT INTO clients (name, email, phone, stripe_customer_id)
            VALUES ($1, $2, $3, $4)
            RETURNING
                id, name, email, phone, stripe_customer_id,
                created_at, updated_at
            "#,
        )
        .bind(name)
        .bind(email)
        .bind(phone)
        .bind(stripe_customer_id)
        .fetch_one(&self.pool)
        .await
    }

    async fn find_or_create_client_by_customer_id(
        &self,
        stripe_customer_id: &str,
        name: Option<&str>,
    ) -> Result<Client, sqlx::Error> {
        let existing = sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, name, email, phone, stripe_customer_id,
                created_at, updated_at
            FROM clients
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(stripe_customer_id)
        .fetch_optional(&self.pool)
        .await?;

        if let Some(client) = existing {
            return Ok(client);
        }

        let name = name.unwrap_or("Guest").to_string();

        // DO NOTHING plus a re-select keeps concurrent ingests idempotent.
        sqlx::query(
            r#"
            INSERT INTO clients (name, email, stripe_customer_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (stripe_customer_id) DO NOTHING
            "#,
        )
        .bind(name)
        .bind(Client::placeholder_email(stripe_customer_id))
        .bind(stripe_customer_id)
        .execute(&self.pool)
        .await?;

        sqlx::query_as::<_, Client>(
            r#"
            SELECT
                id, name, email, phone, stripe_customer_id,
                created_at, updated_at
            FROM clients
            WHERE stripe_customer_id = $1
            "#,
        )
        .bind(stripe_customer_id)
        .fetch_one(&self.pool)
        .await
    }
}
