// db/userdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::usermodel::{User, UserRole};

#[async_trait]
pub trait UserExt {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        invite_token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn get_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error>;

    async fn get_cleaners(&self) -> Result<Vec<User>, sqlx::Error>;

    async fn get_cleaner_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error>;

    async fn save_invited_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        role: UserRole,
        invite_token: T,
        invite_expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error>;

    async fn set_user_password(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<User, sqlx::Error>;

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<User, sqlx::Error>;

    async fn set_user_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User, sqlx::Error>;

    async fn set_payout_account(
        &self,
        user_id: Uuid,
        payout_account_id: String,
    ) -> Result<User, sqlx::Error>;
}

#[async_trait]
impl UserExt for DBClient {
    async fn get_user(
        &self,
        user_id: Option<Uuid>,
        email: Option<&str>,
        invite_token: Option<&str>,
    ) -> Result<Option<User>, sqlx::Error> {
        let mut user: Option<User> = None;

        if let Some(user_id) = user_id {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT
                    id, name, email, password_hash,
                    role, is_active, payout_account_id,
                    invite_token, invite_expires_at,
                    created_at, updated_at
                FROM users
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(email) = email {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT
                    id, name, email, password_hash,
                    role, is_active, payout_account_id,
                    invite_token, invite_expires_at,
                    created_at, updated_at
                FROM users
                WHERE email = $1
                "#,
            )
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;
        } else if let Some(invite_token) = invite_token {
            user = sqlx::query_as::<_, User>(
                r#"
                SELECT
                    id, name, email, password_hash,
                    role, is_active, payout_account_id,
                    invite_token, invite_expires_at,
                    created_at, updated_at
                FROM users
                WHERE invite_token = $1
                "#,
            )
            .bind(invite_token)
            .fetch_optional(&self.pool)
            .await?;
        }

        Ok(user)
    }

    async fn get_users(
        &self,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            FROM users
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn get_cleaners(&self) -> Result<Vec<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            FROM users
            WHERE role = 'cleaner'::user_role
            ORDER BY name
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn get_cleaner_by_email(
        &self,
        email: &str,
    ) -> Result<Option<User>, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            FROM users
            WHERE email = $1 AND role = 'cleaner'::user_role
            "#,
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await
    }

    async fn save_invited_user<T: Into<String> + Send>(
        &self,
        name: T,
        email: T,
        role: UserRole,
        invite_token: T,
        invite_expires_at: DateTime<Utc>,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (name, email, role, invite_token, invite_expires_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            "#,
        )
        .bind(name.into())
        .bind(email.into())
        .bind(role)
        .bind(invite_token.into())
        .bind(invite_expires_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_user_password(
        &self,
        user_id: Uuid,
        password_hash: String,
    ) -> Result<User, sqlx::Error> {
        // Consumes the invite in the same statement so a token is single use.
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET password_hash = $2,
                invite_token = NULL,
                invite_expires_at = NULL,
                updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
    }

    async fn update_user_role(
        &self,
        target_id: Uuid,
        role: UserRole,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET role = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            "#,
        )
        .bind(target_id)
        .bind(role)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_user_active(
        &self,
        user_id: Uuid,
        is_active: bool,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET is_active = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(is_active)
        .fetch_one(&self.pool)
        .await
    }

    async fn set_payout_account(
        &self,
        user_id: Uuid,
        payout_account_id: String,
    ) -> Result<User, sqlx::Error> {
        sqlx::query_as::<_, User>(
            r#"
            UPDATE users
            SET payout_account_id = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING
                id, name, email, password_hash,
                role, is_active, payout_account_id,
                invite_token, invite_expires_at,
                created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(payout_account_id)
        .fetch_one(&self.pool)
        .await
    }
}
