// db/taskdb.rs
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use super::db::DBClient;

use crate::models::taskmodel::{CleanerTask, Task, TaskStatus};

#[async_trait]
pub trait TaskExt {
    /// Insert or refresh a task keyed by its external source id.
    /// Re-ingesting an already approved task leaves its status alone.
    async fn upsert_task_from_source(
        &self,
        source_task_id: &str,
        property_name: &str,
        cleaner_id: Option<Uuid>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Task, sqlx::Error>;

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error>;

    async fn get_tasks_by_status(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error>;

    /// Tasks assigned to one cleaner, each joined with the outcome of its
    /// most recent settlement attempt.
    async fn get_tasks_for_cleaner(
        &self,
        cleaner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CleanerTask>, sqlx::Error>;

    /// Flip a task to approved only if it is still pending review.
    /// Returns None when another approval won the race.
    async fn approve_task_if_pending(
        &self,
        task_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error>;
}

#[async_trait]
impl TaskExt for DBClient {
    async fn upsert_task_from_source(
        &self,
        source_task_id: &str,
        property_name: &str,
        cleaner_id: Option<Uuid>,
        completed_at: Option<DateTime<Utc>>,
    ) -> Result<Task, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (source_task_id, property_name, cleaner_id, status, completed_at)
            VALUES ($1, $2, $3, 'pending_review'::task_status, $4)
            ON CONFLICT (source_task_id) DO UPDATE
            SET property_name = EXCLUDED.property_name,
                cleaner_id = COALESCE(EXCLUDED.cleaner_id, tasks.cleaner_id),
                completed_at = COALESCE(EXCLUDED.completed_at, tasks.completed_at),
                status = CASE
                    WHEN tasks.status = 'approved'::task_status THEN tasks.status
                    ELSE 'pending_review'::task_status
                END,
                updated_at = NOW()
            RETURNING
                id, source_task_id, property_name, cleaner_id,
                status, completed_at, created_at, updated_at
            "#,
        )
        .bind(source_task_id)
        .bind(property_name)
        .bind(cleaner_id)
        .bind(completed_at)
        .fetch_one(&self.pool)
        .await
    }

    async fn get_task(&self, task_id: Uuid) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            SELECT
                id, source_task_id, property_name, cleaner_id,
                status, completed_at, created_at, updated_at
            FROM tasks
            WHERE id = $1
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }

    async fn get_tasks_by_status(
        &self,
        status: Option<TaskStatus>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Task>, sqlx::Error> {
        match status {
            Some(status) => {
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT
                        id, source_task_id, property_name, cleaner_id,
                        status, completed_at, created_at, updated_at
                    FROM tasks
                    WHERE status = $1
                    ORDER BY completed_at DESC NULLS LAST, created_at DESC
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
                sqlx::query_as::<_, Task>(
                    r#"
                    SELECT
                        id, source_task_id, property_name, cleaner_id,
                        status, completed_at, created_at, updated_at
                    FROM tasks
                    ORDER BY completed_at DESC NULLS LAST, created_at DESC
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

    async fn get_tasks_for_cleaner(
        &self,
        cleaner_id: Uuid,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<CleanerTask>, sqlx::Error> {
        sqlx::query_as::<_, CleanerTask>(
            r#"
            SELECT
                t.id, t.source_task_id, t.property_name, t.status, t.completed_at,
                latest.status AS payment_status,
                latest.cleaner_payout AS payout_cents
            FROM tasks t
            LEFT JOIN LATERAL (
                SELECT status, cleaner_payout
                FROM transactions
                WHERE task_id = t.id AND cleaner_id = $1
                ORDER BY created_at DESC
                LIMIT 1
            ) latest ON TRUE
            WHERE t.cleaner_id = $1
            ORDER BY t.completed_at DESC NULLS LAST, t.created_at DESC
            LIMIT $2 OFFSET $3
            "#,
        )
        .bind(cleaner_id)
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await
    }

    async fn approve_task_if_pending(
        &self,
        task_id: Uuid,
    ) -> Result<Option<Task>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            r#"
            UPDATE tasks
            SET status = 'approved'::task_status, updated_at = NOW()
            WHERE id = $1 AND status = 'pending_review'::task_status
            RETURNING
                id, source_task_id, property_name, cleaner_id,
                status, completed_at, created_at, updated_at
            "#,
        )
        .bind(task_id)
        .fetch_optional(&self.pool)
        .await
    }
}
