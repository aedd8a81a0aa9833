// models/taskmodel.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::transactionmodel::TransactionStatus;

#[derive(Debug, Serialize, Deserialize, Clone, Copy, sqlx::Type, PartialEq)]
#[sqlx(type_name = "task_status", rename_all = "snake_case")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    PendingReview,
    Approved,
}

impl TaskStatus {
    pub fn to_str(&self) -> &str {
        match self {
            TaskStatus::PendingReview => "pending_review",
            TaskStatus::Approved => "approved",
        }
    }

    /// Review lifecycle moves forward only. A failed settlement leaves the
    /// task in PendingReview so the manager can retry with corrected input.
    pub fn can_transition_to(&self, to: TaskStatus) -> bool {
        matches!(
            (self, to),
            (TaskStatus::PendingReview, TaskStatus::Approved)
                | (TaskStatus::PendingReview, TaskStatus::PendingReview)
        )
    }

    pub fn is_reviewable(&self) -> bool {
        matches!(self, TaskStatus::PendingReview)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Task {
    pub id: Uuid,
    // Id assigned by the property-management system, unique per task
    pub source_task_id: String,
    pub property_name: String,
    pub cleaner_id: Option<Uuid>,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Task row as shown to its assigned cleaner, joined with the status and
/// payout of the most recent settlement attempt (None before any attempt).
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct CleanerTask {
    pub id: Uuid,
    pub source_task_id: String,
    pub property_name: String,
    pub status: TaskStatus,
    pub completed_at: Option<DateTime<Utc>>,
    pub payment_status: Option<TransactionStatus>,
    pub payout_cents: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forward_transitions_only() {
        assert!(TaskStatus::PendingReview.can_transition_to(TaskStatus::Approved));
        assert!(TaskStatus::PendingReview.can_transition_to(TaskStatus::PendingReview));
        assert!(!TaskStatus::Approved.can_transition_to(TaskStatus::PendingReview));
        assert!(!TaskStatus::Approved.can_transition_to(TaskStatus::Approved));
    }

    #[test]
    fn test_reviewable() {
        assert!(TaskStatus::PendingReview.is_reviewable());
        assert!(!TaskStatus::Approved.is_reviewable());
    }
}
