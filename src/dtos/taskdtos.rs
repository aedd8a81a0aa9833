use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::taskmodel::{CleanerTask, Task};
use crate::utils::currency::format_cents_as_dollars;

/// Payload posted by the property-management system when a cleaning task
/// is completed or updated.
#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct TaskWebhookDto {
    #[validate(length(min = 1, message = "Task id is required"))]
    #[serde(rename = "taskId")]
    pub source_task_id: String,

    #[validate(length(min = 1, message = "Property name is required"))]
    #[serde(rename = "propertyName")]
    pub property_name: String,

    #[validate(email(message = "Cleaner email is invalid"))]
    #[serde(rename = "cleanerEmail")]
    pub cleaner_email: Option<String>,

    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,

    /// Task status at the source system; anything but a completed task is
    /// acknowledged and ignored.
    pub status: Option<String>,
}

#[derive(Validate, Debug, Clone, Serialize, Deserialize)]
pub struct ApproveTaskDto {
    /// Gateway customer id of the payer to charge.
    #[validate(length(min = 1, message = "Customer id is required"))]
    #[serde(rename = "customerId")]
    pub customer_id: String,

    #[serde(rename = "payerName")]
    pub payer_name: Option<String>,

    /// Cleaner fee in dollars; the payer is charged this plus the
    /// platform markup.
    #[validate(range(min = 0.01, message = "Cleaner fee must be positive"))]
    #[serde(rename = "cleanerFee")]
    pub cleaner_fee: f64,

    pub notes: Option<String>,
}

#[derive(Serialize, Deserialize, Validate)]
pub struct TaskQueryDto {
    pub status: Option<String>,
    #[validate(range(min = 1))]
    pub page: Option<usize>,
    #[validate(range(min = 1, max = 50))]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct FilterTaskDto {
    pub id: String,
    #[serde(rename = "sourceTaskId")]
    pub source_task_id: String,
    #[serde(rename = "propertyName")]
    pub property_name: String,
    #[serde(rename = "cleanerId")]
    pub cleaner_id: Option<String>,
    pub status: String,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "createdAt")]
    pub created_at: Option<DateTime<Utc>>,
}

impl FilterTaskDto {
    pub fn filter_task(task: &Task) -> Self {
        FilterTaskDto {
            id: task.id.to_string(),
            source_task_id: task.source_task_id.to_owned(),
            property_name: task.property_name.to_owned(),
            cleaner_id: task.cleaner_id.map(|id| id.to_string()),
            status: task.status.to_str().to_string(),
            completed_at: task.completed_at,
            created_at: task.created_at,
        }
    }

    pub fn filter_tasks(tasks: &[Task]) -> Vec<FilterTaskDto> {
        tasks.iter().map(FilterTaskDto::filter_task).collect()
    }
}

/// Task as shown to its assigned cleaner; payment fields are None until a
/// settlement has been attempted.
#[derive(Debug, Serialize, Deserialize)]
pub struct FilterCleanerTaskDto {
    pub id: String,
    #[serde(rename = "sourceTaskId")]
    pub source_task_id: String,
    #[serde(rename = "propertyName")]
    pub property_name: String,
    pub status: String,
    #[serde(rename = "completedAt")]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(rename = "paymentStatus")]
    pub payment_status: Option<String>,
    pub payout: Option<String>,
}

impl FilterCleanerTaskDto {
    pub fn filter_task(task: &CleanerTask) -> Self {
        FilterCleanerTaskDto {
            id: task.id.to_string(),
            source_task_id: task.source_task_id.to_owned(),
            property_name: task.property_name.to_owned(),
            status: task.status.to_str().to_string(),
            completed_at: task.completed_at,
            payment_status: task
                .payment_status
                .map(|status| format!("{:?}", status).to_uppercase()),
            payout: task.payout_cents.map(format_cents_as_dollars),
        }
    }

    pub fn filter_tasks(tasks: &[CleanerTask]) -> Vec<FilterCleanerTaskDto> {
        tasks.iter().map(FilterCleanerTaskDto::filter_task).collect()
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CleanerTaskListResponseDto {
    pub status: String,
    pub tasks: Vec<FilterCleanerTaskDto>,
    pub results: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskResponseDto {
    pub status: String,
    pub task: FilterTaskDto,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TaskListResponseDto {
    pub status: String,
    pub tasks: Vec<FilterTaskDto>,
    pub results: usize,
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::models::taskmodel::TaskStatus;
    use crate::models::transactionmodel::TransactionStatus;

    fn cleaner_task(
        payment_status: Option<TransactionStatus>,
        payout_cents: Option<i64>,
    ) -> CleanerTask {
        CleanerTask {
            id: Uuid::new_v4(),
            source_task_id: "hcp_451".to_string(),
            property_name: "Unit 4B".to_string(),
            status: TaskStatus::Approved,
            completed_at: None,
            payment_status,
            payout_cents,
        }
    }

    #[test]
    fn test_cleaner_view_includes_settled_payout() {
        let view = FilterCleanerTaskDto::filter_task(&cleaner_task(
            Some(TransactionStatus::Completed),
            Some(7500),
        ));
        assert_eq!(view.status, "approved");
        assert_eq!(view.payment_status.as_deref(), Some("COMPLETED"));
        assert_eq!(view.payout.as_deref(), Some("$75.00"));
    }

    #[test]
    fn test_cleaner_view_before_any_settlement_attempt() {
        let view = FilterCleanerTaskDto::filter_task(&cleaner_task(None, None));
        assert!(view.payment_status.is_none());
        assert!(view.payout.is_none());
    }
}
