use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    http::{HeaderMap, StatusCode},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use hmac::{Hmac, Mac};
use sha2::Sha512;
use subtle::ConstantTimeEq;
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{taskdb::TaskExt, userdb::UserExt},
    dtos::{taskdtos::*, transactiondtos::*, userdtos::RequestQueryDto},
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{taskmodel::TaskStatus, usermodel::UserRole},
    service::approval_service::ApprovalResolution,
    utils::currency::dollars_to_cents,
    AppState,
};

pub fn tasks_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_tasks).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/:task_id",
            get(get_task).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/:task_id/approve",
            post(approve_task).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
}

/// Cleaner-facing routes; each cleaner sees only their own assignments.
pub fn cleaner_tasks_handler() -> Router {
    Router::new().route(
        "/tasks",
        get(get_my_tasks).layer(middleware::from_fn(|state, req, next| {
            role_check(state, req, next, vec![UserRole::Cleaner])
        })),
    )
}

/// Ingestion endpoint for the property-management system. Unauthenticated
/// but signature checked; mounted outside the auth layer.
pub async fn task_webhook(
    Extension(app_state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: String,
) -> Result<impl IntoResponse, HttpError> {
    if let Some(secret) = &app_state.env.task_webhook_secret {
        let signature = headers
            .get("x-task-signature")
            .and_then(|h| h.to_str().ok())
            .ok_or_else(|| {
                HttpError::new(
                    "Missing or invalid webhook signature".to_string(),
                    StatusCode::BAD_REQUEST,
                )
            })?;

        if !verify_task_signature(&body, signature, secret) {
            tracing::warn!("Invalid task webhook signature received");
            return Err(HttpError::new(
                "Invalid webhook signature".to_string(),
                StatusCode::UNAUTHORIZED,
            ));
        }
    }

    let payload: TaskWebhookDto = serde_json::from_str(&body)
        .map_err(|e| HttpError::bad_request(format!("Invalid webhook payload: {}", e)))?;
    payload
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    // Only completed tasks enter the review queue; other status updates are
    // acknowledged so the source system does not retry them.
    if let Some(status) = &payload.status {
        if !status.eq_ignore_ascii_case("completed") {
            tracing::debug!(
                source_task_id = %payload.source_task_id,
                status = %status,
                "Ignoring non-completed task update"
            );
            return Ok(Json(serde_json::json!({
                "status": "success",
                "message": "Task update ignored"
            }))
            .into_response());
        }
    }

    // Assignment is matched to a known cleaner account by email; an unknown
    // assignee leaves the task unassigned rather than failing the ingest.
    let cleaner_id = match &payload.cleaner_email {
        Some(email) => app_state
            .db_client
            .get_cleaner_by_email(email)
            .await
            .map_err(|e| HttpError::server_error(e.to_string()))?
            .map(|cleaner| cleaner.id),
        None => None,
    };

    let task = app_state
        .db_client
        .upsert_task_from_source(
            &payload.source_task_id,
            &payload.property_name,
            cleaner_id,
            payload.completed_at,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(
        source_task_id = %task.source_task_id,
        status = task.status.to_str(),
        "Task ingested from source system"
    );

    let response = TaskResponseDto {
        status: "success".to_string(),
        task: FilterTaskDto::filter_task(&task),
    };

    Ok(Json(response).into_response())
}

pub async fn get_tasks(
    Query(query_params): Query<TaskQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = match query_params.status.as_deref() {
        Some("PENDING_REVIEW") => Some(TaskStatus::PendingReview),
        Some("APPROVED") => Some(TaskStatus::Approved),
        Some(other) => {
            return Err(HttpError::bad_request(format!(
                "Unknown task status: {}",
                other
            )))
        }
        None => None,
    };

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let tasks = app_state
        .db_client
        .get_tasks_by_status(status, limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = TaskListResponseDto {
        status: "success".to_string(),
        results: tasks.len(),
        tasks: FilterTaskDto::filter_tasks(&tasks),
    };

    Ok(Json(response))
}

/// Tasks assigned to the authenticated cleaner, with the payment status and
/// payout of the latest settlement attempt on each.
pub async fn get_my_tasks(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let tasks = app_state
        .db_client
        .get_tasks_for_cleaner(auth_user.user.id, limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = CleanerTaskListResponseDto {
        status: "success".to_string(),
        results: tasks.len(),
        tasks: FilterCleanerTaskDto::filter_tasks(&tasks),
    };

    Ok(Json(response))
}

pub async fn get_task(
    Path(task_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let task = app_state
        .db_client
        .get_task(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Task not found".to_string()))?;

    let response = TaskResponseDto {
        status: "success".to_string(),
        task: FilterTaskDto::filter_task(&task),
    };

    Ok(Json(response))
}

pub async fn approve_task(
    Path(task_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<ApproveTaskDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let cleaner_fee_cents = dollars_to_cents(body.cleaner_fee);

    let outcome = app_state
        .approval_service
        .approve_task(
            task_id,
            &auth_user.user,
            &body.customer_id,
            body.payer_name.as_deref(),
            cleaner_fee_cents,
            body.notes.clone(),
        )
        .await?;

    let (status_code, message) = match outcome.resolution {
        ApprovalResolution::Settled => (
            StatusCode::OK,
            "Task approved and payment settled".to_string(),
        ),
        ApprovalResolution::ChargePending => (
            StatusCode::ACCEPTED,
            "Charge accepted but not yet settled; payout withheld".to_string(),
        ),
    };

    let response = ApprovalResponseDto {
        status: "success".to_string(),
        message,
        transaction: FilterTransactionDto::filter_transaction(&outcome.transaction),
    };

    Ok((status_code, Json(response)))
}

fn verify_task_signature(payload: &str, signature: &str, secret: &str) -> bool {
    let mut mac = match Hmac::<Sha512>::new_from_slice(secret.as_bytes()) {
        Ok(mac) => mac,
        Err(_) => return false,
    };
    mac.update(payload.as_bytes());

    let expected_signature_hex = hex::encode(mac.finalize().into_bytes());

    // Constant time compare to prevent timing attacks.
    ConstantTimeEq::ct_eq(signature.as_bytes(), expected_signature_hex.as_bytes()).into()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sign(payload: &str, secret: &str) -> String {
        let mut mac = Hmac::<Sha512>::new_from_slice(secret.as_bytes()).unwrap();
        mac.update(payload.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    #[test]
    fn test_valid_signature_accepted() {
        let payload = r#"{"taskId":"gt_1","propertyName":"Unit 4B"}"#;
        let signature = sign(payload, "whsec_test");
        assert!(verify_task_signature(payload, &signature, "whsec_test"));
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let payload = r#"{"taskId":"gt_1","propertyName":"Unit 4B"}"#;
        let signature = sign(payload, "whsec_other");
        assert!(!verify_task_signature(payload, &signature, "whsec_test"));
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let signature = sign(r#"{"taskId":"gt_1"}"#, "whsec_test");
        assert!(!verify_task_signature(r#"{"taskId":"gt_2"}"#, &signature, "whsec_test"));
    }
}
