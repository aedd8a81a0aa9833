use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::transactiondb::TransactionExt,
    dtos::transactiondtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{transactionmodel::TransactionStatus, usermodel::UserRole},
    service::error::describe_split,
    utils::currency::dollars_to_cents,
    AppState,
};

pub fn transactions_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_transactions).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/charge",
            post(direct_charge).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/:transaction_id",
            get(get_transaction).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/reference/:reference",
            get(get_transaction_by_reference).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/task/:task_id",
            get(get_task_transactions).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
}

pub async fn get_transactions(
    Query(query_params): Query<TransactionQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = match query_params.status.as_deref() {
        Some("PENDING") => Some(TransactionStatus::Pending),
        Some("CHARGED") => Some(TransactionStatus::Charged),
        Some("COMPLETED") => Some(TransactionStatus::Completed),
        Some("FAILED") => Some(TransactionStatus::Failed),
        Some(other) => {
            return Err(HttpError::bad_request(format!(
                "Unknown transaction status: {}",
                other
            )))
        }
        None => None,
    };

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let transactions = app_state
        .db_client
        .get_transactions(status, limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = TransactionListResponseDto {
        status: "success".to_string(),
        results: transactions.len(),
        transactions: FilterTransactionDto::filter_transactions(&transactions),
    };

    Ok(Json(response))
}

pub async fn get_transaction(
    Path(transaction_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let transaction = app_state
        .db_client
        .get_transaction(transaction_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Transaction not found".to_string()))?;

    let response = ApprovalResponseDto {
        status: "success".to_string(),
        message: "Transaction retrieved".to_string(),
        transaction: FilterTransactionDto::filter_transaction(&transaction),
    };

    Ok(Json(response))
}

pub async fn get_transaction_by_reference(
    Path(reference): Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let transaction = app_state
        .db_client
        .get_transaction_by_reference(&reference)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Transaction not found".to_string()))?;

    let response = ApprovalResponseDto {
        status: "success".to_string(),
        message: "Transaction retrieved".to_string(),
        transaction: FilterTransactionDto::filter_transaction(&transaction),
    };

    Ok(Json(response))
}

/// Settlement history for one task, newest first. Failed attempts are kept
/// alongside the successful one.
pub async fn get_task_transactions(
    Path(task_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let transactions = app_state
        .db_client
        .get_transactions_for_task(task_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = TransactionListResponseDto {
        status: "success".to_string(),
        results: transactions.len(),
        transactions: FilterTransactionDto::filter_transactions(&transactions),
    };

    Ok(Json(response))
}

pub async fn direct_charge(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<DirectChargeDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let amount_cents = dollars_to_cents(body.amount);
    let manual_payout_cents = body.cleaner_amount.map(dollars_to_cents);

    let outcome = app_state
        .approval_service
        .direct_charge(
            &auth_user.user,
            body.client_id,
            body.cleaner_id,
            body.task_id,
            amount_cents,
            body.fee_mode,
            manual_payout_cents,
            body.notes.clone(),
        )
        .await?;

    let split = describe_split(
        outcome.breakdown.amount_charged,
        outcome.breakdown.cleaner_payout,
        outcome.breakdown.platform_fee,
    );
    let message = if outcome.pending {
        format!("Charge accepted but not yet settled ({})", split)
    } else {
        format!("Charge completed ({})", split)
    };

    let response = DirectChargeResponseDto {
        status: "success".to_string(),
        message,
        transaction: FilterTransactionDto::filter_transaction(&outcome.transaction),
        breakdown: outcome.breakdown,
    };

    Ok(Json(response))
}
