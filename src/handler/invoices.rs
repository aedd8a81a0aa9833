use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::{
        clientdb::ClientExt,
        invoicedb::{InvoiceExt, NewInvoice},
        userdb::UserExt,
    },
    dtos::invoicedtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::{
        invoicemodel::{validate_invoice_terms, InvoiceLineItem, InvoiceStatus},
        usermodel::UserRole,
    },
    utils::currency::dollars_to_cents,
    AppState,
};

pub fn invoices_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_invoices)
                .post(create_invoice)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
                })),
        )
        .route(
            "/:invoice_id",
            get(get_invoice).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/:invoice_id/send",
            post(send_invoice).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/:invoice_id/status",
            put(update_invoice_status).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
}

pub async fn create_invoice(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<CreateInvoiceDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let line_items: Vec<InvoiceLineItem> = body
        .line_items
        .iter()
        .map(|item| InvoiceLineItem {
            description: item.description.clone(),
            quantity: item.quantity,
            rate: dollars_to_cents(item.rate),
        })
        .collect();

    let subtotal: i64 = line_items.iter().map(InvoiceLineItem::amount).sum();
    let tax = dollars_to_cents(body.tax);
    let discount = dollars_to_cents(body.discount);
    let total = subtotal + tax - discount;

    validate_invoice_terms(
        &line_items,
        subtotal,
        tax,
        discount,
        total,
        body.client_id,
        body.cleaner_id,
    )
    .map_err(|e| HttpError::bad_request(e.to_string()))?;

    if total < 0 {
        return Err(HttpError::bad_request(
            "Invoice total cannot be negative".to_string(),
        ));
    }

    let line_items_json = serde_json::to_value(&line_items)
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let invoice = app_state
        .db_client
        .create_invoice(NewInvoice {
            recipient_type: body.recipient_type,
            client_id: body.client_id,
            cleaner_id: body.cleaner_id,
            manager_id: auth_user.user.id,
            line_items: line_items_json,
            subtotal,
            tax,
            discount,
            total,
            due_date: body.due_date,
            notes: body.notes,
            terms: body.terms,
        })
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(
        invoice_number = %invoice.invoice_number,
        total = invoice.total,
        "Invoice created"
    );

    let response = InvoiceResponseDto {
        status: "success".to_string(),
        invoice: FilterInvoiceDto::filter_invoice(&invoice),
    };

    Ok(Json(response))
}

pub async fn get_invoices(
    Query(query_params): Query<InvoiceQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let status = match query_params.status.as_deref() {
        Some("DRAFT") => Some(InvoiceStatus::Draft),
        Some("SENT") => Some(InvoiceStatus::Sent),
        Some("PAID") => Some(InvoiceStatus::Paid),
        Some("OVERDUE") => Some(InvoiceStatus::Overdue),
        Some("CANCELLED") => Some(InvoiceStatus::Cancelled),
        Some(other) => {
            return Err(HttpError::bad_request(format!(
                "Unknown invoice status: {}",
                other
            )))
        }
        None => None,
    };

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let invoices = app_state
        .db_client
        .get_invoices(status, limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = InvoiceListResponseDto {
        status: "success".to_string(),
        results: invoices.len(),
        invoices: FilterInvoiceDto::filter_invoices(&invoices),
    };

    Ok(Json(response))
}

pub async fn get_invoice(
    Path(invoice_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let invoice = app_state
        .db_client
        .get_invoice(invoice_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Invoice not found".to_string()))?;

    let response = InvoiceResponseDto {
        status: "success".to_string(),
        invoice: FilterInvoiceDto::filter_invoice(&invoice),
    };

    Ok(Json(response))
}

/// Move a draft invoice to SENT and email it to the recipient. The email is
/// fire and forget; a delivery failure does not roll the status back.
pub async fn send_invoice(
    Path(invoice_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let invoice = app_state
        .db_client
        .get_invoice(invoice_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Invoice not found".to_string()))?;

    if !invoice.status.can_transition_to(InvoiceStatus::Sent) {
        return Err(HttpError::bad_request(format!(
            "Invoice {} cannot be sent from its current status",
            invoice.invoice_number
        )));
    }

    let (recipient_email, recipient_name) = match (invoice.client_id, invoice.cleaner_id) {
        (Some(client_id), None) => {
            let client = app_state
                .db_client
                .get_client(client_id)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?
                .ok_or(HttpError::not_found("Invoice client not found".to_string()))?;
            (client.email, client.name)
        }
        (None, Some(cleaner_id)) => {
            let cleaner = app_state
                .db_client
                .get_user(Some(cleaner_id), None, None)
                .await
                .map_err(|e| HttpError::server_error(e.to_string()))?
                .ok_or(HttpError::not_found("Invoice cleaner not found".to_string()))?;
            (cleaner.email, cleaner.name)
        }
        _ => {
            return Err(HttpError::server_error(
                "Invoice has no resolvable recipient".to_string(),
            ))
        }
    };

    let invoice = app_state
        .db_client
        .update_invoice_status(invoice.id, InvoiceStatus::Sent)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .notification_service
        .notify_invoice_sent(
            &recipient_email,
            &recipient_name,
            &invoice.invoice_number,
            invoice.total,
            &invoice.due_date.format("%Y-%m-%d").to_string(),
        )
        .await;

    let response = InvoiceResponseDto {
        status: "success".to_string(),
        invoice: FilterInvoiceDto::filter_invoice(&invoice),
    };

    Ok(Json(response))
}

pub async fn update_invoice_status(
    Path(invoice_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<UpdateInvoiceStatusDto>,
) -> Result<impl IntoResponse, HttpError> {
    let invoice = app_state
        .db_client
        .get_invoice(invoice_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Invoice not found".to_string()))?;

    if !invoice.status.can_transition_to(body.status) {
        return Err(HttpError::bad_request(format!(
            "Invoice {} cannot move to the requested status",
            invoice.invoice_number
        )));
    }

    let invoice = app_state
        .db_client
        .update_invoice_status(invoice.id, body.status)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = InvoiceResponseDto {
        status: "success".to_string(),
        invoice: FilterInvoiceDto::filter_invoice(&invoice),
    };

    Ok(Json(response))
}
