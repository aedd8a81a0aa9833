use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::clientdb::ClientExt,
    dtos::{clientdtos::*, userdtos::RequestQueryDto},
    error::HttpError,
    middleware::role_check,
    models::usermodel::UserRole,
    AppState,
};

pub fn clients_handler() -> Router {
    Router::new()
        .route(
            "/",
            get(get_clients)
                .post(create_client)
                .layer(middleware::from_fn(|state, req, next| {
                    role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
                })),
        )
        .route(
            "/:client_id",
            get(get_client).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
}

pub async fn get_clients(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let clients = app_state
        .db_client
        .get_clients(limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = ClientListResponseDto {
        status: "success".to_string(),
        results: clients.len(),
        clients: FilterClientDto::filter_clients(&clients),
    };

    Ok(Json(response))
}

pub async fn get_client(
    Path(client_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let client = app_state
        .db_client
        .get_client(client_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?
        .ok_or(HttpError::not_found("Client not found".to_string()))?;

    let response = ClientResponseDto {
        status: "success".to_string(),
        client: FilterClientDto::filter_client(&client),
    };

    Ok(Json(response))
}

pub async fn create_client(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<CreateClientDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let client = app_state
        .db_client
        .create_client(body.name, body.email, body.phone, body.stripe_customer_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = ClientResponseDto {
        status: "success".to_string(),
        client: FilterClientDto::filter_client(&client),
    };

    Ok(Json(response))
}
