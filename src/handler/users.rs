use std::sync::Arc;

use axum::{
    extract::{Path, Query},
    middleware,
    response::IntoResponse,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::*,
    error::HttpError,
    middleware::{role_check, JWTAuthMiddeware},
    models::usermodel::UserRole,
    utils::invite::generate_invite_token,
    AppState,
};

const INVITE_VALIDITY_HOURS: i64 = 24;

pub fn users_handler() -> Router {
    Router::new()
        .route(
            "/me",
            get(get_me).layer(middleware::from_fn(|state, req, next| {
                role_check(
                    state,
                    req,
                    next,
                    vec![UserRole::Admin, UserRole::Manager, UserRole::Cleaner],
                )
            })),
        )
        .route(
            "/",
            get(get_users).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/invite",
            post(invite_user).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route(
            "/:user_id/role",
            put(update_user_role).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route(
            "/:user_id/active",
            put(set_user_active).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin])
            })),
        )
        .route(
            "/cleaners",
            get(get_cleaners).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Admin, UserRole::Manager])
            })),
        )
        .route(
            "/payout-account",
            put(set_payout_account).layer(middleware::from_fn(|state, req, next| {
                role_check(state, req, next, vec![UserRole::Cleaner])
            })),
        )
}

pub async fn get_me(
    Extension(_app_state): Extension<Arc<AppState>>,
    Extension(user): Extension<JWTAuthMiddeware>,
) -> Result<impl IntoResponse, HttpError> {
    let filtered_user = FilterUserDto::filter_user(&user.user);

    let response_data = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: filtered_user,
        },
    };

    Ok(Json(response_data))
}

pub async fn get_users(
    Query(query_params): Query<RequestQueryDto>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    query_params
        .validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let page = query_params.page.unwrap_or(1);
    let limit = query_params.limit.unwrap_or(10);
    let offset = (page - 1) * limit;

    let users = app_state
        .db_client
        .get_users(limit as i64, offset as i64)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserListResponseDto {
        status: "success".to_string(),
        results: users.len(),
        users: FilterUserDto::filter_users(&users),
    };

    Ok(Json(response))
}

pub async fn get_cleaners(
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let cleaners = app_state
        .db_client
        .get_cleaners()
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserListResponseDto {
        status: "success".to_string(),
        results: cleaners.len(),
        users: FilterUserDto::filter_users(&cleaners),
    };

    Ok(Json(response))
}

/// Staff onboarding is invite only; there is no open registration.
pub async fn invite_user(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<InviteUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let existing = app_state
        .db_client
        .get_user(None, Some(&body.email), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    if existing.is_some() {
        return Err(HttpError::conflict(
            "A user with this email already exists".to_string(),
        ));
    }

    let invite_token = generate_invite_token();
    let invite_expires_at = Utc::now() + Duration::hours(INVITE_VALIDITY_HOURS);

    let user = app_state
        .db_client
        .save_invited_user(
            body.name.clone(),
            body.email.clone(),
            body.role,
            invite_token.clone(),
            invite_expires_at,
        )
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    app_state
        .notification_service
        .notify_invited(
            &user.email,
            &user.name,
            user.role.to_str(),
            &invite_token,
            &app_state.env.app_url,
        )
        .await;

    tracing::info!(user_id = %user.id, role = user.role.to_str(), "User invited");

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}

pub async fn update_user_role(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<UpdateUserRoleDto>,
) -> Result<impl IntoResponse, HttpError> {
    if auth_user.user.id == user_id {
        return Err(HttpError::bad_request(
            "You cannot change your own role".to_string(),
        ));
    }

    let user = app_state
        .db_client
        .update_user_role(user_id, body.role)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}

pub async fn set_user_active(
    Path(user_id): Path<Uuid>,
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<SetUserActiveDto>,
) -> Result<impl IntoResponse, HttpError> {
    if auth_user.user.id == user_id {
        return Err(HttpError::bad_request(
            "You cannot deactivate your own account".to_string(),
        ));
    }

    let user = app_state
        .db_client
        .set_user_active(user_id, body.is_active)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}

/// Cleaners register the connected account that receives their payouts.
pub async fn set_payout_account(
    Extension(app_state): Extension<Arc<AppState>>,
    Extension(auth_user): Extension<JWTAuthMiddeware>,
    Json(body): Json<PayoutAccountDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .set_payout_account(auth_user.user.id, body.payout_account_id)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}
