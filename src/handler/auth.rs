use std::sync::Arc;

use axum::{
    http::{header, HeaderMap},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use axum_extra::extract::cookie::Cookie;
use chrono::Utc;
use validator::Validate;

use crate::{
    db::userdb::UserExt,
    dtos::userdtos::*,
    error::{ErrorMessage, HttpError},
    utils::{password, token},
    AppState,
};

pub fn auth_handler() -> Router {
    Router::new()
        .route("/login", post(login))
        .route("/invite/:token", get(get_invitation))
        .route("/accept-invite", post(accept_invite))
}

pub async fn login(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<LoginUserDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, Some(&body.email), None)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user =
        result.ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if !user.is_active {
        return Err(HttpError::unauthorized(
            ErrorMessage::AccountDisabled.to_string(),
        ));
    }

    // Invited users have no password until they accept the invite.
    let password_hash = user
        .password_hash
        .as_deref()
        .ok_or(HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    let password_matched = password::compare(&body.password, password_hash)
        .map_err(|_| HttpError::bad_request(ErrorMessage::WrongCredentials.to_string()))?;

    if password_matched {
        let token = token::create_token(
            &user.id.to_string(),
            app_state.env.jwt_secret.as_bytes(),
            app_state.env.jwt_maxage,
        )
        .map_err(|e| HttpError::server_error(e.to_string()))?;

        let cookie_duration = time::Duration::minutes(app_state.env.jwt_maxage * 60);
        let cookie = Cookie::build(("token", token.clone()))
            .path("/")
            .max_age(cookie_duration)
            .http_only(true)
            .build();

        let response = Json(UserLoginResponseDto {
            status: "success".to_string(),
            token,
        });

        let mut headers = HeaderMap::new();
        headers.append(
            header::SET_COOKIE,
            cookie
                .to_string()
                .parse()
                .map_err(|_| HttpError::server_error("Failed to build cookie".to_string()))?,
        );

        let mut response = response.into_response();
        response.headers_mut().extend(headers);

        Ok(response)
    } else {
        Err(HttpError::bad_request(
            ErrorMessage::WrongCredentials.to_string(),
        ))
    }
}

/// Look up a pending invitation so the signup page can prefill name and role.
pub async fn get_invitation(
    axum::extract::Path(invite_token): axum::extract::Path<String>,
    Extension(app_state): Extension<Arc<AppState>>,
) -> Result<impl IntoResponse, HttpError> {
    let result = app_state
        .db_client
        .get_user(None, None, Some(&invite_token))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::not_found("Invitation not found".to_string()))?;

    if let Some(expires_at) = user.invite_expires_at {
        if Utc::now() > expires_at {
            return Err(HttpError::bad_request(
                ErrorMessage::InviteExpired.to_string(),
            ));
        }
    }

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}

pub async fn accept_invite(
    Extension(app_state): Extension<Arc<AppState>>,
    Json(body): Json<AcceptInviteDto>,
) -> Result<impl IntoResponse, HttpError> {
    body.validate()
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let result = app_state
        .db_client
        .get_user(None, None, Some(&body.token))
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    let user = result.ok_or(HttpError::not_found("Invitation not found".to_string()))?;

    if let Some(expires_at) = user.invite_expires_at {
        if Utc::now() > expires_at {
            return Err(HttpError::bad_request(
                ErrorMessage::InviteExpired.to_string(),
            ));
        }
    } else {
        return Err(HttpError::bad_request(
            "Invitation has already been used".to_string(),
        ));
    }

    let hashed = password::hash(&body.password)
        .map_err(|e| HttpError::bad_request(e.to_string()))?;

    let user = app_state
        .db_client
        .set_user_password(user.id, hashed)
        .await
        .map_err(|e| HttpError::server_error(e.to_string()))?;

    tracing::info!(user_id = %user.id, "Invitation accepted");

    let response = UserResponseDto {
        status: "success".to_string(),
        data: UserData {
            user: FilterUserDto::filter_user(&user),
        },
    };

    Ok(Json(response))
}
