use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use sea_orm::*;
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::extractors::json::AppJson;
use crate::models::auth::{
    LoginRequest, LoginResponse, SignupRequest, SignupResponse, StatusResponse,
    UpdateStatusRequest, validate_login_request, validate_signup_request,
    validate_update_status_request,
};
use crate::state::AppState;
use crate::utils::hash;

#[utoipa::path(
    post,
    path = "/signup",
    tag = "Auth",
    operation_id = "signup",
    summary = "Create a new account",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 409, description = "Email already registered (EMAIL_TAKEN)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_signup_request(&payload)?;

    let email = payload.email.trim().to_string();

    let password_hash = hash::hash_password(&payload.password)
        .map_err(|e| AppError::Internal(format!("Password hash error: {}", e)))?;

    let new_user = user::ActiveModel {
        email: Set(email),
        name: Set(payload.name.trim().to_string()),
        password: Set(password_hash),
        status: Set(user::DEFAULT_STATUS.to_string()),
        created_at: Set(chrono::Utc::now()),
        ..Default::default()
    };

    let created = new_user
        .insert(&state.db)
        .await
        .map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => {
                tracing::debug!("Signup race condition: unique constraint caught on insert");
                AppError::EmailTaken
            }
            _ => AppError::from(e),
        })?;

    Ok((StatusCode::CREATED, Json(SignupResponse::from(created))))
}

#[utoipa::path(
    post,
    path = "/login",
    tag = "Auth",
    operation_id = "login",
    summary = "Log into an account",
    description = "Verifies the password and returns a bearer credential minted by the \
        deployment's identity strategy (JWT or server-side session).",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Unknown email or wrong password (INVALID_CREDENTIALS)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    validate_login_request(&payload)?;

    let email = payload.email.trim();

    let account = user::Entity::find()
        .filter(user::Column::Email.eq(email))
        .one(&state.db)
        .await?
        .ok_or(AppError::InvalidCredentials)?;

    let is_valid = hash::verify_password(&payload.password, &account.password)
        .map_err(|e| AppError::Internal(format!("Password verify error: {}", e)))?;

    if !is_valid {
        return Err(AppError::InvalidCredentials);
    }

    let token = state.identity.issue(&account).await?;

    Ok(Json(LoginResponse {
        token,
        user_id: account.id,
    }))
}

#[utoipa::path(
    get,
    path = "/status",
    tag = "Auth",
    operation_id = "getStatus",
    summary = "Get the caller's status line",
    responses(
        (status = 200, description = "Current status", body = StatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, auth_user), fields(user_id = auth_user.user_id))]
pub async fn get_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<StatusResponse>, AppError> {
    let account = find_account(&state.db, auth_user.user_id).await?;
    Ok(Json(StatusResponse {
        status: account.status,
    }))
}

#[utoipa::path(
    put,
    path = "/status",
    tag = "Auth",
    operation_id = "updateStatus",
    summary = "Update the caller's status line",
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Updated status", body = StatusResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 404, description = "Account no longer exists (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, auth_user, payload), fields(user_id = auth_user.user_id))]
pub async fn update_status(
    auth_user: AuthUser,
    State(state): State<AppState>,
    AppJson(payload): AppJson<UpdateStatusRequest>,
) -> Result<Json<StatusResponse>, AppError> {
    validate_update_status_request(&payload)?;

    let account = find_account(&state.db, auth_user.user_id).await?;

    let mut active: user::ActiveModel = account.into();
    active.status = Set(payload.status.trim().to_string());
    let updated = active.update(&state.db).await?;

    Ok(Json(StatusResponse {
        status: updated.status,
    }))
}

async fn find_account<C: ConnectionTrait>(db: &C, id: i32) -> Result<user::Model, AppError> {
    user::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))
}
