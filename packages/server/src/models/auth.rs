use serde::{Deserialize, Serialize};

use crate::error::{AppError, FieldViolation};

/// Request body for account signup.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct SignupRequest {
    /// Unique email address used to log in.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Display name (1-64 characters).
    #[schema(example = "Alice")]
    pub name: String,
    /// Password (5-128 characters).
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_signup_request(payload: &SignupRequest) -> Result<(), AppError> {
    let mut violations = Vec::new();

    if !is_plausible_email(payload.email.trim()) {
        violations.push(FieldViolation::new("email", "E-Mail is invalid"));
    }
    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > 64 {
        violations.push(FieldViolation::new("name", "Name must be 1-64 characters"));
    }
    if payload.password.len() < 5 || payload.password.len() > 128 {
        violations.push(FieldViolation::new(
            "password",
            "Password must be 5-128 characters",
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

/// Request body for login.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct LoginRequest {
    /// Email of the account to log into.
    #[schema(example = "alice@example.com")]
    pub email: String,
    /// Account password.
    #[schema(example = "s3cure_P@ss!")]
    pub password: String,
}

pub fn validate_login_request(payload: &LoginRequest) -> Result<(), AppError> {
    let mut violations = Vec::new();
    if payload.email.trim().is_empty() {
        violations.push(FieldViolation::new("email", "Email must not be empty"));
    }
    if payload.password.is_empty() {
        violations.push(FieldViolation::new(
            "password",
            "Password must not be empty",
        ));
    }
    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}

/// Request body for updating the caller's status line.
#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpdateStatusRequest {
    /// New status line (1-256 characters).
    #[schema(example = "Shipping a new post soon")]
    pub status: String,
}

pub fn validate_update_status_request(payload: &UpdateStatusRequest) -> Result<(), AppError> {
    let status = payload.status.trim();
    if status.is_empty() || status.chars().count() > 256 {
        return Err(AppError::validation(
            "status",
            "Status must be 1-256 characters",
        ));
    }
    Ok(())
}

/// Successful signup response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct SignupResponse {
    /// ID of the newly created account.
    #[schema(example = 42)]
    pub id: i32,
    /// Email of the newly created account.
    #[schema(example = "alice@example.com")]
    pub email: String,
}

impl From<crate::entity::user::Model> for SignupResponse {
    fn from(user: crate::entity::user::Model) -> Self {
        Self {
            id: user.id,
            email: user.email,
        }
    }
}

/// Successful login response.
#[derive(Serialize, utoipa::ToSchema)]
pub struct LoginResponse {
    /// Bearer credential for subsequent requests.
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
    /// ID of the authenticated account.
    #[schema(example = 42)]
    pub user_id: i32,
}

/// The caller's current status line.
#[derive(Serialize, utoipa::ToSchema)]
pub struct StatusResponse {
    /// Status line.
    #[schema(example = "I am new!")]
    pub status: String,
}

/// A very light email shape check: something before and after an `@`,
/// and a dot somewhere in the domain part.
fn is_plausible_email(email: &str) -> bool {
    if email.is_empty() || email.len() > 254 {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    !local.is_empty() && domain.contains('.') && !domain.starts_with('.') && !domain.ends_with('.')
}
