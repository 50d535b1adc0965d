use std::sync::Arc;

use async_trait::async_trait;
use axum::http::request::Parts;

use crate::config::AuthConfig;
use crate::entity::user;
use crate::error::AppError;

mod bearer;
mod session;

pub use bearer::JwtIdentity;
pub use session::SessionIdentity;

/// The owner a request resolved to.
#[derive(Debug, Clone)]
pub struct Identity {
    pub user_id: i32,
    pub email: String,
}

/// Maps requests to authenticated owners and mints credentials at login.
///
/// Handlers only ever see this trait object; whether the credential is a
/// self-contained JWT or an opaque server-side session id is a deployment
/// choice made once at startup.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Mint a credential for a freshly authenticated user.
    async fn issue(&self, user: &user::Model) -> Result<String, AppError>;

    /// Resolve a request to an owner, or fail with
    /// `TokenMissing` / `TokenInvalid`.
    async fn resolve(&self, parts: &Parts) -> Result<Identity, AppError>;
}

/// Build the provider selected by configuration.
pub fn from_config(auth: &AuthConfig) -> Result<Arc<dyn IdentityProvider>, AppError> {
    match auth.strategy.as_str() {
        "jwt" => Ok(Arc::new(JwtIdentity::new(auth.jwt_secret.clone()))),
        "session" => Ok(Arc::new(SessionIdentity::new(chrono::Duration::hours(
            auth.session_ttl_hours,
        )))),
        other => Err(AppError::Internal(format!(
            "unknown auth strategy '{other}'"
        ))),
    }
}

/// Extract the credential from the `Authorization: Bearer <...>` header.
pub(crate) fn bearer_token(parts: &Parts) -> Result<&str, AppError> {
    let auth_header = parts
        .headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .ok_or(AppError::TokenMissing)?;

    auth_header
        .strip_prefix("Bearer ")
        .ok_or(AppError::TokenInvalid)
}
