use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;
use crate::state::AppState;

/// Authenticated user resolved from the request's bearer credential.
///
/// Add this as a handler parameter to require authentication. The actual
/// strategy (JWT vs server-side session) lives behind `state.identity`;
/// handlers never see the difference.
pub struct AuthUser {
    pub user_id: i32,
    pub email: String,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let identity = state.identity.resolve(parts).await?;

        Ok(AuthUser {
            user_id: identity.user_id,
            email: identity.email,
        })
    }
}
