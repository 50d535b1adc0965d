use axum::{
    Json,
    extract::{FromRequest, Request, rejection::JsonRejection},
};
use serde::de::DeserializeOwned;

use crate::error::AppError;
use crate::state::AppState;

/// A `Json<T>` wrapper that converts deserialization errors into validation
/// errors, ensuring clients always receive structured JSON error responses.
pub struct AppJson<T>(pub T);

impl<T> FromRequest<AppState> for AppJson<T>
where
    Json<T>: FromRequest<AppState, Rejection = JsonRejection>,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::validation("body", e.body_text()))?;
        Ok(AppJson(value))
    }
}
