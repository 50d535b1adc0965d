use async_trait::async_trait;
use axum::http::request::Parts;

use crate::entity::user;
use crate::error::AppError;
use crate::utils::jwt;

use super::{Identity, IdentityProvider, bearer_token};

/// Stateless bearer-token identity: the credential is a signed JWT.
pub struct JwtIdentity {
    secret: String,
}

impl JwtIdentity {
    pub fn new(secret: String) -> Self {
        Self { secret }
    }
}

#[async_trait]
impl IdentityProvider for JwtIdentity {
    async fn issue(&self, user: &user::Model) -> Result<String, AppError> {
        jwt::sign(user.id, &user.email, &self.secret)
            .map_err(|e| AppError::Internal(format!("JWT sign error: {}", e)))
    }

    async fn resolve(&self, parts: &Parts) -> Result<Identity, AppError> {
        let token = bearer_token(parts)?;
        let claims = jwt::verify(token, &self.secret).map_err(|_| AppError::TokenInvalid)?;

        Ok(Identity {
            user_id: claims.uid,
            email: claims.sub,
        })
    }
}
