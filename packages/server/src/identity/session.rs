use async_trait::async_trait;
use axum::http::request::Parts;
use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::entity::user;
use crate::error::AppError;

use super::{Identity, IdentityProvider, bearer_token};

struct Session {
    user_id: i32,
    email: String,
    expires_at: DateTime<Utc>,
}

/// Server-side session identity: the credential is an opaque session id
/// looked up in an in-process store.
pub struct SessionIdentity {
    ttl: Duration,
    sessions: DashMap<String, Session>,
}

impl SessionIdentity {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            sessions: DashMap::new(),
        }
    }
}

#[async_trait]
impl IdentityProvider for SessionIdentity {
    async fn issue(&self, user: &user::Model) -> Result<String, AppError> {
        let id = Uuid::new_v4().to_string();
        self.sessions.insert(
            id.clone(),
            Session {
                user_id: user.id,
                email: user.email.clone(),
                expires_at: Utc::now() + self.ttl,
            },
        );
        Ok(id)
    }

    async fn resolve(&self, parts: &Parts) -> Result<Identity, AppError> {
        let token = bearer_token(parts)?;

        let expired = match self.sessions.get(token) {
            Some(session) if session.expires_at > Utc::now() => {
                return Ok(Identity {
                    user_id: session.user_id,
                    email: session.email.clone(),
                });
            }
            Some(_) => true,
            None => false,
        };

        if expired {
            self.sessions.remove(token);
        }
        Err(AppError::TokenInvalid)
    }
}
