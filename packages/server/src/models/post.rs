use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::{post, user};
use crate::error::{AppError, FieldViolation};

pub use super::shared::Pagination;

pub const TITLE_MIN_LEN: usize = 3;
pub const TITLE_MAX_LEN: usize = 256;
pub const CONTENT_MIN_LEN: usize = 5;
pub const CONTENT_MAX_LEN: usize = 1_000_000;

/// Owner summary embedded in post responses.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PostCreator {
    /// User ID of the author.
    #[schema(example = 42)]
    pub id: i32,
    /// Display name of the author.
    #[schema(example = "Alice")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct PostResponse {
    #[schema(example = 7)]
    pub id: i32,
    #[schema(example = "My first post")]
    pub title: String,
    #[schema(example = "Hello world, this is my feed.")]
    pub content: String,
    /// Blob-store reference of the attached image; fetch it via
    /// `GET /api/v1/files/{file_ref}`.
    pub file_ref: Option<String>,
    pub creator: PostCreator,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PostResponse {
    /// Assemble a response from a post row and its (joined) author.
    pub fn from_parts(post: post::Model, creator: Option<user::Model>) -> Self {
        let creator = match creator {
            Some(u) => PostCreator {
                id: u.id,
                name: u.name,
            },
            None => PostCreator {
                id: post.user_id,
                name: String::new(),
            },
        };
        Self {
            id: post.id,
            title: post.title,
            content: post.content,
            file_ref: post.file_ref,
            creator,
            created_at: post.created_at,
            updated_at: post.updated_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PostListResponse {
    pub posts: Vec<PostResponse>,
    pub pagination: Pagination,
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct PostListQuery {
    /// Page number, 1-based.
    pub page: Option<u64>,
    /// Page size; defaults to the deployment's configured size.
    pub per_page: Option<u64>,
    /// Restrict the listing to one author's posts.
    pub creator: Option<i32>,
}

/// Validate post title/content, collecting every violation.
pub fn validate_post_input(title: &str, content: &str) -> Result<(), AppError> {
    let mut violations = Vec::new();

    let title_len = title.trim().chars().count();
    if title_len < TITLE_MIN_LEN {
        violations.push(FieldViolation::new(
            "title",
            format!("Title must be at least {TITLE_MIN_LEN} characters"),
        ));
    } else if title_len > TITLE_MAX_LEN {
        violations.push(FieldViolation::new(
            "title",
            format!("Title must be at most {TITLE_MAX_LEN} characters"),
        ));
    }

    let trimmed_content = content.trim();
    if trimmed_content.chars().count() < CONTENT_MIN_LEN {
        violations.push(FieldViolation::new(
            "content",
            format!("Content must be at least {CONTENT_MIN_LEN} characters"),
        ));
    } else if trimmed_content.len() > CONTENT_MAX_LEN {
        violations.push(FieldViolation::new(
            "content",
            "Content must be at most 1MB".to_string(),
        ));
    }

    if violations.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(violations))
    }
}
