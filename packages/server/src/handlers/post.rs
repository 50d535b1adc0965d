use axum::Json;
use axum::extract::{DefaultBodyLimit, Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use common::storage::{BlobStore, BoxReader, FileRef, StorageError};
use sea_orm::*;
use tokio::io::AsyncWriteExt;
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{post, user};
use crate::error::{AppError, ErrorBody};
use crate::extractors::auth::AuthUser;
use crate::models::post::*;
use crate::notify::{FeedAction, FeedEvent};
use crate::state::AppState;

/// Body limit layer for post create/update routes (16MB).
pub fn post_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(16 * 1024 * 1024)
}

#[utoipa::path(
    get,
    path = "/",
    tag = "Posts",
    operation_id = "listPosts",
    summary = "List posts with pagination",
    description = "Returns a page of posts ordered by creation time, most recent first. \
        The optional `creator` filter restricts the listing to one author's posts. \
        A page past the end returns an empty slice with correct metadata, not an error.",
    params(PostListQuery),
    responses(
        (status = 200, description = "Page of posts", body = PostListResponse),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_posts(
    State(state): State<AppState>,
    Query(query): Query<PostListQuery>,
) -> Result<Json<PostListResponse>, AppError> {
    let page = Ord::max(query.page.unwrap_or(1), 1);
    let per_page = query
        .per_page
        .unwrap_or(state.config.feed.page_size)
        .clamp(1, 100);

    let mut select = post::Entity::find();
    if let Some(creator) = query.creator {
        select = select.filter(post::Column::UserId.eq(creator));
    }

    // Count and slice are two queries; under concurrent writes they may
    // disagree. Accepted trade-off, we don't hold a snapshot for listings.
    let total = select.clone().count(&state.db).await?;

    let rows = select
        .find_also_related(user::Entity)
        .order_by_desc(post::Column::CreatedAt)
        .offset(Some((page - 1) * per_page))
        .limit(Some(per_page))
        .all(&state.db)
        .await?;

    let posts = rows
        .into_iter()
        .map(|(p, creator)| PostResponse::from_parts(p, creator))
        .collect();

    Ok(Json(PostListResponse {
        posts,
        pagination: Pagination::new(page, per_page, total),
    }))
}

#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Posts",
    operation_id = "getPost",
    summary = "Get a post by ID",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Post details", body = PostResponse),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(post_id = %id))]
pub async fn get_post(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let (model, creator) = find_post_with_creator(&state.db, id).await?;
    Ok(Json(PostResponse::from_parts(model, creator)))
}

#[utoipa::path(
    post,
    path = "/",
    tag = "Posts",
    operation_id = "createPost",
    summary = "Create a new post",
    description = "Creates a post from a multipart form with `title` and `content` text \
        fields and an optional `image` file field. Images must be PNG or JPEG; an upload \
        with any other content type is dropped and the post is created without a file.",
    request_body(content_type = "multipart/form-data", description = "Post fields plus optional image"),
    responses(
        (status = 201, description = "Post created", body = PostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(user_id = auth_user.user_id))]
pub async fn create_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    let form = read_post_form(&mut multipart, &state).await?;
    let title = form.title.unwrap_or_default();
    let content = form.content.unwrap_or_default();

    // Nothing has touched the post table yet; a stored upload is the only
    // thing to roll back on failure.
    let result = insert_post(&state, &auth_user, &title, &content, form.file_ref.clone()).await;

    match result {
        Ok(response) => {
            state.feed.publish(FeedEvent {
                action: FeedAction::Created,
                post: response.clone(),
            });
            Ok((StatusCode::CREATED, Json(response)))
        }
        Err(err) => {
            discard_upload(&state, form.file_ref.as_ref()).await;
            Err(err)
        }
    }
}

async fn insert_post(
    state: &AppState,
    auth_user: &AuthUser,
    title: &str,
    content: &str,
    file_ref: Option<FileRef>,
) -> Result<PostResponse, AppError> {
    validate_post_input(title, content)?;

    // The account may have disappeared since the credential was issued.
    let owner = user::Entity::find_by_id(auth_user.user_id)
        .one(&state.db)
        .await?
        .ok_or(AppError::TokenInvalid)?;

    let now = chrono::Utc::now();
    let new_post = post::ActiveModel {
        title: Set(title.trim().to_string()),
        content: Set(content.trim().to_string()),
        file_ref: Set(file_ref.map(|r| r.to_string())),
        user_id: Set(owner.id),
        created_at: Set(now),
        updated_at: Set(now),
        ..Default::default()
    };

    let model = new_post.insert(&state.db).await?;

    Ok(PostResponse::from_parts(model, Some(owner)))
}

#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Posts",
    operation_id = "updatePost",
    summary = "Update a post",
    description = "Replaces a post's title and content; only the author may update. \
        An `image` file field, when present, replaces the attached image — the previous \
        blob is removed only after the new post state is saved.",
    params(("id" = i32, Path, description = "Post ID")),
    request_body(content_type = "multipart/form-data", description = "Post fields plus optional replacement image"),
    responses(
        (status = 200, description = "Post updated", body = PostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, auth_user, multipart), fields(post_id = %id, user_id = auth_user.user_id))]
pub async fn update_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
    mut multipart: Multipart,
) -> Result<Json<PostResponse>, AppError> {
    let form = read_post_form(&mut multipart, &state).await?;
    let title = form.title.unwrap_or_default();
    let content = form.content.unwrap_or_default();

    let result = apply_update(
        &state,
        id,
        auth_user.user_id,
        &title,
        &content,
        form.file_ref.clone(),
    )
    .await;

    match result {
        Ok(response) => {
            state.feed.publish(FeedEvent {
                action: FeedAction::Updated,
                post: response.clone(),
            });
            Ok(Json(response))
        }
        Err(err) => {
            // The fresh upload never made it into the post; don't orphan it.
            discard_upload(&state, form.file_ref.as_ref()).await;
            Err(err)
        }
    }
}

async fn apply_update(
    state: &AppState,
    id: i32,
    requester_id: i32,
    title: &str,
    content: &str,
    new_file_ref: Option<FileRef>,
) -> Result<PostResponse, AppError> {
    validate_post_input(title, content)?;

    let (existing, creator) = find_post_with_creator(&state.db, id).await?;
    require_owner(&existing, requester_id)?;

    let previous_ref = existing.file_ref.clone();

    let mut active: post::ActiveModel = existing.into();
    active.title = Set(title.trim().to_string());
    active.content = Set(content.trim().to_string());
    if let Some(ref file_ref) = new_file_ref {
        active.file_ref = Set(Some(file_ref.to_string()));
    }
    active.updated_at = Set(chrono::Utc::now());

    let model = active.update(&state.db).await?;

    // The old blob goes away only after the new row state is durable. A
    // failed cleanup leaves an orphan blob, never a post pointing at nothing.
    if new_file_ref.is_some()
        && let Some(old_ref) = previous_ref
    {
        discard_blob(&state, &old_ref).await;
    }

    Ok(PostResponse::from_parts(model, creator))
}

#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Posts",
    operation_id = "deletePost",
    summary = "Delete a post",
    description = "Permanently deletes a post and its attached image; only the author may \
        delete. Returns the deleted post's final state. Deleting the same post twice fails \
        with 404 on the second call.",
    params(("id" = i32, Path, description = "Post ID")),
    responses(
        (status = 200, description = "Deleted post", body = PostResponse),
        (status = 401, description = "Unauthorized (TOKEN_MISSING, TOKEN_INVALID)", body = ErrorBody),
        (status = 403, description = "Forbidden (FORBIDDEN)", body = ErrorBody),
        (status = 404, description = "Post not found (NOT_FOUND)", body = ErrorBody),
    ),
    security(("bearer" = [])),
)]
#[instrument(skip(state, auth_user), fields(post_id = %id, user_id = auth_user.user_id))]
pub async fn delete_post(
    auth_user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PostResponse>, AppError> {
    let (existing, creator) = find_post_with_creator(&state.db, id).await?;
    require_owner(&existing, auth_user.user_id)?;

    let file_ref = existing.file_ref.clone();

    post::Entity::delete_by_id(id).exec(&state.db).await?;

    // Blob cleanup after the row is gone, same non-fatal policy as update.
    if let Some(ref old_ref) = file_ref {
        discard_blob(&state, old_ref).await;
    }

    let response = PostResponse::from_parts(existing, creator);
    state.feed.publish(FeedEvent {
        action: FeedAction::Deleted,
        post: response.clone(),
    });

    Ok(Json(response))
}

/// Fields collected from a post create/update multipart form.
#[derive(Default)]
struct PostForm {
    title: Option<String>,
    content: Option<String>,
    file_ref: Option<FileRef>,
}

/// Read a post form, storing an allowed `image` field as it streams past.
///
/// A disallowed content type drops the upload and keeps the request alive —
/// the legacy apps accepted the submission and silently omitted the file.
async fn read_post_form(
    multipart: &mut Multipart,
    state: &AppState,
) -> Result<PostForm, AppError> {
    let mut form = PostForm::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::validation("body", format!("Multipart error: {e}")))?
    {
        match field.name() {
            Some("title") => {
                form.title = Some(field.text().await.map_err(|e| {
                    AppError::validation("title", format!("Failed to read title: {e}"))
                })?);
            }
            Some("content") => {
                form.content = Some(field.text().await.map_err(|e| {
                    AppError::validation("content", format!("Failed to read content: {e}"))
                })?);
            }
            Some("image") => {
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                if !state.blob_store.accepts(&content_type) {
                    tracing::warn!(content_type, "dropping upload with disallowed content type");
                    continue;
                }

                let filename = field.file_name().unwrap_or("upload").to_string();
                let file_ref = stream_field_to_store(
                    field,
                    &*state.blob_store,
                    &filename,
                    &content_type,
                    state.config.storage.max_blob_size,
                )
                .await?;

                // Repeated image fields: last one wins, earlier stores are
                // discarded so they can't leak.
                if let Some(replaced) = form.file_ref.replace(file_ref) {
                    discard_blob(state, replaced.as_str()).await;
                }
            }
            _ => {} // Ignore unknown fields.
        }
    }

    Ok(form)
}

/// Stream a multipart field into the blob store via a temp file.
async fn stream_field_to_store(
    mut field: axum::extract::multipart::Field<'_>,
    blob_store: &dyn BlobStore,
    filename: &str,
    content_type: &str,
    max_size: u64,
) -> Result<FileRef, AppError> {
    let temp_path = std::env::temp_dir().join(format!("sorrel-upload-{}", Uuid::new_v4()));

    let result = async {
        let mut temp_file = tokio::fs::File::create(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create temp file: {e}")))?;

        let mut total_size: u64 = 0;

        while let Some(chunk) = field
            .chunk()
            .await
            .map_err(|e| AppError::validation("image", format!("Upload read error: {e}")))?
        {
            total_size += chunk.len() as u64;
            if total_size > max_size {
                return Err(AppError::validation(
                    "image",
                    format!("File exceeds maximum size of {max_size} bytes"),
                ));
            }
            temp_file
                .write_all(&chunk)
                .await
                .map_err(|e| AppError::Internal(format!("Temp file write failed: {e}")))?;
        }

        temp_file
            .flush()
            .await
            .map_err(|e| AppError::Internal(format!("Temp file flush failed: {e}")))?;
        drop(temp_file);

        let file = tokio::fs::File::open(&temp_path)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to reopen temp file: {e}")))?;
        let reader: BoxReader = Box::new(file);
        let file_ref = blob_store.save(reader, filename, content_type).await?;

        Ok(file_ref)
    }
    .await;

    // Best effort.
    let _ = tokio::fs::remove_file(&temp_path).await;

    result
}

async fn find_post_with_creator<C: ConnectionTrait>(
    db: &C,
    id: i32,
) -> Result<(post::Model, Option<user::Model>), AppError> {
    post::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Post not found".into()))
}

fn require_owner(existing: &post::Model, requester_id: i32) -> Result<(), AppError> {
    if existing.user_id != requester_id {
        return Err(AppError::Forbidden);
    }
    Ok(())
}

/// Best-effort deletion of a stored blob by its raw reference string.
///
/// Failures are logged and swallowed: an orphaned blob is acceptable, a
/// failed post operation because of cleanup is not.
async fn discard_blob(state: &AppState, raw_ref: &str) {
    let file_ref = match FileRef::parse(raw_ref) {
        Ok(r) => r,
        Err(e) => {
            tracing::warn!(raw_ref, "stored file reference failed to parse: {e}");
            return;
        }
    };
    match state.blob_store.delete(&file_ref).await {
        Ok(_) => {}
        Err(StorageError::NotFound(_)) => {}
        Err(e) => {
            tracing::warn!(%file_ref, "failed to delete blob: {e}");
        }
    }
}

async fn discard_upload(state: &AppState, file_ref: Option<&FileRef>) {
    if let Some(file_ref) = file_ref {
        discard_blob(state, file_ref.as_str()).await;
    }
}
