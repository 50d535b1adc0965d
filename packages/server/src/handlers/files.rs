use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{StatusCode, header};
use axum::response::Response;
use common::storage::{FileRef, StorageError};
use tokio_util::io::ReaderStream;
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::state::AppState;

#[utoipa::path(
    get,
    path = "/{file_ref}",
    tag = "Files",
    operation_id = "downloadFile",
    summary = "Download a stored file",
    description = "Streams a stored image by its opaque reference, as returned in a \
        post's `file_ref` field.",
    params(("file_ref" = String, Path, description = "Opaque file reference")),
    responses(
        (status = 200, description = "File content"),
        (status = 404, description = "File not found (NOT_FOUND)", body = ErrorBody),
        (status = 422, description = "Malformed reference (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(file_ref = %raw_ref))]
pub async fn download_file(
    State(state): State<AppState>,
    Path(raw_ref): Path<String>,
) -> Result<Response, AppError> {
    let file_ref = FileRef::parse(&raw_ref)?;

    let reader = match state.blob_store.open(&file_ref).await {
        Ok(reader) => reader,
        Err(StorageError::NotFound(_)) => {
            return Err(AppError::NotFound("File not found".into()));
        }
        Err(e) => return Err(AppError::Internal(e.to_string())),
    };

    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    let content_type = mime_guess::from_path(file_ref.as_str())
        .first()
        .map(|m| m.to_string())
        .unwrap_or_else(|| "application/octet-stream".to_string());

    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, content_type)
        .header(
            header::CONTENT_DISPOSITION,
            content_disposition_value(file_ref.as_str()),
        )
        .header(header::CACHE_CONTROL, "private, max-age=3600")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}

/// Build a safe `Content-Disposition` header value.
fn content_disposition_value(filename: &str) -> String {
    let ascii_safe: String = filename
        .chars()
        .filter(|c| c.is_ascii_graphic() && !matches!(c, '"' | ';' | '\\'))
        .collect();
    let ascii_name = if ascii_safe.is_empty() {
        "download".to_string()
    } else {
        ascii_safe
    };

    format!("inline; filename=\"{ascii_name}\"")
}
