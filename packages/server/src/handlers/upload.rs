use std::str::FromStr;

use axum::Json;
use axum::body::Body;
use axum::extract::{DefaultBodyLimit, Path, State};
use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use common::storage::{BlobKey, BoxReader};
use futures::TryStreamExt;
use tokio_util::io::{ReaderStream, StreamReader};
use tracing::instrument;

use crate::error::{AppError, ErrorBody};
use crate::models::upload::{BlobUploadResponse, UploadTargetResponse};
use crate::state::AppState;

pub fn blob_upload_body_limit() -> DefaultBodyLimit {
    DefaultBodyLimit::max(64 * 1024 * 1024) // 64 MB
}

#[utoipa::path(
    post,
    path = "/api/v1/uploads",
    tag = "Uploads",
    operation_id = "generateUploadTarget",
    summary = "Mint a write-once upload target",
    description = "Returns a fresh blob handle and the URL to PUT the raw bytes to. \
        The handle becomes the photo's `storage_id`.",
    responses(
        (status = 201, description = "Upload target minted", body = UploadTargetResponse),
    ),
)]
#[instrument(skip(state))]
pub async fn create_upload_target(
    State(state): State<AppState>,
) -> Result<impl IntoResponse, AppError> {
    let key = BlobKey::mint();
    let upload_url = format!(
        "{}/api/v1/uploads/{key}",
        state.config.server.public_url.trim_end_matches('/')
    );

    Ok((
        StatusCode::CREATED,
        Json(UploadTargetResponse {
            storage_id: key.to_string(),
            upload_url,
        }),
    ))
}

#[utoipa::path(
    put,
    path = "/api/v1/uploads/{storage_id}",
    tag = "Uploads",
    operation_id = "uploadBlob",
    summary = "Upload raw bytes to a minted target",
    description = "Streams the request body into blob storage under the given handle. \
        Write-once: a second PUT to the same handle is rejected with CONFLICT.",
    params(("storage_id" = String, Path, description = "Handle from an upload target")),
    request_body(content_type = "application/octet-stream", description = "Raw image bytes"),
    responses(
        (status = 201, description = "Blob stored", body = BlobUploadResponse),
        (status = 400, description = "Invalid handle or oversized body (VALIDATION_ERROR)", body = ErrorBody),
        (status = 409, description = "Handle already occupied (CONFLICT)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, body), fields(storage_id = %storage_id))]
pub async fn upload_blob(
    State(state): State<AppState>,
    Path(storage_id): Path<String>,
    body: Body,
) -> Result<impl IntoResponse, AppError> {
    let key = BlobKey::from_str(&storage_id)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let stream = body.into_data_stream().map_err(std::io::Error::other);
    let reader: BoxReader = Box::new(StreamReader::new(stream));
    let size = state.blob_store.put_stream(&key, reader).await?;

    Ok((
        StatusCode::CREATED,
        Json(BlobUploadResponse {
            storage_id: key.to_string(),
            size,
        }),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/uploads/{storage_id}",
    tag = "Uploads",
    operation_id = "fetchBlob",
    summary = "Fetch stored bytes",
    params(("storage_id" = String, Path, description = "Blob handle")),
    responses(
        (status = 200, description = "Blob content"),
        (status = 404, description = "Blob not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(storage_id = %storage_id))]
pub async fn fetch_blob(
    State(state): State<AppState>,
    Path(storage_id): Path<String>,
) -> Result<Response, AppError> {
    let key = BlobKey::from_str(&storage_id)
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let size = state.blob_store.size(&key).await?;
    let reader = state.blob_store.get_stream(&key).await?;
    let stream = ReaderStream::new(reader);
    let body = Body::from_stream(stream);

    // Handles are write-once, so the content under a key never changes.
    let response = Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, "application/octet-stream")
        .header(header::CONTENT_LENGTH, size.to_string())
        .header(header::CACHE_CONTROL, "public, max-age=31536000, immutable")
        .body(body)
        .map_err(|e| AppError::Internal(format!("Failed to build response: {e}")))?;

    Ok(response)
}
