use std::str::FromStr;

use common::storage::BlobKey;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::photo;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreatePhotoRequest {
    /// Resolvable URL of the already-uploaded image bytes.
    pub image_url: String,
    /// Blob-store handle returned when the upload target was minted.
    pub storage_id: String,
    /// Display name captured at upload time.
    pub username: String,
    pub user_avatar: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PhotoResponse {
    pub id: Uuid,
    pub image_url: String,
    pub storage_id: String,
    pub user_id: String,
    pub username: String,
    pub user_avatar: Option<String>,
    /// Always equals `liked_by.len()`.
    #[schema(example = 3)]
    pub likes: i64,
    /// User ids that currently like this photo.
    pub liked_by: Vec<String>,
    /// Milliseconds since the Unix epoch.
    #[schema(example = 1700000000123_i64)]
    pub created_at: i64,
}

impl PhotoResponse {
    pub fn from_model(model: photo::Model, liked_by: Vec<String>) -> Self {
        Self {
            id: model.id,
            image_url: model.image_url,
            storage_id: model.storage_id,
            user_id: model.user_id,
            username: model.username,
            user_avatar: model.user_avatar,
            likes: model.likes,
            liked_by,
            created_at: model.created_at,
        }
    }
}

#[derive(Deserialize, utoipa::IntoParams)]
pub struct FeedQuery {
    /// Items per page; defaults to 20, clamped to 1..=100.
    pub page_size: Option<u64>,
    /// Opaque continuation token from a previous page.
    pub cursor: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct FeedResponse {
    pub items: Vec<PhotoResponse>,
    /// Token for the next page; present iff `has_more`.
    pub next_cursor: Option<String>,
    /// Explicit end-of-feed signal. Clients must stop on `false`, never on
    /// an empty page.
    pub has_more: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct UserPhotosResponse {
    pub items: Vec<PhotoResponse>,
    pub total: u64,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ToggleLikeResponse {
    /// Whether the caller likes the photo after this call.
    pub liked: bool,
    pub likes: i64,
}

/// Validate a create request and parse its storage handle.
pub fn validate_create_photo(payload: &CreatePhotoRequest) -> Result<BlobKey, AppError> {
    if payload.image_url.trim().is_empty() {
        return Err(AppError::Validation("image_url must not be empty".into()));
    }
    if payload.image_url.len() > 2048 {
        return Err(AppError::Validation(
            "image_url must be at most 2048 characters".into(),
        ));
    }
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "username must be 1-64 characters".into(),
        ));
    }
    if payload.storage_id.trim().is_empty() {
        return Err(AppError::Validation("storage_id must not be empty".into()));
    }
    BlobKey::from_str(payload.storage_id.trim())
        .map_err(|e| AppError::Validation(format!("storage_id is not a valid handle: {e}")))
}
