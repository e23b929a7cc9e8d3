use std::collections::HashMap;
use std::str::FromStr;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use chrono::Utc;
use common::storage::BlobKey;
use sea_orm::sea_query::{Expr, ExprTrait, OnConflict};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, DbErr, EntityTrait, QueryFilter,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use tracing::instrument;
use uuid::Uuid;

use crate::entity::{photo, photo_like};
use crate::error::{AppError, ErrorBody};
use crate::extractors::identity::ClientIdentity;
use crate::extractors::json::AppJson;
use crate::extractors::query::AppQuery;
use crate::models::photo::*;
use crate::state::AppState;
use crate::utils::cursor::FeedCursor;

#[utoipa::path(
    post,
    path = "/api/v1/photos",
    tag = "Photos",
    operation_id = "createPhoto",
    summary = "Create a photo record",
    description = "Registers an uploaded image in the feed. The image bytes must already be \
        persisted under `storage_id`; the service does not verify this. Display metadata \
        (username, avatar) is copied into the record and never synced with later profile edits.",
    request_body = CreatePhotoRequest,
    responses(
        (status = 201, description = "Photo created", body = PhotoResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing identity (IDENTITY_MISSING)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, identity, payload), fields(user_id = %identity.user_id))]
pub async fn create_photo(
    identity: ClientIdentity,
    State(state): State<AppState>,
    AppJson(payload): AppJson<CreatePhotoRequest>,
) -> Result<impl IntoResponse, AppError> {
    validate_create_photo(&payload)?;

    let new_photo = photo::ActiveModel {
        id: Set(Uuid::now_v7()),
        image_url: Set(payload.image_url.trim().to_string()),
        storage_id: Set(payload.storage_id.trim().to_string()),
        user_id: Set(identity.user_id),
        username: Set(payload.username.trim().to_string()),
        user_avatar: Set(payload.user_avatar),
        likes: Set(0),
        created_at: Set(Utc::now().timestamp_millis()),
    };

    let model = new_photo.insert(&state.db).await?;

    Ok((
        StatusCode::CREATED,
        Json(PhotoResponse::from_model(model, Vec::new())),
    ))
}

#[utoipa::path(
    get,
    path = "/api/v1/photos",
    tag = "Photos",
    operation_id = "listFeed",
    summary = "List the photo feed",
    description = "Returns photos newest-first with keyset pagination. Pass the returned \
        `next_cursor` to continue; `has_more` is the only end-of-feed signal (an empty page \
        with `has_more = true` is possible under concurrent deletion). Clients appending \
        pages incrementally should still deduplicate against already-rendered ids, since \
        concurrent inserts and deletes can shift rows across page boundaries.",
    params(FeedQuery),
    responses(
        (status = 200, description = "One page of the feed", body = FeedResponse),
        (status = 400, description = "Invalid cursor (VALIDATION_ERROR)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, query))]
pub async fn list_feed(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<FeedQuery>,
) -> Result<Json<FeedResponse>, AppError> {
    let page_size = query.page_size.unwrap_or(20).clamp(1, 100);

    let mut select = photo::Entity::find()
        .order_by_desc(photo::Column::CreatedAt)
        .order_by_desc(photo::Column::Id);

    if let Some(ref token) = query.cursor {
        let cursor = FeedCursor::decode(token)
            .map_err(|e| AppError::Validation(format!("Invalid cursor: {e}")))?;
        select = select.filter(
            Condition::any()
                .add(photo::Column::CreatedAt.lt(cursor.created_at))
                .add(
                    Condition::all()
                        .add(photo::Column::CreatedAt.eq(cursor.created_at))
                        .add(photo::Column::Id.lt(cursor.id)),
                ),
        );
    }

    // One extra row decides has_more without a second COUNT query.
    let mut rows = select.limit(page_size + 1).all(&state.db).await?;

    let has_more = rows.len() as u64 > page_size;
    if has_more {
        rows.truncate(page_size as usize);
    }

    let next_cursor = if has_more {
        rows.last().map(|last| {
            FeedCursor {
                created_at: last.created_at,
                id: last.id,
            }
            .encode()
        })
    } else {
        None
    };

    let items = attach_liked_by(&state.db, rows).await?;

    Ok(Json(FeedResponse {
        items,
        next_cursor,
        has_more,
    }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}/photos",
    tag = "Photos",
    operation_id = "listUserPhotos",
    summary = "List all photos by one uploader",
    description = "Returns every photo owned by `user_id`, newest first, unpaginated. \
        Bounded in practice by a single user's upload count; this is a documented scale \
        boundary, not a defect.",
    params(("user_id" = String, Path, description = "Uploader's opaque token")),
    responses(
        (status = 200, description = "The user's photos", body = UserPhotosResponse),
    ),
)]
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn list_user_photos(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserPhotosResponse>, AppError> {
    let rows = photo::Entity::find()
        .filter(photo::Column::UserId.eq(&user_id))
        .order_by_desc(photo::Column::CreatedAt)
        .order_by_desc(photo::Column::Id)
        .all(&state.db)
        .await?;

    let total = rows.len() as u64;
    let items = attach_liked_by(&state.db, rows).await?;

    Ok(Json(UserPhotosResponse { items, total }))
}

#[utoipa::path(
    post,
    path = "/api/v1/photos/{id}/like",
    tag = "Photos",
    operation_id = "toggleLike",
    summary = "Toggle the caller's like on a photo",
    description = "Adds the caller to the photo's likers if absent, removes them if present. \
        The counter is adjusted with relative SQL updates guarded by rows-affected checks, \
        so concurrent toggles by distinct users all land and a same-user race cannot \
        double-count.",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses(
        (status = 200, description = "New like state", body = ToggleLikeResponse),
        (status = 401, description = "Missing identity (IDENTITY_MISSING)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, identity), fields(photo_id = %photo_id, user_id = %identity.user_id))]
pub async fn toggle_like(
    identity: ClientIdentity,
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<Json<ToggleLikeResponse>, AppError> {
    find_photo(&state.db, photo_id).await?;

    // Membership change and counter adjustment commit together, so a
    // failure between them cannot strand likes != |liked_by|.
    let txn = state.db.begin().await?;

    // Delete-first: a removed row means the caller had liked before.
    let deleted = photo_like::Entity::delete_by_id((photo_id, identity.user_id.clone()))
        .exec(&txn)
        .await?
        .rows_affected;

    let liked = if deleted == 1 {
        adjust_like_count(&txn, photo_id, -1).await?;
        false
    } else {
        let row = photo_like::ActiveModel {
            photo_id: Set(photo_id),
            user_id: Set(identity.user_id.clone()),
            created_at: Set(Utc::now()),
        };
        let inserted = photo_like::Entity::insert(row)
            .on_conflict(
                OnConflict::columns([photo_like::Column::PhotoId, photo_like::Column::UserId])
                    .do_nothing()
                    .to_owned(),
            )
            .exec_without_returning(&txn)
            .await;

        match inserted {
            // Count only the insert that actually landed; a lost same-user
            // race was already counted by the winner.
            Ok(1) => adjust_like_count(&txn, photo_id, 1).await?,
            Ok(_) | Err(DbErr::RecordNotInserted) => {}
            Err(e) => return Err(e.into()),
        }
        true
    };

    txn.commit().await?;

    let model = find_photo(&state.db, photo_id).await?;

    Ok(Json(ToggleLikeResponse {
        liked,
        likes: model.likes,
    }))
}

#[utoipa::path(
    delete,
    path = "/api/v1/photos/{id}",
    tag = "Photos",
    operation_id = "deletePhoto",
    summary = "Delete an owned photo",
    description = "Removes the photo record, its like rows, and then releases the image \
        bytes via the stored blob handle. A failed blob release after the record is gone \
        leaves an orphaned blob; this is logged and accepted, never rolled back.",
    params(("id" = Uuid, Path, description = "Photo ID")),
    responses(
        (status = 204, description = "Photo deleted"),
        (status = 401, description = "Missing identity (IDENTITY_MISSING)", body = ErrorBody),
        (status = 403, description = "Caller is not the owner (PERMISSION_DENIED)", body = ErrorBody),
        (status = 404, description = "Photo not found (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, identity), fields(photo_id = %photo_id, user_id = %identity.user_id))]
pub async fn delete_photo(
    identity: ClientIdentity,
    State(state): State<AppState>,
    Path(photo_id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let model = find_photo(&state.db, photo_id).await?;
    if model.user_id != identity.user_id {
        return Err(AppError::PermissionDenied);
    }

    // Like rows and the record disappear together or not at all.
    let txn = state.db.begin().await?;
    photo_like::Entity::delete_many()
        .filter(photo_like::Column::PhotoId.eq(photo_id))
        .exec(&txn)
        .await?;
    photo::Entity::delete_by_id(photo_id).exec(&txn).await?;
    txn.commit().await?;

    // The record is gone at this point; blob release is best effort.
    match BlobKey::from_str(&model.storage_id) {
        Ok(key) => {
            if let Err(e) = state.blob_store.delete(&key).await {
                tracing::warn!(
                    storage_id = %model.storage_id,
                    "Failed to release blob for deleted photo: {e}"
                );
            }
        }
        Err(e) => {
            tracing::warn!("Deleted photo had an unparseable storage_id: {e}");
        }
    }

    Ok(StatusCode::NO_CONTENT)
}

async fn find_photo<C: ConnectionTrait>(db: &C, id: Uuid) -> Result<photo::Model, AppError> {
    photo::Entity::find_by_id(id)
        .one(db)
        .await?
        .ok_or_else(|| AppError::NotFound("Photo not found".into()))
}

/// Apply a relative adjustment to a photo's like counter.
async fn adjust_like_count<C: ConnectionTrait>(
    db: &C,
    photo_id: Uuid,
    delta: i64,
) -> Result<(), AppError> {
    photo::Entity::update_many()
        .col_expr(photo::Column::Likes, Expr::col(photo::Column::Likes).add(delta))
        .filter(photo::Column::Id.eq(photo_id))
        .exec(db)
        .await?;
    Ok(())
}

/// Batch-load the liker lists for a page of photos. One query for the whole
/// page, grouped in memory.
async fn attach_liked_by<C: ConnectionTrait>(
    db: &C,
    photos: Vec<photo::Model>,
) -> Result<Vec<PhotoResponse>, AppError> {
    if photos.is_empty() {
        return Ok(Vec::new());
    }

    let ids: Vec<Uuid> = photos.iter().map(|p| p.id).collect();
    let likes = photo_like::Entity::find()
        .filter(photo_like::Column::PhotoId.is_in(ids))
        .all(db)
        .await?;

    let mut by_photo: HashMap<Uuid, Vec<String>> = HashMap::new();
    for like in likes {
        by_photo.entry(like.photo_id).or_default().push(like.user_id);
    }

    Ok(photos
        .into_iter()
        .map(|p| {
            let liked_by = by_photo.remove(&p.id).unwrap_or_default();
            PhotoResponse::from_model(p, liked_by)
        })
        .collect())
}
