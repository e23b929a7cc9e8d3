use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{EntityTrait, Set};
use tracing::instrument;

use crate::entity::user;
use crate::error::{AppError, ErrorBody};
use crate::extractors::identity::ClientIdentity;
use crate::extractors::json::AppJson;
use crate::models::user::{ProfileResponse, UpsertProfileRequest, validate_profile};
use crate::state::AppState;

#[utoipa::path(
    put,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    operation_id = "upsertProfile",
    summary = "Create or update a display profile",
    description = "Stores the display name and avatar for an identity token. Only affects \
        photos uploaded afterwards; existing photos keep the metadata captured at their \
        upload time.",
    params(("user_id" = String, Path, description = "Identity token; must match the caller's")),
    request_body = UpsertProfileRequest,
    responses(
        (status = 200, description = "Profile stored", body = ProfileResponse),
        (status = 400, description = "Validation error (VALIDATION_ERROR)", body = ErrorBody),
        (status = 401, description = "Missing identity (IDENTITY_MISSING)", body = ErrorBody),
        (status = 403, description = "Path does not match caller (PERMISSION_DENIED)", body = ErrorBody),
    ),
)]
#[instrument(skip(state, identity, payload), fields(user_id = %user_id))]
pub async fn upsert_profile(
    identity: ClientIdentity,
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    AppJson(payload): AppJson<UpsertProfileRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    if identity.user_id != user_id {
        return Err(AppError::PermissionDenied);
    }
    validate_profile(&payload)?;

    let model = user::ActiveModel {
        user_id: Set(user_id.clone()),
        username: Set(payload.username.trim().to_string()),
        avatar: Set(payload.avatar),
        updated_at: Set(Utc::now()),
    };

    user::Entity::insert(model)
        .on_conflict(
            OnConflict::column(user::Column::UserId)
                .update_columns([
                    user::Column::Username,
                    user::Column::Avatar,
                    user::Column::UpdatedAt,
                ])
                .to_owned(),
        )
        .exec_without_returning(&state.db)
        .await?;

    let saved = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::Internal("profile missing after upsert".into()))?;

    Ok(Json(ProfileResponse::from(saved)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{user_id}",
    tag = "Users",
    operation_id = "getProfile",
    summary = "Fetch a display profile",
    params(("user_id" = String, Path, description = "Identity token")),
    responses(
        (status = 200, description = "Profile", body = ProfileResponse),
        (status = 404, description = "No profile stored (NOT_FOUND)", body = ErrorBody),
    ),
)]
#[instrument(skip(state), fields(user_id = %user_id))]
pub async fn get_profile(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<ProfileResponse>, AppError> {
    let model = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await?
        .ok_or_else(|| AppError::NotFound("Profile not found".into()))?;

    Ok(Json(ProfileResponse::from(model)))
}
