use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entity::user;
use crate::error::AppError;

#[derive(Deserialize, utoipa::ToSchema)]
pub struct UpsertProfileRequest {
    pub username: String,
    pub avatar: Option<String>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ProfileResponse {
    pub user_id: String,
    pub username: String,
    pub avatar: Option<String>,
    pub updated_at: DateTime<Utc>,
}

impl From<user::Model> for ProfileResponse {
    fn from(model: user::Model) -> Self {
        Self {
            user_id: model.user_id,
            username: model.username,
            avatar: model.avatar,
            updated_at: model.updated_at,
        }
    }
}

pub fn validate_profile(payload: &UpsertProfileRequest) -> Result<(), AppError> {
    let username = payload.username.trim();
    if username.is_empty() || username.chars().count() > 64 {
        return Err(AppError::Validation(
            "username must be 1-64 characters".into(),
        ));
    }
    Ok(())
}
