use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One row per (photo, user) like. The composite primary key is what makes
/// duplicate likes impossible.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo_like")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub photo_id: Uuid,

    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    #[sea_orm(belongs_to, from = "photo_id", to = "id")]
    pub photo: BelongsTo<super::photo::Entity>,

    pub created_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
