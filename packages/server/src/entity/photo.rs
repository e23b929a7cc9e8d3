use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "photo")]
pub struct Model {
    /// UUIDv7 primary key; time-ordered, doubles as the pagination tiebreaker.
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,

    /// Resolvable location of the image bytes.
    pub image_url: String,

    /// Blob-store handle used to release the bytes on delete.
    pub storage_id: String,

    /// Opaque client-generated uploader token; authorizes deletion.
    pub user_id: String,

    /// Display metadata captured at upload time. Purposefully denormalized;
    /// later profile edits do not propagate here.
    pub username: String,
    pub user_avatar: Option<String>,

    /// Always equals the number of `photo_like` rows for this photo.
    pub likes: i64,

    #[sea_orm(has_many)]
    pub liked_by: HasMany<super::photo_like::Entity>,

    /// Milliseconds since the Unix epoch; feed sort key.
    pub created_at: i64,
}

impl ActiveModelBehavior for ActiveModel {}
