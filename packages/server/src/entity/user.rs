use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Display profile for a client-generated identity token.
///
/// Auxiliary only: the feed never joins against this table because photos
/// denormalize username/avatar at upload time.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "user")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub user_id: String,

    pub username: String,
    pub avatar: Option<String>,

    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
