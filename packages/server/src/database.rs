use std::time::Duration;

use sea_orm::sea_query::{Index, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::info;

use crate::entity::photo;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    // Set connection pool options
    opt.max_connections(100)
        .min_connections(5)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(8))
        .max_lifetime(Duration::from_secs(8))
        .sqlx_logging(true);

    let db = Database::connect(opt).await?;
    sync_schema(&db).await?;

    Ok(db)
}

/// Create or update tables for all registered entities.
pub async fn sync_schema(db: &DatabaseConnection) -> Result<(), DbErr> {
    db.get_schema_registry("server::entity::*")
        .sync(db)
        .await?;
    Ok(())
}

/// Create secondary indexes the schema sync does not cover.
///
/// Failures are logged and tolerated; the service still works without the
/// indexes, just slower.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // Keyset pagination scans: ORDER BY created_at DESC, id DESC
    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("idx_photo_created_id")
            .table(photo::Entity)
            .col(photo::Column::CreatedAt)
            .col(photo::Column::Id)
            .to_string(PostgresQueryBuilder),
        "idx_photo_created_id",
    )
    .await;

    // Per-user listing: WHERE user_id = ? ORDER BY created_at DESC
    create_index(
        db,
        Index::create()
            .if_not_exists()
            .name("idx_photo_user_created")
            .table(photo::Entity)
            .col(photo::Column::UserId)
            .col(photo::Column::CreatedAt)
            .to_string(PostgresQueryBuilder),
        "idx_photo_user_created",
    )
    .await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, stmt: String, name: &str) {
    match db.execute_unprepared(&stmt).await {
        Ok(_) => {
            info!("Ensured index {} exists", name);
        }
        Err(e) => {
            tracing::warn!("Failed to create index {}: {}", name, e);
        }
    }
}
