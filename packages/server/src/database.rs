use std::time::Duration;

use sea_orm::sea_query::{Index, IndexCreateStatement, PostgresQueryBuilder};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use tracing::{info, warn};

use crate::entity::image;

pub async fn init_db(db_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new(db_url.to_owned());

    opt.max_connections(50)
        .min_connections(2)
        .connect_timeout(Duration::from_secs(8))
        .acquire_timeout(Duration::from_secs(8))
        .idle_timeout(Duration::from_secs(300))
        .sqlx_logging(false);

    let db = Database::connect(opt).await?;
    db.get_schema_registry("tgphoto_server::entity::*")
        .sync(&db)
        .await?;

    Ok(db)
}

/// Ensure secondary indexes used by the listing queries exist.
///
/// Schema sync only covers the unique keys declared on the entities, so the
/// composite lookup indexes are created here on startup.
pub async fn ensure_indexes(db: &DatabaseConnection) -> Result<(), DbErr> {
    // SELECT ... FROM image WHERE user_id = ? ORDER BY created_at DESC
    let owner_recent = Index::create()
        .if_not_exists()
        .name("idx_image_user_created")
        .table(image::Entity)
        .col(image::Column::UserId)
        .col(image::Column::CreatedAt)
        .to_owned();
    create_index(db, "idx_image_user_created", owner_recent).await;

    // Admin filter by origin address.
    let by_origin = Index::create()
        .if_not_exists()
        .name("idx_image_upload_ip")
        .table(image::Entity)
        .col(image::Column::UploadIp)
        .to_owned();
    create_index(db, "idx_image_upload_ip", by_origin).await;

    Ok(())
}

async fn create_index(db: &DatabaseConnection, name: &str, stmt: IndexCreateStatement) {
    match db
        .execute_unprepared(&stmt.to_string(PostgresQueryBuilder))
        .await
    {
        Ok(_) => info!("Ensured index {name} exists"),
        Err(e) => warn!("Failed to create index {name}: {e}"),
    }
}
