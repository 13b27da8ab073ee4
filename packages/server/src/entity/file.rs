use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// One distinct blob, keyed by its content digest.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "file")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Blob handle returned by the blob store.
    #[sea_orm(unique)]
    pub telegram_file_id: String,

    /// Lowercase hex SHA-256 of the stored bytes.
    #[sea_orm(unique)]
    pub content_hash: String,

    #[sea_orm(has_many)]
    pub images: HasMany<super::image::Entity>,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
