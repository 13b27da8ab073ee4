use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// A user's claim on a stored file.
#[sea_orm::model]
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "image")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,

    #[sea_orm(unique_key = "file_owner")]
    pub file_id: i64,
    #[sea_orm(belongs_to, from = "file_id", to = "id")]
    pub file: HasOne<super::file::Entity>,

    /// Owner identity (the token's `user_id` claim).
    #[sea_orm(unique_key = "file_owner")]
    pub user_id: String,

    /// Best-effort client address; taken from proxy headers, so not trustworthy.
    pub upload_ip: String,

    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

impl ActiveModelBehavior for ActiveModel {}
