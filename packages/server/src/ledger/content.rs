use chrono::{NaiveTime, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, EntityTrait, FromQueryResult,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Select, Set,
};
use tracing::warn;

use super::{LedgerError, PageRequest};
use crate::entity::{file, image};

/// Number of owners reported in the upload ranking.
const RANKING_LIMIT: u64 = 10;

/// An ownership link together with the file it points at.
#[derive(Debug, Clone)]
pub struct ImageEntry {
    pub image: image::Model,
    pub file: file::Model,
}

#[derive(Debug, Clone, PartialEq, Eq, FromQueryResult)]
pub struct RankingRow {
    pub user_id: String,
    pub count: i64,
}

/// Aggregate counts over all ownership links.
///
/// Each figure comes from its own query; they are not a consistent snapshot.
#[derive(Debug, Clone)]
pub struct UsageStats {
    pub total_images: u64,
    pub today_images: u64,
    pub user_count: u64,
    pub user_rankings: Vec<RankingRow>,
}

/// Record of stored blobs (`file`) and the users that own them (`image`).
#[derive(Clone)]
pub struct ContentLedger {
    db: DatabaseConnection,
}

impl ContentLedger {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Record a newly stored blob. Fails with `Conflict` when the digest or the
    /// handle is already known.
    pub async fn create_file(
        &self,
        content_hash: &str,
        blob_handle: &str,
    ) -> Result<file::Model, LedgerError> {
        let now = Utc::now();
        let model = file::ActiveModel {
            telegram_file_id: Set(blob_handle.to_string()),
            content_hash: Set(content_hash.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| LedgerError::from_insert(e, "file"))
    }

    pub async fn find_file_by_hash(
        &self,
        content_hash: &str,
    ) -> Result<Option<file::Model>, LedgerError> {
        Ok(file::Entity::find()
            .filter(file::Column::ContentHash.eq(content_hash))
            .one(&self.db)
            .await?)
    }

    pub async fn find_file_by_blob_handle(
        &self,
        blob_handle: &str,
    ) -> Result<Option<file::Model>, LedgerError> {
        Ok(file::Entity::find()
            .filter(file::Column::TelegramFileId.eq(blob_handle))
            .one(&self.db)
            .await?)
    }

    /// Link `owner_id` to a file. Fails with `Conflict` when the link exists.
    pub async fn create_image(
        &self,
        file_id: i64,
        owner_id: &str,
        origin_addr: &str,
    ) -> Result<image::Model, LedgerError> {
        let now = Utc::now();
        let model = image::ActiveModel {
            file_id: Set(file_id),
            user_id: Set(owner_id.to_string()),
            upload_ip: Set(origin_addr.to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        model
            .insert(&self.db)
            .await
            .map_err(|e| LedgerError::from_insert(e, "image"))
    }

    pub async fn find_image(
        &self,
        file_id: i64,
        owner_id: &str,
    ) -> Result<Option<image::Model>, LedgerError> {
        Ok(image::Entity::find()
            .filter(image::Column::FileId.eq(file_id))
            .filter(image::Column::UserId.eq(owner_id))
            .one(&self.db)
            .await?)
    }

    pub async fn find_image_by_id(&self, id: i64) -> Result<Option<ImageEntry>, LedgerError> {
        let row = image::Entity::find_by_id(id)
            .find_also_related(file::Entity)
            .one(&self.db)
            .await?;

        Ok(row.and_then(into_entry))
    }

    /// Images owned by `owner_id`, newest first.
    pub async fn list_images_for_owner(
        &self,
        owner_id: &str,
        page: PageRequest,
    ) -> Result<(Vec<ImageEntry>, u64), LedgerError> {
        let select = image::Entity::find().filter(image::Column::UserId.eq(owner_id));
        self.page_of(select, page).await
    }

    /// Images matching every given filter, newest first.
    pub async fn filter_images(
        &self,
        owner_id: Option<&str>,
        origin_addr: Option<&str>,
        page: PageRequest,
    ) -> Result<(Vec<ImageEntry>, u64), LedgerError> {
        let mut cond = Condition::all();
        if let Some(owner_id) = owner_id {
            cond = cond.add(image::Column::UserId.eq(owner_id));
        }
        if let Some(origin_addr) = origin_addr {
            cond = cond.add(image::Column::UploadIp.eq(origin_addr));
        }

        self.page_of(image::Entity::find().filter(cond), page).await
    }

    async fn page_of(
        &self,
        select: Select<image::Entity>,
        page: PageRequest,
    ) -> Result<(Vec<ImageEntry>, u64), LedgerError> {
        let total = select.clone().count(&self.db).await?;

        let rows = select
            .find_also_related(file::Entity)
            .order_by_desc(image::Column::CreatedAt)
            .order_by_desc(image::Column::Id)
            .offset(Some(page.offset()))
            .limit(Some(page.page_size))
            .all(&self.db)
            .await?;

        Ok((rows.into_iter().filter_map(into_entry).collect(), total))
    }

    /// Remove an ownership link. The referenced file is kept.
    pub async fn delete_image(&self, id: i64) -> Result<(), LedgerError> {
        let result = image::Entity::delete_by_id(id).exec(&self.db).await?;
        if result.rows_affected == 0 {
            return Err(LedgerError::NotFound("image"));
        }
        Ok(())
    }

    pub async fn compute_stats(&self) -> Result<UsageStats, LedgerError> {
        let total_images = image::Entity::find().count(&self.db).await?;

        let midnight = Utc::now().date_naive().and_time(NaiveTime::MIN).and_utc();
        let today_images = image::Entity::find()
            .filter(image::Column::CreatedAt.gte(midnight))
            .count(&self.db)
            .await?;

        let user_count = image::Entity::find()
            .select_only()
            .column(image::Column::UserId)
            .distinct()
            .count(&self.db)
            .await?;

        let user_rankings = image::Entity::find()
            .select_only()
            .column(image::Column::UserId)
            .column_as(image::Column::Id.count(), "count")
            .group_by(image::Column::UserId)
            .order_by_desc(image::Column::Id.count())
            .order_by_asc(image::Column::UserId)
            .limit(Some(RANKING_LIMIT))
            .into_model::<RankingRow>()
            .all(&self.db)
            .await?;

        Ok(UsageStats {
            total_images,
            today_images,
            user_count,
            user_rankings,
        })
    }
}

fn into_entry((image, file): (image::Model, Option<file::Model>)) -> Option<ImageEntry> {
    match file {
        Some(file) => Some(ImageEntry { image, file }),
        None => {
            warn!(image_id = image.id, file_id = image.file_id, "Image row without file");
            None
        }
    }
}
