use chrono::{DateTime, Utc};
use serde::Serialize;

use super::shared::Pagination;
use crate::ledger::ImageEntry;
use crate::upload::UploadOutcome;
use crate::utils::url::proxy_url;

/// Result of an upload.
#[derive(Serialize, utoipa::ToSchema)]
pub struct UploadResponse {
    #[schema(example = "Upload successful")]
    pub message: String,
    /// Ownership link ID.
    #[schema(example = 12)]
    pub id: i64,
    /// Blob handle; also the last segment of `proxy_url`.
    #[schema(example = "BQACAgUAAxkDAAIBZ2...")]
    pub file_id: String,
    #[schema(example = "https://img.example.com/proxy/image/BQACAgUAAxkDAAIBZ2...")]
    pub proxy_url: String,
    /// Lowercase hex SHA-256 of the uploaded bytes.
    #[schema(example = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad")]
    pub content_hash: String,
    /// True when the caller already owned identical content.
    pub existing: bool,
}

impl UploadResponse {
    pub fn new(outcome: UploadOutcome, base_url: &str) -> Self {
        let message = if outcome.existing {
            "Image already exists"
        } else {
            "Upload successful"
        };
        Self {
            message: message.into(),
            id: outcome.image.id,
            proxy_url: proxy_url(base_url, &outcome.file.telegram_file_id),
            file_id: outcome.file.telegram_file_id,
            content_hash: outcome.file.content_hash,
            existing: outcome.existing,
        }
    }
}

/// One owned image.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageResponse {
    #[schema(example = 12)]
    pub id: i64,
    /// Blob handle.
    pub file_id: String,
    pub proxy_url: String,
    pub content_hash: String,
    /// Owner identity.
    #[schema(example = "583231")]
    pub user_id: String,
    /// Client address recorded at upload time (header-derived, untrusted).
    #[schema(example = "203.0.113.7")]
    pub upload_ip: String,
    pub created_at: DateTime<Utc>,
}

impl ImageResponse {
    pub fn new(entry: ImageEntry, base_url: &str) -> Self {
        Self {
            id: entry.image.id,
            proxy_url: proxy_url(base_url, &entry.file.telegram_file_id),
            file_id: entry.file.telegram_file_id,
            content_hash: entry.file.content_hash,
            user_id: entry.image.user_id,
            upload_ip: entry.image.upload_ip,
            created_at: entry.image.created_at,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct ImageListResponse {
    pub data: Vec<ImageResponse>,
    pub pagination: Pagination,
}

impl ImageListResponse {
    pub fn new(entries: Vec<ImageEntry>, pagination: Pagination, base_url: &str) -> Self {
        Self {
            data: entries
                .into_iter()
                .map(|e| ImageResponse::new(e, base_url))
                .collect(),
            pagination,
        }
    }
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct DeleteImageResponse {
    #[schema(example = "Image deleted")]
    pub message: String,
    pub id: i64,
}
