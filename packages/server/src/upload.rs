//! Content-addressed upload and ownership linking.

use bytes::Bytes;
use common::storage::{BlobStore, ContentDigest};
use tracing::{error, info, instrument, warn};

use crate::entity::{file, image};
use crate::error::AppError;
use crate::ledger::{ContentLedger, LedgerError};

/// Outcome of a successful upload.
#[derive(Debug, Clone)]
pub struct UploadOutcome {
    pub file: file::Model,
    pub image: image::Model,
    /// The caller already owned this content before the request.
    pub existing: bool,
}

/// Who is uploading, and from where.
#[derive(Debug, Clone, Copy)]
pub struct Uploader<'a> {
    pub user_id: &'a str,
    pub origin_addr: &'a str,
}

pub struct UploadWorkflow<'a> {
    ledger: &'a ContentLedger,
    blobs: &'a dyn BlobStore,
    max_size: usize,
}

impl<'a> UploadWorkflow<'a> {
    pub fn new(ledger: &'a ContentLedger, blobs: &'a dyn BlobStore, max_size: usize) -> Self {
        Self {
            ledger,
            blobs,
            max_size,
        }
    }

    /// Store `data` for `uploader`, reusing any blob with the same digest.
    #[instrument(skip(self, data), fields(size = data.len(), user_id = uploader.user_id))]
    pub async fn run(
        &self,
        data: Bytes,
        filename: &str,
        uploader: Uploader<'_>,
    ) -> Result<UploadOutcome, AppError> {
        if data.is_empty() {
            return Err(AppError::Validation("Image must not be empty".into()));
        }
        if data.len() > self.max_size {
            return Err(AppError::PayloadTooLarge(self.max_size));
        }

        let digest = ContentDigest::compute(&data).to_hex();

        let file = match self.ledger.find_file_by_hash(&digest).await? {
            Some(file) => file,
            None => self.store_new_blob(data, filename, &digest).await?,
        };

        if let Some(image) = self.ledger.find_image(file.id, uploader.user_id).await? {
            return Ok(UploadOutcome {
                file,
                image,
                existing: true,
            });
        }

        match self
            .ledger
            .create_image(file.id, uploader.user_id, uploader.origin_addr)
            .await
        {
            Ok(image) => {
                info!(image_id = image.id, file_id = file.id, "Image linked");
                Ok(UploadOutcome {
                    file,
                    image,
                    existing: false,
                })
            }
            // Same user uploading the same bytes concurrently.
            Err(LedgerError::Conflict(_)) => {
                let image = self
                    .ledger
                    .find_image(file.id, uploader.user_id)
                    .await?
                    .ok_or_else(|| {
                        AppError::Persistence("image conflict but existing link not found".into())
                    })?;
                Ok(UploadOutcome {
                    file,
                    image,
                    existing: true,
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Upload to the blob store and record the file. A concurrent uploader of
    /// the same bytes may win the insert; its row is used and ours is orphaned.
    async fn store_new_blob(
        &self,
        data: Bytes,
        filename: &str,
        digest: &str,
    ) -> Result<file::Model, AppError> {
        let handle = self.blobs.upload(data, filename).await.map_err(|e| {
            warn!(error = %e, "Blob upload failed");
            AppError::Upstream(e.to_string())
        })?;

        match self.ledger.create_file(digest, &handle).await {
            Ok(file) => {
                info!(file_id = file.id, blob = %handle, "Stored new blob");
                Ok(file)
            }
            Err(LedgerError::Conflict(_)) => {
                warn!(blob = %handle, digest, "Lost file insert race; uploaded blob is orphaned");
                self.ledger
                    .find_file_by_hash(digest)
                    .await?
                    .ok_or_else(|| {
                        AppError::Persistence("file conflict but existing row not found".into())
                    })
            }
            Err(e) => {
                error!(blob = %handle, digest, error = %e, "File record not saved; uploaded blob is orphaned");
                Err(AppError::Persistence(e.to_string()))
            }
        }
    }
}
