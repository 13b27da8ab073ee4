use std::collections::HashMap;
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use futures::stream;

use super::error::StorageError;
use super::traits::{BlobDownload, BlobStore};

struct StoredBlob {
    data: Bytes,
    content_type: &'static str,
}

/// In-process blob store.
///
/// Handles are sequential (`mem-000001`, ...). Used by the test suites and for
/// running the server without Telegram credentials.
#[derive(Default)]
pub struct MemoryBlobStore {
    blobs: RwLock<HashMap<String, StoredBlob>>,
    next_id: AtomicU64,
    unavailable: AtomicBool,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of successful uploads so far.
    pub fn upload_count(&self) -> u64 {
        self.next_id.load(Ordering::SeqCst)
    }

    /// Make every subsequent call fail as if the backend were down.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> Result<(), StorageError> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(StorageError::Upstream("memory store marked unavailable".into()));
        }
        Ok(())
    }
}

/// Guess a content type from well-known magic numbers.
fn sniff_content_type(data: &[u8]) -> &'static str {
    match data {
        [0x89, b'P', b'N', b'G', ..] => "image/png",
        [0xFF, 0xD8, 0xFF, ..] => "image/jpeg",
        [b'G', b'I', b'F', b'8', ..] => "image/gif",
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => "image/webp",
        _ => "application/octet-stream",
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(&self, data: Bytes, _filename: &str) -> Result<String, StorageError> {
        self.check_available()?;

        let id = self.next_id.fetch_add(1, Ordering::SeqCst) + 1;
        let handle = format!("mem-{id:06}");
        let blob = StoredBlob {
            content_type: sniff_content_type(&data),
            data,
        };

        self.blobs
            .write()
            .map_err(|_| StorageError::Upstream("memory store lock poisoned".into()))?
            .insert(handle.clone(), blob);

        Ok(handle)
    }

    async fn resolve_url(&self, handle: &str) -> Result<String, StorageError> {
        self.check_available()?;

        let blobs = self
            .blobs
            .read()
            .map_err(|_| StorageError::Upstream("memory store lock poisoned".into()))?;
        if blobs.contains_key(handle) {
            Ok(format!("memory://{handle}"))
        } else {
            Err(StorageError::NotFound(handle.to_string()))
        }
    }

    async fn open(&self, handle: &str) -> Result<BlobDownload, StorageError> {
        self.check_available()?;

        let blobs = self
            .blobs
            .read()
            .map_err(|_| StorageError::Upstream("memory store lock poisoned".into()))?;
        let blob = blobs
            .get(handle)
            .ok_or_else(|| StorageError::NotFound(handle.to_string()))?;

        let data = blob.data.clone();
        Ok(BlobDownload {
            content_type: Some(blob.content_type.to_string()),
            content_length: Some(data.len() as u64),
            body: Box::pin(stream::once(async move { Ok(data) })),
        })
    }
}
