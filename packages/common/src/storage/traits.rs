use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

use super::error::StorageError;

/// Streamed blob body.
pub type ByteStream = BoxStream<'static, Result<Bytes, StorageError>>;

/// An opened blob, ready to be relayed to a client.
pub struct BlobDownload {
    /// Content type reported by the backend, if any.
    pub content_type: Option<String>,
    /// Content length reported by the backend, if any.
    pub content_length: Option<u64>,
    pub body: ByteStream,
}

/// External storage for uploaded bytes.
///
/// Backends assign their own opaque handle on upload; callers persist the handle
/// and use it for every later read.
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `data` and return the backend's handle for it.
    async fn upload(&self, data: Bytes, filename: &str) -> Result<String, StorageError>;

    /// Resolve a handle to a URL the bytes can currently be fetched from.
    async fn resolve_url(&self, handle: &str) -> Result<String, StorageError>;

    /// Open a blob for streaming.
    async fn open(&self, handle: &str) -> Result<BlobDownload, StorageError>;
}
