mod digest;
mod error;
mod traits;

pub mod memory;
#[cfg(feature = "telegram")]
pub mod telegram;

pub use digest::ContentDigest;
pub use error::StorageError;
pub use traits::{BlobDownload, BlobStore, ByteStream};
