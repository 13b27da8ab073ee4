use thiserror::Error;

/// Errors raised by a blob store backend.
#[derive(Debug, Error)]
pub enum StorageError {
    /// The backend has no blob for the given handle.
    #[error("blob not found: {0}")]
    NotFound(String),
    /// Required backend settings (token, chat) are missing.
    #[error("blob store is not configured: {0}")]
    NotConfigured(&'static str),
    /// The backend could not be reached or answered with a transport-level failure.
    #[error("blob store request failed: {0}")]
    Upstream(String),
    /// The backend answered but refused the request.
    #[error("blob store rejected the request: {0}")]
    Rejected(String),
    /// The backend answered with something we could not interpret.
    #[error("unexpected blob store response: {0}")]
    InvalidResponse(String),
}

#[cfg(feature = "telegram")]
impl From<reqwest::Error> for StorageError {
    fn from(err: reqwest::Error) -> Self {
        // Bot API URLs carry the bot token.
        let err = err.without_url();
        if err.is_decode() {
            Self::InvalidResponse(err.to_string())
        } else {
            Self::Upstream(err.to_string())
        }
    }
}
