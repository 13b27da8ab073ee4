//! Persistent records of stored blobs, ownership links and known users.
//!
//! The [`ContentLedger`] owns `file` and `image` rows; the [`IdentityStore`]
//! owns `user` rows. Both wrap an injected connection and map unique-key
//! violations to [`LedgerError::Conflict`] so callers can re-read the winner.

mod content;
mod identity;

pub use content::{ContentLedger, ImageEntry, RankingRow, UsageStats};
pub use identity::IdentityStore;

use sea_orm::{DbErr, SqlErr};

/// Upper bound on any page size accepted by the listing operations.
pub const MAX_PAGE_SIZE: u64 = 100;

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("{0} already exists")]
    Conflict(&'static str),
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error(transparent)]
    Database(#[from] DbErr),
}

impl LedgerError {
    /// Classify an insert failure: unique violations become `Conflict`.
    fn from_insert(err: DbErr, what: &'static str) -> Self {
        if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) {
            LedgerError::Conflict(what)
        } else {
            LedgerError::Database(err)
        }
    }
}

/// 1-based page request with a clamped page size.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRequest {
    pub page: u64,
    pub page_size: u64,
}

impl PageRequest {
    pub fn new(page: Option<u64>, page_size: Option<u64>, default_size: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            page_size: page_size.unwrap_or(default_size).clamp(1, MAX_PAGE_SIZE),
        }
    }

    /// Row offset, capped to what Postgres accepts as a bigint.
    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .saturating_mul(self.page_size)
            .min(i64::MAX as u64)
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.page_size)
    }
}
