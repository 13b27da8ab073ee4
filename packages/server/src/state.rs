use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::ledger::{ContentLedger, IdentityStore};
use crate::oauth::IdentityProvider;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub ledger: ContentLedger,
    pub identities: IdentityStore,
    pub blob_store: Arc<dyn BlobStore>,
    pub identity_provider: Arc<dyn IdentityProvider>,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        db: DatabaseConnection,
        blob_store: Arc<dyn BlobStore>,
        identity_provider: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self {
            ledger: ContentLedger::new(db.clone()),
            identities: IdentityStore::new(db),
            config: Arc::new(config),
            blob_store,
            identity_provider,
        }
    }
}
