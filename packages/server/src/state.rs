use std::sync::Arc;

use common::storage::BlobStore;
use sea_orm::DatabaseConnection;

use crate::config::AppConfig;
use crate::identity::IdentityProvider;
use crate::notify::FeedNotifier;

#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub blob_store: Arc<dyn BlobStore>,
    pub identity: Arc<dyn IdentityProvider>,
    pub feed: FeedNotifier,
    pub config: AppConfig,
}
