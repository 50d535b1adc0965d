use std::net::SocketAddr;
use std::sync::Arc;

use common::storage::filesystem::FilesystemBlobStore;
use tracing::{Level, info};

use server::config::{ALLOWED_IMAGE_TYPES, AppConfig};
use server::notify::FeedNotifier;
use server::state::AppState;
use server::{database, identity, seed};

/// Buffered feed events per subscriber before a slow client starts lagging.
const FEED_CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt().with_max_level(Level::INFO).init();

    let config = AppConfig::load()?;

    let db = database::init_db(&config.database.url).await?;
    seed::ensure_indexes(&db).await?;

    let blob_store = FilesystemBlobStore::new(
        config.storage.root_dir.clone(),
        config.storage.max_blob_size,
        ALLOWED_IMAGE_TYPES,
    )
    .await?;

    let identity = identity::from_config(&config.auth)
        .map_err(|e| anyhow::anyhow!("identity setup failed: {e:?}"))?;

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port).parse()?;

    let state = AppState {
        db,
        blob_store: Arc::new(blob_store),
        identity,
        feed: FeedNotifier::new(FEED_CHANNEL_CAPACITY),
        config,
    };

    let app = server::build_router(state);

    info!("Server running at http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
