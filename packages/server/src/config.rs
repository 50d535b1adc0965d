use std::path::PathBuf;

use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

/// MIME types accepted for post images. Everything else is dropped.
pub const ALLOWED_IMAGE_TYPES: &[&str] = &["image/png", "image/jpg", "image/jpeg"];

#[derive(Debug, Deserialize, Clone)]
pub struct CorsConfig {
    pub allow_origins: Vec<String>,
    pub max_age: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub cors: CorsConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    /// Identity strategy: "jwt" (stateless bearer tokens) or "session"
    /// (opaque server-side session ids).
    pub strategy: String,
    pub jwt_secret: String,
    pub session_ttl_hours: i64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct StorageConfig {
    pub root_dir: PathBuf,
    pub max_blob_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct FeedConfig {
    /// Default page size for post listings.
    pub page_size: u64,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub storage: StorageConfig,
    pub feed: FeedConfig,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let s = Config::builder()
            .set_default("server.host", "127.0.0.1")?
            .set_default("server.port", 3000)?
            .set_default("server.cors.allow_origins", Vec::<String>::new())?
            .set_default("server.cors.max_age", 3600)?
            .set_default("auth.strategy", "jwt")?
            .set_default("auth.session_ttl_hours", 24)?
            .set_default("storage.root_dir", "./data/blobs")?
            .set_default("storage.max_blob_size", 10 * 1024 * 1024)?
            .set_default("feed.page_size", 2)?
            // Load from config/config.toml
            .add_source(File::with_name("config/config").required(false))
            // Override from environment (e.g., SORREL__AUTH__JWT_SECRET)
            .add_source(Environment::with_prefix("SORREL").separator("__"))
            .build()?;

        s.try_deserialize()
    }
}
