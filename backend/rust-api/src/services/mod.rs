use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, StorageBackend};
use crate::store::{MemoryStore, MongoStore, Stores};

pub struct AppState {
    pub config: Config,
    pub stores: Stores,
}

impl AppState {
    pub fn new(config: Config, stores: Stores) -> Self {
        Self { config, stores }
    }

    /// Opens the configured storage backend once; the handles are shared by
    /// every request for the lifetime of the process.
    pub async fn connect(config: Config) -> anyhow::Result<Self> {
        let stores = match config.storage {
            StorageBackend::Memory => {
                tracing::warn!("Using in-memory storage; data is lost on restart");
                Stores::memory(Arc::new(MemoryStore::new()))
            }
            StorageBackend::Mongo => {
                let client = mongodb::Client::with_uri_str(&config.mongo_uri).await?;
                let db = client.database(&config.mongo_database);

                tokio::time::timeout(
                    Duration::from_secs(10),
                    db.run_command(mongodb::bson::doc! { "ping": 1 }),
                )
                .await
                .map_err(|_| anyhow::anyhow!("MongoDB ping timeout after 10s"))??;
                tracing::info!("MongoDB connected");

                let store = MongoStore::new(db);
                store.ensure_indexes().await?;
                Stores::mongo(Arc::new(store))
            }
        };

        Ok(Self::new(config, stores))
    }
}

pub mod admin_service;
pub mod challenge_service;
pub mod error;
pub mod identity_service;
pub mod leaderboard_service;
pub mod scoring_service;

pub use error::ServiceError;
