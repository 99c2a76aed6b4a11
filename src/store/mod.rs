pub mod keys;
pub mod migrate;
pub mod operations;
pub mod trees;

use serde::de::DeserializeOwned;
use serde::Serialize;
use sled::Db;
use thiserror::Error;

#[derive(Debug)]
pub struct Store {
    db: Db,
    pub auctions: sled::Tree,
    pub config_versions: sled::Tree,
    // Secondary index trees
    pub auctions_active_by_created_at: sled::Tree,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sled error: {0}")]
    Sled(#[from] sled::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("not found: entity={entity}, key={key}")]
    NotFound { entity: String, key: String },
    #[error("conflict: entity={entity}, key={key}")]
    Conflict { entity: String, key: String },
    #[error("invalid status transition for {key}: {from} -> {to}")]
    InvalidTransition {
        key: String,
        from: &'static str,
        to: &'static str,
    },
    #[error("store call timed out after {secs}s: {operation}")]
    Timeout { operation: &'static str, secs: u64 },
    #[error("migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl Store {
    pub fn open(sled_path: &str) -> Result<Self, StoreError> {
        let db = sled::open(sled_path)?;
        let auctions = db.open_tree(trees::AUCTIONS)?;
        let config_versions = db.open_tree(trees::CONFIG_VERSIONS)?;
        let auctions_active_by_created_at = db.open_tree(trees::AUCTIONS_ACTIVE_BY_CREATED_AT)?;

        Ok(Self {
            db,
            auctions,
            config_versions,
            auctions_active_by_created_at,
        })
    }

    pub fn run_migrations(&self) -> Result<(), StoreError> {
        migrate::run(self)
    }

    pub fn flush(&self) -> Result<(), StoreError> {
        self.db.flush()?;
        Ok(())
    }

    pub(crate) fn serialize<T: Serialize>(value: &T) -> Result<Vec<u8>, StoreError> {
        Ok(serde_json::to_vec(value)?)
    }

    pub(crate) fn deserialize<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, StoreError> {
        Ok(serde_json::from_slice(bytes)?)
    }
}
