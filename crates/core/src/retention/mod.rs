//! Retention sweep domain logic.
//!
//! Expired records are found through an [`ExpirableStore`], their stored
//! assets removed through an [`AssetStore`], and the outcome of each item
//! collected in a [`sweeper::SweepReport`]. Storage implementations live in
//! the `db` crate; [`assets::LocalAssetStore`] covers on-disk uploads.

pub mod assets;
pub mod policy;
pub mod sweeper;
pub mod timestamp;

use async_trait::async_trait;

use crate::types::DbId;

pub use assets::{AssetError, AssetStore, LocalAssetStore};
pub use policy::{Cutoff, RetentionPolicy, TimestampPolicy};
pub use sweeper::{RetentionSweeper, SweepReport};
pub use timestamp::EndOfLife;

/// Failure of a data-store operation issued by the sweeper.
#[derive(Debug, thiserror::Error)]
#[error("Storage error: {message}")]
pub struct StorageError {
    pub message: String,
    #[source]
    pub source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StorageError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    /// Wrap an underlying driver error, keeping its message.
    pub fn from_source<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        Self {
            message: err.to_string(),
            source: Some(Box::new(err)),
        }
    }
}

/// A candidate row as read from storage, before its end-of-life is parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpirableRow {
    /// Retained resource (table) the row belongs to.
    pub resource: String,
    pub id: DbId,
    /// End-of-life exactly as stored.
    pub end_of_life: String,
    pub asset_path: Option<String>,
}

/// Storage holding expirable records.
#[async_trait]
pub trait ExpirableStore: Send + Sync {
    /// Names of the retained resources to sweep.
    fn resources(&self) -> Vec<String>;

    /// Rows of `resource` that may be older than `cutoff` and follow the
    /// cutoff's interpretation rule.
    ///
    /// Implementations may return a superset; the sweeper re-checks every
    /// row against the cutoff.
    async fn candidates(
        &self,
        resource: &str,
        cutoff: Cutoff,
    ) -> Result<Vec<ExpirableRow>, StorageError>;

    /// Delete one record. Returns `false` if it no longer existed.
    async fn delete(&self, resource: &str, id: DbId) -> Result<bool, StorageError>;
}
