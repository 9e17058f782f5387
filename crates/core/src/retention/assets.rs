//! Stored asset deletion.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;

/// Errors raised while deleting a stored asset.
#[derive(Debug, thiserror::Error)]
pub enum AssetError {
    #[error("Asset not found: {0}")]
    NotFound(String),

    #[error("Asset path escapes the storage root: {0}")]
    OutsideRoot(String),

    #[error("Failed to delete asset {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Deletes stored assets referenced by expirable records.
#[async_trait]
pub trait AssetStore: Send + Sync {
    /// Delete the asset stored at `path`.
    async fn delete(&self, path: &str) -> Result<(), AssetError>;
}

/// Assets kept as files under a local directory.
///
/// Stored paths are resolved relative to `root`; a leading `/` is treated
/// as the root itself (upload URLs such as `/uploads/abc.jpg`).
#[derive(Debug, Clone)]
pub struct LocalAssetStore {
    root: PathBuf,
}

impl LocalAssetStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Map a stored path onto the filesystem, refusing anything that could
    /// leave the root.
    pub fn resolve(&self, stored: &str) -> Result<PathBuf, AssetError> {
        let mut resolved = self.root.clone();
        let mut pushed = false;
        for component in Path::new(stored.trim()).components() {
            match component {
                Component::RootDir | Component::CurDir => {}
                Component::Normal(part) => {
                    resolved.push(part);
                    pushed = true;
                }
                Component::ParentDir | Component::Prefix(_) => {
                    return Err(AssetError::OutsideRoot(stored.to_string()));
                }
            }
        }
        if !pushed {
            return Err(AssetError::OutsideRoot(stored.to_string()));
        }
        Ok(resolved)
    }
}

#[async_trait]
impl AssetStore for LocalAssetStore {
    async fn delete(&self, path: &str) -> Result<(), AssetError> {
        let resolved = self.resolve(path)?;
        match tokio::fs::remove_file(&resolved).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(AssetError::NotFound(path.to_string()))
            }
            Err(source) => Err(AssetError::Io {
                path: path.to_string(),
                source,
            }),
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
