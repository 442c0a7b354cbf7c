//! Local filesystem state storage.
//!
//! Writes go to a sibling `.tmp` file that is then renamed over the state
//! file, so an interrupted save leaves the previous state intact.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::error::{AppError, Result};
use crate::models::StateMap;
use crate::storage::StateStore;

/// JSON state file on the local filesystem.
#[derive(Debug, Clone)]
pub struct LocalStateStore {
    path: PathBuf,
}

impl LocalStateStore {
    /// Create a store backed by the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Ensure parent directory exists.
    async fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }
        Ok(())
    }

    /// Write bytes atomically (write to temp, then rename).
    async fn write_bytes(&self, bytes: &[u8]) -> Result<()> {
        self.ensure_dir().await?;

        let tmp = self.path.with_extension("tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(bytes).await?;
        file.flush().await?;
        file.sync_all().await?;
        drop(file);

        tokio::fs::rename(&tmp, &self.path).await?;
        Ok(())
    }

    /// Read bytes, returning None if file doesn't exist.
    async fn read_bytes(&self) -> Result<Option<Vec<u8>>> {
        match tokio::fs::read(&self.path).await {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}

#[async_trait]
impl StateStore for LocalStateStore {
    async fn load(&self) -> Result<StateMap> {
        match self.read_bytes().await? {
            Some(bytes) => {
                let states: StateMap = serde_json::from_slice(&bytes)
                    .map_err(|e| AppError::state_corrupt(&self.path, e))?;
                log::info!(
                    "Loaded state for {} targets from {}",
                    states.len(),
                    self.path.display()
                );
                Ok(states)
            }
            None => {
                log::info!("No state file at {}, starting fresh", self.path.display());
                Ok(StateMap::new())
            }
        }
    }

    async fn save(&self, states: &StateMap) -> Result<()> {
        let mut bytes = serde_json::to_vec_pretty(states)?;
        bytes.push(b'\n');
        self.write_bytes(&bytes).await?;
        log::debug!("Saved state to {}", self.path.display());
        Ok(())
    }
}
