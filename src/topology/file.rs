use std::path::PathBuf;
use anyhow::{Context, Result};
use async_trait::async_trait;
use log::debug;
use super::{Snapshot, TopologyProvider};

/// Topology read from a JSON snapshot file, re-read on every call so
/// edits are picked up by the next refresh.
#[derive(Clone, Debug)]
pub struct FileProvider {
    path: PathBuf,
}

impl FileProvider {
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl TopologyProvider for FileProvider {
    async fn snapshot(&self) -> Result<Snapshot> {
        let path = &self.path;
        let data = tokio::fs::read(path).await.with_context(|| {
            format!("reading topology {}", path.display())
        })?;

        let snapshot: Snapshot = serde_json::from_slice(&data).with_context(|| {
            format!("parsing topology {}", path.display())
        })?;

        debug!("loaded topology: {} users, {} devices", snapshot.users.len(), snapshot.devices.len());

        Ok(snapshot)
    }
}
