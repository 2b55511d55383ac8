//! JSON snapshot files.
//!
//! Lets a capture taken with `rsv-cli snapshot` be reconciled later (or on a
//! machine without AWS credentials), and gives tests a fixed input.

use std::path::{Path, PathBuf};

use rsv_reconcile::RawInventory;
use tracing::info;

use crate::{InventorySource, SourceError};

/// Inventory source that reads a [`RawInventory`] JSON document from disk.
#[derive(Debug, Clone)]
pub struct SnapshotFileSource {
    path: PathBuf,
}

impl SnapshotFileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait::async_trait]
impl InventorySource for SnapshotFileSource {
    fn source_name(&self) -> &'static str {
        "snapshot-file"
    }

    async fn fetch(&self) -> Result<RawInventory, SourceError> {
        let bytes = tokio::fs::read(&self.path)
            .await
            .map_err(|e| io_error(&self.path, e))?;

        // Strip UTF-8 BOM if present (files edited on Windows).
        let bytes = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(&bytes);

        let inventory: RawInventory = serde_json::from_slice(bytes)
            .map_err(|e| SourceError::Decode(format!("{}: {e}", self.path.display())))?;

        info!(
            path = %self.path.display(),
            instances = inventory.instances.len(),
            reservations = inventory.reservations.len(),
            "snapshot loaded"
        );
        Ok(inventory)
    }
}

/// Write `inventory` as pretty JSON, replacing any existing file.
pub async fn write_snapshot(path: &Path, inventory: &RawInventory) -> Result<(), SourceError> {
    let json = serde_json::to_string_pretty(inventory)
        .map_err(|e| SourceError::Decode(format!("encode snapshot: {e}")))?;
    tokio::fs::write(path, json)
        .await
        .map_err(|e| io_error(path, e))?;
    info!(path = %path.display(), "snapshot written");
    Ok(())
}

fn io_error(path: &Path, err: std::io::Error) -> SourceError {
    SourceError::Io {
        path: path.display().to_string(),
        message: err.to_string(),
    }
}
