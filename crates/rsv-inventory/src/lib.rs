//! rsv-inventory
//!
//! Provider boundary: where running-instance and reservation records come from.
//!
//! Sources return a [`RawInventory`] verbatim; validation and aggregation
//! happen in `rsv_reconcile::normalize`, so every source is held to the same
//! rules (including the unknown-scope check).
//!
//! - [`Ec2InventorySource`]: live AWS EC2 API.
//! - [`SnapshotFileSource`]: a JSON capture written earlier by [`write_snapshot`].

mod ec2;
mod snapshot_file;

use std::fmt;

use rsv_reconcile::RawInventory;

pub use ec2::Ec2InventorySource;
pub use snapshot_file::{write_snapshot, SnapshotFileSource};

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

/// Errors an [`InventorySource`] may return.
#[derive(Debug)]
pub enum SourceError {
    /// Missing or invalid client configuration (e.g. no region).
    Config(String),
    /// The provider API call failed (network, auth, throttling, ...).
    Api {
        operation: &'static str,
        message: String,
    },
    /// Reading or writing a snapshot file failed.
    Io { path: String, message: String },
    /// A snapshot payload could not be decoded or encoded.
    Decode(String),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::Config(msg) => write!(f, "inventory config error: {msg}"),
            SourceError::Api { operation, message } => {
                write!(f, "{operation} failed: {message}")
            }
            SourceError::Io { path, message } => write!(f, "snapshot io error ({path}): {message}"),
            SourceError::Decode(msg) => write!(f, "snapshot decode error: {msg}"),
        }
    }
}

impl std::error::Error for SourceError {}

// ---------------------------------------------------------------------------
// Source trait
// ---------------------------------------------------------------------------

/// Where an inventory capture comes from.
///
/// Implementations must be `Send + Sync` so the CLI can hold a
/// `Box<dyn InventorySource>` chosen at runtime.
#[async_trait::async_trait]
pub trait InventorySource: Send + Sync {
    /// Short name for logs (e.g. `"ec2"`).
    fn source_name(&self) -> &'static str;

    /// Fetch running instances and active reservations in one capture.
    async fn fetch(&self) -> Result<RawInventory, SourceError>;
}
