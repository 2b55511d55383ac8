//! rsv-reconcile
//!
//! Reserved-capacity reconciliation engine.
//!
//! Matches running instances against purchased reservations and reports the
//! discrepancy in both directions:
//! - Running instances with no covering reservation (negative delta)
//! - Reservations nobody is consuming (positive delta)
//!
//! Matching runs in two scopes:
//! - Zone-scoped reservations cover only an exact `(type, zone)` pair
//! - Region-scoped reservations cover any zone, matched by type only
//!
//! Zone-scoped coverage always applies first; the region pool is only drawn
//! down by whatever deficit remains.
//!
//! Deterministic, pure logic. No IO. No cloud API calls.

mod engine;
mod gate;
mod report;
mod snapshot_adapter;
mod types;

pub use engine::{reconcile, reconcile_with};
pub use gate::{check_coverage, CoverageBlock, CoverageGate, CoveragePolicy};
pub use report::derive_report;
pub use snapshot_adapter::{
    normalize, normalize_json, Inventory, RawInstance, RawInventory, RawReservation,
    SnapshotAdapterError, ACTIVE_RESERVATION_STATE, RUNNING_INSTANCE_STATE,
};
pub use types::*;
