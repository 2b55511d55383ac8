//! Snapshot Adapter: deserialize provider inventory records and fold them
//! into the count maps consumed by the reconciliation engine.
//!
//! # Purpose
//! The cloud API (or a saved snapshot file) hands back one record per running
//! instance and one record per reservation purchase.  This module defines the
//! *raw* (wire-level) structs for those records and a single [`normalize`]
//! function that validates them and aggregates counts per [`InstanceKey`].
//!
//! # Design constraints
//! - Pure, deterministic conversion. No IO, no API calls, no async.
//! - Fail fast: the first malformed record aborts normalization with a
//!   [`SnapshotAdapterError`]; no partial inventory is ever returned.
//! - A reservation scope other than `"Region"` / `"Availability Zone"` is
//!   fatal. Silently dropping it would misreport coverage.
//! - Strings are used exactly as received: no trimming, no case folding.
//!   Only empty types and zones are rejected.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    reconcile_with, tally, AllocationPolicy, CountMap, InstanceKey, Reconciliation,
    ReservationScope,
};

/// Instance state counted as running usage.
pub const RUNNING_INSTANCE_STATE: &str = "running";

/// Reservation state counted as purchased capacity.
pub const ACTIVE_RESERVATION_STATE: &str = "active";

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// All errors that can occur during snapshot normalization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotAdapterError {
    /// A record has an empty `instance_type`.
    MissingInstanceType { record: &'static str, index: usize },
    /// A running instance or zone-scoped reservation has no availability zone.
    MissingZone {
        record: &'static str,
        index: usize,
        instance_type: String,
    },
    /// A reservation reported a negative instance count.
    NegativeCount { instance_type: String, count: i64 },
    /// The reservation scope is neither `"Region"` nor `"Availability Zone"`.
    UnknownScope { raw: String },
}

impl std::fmt::Display for SnapshotAdapterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingInstanceType { record, index } => {
                write!(f, "{record} #{index} has empty instance type")
            }
            Self::MissingZone {
                record,
                index,
                instance_type,
            } => {
                write!(
                    f,
                    "{record} #{index} ({instance_type}) has no availability zone"
                )
            }
            Self::NegativeCount {
                instance_type,
                count,
            } => {
                write!(
                    f,
                    "reservation for {instance_type} has negative instance count {count}"
                )
            }
            Self::UnknownScope { raw } => write!(f, "unknown reservation scope: {raw:?}"),
        }
    }
}

impl std::error::Error for SnapshotAdapterError {}

// ---------------------------------------------------------------------------
// Raw wire-level structs  (provider JSON → these → count maps)
// ---------------------------------------------------------------------------

/// One running instance as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInstance {
    /// Instance type, e.g. `"m3.medium"`.
    pub instance_type: String,
    /// Availability zone, e.g. `"us-east-1a"`.
    pub availability_zone: String,
    /// Lifecycle state. When present, only `"running"` records are counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// One reservation purchase as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawReservation {
    /// Scope discriminator: `"Region"` | `"Availability Zone"`.
    pub scope: String,
    pub instance_type: String,
    /// Required for zone-scoped reservations; ignored for region scope.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability_zone: Option<String>,
    /// Number of instances the reservation covers.
    pub instance_count: i64,
    /// Lifecycle state. When present, only `"active"` records are counted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<String>,
}

/// A full inventory capture, as fetched from the provider or a snapshot file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawInventory {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub captured_at_utc: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub instances: Vec<RawInstance>,
    #[serde(default)]
    pub reservations: Vec<RawReservation>,
}

// ---------------------------------------------------------------------------
// Normalized inventory
// ---------------------------------------------------------------------------

/// Aggregated counts ready for the engine.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Inventory {
    /// Running instances per `(type, zone)`.
    pub running: CountMap,
    /// Zone-scoped reservations per `(type, zone)`.
    pub zone_reservations: CountMap,
    /// Region-scoped reservations per `(type, "")`.
    pub region_reservations: CountMap,
}

impl Inventory {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn total_running(&self) -> i64 {
        self.running.values().sum()
    }

    pub fn total_reserved(&self) -> i64 {
        self.zone_reservations.values().sum::<i64>()
            + self.region_reservations.values().sum::<i64>()
    }

    /// Run the engine on a working copy of the region pool.
    pub fn reconcile(&self, policy: AllocationPolicy) -> Reconciliation {
        reconcile_with(
            policy,
            &self.running,
            &self.zone_reservations,
            self.region_reservations.clone(),
        )
    }
}

// ---------------------------------------------------------------------------
// Normalization helpers
// ---------------------------------------------------------------------------

fn state_matches(state: Option<&str>, wanted: &str) -> bool {
    state
        .map(|s| s == wanted)
        .unwrap_or(true)
}

fn normalize_instance(
    index: usize,
    raw: &RawInstance,
) -> Result<InstanceKey, SnapshotAdapterError> {
    let instance_type = raw.instance_type.as_str();
    if instance_type.is_empty() {
        return Err(SnapshotAdapterError::MissingInstanceType {
            record: "instance",
            index,
        });
    }

    let zone = raw.availability_zone.as_str();
    if zone.is_empty() {
        return Err(SnapshotAdapterError::MissingZone {
            record: "instance",
            index,
            instance_type: instance_type.to_string(),
        });
    }

    Ok(InstanceKey::zonal(instance_type, zone))
}

fn normalize_reservation(
    index: usize,
    raw: &RawReservation,
) -> Result<(ReservationScope, InstanceKey, i64), SnapshotAdapterError> {
    let scope = ReservationScope::parse(raw.scope.as_str()).ok_or_else(|| {
        SnapshotAdapterError::UnknownScope {
            raw: raw.scope.clone(),
        }
    })?;

    let instance_type = raw.instance_type.as_str();
    if instance_type.is_empty() {
        return Err(SnapshotAdapterError::MissingInstanceType {
            record: "reservation",
            index,
        });
    }

    if raw.instance_count < 0 {
        return Err(SnapshotAdapterError::NegativeCount {
            instance_type: instance_type.to_string(),
            count: raw.instance_count,
        });
    }

    let key = match scope {
        ReservationScope::Region => InstanceKey::regional(instance_type),
        ReservationScope::AvailabilityZone => {
            let zone = raw.availability_zone.as_deref().unwrap_or("");
            if zone.is_empty() {
                return Err(SnapshotAdapterError::MissingZone {
                    record: "reservation",
                    index,
                    instance_type: instance_type.to_string(),
                });
            }
            InstanceKey::zonal(instance_type, zone)
        }
    };

    Ok((scope, key, raw.instance_count))
}

// ---------------------------------------------------------------------------
// Public API
// ---------------------------------------------------------------------------

/// Normalize a raw inventory capture into engine-ready counts.
///
/// # Errors
/// Returns the first [`SnapshotAdapterError`] encountered.  Instances are
/// processed before reservations, each in input order.
pub fn normalize(raw: &RawInventory) -> Result<Inventory, SnapshotAdapterError> {
    let mut inventory = Inventory::empty();

    for (index, inst) in raw.instances.iter().enumerate() {
        if !state_matches(inst.state.as_deref(), RUNNING_INSTANCE_STATE) {
            continue;
        }
        let key = normalize_instance(index, inst)?;
        tally(&mut inventory.running, key, 1);
    }

    for (index, res) in raw.reservations.iter().enumerate() {
        if !state_matches(res.state.as_deref(), ACTIVE_RESERVATION_STATE) {
            continue;
        }
        let (scope, key, count) = normalize_reservation(index, res)?;
        match scope {
            ReservationScope::Region => tally(&mut inventory.region_reservations, key, count),
            ReservationScope::AvailabilityZone => {
                tally(&mut inventory.zone_reservations, key, count)
            }
        }
    }

    Ok(inventory)
}

/// Deserialize a JSON string directly into an [`Inventory`].
///
/// Convenience wrapper: `json_str → RawInventory → Inventory`.
pub fn normalize_json(json: &str) -> Result<Inventory, Box<dyn std::error::Error>> {
    let raw: RawInventory = serde_json::from_str(json)?;
    let inventory = normalize(&raw)?;
    Ok(inventory)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn instance(ty: &str, zone: &str) -> RawInstance {
        RawInstance {
            instance_type: ty.to_string(),
            availability_zone: zone.to_string(),
            state: None,
        }
    }

    fn reservation(scope: &str, ty: &str, zone: Option<&str>, count: i64) -> RawReservation {
        RawReservation {
            scope: scope.to_string(),
            instance_type: ty.to_string(),
            availability_zone: zone.map(str::to_string),
            instance_count: count,
            state: None,
        }
    }

    #[test]
    fn instances_are_counted_per_type_and_zone() {
        let raw = RawInventory {
            instances: vec![
                instance("m3.medium", "us-east-1a"),
                instance("m3.medium", "us-east-1a"),
                instance("m3.medium", "us-east-1b"),
            ],
            ..RawInventory::default()
        };
        let inv = normalize(&raw).unwrap();
        assert_eq!(inv.running[&InstanceKey::zonal("m3.medium", "us-east-1a")], 2);
        assert_eq!(inv.running[&InstanceKey::zonal("m3.medium", "us-east-1b")], 1);
        assert_eq!(inv.total_running(), 3);
    }

    #[test]
    fn scopes_route_to_separate_maps() {
        let raw = RawInventory {
            reservations: vec![
                reservation("Region", "c5.xlarge", None, 2),
                reservation("Region", "c5.xlarge", Some("ignored-zone"), 1),
                reservation("Availability Zone", "c5.xlarge", Some("us-east-1e"), 4),
            ],
            ..RawInventory::default()
        };
        let inv = normalize(&raw).unwrap();
        assert_eq!(inv.region_reservations[&InstanceKey::regional("c5.xlarge")], 3);
        assert_eq!(
            inv.zone_reservations[&InstanceKey::zonal("c5.xlarge", "us-east-1e")],
            4
        );
        assert_eq!(inv.total_reserved(), 7);
    }

    #[test]
    fn unknown_scope_is_fatal() {
        let raw = RawInventory {
            reservations: vec![reservation("Custom", "t2.micro", None, 1)],
            ..RawInventory::default()
        };
        let err = normalize(&raw).unwrap_err();
        assert_eq!(
            err,
            SnapshotAdapterError::UnknownScope {
                raw: "Custom".to_string()
            }
        );
        assert_eq!(err.to_string(), "unknown reservation scope: \"Custom\"");
    }

    #[test]
    fn scope_match_is_case_sensitive() {
        let raw = RawInventory {
            reservations: vec![reservation("region", "t2.micro", None, 1)],
            ..RawInventory::default()
        };
        assert!(matches!(
            normalize(&raw),
            Err(SnapshotAdapterError::UnknownScope { .. })
        ));
    }

    #[test]
    fn zone_scoped_reservation_requires_zone() {
        let raw = RawInventory {
            reservations: vec![reservation("Availability Zone", "t2.micro", None, 1)],
            ..RawInventory::default()
        };
        assert!(matches!(
            normalize(&raw),
            Err(SnapshotAdapterError::MissingZone { .. })
        ));
    }

    #[test]
    fn negative_count_errors() {
        let raw = RawInventory {
            reservations: vec![reservation("Region", "t2.micro", None, -1)],
            ..RawInventory::default()
        };
        assert!(matches!(
            normalize(&raw),
            Err(SnapshotAdapterError::NegativeCount { .. })
        ));
    }

    #[test]
    fn empty_instance_type_errors() {
        let raw = RawInventory {
            instances: vec![instance("", "us-east-1a")],
            ..RawInventory::default()
        };
        assert_eq!(
            normalize(&raw),
            Err(SnapshotAdapterError::MissingInstanceType {
                record: "instance",
                index: 0
            })
        );
    }

    #[test]
    fn inactive_records_are_skipped() {
        let mut stopped = instance("m5.large", "us-east-1a");
        stopped.state = Some("stopped".to_string());
        let mut retired = reservation("Custom", "m5.large", None, 3);
        retired.state = Some("retired".to_string());

        let raw = RawInventory {
            instances: vec![stopped],
            reservations: vec![retired],
            ..RawInventory::default()
        };
        // The retired record is skipped before its scope is inspected.
        let inv = normalize(&raw).unwrap();
        assert_eq!(inv, Inventory::empty());
    }

    #[test]
    fn padded_scope_is_unknown() {
        let raw = RawInventory {
            reservations: vec![reservation(" Region ", "t2.micro", None, 1)],
            ..RawInventory::default()
        };
        assert_eq!(
            normalize(&raw),
            Err(SnapshotAdapterError::UnknownScope {
                raw: " Region ".to_string()
            })
        );
    }

    #[test]
    fn padded_type_and_zone_are_distinct_keys() {
        let raw = RawInventory {
            instances: vec![instance("m3.medium ", "us-east-1a")],
            reservations: vec![reservation(
                "Availability Zone",
                "m3.medium",
                Some(" us-east-1a"),
                1,
            )],
            ..RawInventory::default()
        };
        let inv = normalize(&raw).unwrap();
        assert_eq!(inv.running[&InstanceKey::zonal("m3.medium ", "us-east-1a")], 1);
        assert_eq!(inv.zone_reservations[&InstanceKey::zonal("m3.medium", " us-east-1a")], 1);

        let r = inv.reconcile(AllocationPolicy::KeyOrder);
        assert_eq!(r.delta(&InstanceKey::zonal("m3.medium ", "us-east-1a")), -1);
        assert_eq!(r.delta(&InstanceKey::zonal("m3.medium", " us-east-1a")), 1);
        assert_eq!(r.len(), 2);
    }

    #[test]
    fn state_match_is_exact() {
        let mut capitalized = instance("m5.large", "us-east-1a");
        capitalized.state = Some("Running".to_string());
        let mut padded = reservation("Region", "m5.large", None, 2);
        padded.state = Some(" active ".to_string());
        let mut running = instance("m5.large", "us-east-1b");
        running.state = Some("running".to_string());

        let raw = RawInventory {
            instances: vec![capitalized, running],
            reservations: vec![padded],
            ..RawInventory::default()
        };
        let inv = normalize(&raw).unwrap();
        assert_eq!(inv.total_running(), 1);
        assert_eq!(inv.running[&InstanceKey::zonal("m5.large", "us-east-1b")], 1);
        assert_eq!(inv.total_reserved(), 0);
    }

    #[test]
    fn normalize_json_accepts_minimal_document() {
        let json = r#"{
            "instances": [
                { "instance_type": "m3.medium", "availability_zone": "us-east-1a", "state": "running" }
            ],
            "reservations": [
                { "scope": "Region", "instance_type": "m3.medium", "instance_count": 5, "state": "active" }
            ]
        }"#;
        let inv = normalize_json(json).unwrap();
        let r = inv.reconcile(AllocationPolicy::KeyOrder);
        assert_eq!(r.delta(&InstanceKey::regional("m3.medium")), 4);
        assert_eq!(r.total_uncovered(), 0);
    }
}
