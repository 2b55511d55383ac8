use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Identifies a class of compute capacity.
///
/// `zone` is empty for region-scoped entries. Equality and ordering are exact:
/// case-sensitive, no trimming.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InstanceKey {
    pub instance_type: String,
    pub zone: String,
}

impl InstanceKey {
    /// Key for a specific availability zone.
    pub fn zonal(instance_type: impl Into<String>, zone: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            zone: zone.into(),
        }
    }

    /// Key for a region-scoped pool (empty zone).
    pub fn regional(instance_type: impl Into<String>) -> Self {
        Self {
            instance_type: instance_type.into(),
            zone: String::new(),
        }
    }

    /// The region pool this key draws from: same type, zone stripped.
    pub fn region_pool_key(&self) -> InstanceKey {
        InstanceKey::regional(self.instance_type.clone())
    }
}

/// Nonnegative counts keyed by [`InstanceKey`].
///
/// Ordered map so every traversal over it is deterministic.
pub type CountMap = BTreeMap<InstanceKey, i64>;

/// Accumulate `n` into `map[key]`.
pub fn tally(map: &mut CountMap, key: InstanceKey, n: i64) {
    *map.entry(key).or_insert(0) += n;
}

/// Reservation scope discriminator as reported by the provider.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ReservationScope {
    Region,
    AvailabilityZone,
}

impl ReservationScope {
    /// Exact match against the provider's wire values. Anything else is `None`.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "Region" => Some(ReservationScope::Region),
            "Availability Zone" => Some(ReservationScope::AvailabilityZone),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ReservationScope::Region => "Region",
            ReservationScope::AvailabilityZone => "Availability Zone",
        }
    }
}

/// How a region pool is shared when several zone deficits of the same type
/// compete for it and the pool cannot cover all of them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AllocationPolicy {
    /// Serve deficits in ascending key order (type, then zone). Earlier zones
    /// are covered in full before later zones receive anything.
    #[default]
    KeyOrder,
    /// Split the pool proportionally to each zone's deficit. Leftover units
    /// from integer rounding go to the largest fractional remainders, ties to
    /// the lower key.
    FairShare,
}

impl AllocationPolicy {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "key_order" => Some(AllocationPolicy::KeyOrder),
            "fair_share" => Some(AllocationPolicy::FairShare),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AllocationPolicy::KeyOrder => "key_order",
            AllocationPolicy::FairShare => "fair_share",
        }
    }
}

/// Signed per-key deltas produced by the engine.
///
/// Negative = running instances lacking coverage (magnitude = uncovered count).
/// Positive = reserved capacity nobody consumes.
/// Zero-valued keys are never stored.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Reconciliation {
    deltas: BTreeMap<InstanceKey, i64>,
}

impl Reconciliation {
    pub(crate) fn from_deltas(mut deltas: BTreeMap<InstanceKey, i64>) -> Self {
        deltas.retain(|_, v| *v != 0);
        Self { deltas }
    }

    pub fn deltas(&self) -> &BTreeMap<InstanceKey, i64> {
        &self.deltas
    }

    /// Delta for `key`; absent keys are fully matched (0).
    pub fn delta(&self, key: &InstanceKey) -> i64 {
        self.deltas.get(key).copied().unwrap_or(0)
    }

    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    /// `true` when every running instance is covered and every reservation used.
    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Sum of all uncovered running instances.
    pub fn total_uncovered(&self) -> i64 {
        self.deltas.values().filter(|v| **v < 0).map(|v| -v).sum()
    }

    /// Sum of all unused reservation capacity.
    pub fn total_unused(&self) -> i64 {
        self.deltas.values().filter(|v| **v > 0).sum()
    }

    pub fn report(&self) -> ReservationReport {
        crate::derive_report(self)
    }
}

/// A running `(type, zone)` pair with instances not covered by any reservation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnDemandRow {
    pub instance_type: String,
    pub zone: String,
    pub count: i64,
}

/// Reserved capacity of a type that nothing is consuming.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedReservationRow {
    pub instance_type: String,
    pub count: i64,
}

/// Both report sections, each sorted by instance type.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReservationReport {
    pub on_demand: Vec<OnDemandRow>,
    pub unused: Vec<UnusedReservationRow>,
}

impl ReservationReport {
    pub fn is_empty(&self) -> bool {
        self.on_demand.is_empty() && self.unused.is_empty()
    }
}
