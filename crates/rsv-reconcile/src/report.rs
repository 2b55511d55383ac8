use crate::{OnDemandRow, Reconciliation, ReservationReport, UnusedReservationRow};

/// Split a reconciliation into its two report sections.
///
/// - Negative deltas become on-demand rows, one per `(type, zone)`.
/// - Positive deltas become unused-reservation rows; the zone is dropped and
///   rows are not merged.
///
/// Both sections are stably sorted by instance type, so ties keep the
/// engine's key order (zone ascending).
pub fn derive_report(reconciliation: &Reconciliation) -> ReservationReport {
    let mut on_demand: Vec<OnDemandRow> = Vec::new();
    let mut unused: Vec<UnusedReservationRow> = Vec::new();

    for (key, delta) in reconciliation.deltas() {
        if *delta < 0 {
            on_demand.push(OnDemandRow {
                instance_type: key.instance_type.clone(),
                zone: key.zone.clone(),
                count: -delta,
            });
        } else if *delta > 0 {
            unused.push(UnusedReservationRow {
                instance_type: key.instance_type.clone(),
                count: *delta,
            });
        }
    }

    on_demand.sort_by(|a, b| a.instance_type.cmp(&b.instance_type));
    unused.sort_by(|a, b| a.instance_type.cmp(&b.instance_type));

    ReservationReport { on_demand, unused }
}
