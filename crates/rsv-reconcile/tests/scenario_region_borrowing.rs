//! Region-pool borrowing
//!
//! GREEN when:
//! - A region pool larger than the deficit closes it and reports the excess.
//! - A region pool smaller than the deficit is consumed entirely.
//! - Zone-scoped coverage is applied before the region pool is touched.
//! - An idle zone-scoped reservation is reported as unused.

use rsv_reconcile::*;

fn counts(entries: &[(&str, &str, i64)]) -> CountMap {
    let mut map = CountMap::new();
    for (ty, zone, n) in entries {
        tally(&mut map, InstanceKey::zonal(*ty, *zone), *n);
    }
    map
}

#[test]
fn region_pool_larger_than_deficit_leaves_excess_unused() {
    let running = counts(&[("m3.medium", "us-east-1a", 3)]);
    let region = counts(&[("m3.medium", "", 5)]);

    let r = reconcile(&running, &CountMap::new(), region);

    assert_eq!(r.delta(&InstanceKey::regional("m3.medium")), 2);
    assert_eq!(r.delta(&InstanceKey::zonal("m3.medium", "us-east-1a")), 0);
    assert!(!r
        .deltas()
        .contains_key(&InstanceKey::zonal("m3.medium", "us-east-1a")));

    let report = r.report();
    assert!(report.on_demand.is_empty());
    assert_eq!(
        report.unused,
        vec![UnusedReservationRow {
            instance_type: "m3.medium".to_string(),
            count: 2
        }]
    );
}

#[test]
fn region_pool_smaller_than_deficit_is_consumed() {
    let running = counts(&[("m3.medium", "us-east-1a", 5)]);
    let region = counts(&[("m3.medium", "", 2)]);

    let r = reconcile(&running, &CountMap::new(), region);

    assert_eq!(r.delta(&InstanceKey::zonal("m3.medium", "us-east-1a")), -3);
    assert_eq!(r.len(), 1);

    let report = r.report();
    assert_eq!(
        report.on_demand,
        vec![OnDemandRow {
            instance_type: "m3.medium".to_string(),
            zone: "us-east-1a".to_string(),
            count: 3
        }]
    );
    assert!(report.unused.is_empty());
}

#[test]
fn region_pool_equal_to_deficit_balances() {
    let running = counts(&[("m3.medium", "us-east-1a", 4)]);
    let region = counts(&[("m3.medium", "", 4)]);

    let r = reconcile(&running, &CountMap::new(), region);
    assert!(r.is_empty());
    assert!(r.report().is_empty());
}

#[test]
fn zone_coverage_wins_over_region_pool() {
    let running = counts(&[("c5.large", "us-east-1a", 2)]);
    let zone = counts(&[("c5.large", "us-east-1a", 2)]);
    let region = counts(&[("c5.large", "", 3)]);

    let r = reconcile(&running, &zone, region);

    assert_eq!(r.delta(&InstanceKey::zonal("c5.large", "us-east-1a")), 0);
    // Region pool untouched.
    assert_eq!(r.delta(&InstanceKey::regional("c5.large")), 3);
}

#[test]
fn partial_zone_coverage_tops_up_from_region() {
    let running = counts(&[("c5.large", "us-east-1a", 5)]);
    let zone = counts(&[("c5.large", "us-east-1a", 2)]);
    let region = counts(&[("c5.large", "", 4)]);

    let r = reconcile(&running, &zone, region);

    assert_eq!(r.delta(&InstanceKey::zonal("c5.large", "us-east-1a")), 0);
    assert_eq!(r.delta(&InstanceKey::regional("c5.large")), 1);
}

#[test]
fn region_pool_of_other_type_does_not_cover() {
    let running = counts(&[("c5.large", "us-east-1a", 1)]);
    let region = counts(&[("c5.xlarge", "", 1)]);

    let r = reconcile(&running, &CountMap::new(), region);

    assert_eq!(r.delta(&InstanceKey::zonal("c5.large", "us-east-1a")), -1);
    assert_eq!(r.delta(&InstanceKey::regional("c5.xlarge")), 1);
}

#[test]
fn idle_zone_reservation_is_reported_unused() {
    let zone = counts(&[("t2.micro", "us-east-1b", 4)]);

    let r = reconcile(&CountMap::new(), &zone, CountMap::new());
    let report = r.report();

    assert!(report.on_demand.is_empty());
    assert_eq!(
        report.unused,
        vec![UnusedReservationRow {
            instance_type: "t2.micro".to_string(),
            count: 4
        }]
    );
}

#[test]
fn idle_zone_reservation_is_not_lent_to_other_zone() {
    let running = counts(&[("t2.micro", "us-east-1a", 1)]);
    let zone = counts(&[("t2.micro", "us-east-1b", 1)]);

    let report = reconcile(&running, &zone, CountMap::new()).report();

    assert_eq!(report.on_demand.len(), 1);
    assert_eq!(report.on_demand[0].zone, "us-east-1a");
    assert_eq!(report.unused.len(), 1);
}
