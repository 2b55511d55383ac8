use std::collections::BTreeMap;

use crate::{tally, AllocationPolicy, CountMap, InstanceKey, Reconciliation};

/// Deterministic reconciliation with the default [`AllocationPolicy::KeyOrder`].
///
/// See [`reconcile_with`].
pub fn reconcile(
    running: &CountMap,
    zone_reservations: &CountMap,
    region_reservations: CountMap,
) -> Reconciliation {
    reconcile_with(
        AllocationPolicy::KeyOrder,
        running,
        zone_reservations,
        region_reservations,
    )
}

/// Reconcile running instances against zone- and region-scoped reservations.
///
/// 1) Every running instance starts uncovered (`-running`).
/// 2) Zone-scoped reservations cover their exact `(type, zone)` key.
/// 3) Remaining deficits borrow from the region pool of their type, shared
///    between zones according to `policy`.
/// 4) Whatever is left in the region pool is reported as unused, keyed
///    `(type, "")`.
///
/// The region pool is taken by value: it is consumed while matching.
/// All counts must be nonnegative.
pub fn reconcile_with(
    policy: AllocationPolicy,
    running: &CountMap,
    zone_reservations: &CountMap,
    region_reservations: CountMap,
) -> Reconciliation {
    // 1) Seed deficits
    let mut deltas: BTreeMap<InstanceKey, i64> = running
        .iter()
        .map(|(key, n)| (key.clone(), -n))
        .collect();

    // 2) Zone-scoped coverage
    for (key, n) in zone_reservations {
        *deltas.entry(key.clone()).or_insert(0) += n;
    }

    // 3) Borrow from the region pool
    let mut pool = region_pool(region_reservations);
    match policy {
        AllocationPolicy::KeyOrder => borrow_in_key_order(&mut deltas, &mut pool),
        AllocationPolicy::FairShare => borrow_fair_share(&mut deltas, &mut pool),
    }

    // 4) Flush leftover region capacity
    for (key, have) in pool {
        if have > 0 {
            *deltas.entry(key).or_insert(0) += have;
        }
    }

    Reconciliation::from_deltas(deltas)
}

/// Collapse region reservations onto `(type, "")` keys, dropping empty entries.
fn region_pool(region_reservations: CountMap) -> CountMap {
    let mut pool = CountMap::new();
    for (key, n) in region_reservations {
        if n > 0 {
            tally(&mut pool, InstanceKey::regional(key.instance_type), n);
        }
    }
    pool
}

fn borrow_in_key_order(deltas: &mut BTreeMap<InstanceKey, i64>, pool: &mut CountMap) {
    for (key, delta) in deltas.iter_mut() {
        if *delta >= 0 {
            continue;
        }
        let pool_key = key.region_pool_key();
        let Some(have) = pool.get_mut(&pool_key) else {
            continue;
        };

        let need = -*delta;
        if need >= *have {
            // Pool exhausted by this key.
            *delta += *have;
            pool.remove(&pool_key);
        } else {
            *delta = 0;
            *have -= need;
        }
    }
}

fn borrow_fair_share(deltas: &mut BTreeMap<InstanceKey, i64>, pool: &mut CountMap) {
    // Group deficits by the pool they draw from. Claimants stay in key order.
    let mut claims: BTreeMap<InstanceKey, Vec<(InstanceKey, i64)>> = BTreeMap::new();
    for (key, delta) in deltas.iter() {
        if *delta >= 0 {
            continue;
        }
        let pool_key = key.region_pool_key();
        if pool.contains_key(&pool_key) {
            claims.entry(pool_key).or_default().push((key.clone(), -delta));
        }
    }

    for (pool_key, claimants) in claims {
        let Some(have) = pool.get(&pool_key).copied() else {
            continue;
        };
        let total_need: i64 = claimants.iter().map(|(_, need)| need).sum();

        let grants = if total_need <= have {
            claimants
        } else {
            proportional_grants(have, total_need, &claimants)
        };

        let mut granted = 0;
        for (key, grant) in grants {
            if let Some(delta) = deltas.get_mut(&key) {
                *delta += grant;
            }
            granted += grant;
        }

        let left = have - granted;
        if left > 0 {
            pool.insert(pool_key, left);
        } else {
            pool.remove(&pool_key);
        }
    }
}

/// Largest-remainder split of `have` units across claimants (`have < total_need`).
///
/// Every grant is at most the claimant's need and the grants sum to `have`.
fn proportional_grants(
    have: i64,
    total_need: i64,
    claimants: &[(InstanceKey, i64)],
) -> Vec<(InstanceKey, i64)> {
    let have_w = i128::from(have);
    let total_w = i128::from(total_need);

    let mut grants: Vec<(InstanceKey, i64)> = Vec::with_capacity(claimants.len());
    let mut remainders: Vec<(i128, usize)> = Vec::with_capacity(claimants.len());
    let mut assigned: i64 = 0;

    for (idx, (key, need)) in claimants.iter().enumerate() {
        let scaled = have_w * i128::from(*need);
        // floor(have * need / total) < need, so it always fits in i64.
        let share = i64::try_from(scaled / total_w).unwrap_or(*need);
        remainders.push((scaled % total_w, idx));
        grants.push((key.clone(), share));
        assigned += share;
    }

    // Largest remainder first; equal remainders keep key order.
    remainders.sort_by(|a, b| b.0.cmp(&a.0).then(a.1.cmp(&b.1)));

    let leftover = usize::try_from(have - assigned).unwrap_or(0);
    for (_, idx) in remainders.into_iter().take(leftover) {
        if let Some(grant) = grants.get_mut(idx) {
            grant.1 += 1;
        }
    }

    grants
}
