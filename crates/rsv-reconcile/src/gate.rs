//! Coverage gate
//!
//! Turns a [`Reconciliation`] into a pass/blocked decision so callers (CLI,
//! scheduled jobs) can fail a run when coverage drifts. The report itself is
//! never suppressed; the gate only decides the outcome.
//!
//! Pure deterministic: no IO, no clock, no randomness.

use crate::Reconciliation;

/// Which discrepancies block the gate. The default blocks on nothing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CoveragePolicy {
    /// Block when any running instance lacks a covering reservation.
    pub fail_on_uncovered: bool,
    /// Block when any reserved capacity is idle.
    pub fail_on_unused: bool,
}

/// Why the gate blocked. Ordered: uncovered before unused.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum CoverageBlock {
    UncoveredInstances { count: i64 },
    UnusedReservations { count: i64 },
}

impl std::fmt::Display for CoverageBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UncoveredInstances { count } => {
                write!(f, "{count} running instance(s) without reservation coverage")
            }
            Self::UnusedReservations { count } => {
                write!(f, "{count} reserved instance(s) unused")
            }
        }
    }
}

/// Result of a coverage gate check.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CoverageGate {
    Pass,
    /// Carries every triggered reason, never empty.
    Blocked { reasons: Vec<CoverageBlock> },
}

impl CoverageGate {
    pub fn is_pass(&self) -> bool {
        matches!(self, CoverageGate::Pass)
    }

    pub fn is_blocked(&self) -> bool {
        !self.is_pass()
    }
}

/// Evaluate `reconciliation` against `policy`.
pub fn check_coverage(reconciliation: &Reconciliation, policy: CoveragePolicy) -> CoverageGate {
    let mut reasons = Vec::new();

    let uncovered = reconciliation.total_uncovered();
    if policy.fail_on_uncovered && uncovered > 0 {
        reasons.push(CoverageBlock::UncoveredInstances { count: uncovered });
    }

    let unused = reconciliation.total_unused();
    if policy.fail_on_unused && unused > 0 {
        reasons.push(CoverageBlock::UnusedReservations { count: unused });
    }

    if reasons.is_empty() {
        CoverageGate::Pass
    } else {
        CoverageGate::Blocked { reasons }
    }
}
