//! pzb-engine: allocator
//!
//! Responsibilities (pure, no IO):
//! - Convert aggregate demand into a whole number of packages.
//! - Split a known total cost back across requesters under a
//!   [`FairnessPolicy`].
//! - Report leftover units that nobody was assigned.
//!
//! Design notes:
//! - Unit counts are integers; only they are floored / ceiled.
//! - Costs are plain `f64` and are never rounded here. Rounding to cents is a
//!   presentation concern (see [`crate::render::round_cents`]).
//! - The input snapshot is only read; every result is a freshly built map.

use std::collections::BTreeMap;

use crate::{
    error::EngineError,
    ledger::{checked_total_requested, LedgerSnapshot},
    types::{AllocationResult, FairnessPolicy, Share},
    DEFAULT_PACKAGE_SIZE,
};

// ─── Package count ───────────────────────────────────────────────────────────

/// `ceil(total_requested / package_size)`; never truncates demand.
///
/// Returns 0 for zero demand. Callers guarantee `package_size >= 1`.
pub fn required_packages(total_requested: u64, package_size: u64) -> u64 {
    total_requested.div_ceil(package_size)
}

/// Packages needed to cover every request in `snapshot`.
///
/// # Errors
/// [`EngineError::InvalidPackageSize`] for a zero package size,
/// [`EngineError::EmptyLedger`] when nothing has been requested,
/// [`EngineError::InvalidRequest`] when total demand overflows.
pub fn query_total(snapshot: &LedgerSnapshot, package_size: u64) -> Result<u64, EngineError> {
    if package_size == 0 {
        return Err(EngineError::InvalidPackageSize);
    }
    let total = checked_total_requested(snapshot)?;
    if total == 0 {
        return Err(EngineError::EmptyLedger);
    }
    Ok(required_packages(total, package_size))
}

// ─── Allocate ────────────────────────────────────────────────────────────────

/// Price a snapshot.
///
/// # Algorithm
///
/// 1. Validate inputs (package size, cost, non-empty demand).
/// 2. `required = ceil(total_requested / package_size)`,
///    `available = required * package_size`.
/// 3. Split by policy:
///    - proportional scaling: assigned = `floor(requested * available / total)`,
///      owed = `cost * requested / total`, leftover = `available - Σ assigned`;
///    - even split of extras: assigned = requested,
///      leftover = `available - total`, owed =
///      `(requested + leftover / requesters) * cost / available`.
pub fn allocate(
    snapshot: &LedgerSnapshot,
    package_size: u64,
    total_cost: f64,
    policy: FairnessPolicy,
) -> Result<AllocationResult, EngineError> {
    // ── 0. Guard inputs ──────────────────────────────────────────────────────
    if package_size == 0 {
        return Err(EngineError::InvalidPackageSize);
    }
    if !total_cost.is_finite() || total_cost < 0.0 {
        return Err(EngineError::InvalidCost { cost: total_cost });
    }
    let total_requested = checked_total_requested(snapshot)?;
    if total_requested == 0 {
        return Err(EngineError::EmptyLedger);
    }

    // ── 1. Packages and available units ──────────────────────────────────────
    let required = required_packages(total_requested, package_size);
    let total_available = required
        .checked_mul(package_size)
        .ok_or_else(|| EngineError::invalid_request("total demand too large"))?;

    // ── 2. Policy split ──────────────────────────────────────────────────────
    let (shares, leftover_units) = match policy {
        FairnessPolicy::ProportionalScaling => {
            proportional_scaling(snapshot, total_requested, total_available, total_cost)?
        }
        FairnessPolicy::EvenSplitOfExtras => {
            even_split_of_extras(snapshot, total_requested, total_available, total_cost)
        }
    };

    Ok(AllocationResult {
        policy,
        package_size,
        total_cost,
        total_requested,
        total_available,
        required_packages: required,
        leftover_units,
        shares,
    })
}

fn proportional_scaling(
    snapshot: &LedgerSnapshot,
    total_requested: u64,
    total_available: u64,
    total_cost: f64,
) -> Result<(BTreeMap<String, Share>, u64), EngineError> {
    let mut shares = BTreeMap::new();
    let mut assigned_sum = 0u64;

    for (requester, &requested) in &snapshot.requests {
        // requested / (total / available), kept exact in integers.
        let scaled = u128::from(requested) * u128::from(total_available)
            / u128::from(total_requested);
        let assigned = u64::try_from(scaled)
            .map_err(|_| EngineError::invalid_request("total demand too large"))?;
        // Each floor is <= its exact share of `total_available`, so the sum
        // cannot pass it.
        assigned_sum += assigned;

        shares.insert(
            requester.clone(),
            Share {
                requested,
                assigned,
                owed: total_cost * requested as f64 / total_requested as f64,
            },
        );
    }

    Ok((shares, total_available - assigned_sum))
}

fn even_split_of_extras(
    snapshot: &LedgerSnapshot,
    total_requested: u64,
    total_available: u64,
    total_cost: f64,
) -> (BTreeMap<String, Share>, u64) {
    let cost_per_unit = total_cost / total_available as f64;
    let leftover = total_available - total_requested;
    let extra_each = leftover as f64 / snapshot.requester_count() as f64;

    let shares = snapshot
        .requests
        .iter()
        .map(|(requester, &requested)| {
            let share = Share {
                requested,
                assigned: requested,
                owed: (requested as f64 + extra_each) * cost_per_unit,
            };
            (requester.clone(), share)
        })
        .collect();

    (shares, leftover)
}

// ─── Allocator ───────────────────────────────────────────────────────────────

/// Allocation engine bound to one deployment's policy and package size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Allocator {
    policy: FairnessPolicy,
    package_size: u64,
}

impl Allocator {
    pub fn new(policy: FairnessPolicy, package_size: u64) -> Self {
        Self {
            policy,
            package_size,
        }
    }

    pub fn policy(&self) -> FairnessPolicy {
        self.policy
    }

    pub fn package_size(&self) -> u64 {
        self.package_size
    }

    pub fn query_total(&self, snapshot: &LedgerSnapshot) -> Result<u64, EngineError> {
        query_total(snapshot, self.package_size)
    }

    pub fn allocate(
        &self,
        snapshot: &LedgerSnapshot,
        total_cost: f64,
    ) -> Result<AllocationResult, EngineError> {
        allocate(snapshot, self.package_size, total_cost, self.policy)
    }
}

impl Default for Allocator {
    fn default() -> Self {
        Self::new(FairnessPolicy::default(), DEFAULT_PACKAGE_SIZE)
    }
}

// ─── Tests ────────────────────────────────────────────────────────────────────
