//! Request ledger for the current pooled order.
//!
//! # Purpose
//! Holds requester -> requested slices for one order cycle and owns the
//! invariant boundary:
//!
//! - Requesters present in the ledger always have `units >= 1`; a request for
//!   zero removes the requester instead of storing a zero.
//! - Negative unit counts, empty requester identities and requests that would
//!   push total demand past `u64::MAX` are rejected and the ledger is **not**
//!   mutated.
//! - Reads go through [`LedgerSnapshot`], an owned copy that pricing runs on
//!   while further mutations may happen elsewhere.
//!
//! # Usage
//! ```ignore
//! let mut ledger = Ledger::new();
//! ledger.set_request("alice", 3)?;
//! let snap = ledger.snapshot();
//! assert_eq!(snap.total_requested(), 3);
//! ```
//!
//! # Ownership
//! There is no global ledger. Transports own one and hand it to the desk
//! explicitly; tests build a fresh one each.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

// ---------------------------------------------------------------------------
// RequestUpdate
// ---------------------------------------------------------------------------

/// Result of a single [`Ledger::set_request`] call.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestUpdate {
    pub requester: String,
    /// Post-mutation unit count (0 if removed or never present).
    pub units: u64,
    /// Unit count before the call (`None` if the requester was absent).
    pub previous: Option<u64>,
}

impl RequestUpdate {
    /// `true` if a zero request found nothing to remove.
    pub fn is_noop_withdrawal(&self) -> bool {
        self.units == 0 && self.previous.is_none()
    }
}

// ---------------------------------------------------------------------------
// Snapshot (read-only view)
// ---------------------------------------------------------------------------

/// A point-in-time read-only copy of the ledger.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerSnapshot {
    /// Order cycle the snapshot was taken in (starts at 1, +1 per reset).
    pub cycle: u64,
    /// Requester -> requested units. Never contains zero.
    pub requests: BTreeMap<String, u64>,
}

impl LedgerSnapshot {
    pub fn total_requested(&self) -> u64 {
        total_requested(self)
    }

    pub fn requester_count(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Requested units for a requester (0 if absent).
    pub fn units_for(&self, requester: &str) -> u64 {
        self.requests.get(requester).copied().unwrap_or(0)
    }
}

/// Sum of all unit counts in a snapshot; 0 for an empty snapshot.
///
/// Exact for every snapshot a [`Ledger`] produces. A hand-built snapshot whose
/// sum does not fit reads as `u64::MAX` here; pricing goes through
/// [`checked_total_requested`] and refuses it instead.
pub fn total_requested(snapshot: &LedgerSnapshot) -> u64 {
    checked_total_requested(snapshot).unwrap_or(u64::MAX)
}

/// Sum of all unit counts, or [`EngineError::InvalidRequest`] on overflow.
pub fn checked_total_requested(snapshot: &LedgerSnapshot) -> Result<u64, EngineError> {
    checked_sum(snapshot.requests.values().copied())
}

fn checked_sum(units: impl IntoIterator<Item = u64>) -> Result<u64, EngineError> {
    units
        .into_iter()
        .try_fold(0u64, |acc, u| acc.checked_add(u))
        .ok_or_else(|| EngineError::invalid_request("total demand too large"))
}

// ---------------------------------------------------------------------------
// Ledger
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ledger {
    requests: BTreeMap<String, u64>,
    cycle: u64,
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

impl Ledger {
    pub fn new() -> Self {
        Self {
            requests: BTreeMap::new(),
            cycle: 1,
        }
    }

    // -----------------------------------------------------------------------
    // Write surface
    // -----------------------------------------------------------------------

    /// Upsert (`units > 0`) or withdraw (`units == 0`) a request.
    ///
    /// Withdrawing an absent requester is a no-op here; callers that treat it
    /// as an error check [`RequestUpdate::is_noop_withdrawal`].
    ///
    /// # Errors
    /// [`EngineError::InvalidRequest`] for a negative count, an empty
    /// requester, or a count that would overflow total demand. The ledger is
    /// **not** mutated on error.
    pub fn set_request(
        &mut self,
        requester: impl Into<String>,
        units: i64,
    ) -> Result<RequestUpdate, EngineError> {
        let requester = requester.into();
        if requester.trim().is_empty() {
            return Err(EngineError::invalid_request("requester must not be empty"));
        }
        let units = u64::try_from(units).map_err(|_| {
            EngineError::invalid_request(format!("unit count must be >= 0, got {units}"))
        })?;
        if units > 0 {
            let others = self
                .requests
                .iter()
                .filter(|(who, _)| **who != requester)
                .map(|(_, u)| *u);
            checked_sum(others.chain(std::iter::once(units)))?;
        }

        let previous = if units == 0 {
            self.requests.remove(&requester)
        } else {
            self.requests.insert(requester.clone(), units)
        };

        Ok(RequestUpdate {
            requester,
            units,
            previous,
        })
    }

    /// Drop every request and start a new order cycle.
    pub fn reset(&mut self) {
        self.requests = BTreeMap::new();
        self.cycle = self.cycle.saturating_add(1);
    }

    // -----------------------------------------------------------------------
    // Read surface
    // -----------------------------------------------------------------------

    pub fn snapshot(&self) -> LedgerSnapshot {
        LedgerSnapshot {
            cycle: self.cycle,
            requests: self.requests.clone(),
        }
    }

    pub fn units_for(&self, requester: &str) -> u64 {
        self.requests.get(requester).copied().unwrap_or(0)
    }

    pub fn requester_count(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    pub fn cycle(&self) -> u64 {
        self.cycle
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn upsert_then_overwrite() {
        let mut l = Ledger::new();
        let first = l.set_request("alice", 3).unwrap();
        assert_eq!(first.units, 3);
        assert_eq!(first.previous, None);

        let second = l.set_request("alice", 5).unwrap();
        assert_eq!(second.units, 5);
        assert_eq!(second.previous, Some(3));
        assert_eq!(l.units_for("alice"), 5);
        assert_eq!(l.requester_count(), 1);
    }

    #[test]
    fn zero_removes_requester_entirely() {
        let mut l = Ledger::new();
        l.set_request("bob", 4).unwrap();
        let upd = l.set_request("bob", 0).unwrap();
        assert_eq!(upd.units, 0);
        assert_eq!(upd.previous, Some(4));
        assert!(!upd.is_noop_withdrawal());
        assert!(l.is_empty());
        assert!(!l.snapshot().requests.contains_key("bob"));
    }

    #[test]
    fn zero_for_absent_requester_is_noop() {
        let mut l = Ledger::new();
        l.set_request("alice", 2).unwrap();
        let upd = l.set_request("carol", 0).unwrap();
        assert!(upd.is_noop_withdrawal());
        assert_eq!(l.snapshot().requests.len(), 1);
    }

    #[test]
    fn negative_units_rejected_without_mutation() {
        let mut l = Ledger::new();
        l.set_request("alice", 2).unwrap();
        let before = l.snapshot();
        let err = l.set_request("alice", -1).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
        assert_eq!(l.snapshot(), before);
    }

    #[test]
    fn empty_requester_rejected() {
        let mut l = Ledger::new();
        assert_eq!(
            l.set_request("   ", 2).unwrap_err().code(),
            "invalid_request"
        );
        assert!(l.is_empty());
    }

    #[test]
    fn reset_clears_and_advances_cycle() {
        let mut l = Ledger::new();
        assert_eq!(l.cycle(), 1);
        l.set_request("alice", 2).unwrap();
        l.set_request("bob", 7).unwrap();
        l.reset();
        assert!(l.is_empty());
        assert_eq!(l.cycle(), 2);
        assert_eq!(l.snapshot().total_requested(), 0);
    }

    #[test]
    fn snapshot_is_idempotent_and_detached() {
        let mut l = Ledger::new();
        l.set_request("alice", 3).unwrap();
        l.set_request("bob", 1).unwrap();
        let a = l.snapshot();
        let b = l.snapshot();
        assert_eq!(a, b);

        l.set_request("alice", 8).unwrap();
        assert_eq!(a.units_for("alice"), 3, "snapshot must not see later writes");
    }

    #[test]
    fn total_requested_sums_units() {
        let mut l = Ledger::new();
        assert_eq!(total_requested(&l.snapshot()), 0);
        l.set_request("alice", 3).unwrap();
        l.set_request("bob", 1).unwrap();
        assert_eq!(total_requested(&l.snapshot()), 4);
    }

    #[test]
    fn demand_overflow_rejected_without_mutation() {
        let mut l = Ledger::new();
        l.set_request("alice", i64::MAX).unwrap();
        l.set_request("bob", i64::MAX).unwrap();
        let before = l.snapshot();

        let err = l.set_request("carol", i64::MAX).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
        assert!(err.to_string().contains("total demand too large"));
        assert_eq!(l.snapshot(), before);
        assert_eq!(
            checked_total_requested(&before).unwrap(),
            2 * i64::MAX as u64
        );

        // Overwriting your own request only counts the new value.
        l.set_request("bob", i64::MAX - 1).unwrap();
        assert_eq!(l.units_for("bob"), (i64::MAX - 1) as u64);
    }

    #[test]
    fn checked_total_refuses_hand_built_overflow() {
        let mut snap = LedgerSnapshot::default();
        snap.requests.insert("a".into(), u64::MAX);
        snap.requests.insert("b".into(), 1);
        assert_eq!(
            checked_total_requested(&snap).unwrap_err().code(),
            "invalid_request"
        );
    }
}
