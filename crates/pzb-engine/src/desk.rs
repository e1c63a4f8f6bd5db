//! Command execution against a ledger.
//!
//! Execution is split so a transport can hold the right lock:
//! - [`apply`] takes `&mut Ledger` and handles every mutating command.
//! - [`evaluate`] takes an owned [`LedgerSnapshot`] and handles queries; the
//!   caller clones the snapshot under a shared lock and prices it unlocked.
//!
//! [`OrderDesk`] bundles a ledger with its allocator for single-threaded
//! callers.

use serde::{Deserialize, Serialize};

use crate::{
    allocator::Allocator,
    command::Command,
    error::EngineError,
    ledger::{Ledger, LedgerSnapshot},
    types::AllocationResult,
};

/// Everything a command can produce on success.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Outcome {
    RequestRecorded {
        requester: String,
        units: u64,
        previous: Option<u64>,
    },
    RequestWithdrawn {
        requester: String,
        previous: u64,
    },
    Reset {
        cycle: u64,
    },
    Total {
        total_requested: u64,
        required_packages: u64,
    },
    Breakdown(AllocationResult),
    Help,
}

impl Outcome {
    /// `true` if the ledger changed.
    pub fn mutated(&self) -> bool {
        matches!(
            self,
            Outcome::RequestRecorded { .. } | Outcome::RequestWithdrawn { .. } | Outcome::Reset { .. }
        )
    }
}

/// Execute a mutating command. Query commands are forwarded to [`evaluate`]
/// on a fresh snapshot so callers never have to pre-classify.
pub fn apply(
    ledger: &mut Ledger,
    allocator: &Allocator,
    requester: &str,
    command: &Command,
) -> Result<Outcome, EngineError> {
    match command {
        Command::Request { units } => {
            let update = ledger.set_request(requester, *units)?;
            if update.units > 0 {
                Ok(Outcome::RequestRecorded {
                    requester: update.requester,
                    units: update.units,
                    previous: update.previous,
                })
            } else if let Some(previous) = update.previous {
                Ok(Outcome::RequestWithdrawn {
                    requester: update.requester,
                    previous,
                })
            } else {
                Err(EngineError::invalid_request(
                    "nothing to withdraw, no slices were requested",
                ))
            }
        }
        Command::Oversized { raw } => Err(EngineError::invalid_request(format!(
            "'{raw}' is too large"
        ))),
        Command::Reset => {
            ledger.reset();
            Ok(Outcome::Reset {
                cycle: ledger.cycle(),
            })
        }
        query => evaluate(&ledger.snapshot(), allocator, query),
    }
}

/// Execute a read-only command against a snapshot.
///
/// # Errors
/// [`EngineError::InvalidRequest`] if handed a mutating command, otherwise
/// whatever the allocator reports.
pub fn evaluate(
    snapshot: &LedgerSnapshot,
    allocator: &Allocator,
    command: &Command,
) -> Result<Outcome, EngineError> {
    match command {
        Command::Total => {
            let required_packages = allocator.query_total(snapshot)?;
            Ok(Outcome::Total {
                total_requested: snapshot.total_requested(),
                required_packages,
            })
        }
        Command::Price { total_cost } => allocator
            .allocate(snapshot, *total_cost)
            .map(Outcome::Breakdown),
        Command::Help => Ok(Outcome::Help),
        Command::Request { .. } | Command::Oversized { .. } | Command::Reset => Err(
            EngineError::invalid_request("mutating command cannot run on a snapshot"),
        ),
    }
}

// ---------------------------------------------------------------------------
// OrderDesk
// ---------------------------------------------------------------------------

/// A ledger plus the allocator configured for this deployment.
#[derive(Clone, Debug, Default)]
pub struct OrderDesk {
    ledger: Ledger,
    allocator: Allocator,
}

impl OrderDesk {
    pub fn new(allocator: Allocator) -> Self {
        Self {
            ledger: Ledger::new(),
            allocator,
        }
    }

    pub fn execute(&mut self, requester: &str, command: &Command) -> Result<Outcome, EngineError> {
        if command.is_mutation() {
            apply(&mut self.ledger, &self.allocator, requester, command)
        } else {
            evaluate(&self.ledger.snapshot(), &self.allocator, command)
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn allocator(&self) -> &Allocator {
        &self.allocator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::FairnessPolicy;

    fn desk() -> OrderDesk {
        OrderDesk::new(Allocator::new(FairnessPolicy::ProportionalScaling, 8))
    }

    #[test]
    fn request_then_withdraw() {
        let mut d = desk();
        let out = d.execute("alice", &Command::Request { units: 3 }).unwrap();
        assert_eq!(
            out,
            Outcome::RequestRecorded {
                requester: "alice".into(),
                units: 3,
                previous: None
            }
        );
        let out = d.execute("alice", &Command::Request { units: 0 }).unwrap();
        assert_eq!(
            out,
            Outcome::RequestWithdrawn {
                requester: "alice".into(),
                previous: 3
            }
        );
        assert!(d.ledger().is_empty());
    }

    #[test]
    fn withdraw_without_request_is_invalid() {
        let mut d = desk();
        let err = d.execute("bob", &Command::Request { units: 0 }).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn negative_and_oversized_requests_are_invalid() {
        let mut d = desk();
        assert_eq!(
            d.execute("bob", &Command::Request { units: -1 })
                .unwrap_err()
                .code(),
            "invalid_request"
        );
        assert_eq!(
            d.execute("bob", &Command::Oversized { raw: "9".repeat(30) })
                .unwrap_err()
                .code(),
            "invalid_request"
        );
        assert!(d.ledger().is_empty());
    }

    #[test]
    fn total_and_price_need_requests() {
        let mut d = desk();
        assert_eq!(
            d.execute("x", &Command::Total).unwrap_err(),
            EngineError::EmptyLedger
        );
        assert_eq!(
            d.execute("x", &Command::Price { total_cost: 10.0 }).unwrap_err(),
            EngineError::EmptyLedger
        );

        d.execute("alice", &Command::Request { units: 9 }).unwrap();
        assert_eq!(
            d.execute("x", &Command::Total).unwrap(),
            Outcome::Total {
                total_requested: 9,
                required_packages: 2
            }
        );
    }

    #[test]
    fn reset_reports_new_cycle() {
        let mut d = desk();
        d.execute("alice", &Command::Request { units: 2 }).unwrap();
        let out = d.execute("alice", &Command::Reset).unwrap();
        assert_eq!(out, Outcome::Reset { cycle: 2 });
        assert!(out.mutated());
        assert!(d.ledger().is_empty());
    }

    #[test]
    fn evaluate_refuses_mutations() {
        let snap = LedgerSnapshot::default();
        let err = evaluate(&snap, &Allocator::default(), &Command::Reset).unwrap_err();
        assert_eq!(err.code(), "invalid_request");
    }

    #[test]
    fn apply_forwards_queries() {
        let mut ledger = Ledger::new();
        let a = Allocator::default();
        apply(&mut ledger, &a, "alice", &Command::Request { units: 3 }).unwrap();
        let out = apply(&mut ledger, &a, "alice", &Command::Help).unwrap();
        assert_eq!(out, Outcome::Help);
        assert!(!out.mutated());
    }
}
