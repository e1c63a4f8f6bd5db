//! pzb-engine
//!
//! Pooled pizza order: ledger + allocation engine.
//! - Per-requester slice requests (upsert / withdraw / reset)
//! - Required pizza count from aggregate demand (ceiling division)
//! - Cost split under a configurable fairness policy
//! - Command interpretation and reply rendering for chat-style transports
//! - Pure deterministic logic (no IO, no time, no transport wiring)

mod error;
mod types;

pub mod allocator;
pub mod command;
pub mod desk;
pub mod ledger;
pub mod render;

pub use allocator::{allocate, query_total, required_packages, Allocator};
pub use command::Command;
pub use desk::{apply, evaluate, OrderDesk, Outcome};
pub use error::EngineError;
pub use ledger::{checked_total_requested, total_requested, Ledger, LedgerSnapshot, RequestUpdate};
pub use render::{render_error, render_help, render_outcome, round_cents, Vocabulary};
pub use types::{AllocationResult, FairnessPolicy, Share};

/// Units (slices) per package (pizza) unless configured otherwise.
pub const DEFAULT_PACKAGE_SIZE: u64 = 8;

/// Helper to build a ledger from `(requester, units)` pairs with minimal
/// boilerplate. Pairs apply in order: a zero withdraws any earlier entry for
/// that requester, a negative count is rejected.
pub fn ledger_from<I, S>(items: I) -> Result<Ledger, EngineError>
where
    I: IntoIterator<Item = (S, i64)>,
    S: Into<String>,
{
    let mut ledger = Ledger::new();
    for (requester, units) in items {
        ledger.set_request(requester, units)?;
    }
    Ok(ledger)
}
