//! Request and response types for all pzb-daemon HTTP endpoints.
//!
//! These types are `Serialize + Deserialize` so they can be JSON-encoded
//! by Axum and decoded by tests. No business logic lives here.

use std::collections::BTreeMap;

use pzb_engine::{FairnessPolicy, Outcome};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// ---------------------------------------------------------------------------
// /v1/health
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub service: String,
    pub version: String,
}

// ---------------------------------------------------------------------------
// /v1/status
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub daemon_uptime_secs: u64,
    pub fairness_policy: FairnessPolicy,
    pub package_size: u64,
    pub config_hash: String,
    pub cycle_id: Uuid,
    pub requester_count: usize,
    pub total_requested: u64,
}

// ---------------------------------------------------------------------------
// /v1/ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerResponse {
    pub cycle_id: Uuid,
    pub cycle: u64,
    pub requests: BTreeMap<String, u64>,
    pub total_requested: u64,
}

// ---------------------------------------------------------------------------
// /v1/command
// ---------------------------------------------------------------------------

/// One chat invocation: who typed it and the single free-text argument.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandRequest {
    pub requester: String,
    pub arg: String,
}

/// 200 body. `reply` is the text a chat client posts back verbatim.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandResponse {
    pub ok: bool,
    pub reply: String,
    pub outcome: Outcome,
}

/// 422 body for recoverable engine errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandErrorResponse {
    pub ok: bool,
    pub error: String,
    /// "invalid_request" | "empty_ledger" | "invalid_cost" | "invalid_package_size"
    pub code: String,
    pub reply: String,
}
