use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// FairnessPolicy
// ---------------------------------------------------------------------------

/// How the cost (and possibly the units) of leftover slices is distributed.
///
/// Fixed for the lifetime of a running instance.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FairnessPolicy {
    /// Units and cost scale with each requester's share of total demand.
    #[default]
    #[serde(alias = "proportional")]
    ProportionalScaling,
    /// Everyone keeps what they asked for; the leftover slices' cost is split
    /// evenly on top of a uniform per-slice rate.
    #[serde(alias = "even_split")]
    EvenSplitOfExtras,
}

impl FairnessPolicy {
    pub fn as_str(&self) -> &'static str {
        match self {
            FairnessPolicy::ProportionalScaling => "proportional_scaling",
            FairnessPolicy::EvenSplitOfExtras => "even_split_of_extras",
        }
    }
}

impl std::fmt::Display for FairnessPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FairnessPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "proportional_scaling" | "proportional" => Ok(FairnessPolicy::ProportionalScaling),
            "even_split_of_extras" | "even_split" => Ok(FairnessPolicy::EvenSplitOfExtras),
            other => Err(format!(
                "unknown fairness policy '{other}'. expected one of: proportional_scaling | even_split_of_extras"
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// AllocationResult
// ---------------------------------------------------------------------------

/// One requester's slice of the order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Share {
    /// Units the requester asked for.
    pub requested: u64,
    /// Units handed to the requester under the active policy.
    pub assigned: u64,
    /// Unrounded amount owed.
    pub owed: f64,
}

/// The output of one pricing run. Computed fresh per request, never stored.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct AllocationResult {
    pub policy: FairnessPolicy,
    pub package_size: u64,
    pub total_cost: f64,
    pub total_requested: u64,
    /// `required_packages * package_size`.
    pub total_available: u64,
    pub required_packages: u64,
    /// Units in purchased packages that nobody was assigned.
    pub leftover_units: u64,
    /// Requester -> share, ordered by requester.
    pub shares: BTreeMap<String, Share>,
}

impl AllocationResult {
    pub fn share(&self, requester: &str) -> Option<&Share> {
        self.shares.get(requester)
    }

    /// Sum of every requester's owed amount.
    pub fn total_owed(&self) -> f64 {
        self.shares.values().map(|s| s.owed).sum()
    }

    /// Sum of every requester's assigned units.
    pub fn total_assigned(&self) -> u64 {
        self.shares.values().map(|s| s.assigned).sum()
    }
}
