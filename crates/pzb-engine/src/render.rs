//! Text replies for chat-style transports.
//!
//! The engine only returns numbers; wording (singular/plural, two-decimal
//! money) is decided here from those numbers.

use serde::{Deserialize, Serialize};

use crate::{
    command::DEFAULT_CURRENCY_MARKER, desk::Outcome, error::EngineError, types::AllocationResult,
};

/// Transport wording: the slash command users type and the money marker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vocabulary {
    pub command_name: String,
    pub currency_marker: String,
}

impl Default for Vocabulary {
    fn default() -> Self {
        Self {
            command_name: "pizza".to_string(),
            currency_marker: DEFAULT_CURRENCY_MARKER.to_string(),
        }
    }
}

impl Vocabulary {
    fn money(&self, amount: f64) -> String {
        format!("{}{:.2}", self.currency_marker, round_cents(amount))
    }

    fn usage(&self, arg: &str) -> String {
        format!("`/{} {}`", self.command_name, arg)
    }
}

/// Round half away from zero to two decimals.
pub fn round_cents(amount: f64) -> f64 {
    (amount * 100.0).round() / 100.0
}

fn count(n: u64, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

fn slices(n: u64) -> String {
    count(n, "slice", "slices")
}

fn pizzas(n: u64) -> String {
    count(n, "pizza", "pizzas")
}

pub fn render_outcome(outcome: &Outcome, vocab: &Vocabulary) -> String {
    match outcome {
        Outcome::RequestRecorded {
            requester, units, ..
        } => format!("{requester} requested {}.", slices(*units)),
        Outcome::RequestWithdrawn {
            requester,
            previous,
        } => format!(
            "{requester} withdrew their request ({}).",
            slices(*previous)
        ),
        Outcome::Reset { .. } => "Values have been reset.".to_string(),
        Outcome::Total {
            required_packages, ..
        } => render_total(*required_packages, vocab),
        Outcome::Breakdown(result) => render_breakdown(result, vocab),
        Outcome::Help => render_help(vocab),
    }
}

fn need_line(required_packages: u64) -> String {
    format!("We need to buy {}.", pizzas(required_packages))
}

fn render_total(required_packages: u64, vocab: &Vocabulary) -> String {
    let what = if required_packages == 1 {
        "pizza"
    } else {
        "pizzas"
    };
    format!(
        "{}\nPlease enter the total cost of the {what} (example: {}).",
        need_line(required_packages),
        vocab.usage(&format!("{}12.34", vocab.currency_marker))
    )
}

fn render_breakdown(result: &AllocationResult, vocab: &Vocabulary) -> String {
    let mut out = need_line(result.required_packages);
    out.push_str("\nHere is the breakdown:\n");
    for (requester, share) in &result.shares {
        out.push_str(&format!(
            "- **{requester}** gets {} for **{}** (requested {})\n",
            slices(share.assigned),
            vocab.money(share.owed),
            share.requested
        ));
    }
    if result.leftover_units == 1 {
        out.push_str("There will be 1 extra slice.");
    } else {
        out.push_str(&format!(
            "There will be {} extra slices.",
            result.leftover_units
        ));
    }
    out
}

pub fn render_error(err: &EngineError, vocab: &Vocabulary) -> String {
    match err {
        EngineError::EmptyLedger => "Error: No slices have been requested yet.".to_string(),
        EngineError::InvalidCost { .. } => {
            let example = vocab.usage(&format!("{}24.50", vocab.currency_marker));
            format!("Error: the total cost must be a non-negative amount, like {example}.")
        }
        EngineError::InvalidRequest { reason } => format!("Error: invalid value ({reason})."),
        EngineError::InvalidPackageSize => {
            "Error: the pizza size is misconfigured; ask an operator.".to_string()
        }
    }
}

pub fn render_help(vocab: &Vocabulary) -> String {
    let marker = &vocab.currency_marker;
    [
        "Welcome to the pizza ordering bot!".to_string(),
        format!("Enter a command like this: {}", vocab.usage("<command>")),
        "Here are the available commands:".to_string(),
        format!("{} (Display this help message)", vocab.usage("help")),
        format!("{} (Reset all values)", vocab.usage("reset")),
        format!(
            "{} (Calculate the number of pizzas needed)",
            vocab.usage("total")
        ),
        format!(
            "{} (Set the total cost to {marker}N and calculate how much each person owes)",
            vocab.usage(&format!("{marker}N"))
        ),
        format!("{} (Request N slices)", vocab.usage("N")),
        format!("{} (Withdraw your request)", vocab.usage("0")),
    ]
    .join("\n")
}
