//! `pzb split` — one-shot pricing without a running daemon.

use anyhow::{bail, Context, Result};
use pzb_config::Settings;
use pzb_engine::{command::has_currency_marker, ledger_from, render_outcome, Command, Outcome};
use tracing::info;

use super::parse_request_pair;

/// Build a ledger from `NAME=SLICES` pairs, price it, and return either the
/// chat reply or the allocation as pretty JSON.
pub fn run_split(settings: &Settings, requests: &[String], cost: &str, json: bool) -> Result<String> {
    let vocab = settings.vocabulary();
    let total_cost = parse_cost(cost, &vocab.currency_marker)?;

    let pairs = requests
        .iter()
        .map(|r| parse_request_pair(r))
        .collect::<Result<Vec<_>>>()?;
    let ledger = ledger_from(pairs)?;

    let allocator = settings.allocator();
    let result = allocator.allocate(&ledger.snapshot(), total_cost)?;
    info!(
        policy = %allocator.policy(),
        required_packages = result.required_packages,
        leftover_units = result.leftover_units,
        "split computed"
    );

    if json {
        return serde_json::to_string_pretty(&result).context("serialize allocation failed");
    }
    Ok(render_outcome(&Outcome::Breakdown(result), &vocab))
}

/// Accept `24.50` as well as `$24.50`.
fn parse_cost(raw: &str, marker: &str) -> Result<f64> {
    let raw = raw.trim();
    let arg = if has_currency_marker(raw, marker) {
        raw.to_string()
    } else {
        format!("{marker}{raw}")
    };
    match Command::parse_with_marker(&arg, marker) {
        Command::Price { total_cost } => Ok(total_cost),
        _ => bail!("invalid --cost '{raw}'. expected an amount like 24.50"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pzb_config::{load_layered_yaml_from_strings, DEFAULTS_YAML};

    fn defaults() -> Settings {
        let loaded = load_layered_yaml_from_strings(&[DEFAULTS_YAML]).unwrap();
        Settings::from_config_json(&loaded.config_json).unwrap()
    }

    fn pairs(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn cost_with_or_without_marker() {
        assert_eq!(parse_cost("24.50", "$").unwrap(), 24.5);
        assert_eq!(parse_cost("$24.50", "$").unwrap(), 24.5);
        assert!(parse_cost("cheap", "$").is_err());
    }

    #[test]
    fn cost_marker_matches_any_case() {
        assert_eq!(parse_cost("eur24", "EUR").unwrap(), 24.0);
        assert_eq!(parse_cost("EUR 24.50", "EUR").unwrap(), 24.5);
        assert_eq!(parse_cost("24", "EUR").unwrap(), 24.0);
    }

    #[test]
    fn split_renders_breakdown() {
        let out = run_split(&defaults(), &pairs(&["Alice=3", "Bob=1"]), "10", false).unwrap();
        assert!(out.contains("- **Alice** gets 6 slices for **$7.50** (requested 3)"));
        assert!(out.contains("- **Bob** gets 2 slices for **$2.50** (requested 1)"));
    }

    #[test]
    fn split_json_carries_numbers() {
        let out = run_split(&defaults(), &pairs(&["Alice=2", "Bob=1"]), "10", true).unwrap();
        let v: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(v["leftover_units"], 1);
        assert_eq!(v["shares"]["Alice"]["assigned"], 5);
    }

    #[test]
    fn split_refuses_negative_cost_and_empty_demand() {
        let err = run_split(&defaults(), &pairs(&["Alice=2"]), "-3", false).unwrap_err();
        assert!(err.to_string().contains("total cost"));
        let err = run_split(&defaults(), &pairs(&["Alice=0"]), "10", false).unwrap_err();
        assert!(err.to_string().contains("no slices"));
    }
}
