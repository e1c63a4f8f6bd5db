//! Command handler modules for pzb-cli.
//!
//! Shared utilities used by multiple command paths live here.
//! Command-specific logic lives in the submodules.

pub mod session;
pub mod split;

use anyhow::{Context, Result};
use pzb_config::{load_settings, report_unused_keys, ConfigConsumer, Settings, UnusedKeyPolicy};
use pzb_engine::FairnessPolicy;
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Shared helpers
// ---------------------------------------------------------------------------

/// Load defaults + `config_paths`, then apply command-line overrides.
pub fn resolve_settings(
    config_paths: &[String],
    policy: Option<&str>,
    package_size: Option<u64>,
) -> Result<Settings> {
    let refs: Vec<&str> = config_paths.iter().map(|s| s.as_str()).collect();
    let (loaded, mut settings) = load_settings(&refs)?;

    let report = report_unused_keys(ConfigConsumer::Cli, &loaded.config_json, UnusedKeyPolicy::Warn)?;
    for leaf in &report.unused_leaf_pointers {
        warn!(leaf = %leaf, "unused config key");
    }
    debug!(config_hash = %loaded.config_hash, "config loaded");

    if let Some(p) = policy {
        settings.order.fairness_policy = parse_policy(p)?;
    }
    if let Some(n) = package_size {
        anyhow::ensure!(n >= 1, "invalid --package-size {n}. expected >= 1");
        settings.order.package_size = n;
    }
    Ok(settings)
}

/// Parse a CLI `--policy` string into a [`FairnessPolicy`].
pub fn parse_policy(raw: &str) -> Result<FairnessPolicy> {
    raw.parse::<FairnessPolicy>()
        .map_err(|e| anyhow::anyhow!("invalid --policy: {e}"))
}

/// Parse `NAME=SLICES` into its parts.
pub fn parse_request_pair(raw: &str) -> Result<(String, i64)> {
    let (name, units) = raw
        .rsplit_once('=')
        .with_context(|| format!("invalid request '{raw}'. expected NAME=SLICES"))?;
    let name = name.trim();
    anyhow::ensure!(!name.is_empty(), "invalid request '{raw}': empty name");
    let units: i64 = units
        .trim()
        .parse()
        .with_context(|| format!("invalid request '{raw}': slices must be an integer"))?;
    Ok((name.to_string(), units))
}
