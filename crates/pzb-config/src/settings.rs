//! Typed view over the merged config.
//!
//! Read once at startup; nothing here changes for the life of the process.

use anyhow::{bail, Context, Result};
use pzb_engine::{Allocator, FairnessPolicy, Vocabulary};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;

use crate::{load_layered_yaml_from_strings, LoadedConfig, DEFAULTS_YAML};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderSettings {
    /// Slices per pizza.
    pub package_size: u64,
    pub fairness_policy: FairnessPolicy,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransportSettings {
    /// Slash command name shown in help text (`/pizza ...`).
    pub command_name: String,
    /// Prefix that marks a total-cost argument (`$12.34`).
    pub currency_marker: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DaemonSettings {
    pub bind_addr: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub order: OrderSettings,
    pub transport: TransportSettings,
    pub daemon: DaemonSettings,
}

impl Settings {
    /// Deserialize and validate. Expects the defaults layer to be merged in.
    pub fn from_config_json(config_json: &Value) -> Result<Self> {
        let settings: Settings = serde_json::from_value(config_json.clone())
            .context("CONFIG_INVALID: config does not match the settings schema")?;
        settings.validate()?;
        Ok(settings)
    }

    fn validate(&self) -> Result<()> {
        if self.order.package_size == 0 {
            bail!("CONFIG_INVALID: /order/package_size must be >= 1");
        }
        let name = self.transport.command_name.trim();
        if name.is_empty() || name.contains(char::is_whitespace) {
            bail!("CONFIG_INVALID: /transport/command_name must be one non-empty word");
        }
        let marker = self.transport.currency_marker.trim();
        if marker.is_empty() {
            bail!("CONFIG_INVALID: /transport/currency_marker must not be empty");
        }
        if marker
            .chars()
            .any(|c| c.is_ascii_digit() || c == '+' || c == '-' || c == '.')
        {
            bail!(
                "CONFIG_INVALID: /transport/currency_marker '{marker}' would be read as part of an amount"
            );
        }
        Ok(())
    }

    pub fn allocator(&self) -> Allocator {
        Allocator::new(self.order.fairness_policy, self.order.package_size)
    }

    pub fn vocabulary(&self) -> Vocabulary {
        Vocabulary {
            command_name: self.transport.command_name.trim().to_string(),
            currency_marker: self.transport.currency_marker.trim().to_string(),
        }
    }
}

/// Load the built-in defaults followed by `paths` (merge order) and return
/// the merged config together with its typed settings.
pub fn load_settings(paths: &[&str]) -> Result<(LoadedConfig, Settings)> {
    let mut docs: Vec<String> = vec![DEFAULTS_YAML.to_string()];
    for p in paths {
        let raw =
            fs::read_to_string(p).with_context(|| format!("failed to read yaml path: {p}"))?;
        docs.push(raw);
    }

    let doc_refs: Vec<&str> = docs.iter().map(|s| s.as_str()).collect();
    let loaded = load_layered_yaml_from_strings(&doc_refs)?;
    let settings = Settings::from_config_json(&loaded.config_json)?;
    Ok((loaded, settings))
}
