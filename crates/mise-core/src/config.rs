//! Configuration for costing and graph diagnostics.
//!
//! Load order: `mise.toml` → environment variables → defaults.

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Top-level costing configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CostingConfig {
    pub calculator: CalculatorConfig,
    pub graph: GraphConfig,
}

/// Calculator settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CalculatorConfig {
    /// Maximum recipe-in-recipe nesting depth. The graph's acyclicity
    /// check already bounds recursion; this is the circuit breaker
    /// behind it. Default: 32.
    pub max_depth: usize,
    /// VAT rate percentage applied when a costing policy is flagged
    /// VAT-inclusive. Default: 20.0 (UK standard rate).
    pub vat_rate: f64,
}

/// Graph diagnostics settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Maximum number of paths returned by exhaustive path search.
    pub path_limit: usize,
}

impl Default for CalculatorConfig {
    fn default() -> Self {
        Self {
            max_depth: 32,
            vat_rate: 20.0,
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self { path_limit: 64 }
    }
}

/// Helper to parse an env var and apply it to a config field.
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var)
        && let Ok(n) = v.parse()
    {
        *target = n;
    }
}

impl CostingConfig {
    /// Load config from `mise.toml` in the project root, with env var
    /// overrides. Falls back to defaults if no config file exists.
    pub fn load(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("mise.toml");

        let mut config = if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            toml::from_str(&content)?
        } else {
            Self::default()
        };

        env_override("MISE_MAX_DEPTH", &mut config.calculator.max_depth);
        env_override("MISE_VAT_RATE", &mut config.calculator.vat_rate);
        env_override("MISE_PATH_LIMIT", &mut config.graph.path_limit);

        if config.calculator.max_depth == 0 {
            anyhow::bail!("calculator.max_depth must be at least 1");
        }
        if !(0.0..100.0).contains(&config.calculator.vat_rate) {
            anyhow::bail!(
                "calculator.vat_rate ({}) must be in [0, 100)",
                config.calculator.vat_rate
            );
        }

        Ok(config)
    }
}
