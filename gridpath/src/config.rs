//! Search configuration

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::cost::{CostModel, Heuristic};
use crate::error::{GridError, Result};

/// How the frontier is ordered and when an already discovered node gets a better parent
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Policy {
    /// Expand the lowest `f` first, relax a node when a cheaper `g` is found
    #[default]
    Standard,
    /// Expand the lowest `g` first, relax a node only when its current `f` is below the `f` of
    /// the node being expanded
    Legacy,
}

#[derive(Copy, Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    pub policy: Policy,
    pub costs: CostModel,
    pub heuristic: Heuristic,
}

impl SearchConfig {
    /// Lowest-g expansion with the unscaled Manhattan estimate
    pub fn legacy() -> Self {
        Self {
            policy: Policy::Legacy,
            costs: CostModel::default(),
            heuristic: Heuristic::ManhattanUnscaled,
        }
    }

    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Load a TOML configuration file, missing keys take their default values
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| GridError::Config(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }
}
