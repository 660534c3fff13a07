use crate::application::optimization::range_parser::{RangeValue, parse_range};
use crate::domain::optimization::ParameterGrid;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A parameter grid written as range expressions, as typed on the command
/// line or stored in a TOML grid file. Missing keys fall back to defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridSpec {
    pub starting_balance: Option<f64>,
    pub trials_per_combo: Option<usize>,
    pub bet_div: String,
    pub profit_mult: String,
    pub win_increase_pct: String,
    pub loss_reset: String,
    pub buffer_pct: String,
}

impl Default for GridSpec {
    fn default() -> Self {
        Self {
            starting_balance: None,
            trials_per_combo: None,
            bet_div: "256,500".to_string(),
            profit_mult: "50,100".to_string(),
            win_increase_pct: "50,100".to_string(),
            loss_reset: "3-5".to_string(),
            buffer_pct: "25,30,40".to_string(),
        }
    }
}

impl GridSpec {
    pub fn load_toml(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .context(format!("Failed to read grid config file: {}", path.display()))?;
        let spec: GridSpec = toml::from_str(&content)
            .context(format!("Failed to parse grid config TOML: {}", path.display()))?;
        Ok(spec)
    }

    /// Expands every range. An expression that parses to nothing is an error.
    pub fn to_grid(&self) -> Result<ParameterGrid> {
        Ok(ParameterGrid {
            bet_div: expand("bet_div", &self.bet_div)?,
            profit_mult: expand("profit_mult", &self.profit_mult)?,
            win_increase_pct: expand("win_increase_pct", &self.win_increase_pct)?,
            loss_reset: expand("loss_reset", &self.loss_reset)?,
            buffer_pct: expand("buffer_pct", &self.buffer_pct)?,
        })
    }
}

fn expand<T: RangeValue>(name: &str, text: &str) -> Result<Vec<T>> {
    let values = parse_range::<T>(text).with_context(|| format!("Invalid {name} range"))?;
    if values.is_empty() {
        anyhow::bail!("{} range '{}' has no values", name, text);
    }
    Ok(values)
}
