//! Engine tuning knobs with documented defaults.

use serde::Deserialize;

use crate::error::EngineError;

fn default_tolerance() -> i64 {
    2
}

fn default_offset_min() -> i64 {
    -5
}

fn default_offset_max() -> i64 {
    4
}

fn default_raise() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Accepted |bank_excel_diff| in minor units.
    #[serde(default = "default_tolerance")]
    pub tolerance_minor: i64,
    /// Self-correction day-count perturbation range, inclusive.
    #[serde(default = "default_offset_min")]
    pub correction_offset_min: i64,
    #[serde(default = "default_offset_max")]
    pub correction_offset_max: i64,
    /// When false, unresolved mismatches are returned on the outcome
    /// instead of raised, and the best-effort schedule is still persisted.
    #[serde(default = "default_raise")]
    pub raise_on_mismatch: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance_minor: default_tolerance(),
            correction_offset_min: default_offset_min(),
            correction_offset_max: default_offset_max(),
            raise_on_mismatch: default_raise(),
        }
    }
}

impl EngineConfig {
    pub fn from_toml(text: &str) -> Result<Self, EngineError> {
        toml::from_str(text).map_err(|e| EngineError::ConfigParse(e.to_string()))
    }

    /// Perturbation offsets in trial order.
    pub fn correction_offsets(&self) -> impl Iterator<Item = i64> {
        self.correction_offset_min..=self.correction_offset_max
    }
}
