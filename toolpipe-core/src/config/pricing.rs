use serde::{Deserialize, Serialize};

use super::defaults::{DEFAULT_INPUT_PER_TOKEN, DEFAULT_OUTPUT_PER_TOKEN};
use super::error::ConfigError;

/// Flat per-token prices used for cost estimates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pricing {
    #[serde(default = "default_input")]
    pub input_per_token: f64,
    #[serde(default = "default_output")]
    pub output_per_token: f64,
}

impl Default for Pricing {
    fn default() -> Self {
        Self {
            input_per_token: DEFAULT_INPUT_PER_TOKEN,
            output_per_token: DEFAULT_OUTPUT_PER_TOKEN,
        }
    }
}

fn default_input() -> f64 {
    DEFAULT_INPUT_PER_TOKEN
}

fn default_output() -> f64 {
    DEFAULT_OUTPUT_PER_TOKEN
}

impl Pricing {
    pub(super) fn validated(self) -> Result<Self, ConfigError> {
        let valid = |v: f64| v.is_finite() && v >= 0.0;
        if valid(self.input_per_token) && valid(self.output_per_token) {
            Ok(self)
        } else {
            Err(ConfigError::InvalidPricing)
        }
    }
}
