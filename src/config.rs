use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("ngram_length must be at least 1 (got {0})")]
    InvalidNGramLength(usize),
    #[error("ngram_density must be in (0, 1] (got {0})")]
    InvalidDensity(f64),
    #[error("admittance_threshold must be a non-negative number (got {0})")]
    InvalidThreshold(f64),
    #[error("elongation_factor must be between 1 and {max} (got {0})", max = MAX_ELONGATION_FACTOR)]
    InvalidElongationFactor(usize),
    #[error("fraction_to_match must be in (0, 1] (got {0})")]
    InvalidFractionToMatch(f64),
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Largest accepted `elongation_factor`.
pub const MAX_ELONGATION_FACTOR: usize = 1024;

/// Matching parameters, read-only for the duration of a query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub ngram_length: usize,
    /// Minimum fraction of window n-gram positions that must be occupied by
    /// query n-grams for a pivot to become a candidate.
    pub ngram_density: f64,
    /// Maximum normalized distance for a promoted location to be admitted.
    pub admittance_threshold: f64,
    pub elongation_factor: usize,
    pub fraction_to_match: f64,
    pub parallel_matching: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            ngram_length: 3,
            ngram_density: 0.33,
            admittance_threshold: 0.5,
            elongation_factor: 2,
            fraction_to_match: 0.5,
            parallel_matching: false,
        }
    }
}

fn in_unit_interval(x: f64) -> bool {
    x > 0.0 && x <= 1.0
}

impl MatchConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let cfg: MatchConfig = serde_json::from_str(&text)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ngram_length == 0 {
            return Err(ConfigError::InvalidNGramLength(self.ngram_length));
        }
        if !in_unit_interval(self.ngram_density) {
            return Err(ConfigError::InvalidDensity(self.ngram_density));
        }
        if self.admittance_threshold.is_nan() || self.admittance_threshold < 0.0 {
            return Err(ConfigError::InvalidThreshold(self.admittance_threshold));
        }
        if self.elongation_factor == 0 || self.elongation_factor > MAX_ELONGATION_FACTOR {
            return Err(ConfigError::InvalidElongationFactor(self.elongation_factor));
        }
        if !in_unit_interval(self.fraction_to_match) {
            return Err(ConfigError::InvalidFractionToMatch(self.fraction_to_match));
        }
        Ok(())
    }
}
