use std::{fmt, fs, path::Path};

use serde::{Deserialize, Serialize};

const DEFAULT_SEARCH_CONFIG_YAML: &str = include_str!("../../config/search.default.yaml");

/// Numeric tolerance used by bound comparisons and tie-breaking.
pub const TINY: f64 = 1e-6;

/// A large sentinel value for bound initialization.
pub const INF: f64 = f64::INFINITY;

/// Search configuration for the anytime trial loop.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Scenarios sampled per belief node (K).
    pub n_particles: usize,
    /// Maximum depth of any trial.
    pub search_depth: usize,
    /// Reward discount, in `(0, 1]`.
    pub discount: f64,
    /// Per-node penalty for the pruning pass; 0 disables pruning.
    pub pruning_constant: f64,
    /// Regularization weight in the excess-uncertainty gate, in `(0, 1)`.
    pub xi: f64,
    /// Hard cap on trials per search; 0 means time-budget only.
    pub max_trials: usize,
}

impl Default for SearchConfig {
    fn default() -> Self {
        SearchConfig {
            n_particles: 500,
            search_depth: 90,
            discount: 0.95,
            pruning_constant: 0.0,
            xi: 0.95,
            max_trials: 0,
        }
    }
}

impl SearchConfig {
    /// Parse a search config from YAML text.
    pub fn from_yaml_str(yaml: &str) -> Result<Self, SearchConfigError> {
        let config: SearchConfig = serde_yaml::from_str(yaml).map_err(SearchConfigError::Yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse a search config from a YAML file path.
    pub fn from_yaml_path(path: impl AsRef<Path>) -> Result<Self, SearchConfigError> {
        let yaml = fs::read_to_string(path).map_err(SearchConfigError::Io)?;
        Self::from_yaml_str(&yaml)
    }

    /// Return the default YAML config included with this crate.
    pub fn default_yaml() -> &'static str {
        DEFAULT_SEARCH_CONFIG_YAML
    }

    /// Parse the default YAML config included with this crate.
    pub fn from_default_yaml() -> Result<Self, SearchConfigError> {
        Self::from_yaml_str(Self::default_yaml())
    }

    pub(crate) fn validate(&self) -> Result<(), SearchConfigError> {
        if self.n_particles == 0 {
            return Err(SearchConfigError::Invalid(
                "n_particles must be greater than 0".to_string(),
            ));
        }
        if self.search_depth == 0 {
            return Err(SearchConfigError::Invalid(
                "search_depth must be greater than 0".to_string(),
            ));
        }
        if !self.discount.is_finite() || self.discount <= 0.0 || self.discount > 1.0 {
            return Err(SearchConfigError::Invalid(
                "discount must be in (0, 1]".to_string(),
            ));
        }
        if !self.pruning_constant.is_finite() || self.pruning_constant < 0.0 {
            return Err(SearchConfigError::Invalid(
                "pruning_constant must be finite and >= 0".to_string(),
            ));
        }
        // With xi >= 1 the root gate (1 - xi)(U - L) > 1e-6 can never pass
        // and search would return without a single trial.
        if !self.xi.is_finite() || self.xi <= 0.0 || self.xi >= 1.0 {
            return Err(SearchConfigError::Invalid(
                "xi must be in the open interval (0, 1)".to_string(),
            ));
        }
        Ok(())
    }
}

/// Error type for loading and validating `SearchConfig`.
#[derive(Debug)]
pub enum SearchConfigError {
    Io(std::io::Error),
    Yaml(serde_yaml::Error),
    Invalid(String),
}

impl fmt::Display for SearchConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchConfigError::Io(err) => write!(f, "failed to read config file: {err}"),
            SearchConfigError::Yaml(err) => write!(f, "failed to parse config YAML: {err}"),
            SearchConfigError::Invalid(err) => write!(f, "invalid search config: {err}"),
        }
    }
}

impl std::error::Error for SearchConfigError {}
