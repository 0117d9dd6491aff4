//! Experiment configuration.
//!
//! One file describes a whole experiment: the feature schema, the
//! alternatives, respondent segments and the tunables of each stage. TOML is
//! the primary format; `.json` files are accepted as well.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::domain::{
    validate_alternatives, validate_schema, Alternative, ConjointError, Feature, Result, Segment,
    ValidationError,
};
use crate::estimator::EstimatorConfig;
use crate::simulator::SimulatorConfig;
use crate::taskgen::TaskPlan;

/// Smallest alternative set an experiment can run with.
pub const MIN_ALTERNATIVES: usize = 2;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ExperimentConfig {
    pub name: String,
    pub features: Vec<Feature>,
    pub alternatives: Vec<Alternative>,
    #[serde(default)]
    pub segments: Vec<Segment>,
    #[serde(default)]
    pub tasks: TaskPlan,
    #[serde(default)]
    pub simulator: SimulatorConfig,
    #[serde(default)]
    pub estimator: EstimatorConfig,
    /// Seed for every random stage; a fresh one is drawn when absent.
    #[serde(default)]
    pub seed: Option<u64>,
}

impl ExperimentConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse and validate a JSON document.
    pub fn from_json_str(raw: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from disk; the format follows the file extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        debug!(path = %path.display(), "loading experiment config");
        match path.extension().and_then(|e| e.to_str()) {
            Some("json") => Self::from_json_str(&raw),
            _ => Self::from_toml_str(&raw),
        }
    }

    pub fn validate(&self) -> Result<()> {
        validate_schema(&self.features)?;
        if self.alternatives.len() < MIN_ALTERNATIVES {
            return Err(ValidationError::TooFewAlternatives {
                needed: MIN_ALTERNATIVES,
                found: self.alternatives.len(),
            }
            .into());
        }
        validate_alternatives(&self.features, &self.alternatives)?;

        let mut seen = HashSet::new();
        for segment in &self.segments {
            if !seen.insert(segment.segment_id.as_str()) {
                return Err(ConjointError::InvalidConfig(format!(
                    "duplicate segment id: {}",
                    segment.segment_id
                )));
            }
            segment.validate()?;
        }

        if self.tasks.choice_set_size < 2 {
            return Err(ConjointError::InvalidConfig(format!(
                "choice_set_size must be at least 2, got {}",
                self.tasks.choice_set_size
            )));
        }
        let ci = &self.estimator.bootstrap;
        if !(0.0..=1.0).contains(&ci.lower_quantile)
            || !(0.0..=1.0).contains(&ci.upper_quantile)
            || ci.lower_quantile > ci.upper_quantile
        {
            return Err(ConjointError::InvalidConfig(format!(
                "bootstrap quantiles must satisfy 0 <= lower <= upper <= 1, got {} and {}",
                ci.lower_quantile, ci.upper_quantile
            )));
        }
        Ok(())
    }

    /// Total agents across all segments.
    pub fn agent_count(&self) -> usize {
        self.segments.iter().map(|s| s.count).sum()
    }
}
