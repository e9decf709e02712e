//! Estimator Configuration
//!
//! All tunables of the offset recurrence live in one immutable
//! `EstimatorConfig`, built once at startup and shared behind an `Arc`.
//!
//! ## TOML Format
//!
//! ```toml
//! learning_rate = 0.2
//! min_offset = -3.0
//! max_offset = 3.0
//! seed_policy = "zero_start"   # or "first_event"
//!
//! [score_table]
//! hot = 3.0
//! just_right = 0.0
//! cold = -3.0
//! ```
//!
//! Every key is optional; omitted keys take the defaults shown above.

use crate::error::{CoreError, Result};
use crate::event::{COLD, HOT, JUST_RIGHT};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

pub const DEFAULT_LEARNING_RATE: f64 = 0.2;
pub const DEFAULT_MAX_OFFSET: f64 = 3.0;
pub const DEFAULT_MIN_OFFSET: f64 = -3.0;

/// How the running offset is initialized before the fold
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeedPolicy {
    /// Start at 0.0; every event, including the first, applies the update
    #[default]
    ZeroStart,
    /// Start at `score(first) * learning_rate`; the update applies from the
    /// second event onwards
    FirstEvent,
}

impl std::str::FromStr for SeedPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zero_start" | "zero-start" | "zero" => Ok(SeedPolicy::ZeroStart),
            "first_event" | "first-event" | "seed" => Ok(SeedPolicy::FirstEvent),
            other => Err(CoreError::InvalidConfig(format!(
                "unknown seed policy '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for SeedPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SeedPolicy::ZeroStart => write!(f, "zero_start"),
            SeedPolicy::FirstEvent => write!(f, "first_event"),
        }
    }
}

/// Parameters of the offset recurrence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EstimatorConfig {
    /// Fraction of the remaining gap closed by each event, in (0, 1)
    pub learning_rate: f64,

    pub min_offset: f64,

    pub max_offset: f64,

    pub seed_policy: SeedPolicy,

    /// Feedback label -> target score. Labels not listed score 0.0.
    pub score_table: BTreeMap<String, f64>,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        let mut score_table = BTreeMap::new();
        score_table.insert(HOT.to_string(), DEFAULT_MAX_OFFSET);
        score_table.insert(JUST_RIGHT.to_string(), 0.0);
        score_table.insert(COLD.to_string(), DEFAULT_MIN_OFFSET);

        Self {
            learning_rate: DEFAULT_LEARNING_RATE,
            min_offset: DEFAULT_MIN_OFFSET,
            max_offset: DEFAULT_MAX_OFFSET,
            seed_policy: SeedPolicy::default(),
            score_table,
        }
    }
}

impl EstimatorConfig {
    /// Parse a TOML document and validate it
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: EstimatorConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a TOML configuration file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let contents = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&contents)
    }

    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_bounds(mut self, min_offset: f64, max_offset: f64) -> Self {
        self.min_offset = min_offset;
        self.max_offset = max_offset;
        self
    }

    pub fn with_seed_policy(mut self, seed_policy: SeedPolicy) -> Self {
        self.seed_policy = seed_policy;
        self
    }

    pub fn with_score(mut self, label: impl Into<String>, score: f64) -> Self {
        self.score_table.insert(label.into(), score);
        self
    }

    /// Target score for a label; unknown labels are neutral
    pub fn score_for(&self, label: &str) -> f64 {
        self.score_table.get(label).copied().unwrap_or(0.0)
    }

    pub fn is_known_label(&self, label: &str) -> bool {
        self.score_table.contains_key(label)
    }

    /// Check parameter bounds
    pub fn validate(&self) -> Result<()> {
        if !(self.learning_rate > 0.0 && self.learning_rate < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "learning_rate must be in (0, 1), got {}",
                self.learning_rate
            )));
        }

        if !self.min_offset.is_finite() || !self.max_offset.is_finite() {
            return Err(CoreError::InvalidConfig(
                "offset bounds must be finite".to_string(),
            ));
        }

        if self.min_offset > self.max_offset {
            return Err(CoreError::InvalidConfig(format!(
                "min_offset ({}) exceeds max_offset ({})",
                self.min_offset, self.max_offset
            )));
        }

        if let Some((label, score)) = self.score_table.iter().find(|(_, s)| !s.is_finite()) {
            return Err(CoreError::InvalidConfig(format!(
                "score for '{}' is not finite: {}",
                label, score
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = EstimatorConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.learning_rate, 0.2);
        assert_eq!(config.min_offset, -config.max_offset);
        assert_eq!(config.seed_policy, SeedPolicy::ZeroStart);
    }

    #[test]
    fn test_default_score_table() {
        let config = EstimatorConfig::default();
        assert_eq!(config.score_for("hot"), 3.0);
        assert_eq!(config.score_for("just_right"), 0.0);
        assert_eq!(config.score_for("cold"), -3.0);
        assert_eq!(config.score_for("lukewarm"), 0.0);
        assert!(!config.is_known_label("lukewarm"));
    }

    #[test]
    fn test_learning_rate_bounds() {
        for rate in [0.0, 1.0, -0.1, 1.5, f64::NAN] {
            let config = EstimatorConfig::default().with_learning_rate(rate);
            assert!(
                matches!(config.validate(), Err(CoreError::InvalidConfig(_))),
                "rate {rate} should be rejected"
            );
        }
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = EstimatorConfig::default().with_bounds(2.0, -2.0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_non_finite_score_rejected() {
        let config = EstimatorConfig::default().with_score("hot", f64::INFINITY);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = EstimatorConfig::from_toml_str(
            r#"
            learning_rate = 0.5
            seed_policy = "first_event"
            "#,
        )
        .unwrap();

        assert_eq!(config.learning_rate, 0.5);
        assert_eq!(config.seed_policy, SeedPolicy::FirstEvent);
        assert_eq!(config.max_offset, DEFAULT_MAX_OFFSET);
        assert_eq!(config.score_for("hot"), 3.0);
    }

    #[test]
    fn test_toml_score_table_replaces_default() {
        let config = EstimatorConfig::from_toml_str(
            r#"
            min_offset = -2.0
            max_offset = 2.0

            [score_table]
            hot = 2.0
            cold = -2.0
            "#,
        )
        .unwrap();

        assert_eq!(config.score_for("hot"), 2.0);
        assert!(!config.is_known_label("just_right"));
    }

    #[test]
    fn test_toml_invalid_values_rejected() {
        let result = EstimatorConfig::from_toml_str("learning_rate = 2.0");
        assert!(matches!(result, Err(CoreError::InvalidConfig(_))));

        let result = EstimatorConfig::from_toml_str("learning_rate = \"fast\"");
        assert!(matches!(result, Err(CoreError::ConfigParse(_))));
    }

    #[test]
    fn test_seed_policy_from_str() {
        assert_eq!("zero_start".parse::<SeedPolicy>().unwrap(), SeedPolicy::ZeroStart);
        assert_eq!("First-Event".parse::<SeedPolicy>().unwrap(), SeedPolicy::FirstEvent);
        assert!("ema".parse::<SeedPolicy>().is_err());
        assert_eq!(SeedPolicy::FirstEvent.to_string(), "first_event");
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("calibration.toml");
        std::fs::write(&path, "max_offset = 4.0\nmin_offset = -4.0\n").unwrap();

        let config = EstimatorConfig::from_file(&path).unwrap();
        assert_eq!(config.max_offset, 4.0);

        let missing = EstimatorConfig::from_file(dir.path().join("nope.toml"));
        assert!(matches!(missing, Err(CoreError::Io(_))));
    }
}
