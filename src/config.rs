use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Which text the description statistics (`exclamation_points`,
/// `caps_proportion`) are counted on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum TextSource {
    /// The description exactly as ingested, markup included.
    #[default]
    Raw,
    /// The description after markup stripping.
    Normalized,
}

/// Configuration for topic model fitting.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TopicConfig {
    /// Maximum vocabulary size (most frequent terms across the corpus).
    pub n_features: usize,
    /// Number of latent topics.
    pub n_topics: usize,
    /// Terms must appear in at least this many documents.
    pub min_df: usize,
    /// Terms appearing in more than this fraction of documents are dropped.
    pub max_df: f64,
    /// Regularization strength.
    pub alpha: f64,
    /// Mix between L1 (1.0) and L2 (0.0) regularization.
    pub l1_ratio: f64,
    /// Seed for the factor initialisation.
    pub seed: u64,
    pub max_iter: usize,
    /// Relative reconstruction-error improvement below which fitting stops.
    pub tol: f64,
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            n_features: 500,
            n_topics: 9,
            min_df: 2,
            max_df: 0.95,
            alpha: 0.1,
            l1_ratio: 0.5,
            seed: 1,
            max_iter: 200,
            tol: 1e-4,
        }
    }
}

/// Configuration for the train/test partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SplitConfig {
    /// Fraction of rows that go to the test partition.
    pub test_size: f64,
    /// `None` draws a fresh shuffle from the thread RNG.
    pub seed: Option<u64>,
}

impl Default for SplitConfig {
    fn default() -> Self {
        Self {
            test_size: 0.3,
            seed: Some(1234),
        }
    }
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub topics: TopicConfig,
    pub split: SplitConfig,
    pub text_stats_source: TextSource,
}

impl PipelineConfig {
    /// Parse a configuration from JSON. Missing keys take their defaults.
    pub fn from_json(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        self.topics.validate()?;
        self.split.validate()
    }
}

impl TopicConfig {
    pub fn validate(&self) -> Result<()> {
        if self.n_topics == 0 {
            return Err(PipelineError::InvalidConfig("n_topics must be at least 1".into()));
        }
        if self.n_features == 0 {
            return Err(PipelineError::InvalidConfig("n_features must be at least 1".into()));
        }
        if !(self.max_df > 0.0 && self.max_df <= 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "max_df must be in (0, 1], got {}",
                self.max_df
            )));
        }
        if self.alpha < 0.0 {
            return Err(PipelineError::InvalidConfig(format!(
                "alpha must be non-negative, got {}",
                self.alpha
            )));
        }
        if !(0.0..=1.0).contains(&self.l1_ratio) {
            return Err(PipelineError::InvalidConfig(format!(
                "l1_ratio must be in [0, 1], got {}",
                self.l1_ratio
            )));
        }
        Ok(())
    }
}

impl SplitConfig {
    pub fn validate(&self) -> Result<()> {
        if !(self.test_size > 0.0 && self.test_size < 1.0) {
            return Err(PipelineError::InvalidConfig(format!(
                "test_size must be in (0, 1), got {}",
                self.test_size
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_training_setup() {
        let c = PipelineConfig::default();
        assert_eq!(c.topics.n_features, 500);
        assert_eq!(c.topics.n_topics, 9);
        assert_eq!(c.topics.min_df, 2);
        assert_eq!(c.topics.seed, 1);
        assert_eq!(c.split.seed, Some(1234));
        assert!((c.split.test_size - 0.3).abs() < 1e-12);
        assert_eq!(c.text_stats_source, TextSource::Raw);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let c = PipelineConfig::from_json(r#"{"topics": {"n_topics": 4}, "text_stats_source": "normalized"}"#)
            .unwrap();
        assert_eq!(c.topics.n_topics, 4);
        assert_eq!(c.topics.n_features, 500);
        assert_eq!(c.text_stats_source, TextSource::Normalized);
    }

    #[test]
    fn rejects_bad_test_size() {
        let result = PipelineConfig::from_json(r#"{"split": {"test_size": 1.5}}"#);
        assert!(matches!(result, Err(PipelineError::InvalidConfig(_))));
    }

    #[test]
    fn rejects_zero_topics() {
        let mut c = TopicConfig::default();
        c.n_topics = 0;
        assert!(c.validate().is_err());
    }

    #[test]
    fn unseeded_split_roundtrips() {
        let c = PipelineConfig::from_json(r#"{"split": {"seed": null}}"#).unwrap();
        assert_eq!(c.split.seed, None);
    }
}
