//! Joins engineered features, topic dummies and the fraud label into a
//! fixed-shape matrix, and partitions it for training.

use rayon::prelude::*;
use tracing::{info, instrument};

use crate::algo::sampling;
use crate::algo::scaler::StandardScaler;
use crate::config::{PipelineConfig, SplitConfig, TextSource};
use crate::error::{PipelineError, Result};
use crate::features::{self, FeatureRow, FEATURE_NAMES};
use crate::record::Record;
use crate::topics::{self, TopicArtifacts, TopicLabel};

/// Full column list: engineered features, then `topic_topic1..K`.
pub fn feature_columns(n_topics: usize) -> Vec<String> {
    FEATURE_NAMES
        .iter()
        .map(|s| s.to_string())
        .chain(topics::dummy_columns(n_topics))
        .collect()
}

/// Reject a topic assignment that has no dummy column among `n_topics`.
pub fn check_topic(row: usize, topic: TopicLabel, n_topics: usize) -> Result<()> {
    if topic.index() >= n_topics {
        return Err(PipelineError::TopicOutOfRange {
            row,
            topic: topic.index(),
            n_topics,
        });
    }
    Ok(())
}

/// One matrix row: engineered features followed by the topic one-hot.
/// `topic` must already be checked against `n_topics`.
pub fn matrix_row(features: &FeatureRow, topic: TopicLabel, n_topics: usize) -> Vec<f64> {
    let mut row = features.to_vec();
    row.extend(topics::one_hot(topic, n_topics).into_iter().map(f64::from));
    row
}

/// Feature matrix with its label vector. Row `i` of `features` belongs to
/// `labels[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub columns: Vec<String>,
    pub features: Vec<Vec<f64>>,
    pub labels: Vec<u8>,
}

/// Train/test partition. `train_rows`/`test_rows` are the source row indices.
#[derive(Debug, Clone, PartialEq)]
pub struct Split {
    pub x_train: Vec<Vec<f64>>,
    pub x_test: Vec<Vec<f64>>,
    pub y_train: Vec<u8>,
    pub y_test: Vec<u8>,
    pub train_rows: Vec<usize>,
    pub test_rows: Vec<usize>,
}

impl Dataset {
    /// Build the matrix from records and their topic assignments. Every record
    /// must carry an `acct_type`.
    pub fn assemble(
        records: &[Record],
        assignments: &[TopicLabel],
        n_topics: usize,
        text_source: TextSource,
    ) -> Result<Self> {
        if records.len() != assignments.len() {
            return Err(PipelineError::DimensionMismatch {
                expected: records.len(),
                actual: assignments.len(),
            });
        }
        let labels = records
            .iter()
            .enumerate()
            .map(|(row, r)| r.fraud_label().ok_or(PipelineError::MissingLabel { row }))
            .collect::<Result<Vec<u8>>>()?;
        for (row, &topic) in assignments.iter().enumerate() {
            check_topic(row, topic, n_topics)?;
        }

        let features = records
            .par_iter()
            .zip(assignments.par_iter())
            .map(|(r, &topic)| matrix_row(&features::derive(r, text_source), topic, n_topics))
            .collect();

        Ok(Self {
            columns: feature_columns(n_topics),
            features,
            labels,
        })
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Randomised train/test partition. A `None` seed gives a fresh shuffle.
    #[instrument(skip(self, config), fields(rows = self.len(), test_size = config.test_size))]
    pub fn split(&self, config: &SplitConfig) -> Result<Split> {
        config.validate()?;
        if self.len() < 2 {
            return Err(PipelineError::InsufficientData(format!(
                "need at least 2 rows to split, got {}",
                self.len()
            )));
        }
        let idx = sampling::train_test_split(self.len(), config.test_size, config.seed);
        let take_x = |rows: &[usize]| -> Vec<Vec<f64>> {
            rows.iter().map(|&i| self.features[i].clone()).collect()
        };
        let take_y = |rows: &[usize]| -> Vec<u8> { rows.iter().map(|&i| self.labels[i]).collect() };
        Ok(Split {
            x_train: take_x(&idx.train),
            x_test: take_x(&idx.test),
            y_train: take_y(&idx.train),
            y_test: take_y(&idx.test),
            train_rows: idx.train,
            test_rows: idx.test,
        })
    }
}

/// Everything the training stage produces.
pub struct TrainingData {
    pub artifacts: TopicArtifacts,
    pub dataset: Dataset,
    /// Split with both sides standardised by `scaler`.
    pub split: Split,
    pub scaler: StandardScaler,
}

/// Fit topics on the corpus, assemble the matrix, split and scale.
#[instrument(skip(records, config), fields(records = records.len()))]
pub fn prepare_training_data(records: &[Record], config: &PipelineConfig) -> Result<TrainingData> {
    config.validate()?;
    let descriptions: Vec<String> = records.iter().map(|r| r.description.clone()).collect();
    let fit = topics::fit(&descriptions, &config.topics)?;
    let n_topics = fit.artifacts.n_topics();

    let dataset = Dataset::assemble(records, &fit.assignments, n_topics, config.text_stats_source)?;
    let mut split = dataset.split(&config.split)?;
    let (scaler, x_train, x_test) = StandardScaler::fit_transform_pair(&split.x_train, &split.x_test)?;
    split.x_train = x_train;
    split.x_test = x_test;

    let positives = dataset.labels.iter().filter(|&&y| y == 1).count();
    info!(
        rows = dataset.len(),
        positives,
        train = split.y_train.len(),
        test = split.y_test.len(),
        "training data prepared"
    );

    Ok(TrainingData {
        artifacts: fit.artifacts,
        dataset,
        split,
        scaler,
    })
}
