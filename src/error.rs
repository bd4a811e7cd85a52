//! Error taxonomy for the feature pipeline.
//!
//! Conditions the pipeline tolerates (malformed markup, empty ticket lists,
//! null delivery method, empty inference text) never surface here. Everything
//! in this enum is a caller contract violation and rejects the operation.

use thiserror::Error;

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// A raw row could not be decoded into a [`crate::record::Record`].
    #[error("invalid record at row {row}: {source}")]
    InvalidRecord {
        row: usize,
        #[source]
        source: serde_json::Error,
    },

    /// Training data needs `acct_type` to derive the fraud label.
    #[error("record at row {row} has no acct_type; cannot derive the fraud label")]
    MissingLabel { row: usize },

    #[error("missing required field `{0}`")]
    MissingField(&'static str),

    #[error("need at least one document to fit the topic model")]
    EmptyCorpus,

    /// Every candidate term was pruned by the document-frequency bounds.
    #[error("vocabulary is empty after pruning (min_df={min_df}, max_df={max_df})")]
    EmptyVocabulary { min_df: usize, max_df: f64 },

    #[error("dimension mismatch: expected {expected} columns, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// A topic assignment does not index into the model's topics.
    #[error("topic index {topic} at row {row} is outside the model's {n_topics} topics")]
    TopicOutOfRange {
        row: usize,
        topic: usize,
        n_topics: usize,
    },

    /// Vectorizer and NMF model were not fit together.
    #[error("artifact mismatch: vectorizer has {vocabulary} terms but model expects {model}")]
    ArtifactMismatch { vocabulary: usize, model: usize },

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("insufficient data: {0}")]
    InsufficientData(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
