//! Feature engineering and topic modelling for event-listing fraud detection.
//!
//! Raw listings flow through markup stripping, a tf-idf + NMF topic model,
//! per-record feature derivation, dataset assembly with a seeded train/test
//! split, and train-only standardisation. [`inference`] scores single records
//! against topic artifacts fitted earlier.

pub mod algo;
pub mod config;
pub mod dataset;
pub mod error;
pub mod features;
pub mod inference;
pub mod ops;
pub mod record;
pub mod topics;

pub use config::{PipelineConfig, SplitConfig, TextSource, TopicConfig};
pub use dataset::{prepare_training_data, Dataset, Split, TrainingData};
pub use error::{PipelineError, Result};
pub use features::{FeatureRow, FEATURE_NAMES};
pub use record::{Record, TicketType};
pub use topics::{TopicArtifacts, TopicLabel};
