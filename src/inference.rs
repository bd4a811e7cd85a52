//! Single-record scoring path. Reuses fitted [`TopicArtifacts`]; nothing here
//! refits or mutates them.

use serde::Serialize;

use crate::algo::markup;
use crate::config::TextSource;
use crate::dataset;
use crate::error::Result;
use crate::features::{self, FeatureRow};
use crate::record::Record;
use crate::topics::{TopicArtifacts, TopicLabel};

/// Predicted topic for one raw description.
///
/// Returns `Ok(None)` when the description is empty once markup is stripped;
/// callers decide how to treat a record with no topic.
pub fn predict_topic(artifacts: &TopicArtifacts, raw_description: &str) -> Result<Option<TopicLabel>> {
    artifacts.assign(&markup::strip_markup(raw_description))
}

/// A record scored for the downstream classifier.
#[derive(Debug, Clone, Serialize)]
pub struct ScoredRecord {
    pub features: FeatureRow,
    /// Topic index 0..K, absent when the description had no text.
    pub predicted_topic: Option<usize>,
}

impl ScoredRecord {
    /// Matrix row in training column order. A missing topic yields an
    /// all-zero dummy block, which no training row has. A predicted topic
    /// beyond `n_topics` means the row was scored against other artifacts.
    pub fn matrix_row(&self, n_topics: usize) -> Result<Vec<f64>> {
        match self.predicted_topic {
            Some(t) => {
                dataset::check_topic(0, TopicLabel(t), n_topics)?;
                Ok(dataset::matrix_row(&self.features, TopicLabel(t), n_topics))
            }
            None => {
                let mut row = self.features.to_vec();
                row.resize(row.len() + n_topics, 0.0);
                Ok(row)
            }
        }
    }
}

/// Derive features and predict the topic for one incoming record.
pub fn score_record(
    artifacts: &TopicArtifacts,
    record: &Record,
    text_source: TextSource,
) -> Result<ScoredRecord> {
    let predicted_topic = predict_topic(artifacts, &record.description)?.map(TopicLabel::index);
    Ok(ScoredRecord {
        features: features::derive(record, text_source),
        predicted_topic,
    })
}
