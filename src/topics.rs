//! Latent topics over listing descriptions: tf-idf vectorization followed by
//! regularised NMF, with each document assigned its dominant topic.

use std::fmt;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use crate::algo::nmf::{self, NmfModel, NmfParams};
use crate::algo::tfidf::{TfidfVectorizer, VocabLimits};
use crate::algo::{markup, tokenizer};
use crate::config::TopicConfig;
use crate::error::{PipelineError, Result};

/// Zero-based topic index with the `topicN` label scheme (index 0 is `topic1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TopicLabel(pub usize);

impl TopicLabel {
    /// Parse a `topicN` label back into its index.
    pub fn parse(label: &str) -> Option<Self> {
        let n: usize = label.strip_prefix("topic")?.parse().ok()?;
        n.checked_sub(1).map(TopicLabel)
    }

    pub fn index(self) -> usize {
        self.0
    }

    /// Name of this topic's dummy column, e.g. `topic_topic3`.
    pub fn dummy_column(self) -> String {
        format!("topic_{self}")
    }
}

impl fmt::Display for TopicLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "topic{}", self.0 + 1)
    }
}

/// Dummy column names `topic_topic1..topic_topicK`.
pub fn dummy_columns(n_topics: usize) -> Vec<String> {
    (0..n_topics).map(|i| TopicLabel(i).dummy_column()).collect()
}

/// One-hot row for a topic assignment.
pub fn one_hot(topic: TopicLabel, n_topics: usize) -> Vec<u8> {
    (0..n_topics).map(|i| u8::from(i == topic.0)).collect()
}

/// The fitted vectorizer and factorization, always used together.
///
/// Built once by [`fit`] and read-only afterwards; every apply path takes it
/// by reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicArtifacts {
    vectorizer: TfidfVectorizer,
    model: NmfModel,
}

impl TopicArtifacts {
    /// Pair a vectorizer with a model, checking they share a term space.
    pub fn new(vectorizer: TfidfVectorizer, model: NmfModel) -> Result<Self> {
        if vectorizer.len() != model.n_terms() {
            return Err(PipelineError::ArtifactMismatch {
                vocabulary: vectorizer.len(),
                model: model.n_terms(),
            });
        }
        Ok(Self { vectorizer, model })
    }

    /// Decode artifacts persisted as JSON, re-running the compatibility check.
    pub fn deserialize_checked(value: &serde_json::Value) -> Result<Self> {
        let raw = TopicArtifacts::deserialize(value)?;
        Self::new(raw.vectorizer, raw.model)
    }

    pub fn vectorizer(&self) -> &TfidfVectorizer {
        &self.vectorizer
    }

    pub fn model(&self) -> &NmfModel {
        &self.model
    }

    pub fn n_topics(&self) -> usize {
        self.model.k()
    }

    /// Topic weights for already-normalized text.
    pub fn topic_weights(&self, plain_text: &str) -> Result<Vec<f64>> {
        let tokens = tokenizer::tokenize(plain_text);
        self.model.transform(&self.vectorizer.transform(&tokens))
    }

    /// Dominant topic for already-normalized text; `None` when the text is
    /// empty.
    pub fn assign(&self, plain_text: &str) -> Result<Option<TopicLabel>> {
        if plain_text.trim().is_empty() {
            return Ok(None);
        }
        let weights = self.topic_weights(plain_text)?;
        Ok(Some(TopicLabel(nmf::argmax(&weights))))
    }

    /// Top `n` keywords per topic, in topic order.
    pub fn describe(&self, n: usize) -> Vec<(TopicLabel, Vec<(String, f64)>)> {
        (0..self.n_topics())
            .map(|t| (TopicLabel(t), self.model.top_terms(t, n, self.vectorizer.vocabulary())))
            .collect()
    }
}

/// Artifacts plus the corpus-level assignment produced while fitting.
pub struct TopicFit {
    pub artifacts: TopicArtifacts,
    /// Dominant topic of each training document, from the fit-time
    /// document-topic matrix.
    pub assignments: Vec<TopicLabel>,
    pub n_iter: usize,
    pub reconstruction_err: f64,
}

/// Normalize raw descriptions and fit the topic model over them.
#[instrument(skip(raw_descriptions, config), fields(docs = raw_descriptions.len(), k = config.n_topics))]
pub fn fit(raw_descriptions: &[String], config: &TopicConfig) -> Result<TopicFit> {
    config.validate()?;
    let docs: Vec<Vec<String>> = raw_descriptions
        .par_iter()
        .map(|raw| tokenizer::tokenize(&markup::strip_markup(raw)))
        .collect();

    let vectorizer = TfidfVectorizer::fit(
        &docs,
        VocabLimits {
            max_features: config.n_features,
            min_df: config.min_df,
            max_df: config.max_df,
        },
    )?;
    let matrix = vectorizer.transform_many(&docs);

    let fit = NmfModel::fit(
        &matrix,
        NmfParams {
            k: config.n_topics,
            max_iter: config.max_iter,
            tol: config.tol,
            alpha: config.alpha,
            l1_ratio: config.l1_ratio,
            seed: config.seed,
        },
    )?;
    let assignments = nmf::dominant_topics(&fit.doc_topics)
        .into_iter()
        .map(TopicLabel)
        .collect();
    info!(
        vocabulary = vectorizer.len(),
        n_iter = fit.n_iter,
        err = fit.reconstruction_err,
        "topic model fitted"
    );

    Ok(TopicFit {
        artifacts: TopicArtifacts::new(vectorizer, fit.model)?,
        assignments,
        n_iter: fit.n_iter,
        reconstruction_err: fit.reconstruction_err,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    pub(crate) fn descriptions() -> Vec<String> {
        [
            "<p>Live music concert with rock band and guitar solos</p>",
            "Rock concert: band plays live music all night",
            "Jazz band live music concert downtown",
            "<b>Yoga</b> retreat with meditation and wellness workshop",
            "Wellness workshop: yoga, meditation, healthy food",
            "Meditation and yoga wellness weekend retreat",
            "Startup networking conference for founders and investors",
            "Investors meet founders at startup networking conference",
            "Tech conference for startup founders, networking drinks",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect()
    }

    fn config(k: usize) -> TopicConfig {
        TopicConfig {
            n_topics: k,
            ..TopicConfig::default()
        }
    }

    #[test]
    fn labels_and_dummy_names() {
        assert_eq!(TopicLabel(0).to_string(), "topic1");
        assert_eq!(TopicLabel(8).dummy_column(), "topic_topic9");
        assert_eq!(TopicLabel::parse("topic3"), Some(TopicLabel(2)));
        assert_eq!(TopicLabel::parse("topic0"), None);
        assert_eq!(TopicLabel::parse("cluster1"), None);
        assert_eq!(dummy_columns(9).len(), 9);
        assert_eq!(dummy_columns(2), vec!["topic_topic1", "topic_topic2"]);
    }

    #[test]
    fn one_hot_has_single_one() {
        let row = one_hot(TopicLabel(4), 9);
        assert_eq!(row.iter().map(|&v| v as usize).sum::<usize>(), 1);
        assert_eq!(row[4], 1);
    }

    #[test]
    fn fit_groups_similar_descriptions() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        let a = &fit.assignments;
        assert_eq!(a.len(), 9);
        assert_eq!(a[0], a[1]);
        assert_eq!(a[3], a[4]);
        assert_eq!(a[6], a[7]);
        assert_ne!(a[0], a[3]);
        assert_ne!(a[3], a[6]);
        assert!(a.iter().all(|t| t.index() < 3));
    }

    #[test]
    fn default_config_yields_nine_topics() {
        let fit = fit(&descriptions(), &TopicConfig::default()).unwrap();
        assert_eq!(fit.artifacts.n_topics(), 9);
        assert!(fit.assignments.iter().all(|t| t.index() < 9));
    }

    #[test]
    fn assign_matches_training_cluster() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        let music = fit.artifacts.assign("rock band concert with live music").unwrap();
        assert_eq!(music, Some(fit.assignments[0]));
        let yoga = fit.artifacts.assign("yoga meditation retreat").unwrap();
        assert_eq!(yoga, Some(fit.assignments[3]));
    }

    #[test]
    fn assign_empty_text_is_none() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        assert_eq!(fit.artifacts.assign("").unwrap(), None);
        assert_eq!(fit.artifacts.assign("   ").unwrap(), None);
    }

    #[test]
    fn out_of_vocabulary_text_falls_to_first_topic() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        assert_eq!(fit.artifacts.assign("zzz qqq").unwrap(), Some(TopicLabel(0)));
    }

    #[test]
    fn mismatched_artifacts_rejected() {
        let big = fit(&descriptions(), &config(3)).unwrap();
        let small_docs: Vec<String> = descriptions()[..3].to_vec();
        let small = fit(&small_docs, &config(2)).unwrap();
        let err = TopicArtifacts::new(big.artifacts.vectorizer().clone(), small.artifacts.model().clone());
        assert!(matches!(err, Err(PipelineError::ArtifactMismatch { .. })));
    }

    #[test]
    fn describe_lists_keywords() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        let topics = fit.artifacts.describe(3);
        assert_eq!(topics.len(), 3);
        assert!(topics.iter().all(|(_, terms)| terms.len() == 3));
    }

    #[test]
    fn artifacts_serde_roundtrip() {
        let fit = fit(&descriptions(), &config(3)).unwrap();
        let json = serde_json::to_string(&fit.artifacts).unwrap();
        let back: TopicArtifacts = serde_json::from_str(&json).unwrap();
        let text = "jazz concert";
        assert_eq!(back.assign(text).unwrap(), fit.artifacts.assign(text).unwrap());
    }

    #[test]
    fn empty_corpus_rejected() {
        assert!(matches!(fit(&[], &config(3)), Err(PipelineError::EmptyCorpus)));
    }
}
