use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::error::{PipelineError, Result};

/// Vocabulary pruning bounds for [`TfidfVectorizer::fit`].
#[derive(Debug, Clone, Copy)]
pub struct VocabLimits {
    /// Maximum number of terms kept (highest corpus-wide count first).
    pub max_features: usize,
    /// Minimum number of documents a term must appear in.
    pub min_df: usize,
    /// Maximum fraction of documents a term may appear in.
    pub max_df: f64,
}

/// A fitted term-frequency / inverse-document-frequency vectorizer.
///
/// Terms are indexed alphabetically. IDF is smoothed,
/// `ln((1 + n) / (1 + df)) + 1`, and each transformed row is L2-normalised.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TfidfVectorizer {
    /// index -> term, sorted
    vocabulary: Vec<String>,
    /// term -> index
    term_index: HashMap<String, usize>,
    /// idf weight per vocabulary index
    idf: Vec<f64>,
}

impl TfidfVectorizer {
    /// Learn the vocabulary and IDF weights from pre-tokenized documents.
    pub fn fit(docs: &[Vec<String>], limits: VocabLimits) -> Result<Self> {
        let n_docs = docs.len();
        if n_docs == 0 {
            return Err(PipelineError::EmptyCorpus);
        }

        let mut doc_freq: HashMap<&str, usize> = HashMap::new();
        let mut term_count: HashMap<&str, usize> = HashMap::new();
        for tokens in docs {
            let mut seen: HashSet<&str> = HashSet::new();
            for token in tokens {
                *term_count.entry(token.as_str()).or_insert(0) += 1;
                if seen.insert(token.as_str()) {
                    *doc_freq.entry(token.as_str()).or_insert(0) += 1;
                }
            }
        }

        let max_doc_count = limits.max_df * n_docs as f64;
        let mut candidates: Vec<(&str, usize)> = term_count
            .into_iter()
            .filter(|(term, _)| {
                let df = doc_freq[term];
                df >= limits.min_df && (df as f64) <= max_doc_count
            })
            .collect();
        if candidates.is_empty() {
            return Err(PipelineError::EmptyVocabulary {
                min_df: limits.min_df,
                max_df: limits.max_df,
            });
        }

        // Highest count first, ties alphabetical for a stable cut.
        candidates.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
        candidates.truncate(limits.max_features);

        let mut vocabulary: Vec<String> = candidates.into_iter().map(|(t, _)| t.to_string()).collect();
        vocabulary.sort();

        let term_index: HashMap<String, usize> = vocabulary
            .iter()
            .enumerate()
            .map(|(i, t)| (t.clone(), i))
            .collect();

        let n = n_docs as f64;
        let idf = vocabulary
            .iter()
            .map(|t| {
                let df = doc_freq[t.as_str()] as f64;
                ((1.0 + n) / (1.0 + df)).ln() + 1.0
            })
            .collect();

        Ok(Self {
            vocabulary,
            term_index,
            idf,
        })
    }

    /// Dense tf-idf vector for one tokenized document. Out-of-vocabulary
    /// tokens contribute nothing; a document with no known terms maps to the
    /// zero vector.
    pub fn transform(&self, tokens: &[String]) -> Vec<f64> {
        let mut row = vec![0.0; self.vocabulary.len()];
        for token in tokens {
            if let Some(&idx) = self.term_index.get(token) {
                row[idx] += 1.0;
            }
        }
        for (w, idf) in row.iter_mut().zip(&self.idf) {
            *w *= idf;
        }
        let norm = row.iter().map(|w| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for w in &mut row {
                *w /= norm;
            }
        }
        row
    }

    pub fn transform_many(&self, docs: &[Vec<String>]) -> Vec<Vec<f64>> {
        docs.iter().map(|d| self.transform(d)).collect()
    }

    pub fn vocabulary(&self) -> &[String] {
        &self.vocabulary
    }

    pub fn idf(&self, term: &str) -> Option<f64> {
        self.term_index.get(term).map(|&i| self.idf[i])
    }

    pub fn len(&self) -> usize {
        self.vocabulary.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vocabulary.is_empty()
    }
}
