use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::{PipelineError, Result};

/// Parameters for regularised Non-negative Matrix Factorization.
#[derive(Debug, Clone, Copy)]
pub struct NmfParams {
    /// Number of latent topics.
    pub k: usize,
    pub max_iter: usize,
    /// Stop when the relative error improvement over 10 iterations drops below this.
    pub tol: f64,
    /// Regularization strength, shared by W and H.
    pub alpha: f64,
    /// 1.0 is pure L1, 0.0 is pure L2.
    pub l1_ratio: f64,
    /// Seed for the random factor initialisation.
    pub seed: u64,
}

/// Non-negative Matrix Factorization for topic modeling.
///
/// Given a document-term matrix V (n_docs × n_terms), decompose into:
///   V ≈ W × H
/// where W (n_docs × k) holds document-topic weights
/// and H (k × n_terms) holds topic-term weights.
///
/// Minimises `½‖V − WH‖² + α·ρ(‖W‖₁ + ‖H‖₁) + ½α(1−ρ)(‖W‖² + ‖H‖²)` with
/// multiplicative updates (Lee & Seung, 2001).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NmfModel {
    /// Topic-term matrix (k × n_terms). Each row's top entries are that topic's keywords.
    components: Vec<Vec<f64>>,
    k: usize,
    n_terms: usize,
    max_iter: usize,
    tol: f64,
    l1_reg: f64,
    l2_reg: f64,
}

/// Result of [`NmfModel::fit`]: the model plus the training document-topic matrix.
pub struct NmfFit {
    pub model: NmfModel,
    /// Document-topic matrix (n_docs × k).
    pub doc_topics: Vec<Vec<f64>>,
    pub n_iter: usize,
    pub reconstruction_err: f64,
}

const EPS: f64 = 1e-10;

impl NmfModel {
    /// Factorize a dense document-term matrix.
    pub fn fit(v: &[Vec<f64>], params: NmfParams) -> Result<NmfFit> {
        let n_docs = v.len();
        if n_docs == 0 {
            return Err(PipelineError::EmptyCorpus);
        }
        let n_terms = v[0].len();
        if let Some(bad) = v.iter().find(|row| row.len() != n_terms) {
            return Err(PipelineError::DimensionMismatch {
                expected: n_terms,
                actual: bad.len(),
            });
        }
        if params.k == 0 {
            return Err(PipelineError::InvalidConfig("NMF needs k >= 1".into()));
        }
        let k = params.k;
        let l1_reg = params.alpha * params.l1_ratio;
        let l2_reg = params.alpha * (1.0 - params.l1_ratio);

        // Random init scaled so W×H starts near the data's mean magnitude.
        let mean = v.iter().flatten().sum::<f64>() / (n_docs * n_terms.max(1)) as f64;
        let avg = (mean / k as f64).sqrt();
        let mut rng = StdRng::seed_from_u64(params.seed);
        let mut h: Vec<Vec<f64>> = (0..k)
            .map(|_| (0..n_terms).map(|_| avg * rng.gen::<f64>()).collect())
            .collect();
        let mut w: Vec<Vec<f64>> = (0..n_docs)
            .map(|_| (0..k).map(|_| avg * rng.gen::<f64>()).collect())
            .collect();

        let initial_err = frobenius_error(v, &w, &h);
        let mut prev_err = initial_err;
        let mut n_iter = 0;
        let mut converged = false;

        for iter in 1..=params.max_iter {
            n_iter = iter;

            // W = W * (V H^T) / (W H H^T + l1 + l2 W)
            let v_ht = mat_mul_transpose_b(v, &h);
            let hht = mat_mul_transpose_b(&h, &h);
            let w_hht = mat_mul(&w, &hht);
            for i in 0..n_docs {
                for j in 0..k {
                    let denom = w_hht[i][j] + l1_reg + l2_reg * w[i][j];
                    w[i][j] *= v_ht[i][j] / denom.max(EPS);
                }
            }

            // H = H * (W^T V) / (W^T W H + l1 + l2 H)
            let wt_v = mat_mul_transpose_a(&w, v);
            let wtw = mat_mul_transpose_a(&w, &w);
            let wtw_h = mat_mul(&wtw, &h);
            for i in 0..k {
                for j in 0..n_terms {
                    let denom = wtw_h[i][j] + l1_reg + l2_reg * h[i][j];
                    h[i][j] *= wt_v[i][j] / denom.max(EPS);
                }
            }

            if params.tol > 0.0 && iter % 10 == 0 {
                let err = frobenius_error(v, &w, &h);
                debug!(iter, err, "nmf progress");
                if initial_err > 0.0 && (prev_err - err) / initial_err < params.tol {
                    converged = true;
                    break;
                }
                prev_err = err;
            }
        }

        if !converged && params.tol > 0.0 {
            warn!(max_iter = params.max_iter, "nmf reached max_iter before converging");
        }
        let reconstruction_err = frobenius_error(v, &w, &h);

        Ok(NmfFit {
            model: NmfModel {
                components: h,
                k,
                n_terms,
                max_iter: params.max_iter,
                tol: params.tol,
                l1_reg,
                l2_reg,
            },
            doc_topics: w,
            n_iter,
            reconstruction_err,
        })
    }

    /// Topic weights for one new document vector, holding H fixed.
    pub fn transform(&self, row: &[f64]) -> Result<Vec<f64>> {
        if row.len() != self.n_terms {
            return Err(PipelineError::DimensionMismatch {
                expected: self.n_terms,
                actual: row.len(),
            });
        }
        let mean = row.iter().sum::<f64>() / self.n_terms.max(1) as f64;
        if mean <= 0.0 {
            return Ok(vec![0.0; self.k]);
        }
        let v = [row.to_vec()];
        let mut w = vec![vec![(mean / self.k as f64).sqrt(); self.k]];

        let hht = mat_mul_transpose_b(&self.components, &self.components);
        let v_ht = mat_mul_transpose_b(&v, &self.components);
        let initial_err = frobenius_error(&v, &w, &self.components);
        let mut prev_err = initial_err;

        for iter in 1..=self.max_iter {
            let w_hht = mat_mul(&w, &hht);
            for j in 0..self.k {
                let denom = w_hht[0][j] + self.l1_reg + self.l2_reg * w[0][j];
                w[0][j] *= v_ht[0][j] / denom.max(EPS);
            }
            if self.tol > 0.0 && iter % 10 == 0 {
                let err = frobenius_error(&v, &w, &self.components);
                if initial_err > 0.0 && (prev_err - err) / initial_err < self.tol {
                    break;
                }
                prev_err = err;
            }
        }

        Ok(w.swap_remove(0))
    }

    /// Get top N terms for topic t, given the vocabulary the model was fit on.
    pub fn top_terms(&self, topic: usize, n: usize, vocabulary: &[String]) -> Vec<(String, f64)> {
        if topic >= self.k {
            return vec![];
        }
        let row = &self.components[topic];
        let mut indexed: Vec<(usize, f64)> = row.iter().copied().enumerate().collect();
        indexed.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
        indexed
            .into_iter()
            .take(n)
            .filter_map(|(i, w)| vocabulary.get(i).map(|t| (t.clone(), w)))
            .collect()
    }

    pub fn k(&self) -> usize {
        self.k
    }

    pub fn n_terms(&self) -> usize {
        self.n_terms
    }

    pub fn components(&self) -> &[Vec<f64>] {
        &self.components
    }
}

/// Index of the largest weight; ties go to the lowest index.
pub fn argmax(weights: &[f64]) -> usize {
    let mut best = 0;
    for (i, &w) in weights.iter().enumerate().skip(1) {
        if w > weights[best] {
            best = i;
        }
    }
    best
}

/// Dominant topic for each row of a document-topic matrix.
pub fn dominant_topics(doc_topics: &[Vec<f64>]) -> Vec<usize> {
    doc_topics.iter().map(|row| argmax(row)).collect()
}

fn frobenius_error(v: &[Vec<f64>], w: &[Vec<f64>], h: &[Vec<f64>]) -> f64 {
    let wh = mat_mul(w, h);
    v.iter()
        .zip(&wh)
        .flat_map(|(a, b)| a.iter().zip(b).map(|(x, y)| (x - y) * (x - y)))
        .sum::<f64>()
        .sqrt()
}

// A^T × B where A is (m × n), B is (m × p); result is (n × p)
fn mat_mul_transpose_a(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let n = a.first().map_or(0, Vec::len);
    let p = b.first().map_or(0, Vec::len);
    let mut result = vec![vec![0.0; p]; n];
    for (a_row, b_row) in a.iter().zip(b) {
        for i in 0..n {
            let x = a_row[i];
            if x == 0.0 {
                continue;
            }
            for j in 0..p {
                result[i][j] += x * b_row[j];
            }
        }
    }
    result
}

// A × B where A is (m × n), B is (n × p)
fn mat_mul(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    let p = b.first().map_or(0, Vec::len);
    a.iter()
        .map(|a_row| {
            let mut out = vec![0.0; p];
            for (x, b_row) in a_row.iter().zip(b) {
                if *x == 0.0 {
                    continue;
                }
                for j in 0..p {
                    out[j] += x * b_row[j];
                }
            }
            out
        })
        .collect()
}

// A × B^T where A is (m × n), B is (p × n); result is (m × p)
fn mat_mul_transpose_b(a: &[Vec<f64>], b: &[Vec<f64>]) -> Vec<Vec<f64>> {
    a.iter()
        .map(|a_row| {
            b.iter()
                .map(|b_row| a_row.iter().zip(b_row).map(|(x, y)| x * y).sum())
                .collect()
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn params(k: usize) -> NmfParams {
        NmfParams {
            k,
            max_iter: 300,
            tol: 1e-6,
            alpha: 0.0,
            l1_ratio: 0.5,
            seed: 1,
        }
    }

    // Terms: rust, systems, memory, web, javascript, css
    fn blocks() -> Vec<Vec<f64>> {
        vec![
            vec![3.0, 2.0, 1.0, 0.0, 0.0, 0.0],
            vec![2.0, 1.0, 3.0, 0.0, 0.0, 0.0],
            vec![0.0, 0.0, 0.0, 3.0, 2.0, 1.0],
            vec![0.0, 0.0, 0.0, 2.0, 1.0, 3.0],
        ]
    }

    #[test]
    fn nmf_separates_blocks() {
        let fit = NmfModel::fit(&blocks(), params(2)).unwrap();
        assert_eq!(fit.doc_topics.len(), 4);
        assert_eq!(fit.model.components().len(), 2);

        let topics = dominant_topics(&fit.doc_topics);
        assert_eq!(topics[0], topics[1], "rust docs should share topic");
        assert_eq!(topics[2], topics[3], "web docs should share topic");
        assert_ne!(topics[0], topics[2], "rust and web should differ");
    }

    #[test]
    fn factors_stay_non_negative() {
        let mut p = params(3);
        p.alpha = 0.1;
        let fit = NmfModel::fit(&blocks(), p).unwrap();
        assert!(fit.doc_topics.iter().flatten().all(|&x| x >= 0.0));
        assert!(fit.model.components().iter().flatten().all(|&x| x >= 0.0));
    }

    #[test]
    fn fit_is_deterministic_for_seed() {
        let a = NmfModel::fit(&blocks(), params(2)).unwrap();
        let b = NmfModel::fit(&blocks(), params(2)).unwrap();
        assert_eq!(a.doc_topics, b.doc_topics);
    }

    #[test]
    fn transform_agrees_with_fit_assignment() {
        let data = blocks();
        let fit = NmfModel::fit(&data, params(2)).unwrap();
        let topics = dominant_topics(&fit.doc_topics);
        for (row, &topic) in data.iter().zip(&topics) {
            let weights = fit.model.transform(row).unwrap();
            assert_eq!(argmax(&weights), topic);
        }
    }

    #[test]
    fn transform_zero_row_gives_zero_weights() {
        let fit = NmfModel::fit(&blocks(), params(2)).unwrap();
        let weights = fit.model.transform(&[0.0; 6]).unwrap();
        assert_eq!(weights, vec![0.0, 0.0]);
    }

    #[test]
    fn transform_rejects_wrong_width() {
        let fit = NmfModel::fit(&blocks(), params(2)).unwrap();
        assert!(matches!(
            fit.model.transform(&[1.0, 2.0]),
            Err(PipelineError::DimensionMismatch { expected: 6, actual: 2 })
        ));
    }

    #[test]
    fn nmf_top_terms() {
        let vocab: Vec<String> = ["rust", "systems", "memory", "web", "javascript", "css"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let fit = NmfModel::fit(&blocks(), params(2)).unwrap();
        let top = fit.model.top_terms(0, 3, &vocab);
        assert_eq!(top.len(), 3);
        assert!(top[0].1 >= top[1].1);
        assert!(fit.model.top_terms(5, 3, &vocab).is_empty());
    }

    #[test]
    fn argmax_ties_take_lowest_index() {
        assert_eq!(argmax(&[0.5, 0.5, 0.1]), 0);
        assert_eq!(argmax(&[0.0, 0.0, 0.0]), 0);
        assert_eq!(argmax(&[0.1, 0.7, 0.7]), 1);
    }

    #[test]
    fn nmf_empty() {
        assert!(matches!(
            NmfModel::fit(&[], params(3)),
            Err(PipelineError::EmptyCorpus)
        ));
    }
}
