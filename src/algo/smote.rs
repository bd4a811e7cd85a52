//! Synthetic Minority Over-sampling (SMOTE, Chawla et al. 2002).
//!
//! The positive class (`y == 1`) is treated as the minority. Synthetic rows
//! are blends of a positive observation and one of its `k` nearest positive
//! neighbours, weighted independently per feature.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{PipelineError, Result};

/// Oversampling parameters.
#[derive(Debug, Clone, Copy)]
pub struct SmoteParams {
    /// Desired positive share of the output, in (0, 1).
    pub target: f64,
    /// Neighbourhood size; clamped to `positives - 1`.
    pub k: usize,
    pub seed: u64,
}

/// Append synthetic positive rows until the positive share reaches
/// `params.target`. Input rows are returned first and in order; synthetic
/// rows follow. If the positive share already meets the target the input is
/// returned unchanged.
pub fn smote(x: &[Vec<f64>], y: &[u8], params: SmoteParams) -> Result<(Vec<Vec<f64>>, Vec<u8>)> {
    if x.len() != y.len() {
        return Err(PipelineError::DimensionMismatch {
            expected: x.len(),
            actual: y.len(),
        });
    }
    if !(params.target > 0.0 && params.target < 1.0) {
        return Err(PipelineError::InvalidConfig(format!(
            "smote target must be in (0, 1), got {}",
            params.target
        )));
    }
    if params.k == 0 {
        return Err(PipelineError::InvalidConfig("smote needs k >= 1".into()));
    }

    let positives: Vec<usize> = (0..y.len()).filter(|&i| y[i] == 1).collect();
    let n_pos = positives.len();
    let n_neg = y.len() - n_pos;
    if y.is_empty() || n_pos as f64 / y.len() as f64 >= params.target {
        return Ok((x.to_vec(), y.to_vec()));
    }
    if n_pos < 2 {
        return Err(PipelineError::InsufficientData(format!(
            "smote needs at least 2 positive rows, got {n_pos}"
        )));
    }

    let target_pos = (params.target * n_neg as f64 / (1.0 - params.target)).round() as usize;
    let n_new = target_pos.saturating_sub(n_pos);
    let k = params.k.min(n_pos - 1);
    let neighbours = nearest_neighbours(x, &positives, k);
    debug!(n_pos, n_neg, n_new, k, "smote oversampling");

    let mut rng = StdRng::seed_from_u64(params.seed);
    let mut out_x = x.to_vec();
    let mut out_y = y.to_vec();
    out_x.reserve(n_new);
    out_y.reserve(n_new);
    for _ in 0..n_new {
        let which = rng.gen_range(0..n_pos);
        let obs = &x[positives[which]];
        let neighbour = &x[neighbours[which][rng.gen_range(0..k)]];
        let synthetic = obs
            .iter()
            .zip(neighbour)
            .map(|(a, b)| {
                let w: f64 = rng.gen();
                w * a + (1.0 - w) * b
            })
            .collect();
        out_x.push(synthetic);
        out_y.push(1);
    }
    Ok((out_x, out_y))
}

/// For each member of `pool`, the row indices of its `k` nearest other
/// members by Euclidean distance. Equal distances keep the lower row index.
fn nearest_neighbours(x: &[Vec<f64>], pool: &[usize], k: usize) -> Vec<Vec<usize>> {
    pool.iter()
        .map(|&i| {
            let mut dists: Vec<(f64, usize)> = pool
                .iter()
                .filter(|&&j| j != i)
                .map(|&j| (squared_distance(&x[i], &x[j]), j))
                .collect();
            dists.sort_by(|a, b| {
                a.0.partial_cmp(&b.0)
                    .unwrap_or(std::cmp::Ordering::Equal)
                    .then(a.1.cmp(&b.1))
            });
            dists.into_iter().take(k).map(|(_, j)| j).collect()
        })
        .collect()
}

fn squared_distance(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(p, q)| (p - q) * (p - q)).sum()
}
