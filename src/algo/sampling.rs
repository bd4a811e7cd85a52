use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;

/// Row indices for the two sides of a train/test partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitIndices {
    pub train: Vec<usize>,
    pub test: Vec<usize>,
}

/// Number of test rows for `total` rows at fraction `test_size` (rounded up,
/// so any non-empty input with a positive fraction gets at least one test row).
pub fn test_count(total: usize, test_size: f64) -> usize {
    ((total as f64 * test_size).ceil() as usize).min(total)
}

/// Random permutation of `0..total`. With a seed the permutation is
/// reproducible; without one it is drawn from the thread RNG.
pub fn shuffled_indices(total: usize, seed: Option<u64>) -> Vec<usize> {
    let mut indices: Vec<usize> = (0..total).collect();
    match seed {
        Some(s) => indices.shuffle(&mut StdRng::seed_from_u64(s)),
        None => indices.shuffle(&mut rand::thread_rng()),
    }
    indices
}

/// Shuffle then cut: the first `test_count` shuffled rows form the test side.
/// Every index in `0..total` lands on exactly one side.
pub fn train_test_split(total: usize, test_size: f64, seed: Option<u64>) -> SplitIndices {
    let shuffled = shuffled_indices(total, seed);
    let n_test = test_count(total, test_size);
    let (test, train) = shuffled.split_at(n_test);
    SplitIndices {
        train: train.to_vec(),
        test: test.to_vec(),
    }
}
