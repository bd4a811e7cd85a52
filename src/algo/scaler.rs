use serde::{Deserialize, Serialize};

use crate::error::{PipelineError, Result};

/// Per-column standardisation to zero mean and unit variance.
///
/// Statistics come from the matrix passed to [`StandardScaler::fit`] only;
/// [`StandardScaler::transform`] reuses them unchanged. Constant columns get a
/// scale of 1 so they map to 0 instead of dividing by zero.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    scale: Vec<f64>,
}

impl StandardScaler {
    pub fn fit(x: &[Vec<f64>]) -> Result<Self> {
        let n = x.len();
        if n == 0 {
            return Err(PipelineError::InsufficientData(
                "cannot fit a scaler on zero rows".into(),
            ));
        }
        let width = x[0].len();
        check_width(x, width)?;

        let mut mean = vec![0.0; width];
        for row in x {
            for (m, v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        for m in &mut mean {
            *m /= n as f64;
        }

        // Population variance (ddof = 0).
        let mut var = vec![0.0; width];
        for row in x {
            for ((s, v), m) in var.iter_mut().zip(row).zip(&mean) {
                *s += (v - m) * (v - m);
            }
        }
        let scale = var
            .into_iter()
            .map(|s| {
                let sd = (s / n as f64).sqrt();
                if sd > f64::EPSILON {
                    sd
                } else {
                    1.0
                }
            })
            .collect();

        Ok(Self { mean, scale })
    }

    pub fn transform(&self, x: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        check_width(x, self.mean.len())?;
        Ok(x.iter()
            .map(|row| {
                row.iter()
                    .zip(&self.mean)
                    .zip(&self.scale)
                    .map(|((v, m), s)| (v - m) / s)
                    .collect()
            })
            .collect())
    }

    /// Fit on `train`, then transform both partitions with the same statistics.
    pub fn fit_transform_pair(
        train: &[Vec<f64>],
        test: &[Vec<f64>],
    ) -> Result<(Self, Vec<Vec<f64>>, Vec<Vec<f64>>)> {
        let scaler = Self::fit(train)?;
        let train_scaled = scaler.transform(train)?;
        let test_scaled = scaler.transform(test)?;
        Ok((scaler, train_scaled, test_scaled))
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn scale(&self) -> &[f64] {
        &self.scale
    }
}

fn check_width(x: &[Vec<f64>], width: usize) -> Result<()> {
    match x.iter().find(|row| row.len() != width) {
        Some(row) => Err(PipelineError::DimensionMismatch {
            expected: width,
            actual: row.len(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(x: &[Vec<f64>], j: usize) -> Vec<f64> {
        x.iter().map(|r| r[j]).collect()
    }

    fn mean_var(col: &[f64]) -> (f64, f64) {
        let n = col.len() as f64;
        let m = col.iter().sum::<f64>() / n;
        let v = col.iter().map(|x| (x - m) * (x - m)).sum::<f64>() / n;
        (m, v)
    }

    #[test]
    fn train_output_standardised() {
        let train = vec![
            vec![1.0, 10.0],
            vec![2.0, 20.0],
            vec![3.0, 60.0],
            vec![4.0, 10.0],
        ];
        let scaler = StandardScaler::fit(&train).unwrap();
        let out = scaler.transform(&train).unwrap();
        for j in 0..2 {
            let (m, v) = mean_var(&column(&out, j));
            assert!(m.abs() < 1e-9, "mean={m}");
            assert!((v - 1.0).abs() < 1e-9, "var={v}");
        }
    }

    #[test]
    fn test_partition_not_refit() {
        let train = vec![vec![0.0], vec![2.0], vec![4.0]];
        let test = vec![vec![10.0], vec![12.0]];
        let (scaler, _, test_out) = StandardScaler::fit_transform_pair(&train, &test).unwrap();
        assert!((scaler.mean()[0] - 2.0).abs() < 1e-12);
        let (m, _) = mean_var(&column(&test_out, 0));
        assert!(m > 1.0, "test mean should stay shifted, got {m}");
    }

    #[test]
    fn constant_column_maps_to_zero() {
        let train = vec![vec![5.0], vec![5.0]];
        let scaler = StandardScaler::fit(&train).unwrap();
        assert_eq!(scaler.scale(), &[1.0]);
        assert_eq!(scaler.transform(&train).unwrap(), vec![vec![0.0], vec![0.0]]);
    }

    #[test]
    fn width_mismatch_rejected() {
        let scaler = StandardScaler::fit(&[vec![1.0, 2.0], vec![3.0, 4.0]]).unwrap();
        assert!(matches!(
            scaler.transform(&[vec![1.0]]),
            Err(PipelineError::DimensionMismatch { expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn empty_fit_rejected() {
        assert!(StandardScaler::fit(&[]).is_err());
    }
}
