use ndarray::{Array1, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::{LinRegErr, Result};

/// A single supervised sample (x, y).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
}

/// Descriptive statistics of a loaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DatasetSummary {
    pub num_points: usize,
    pub x_range: (f64, f64),
    pub y_range: (f64, f64),
    pub x_mean: f64,
    pub y_mean: f64,
}

/// An immutable, validated, in-memory dataset.
///
/// Invariants:
/// - `x` and `y` have the same length.
/// - there is at least one sample.
/// - every value is finite.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    x: Array1<f64>,
    y: Array1<f64>,
}

impl Dataset {
    /// Creates a new dataset from owned buffers.
    ///
    /// # Arguments
    /// * `x` - The feature of every sample.
    /// * `y` - The target of every sample.
    ///
    /// # Errors
    /// `InvalidDataset` if the lengths differ, the dataset is empty or any value is
    /// not finite.
    pub fn new(x: Vec<f64>, y: Vec<f64>) -> Result<Self> {
        if x.len() != y.len() {
            return Err(LinRegErr::invalid_dataset(format!(
                "x and y must have the same length, got {} and {}",
                x.len(),
                y.len()
            )));
        }

        if x.is_empty() {
            return Err(LinRegErr::invalid_dataset("dataset is empty"));
        }

        let non_finite = |values: &[f64]| values.iter().position(|v| !v.is_finite());

        if let Some(idx) = non_finite(&x) {
            return Err(LinRegErr::invalid_dataset(format!(
                "x[{idx}] is not finite ({})",
                x[idx]
            )));
        }

        if let Some(idx) = non_finite(&y) {
            return Err(LinRegErr::invalid_dataset(format!(
                "y[{idx}] is not finite ({})",
                y[idx]
            )));
        }

        Ok(Self {
            x: Array1::from(x),
            y: Array1::from(y),
        })
    }

    /// Parses a dataset out of CSV text, see `data::csv::parse`.
    pub fn from_csv(content: &str) -> Result<Self> {
        super::csv::parse(content)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always `false`, a `Dataset` can't be built empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    #[inline]
    pub fn x(&self) -> ArrayView1<'_, f64> {
        self.x.view()
    }

    #[inline]
    pub fn y(&self) -> ArrayView1<'_, f64> {
        self.y.view()
    }

    /// Returns the sample at `idx` (panics if out of bounds).
    #[inline]
    pub fn sample(&self, idx: usize) -> Sample {
        Sample {
            x: self.x[idx],
            y: self.y[idx],
        }
    }

    pub fn summary(&self) -> DatasetSummary {
        let range = |values: &Array1<f64>| {
            values.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            })
        };

        DatasetSummary {
            num_points: self.len(),
            x_range: range(&self.x),
            y_range: range(&self.y),
            x_mean: self.x.mean().unwrap_or_default(),
            y_mean: self.y.mean().unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dataset_basic() {
        let ds = Dataset::new(vec![1.0, 2.0], vec![3.0, 5.0]).unwrap();
        assert_eq!(ds.len(), 2);
        assert!(!ds.is_empty());
        assert_eq!(ds.sample(0), Sample { x: 1.0, y: 3.0 });
        assert_eq!(ds.sample(1), Sample { x: 2.0, y: 5.0 });
    }

    #[test]
    fn dataset_rejects_length_mismatch() {
        let err = Dataset::new(vec![1.0, 2.0], vec![3.0]).unwrap_err();
        assert_eq!(err.kind(), "invalid_dataset");
    }

    #[test]
    fn dataset_rejects_empty() {
        let err = Dataset::new(vec![], vec![]).unwrap_err();
        assert!(matches!(err, LinRegErr::InvalidDataset { .. }));
    }

    #[test]
    fn dataset_rejects_non_finite_values() {
        assert!(Dataset::new(vec![1.0, f64::NAN], vec![1.0, 2.0]).is_err());
        assert!(Dataset::new(vec![1.0, 2.0], vec![f64::INFINITY, 2.0]).is_err());
    }

    #[test]
    fn summary_reports_ranges_and_means() {
        let ds = Dataset::new(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 3.0, 5.0, 7.0]).unwrap();
        let summary = ds.summary();

        assert_eq!(summary.num_points, 4);
        assert_eq!(summary.x_range, (0.0, 3.0));
        assert_eq!(summary.y_range, (1.0, 7.0));
        assert_eq!(summary.x_mean, 1.5);
        assert_eq!(summary.y_mean, 4.0);
    }
}
