use std::str::FromStr;

use ndarray::Array1;
use rand::{SeedableRng, rngs::StdRng};
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use super::Dataset;
use crate::{LinRegErr, Result};

pub const DEFAULT_NUM_POINTS: usize = 20;
pub const DEFAULT_SEED: u64 = 42;
/// Upper bound on `num_points`. Both coordinates of every point are echoed back to the
/// client as JSON, which must still fit in a single wire frame.
pub const MAX_NUM_POINTS: usize = 100_000;

const X_LOW: f64 = 0.0;
const X_HIGH: f64 = 10.0;
const TRUE_SLOPE: f64 = 2.0;
const TRUE_INTERCEPT: f64 = 1.0;
const OUTLIER_SHIFT: f64 = 10.0;

/// The predefined synthetic datasets, all sampled around `y = 2x + 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DatasetKind {
    /// Low gaussian noise.
    Simple,
    /// High gaussian noise.
    Noisy,
    /// Low noise plus two points pushed far from the line.
    Outliers,
}

impl DatasetKind {
    /// The standard deviation of the noise when none is requested explicitly.
    pub fn default_noise(self) -> f64 {
        match self {
            DatasetKind::Simple | DatasetKind::Outliers => 1.0,
            DatasetKind::Noisy => 3.0,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            DatasetKind::Simple => "simple",
            DatasetKind::Noisy => "noisy",
            DatasetKind::Outliers => "outliers",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            DatasetKind::Simple => "Simple linear data with little noise",
            DatasetKind::Noisy => "Linear data with heavy noise",
            DatasetKind::Outliers => "Linear data with visible outliers",
        }
    }
}

impl FromStr for DatasetKind {
    type Err = LinRegErr;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "simple" => Ok(DatasetKind::Simple),
            "noisy" => Ok(DatasetKind::Noisy),
            "outliers" => Ok(DatasetKind::Outliers),
            other => Err(LinRegErr::UnknownDatasetKind(other.to_string())),
        }
    }
}

/// Parameters for synthetic dataset generation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerateOptions {
    pub kind: DatasetKind,
    pub num_points: usize,
    /// Overrides the kind's default noise when set.
    pub noise_level: Option<f64>,
    pub seed: u64,
}

impl GenerateOptions {
    /// Returns the default options for `kind`: 20 points, the kind's noise and seed 42.
    pub fn new(kind: DatasetKind) -> Self {
        Self {
            kind,
            num_points: DEFAULT_NUM_POINTS,
            noise_level: None,
            seed: DEFAULT_SEED,
        }
    }

    pub fn with_num_points(mut self, num_points: usize) -> Self {
        self.num_points = num_points;
        self
    }

    pub fn with_noise_level(mut self, noise_level: f64) -> Self {
        self.noise_level = Some(noise_level);
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn noise(&self) -> f64 {
        self.noise_level.unwrap_or(self.kind.default_noise())
    }
}

/// Generates a dataset of evenly spaced `x` in `[0, 10]` with `y = 2x + 1 + N(0, noise)`.
///
/// Deterministic for a fixed seed.
///
/// # Errors
/// `InvalidDataset` if `num_points` is zero or above `MAX_NUM_POINTS`, or the noise level
/// is negative or not finite.
pub fn generate(opts: &GenerateOptions) -> Result<Dataset> {
    let n = opts.num_points;
    if n == 0 {
        return Err(LinRegErr::invalid_dataset("num_points must be greater than 0"));
    }

    if n > MAX_NUM_POINTS {
        return Err(LinRegErr::invalid_dataset(format!(
            "num_points must be at most {MAX_NUM_POINTS}, got {n}"
        )));
    }

    let std_dev = opts.noise();
    if !std_dev.is_finite() || std_dev < 0.0 {
        return Err(LinRegErr::invalid_dataset(format!(
            "noise_level must be a non negative finite number, got {std_dev}"
        )));
    }

    let mut rng = StdRng::seed_from_u64(opts.seed);
    let noise = Normal::new(0.0, std_dev)?;

    let x = Array1::linspace(X_LOW, X_HIGH, n);
    let mut y = x.mapv(|x| TRUE_SLOPE * x + TRUE_INTERCEPT + noise.sample(&mut rng));

    if opts.kind == DatasetKind::Outliers {
        y[n / 4] += OUTLIER_SHIFT;
        y[3 * n / 4] -= OUTLIER_SHIFT;
    }

    Dataset::new(x.to_vec(), y.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kind_round_trips_through_its_name() {
        for kind in [DatasetKind::Simple, DatasetKind::Noisy, DatasetKind::Outliers] {
            assert_eq!(kind.name().parse::<DatasetKind>().unwrap(), kind);
        }

        let err = "spiral".parse::<DatasetKind>().unwrap_err();
        assert_eq!(err, LinRegErr::UnknownDatasetKind("spiral".into()));
    }

    #[test]
    fn generation_is_deterministic_for_a_seed() {
        let opts = GenerateOptions::new(DatasetKind::Noisy).with_seed(7);
        let a = generate(&opts).unwrap();
        let b = generate(&opts).unwrap();
        assert_eq!(a, b);

        let c = generate(&opts.with_seed(8)).unwrap();
        assert_ne!(a, c);
    }

    #[test]
    fn x_is_evenly_spaced_over_zero_to_ten() {
        let ds = generate(&GenerateOptions::new(DatasetKind::Simple)).unwrap();
        assert_eq!(ds.len(), DEFAULT_NUM_POINTS);
        assert_eq!(ds.x()[0], 0.0);
        assert!((ds.x()[DEFAULT_NUM_POINTS - 1] - 10.0).abs() < 1e-12);
    }

    #[test]
    fn zero_noise_lies_on_the_line() {
        let opts = GenerateOptions::new(DatasetKind::Simple)
            .with_num_points(5)
            .with_noise_level(0.0);
        let ds = generate(&opts).unwrap();

        for i in 0..ds.len() {
            let s = ds.sample(i);
            assert!((s.y - (2.0 * s.x + 1.0)).abs() < 1e-12);
        }
    }

    #[test]
    fn outliers_are_shifted_from_the_line() {
        let opts = GenerateOptions::new(DatasetKind::Outliers).with_noise_level(0.0);
        let ds = generate(&opts).unwrap();

        let residual = |i: usize| {
            let s = ds.sample(i);
            s.y - (2.0 * s.x + 1.0)
        };

        assert!((residual(5) - 10.0).abs() < 1e-12);
        assert!((residual(15) + 10.0).abs() < 1e-12);
        assert!(residual(0).abs() < 1e-12);
    }

    #[test]
    fn rejects_invalid_options() {
        let zero = GenerateOptions::new(DatasetKind::Simple).with_num_points(0);
        assert!(generate(&zero).is_err());

        let negative = GenerateOptions::new(DatasetKind::Simple).with_noise_level(-1.0);
        assert!(generate(&negative).is_err());
    }

    #[test]
    fn rejects_oversized_requests_without_allocating() {
        let huge = GenerateOptions::new(DatasetKind::Simple).with_num_points(usize::MAX / 4);
        let err = generate(&huge).unwrap_err();
        assert!(matches!(err, LinRegErr::InvalidDataset { ref reason } if reason.contains("at most")));

        let above = GenerateOptions::new(DatasetKind::Noisy).with_num_points(MAX_NUM_POINTS + 1);
        assert_eq!(generate(&above).unwrap_err().kind(), "invalid_dataset");

        let at_cap = GenerateOptions::new(DatasetKind::Simple).with_num_points(MAX_NUM_POINTS);
        assert_eq!(generate(&at_cap).unwrap().len(), MAX_NUM_POINTS);
    }
}
