//! Numeric kernel for `y = w*x + b` under the mean squared error loss:
//!
//! loss = (1/n) * sum_i (y_i - yhat_i)^2
//!
//! grads:
//! - dL/dw = -(2/n) * sum_i (x_i * e_i)
//! - dL/db = -(2/n) * sum_i (e_i)
//!
//! with `e_i = y_i - yhat_i`. Every function is pure and expects `n >= 1`, callers
//! validate the dataset before reaching this module.
use ndarray::{Array1, ArrayView1, Zip};
use serde::{Deserialize, Serialize};

/// Lower bound, as a fraction of the largest magnitude, of the `Medium` category.
const MEDIUM_THRESHOLD: f64 = 0.2;
/// Lower bound, as a fraction of the largest magnitude, of the `High` category.
const HIGH_THRESHOLD: f64 = 0.5;

/// A single point's raw (un-normalized) share of the batch gradient.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    #[serde(deserialize_with = "crate::float::lenient")]
    pub dw: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub db: f64,
}

/// Per-point raw contributions and the signed errors they were computed from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contributions {
    #[serde(deserialize_with = "crate::float::lenient")]
    pub dw: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub db: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub errors: Vec<f64>,
}

/// The aggregate gradient of the loss with respect to `(w, b)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(deserialize_with = "crate::float::lenient")]
    pub dw: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub db: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub magnitude: f64,
}

impl Gradient {
    /// Returns a new `Gradient`, its magnitude is the euclidean norm of `(dw, db)`.
    pub fn new(dw: f64, db: f64) -> Self {
        Self {
            dw,
            db,
            magnitude: dw.hypot(db),
        }
    }
}

/// The outcome of a single gradient descent update.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ParamUpdate {
    #[serde(deserialize_with = "crate::float::lenient")]
    pub w: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_w: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_b: f64,
}

/// How large a point's error is relative to the worst point in the batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    Low,
    Medium,
    High,
}

/// Every intermediate sum needed to reproduce the loss and gradient by hand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breakdown {
    pub n: usize,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub squared_errors: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub sum_squared_errors: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub mse: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub sum_x_errors: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub sum_errors: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub dw: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub db: f64,
}

/// y = w*x + b
#[inline]
pub fn predict_point(x: f64, w: f64, b: f64) -> f64 {
    w * x + b
}

/// Applies `predict_point` element-wise over `x`.
pub fn predict(x: ArrayView1<f64>, w: f64, b: f64) -> Array1<f64> {
    x.mapv(|x| predict_point(x, w, b))
}

/// Returns the signed errors `y - yhat` and their absolute values.
pub fn errors(y: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> (Array1<f64>, Array1<f64>) {
    let errors = &y - &y_pred;
    let magnitudes = errors.mapv(f64::abs);
    (errors, magnitudes)
}

/// Returns this point's raw contribution `(-2*x*e, -2*e)` to the batch gradient.
#[inline]
pub fn point_contribution(x: f64, y: f64, y_pred: f64) -> Contribution {
    let err = y - y_pred;
    Contribution {
        dw: -2.0 * x * err,
        db: -2.0 * err,
    }
}

/// Applies `point_contribution` over every point of the batch.
pub fn contributions(
    x: ArrayView1<f64>,
    y: ArrayView1<f64>,
    y_pred: ArrayView1<f64>,
) -> Contributions {
    let n = x.len();
    let mut out = Contributions {
        dw: Vec::with_capacity(n),
        db: Vec::with_capacity(n),
        errors: Vec::with_capacity(n),
    };

    Zip::from(x).and(y).and(y_pred).for_each(|&x, &y, &p| {
        let Contribution { dw, db } = point_contribution(x, y, p);
        out.dw.push(dw);
        out.db.push(db);
        out.errors.push(y - p);
    });

    out
}

/// Mean of the per-point contributions. The `1/n` normalization happens here and
/// never per point.
pub fn gradient(x: ArrayView1<f64>, y: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Gradient {
    let n = x.len() as f64;

    let (sum_dw, sum_db) =
        Zip::from(x)
            .and(y)
            .and(y_pred)
            .fold((0.0, 0.0), |(sum_dw, sum_db), &x, &y, &p| {
                let Contribution { dw, db } = point_contribution(x, y, p);
                (sum_dw + dw, sum_db + db)
            });

    Gradient::new(sum_dw / n, sum_db / n)
}

/// Takes a step of length `lr` in the opposite direction of the gradient.
pub fn update_params(w: f64, b: f64, dw: f64, db: f64, lr: f64) -> ParamUpdate {
    let w_new = w - lr * dw;
    let b_new = b - lr * db;

    ParamUpdate {
        w: w_new,
        b: b_new,
        delta_w: w_new - w,
        delta_b: b_new - b,
    }
}

/// Mean squared error between the targets and the predictions.
pub fn mse(y: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> f64 {
    (&y - &y_pred)
        .mapv(|e| e.powi(2))
        .mean()
        .unwrap_or_default()
}

/// Labels every magnitude relative to the largest one in the batch.
///
/// When every magnitude is zero all points are `Low`.
pub fn categorize(magnitudes: ArrayView1<f64>) -> Vec<ErrorCategory> {
    let max = magnitudes.fold(0.0_f64, |max, &mag| max.max(mag));

    if max == 0.0 {
        return vec![ErrorCategory::Low; magnitudes.len()];
    }

    magnitudes
        .iter()
        .map(|&mag| {
            if mag < max * MEDIUM_THRESHOLD {
                ErrorCategory::Low
            } else if mag < max * HIGH_THRESHOLD {
                ErrorCategory::Medium
            } else {
                ErrorCategory::High
            }
        })
        .collect()
}

/// Decomposes the loss and gradient into the sums a worked example shows.
pub fn breakdown(x: ArrayView1<f64>, y: ArrayView1<f64>, y_pred: ArrayView1<f64>) -> Breakdown {
    let n = x.len();
    let (errors, _) = errors(y, y_pred);
    let squared_errors = errors.mapv(|e| e.powi(2));

    let sum_squared_errors = squared_errors.sum();
    let sum_x_errors = x.dot(&errors);
    let sum_errors = errors.sum();
    let two_over_n = 2.0 / n as f64;

    Breakdown {
        n,
        sum_squared_errors,
        mse: sum_squared_errors / n as f64,
        squared_errors: squared_errors.to_vec(),
        sum_x_errors,
        sum_errors,
        dw: -two_over_n * sum_x_errors,
        db: -two_over_n * sum_errors,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    fn assert_close(got: f64, expected: f64) {
        assert!(
            (got - expected).abs() < 1e-12,
            "got {got}, expected {expected}"
        );
    }

    #[test]
    fn gradient_matches_worked_example() {
        // y = 2x + 1, starting at w = 1, b = 1
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.0, 3.0, 5.0, 7.0];

        let y_pred = predict(x.view(), 1.0, 1.0);
        assert_eq!(y_pred, array![1.0, 2.0, 3.0, 4.0]);

        let (errs, mags) = errors(y.view(), y_pred.view());
        assert_eq!(errs, array![0.0, 1.0, 2.0, 3.0]);
        assert_eq!(mags, array![0.0, 1.0, 2.0, 3.0]);

        let grad = gradient(x.view(), y.view(), y_pred.view());
        assert_close(grad.dw, -7.0);
        assert_close(grad.db, -3.0);
        assert_close(grad.magnitude, (49.0_f64 + 9.0).sqrt());

        assert_close(mse(y.view(), y_pred.view()), 3.5);

        let update = update_params(1.0, 1.0, grad.dw, grad.db, 0.1);
        assert_close(update.w, 1.7);
        assert_close(update.b, 1.3);
        assert_close(update.delta_w, 0.7);
        assert_close(update.delta_b, 0.3);
    }

    #[test]
    fn contributions_are_not_normalized() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let y_pred = predict(x.view(), 1.0, 1.0);

        let c = contributions(x.view(), y.view(), y_pred.view());
        assert_eq!(c.dw, vec![0.0, -2.0, -8.0, -18.0]);
        assert_eq!(c.db, vec![0.0, -2.0, -4.0, -6.0]);
        assert_eq!(c.errors, vec![0.0, 1.0, 2.0, 3.0]);

        let single = point_contribution(3.0, 7.0, 4.0);
        assert_eq!(single, Contribution { dw: -18.0, db: -6.0 });
    }

    #[test]
    fn mse_is_zero_only_for_exact_predictions() {
        let x = array![-1.0, 0.5, 4.0];
        let y = x.mapv(|x| 3.0 * x - 2.0);

        let exact = predict(x.view(), 3.0, -2.0);
        assert_eq!(mse(y.view(), exact.view()), 0.0);

        let off = predict(x.view(), 3.0, -1.5);
        assert!(mse(y.view(), off.view()) > 0.0);
    }

    #[test]
    fn categorize_uses_relative_thresholds() {
        let mags = array![0.0, 1.9, 2.0, 4.9, 5.0, 10.0];
        let cats = categorize(mags.view());

        use ErrorCategory::*;
        assert_eq!(cats, vec![Low, Low, Medium, Medium, High, High]);
    }

    #[test]
    fn categorize_all_exact_is_low() {
        let mags = array![0.0, 0.0, 0.0];
        assert_eq!(categorize(mags.view()), vec![ErrorCategory::Low; 3]);
    }

    #[test]
    fn breakdown_agrees_with_gradient_and_mse() {
        let x = array![0.0, 1.0, 2.0, 3.0];
        let y = array![1.0, 3.0, 5.0, 7.0];
        let y_pred = predict(x.view(), 1.0, 1.0);

        let bd = breakdown(x.view(), y.view(), y_pred.view());
        assert_eq!(bd.n, 4);
        assert_eq!(bd.squared_errors, vec![0.0, 1.0, 4.0, 9.0]);
        assert_close(bd.sum_squared_errors, 14.0);
        assert_close(bd.mse, 3.5);
        assert_close(bd.sum_x_errors, 14.0);
        assert_close(bd.sum_errors, 6.0);
        assert_close(bd.dw, -7.0);
        assert_close(bd.db, -3.0);
    }
}
