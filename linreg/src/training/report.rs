use serde::{Deserialize, Serialize};

use super::Model;
use crate::kernel::{Breakdown, Contribution, Contributions, ErrorCategory, Gradient};

/// Everything a full-batch step computed, before and after the update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchStepReport {
    pub epoch: usize,

    #[serde(deserialize_with = "crate::float::lenient")]
    pub w_before: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b_before: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub w_after: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b_after: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_w: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_b: f64,

    pub gradient: Gradient,

    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_before: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_after: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_delta: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_history: Vec<f64>,

    /// Per-point figures, against the parameters before the update.
    #[serde(deserialize_with = "crate::float::lenient")]
    pub errors: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub error_magnitudes: Vec<f64>,
    pub error_categories: Vec<ErrorCategory>,
    pub contributions: Contributions,

    #[serde(deserialize_with = "crate::float::lenient")]
    pub predictions_before: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub predictions_after: Vec<f64>,

    pub explanations: Vec<String>,

    #[serde(deserialize_with = "crate::float::lenient")]
    pub learning_rate: f64,
    /// `learning_rate * gradient.magnitude`
    #[serde(deserialize_with = "crate::float::lenient")]
    pub step_size: f64,
}

/// What a single point step revealed about the visited point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointDetail {
    pub point_index: usize,
    pub total_points: usize,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub x: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub y: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub prediction: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub error: f64,
    /// Raw, un-normalized contribution of this point.
    pub contribution: Contribution,
    /// Running `1/n` normalized sum of the contributions seen so far in the walk.
    pub accumulated: Contribution,
    /// Parameters the point was evaluated against.
    #[serde(deserialize_with = "crate::float::lenient")]
    pub w_current: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b_current: f64,
    pub explanation: String,
}

impl PointDetail {
    #[inline]
    pub fn is_last_point(&self) -> bool {
        self.point_index + 1 == self.total_points
    }
}

/// The epoch committed by the last point of a walk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EpochSummary {
    pub epoch: usize,
    /// The accumulated gradient the update was taken with.
    pub gradient: Gradient,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub w_new: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b_new: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_w: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub delta_b: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_before: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_after: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss_history: Vec<f64>,
    /// Per-point figures, against the updated parameters.
    #[serde(deserialize_with = "crate::float::lenient")]
    pub predictions: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub errors: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub error_magnitudes: Vec<f64>,
    pub error_categories: Vec<ErrorCategory>,
}

/// The outcome of a point step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PointStep {
    /// The walk moved to the next point, the model is unchanged.
    Advanced { detail: PointDetail },
    /// The last point was consumed and the epoch was committed.
    Committed {
        detail: PointDetail,
        summary: EpochSummary,
    },
}

impl PointStep {
    pub fn detail(&self) -> &PointDetail {
        match self {
            PointStep::Advanced { detail } | PointStep::Committed { detail, .. } => detail,
        }
    }

    pub fn summary(&self) -> Option<&EpochSummary> {
        match self {
            PointStep::Advanced { .. } => None,
            PointStep::Committed { summary, .. } => Some(summary),
        }
    }

    #[inline]
    pub fn is_committed(&self) -> bool {
        matches!(self, PointStep::Committed { .. })
    }
}

/// A read-only picture of the session, with the worked-example decomposition of the
/// loss and gradient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub model: Model,
    pub equation: String,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub loss: f64,
    pub gradient: Gradient,
    pub breakdown: Breakdown,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub predictions: Vec<f64>,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub errors: Vec<f64>,
    pub contributions: Contributions,
    pub epoch: usize,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub learning_rate: f64,
}
