//! The messages exchanged between a client and the training server.
//!
//! Every request is answered by exactly one response.

use linreg::{BatchStepReport, DatasetSummary, LinRegErr, LrWarning, PointStep, Snapshot};
use serde::{Deserialize, Serialize};

/// A request sent from the client to the server.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Request {
    /// Loads the given points as the dataset.
    LoadDataset { x: Vec<f64>, y: Vec<f64> },
    /// Loads a dataset from the contents of a CSV file.
    LoadCsv { content: String },
    /// Loads a synthetic dataset. `kind` is one of `simple`, `noisy` or `outliers`.
    Generate {
        kind: String,
        #[serde(default)]
        num_points: Option<usize>,
        #[serde(default)]
        noise_level: Option<f64>,
        #[serde(default)]
        seed: Option<u64>,
    },
    DatasetInfo,
    /// Runs one full-batch step.
    GradientStep,
    /// Visits the next point of the point walk.
    PointStep,
    /// Drops the point walk in progress.
    PointReset,
    CurrentState,
    SetLearningRate { learning_rate: f64 },
    /// Resets the model, keeping the dataset and the learning rate.
    ResetModel,
    /// Resets the whole session.
    ResetAll,
    Health,
    Disconnect,
}

/// A response sent from the server to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    DatasetLoaded {
        message: String,
        summary: DatasetSummary,
        x_values: Vec<f64>,
        y_values: Vec<f64>,
    },
    DatasetInfo {
        summary: DatasetSummary,
    },
    BatchStep {
        report: BatchStepReport,
    },
    PointStep {
        step: PointStep,
    },
    State {
        snapshot: Snapshot,
    },
    LearningRate {
        learning_rate: f64,
        warnings: Vec<String>,
        status: String,
    },
    ModelReset {
        message: String,
        w: f64,
        b: f64,
        learning_rate: f64,
    },
    Reset {
        message: String,
    },
    Health {
        status: String,
    },
    /// Acknowledges a `Disconnect`, the server closes the connection right after.
    Disconnected,
    Err {
        kind: String,
        detail: String,
    },
}

impl Response {
    /// Returns a new `LearningRate` response for `learning_rate` and its warning, if any.
    pub fn learning_rate(learning_rate: f64, warning: Option<LrWarning>) -> Self {
        let (warnings, status) = match warning {
            Some(warning) => (vec![warning.message().to_string()], "warning"),
            None => (Vec::new(), "ok"),
        };

        Response::LearningRate {
            learning_rate,
            warnings,
            status: status.to_string(),
        }
    }

    /// Returns a new `Err` response for a request that couldn't even be decoded.
    pub fn bad_request(detail: impl ToString) -> Self {
        Response::Err {
            kind: "bad_request".to_string(),
            detail: detail.to_string(),
        }
    }

    #[inline]
    pub fn is_err(&self) -> bool {
        matches!(self, Response::Err { .. })
    }
}

impl From<LinRegErr> for Response {
    fn from(err: LinRegErr) -> Self {
        Response::Err {
            kind: err.kind().to_string(),
            detail: err.to_string(),
        }
    }
}
