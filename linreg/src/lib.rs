//! Univariate linear regression trained by gradient descent, one visible step at a time.
//!
//! The crate is split in three layers:
//! - `kernel`: stateless numeric functions (predictions, errors, gradients, MSE).
//! - `data`: validated datasets, CSV ingestion and synthetic generation.
//! - `training`: the stateful `Session` exposing the full-batch and point-by-point protocols.
//!
//! `explain` turns step outputs into human readable narration and never touches session state.

pub mod data;
pub mod error;
pub mod explain;
pub mod float;
pub mod kernel;
pub mod training;

pub use data::{Dataset, DatasetKind, DatasetSummary, GenerateOptions, Sample};
pub use error::{LinRegErr, Result};
pub use explain::LrWarning;
pub use kernel::{Breakdown, Contribution, Contributions, ErrorCategory, Gradient, ParamUpdate};
pub use training::{
    BatchStepReport, DEFAULT_LEARNING_RATE, EpochSummary, History, Model, Phase, PointDetail,
    PointStep, PointWalk, Session, Snapshot,
};
