pub mod csv;
pub mod dataset;
pub mod synthetic;

pub use dataset::{Dataset, DatasetSummary, Sample};
pub use synthetic::{DatasetKind, GenerateOptions};
