mod report;
mod session;
mod state;

pub use report::{BatchStepReport, EpochSummary, PointDetail, PointStep, Snapshot};
pub use session::{Phase, Session};
pub use state::{DEFAULT_LEARNING_RATE, History, Model, PointWalk};
