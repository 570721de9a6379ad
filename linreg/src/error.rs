use std::{
    error::Error,
    fmt::{self, Display},
};

use rand_distr::NormalError;

/// The result type used in the entire regression crate.
pub type Result<T> = std::result::Result<T, LinRegErr>;

/// The regression crate's error type.
///
/// Every variant is recoverable: an operation that returns one of these leaves the
/// session exactly as it was before the call.
#[derive(Debug, Clone, PartialEq)]
pub enum LinRegErr {
    /// A stepping or inspection operation was attempted before any dataset was loaded.
    NoDatasetLoaded,
    /// The load input was malformed: length mismatch, empty, missing or non-finite values.
    InvalidDataset { reason: String },
    /// A point step was requested after every point of the current walk was consumed.
    PointWalkExhausted { index: usize, len: usize },
    /// A synthetic dataset was requested by a name that isn't known.
    UnknownDatasetKind(String),
}

impl LinRegErr {
    pub(crate) fn invalid_dataset(reason: impl Into<String>) -> Self {
        Self::InvalidDataset {
            reason: reason.into(),
        }
    }

    /// Returns a stable, machine friendly identifier of the error class.
    pub fn kind(&self) -> &'static str {
        match self {
            LinRegErr::NoDatasetLoaded => "no_dataset_loaded",
            LinRegErr::InvalidDataset { .. } => "invalid_dataset",
            LinRegErr::PointWalkExhausted { .. } => "point_walk_exhausted",
            LinRegErr::UnknownDatasetKind(_) => "unknown_dataset_kind",
        }
    }
}

impl Display for LinRegErr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LinRegErr::NoDatasetLoaded => write!(f, "No dataset loaded"),
            LinRegErr::InvalidDataset { reason } => write!(f, "Invalid dataset: {reason}"),
            LinRegErr::PointWalkExhausted { index, len } => write!(
                f,
                "All {len} points of the current walk were consumed (cursor at {index}), reset the walk to continue"
            ),
            LinRegErr::UnknownDatasetKind(name) => write!(f, "Unknown dataset type: {name}"),
        }
    }
}

impl Error for LinRegErr {}

impl From<NormalError> for LinRegErr {
    fn from(value: NormalError) -> Self {
        Self::invalid_dataset(value.to_string())
    }
}
