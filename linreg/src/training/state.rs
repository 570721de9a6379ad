use serde::{Deserialize, Serialize};

/// The learning rate of a fresh session.
pub const DEFAULT_LEARNING_RATE: f64 = 0.01;

const INITIAL_W: f64 = 1.0;
const INITIAL_B: f64 = 1.0;

/// The model's parameters, `y = w*x + b`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Model {
    #[serde(deserialize_with = "crate::float::lenient")]
    pub w: f64,
    #[serde(deserialize_with = "crate::float::lenient")]
    pub b: f64,
}

impl Model {
    /// Renders the model as an equation, e.g. `y = 1.7000·x + 1.3000`.
    pub fn equation(&self) -> String {
        format!("y = {:.4}·x + {:.4}", self.w, self.b)
    }
}

impl Default for Model {
    fn default() -> Self {
        Self {
            w: INITIAL_W,
            b: INITIAL_B,
        }
    }
}

/// Per-epoch trace of the loss and parameters.
///
/// The three sequences are only ever grown together, so they always have the same
/// length: the number of committed epochs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct History {
    loss: Vec<f64>,
    w: Vec<f64>,
    b: Vec<f64>,
}

impl History {
    pub fn push(&mut self, loss: f64, model: Model) {
        self.loss.push(loss);
        self.w.push(model.w);
        self.b.push(model.b);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.loss.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.loss.is_empty()
    }

    pub fn loss(&self) -> &[f64] {
        &self.loss
    }

    pub fn w(&self) -> &[f64] {
        &self.w
    }

    pub fn b(&self) -> &[f64] {
        &self.b
    }

    pub fn clear(&mut self) {
        self.loss.clear();
        self.w.clear();
        self.b.clear();
    }
}

/// Cursor of the point-by-point protocol.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub enum PointWalk {
    /// No walk in progress, the next point step starts one.
    #[default]
    Inactive,
    /// A walk is in progress. The accumulators hold the `1/n` normalized sum of the
    /// contributions of every point before `index`.
    Walking {
        index: usize,
        acc_dw: f64,
        acc_db: f64,
    },
    /// The last walk committed its epoch. Point steps are refused until the walk
    /// is reset or a new one is begun.
    Exhausted,
}

impl PointWalk {
    /// A walk positioned at the first point with empty accumulators.
    pub fn start() -> Self {
        PointWalk::Walking {
            index: 0,
            acc_dw: 0.0,
            acc_db: 0.0,
        }
    }

    #[inline]
    pub fn is_walking(&self) -> bool {
        matches!(self, PointWalk::Walking { .. })
    }

    /// The index of the next point to consume, zero when no walk is in progress.
    pub fn index(&self) -> usize {
        match *self {
            PointWalk::Walking { index, .. } => index,
            PointWalk::Inactive | PointWalk::Exhausted => 0,
        }
    }
}
