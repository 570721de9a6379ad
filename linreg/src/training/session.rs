use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use super::{
    BatchStepReport, DEFAULT_LEARNING_RATE, EpochSummary, History, Model, PointDetail, PointStep,
    PointWalk, Snapshot,
};
use crate::{
    Dataset, LinRegErr, Result,
    data::Sample,
    explain::{self, LrWarning, StepContext},
    kernel::{self, Contribution, Gradient},
};

/// Where the session stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No dataset loaded.
    Idle,
    /// Dataset loaded, no point walk in progress.
    Ready,
    /// A point-by-point epoch is in progress.
    WalkingPoints,
}

/// A single training session: the dataset, the model, its history and the cursor of the
/// point-by-point protocol.
///
/// The session performs no locking. Callers sharing it between tasks must serialize
/// access to it. Every operation either completes or fails without touching any state.
#[derive(Debug, Clone)]
pub struct Session {
    dataset: Option<Dataset>,
    model: Model,
    history: History,
    learning_rate: f64,
    walk: PointWalk,
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

impl Session {
    /// Returns an idle session with the initial model and the default learning rate.
    pub fn new() -> Self {
        Self {
            dataset: None,
            model: Model::default(),
            history: History::default(),
            learning_rate: DEFAULT_LEARNING_RATE,
            walk: PointWalk::Inactive,
        }
    }

    pub fn phase(&self) -> Phase {
        match (&self.dataset, self.walk) {
            (None, _) => Phase::Idle,
            (Some(_), PointWalk::Walking { .. }) => Phase::WalkingPoints,
            (Some(_), _) => Phase::Ready,
        }
    }

    pub fn dataset(&self) -> Option<&Dataset> {
        self.dataset.as_ref()
    }

    pub fn model(&self) -> Model {
        self.model
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    /// The number of committed epochs.
    pub fn epoch(&self) -> usize {
        self.history.len()
    }

    pub fn point_walk(&self) -> PointWalk {
        self.walk
    }

    /// Validates `x` and `y` and loads them as the new dataset.
    ///
    /// # Errors
    /// `InvalidDataset` if the input is malformed, in which case nothing changes.
    pub fn load(&mut self, x: Vec<f64>, y: Vec<f64>) -> Result<&Dataset> {
        let dataset = Dataset::new(x, y)?;
        Ok(self.load_dataset(dataset))
    }

    /// Replaces the dataset and resets the model, history and point walk. The learning
    /// rate is kept.
    pub fn load_dataset(&mut self, dataset: Dataset) -> &Dataset {
        info!(num_points = dataset.len(); "loading dataset");
        self.reset_model();
        self.dataset.insert(dataset)
    }

    /// Runs one full-batch gradient descent step and commits it as a new epoch.
    ///
    /// A point walk in progress is abandoned, its partial sums were computed against the
    /// parameters this step replaces.
    ///
    /// # Errors
    /// `NoDatasetLoaded` if the session is idle.
    pub fn full_batch_step(&mut self) -> Result<BatchStepReport> {
        let dataset = self.dataset.as_ref().ok_or(LinRegErr::NoDatasetLoaded)?;
        let (x, y) = (dataset.x(), dataset.y());
        let Model { w, b } = self.model;
        let lr = self.learning_rate;

        let predictions_before = kernel::predict(x, w, b);
        let (errors, magnitudes) = kernel::errors(y, predictions_before.view());
        let contributions = kernel::contributions(x, y, predictions_before.view());
        let gradient = kernel::gradient(x, y, predictions_before.view());
        let update = kernel::update_params(w, b, gradient.dw, gradient.db, lr);
        let predictions_after = kernel::predict(x, update.w, update.b);

        let loss_before = kernel::mse(y, predictions_before.view());
        let loss_after = kernel::mse(y, predictions_after.view());

        let explanations = explain::step_explanations(&StepContext {
            x,
            y,
            predictions: predictions_before.view(),
            errors: errors.view(),
            w,
            b,
            dw: gradient.dw,
            db: gradient.db,
            lr,
        });
        let error_categories = kernel::categorize(magnitudes.view());

        if self.walk.is_walking() {
            warn!(index = self.walk.index(); "full-batch step abandons the point walk in progress");
        }

        let model = Model {
            w: update.w,
            b: update.b,
        };
        self.commit(model, loss_after);
        self.walk = PointWalk::Inactive;

        Ok(BatchStepReport {
            epoch: self.epoch(),
            w_before: w,
            b_before: b,
            w_after: update.w,
            b_after: update.b,
            delta_w: update.delta_w,
            delta_b: update.delta_b,
            gradient,
            loss_before,
            loss_after,
            loss_delta: loss_after - loss_before,
            loss_history: self.history.loss().to_vec(),
            errors: errors.to_vec(),
            error_magnitudes: magnitudes.to_vec(),
            error_categories,
            contributions,
            predictions_before: predictions_before.to_vec(),
            predictions_after: predictions_after.to_vec(),
            explanations,
            learning_rate: lr,
            step_size: lr * gradient.magnitude,
        })
    }

    /// Starts a point walk at the first point, or keeps the one in progress untouched.
    ///
    /// # Errors
    /// `NoDatasetLoaded` if the session is idle.
    pub fn begin_point_walk(&mut self) -> Result<()> {
        if self.dataset.is_none() {
            return Err(LinRegErr::NoDatasetLoaded);
        }

        if !self.walk.is_walking() {
            debug!("beginning point walk");
            self.walk = PointWalk::start();
        }

        Ok(())
    }

    /// Visits the next point of the walk, beginning one if none is in progress.
    ///
    /// The point's contribution is computed against the current parameters and added,
    /// normalized by `n`, to the walk's accumulators. Visiting the last point commits the
    /// accumulated gradient as a new epoch.
    ///
    /// # Errors
    /// - `NoDatasetLoaded` if the session is idle.
    /// - `PointWalkExhausted` if the last walk already committed and wasn't reset.
    pub fn point_step(&mut self) -> Result<PointStep> {
        let dataset = self.dataset.as_ref().ok_or(LinRegErr::NoDatasetLoaded)?;
        let n = dataset.len();

        let (index, acc_dw, acc_db) = match self.walk {
            PointWalk::Inactive => (0, 0.0, 0.0),
            PointWalk::Walking {
                index,
                acc_dw,
                acc_db,
            } => (index, acc_dw, acc_db),
            PointWalk::Exhausted => (n, 0.0, 0.0),
        };

        if index >= n {
            warn!(index = index, len = n; "point step requested on an exhausted walk");
            return Err(LinRegErr::PointWalkExhausted { index, len: n });
        }

        let Sample { x, y } = dataset.sample(index);
        let Model { w, b } = self.model;

        let prediction = kernel::predict_point(x, w, b);
        let contribution = kernel::point_contribution(x, y, prediction);
        let inv_n = 1.0 / n as f64;
        let accumulated = Contribution {
            dw: acc_dw + contribution.dw * inv_n,
            db: acc_db + contribution.db * inv_n,
        };

        let mut detail = PointDetail {
            point_index: index,
            total_points: n,
            x,
            y,
            prediction,
            error: y - prediction,
            contribution,
            accumulated,
            w_current: w,
            b_current: b,
            explanation: String::new(),
        };
        detail.explanation = explain::point_explanation(&detail);

        if !detail.is_last_point() {
            self.walk = PointWalk::Walking {
                index: index + 1,
                acc_dw: accumulated.dw,
                acc_db: accumulated.db,
            };
            return Ok(PointStep::Advanced { detail });
        }

        let lr = self.learning_rate;
        let (xs, ys) = (dataset.x(), dataset.y());
        let loss_before = kernel::mse(ys, kernel::predict(xs, w, b).view());

        let update = kernel::update_params(w, b, accumulated.dw, accumulated.db, lr);
        let predictions = kernel::predict(xs, update.w, update.b);
        let (errors, magnitudes) = kernel::errors(ys, predictions.view());
        let loss_after = kernel::mse(ys, predictions.view());
        let error_categories = kernel::categorize(magnitudes.view());

        let model = Model {
            w: update.w,
            b: update.b,
        };
        self.commit(model, loss_after);
        self.walk = PointWalk::Exhausted;

        let summary = EpochSummary {
            epoch: self.epoch(),
            gradient: Gradient::new(accumulated.dw, accumulated.db),
            w_new: update.w,
            b_new: update.b,
            delta_w: update.delta_w,
            delta_b: update.delta_b,
            loss_before,
            loss_after,
            loss_history: self.history.loss().to_vec(),
            predictions: predictions.to_vec(),
            errors: errors.to_vec(),
            error_magnitudes: magnitudes.to_vec(),
            error_categories,
        };

        Ok(PointStep::Committed { detail, summary })
    }

    /// Drops the point walk in progress, if any, without touching the model or history.
    pub fn reset_point_walk(&mut self) {
        self.walk = PointWalk::Inactive;
    }

    /// Resets the model to its initial parameters, clearing the history and the point
    /// walk. The dataset and the learning rate are kept.
    pub fn reset_model(&mut self) -> Model {
        self.model = Model::default();
        self.history.clear();
        self.walk = PointWalk::Inactive;
        self.model
    }

    /// Sets the learning rate and returns the advisory warning for it, if any.
    ///
    /// The value is stored as given, whether or not a warning is returned.
    pub fn set_learning_rate(&mut self, lr: f64) -> Option<LrWarning> {
        self.learning_rate = lr;
        let warning = explain::analyze_learning_rate(lr);
        if let Some(warning) = warning {
            debug!(lr = lr; "{}", warning.message());
        }

        warning
    }

    /// Returns the session to its initial idle state, forgetting the dataset and the
    /// learning rate too.
    pub fn hard_reset(&mut self) {
        info!("hard reset");
        *self = Self::new();
    }

    /// Takes a read-only snapshot of the current model against the dataset.
    ///
    /// # Errors
    /// `NoDatasetLoaded` if the session is idle.
    pub fn snapshot(&self) -> Result<Snapshot> {
        let dataset = self.dataset.as_ref().ok_or(LinRegErr::NoDatasetLoaded)?;
        let (x, y) = (dataset.x(), dataset.y());
        let model = self.model;

        let predictions = kernel::predict(x, model.w, model.b);
        let (errors, _) = kernel::errors(y, predictions.view());

        Ok(Snapshot {
            model,
            equation: model.equation(),
            loss: kernel::mse(y, predictions.view()),
            gradient: kernel::gradient(x, y, predictions.view()),
            breakdown: kernel::breakdown(x, y, predictions.view()),
            contributions: kernel::contributions(x, y, predictions.view()),
            predictions: predictions.to_vec(),
            errors: errors.to_vec(),
            epoch: self.epoch(),
            learning_rate: self.learning_rate,
        })
    }

    fn commit(&mut self, model: Model, loss: f64) {
        self.model = model;
        self.history.push(loss, model);
        debug!(epoch = self.history.len(), w = model.w, b = model.b, loss = loss; "epoch committed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const REL_TOL: f64 = 1e-9;

    fn assert_close(got: f64, expected: f64) {
        let scale = expected.abs().max(1.0);
        assert!(
            (got - expected).abs() <= REL_TOL * scale,
            "got {got}, expected {expected}"
        );
    }

    fn worked_example() -> Session {
        let mut session = Session::new();
        session
            .load(vec![0.0, 1.0, 2.0, 3.0], vec![1.0, 3.0, 5.0, 7.0])
            .unwrap();
        session.set_learning_rate(0.1);
        session
    }

    #[test]
    fn new_session_is_idle() {
        let session = Session::new();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.model(), Model { w: 1.0, b: 1.0 });
        assert_eq!(session.learning_rate(), DEFAULT_LEARNING_RATE);
        assert_eq!(session.epoch(), 0);
    }

    #[test]
    fn stepping_without_dataset_fails() {
        let mut session = Session::new();
        assert_eq!(session.full_batch_step().unwrap_err(), LinRegErr::NoDatasetLoaded);
        assert_eq!(session.point_step().unwrap_err(), LinRegErr::NoDatasetLoaded);
        assert_eq!(session.begin_point_walk().unwrap_err(), LinRegErr::NoDatasetLoaded);
        assert_eq!(session.snapshot().unwrap_err(), LinRegErr::NoDatasetLoaded);
        assert_eq!(session.phase(), Phase::Idle);
    }

    #[test]
    fn invalid_load_leaves_state_unchanged() {
        let mut session = worked_example();
        session.full_batch_step().unwrap();
        let model = session.model();

        let err = session.load(vec![1.0, 2.0], vec![1.0]).unwrap_err();
        assert_eq!(err.kind(), "invalid_dataset");
        assert_eq!(session.model(), model);
        assert_eq!(session.epoch(), 1);
        assert_eq!(session.dataset().map(Dataset::len), Some(4));
    }

    #[test]
    fn full_batch_step_matches_worked_example() {
        let mut session = worked_example();
        let report = session.full_batch_step().unwrap();

        assert_eq!(report.epoch, 1);
        assert_eq!(report.predictions_before, vec![1.0, 2.0, 3.0, 4.0]);
        assert_eq!(report.errors, vec![0.0, 1.0, 2.0, 3.0]);
        assert_close(report.gradient.dw, -7.0);
        assert_close(report.gradient.db, -3.0);
        assert_close(report.w_after, 1.7);
        assert_close(report.b_after, 1.3);
        assert_close(report.loss_before, 3.5);
        assert!(report.loss_after < report.loss_before);
        assert_close(report.loss_delta, report.loss_after - report.loss_before);
        assert_close(report.step_size, 0.1 * report.gradient.magnitude);
        assert_eq!(report.contributions.dw, vec![0.0, -2.0, -8.0, -18.0]);
        assert_eq!(report.loss_history, vec![report.loss_after]);
        assert!(!report.explanations.is_empty());

        assert_eq!(session.model(), Model { w: report.w_after, b: report.b_after });
        assert_eq!(session.history().w(), &[report.w_after]);
        assert_eq!(session.history().b(), &[report.b_after]);
    }

    #[test]
    fn point_walk_commits_only_on_last_point() {
        let mut session = worked_example();

        for i in 0..3 {
            let step = session.point_step().unwrap();
            assert!(!step.is_committed());
            assert!(step.summary().is_none());
            assert_eq!(step.detail().point_index, i);
            assert_eq!(session.model(), Model { w: 1.0, b: 1.0 });
            assert_eq!(session.phase(), Phase::WalkingPoints);
            assert_eq!(session.epoch(), 0);
        }

        let step = session.point_step().unwrap();
        let summary = step.summary().unwrap();
        assert!(step.detail().is_last_point());
        assert_close(summary.w_new, 1.7);
        assert_close(summary.b_new, 1.3);
        assert_close(summary.loss_before, 3.5);
        assert_eq!(summary.epoch, 1);
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.point_walk(), PointWalk::Exhausted);
    }

    #[test]
    fn point_walk_accumulates_normalized_contributions() {
        let mut session = worked_example();

        let expected = [(0.0, 0.0), (-0.5, -0.5), (-2.5, -1.5), (-7.0, -3.0)];
        for (dw, db) in expected {
            let step = session.point_step().unwrap();
            assert_close(step.detail().accumulated.dw, dw);
            assert_close(step.detail().accumulated.db, db);
        }
    }

    #[test]
    fn exhausted_walk_refuses_until_reset() {
        let mut session = worked_example();
        for _ in 0..4 {
            session.point_step().unwrap();
        }

        let before = session.model();
        let err = session.point_step().unwrap_err();
        assert_eq!(err, LinRegErr::PointWalkExhausted { index: 4, len: 4 });
        assert_eq!(session.model(), before);
        assert_eq!(session.epoch(), 1);

        session.reset_point_walk();
        let step = session.point_step().unwrap();
        assert_eq!(step.detail().point_index, 0);
        assert_eq!(step.detail().w_current, before.w);
    }

    #[test]
    fn begin_point_walk_does_not_rewind_a_walk_in_progress() {
        let mut session = worked_example();
        session.begin_point_walk().unwrap();
        session.point_step().unwrap();
        session.point_step().unwrap();

        session.begin_point_walk().unwrap();
        assert_eq!(session.point_walk().index(), 2);

        session.reset_point_walk();
        session.reset_point_walk();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.point_walk(), PointWalk::Inactive);
    }

    #[test]
    fn full_batch_step_abandons_point_walk() {
        let mut session = worked_example();
        session.point_step().unwrap();

        session.full_batch_step().unwrap();
        assert_eq!(session.phase(), Phase::Ready);
        assert_eq!(session.point_step().unwrap().detail().point_index, 0);
    }

    #[test]
    fn reset_model_keeps_dataset_and_learning_rate() {
        let mut session = worked_example();
        session.full_batch_step().unwrap();
        session.point_step().unwrap();

        let model = session.reset_model();
        assert_eq!(model, Model { w: 1.0, b: 1.0 });
        assert_eq!(session.epoch(), 0);
        assert!(session.history().is_empty());
        assert_eq!(session.learning_rate(), 0.1);
        assert_eq!(session.dataset().map(Dataset::len), Some(4));
        assert_eq!(session.phase(), Phase::Ready);
    }

    #[test]
    fn hard_reset_forgets_everything() {
        let mut session = worked_example();
        session.full_batch_step().unwrap();

        session.hard_reset();
        assert_eq!(session.phase(), Phase::Idle);
        assert_eq!(session.learning_rate(), DEFAULT_LEARNING_RATE);
        assert_eq!(session.epoch(), 0);
        assert_eq!(session.model(), Model::default());
    }

    #[test]
    fn learning_rate_is_stored_even_with_warning() {
        let mut session = Session::new();
        assert_eq!(session.set_learning_rate(0.5), Some(LrWarning::VeryHigh));
        assert_eq!(session.learning_rate(), 0.5);
        assert_eq!(session.set_learning_rate(0.02), None);
        assert_eq!(session.set_learning_rate(-1.0), Some(LrWarning::VeryLow));
        assert_eq!(session.learning_rate(), -1.0);
    }

    #[test]
    fn snapshot_is_read_only() {
        let session = worked_example();
        let snapshot = session.snapshot().unwrap();

        assert_eq!(snapshot.equation, "y = 1.0000·x + 1.0000");
        assert_close(snapshot.loss, 3.5);
        assert_close(snapshot.gradient.dw, -7.0);
        assert_close(snapshot.breakdown.sum_x_errors, 14.0);
        assert_close(snapshot.breakdown.sum_errors, 6.0);
        assert_close(snapshot.breakdown.sum_squared_errors, 14.0);
        assert_eq!(snapshot.epoch, 0);
        assert_eq!(session.epoch(), 0);
    }
}
