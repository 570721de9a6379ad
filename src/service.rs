use std::sync::Arc;

use comms::msg::{Request, Response};
use linreg::{data::csv, data::synthetic, Dataset, DatasetKind, GenerateOptions, LinRegErr, Session};
use log::{debug, warn};
use parking_lot::Mutex;

const HEALTHY: &str = "healthy";

/// Maps requests onto the single shared training session.
///
/// Cloning is cheap, every clone drives the same session. Each request holds the lock for
/// its whole duration, so concurrent requests never interleave.
#[derive(Debug, Clone, Default)]
pub struct Service {
    session: Arc<Mutex<Session>>,
}

impl Service {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handles `req`, turning any session error into a `Response::Err`.
    pub fn handle(&self, req: Request) -> Response {
        debug!("handling {req:?}");

        self.dispatch(req).unwrap_or_else(|err| {
            warn!(kind = err.kind(); "request rejected: {err}");
            err.into()
        })
    }

    fn dispatch(&self, req: Request) -> linreg::Result<Response> {
        let mut session = self.session.lock();

        let resp = match req {
            Request::LoadDataset { x, y } => {
                let dataset = session.load(x, y)?;
                loaded(dataset, format!("Loaded {} points", dataset.len()))
            }
            Request::LoadCsv { content } => {
                let dataset = session.load_dataset(csv::parse(&content)?);
                loaded(dataset, format!("Loaded {} points from CSV", dataset.len()))
            }
            Request::Generate {
                kind,
                num_points,
                noise_level,
                seed,
            } => {
                let kind: DatasetKind = kind.parse()?;
                let opts = GenerateOptions {
                    kind,
                    num_points: num_points.unwrap_or(synthetic::DEFAULT_NUM_POINTS),
                    noise_level,
                    seed: seed.unwrap_or(synthetic::DEFAULT_SEED),
                };

                let dataset = session.load_dataset(synthetic::generate(&opts)?);
                loaded(dataset, format!("{}: {} points", kind.description(), dataset.len()))
            }
            Request::DatasetInfo => {
                let dataset = session.dataset().ok_or(LinRegErr::NoDatasetLoaded)?;
                Response::DatasetInfo {
                    summary: dataset.summary(),
                }
            }
            Request::GradientStep => Response::BatchStep {
                report: session.full_batch_step()?,
            },
            Request::PointStep => Response::PointStep {
                step: session.point_step()?,
            },
            Request::PointReset => {
                session.reset_point_walk();
                Response::Reset {
                    message: "Point walk reset".to_string(),
                }
            }
            Request::CurrentState => Response::State {
                snapshot: session.snapshot()?,
            },
            Request::SetLearningRate { learning_rate } => {
                let warning = session.set_learning_rate(learning_rate);
                Response::learning_rate(learning_rate, warning)
            }
            Request::ResetModel => {
                let model = session.reset_model();
                Response::ModelReset {
                    message: "Model reset".to_string(),
                    w: model.w,
                    b: model.b,
                    learning_rate: session.learning_rate(),
                }
            }
            Request::ResetAll => {
                session.hard_reset();
                Response::Reset {
                    message: "Session reset".to_string(),
                }
            }
            Request::Health => Response::Health {
                status: HEALTHY.to_string(),
            },
            Request::Disconnect => Response::Disconnected,
        };

        Ok(resp)
    }
}

fn loaded(dataset: &Dataset, message: String) -> Response {
    Response::DatasetLoaded {
        message,
        summary: dataset.summary(),
        x_values: dataset.x().to_vec(),
        y_values: dataset.y().to_vec(),
    }
}
