//! Human readable narration of what a step did. Read-only over step outputs.
use ndarray::ArrayView1;
use serde::{Deserialize, Serialize};

use crate::training::PointDetail;

/// A gradient component below this (in absolute value) is considered settled.
const GRADIENT_EPS: f64 = 0.1;
/// Ratio by which one side must outnumber the other to call the line unbalanced.
const SIDE_RATIO: f64 = 1.5;
const LARGE_STEP: f64 = 1.0;
const SMALL_STEP: f64 = 0.001;
const CONVERGED_MAGNITUDE: f64 = 0.01;
const FAR_MAGNITUDE: f64 = 1.0;

/// Advisory classification of a learning rate. It never blocks the value from being used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LrWarning {
    /// `lr > 0.1`
    VeryHigh,
    /// `0.05 < lr <= 0.1`
    High,
    /// `lr < 0.001`
    VeryLow,
    /// `NaN` or infinite.
    NotFinite,
}

impl LrWarning {
    pub fn message(self) -> &'static str {
        match self {
            LrWarning::VeryHigh => {
                "Learning rate is VERY HIGH! Risk of oscillation or divergence."
            }
            LrWarning::High => "Learning rate is high. The model may oscillate.",
            LrWarning::VeryLow => "Learning rate is very low. Convergence will be slow.",
            LrWarning::NotFinite => "Learning rate is not a finite number. Training will diverge.",
        }
    }
}

/// Classifies `lr`, returning `None` when it's in a comfortable range.
pub fn analyze_learning_rate(lr: f64) -> Option<LrWarning> {
    if !lr.is_finite() {
        Some(LrWarning::NotFinite)
    } else if lr > 0.1 {
        Some(LrWarning::VeryHigh)
    } else if lr > 0.05 {
        Some(LrWarning::High)
    } else if lr < 0.001 {
        Some(LrWarning::VeryLow)
    } else {
        None
    }
}

/// The inputs of a full-batch step, as seen before the update.
#[derive(Debug, Clone, Copy)]
pub struct StepContext<'a> {
    pub x: ArrayView1<'a, f64>,
    pub y: ArrayView1<'a, f64>,
    pub predictions: ArrayView1<'a, f64>,
    pub errors: ArrayView1<'a, f64>,
    pub w: f64,
    pub b: f64,
    pub dw: f64,
    pub db: f64,
    pub lr: f64,
}

/// Explains, in order: where the line sits relative to the points, where the slope and
/// intercept are headed, whether the step is too large or too small, which point pulls
/// the hardest and how close the model is to converging.
pub fn step_explanations(ctx: &StepContext<'_>) -> Vec<String> {
    let mut out = Vec::new();
    let n = ctx.x.len();

    line_position(ctx.errors, n, &mut out);
    parameter_directions(ctx, &mut out);

    let step_size = ctx.lr * ctx.dw.abs() + ctx.lr * ctx.db.abs();
    if step_size > LARGE_STEP {
        out.push("WARNING: the learning rate is too large, the steps are huge!".into());
        out.push("The risk of oscillation or divergence is high".into());
    } else if step_size < SMALL_STEP {
        out.push("Small learning rate, progress is very slow".into());
    }

    worst_point(ctx, &mut out);

    let magnitude = ctx.dw.hypot(ctx.db);
    if magnitude < CONVERGED_MAGNITUDE {
        out.push("ALMOST CONVERGED! The gradient is very small".into());
    } else if magnitude > FAR_MAGNITUDE {
        out.push("Still far from the optimum, the gradient is large".into());
    }

    out
}

fn line_position(errors: ArrayView1<'_, f64>, n: usize, out: &mut Vec<String>) {
    let above = errors.iter().filter(|&&e| e > 0.0).count();
    let below = errors.iter().filter(|&&e| e < 0.0).count();

    if above as f64 > below as f64 * SIDE_RATIO {
        out.push(format!("The line is BELOW most points ({above}/{n})"));
        out.push("The bias (b) will INCREASE to lift the line".into());
    } else if below as f64 > above as f64 * SIDE_RATIO {
        out.push(format!("The line is ABOVE most points ({below}/{n})"));
        out.push("The bias (b) will DECREASE to lower the line".into());
    } else {
        out.push("The line is fairly balanced between the points".into());
    }
}

fn parameter_directions(ctx: &StepContext<'_>, out: &mut Vec<String>) {
    let StepContext { w, b, dw, db, .. } = *ctx;

    if dw.abs() > GRADIENT_EPS {
        let direction = if dw > 0.0 { "DECREASE" } else { "INCREASE" };
        out.push(format!(
            "The slope must {direction} from w = {w:.4} (gradient w = {dw:.3})"
        ));
    } else {
        out.push(format!("The slope is nearly optimal at w = {w:.4}"));
    }

    if db.abs() > GRADIENT_EPS {
        let direction = if db > 0.0 { "DECREASE" } else { "INCREASE" };
        out.push(format!(
            "The intercept will {direction} from b = {b:.4} (gradient b = {db:.3})"
        ));
    }
}

fn worst_point(ctx: &StepContext<'_>, out: &mut Vec<String>) {
    let magnitudes = ctx.errors.mapv(f64::abs);
    let Some(mean) = magnitudes.mean() else {
        return;
    };

    let (idx, max) = magnitudes
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_idx, best), (i, &mag)| {
            if mag > best { (i, mag) } else { (best_idx, best) }
        });

    if max > mean * 2.0 {
        out.push(format!(
            "Point {idx} has the largest error ({max:.2}): y = {:.2} but the line predicts {:.2}",
            ctx.y[idx], ctx.predictions[idx]
        ));
        out.push("This point pulls the gradient strongly towards itself".into());
    }
}

/// One line narrating a single point step.
pub fn point_explanation(detail: &PointDetail) -> String {
    let position = if detail.error > 0.0 {
        "the line passes below it"
    } else if detail.error < 0.0 {
        "the line passes above it"
    } else {
        "the line passes exactly through it"
    };

    format!(
        "Point {}/{}: predicted {:.4} for y = {:.4}, error {:.4} ({position}); it adds ∂w = {:.6}, ∂b = {:.6} to the gradient",
        detail.point_index + 1,
        detail.total_points,
        detail.prediction,
        detail.y,
        detail.error,
        detail.contribution.dw,
        detail.contribution.db,
    )
}
