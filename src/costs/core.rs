//! Core contract shared by all cost terms.
//!
//! Every scoring unit in this crate implements [`CostTerm`]: construction
//! validates the problem dimensions and precomputes normalization constants,
//! evaluation is a pure function of the trajectory data it is handed.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;
use thiserror::Error;

use crate::costs::grad;

/// Errors raised by cost construction or evaluation.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CostError {
    /// Invalid construction parameters, caught before any optimizer iteration.
    #[error("invalid cost configuration: {0}")]
    Configuration(String),

    /// Trajectory data inconsistent with the dimensions the term was built for.
    #[error("shape mismatch: {0}")]
    ShapeMismatch(String),

    /// A state-dependent term was invoked without simulated states.
    #[error("missing trajectory data: {0}")]
    MissingData(String),
}

pub type CostResult<T> = Result<T, CostError>;

/// Classifies what trajectory data a cost term depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CostClass {
    /// Depends only on the control parameters.
    ControlExplicitlyRelated,
    /// Depends on the simulated quantum states.
    StateDependent,
}

/// The slice of trajectory data handed to a cost term for one evaluation.
///
/// Controls are always present, shaped `(time step, channel)`. States are
/// present only when the caller has simulated them: the states at one step
/// for step-evaluated terms, the final states otherwise. `step` identifies
/// which simulated step a step-evaluated term is looking at.
#[derive(Clone, Copy)]
pub struct EvalPoint<'a> {
    pub controls: ArrayView2<'a, Complex64>,
    pub states: Option<ArrayView2<'a, Complex64>>,
    pub step: Option<usize>,
}

impl<'a> EvalPoint<'a> {
    /// An evaluation point carrying controls only.
    pub fn controls(controls: ArrayView2<'a, Complex64>) -> Self {
        EvalPoint {
            controls,
            states: None,
            step: None,
        }
    }

    /// An evaluation point carrying controls and simulated states.
    pub fn with_states(
        controls: ArrayView2<'a, Complex64>,
        states: ArrayView2<'a, Complex64>,
    ) -> Self {
        EvalPoint {
            controls,
            states: Some(states),
            step: None,
        }
    }

    /// Tags this point with the simulated time step it belongs to.
    pub fn at_step(mut self, step: usize) -> Self {
        self.step = Some(step);
        self
    }

    /// The states tensor, or a `MissingData` error naming the term that asked.
    pub fn require_states(&self, name: &str) -> CostResult<ArrayView2<'a, Complex64>> {
        self.states.ok_or_else(|| {
            CostError::MissingData(format!("{} requires simulated states", name))
        })
    }
}

/// Contract implemented by every cost term.
///
/// A term is constructed once per optimization run from static problem
/// dimensions and is immutable thereafter; `cost` and `gradient` are pure
/// functions of their inputs, so repeated invocation during line search or
/// gradient evaluation is deterministic and side-effect-free.
pub trait CostTerm: Send + Sync {
    /// Stable identifier of this term.
    fn name(&self) -> &'static str;

    /// Nonnegative weight scaling this term's contribution.
    fn cost_multiplier(&self) -> f64;

    /// What trajectory data this term depends on.
    fn class(&self) -> CostClass;

    /// True if this term must be invoked once per simulated time step,
    /// false if it is invoked once against the full trajectory.
    fn requires_step_evaluation(&self) -> bool {
        false
    }

    /// Weighted, normalized penalty for one evaluation point.
    fn cost(&self, point: &EvalPoint<'_>) -> CostResult<f64>;

    /// Gradient of the weighted cost with respect to this term's
    /// differentiable input (controls or states, per [`CostTerm::class`]),
    /// as `d cost / d Re(z) + i * d cost / d Im(z)` per entry.
    ///
    /// The default is a central finite difference over `cost`; terms with
    /// closed-form derivatives override it.
    fn gradient(&self, point: &EvalPoint<'_>) -> CostResult<Array2<Complex64>> {
        match self.class() {
            CostClass::ControlExplicitlyRelated => grad::finite_difference_controls(self, point),
            CostClass::StateDependent => grad::finite_difference_states(self, point),
        }
    }
}

/// Rejects a negative weight at construction time.
pub(crate) fn check_multiplier(cost_multiplier: f64) -> CostResult<()> {
    if cost_multiplier < 0.0 || !cost_multiplier.is_finite() {
        return Err(CostError::Configuration(format!(
            "cost_multiplier must be finite and nonnegative, got {}",
            cost_multiplier
        )));
    }
    Ok(())
}

/// Rejects a controls tensor whose shape disagrees with the constructed
/// `(total_time_steps, control_num)` dimensions.
pub(crate) fn check_controls_shape(
    name: &str,
    controls: &ArrayView2<'_, Complex64>,
    total_time_steps: usize,
    control_num: usize,
) -> CostResult<()> {
    let (rows, cols) = controls.dim();
    if rows != total_time_steps || cols != control_num {
        return Err(CostError::ShapeMismatch(format!(
            "{} was built for controls of shape ({}, {}), got ({}, {})",
            name, total_time_steps, control_num, rows, cols
        )));
    }
    Ok(())
}

/// Rejects a states tensor whose shape disagrees with the constructed
/// `(state_count, hilbert_dim)` dimensions.
pub(crate) fn check_states_shape(
    name: &str,
    states: &ArrayView2<'_, Complex64>,
    state_count: usize,
    hilbert_dim: usize,
) -> CostResult<()> {
    let (rows, cols) = states.dim();
    if rows != state_count || cols != hilbert_dim {
        return Err(CostError::ShapeMismatch(format!(
            "{} was built for states of shape ({}, {}), got ({}, {})",
            name, state_count, hilbert_dim, rows, cols
        )));
    }
    Ok(())
}
