//! Aggregation of cost terms into one optimization objective.
//!
//! The optimizer loop owns a [`CostSet`]: terms that require per-step
//! evaluation are invoked once per simulated time step, interleaved with the
//! simulation; the rest are invoked once against the full trajectory. The
//! objective is the sum of every term's weighted cost, and its gradient is
//! the element-wise sum of the member gradients.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{CostClass, CostResult, CostTerm, EvalPoint};

/// The configured set of cost terms for one optimization run.
#[derive(Default)]
pub struct CostSet {
    terms: Vec<Box<dyn CostTerm>>,
}

impl CostSet {
    pub fn new() -> Self {
        CostSet { terms: Vec::new() }
    }

    pub fn from_terms(terms: Vec<Box<dyn CostTerm>>) -> Self {
        CostSet { terms }
    }

    pub fn push(&mut self, term: Box<dyn CostTerm>) {
        self.terms.push(term);
    }

    pub fn terms(&self) -> &[Box<dyn CostTerm>] {
        &self.terms
    }

    /// Terms invoked once per simulated time step.
    pub fn step_terms(&self) -> impl Iterator<Item = &dyn CostTerm> {
        self.terms
            .iter()
            .filter(|term| term.requires_step_evaluation())
            .map(|term| term.as_ref())
    }

    /// Terms invoked once against the full trajectory.
    pub fn trajectory_terms(&self) -> impl Iterator<Item = &dyn CostTerm> {
        self.terms
            .iter()
            .filter(|term| !term.requires_step_evaluation())
            .map(|term| term.as_ref())
    }

    /// Weighted sum of the step terms' costs at one simulated step.
    pub fn evaluate_step<'a>(
        &self,
        controls: ArrayView2<'a, Complex64>,
        states: ArrayView2<'a, Complex64>,
        step: usize,
    ) -> CostResult<f64> {
        let point = EvalPoint::with_states(controls, states).at_step(step);
        let mut total = 0.0;
        for term in self.step_terms() {
            total += term.cost(&point)?;
        }
        Ok(total)
    }

    /// Weighted sum of the whole-trajectory terms' costs.
    ///
    /// `final_states` may be omitted when no member term is state-dependent;
    /// a state-dependent term invoked without states surfaces `MissingData`
    /// rather than being skipped silently.
    pub fn evaluate_trajectory<'a>(
        &self,
        controls: ArrayView2<'a, Complex64>,
        final_states: Option<ArrayView2<'a, Complex64>>,
    ) -> CostResult<f64> {
        let point = match final_states {
            Some(states) => EvalPoint::with_states(controls, states),
            None => EvalPoint::controls(controls),
        };
        let mut total = 0.0;
        for term in self.trajectory_terms() {
            total += term.cost(&point)?;
        }
        Ok(total)
    }

    /// Grand total over a full trajectory: every step term at every provided
    /// step, every whole-trajectory term once.
    pub fn total<'a>(
        &self,
        controls: ArrayView2<'a, Complex64>,
        step_states: &'a [Array2<Complex64>],
        final_states: Option<ArrayView2<'a, Complex64>>,
    ) -> CostResult<f64> {
        let mut total = self.evaluate_trajectory(controls, final_states)?;
        for (step, states) in step_states.iter().enumerate() {
            total += self.evaluate_step(controls, states.view(), step)?;
        }
        Ok(total)
    }

    /// Element-wise sum of the control gradients of every control-explicit
    /// member term.
    pub fn control_gradient(
        &self,
        controls: ArrayView2<'_, Complex64>,
    ) -> CostResult<Array2<Complex64>> {
        let point = EvalPoint::controls(controls);
        let mut total = Array2::<Complex64>::zeros(controls.raw_dim());
        for term in self
            .terms
            .iter()
            .filter(|term| term.class() == CostClass::ControlExplicitlyRelated)
        {
            total += &term.gradient(&point)?;
        }
        Ok(total)
    }

    /// Element-wise sum of the state gradients of the state-dependent step
    /// terms at one simulated step.
    pub fn step_state_gradient<'a>(
        &self,
        controls: ArrayView2<'a, Complex64>,
        states: ArrayView2<'a, Complex64>,
        step: usize,
    ) -> CostResult<Array2<Complex64>> {
        let point = EvalPoint::with_states(controls, states).at_step(step);
        let mut total = Array2::<Complex64>::zeros(states.raw_dim());
        for term in self
            .step_terms()
            .filter(|term| term.class() == CostClass::StateDependent)
        {
            total += &term.gradient(&point)?;
        }
        Ok(total)
    }

    /// Element-wise sum of the state gradients of the state-dependent
    /// whole-trajectory terms at the final states.
    pub fn final_state_gradient<'a>(
        &self,
        controls: ArrayView2<'a, Complex64>,
        final_states: ArrayView2<'a, Complex64>,
    ) -> CostResult<Array2<Complex64>> {
        let point = EvalPoint::with_states(controls, final_states);
        let mut total = Array2::<Complex64>::zeros(final_states.raw_dim());
        for term in self
            .trajectory_terms()
            .filter(|term| term.class() == CostClass::StateDependent)
        {
            total += &term.gradient(&point)?;
        }
        Ok(total)
    }
}
