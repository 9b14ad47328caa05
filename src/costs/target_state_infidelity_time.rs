//! A cost that penalizes deviation from the target states at every step.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{
    check_multiplier, check_states_shape, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes the running infidelity of the evolving states against their
/// targets at every simulated time step, steering the whole trajectory (not
/// just the endpoint) toward the targets.
///
/// Each step's infidelity is divided by the step count so the accumulated
/// contributions stay on the same scale as the final-state variant.
#[derive(Debug, Clone)]
pub struct TargetStateInfidelityTime {
    cost_multiplier: f64,
    state_count: usize,
    hilbert_dim: usize,
    total_time_steps: usize,
    targets: Array2<Complex64>,
    targets_conj: Array2<Complex64>,
}

impl TargetStateInfidelityTime {
    pub const NAME: &'static str = "target_state_infidelity_time";

    pub fn new(
        target_states: Array2<Complex64>,
        total_time_steps: usize,
        cost_multiplier: f64,
    ) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        if total_time_steps == 0 {
            return Err(CostError::Configuration(
                "total_time_steps must be positive".into(),
            ));
        }
        let (state_count, hilbert_dim) = target_states.dim();
        if state_count == 0 || hilbert_dim == 0 {
            return Err(CostError::Configuration(
                "target_states must be a nonempty (state, amplitude) matrix".into(),
            ));
        }

        let targets_conj = target_states.mapv(|x| x.conj());
        Ok(TargetStateInfidelityTime {
            cost_multiplier,
            state_count,
            hilbert_dim,
            total_time_steps,
            targets: target_states,
            targets_conj,
        })
    }

    fn overlap(&self, states: &ArrayView2<'_, Complex64>) -> Complex64 {
        (&self.targets_conj * states).sum()
    }
}

impl CostTerm for TargetStateInfidelityTime {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn cost_multiplier(&self) -> f64 {
        self.cost_multiplier
    }

    fn class(&self) -> CostClass {
        CostClass::StateDependent
    }

    fn requires_step_evaluation(&self) -> bool {
        true
    }

    fn cost(&self, point: &EvalPoint<'_>) -> CostResult<f64> {
        let states = point.require_states(Self::NAME)?;
        check_states_shape(Self::NAME, &states, self.state_count, self.hilbert_dim)?;

        let state_count_sqr = (self.state_count * self.state_count) as f64;
        let fidelity = self.overlap(&states).norm_sqr() / state_count_sqr;
        Ok((1.0 - fidelity) / self.total_time_steps as f64 * self.cost_multiplier)
    }

    fn gradient(&self, point: &EvalPoint<'_>) -> CostResult<Array2<Complex64>> {
        let states = point.require_states(Self::NAME)?;
        check_states_shape(Self::NAME, &states, self.state_count, self.hilbert_dim)?;

        let state_count_sqr = (self.state_count * self.state_count) as f64;
        let overlap = self.overlap(&states);
        let scale =
            -2.0 * self.cost_multiplier / (state_count_sqr * self.total_time_steps as f64);
        Ok(self.targets.mapv(|t| t * overlap * scale))
    }
}
