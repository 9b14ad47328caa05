//! A cost that penalizes deviation of the final states from target states.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{
    check_multiplier, check_states_shape, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes the infidelity of the final evolved states against their
/// targets: `1 - |sum_i <target_i|state_i>|^2 / state_count^2`.
///
/// The coherent sum over states rewards evolutions that reach every target
/// with a consistent global phase.
#[derive(Debug, Clone)]
pub struct TargetStateInfidelity {
    cost_multiplier: f64,
    state_count: usize,
    hilbert_dim: usize,
    targets: Array2<Complex64>,
    targets_conj: Array2<Complex64>,
}

impl TargetStateInfidelity {
    pub const NAME: &'static str = "target_state_infidelity";

    pub fn new(target_states: Array2<Complex64>, cost_multiplier: f64) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        let (state_count, hilbert_dim) = target_states.dim();
        if state_count == 0 || hilbert_dim == 0 {
            return Err(CostError::Configuration(
                "target_states must be a nonempty (state, amplitude) matrix".into(),
            ));
        }

        let targets_conj = target_states.mapv(|x| x.conj());
        Ok(TargetStateInfidelity {
            cost_multiplier,
            state_count,
            hilbert_dim,
            targets: target_states,
            targets_conj,
        })
    }

    /// Coherent overlap `sum_i <target_i|state_i>`.
    fn overlap(&self, states: &ArrayView2<'_, Complex64>) -> Complex64 {
        (&self.targets_conj * states).sum()
    }
}

impl CostTerm for TargetStateInfidelity {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn cost_multiplier(&self) -> f64 {
        self.cost_multiplier
    }

    fn class(&self) -> CostClass {
        CostClass::StateDependent
    }

    fn cost(&self, point: &EvalPoint<'_>) -> CostResult<f64> {
        let states = point.require_states(Self::NAME)?;
        check_states_shape(Self::NAME, &states, self.state_count, self.hilbert_dim)?;

        let state_count_sqr = (self.state_count * self.state_count) as f64;
        let fidelity = self.overlap(&states).norm_sqr() / state_count_sqr;
        Ok((1.0 - fidelity) * self.cost_multiplier)
    }

    fn gradient(&self, point: &EvalPoint<'_>) -> CostResult<Array2<Complex64>> {
        let states = point.require_states(Self::NAME)?;
        check_states_shape(Self::NAME, &states, self.state_count, self.hilbert_dim)?;

        let state_count_sqr = (self.state_count * self.state_count) as f64;
        let overlap = self.overlap(&states);
        let scale = -2.0 * self.cost_multiplier / state_count_sqr;
        Ok(self.targets.mapv(|t| t * overlap * scale))
    }
}
