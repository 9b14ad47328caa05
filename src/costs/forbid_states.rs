//! A cost that penalizes overlap with disallowed quantum states.

use ndarray::{Array1, Array2};
use num_complex::Complex64;

use crate::costs::core::{
    check_multiplier, check_states_shape, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes the squared overlap of each evolving state with its forbidden
/// states, evaluated once per simulated time step so population is steered
/// away from the disallowed subspace along the whole evolution.
///
/// Each evolving state carries its own (possibly empty) list of forbidden
/// vectors; a state with no forbidden vectors contributes zero.
#[derive(Debug, Clone)]
pub struct ForbidStates {
    cost_multiplier: f64,
    state_count: usize,
    hilbert_dim: usize,
    total_time_steps: usize,
    forbidden_conj: Vec<Array2<Complex64>>,
    normalization: Vec<f64>,
}

impl ForbidStates {
    pub const NAME: &'static str = "forbid_states";

    pub fn new(
        forbidden_states: &[Vec<Array1<Complex64>>],
        total_time_steps: usize,
        cost_multiplier: f64,
    ) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        if total_time_steps == 0 {
            return Err(CostError::Configuration(
                "total_time_steps must be positive".into(),
            ));
        }
        let state_count = forbidden_states.len();
        if state_count == 0 {
            return Err(CostError::Configuration(
                "forbidden_states must cover at least one evolving state".into(),
            ));
        }
        let hilbert_dim = forbidden_states
            .iter()
            .flatten()
            .map(|v| v.len())
            .next()
            .unwrap_or(0);
        if hilbert_dim == 0 {
            return Err(CostError::Configuration(
                "at least one nonempty forbidden state vector is required".into(),
            ));
        }
        if forbidden_states
            .iter()
            .flatten()
            .any(|v| v.len() != hilbert_dim)
        {
            return Err(CostError::Configuration(
                "forbidden state vectors must share one Hilbert dimension".into(),
            ));
        }

        // Conjugate once so evaluation is a plain matrix-vector product.
        let mut forbidden_conj = Vec::with_capacity(state_count);
        let mut normalization = Vec::with_capacity(state_count);
        for per_state in forbidden_states {
            let mut stacked = Array2::<Complex64>::zeros((per_state.len(), hilbert_dim));
            for (f, vector) in per_state.iter().enumerate() {
                stacked.row_mut(f).assign(&vector.mapv(|x| x.conj()));
            }
            normalization
                .push((state_count * per_state.len() * total_time_steps) as f64);
            forbidden_conj.push(stacked);
        }

        Ok(ForbidStates {
            cost_multiplier,
            state_count,
            hilbert_dim,
            total_time_steps,
            forbidden_conj,
            normalization,
        })
    }

    /// Number of evolving states this term was built for.
    pub fn state_count(&self) -> usize {
        self.state_count
    }
}

impl CostTerm for ForbidStates {
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

        let mut total = 0.0;
        for (i, forbidden) in self.forbidden_conj.iter().enumerate() {
            if forbidden.nrows() == 0 {
                continue;
            }
            let overlaps = forbidden.dot(&states.row(i));
            let overlap_sqr: f64 = overlaps.iter().map(|ip| ip.norm_sqr()).sum();
            total += overlap_sqr / self.normalization[i];
        }
        Ok(total * self.cost_multiplier)
    }
}
