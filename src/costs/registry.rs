//! The closed set of cost terms an optimizer driver can select by name.
//!
//! [`CostSpec`] is plain serde data: one variant per term, tagged by the
//! term's stable identifier, carrying that term's construction parameters.
//! [`CostSpec::build`] dispatches to the concrete constructor with the run's
//! static [`ProblemDims`].

use ndarray::{Array1, Array2};
use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::costs::control_area::ControlArea;
use crate::costs::control_bandwidth_max::ControlBandwidthMax;
use crate::costs::control_norm::ControlNorm;
use crate::costs::control_variation::ControlVariation;
use crate::costs::core::{CostError, CostResult, CostTerm};
use crate::costs::forbid_states::ForbidStates;
use crate::costs::target_state_infidelity::TargetStateInfidelity;
use crate::costs::target_state_infidelity_time::TargetStateInfidelityTime;

/// Stable identifiers of every cost term this crate ships.
pub const COST_NAMES: [&str; 7] = [
    ControlArea::NAME,
    ControlBandwidthMax::NAME,
    ControlNorm::NAME,
    ControlVariation::NAME,
    ForbidStates::NAME,
    TargetStateInfidelity::NAME,
    TargetStateInfidelityTime::NAME,
];

/// Static dimensions of one optimization run, shared by every term built
/// from a [`CostSpec`].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ProblemDims {
    pub control_num: usize,
    pub total_time_steps: usize,
    pub evolution_time: f64,
}

fn default_multiplier() -> f64 {
    1.0
}

fn default_order() -> usize {
    1
}

/// Construction parameters for one cost term, keyed by its stable name.
///
/// State vectors travel as nested `Vec`s of `Complex64` so a driver can read
/// them straight from JSON or any other serde format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "name")]
pub enum CostSpec {
    #[serde(rename = "control_variation")]
    ControlVariation {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        #[serde(default)]
        max_control_norms: Option<Vec<f64>>,
        #[serde(default = "default_order")]
        order: usize,
    },
    #[serde(rename = "control_area")]
    ControlArea {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        #[serde(default)]
        max_control_norms: Option<Vec<f64>>,
    },
    #[serde(rename = "control_norm")]
    ControlNorm {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        #[serde(default)]
        max_control_norms: Option<Vec<f64>>,
    },
    #[serde(rename = "control_bandwidth_max")]
    ControlBandwidthMax {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        max_bandwidths: Vec<f64>,
    },
    #[serde(rename = "forbid_states")]
    ForbidStates {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        forbidden_states: Vec<Vec<Vec<Complex64>>>,
    },
    #[serde(rename = "target_state_infidelity")]
    TargetStateInfidelity {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        target_states: Vec<Vec<Complex64>>,
    },
    #[serde(rename = "target_state_infidelity_time")]
    TargetStateInfidelityTime {
        #[serde(default = "default_multiplier")]
        cost_multiplier: f64,
        target_states: Vec<Vec<Complex64>>,
    },
}

impl CostSpec {
    /// The identifier of the term this spec builds.
    pub fn name(&self) -> &'static str {
        match self {
            CostSpec::ControlVariation { .. } => ControlVariation::NAME,
            CostSpec::ControlArea { .. } => ControlArea::NAME,
            CostSpec::ControlNorm { .. } => ControlNorm::NAME,
            CostSpec::ControlBandwidthMax { .. } => ControlBandwidthMax::NAME,
            CostSpec::ForbidStates { .. } => ForbidStates::NAME,
            CostSpec::TargetStateInfidelity { .. } => TargetStateInfidelity::NAME,
            CostSpec::TargetStateInfidelityTime { .. } => TargetStateInfidelityTime::NAME,
        }
    }

    /// Builds the configured term against the run's dimensions.
    pub fn build(&self, dims: &ProblemDims) -> CostResult<Box<dyn CostTerm>> {
        match self {
            CostSpec::ControlVariation {
                cost_multiplier,
                max_control_norms,
                order,
            } => Ok(Box::new(ControlVariation::new(
                dims.control_num,
                dims.total_time_steps,
                *cost_multiplier,
                max_control_norms.clone(),
                *order,
            )?)),
            CostSpec::ControlArea {
                cost_multiplier,
                max_control_norms,
            } => Ok(Box::new(ControlArea::new(
                dims.control_num,
                dims.total_time_steps,
                *cost_multiplier,
                max_control_norms.clone(),
            )?)),
            CostSpec::ControlNorm {
                cost_multiplier,
                max_control_norms,
            } => Ok(Box::new(ControlNorm::new(
                dims.control_num,
                dims.total_time_steps,
                *cost_multiplier,
                max_control_norms.clone(),
            )?)),
            CostSpec::ControlBandwidthMax {
                cost_multiplier,
                max_bandwidths,
            } => Ok(Box::new(ControlBandwidthMax::new(
                dims.control_num,
                dims.total_time_steps,
                dims.evolution_time,
                max_bandwidths.clone(),
                *cost_multiplier,
            )?)),
            CostSpec::ForbidStates {
                cost_multiplier,
                forbidden_states,
            } => {
                let per_state: Vec<Vec<Array1<Complex64>>> = forbidden_states
                    .iter()
                    .map(|vectors| {
                        vectors
                            .iter()
                            .map(|v| Array1::from_vec(v.clone()))
                            .collect()
                    })
                    .collect();
                Ok(Box::new(ForbidStates::new(
                    &per_state,
                    dims.total_time_steps,
                    *cost_multiplier,
                )?))
            }
            CostSpec::TargetStateInfidelity {
                cost_multiplier,
                target_states,
            } => Ok(Box::new(TargetStateInfidelity::new(
                states_matrix(target_states)?,
                *cost_multiplier,
            )?)),
            CostSpec::TargetStateInfidelityTime {
                cost_multiplier,
                target_states,
            } => Ok(Box::new(TargetStateInfidelityTime::new(
                states_matrix(target_states)?,
                dims.total_time_steps,
                *cost_multiplier,
            )?)),
        }
    }
}

/// Stacks serialized state vectors into a `(state, amplitude)` matrix,
/// rejecting ragged input.
fn states_matrix(rows: &[Vec<Complex64>]) -> CostResult<Array2<Complex64>> {
    let state_count = rows.len();
    let hilbert_dim = rows.first().map(|r| r.len()).unwrap_or(0);
    if rows.iter().any(|r| r.len() != hilbert_dim) {
        return Err(CostError::Configuration(
            "state vectors must share one Hilbert dimension".into(),
        ));
    }
    let flat: Vec<Complex64> = rows.iter().flatten().copied().collect();
    Array2::from_shape_vec((state_count, hilbert_dim), flat)
        .map_err(|e| CostError::Configuration(e.to_string()))
}
