//! A cost that penalizes the raw magnitude of the control parameters.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{
    check_controls_shape, check_multiplier, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes the squared modulus of every control value, discouraging large
/// drive amplitudes outright.
///
/// When `max_control_norms` is present, each channel is first divided by its
/// bound, so an in-bounds pulse scores below one.
#[derive(Debug, Clone)]
pub struct ControlNorm {
    cost_multiplier: f64,
    max_control_norms: Option<Vec<f64>>,
    control_num: usize,
    total_time_steps: usize,
    controls_size: f64,
}

impl ControlNorm {
    pub const NAME: &'static str = "control_norm";

    pub fn new(
        control_num: usize,
        total_time_steps: usize,
        cost_multiplier: f64,
        max_control_norms: Option<Vec<f64>>,
    ) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        if control_num == 0 || total_time_steps == 0 {
            return Err(CostError::Configuration(
                "control_num and total_time_steps must be positive".into(),
            ));
        }
        if let Some(norms) = &max_control_norms {
            if norms.len() != control_num {
                return Err(CostError::Configuration(format!(
                    "expected {} max_control_norms entries, got {}",
                    control_num,
                    norms.len()
                )));
            }
            if norms.iter().any(|n| !n.is_finite() || *n <= 0.0) {
                return Err(CostError::Configuration(
                    "max_control_norms entries must be finite and positive".into(),
                ));
            }
        }

        Ok(ControlNorm {
            cost_multiplier,
            max_control_norms,
            control_num,
            total_time_steps,
            controls_size: (control_num * total_time_steps) as f64,
        })
    }

    fn channel_scale(&self, channel: usize) -> f64 {
        match &self.max_control_norms {
            Some(norms) => 1.0 / norms[channel],
            None => 1.0,
        }
    }
}

impl CostTerm for ControlNorm {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn cost_multiplier(&self) -> f64 {
        self.cost_multiplier
    }

    fn class(&self) -> CostClass {
        CostClass::ControlExplicitlyRelated
    }

    fn cost(&self, point: &EvalPoint<'_>) -> CostResult<f64> {
        check_controls_shape(
            Self::NAME,
            &point.controls,
            self.total_time_steps,
            self.control_num,
        )?;

        let mut total = 0.0;
        for (i, column) in point.controls.columns().into_iter().enumerate() {
            let scale = self.channel_scale(i);
            let norm: f64 = column.iter().map(|u| u.norm_sqr()).sum();
            total += norm * scale * scale;
        }
        Ok(total / self.controls_size * self.cost_multiplier)
    }

    fn gradient(&self, point: &EvalPoint<'_>) -> CostResult<Array2<Complex64>> {
        check_controls_shape(
            Self::NAME,
            &point.controls,
            self.total_time_steps,
            self.control_num,
        )?;

        let controls: ArrayView2<'_, Complex64> = point.controls;
        let mut gradient = Array2::<Complex64>::zeros(controls.raw_dim());
        for t in 0..self.total_time_steps {
            for c in 0..self.control_num {
                let scale = self.channel_scale(c);
                gradient[(t, c)] = controls[(t, c)]
                    * (2.0 * scale * scale / self.controls_size * self.cost_multiplier);
            }
        }
        Ok(gradient)
    }
}
