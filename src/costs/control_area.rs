//! A cost that penalizes the integral of the control magnitude.

use ndarray::{Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{
    check_controls_shape, check_multiplier, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes the accumulated magnitude of the controls over the pulse,
/// discouraging pulses that spend more drive power than they need.
///
/// When `max_control_norms` is present, each channel is first divided by its
/// bound, so an in-bounds pulse scores below one.
#[derive(Debug, Clone)]
pub struct ControlArea {
    cost_multiplier: f64,
    max_control_norms: Option<Vec<f64>>,
    control_num: usize,
    total_time_steps: usize,
    controls_size: f64,
}

impl ControlArea {
    pub const NAME: &'static str = "control_area";

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

        Ok(ControlArea {
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

impl CostTerm for ControlArea {
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
            let area: f64 = column.iter().map(|u| u.norm()).sum();
            total += area * self.channel_scale(i);
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
                let u = controls[(t, c)];
                let modulus = u.norm();
                // The magnitude has no defined direction at zero.
                if modulus > 0.0 {
                    gradient[(t, c)] = u
                        * (self.channel_scale(c) / modulus / self.controls_size
                            * self.cost_multiplier);
                }
            }
        }
        Ok(gradient)
    }
}
