// src/costs/control_variation.rs
//! A cost that penalizes variations of the control parameters from one
//! evaluation point to the next.

use ndarray::{s, Array2, ArrayView2};
use num_complex::Complex64;

use crate::costs::core::{
    check_controls_shape, check_multiplier, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes abrupt changes in the controls between consecutive (or
/// `order`-separated) evaluation points, encouraging smooth pulses.
///
/// Two mutually exclusive evaluation branches are fixed at construction by
/// the presence of `max_control_norms`: without bounds, the cost is the
/// normalized sum of squared moduli of the order-`order` finite differences;
/// with bounds, only differences whose modulus exceeds the channel's bound
/// are penalized, by their relative overshoot.
#[derive(Debug, Clone)]
pub struct ControlVariation {
    cost_multiplier: f64,
    max_control_norms: Option<Vec<f64>>,
    order: usize,
    control_num: usize,
    total_time_steps: usize,
    diffs_size: usize,
    cost_normalization_constant: f64,
}

impl ControlVariation {
    pub const NAME: &'static str = "control_variation";

    pub fn new(
        control_num: usize,
        total_time_steps: usize,
        cost_multiplier: f64,
        max_control_norms: Option<Vec<f64>>,
        order: usize,
    ) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        if control_num == 0 {
            return Err(CostError::Configuration(
                "control_num must be positive".into(),
            ));
        }
        if order == 0 {
            return Err(CostError::Configuration("order must be positive".into()));
        }
        if order >= total_time_steps {
            return Err(CostError::Configuration(format!(
                "differencing order {} leaves no differences over {} time steps",
                order, total_time_steps
            )));
        }
        if let Some(norms) = &max_control_norms {
            if norms.len() != control_num {
                return Err(CostError::Configuration(format!(
                    "expected {} max_control_norms entries, got {}",
                    control_num,
                    norms.len()
                )));
            }
            if norms.iter().any(|n| !n.is_finite() || *n < 0.0) {
                return Err(CostError::Configuration(
                    "max_control_norms entries must be finite and nonnegative".into(),
                ));
            }
        }

        let diffs_size = control_num * (total_time_steps - order);
        // The modulus of an order-k difference of unit-modulus values is
        // bounded by 2^k (triangle inequality), so this factor keeps the
        // unconstrained penalty <= 1 for unit-modulus controls of any size.
        let cost_normalization_constant = diffs_size as f64 * (2f64).powi(order as i32);

        Ok(ControlVariation {
            cost_multiplier,
            max_control_norms,
            order,
            control_num,
            total_time_steps,
            diffs_size,
            cost_normalization_constant,
        })
    }

    /// The differencing order along the time axis.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Total count of scalar difference values across all channels.
    pub fn diffs_size(&self) -> usize {
        self.diffs_size
    }

    /// The constant dividing the unconstrained penalty.
    pub fn cost_normalization_constant(&self) -> f64 {
        self.cost_normalization_constant
    }
}

impl CostTerm for ControlVariation {
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
        let diffs = diff(&point.controls, self.order);

        let cost_normalized = match &self.max_control_norms {
            None => {
                // Sum of squared moduli of the order-k differences.
                let total: f64 = diffs.iter().map(|d| d.norm_sqr()).sum();
                total / self.cost_normalization_constant
            }
            Some(norms) => {
                let channel_count = norms.len() as f64;
                let mut total = 0.0;
                for (i, &max_norm) in norms.iter().enumerate() {
                    let mut overshoot = 0.0;
                    let mut selected = 0usize;
                    for d in diffs.column(i) {
                        let modulus = d.norm();
                        if modulus > max_norm {
                            // Relative overshoot, normalized by the measured
                            // modulus rather than the bound.
                            overshoot += (modulus - max_norm) / modulus;
                            selected += 1;
                        }
                    }
                    // A channel with nothing over its bound contributes zero.
                    if selected > 0 {
                        total += overshoot / (selected as f64 * channel_count);
                    }
                }
                total
            }
        };

        Ok(cost_normalized * self.cost_multiplier)
    }

    fn gradient(&self, point: &EvalPoint<'_>) -> CostResult<Array2<Complex64>> {
        check_controls_shape(
            Self::NAME,
            &point.controls,
            self.total_time_steps,
            self.control_num,
        )?;
        let diffs = diff(&point.controls, self.order);

        let mut gradient = match &self.max_control_norms {
            None => {
                let scale = 2.0 * self.cost_multiplier / self.cost_normalization_constant;
                diffs.mapv(|d| d * scale)
            }
            Some(norms) => {
                let channel_count = norms.len() as f64;
                let mut over_diffs = Array2::<Complex64>::zeros(diffs.raw_dim());
                for (i, &max_norm) in norms.iter().enumerate() {
                    let selected: Vec<usize> = diffs
                        .column(i)
                        .iter()
                        .enumerate()
                        .filter(|(_, d)| d.norm() > max_norm)
                        .map(|(t, _)| t)
                        .collect();
                    if selected.is_empty() {
                        continue;
                    }
                    let scale = self.cost_multiplier / (selected.len() as f64 * channel_count);
                    for t in selected {
                        let d = diffs[(t, i)];
                        let modulus = d.norm();
                        // d/d|diff| of (|diff| - max_norm)/|diff| is
                        // max_norm/|diff|^2; the realified direction of
                        // |diff| at diff is diff/|diff|.
                        over_diffs[(t, i)] =
                            d * (max_norm / (modulus * modulus * modulus) * scale);
                    }
                }
                over_diffs
            }
        };

        for _ in 0..self.order {
            gradient = adjoint_diff(&gradient);
        }
        Ok(gradient)
    }
}

/// Order-`order` finite difference of the controls along the time axis.
fn diff(controls: &ArrayView2<'_, Complex64>, order: usize) -> Array2<Complex64> {
    let mut diffs = controls.to_owned();
    for _ in 0..order {
        diffs = &diffs.slice(s![1.., ..]) - &diffs.slice(s![..-1, ..]);
    }
    diffs
}

/// Adjoint of the first-difference operator: pushes a gradient over
/// differences back onto the values the differences were taken from.
fn adjoint_diff(gradient: &Array2<Complex64>) -> Array2<Complex64> {
    let (len, channels) = gradient.dim();
    let mut out = Array2::<Complex64>::zeros((len + 1, channels));
    {
        let mut shifted = out.slice_mut(s![1.., ..]);
        shifted += gradient;
    }
    {
        let mut head = out.slice_mut(s![..-1, ..]);
        head -= gradient;
    }
    out
}
