//! A cost that penalizes spectral content of the controls above a cutoff.

use std::sync::Arc;

use num_complex::Complex64;
use rustfft::{Fft, FftPlanner};

use crate::costs::core::{
    check_controls_shape, check_multiplier, CostClass, CostError, CostResult, CostTerm, EvalPoint,
};

/// Penalizes discrete-Fourier amplitude at frequencies above each channel's
/// allowed bandwidth, keeping pulses realizable on bandwidth-limited
/// hardware.
///
/// The sample frequencies and the FFT plan are derived once at construction
/// from the time grid; evaluation transforms each channel's time series and
/// accumulates the moduli of the bins beyond that channel's cutoff.
#[derive(Clone)]
pub struct ControlBandwidthMax {
    cost_multiplier: f64,
    control_num: usize,
    total_time_steps: usize,
    max_bandwidths: Vec<f64>,
    freqs: Vec<f64>,
    fft: Arc<dyn Fft<f64>>,
}

impl ControlBandwidthMax {
    pub const NAME: &'static str = "control_bandwidth_max";

    pub fn new(
        control_num: usize,
        total_time_steps: usize,
        evolution_time: f64,
        max_bandwidths: Vec<f64>,
        cost_multiplier: f64,
    ) -> CostResult<Self> {
        check_multiplier(cost_multiplier)?;
        if control_num == 0 || total_time_steps == 0 {
            return Err(CostError::Configuration(
                "control_num and total_time_steps must be positive".into(),
            ));
        }
        if !evolution_time.is_finite() || evolution_time <= 0.0 {
            return Err(CostError::Configuration(format!(
                "evolution_time must be positive, got {}",
                evolution_time
            )));
        }
        if max_bandwidths.len() != control_num {
            return Err(CostError::Configuration(format!(
                "expected {} max_bandwidths entries, got {}",
                control_num,
                max_bandwidths.len()
            )));
        }
        if max_bandwidths.iter().any(|b| !b.is_finite() || *b < 0.0) {
            return Err(CostError::Configuration(
                "max_bandwidths entries must be finite and nonnegative".into(),
            ));
        }

        let dt = evolution_time / total_time_steps as f64;
        let freqs = sample_frequencies(total_time_steps, dt);
        let fft = FftPlanner::<f64>::new().plan_fft_forward(total_time_steps);

        Ok(ControlBandwidthMax {
            cost_multiplier,
            control_num,
            total_time_steps,
            max_bandwidths,
            freqs,
            fft,
        })
    }
}

impl CostTerm for ControlBandwidthMax {
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

        let channel_count = self.control_num as f64;
        let bin_norm = self.total_time_steps as f64;
        let mut total = 0.0;
        for (i, &bound) in self.max_bandwidths.iter().enumerate() {
            let mut spectrum: Vec<Complex64> = point.controls.column(i).to_vec();
            self.fft.process(&mut spectrum);

            let mut penalty = 0.0;
            let mut selected = 0usize;
            for (k, amplitude) in spectrum.iter().enumerate() {
                if self.freqs[k].abs() > bound {
                    penalty += amplitude.norm();
                    selected += 1;
                }
            }
            // A channel whose cutoff admits the whole grid contributes zero.
            if selected > 0 {
                total += penalty / (selected as f64 * channel_count * bin_norm);
            }
        }
        Ok(total * self.cost_multiplier)
    }
}

/// Discrete-Fourier sample frequencies for `n` samples spaced `dt` apart:
/// nonnegative frequencies first, then the negative half.
fn sample_frequencies(n: usize, dt: f64) -> Vec<f64> {
    let span = n as f64 * dt;
    (0..n)
        .map(|k| {
            if k < (n + 1) / 2 {
                k as f64 / span
            } else {
                (k as f64 - n as f64) / span
            }
        })
        .collect()
}
