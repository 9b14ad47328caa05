//! Finite-difference fallback for the [`CostTerm::gradient`] entry point.
//!
//! Terms with closed-form derivatives override `gradient`; everything else
//! falls back to a central difference over the term's own `cost`, perturbing
//! the real and imaginary part of each entry independently.

use ndarray::Array2;
use num_complex::Complex64;

use crate::costs::core::{CostResult, CostTerm, EvalPoint};

/// Step size for the central difference.
const FD_STEP: f64 = 1e-6;

/// Central-difference gradient with respect to the controls tensor.
pub fn finite_difference_controls<T>(
    term: &T,
    point: &EvalPoint<'_>,
) -> CostResult<Array2<Complex64>>
where
    T: CostTerm + ?Sized,
{
    let base = point.controls.to_owned();
    let mut gradient = Array2::<Complex64>::zeros(base.raw_dim());

    let mut probe = base.clone();
    for t in 0..base.nrows() {
        for c in 0..base.ncols() {
            let mut partial = |delta: Complex64| -> CostResult<f64> {
                probe[(t, c)] = base[(t, c)] + delta;
                let shifted = EvalPoint {
                    controls: probe.view(),
                    states: point.states.map(|s| s.reborrow()),
                    step: point.step,
                };
                term.cost(&shifted)
            };

            let re = Complex64::new(FD_STEP, 0.0);
            let im = Complex64::new(0.0, FD_STEP);
            let d_re = (partial(re)? - partial(-re)?) / (2.0 * FD_STEP);
            let d_im = (partial(im)? - partial(-im)?) / (2.0 * FD_STEP);
            probe[(t, c)] = base[(t, c)];

            gradient[(t, c)] = Complex64::new(d_re, d_im);
        }
    }

    Ok(gradient)
}

/// Central-difference gradient with respect to the states tensor.
pub fn finite_difference_states<T>(
    term: &T,
    point: &EvalPoint<'_>,
) -> CostResult<Array2<Complex64>>
where
    T: CostTerm + ?Sized,
{
    let base = point.require_states(term.name())?.to_owned();
    let mut gradient = Array2::<Complex64>::zeros(base.raw_dim());

    let mut probe = base.clone();
    for i in 0..base.nrows() {
        for d in 0..base.ncols() {
            let mut partial = |delta: Complex64| -> CostResult<f64> {
                probe[(i, d)] = base[(i, d)] + delta;
                let shifted = EvalPoint {
                    controls: point.controls.reborrow(),
                    states: Some(probe.view()),
                    step: point.step,
                };
                term.cost(&shifted)
            };

            let re = Complex64::new(FD_STEP, 0.0);
            let im = Complex64::new(0.0, FD_STEP);
            let d_re = (partial(re)? - partial(-re)?) / (2.0 * FD_STEP);
            let d_im = (partial(im)? - partial(-im)?) / (2.0 * FD_STEP);
            probe[(i, d)] = base[(i, d)];

            gradient[(i, d)] = Complex64::new(d_re, d_im);
        }
    }

    Ok(gradient)
}
