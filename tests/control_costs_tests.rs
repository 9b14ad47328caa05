// tests/control_costs_tests.rs
//! Tests for the control-magnitude and bandwidth cost terms

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use num_complex::Complex64;

use pulsecost::costs::control_area::ControlArea;
use pulsecost::costs::control_bandwidth_max::ControlBandwidthMax;
use pulsecost::costs::control_norm::ControlNorm;
use pulsecost::costs::core::{CostError, CostTerm, EvalPoint};
use pulsecost::costs::grad;

fn real_controls(values: &[&[f64]]) -> Array2<Complex64> {
    let rows = values.len();
    let cols = values[0].len();
    Array2::from_shape_fn((rows, cols), |(t, c)| Complex64::new(values[t][c], 0.0))
}

fn square_wave() -> Array2<Complex64> {
    real_controls(&[&[1.0, 0.5], &[-1.0, 0.5], &[1.0, 0.5], &[-1.0, 0.5]])
}

#[test]
fn area_accumulates_channel_magnitudes() {
    // Channel magnitudes sum to 4 and 2 over four steps; divided by the
    // eight-entry controls size the area is 0.75.
    let term = ControlArea::new(2, 4, 1.0, None).unwrap();
    let cost = term.cost(&EvalPoint::controls(square_wave().view())).unwrap();
    assert_abs_diff_eq!(cost, 0.75, epsilon = 1e-12);
}

#[test]
fn area_bounds_rescale_each_channel() {
    let term = ControlArea::new(2, 4, 1.0, Some(vec![2.0, 1.0])).unwrap();
    let cost = term.cost(&EvalPoint::controls(square_wave().view())).unwrap();
    assert_abs_diff_eq!(cost, 0.5, epsilon = 1e-12);
}

#[test]
fn norm_accumulates_squared_moduli() {
    let term = ControlNorm::new(2, 4, 1.0, None).unwrap();
    let cost = term.cost(&EvalPoint::controls(square_wave().view())).unwrap();
    assert_abs_diff_eq!(cost, 0.625, epsilon = 1e-12);
}

#[test]
fn magnitude_costs_are_linear_in_the_multiplier() {
    let controls = square_wave();
    let area = ControlArea::new(2, 4, 1.0, None).unwrap();
    let area_scaled = ControlArea::new(2, 4, 2.5, None).unwrap();
    let norm = ControlNorm::new(2, 4, 1.0, None).unwrap();
    let norm_scaled = ControlNorm::new(2, 4, 2.5, None).unwrap();

    let point = EvalPoint::controls(controls.view());
    assert_abs_diff_eq!(
        area_scaled.cost(&point).unwrap(),
        2.5 * area.cost(&point).unwrap(),
        epsilon = 1e-12
    );
    assert_abs_diff_eq!(
        norm_scaled.cost(&point).unwrap(),
        2.5 * norm.cost(&point).unwrap(),
        epsilon = 1e-12
    );
}

#[test]
fn magnitude_gradients_match_finite_differences() {
    // Every entry sits away from zero, where the area gradient is defined.
    let controls = Array2::from_shape_fn((5, 2), |(t, c)| {
        Complex64::new(
            0.8 + 0.3 * (t as f64 + c as f64).sin(),
            0.5 - 0.2 * (t as f64 * 1.3).cos(),
        )
    });
    let point = EvalPoint::controls(controls.view());

    let area = ControlArea::new(2, 5, 1.4, Some(vec![1.5, 0.8])).unwrap();
    let analytic = area.gradient(&point).unwrap();
    let numeric = grad::finite_difference_controls(&area, &point).unwrap();
    for (a, n) in analytic.iter().zip(numeric.iter()) {
        assert_abs_diff_eq!(a.re, n.re, epsilon = 1e-6);
        assert_abs_diff_eq!(a.im, n.im, epsilon = 1e-6);
    }

    let norm = ControlNorm::new(2, 5, 0.7, Some(vec![1.5, 0.8])).unwrap();
    let analytic = norm.gradient(&point).unwrap();
    let numeric = grad::finite_difference_controls(&norm, &point).unwrap();
    for (a, n) in analytic.iter().zip(numeric.iter()) {
        assert_abs_diff_eq!(a.re, n.re, epsilon = 1e-6);
        assert_abs_diff_eq!(a.im, n.im, epsilon = 1e-6);
    }
}

#[test]
fn area_gradient_vanishes_at_zero_controls() {
    let controls = Array2::<Complex64>::zeros((4, 2));
    let term = ControlArea::new(2, 4, 1.0, None).unwrap();
    let gradient = term
        .gradient(&EvalPoint::controls(controls.view()))
        .unwrap();
    assert!(gradient.iter().all(|g| g.norm() == 0.0));
}

#[test]
fn bandwidth_ignores_spectrum_below_the_cutoff() {
    // A constant pulse has only a zero-frequency component, which no
    // positive cutoff selects.
    let controls = Array2::from_elem((4, 1), Complex64::new(2.0, 0.0));
    let term = ControlBandwidthMax::new(1, 4, 4.0, vec![0.1], 1.0).unwrap();
    let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
    assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-12);
}

#[test]
fn bandwidth_penalizes_a_tone_above_the_cutoff() {
    // Four unit samples alternating in sign concentrate all amplitude in the
    // |freq| = 0.5 bin: |F| = 4, one selected bin, cost 4 / (1 * 1 * 4) = 1.
    let controls = real_controls(&[&[1.0], &[-1.0], &[1.0], &[-1.0]]);
    let term = ControlBandwidthMax::new(1, 4, 4.0, vec![0.375], 1.0).unwrap();
    let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
    assert_abs_diff_eq!(cost, 1.0, epsilon = 1e-12);

    // Raising the cutoff past the tone admits the whole pulse.
    let admitting = ControlBandwidthMax::new(1, 4, 4.0, vec![0.6], 1.0).unwrap();
    let cost = admitting
        .cost(&EvalPoint::controls(controls.view()))
        .unwrap();
    assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-12);
}

#[test]
fn bandwidth_configuration_is_validated() {
    assert!(matches!(
        ControlBandwidthMax::new(2, 4, 4.0, vec![0.1], 1.0),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlBandwidthMax::new(1, 4, 0.0, vec![0.1], 1.0),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlBandwidthMax::new(1, 4, 4.0, vec![-0.1], 1.0),
        Err(CostError::Configuration(_))
    ));
}

#[test]
fn magnitude_configuration_is_validated() {
    assert!(matches!(
        ControlArea::new(0, 4, 1.0, None),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlArea::new(2, 4, 1.0, Some(vec![1.0, 0.0])),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlNorm::new(2, 4, f64::NAN, None),
        Err(CostError::Configuration(_))
    ));
}
