// tests/control_variation_tests.rs
//! Tests for the control-variation cost term

use approx::assert_abs_diff_eq;
use ndarray::Array2;
use num_complex::Complex64;

use pulsecost::costs::control_variation::ControlVariation;
use pulsecost::costs::core::{CostError, CostTerm, EvalPoint};
use pulsecost::costs::grad;

fn real_controls(values: &[&[f64]]) -> Array2<Complex64> {
    let rows = values.len();
    let cols = values[0].len();
    Array2::from_shape_fn((rows, cols), |(t, c)| Complex64::new(values[t][c], 0.0))
}

#[test]
fn constant_trajectory_costs_nothing() {
    // A perfectly constant pulse has no variation to penalize, at any order.
    let controls = Array2::from_elem((8, 3), Complex64::new(0.7, -0.2));
    for order in 1..=3 {
        let term = ControlVariation::new(3, 8, 1.0, None, order).unwrap();
        let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
        assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-15);
    }
}

#[test]
fn unit_modulus_controls_stay_bounded() {
    // A unit-modulus pulse with a gentle phase progression stays within the
    // normalized unit scale, independent of channel count, step count, and
    // order.
    for &(control_num, total_time_steps) in &[(1usize, 4usize), (3, 9), (5, 17)] {
        let controls = Array2::from_shape_fn((total_time_steps, control_num), |(t, c)| {
            let angle = 0.8 * t as f64 + 0.7 * c as f64;
            Complex64::new(angle.cos(), angle.sin())
        });
        for order in 1..=3 {
            let term =
                ControlVariation::new(control_num, total_time_steps, 1.0, None, order).unwrap();
            let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
            assert!(cost <= 1.0 + 1e-12, "cost {} escaped the unit scale", cost);
            assert!(cost >= 0.0);
        }
    }
}

#[test]
fn alternating_pulse_matches_reference_value() {
    // control_num=2, total_time_steps=5, order=1: diffs_size = 8,
    // normalization = 16, squared-moduli sum = 4, cost = 0.25.
    let controls = real_controls(&[&[0., 0.], &[1., 0.], &[0., 0.], &[1., 0.], &[0., 0.]]);
    let term = ControlVariation::new(2, 5, 1.0, None, 1).unwrap();

    assert_eq!(term.diffs_size(), 8);
    assert_abs_diff_eq!(term.cost_normalization_constant(), 16.0, epsilon = 1e-15);

    let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
    assert_abs_diff_eq!(cost, 0.25, epsilon = 1e-12);
}

#[test]
fn constrained_branch_matches_reference_value() {
    // Same pulse with per-channel bounds [0.5, 1.0]: channel 0 has four
    // difference moduli of 1, each penalized (1 - 0.5)/1 and normalized by
    // 4 entries * 2 channels; channel 1 stays within bounds.
    let controls = real_controls(&[&[0., 0.], &[1., 0.], &[0., 0.], &[1., 0.], &[0., 0.]]);
    let term = ControlVariation::new(2, 5, 1.0, Some(vec![0.5, 1.0]), 1).unwrap();

    let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
    assert_abs_diff_eq!(cost, 0.25, epsilon = 1e-12);
}

#[test]
fn in_bound_differences_cost_nothing() {
    let controls = real_controls(&[&[0.0, 0.0], &[0.3, 0.1], &[0.1, 0.2], &[0.4, 0.3]]);
    let term = ControlVariation::new(2, 4, 1.0, Some(vec![0.5, 0.5]), 1).unwrap();
    let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
    assert_abs_diff_eq!(cost, 0.0, epsilon = 1e-15);
}

#[test]
fn larger_deviation_costs_strictly_more() {
    let term = ControlVariation::new(1, 3, 1.0, None, 1).unwrap();
    let mut previous = -1.0;
    for &spike in &[0.2, 0.5, 0.8, 1.3] {
        let controls = real_controls(&[&[0.0], &[spike], &[0.0]]);
        let cost = term.cost(&EvalPoint::controls(controls.view())).unwrap();
        assert!(cost > previous, "cost must grow with the deviation");
        previous = cost;
    }
}

#[test]
fn cost_is_linear_in_the_multiplier() {
    let controls = real_controls(&[&[0.1, 0.9], &[0.8, 0.2], &[0.3, 0.7], &[0.9, 0.1]]);
    for norms in [None, Some(vec![0.4, 0.3])] {
        let unit = ControlVariation::new(2, 4, 1.0, norms.clone(), 1).unwrap();
        let scaled = ControlVariation::new(2, 4, 3.5, norms, 1).unwrap();
        let base = unit.cost(&EvalPoint::controls(controls.view())).unwrap();
        let cost = scaled.cost(&EvalPoint::controls(controls.view())).unwrap();
        assert_abs_diff_eq!(cost, 3.5 * base, epsilon = 1e-12);
    }
}

#[test]
fn degenerate_configuration_is_rejected() {
    // An order that leaves no differences is a configuration error, caught
    // before any optimizer iteration.
    for order in [5, 6] {
        let result = ControlVariation::new(2, 5, 1.0, None, order);
        assert!(matches!(result, Err(CostError::Configuration(_))));
    }
    assert!(matches!(
        ControlVariation::new(2, 5, 1.0, None, 0),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlVariation::new(2, 5, -1.0, None, 1),
        Err(CostError::Configuration(_))
    ));
    assert!(matches!(
        ControlVariation::new(2, 5, 1.0, Some(vec![0.5]), 1),
        Err(CostError::Configuration(_))
    ));
}

#[test]
fn mismatched_controls_are_rejected() {
    let term = ControlVariation::new(2, 5, 1.0, None, 1).unwrap();
    let controls = Array2::<Complex64>::zeros((4, 2));
    let result = term.cost(&EvalPoint::controls(controls.view()));
    assert!(matches!(result, Err(CostError::ShapeMismatch(_))));
}

#[test]
fn unconstrained_gradient_matches_finite_differences() {
    let controls = Array2::from_shape_fn((6, 2), |(t, c)| {
        Complex64::new(
            0.4 * (t as f64 * 0.9 + c as f64).sin(),
            0.3 * (t as f64 * 0.5 - c as f64).cos(),
        )
    });
    for order in 1..=2 {
        let term = ControlVariation::new(2, 6, 1.3, None, order).unwrap();
        let point = EvalPoint::controls(controls.view());
        let analytic = term.gradient(&point).unwrap();
        let numeric = grad::finite_difference_controls(&term, &point).unwrap();
        for (a, n) in analytic.iter().zip(numeric.iter()) {
            assert_abs_diff_eq!(a.re, n.re, epsilon = 1e-6);
            assert_abs_diff_eq!(a.im, n.im, epsilon = 1e-6);
        }
    }
}

#[test]
fn constrained_gradient_matches_finite_differences() {
    // Difference moduli sit well away from the bounds so the selection set
    // is stable under the finite-difference probe.
    let controls = real_controls(&[&[0.0, 0.0], &[1.2, 0.1], &[0.0, 0.9], &[1.4, 0.8]]);
    let term = ControlVariation::new(2, 4, 2.0, Some(vec![0.5, 0.4]), 1).unwrap();
    let point = EvalPoint::controls(controls.view());
    let analytic = term.gradient(&point).unwrap();
    let numeric = grad::finite_difference_controls(&term, &point).unwrap();
    for (a, n) in analytic.iter().zip(numeric.iter()) {
        assert_abs_diff_eq!(a.re, n.re, epsilon = 1e-6);
        assert_abs_diff_eq!(a.im, n.im, epsilon = 1e-6);
    }
}

#[test]
fn repeated_evaluation_is_deterministic() {
    let controls = real_controls(&[&[0.1, 0.9], &[0.8, 0.2], &[0.3, 0.7]]);
    let term = ControlVariation::new(2, 3, 1.0, None, 1).unwrap();
    let point = EvalPoint::controls(controls.view());
    let first = term.cost(&point).unwrap();
    let second = term.cost(&point).unwrap();
    assert_eq!(first, second);
}
