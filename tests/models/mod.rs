// Tests for the reference models

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use odrfit::odr::NOT_FULL_RANK;
use odrfit::{
    asymmetric_pseudo_voigt, polynomial, AsymmetricPseudoVoigt, FitData, FitError, FitOptions,
    Fittable, Model, Polynomial,
};

use crate::test_helpers::gaussian_noise;

#[test]
fn test_polynomial_scenario() {
    let y = polynomial(&[1.0, 2.0, 3.0], &array![0.0, 1.0, 2.0]);
    assert_eq!(y, array![1.0, 6.0, 17.0]);
}

#[test]
fn test_polynomial_model_matches_function() {
    let x = Array1::<f64>::linspace(-2.0, 2.0, 9);
    let coeffs = array![0.5, -1.0, 0.25];
    assert_eq!(
        Polynomial::new().eval(&coeffs, &x),
        polynomial(&[0.5, -1.0, 0.25], &x)
    );
}

#[test]
fn test_pseudo_voigt_branches_meet_at_center() {
    let params = [3.0, 1.2, 0.4, 0.2, 1.1, 0.9, 0.5];
    let x = array![1.2 - 1e-9, 1.2, 1.2 + 1e-9];
    let y = asymmetric_pseudo_voigt(&params, &x);

    assert_relative_eq!(y[1], 3.5, epsilon = 1e-12);
    assert_relative_eq!(y[0], y[1], epsilon = 1e-6);
    assert_relative_eq!(y[2], y[1], epsilon = 1e-6);
}

#[test]
fn test_pseudo_voigt_is_vectorized_and_total() {
    let x = Array1::<f64>::linspace(-5.0, 5.0, 101);
    // Degenerate widths give non-finite values, never a panic
    let y = asymmetric_pseudo_voigt(&[1.0, 0.0, 0.0, 0.5, 0.0, 0.5, 0.0], &x);
    assert_eq!(y.len(), 101);
}

#[test]
fn test_pseudo_voigt_fit() {
    let truth = [2.0, 0.5, 0.4, 0.3, 0.8, 0.7, 0.1];
    let x = Array1::<f64>::linspace(-3.0, 4.0, 71);
    let y = asymmetric_pseudo_voigt(&truth, &x);
    let data = FitData::new(x, y);

    let p0 = [1.8, 0.45, 0.35, 0.4, 0.9, 0.6, 0.12];
    let result = AsymmetricPseudoVoigt::new()
        .fit_odr(&data, &p0, &FitOptions::default().with_max_iterations(200))
        .unwrap();

    for (p, expected) in result.parameters().iter().zip(truth.iter()) {
        assert!(
            (p.nominal_value() - expected).abs() < 1e-3,
            "got {} expected {}",
            p.nominal_value(),
            expected
        );
    }
    assert!(result.r2().unwrap() > 0.999_999);
}

#[test]
fn test_lorentzian_peak_keeps_uncertainties() {
    // Mixing fractions on the clamp boundary leave them undetermined
    let truth = [3.0, 1.0, 0.5, 0.0, 1.0, 0.0, 0.5];
    let x = Array1::<f64>::linspace(-4.0, 6.0, 81);
    let y = asymmetric_pseudo_voigt(&truth, &x) + gaussian_noise(81, 0.01, 23);
    let data = FitData::new(x, y);

    let p0 = [2.9, 1.05, 0.55, 0.2, 1.1, 0.2, 0.45];
    let result = AsymmetricPseudoVoigt::new()
        .fit_odr(&data, &p0, &FitOptions::default().with_max_iterations(200))
        .unwrap();

    let params = result.parameters();
    assert_relative_eq!(params[0].nominal_value(), 3.0, max_relative = 0.02);
    assert_relative_eq!(params[1].nominal_value(), 1.0, epsilon = 0.02);
    for p in &params[..3] {
        assert!(p.std_dev().is_finite() && p.std_dev() > 0.0, "{}", p);
    }
    assert!(params.iter().all(|p| !p.std_dev().is_nan()));

    // Undetermined parameters are reported with zero uncertainty
    if result.output().stop_reason.iter().any(|r| r == NOT_FULL_RANK) {
        assert!(params.iter().any(|p| p.std_dev() == 0.0));
    }
    assert!(result.r2().unwrap() > 0.999);
}

#[test]
fn test_pseudo_voigt_requires_seven_parameters() {
    let data = FitData::new(array![0.0, 1.0, 2.0], array![0.0, 1.0, 0.0]);
    let result =
        AsymmetricPseudoVoigt::new().fit_odr(&data, &[1.0, 1.0, 1.0], &FitOptions::default());
    assert!(matches!(result, Err(FitError::InvalidParameter(_))));
}

#[test]
fn test_model_descriptions() {
    assert!(Polynomial::new()
        .describe()
        .starts_with("Function polynomial:\n"));
    assert!(AsymmetricPseudoVoigt::new()
        .describe()
        .starts_with("Function asymmetric_pseudo_voigt:\n"));
}
