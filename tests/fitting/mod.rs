// Tests for the fit engine and fit results

use approx::assert_relative_eq;
use ndarray::{array, Array1};
use odrfit::{
    fit, FitData, FitError, FitOptions, FitResult, Fittable, Fitter, LevenbergMarquardtOdr,
    Model, Polynomial,
};

use crate::test_helpers::{approx_eq, init_logging, line_model, noisy_line};

#[test]
fn test_noisy_line_recovers_parameters() {
    init_logging();
    let (x, y) = noisy_line(2.0, 1.0, 11, 0.005, 42);
    let data = FitData::new(x, y);

    let result = line_model()
        .fit_odr(&data, &[0.0, 0.0], &FitOptions::default())
        .unwrap();

    let params = result.parameters();
    assert_eq!(params.len(), 2);
    assert_relative_eq!(params[0].nominal_value(), 2.0, max_relative = 0.01);
    assert_relative_eq!(params[1].nominal_value(), 1.0, max_relative = 0.01);
    assert!(params.iter().all(|p| p.std_dev().is_finite() && p.std_dev() > 0.0));

    let r2 = result.r2().unwrap();
    assert!(r2 > 0.99 && r2 <= 1.0);
    assert!(result.r2_adjusted().unwrap() > 0.99);
    assert_eq!(result.residuals().unwrap().len(), 11);
}

#[test]
fn test_exact_cubic() {
    let truth = [1.0, -2.0, 0.5, 0.1];
    let x = Array1::<f64>::linspace(-3.0, 3.0, 15);
    let y = odrfit::polynomial(&truth, &x);
    let data = FitData::new(x, y);

    let result = fit(
        &Polynomial::with_degree(3),
        &data,
        &[0.8, -1.5, 0.4, 0.0],
        &FitOptions::default(),
    )
    .unwrap();

    for (p, expected) in result.parameters().iter().zip(truth.iter()) {
        assert!(approx_eq(p.nominal_value(), *expected, 1e-5));
    }
    assert_relative_eq!(result.r2().unwrap(), 1.0, epsilon = 1e-9);
    assert!(result.output().converged());
}

#[test]
fn test_parameter_count_matches_p0() {
    let (x, y) = noisy_line(-0.5, 3.0, 9, 0.1, 7);
    let data = FitData::new(x, y);

    for p0 in [vec![1.0], vec![1.0, 1.0], vec![1.0, 1.0, 1.0]] {
        let result = Polynomial::new()
            .fit_odr(&data, &p0, &FitOptions::default())
            .unwrap();
        assert_eq!(result.parameters().len(), p0.len());
    }
}

#[test]
fn test_length_mismatch() {
    let model = line_model();
    let options = FitOptions::default();

    let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 2.0]);
    assert!(matches!(
        model.fit_odr(&data, &[1.0, 0.0], &options),
        Err(FitError::DimensionMismatch(_))
    ));

    let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 2.0, 3.0])
        .with_x_errors(array![0.1, 0.1]);
    assert!(matches!(
        model.fit_odr(&data, &[1.0, 0.0], &options),
        Err(FitError::DimensionMismatch(_))
    ));

    let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 2.0, 3.0])
        .with_y_errors(array![0.1, 0.1, 0.1, 0.1]);
    assert!(matches!(
        model.fit_odr(&data, &[1.0, 0.0], &options),
        Err(FitError::DimensionMismatch(_))
    ));
}

#[test]
fn test_empty_p0() {
    let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 2.0, 3.0]);
    let result = Polynomial::new().fit_odr(&data, &[], &FitOptions::default());

    match result {
        Err(FitError::InvalidParameter(msg)) => assert!(msg.contains("p0")),
        other => panic!("Expected InvalidParameter, got {:?}", other),
    }
}

#[test]
fn test_invalid_uncertainty() {
    let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 2.0, 3.0])
        .with_y_errors(array![0.1, -0.1, 0.1]);
    let result = line_model().fit_odr(&data, &[1.0, 0.0], &FitOptions::default());
    assert!(matches!(result, Err(FitError::InvalidInput(_))));
}

#[test]
fn test_stats_are_all_or_nothing() {
    let (x, y) = noisy_line(1.0, 0.0, 6, 0.05, 3);
    let data = FitData::new(x, y);
    let model = line_model();

    let with_stats = model
        .fit_odr(&data, &[1.0, 0.0], &FitOptions::default())
        .unwrap();
    assert!(with_stats.r2().is_some());
    assert!(with_stats.r2_adjusted().is_some());
    assert!(with_stats.residuals().is_some());

    let without = model
        .fit_odr(&data, &[1.0, 0.0], &FitOptions::default().with_stats(false))
        .unwrap();
    assert!(without.r2().is_none());
    assert!(without.r2_adjusted().is_none());
    assert!(without.residuals().is_none());
}

#[test]
fn test_residuals_are_observed_minus_predicted() {
    let (x, y) = noisy_line(0.7, -1.0, 8, 0.2, 11);
    let data = FitData::new(x.clone(), y.clone());
    let model = line_model();

    let result = model
        .fit_odr(&data, &[1.0, 0.0], &FitOptions::default())
        .unwrap();

    let predicted = result.predict(&model, &x);
    let expected = &y - &predicted;
    let residuals = result.residuals().unwrap();
    for i in 0..x.len() {
        assert_relative_eq!(residuals[i], expected[i], epsilon = 1e-12);
    }
}

#[test]
fn test_decompose_matches_fields() {
    let (x, y) = noisy_line(2.0, 1.0, 10, 0.1, 5);
    let data = FitData::new(x, y);
    let result = line_model()
        .fit_odr(&data, &[0.0, 0.0], &FitOptions::default())
        .unwrap();

    let (params, r2, r2_adj, residuals, output) = result.decompose();
    assert_eq!(params, result.parameters());
    assert_eq!(r2, result.r2());
    assert_eq!(r2_adj, result.r2_adjusted());
    assert_eq!(residuals, result.residuals());
    assert_eq!(output, result.output());

    // No mutation between calls
    assert_eq!(result.decompose(), result.decompose());
    assert_eq!(result.to_string(), result.to_string());
}

#[test]
fn test_report_layout() {
    let (x, y) = noisy_line(2.0, 1.0, 10, 0.1, 5);
    let data = FitData::new(x, y);
    let result = line_model()
        .fit_odr(&data, &[0.0, 0.0], &FitOptions::default())
        .unwrap();

    let report = result.to_string();
    let lines: Vec<&str> = report.lines().collect();
    assert_eq!(lines[0], "#".repeat(32));
    assert_eq!(lines[1], "#########  Fit result  #########");
    assert_eq!(lines[3], "* Parameters:");
    assert!(lines[4].starts_with("      - p1 = "));
    assert!(lines[5].starts_with("      - p2 = "));
    assert!(lines[4].contains(" ± "));
    assert!(lines[6].starts_with("* R² = "));
    assert!(lines[7].starts_with("* Adjusted R² = "));
    assert_eq!(lines[8], "* Stop reason(s):");
    assert_eq!(*lines.last().unwrap(), "#".repeat(32));
}

#[test]
fn test_json_export() {
    let (x, y) = noisy_line(2.0, 1.0, 10, 0.1, 5);
    let data = FitData::new(x, y);
    let result = line_model()
        .fit_odr(&data, &[0.0, 0.0], &FitOptions::default())
        .unwrap();

    let json = result.to_json().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert!(value.get("parameters").is_some());
    assert!(value.get("output").is_some());

    let back: FitResult = serde_json::from_str(&json).unwrap();
    assert_eq!(back.parameters(), result.parameters());
}

#[test]
fn test_fitter_with_explicit_solver() {
    let (x, y) = noisy_line(2.0, 1.0, 10, 0.01, 9);
    let data = FitData::new(x, y).with_y_errors(Array1::from_elem(10, 0.01));

    let fitter = Fitter::with_solver(line_model(), LevenbergMarquardtOdr::new());
    let options = FitOptions::default().with_max_iterations(100).with_verbosity(1);
    let result = fitter.fit_odr(&data, &[0.0, 0.0], &options).unwrap();

    assert_relative_eq!(result.parameters()[0].nominal_value(), 2.0, max_relative = 0.01);
    assert_eq!(fitter.model().name(), "line");
}
