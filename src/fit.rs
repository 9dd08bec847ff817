//! The fit engine.
//!
//! This module validates fit inputs, runs an orthogonal distance solver and
//! packages its output, together with goodness-of-fit statistics, into a
//! [`FitResult`].
//!
//! # Example
//!
//! ```
//! use ndarray::Array1;
//! use odrfit::{FitData, FitOptions, Fittable, Polynomial};
//!
//! let x = Array1::<f64>::linspace(0.0, 10.0, 11);
//! let y = x.mapv(|x| 2.0 * x + 1.0);
//! let data = FitData::new(x, y);
//!
//! let result = Polynomial::new()
//!     .fit_odr(&data, &[0.0, 0.0], &FitOptions::default())
//!     .unwrap();
//!
//! assert!((result.parameters()[0].nominal_value() - 1.0).abs() < 1e-6);
//! assert!((result.parameters()[1].nominal_value() - 2.0).abs() < 1e-6);
//! ```

use ndarray::Array1;
use std::time::Instant;

use crate::error::{FitError, LogOnError, Result};
use crate::model::Model;
use crate::odr::{LevenbergMarquardtOdr, OdrConfig, OrthogonalSolver};
use crate::result::{FitResult, GoodnessOfFit};
use crate::stats::coefficient_of_determination;
use crate::uncertainty::UncertainValue;

/// Measured data: paired x/y values with optional per-point uncertainties.
#[derive(Debug, Clone, PartialEq)]
pub struct FitData {
    x: Array1<f64>,
    y: Array1<f64>,
    err_x: Option<Array1<f64>>,
    err_y: Option<Array1<f64>>,
}

impl FitData {
    /// Create a data set without uncertainties.
    pub fn new(x: Array1<f64>, y: Array1<f64>) -> Self {
        Self {
            x,
            y,
            err_x: None,
            err_y: None,
        }
    }

    /// Attach standard deviations of the x values.
    pub fn with_x_errors(mut self, err_x: Array1<f64>) -> Self {
        self.err_x = Some(err_x);
        self
    }

    /// Attach standard deviations of the y values.
    pub fn with_y_errors(mut self, err_y: Array1<f64>) -> Self {
        self.err_y = Some(err_y);
        self
    }

    pub fn x(&self) -> &Array1<f64> {
        &self.x
    }

    pub fn y(&self) -> &Array1<f64> {
        &self.y
    }

    pub fn err_x(&self) -> Option<&Array1<f64>> {
        self.err_x.as_ref()
    }

    pub fn err_y(&self) -> Option<&Array1<f64>> {
        self.err_y.as_ref()
    }

    /// Number of points, taken from the x values.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Check that y and any uncertainty arrays match the length of their axis.
    pub fn validate(&self) -> Result<()> {
        if self.x.len() != self.y.len() {
            return Err(FitError::DimensionMismatch(format!(
                "data_x has {} points but data_y has {}",
                self.x.len(),
                self.y.len()
            )));
        }
        if let Some(err_x) = &self.err_x {
            if err_x.len() != self.x.len() {
                return Err(FitError::DimensionMismatch(format!(
                    "err_x has {} values but data_x has {}",
                    err_x.len(),
                    self.x.len()
                )));
            }
        }
        if let Some(err_y) = &self.err_y {
            if err_y.len() != self.y.len() {
                return Err(FitError::DimensionMismatch(format!(
                    "err_y has {} values but data_y has {}",
                    err_y.len(),
                    self.y.len()
                )));
            }
        }
        Ok(())
    }

    /// Copy of the data set with point `index` removed.
    ///
    /// The remaining points keep their relative order.
    pub fn without(&self, index: usize) -> Self {
        Self {
            x: drop_index(&self.x, index),
            y: drop_index(&self.y, index),
            err_x: self.err_x.as_ref().map(|e| drop_index(e, index)),
            err_y: self.err_y.as_ref().map(|e| drop_index(e, index)),
        }
    }
}

fn drop_index(values: &Array1<f64>, index: usize) -> Array1<f64> {
    values
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, v)| *v)
        .collect()
}

/// Options for a single fit.
///
/// Solver knobs left as `None` keep the solver defaults.
#[derive(Debug, Clone, PartialEq)]
pub struct FitOptions {
    /// Compute residuals, R² and adjusted R². Default: true
    pub compute_stats: bool,

    /// Sum-of-squares tolerance
    pub sstol: Option<f64>,

    /// Parameter tolerance
    pub partol: Option<f64>,

    /// Maximum number of iterations
    pub max_iterations: Option<usize>,

    /// Solver reporting level
    pub verbosity: Option<u32>,
}

impl Default for FitOptions {
    fn default() -> Self {
        Self {
            compute_stats: true,
            sstol: None,
            partol: None,
            max_iterations: None,
            verbosity: None,
        }
    }
}

impl FitOptions {
    pub fn with_stats(mut self, compute_stats: bool) -> Self {
        self.compute_stats = compute_stats;
        self
    }

    pub fn with_sstol(mut self, sstol: f64) -> Self {
        self.sstol = Some(sstol);
        self
    }

    pub fn with_partol(mut self, partol: f64) -> Self {
        self.partol = Some(partol);
        self
    }

    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = Some(max_iterations);
        self
    }

    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = Some(verbosity);
        self
    }

    /// Solver configuration with the set knobs applied over the defaults.
    pub fn solver_config(&self) -> OdrConfig {
        let mut config = OdrConfig::default();
        if let Some(sstol) = self.sstol {
            config = config.with_sstol(sstol);
        }
        if let Some(partol) = self.partol {
            config = config.with_partol(partol);
        }
        if let Some(max_iterations) = self.max_iterations {
            config = config.with_max_iterations(max_iterations);
        }
        if let Some(verbosity) = self.verbosity {
            config = config.with_verbosity(verbosity);
        }
        config
    }
}

/// Anything that can run an orthogonal distance fit.
///
/// Every [`Model`] is `Fittable` through the default solver. The jackknife
/// accepts any `Fittable`, so resampling can use a different fitting strategy
/// than the one that produced the original result.
pub trait Fittable: Sync {
    /// Fit to `data` starting from `p0`.
    fn fit_odr(&self, data: &FitData, p0: &[f64], options: &FitOptions) -> Result<FitResult>;

    /// Like [`fit_odr`](Fittable::fit_odr), but a failure is returned without
    /// being logged. Callers that can recover from a failed fit use this and
    /// log at their own level.
    fn fit_odr_unlogged(
        &self,
        data: &FitData,
        p0: &[f64],
        options: &FitOptions,
    ) -> Result<FitResult> {
        self.fit_odr(data, p0, options)
    }
}

impl<M: Model + ?Sized> Fittable for M {
    fn fit_odr(&self, data: &FitData, p0: &[f64], options: &FitOptions) -> Result<FitResult> {
        fit(self, data, p0, options)
    }

    fn fit_odr_unlogged(
        &self,
        data: &FitData,
        p0: &[f64],
        options: &FitOptions,
    ) -> Result<FitResult> {
        run_fit(self, &LevenbergMarquardtOdr::new(), data, p0, options)
    }
}

/// A model paired with a specific solver.
#[derive(Debug, Clone)]
pub struct Fitter<M, S = LevenbergMarquardtOdr> {
    model: M,
    solver: S,
}

impl<M: Model> Fitter<M> {
    /// Pair `model` with the default solver.
    pub fn new(model: M) -> Self {
        Self {
            model,
            solver: LevenbergMarquardtOdr::new(),
        }
    }
}

impl<M: Model, S: OrthogonalSolver> Fitter<M, S> {
    /// Pair `model` with `solver`.
    pub fn with_solver(model: M, solver: S) -> Self {
        Self { model, solver }
    }

    pub fn model(&self) -> &M {
        &self.model
    }

    pub fn solver(&self) -> &S {
        &self.solver
    }
}

impl<M: Model, S: OrthogonalSolver> Fittable for Fitter<M, S> {
    fn fit_odr(&self, data: &FitData, p0: &[f64], options: &FitOptions) -> Result<FitResult> {
        fit_with_solver(&self.model, &self.solver, data, p0, options)
    }

    fn fit_odr_unlogged(
        &self,
        data: &FitData,
        p0: &[f64],
        options: &FitOptions,
    ) -> Result<FitResult> {
        run_fit(&self.model, &self.solver, data, p0, options)
    }
}

/// Fit `model` to `data` with the default solver.
pub fn fit<M: Model + ?Sized>(
    model: &M,
    data: &FitData,
    p0: &[f64],
    options: &FitOptions,
) -> Result<FitResult> {
    fit_with_solver(model, &LevenbergMarquardtOdr::new(), data, p0, options)
}

/// Fit `model` to `data` with the given solver.
///
/// Inputs are validated before the solver runs. Failures are logged and
/// returned to the caller.
///
/// # Errors
///
/// * `InvalidParameter` if `p0` is empty or does not match the model's
///   declared parameter count
/// * `DimensionMismatch` if data or uncertainty lengths disagree
/// * any error raised by the solver
pub fn fit_with_solver<M, S>(
    model: &M,
    solver: &S,
    data: &FitData,
    p0: &[f64],
    options: &FitOptions,
) -> Result<FitResult>
where
    M: Model + ?Sized,
    S: OrthogonalSolver,
{
    run_fit(model, solver, data, p0, options).log_critical("fit_odr")
}

fn run_fit<M, S>(
    model: &M,
    solver: &S,
    data: &FitData,
    p0: &[f64],
    options: &FitOptions,
) -> Result<FitResult>
where
    M: Model + ?Sized,
    S: OrthogonalSolver,
{
    if p0.is_empty() {
        return Err(FitError::InvalidParameter(
            "initial parameters p0 must not be empty".to_string(),
        ));
    }
    data.validate()?;
    if let Some(expected) = model.parameter_count() {
        if expected != p0.len() {
            return Err(FitError::InvalidParameter(format!(
                "model '{}' takes {} parameters, p0 has {}",
                model.name(),
                expected,
                p0.len()
            )));
        }
    }

    let config = options.solver_config();
    let beta0 = Array1::from(p0.to_vec());

    let start = Instant::now();
    let output = solver.solve(model, data, &beta0, &config)?;
    log::debug!(
        "fit of '{}' on {} points took {:?}",
        model.name(),
        data.len(),
        start.elapsed()
    );

    if output.beta.len() != p0.len() || output.sd_beta.len() != p0.len() {
        return Err(FitError::DimensionMismatch(format!(
            "solver returned {} parameters and {} deviations for {} initial values",
            output.beta.len(),
            output.sd_beta.len(),
            p0.len()
        )));
    }

    let parameters = output
        .beta
        .iter()
        .zip(output.sd_beta.iter())
        .map(|(&nominal, &std_dev)| UncertainValue::new(nominal, std_dev))
        .collect();

    let statistics = if options.compute_stats {
        let predicted = model.eval(&output.beta, data.x());
        if predicted.len() != data.len() {
            return Err(FitError::FunctionEvaluation(format!(
                "model '{}' returned {} values for {} points",
                model.name(),
                predicted.len(),
                data.len()
            )));
        }
        let residuals = data.y() - &predicted;
        let (r2, r2_adjusted) = coefficient_of_determination(data.y(), &residuals, p0.len());
        Some(GoodnessOfFit::new(r2, r2_adjusted, residuals))
    } else {
        None
    };

    Ok(FitResult::new(parameters, statistics, output))
}
