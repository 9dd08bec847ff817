//! Problem definition trait and the orthogonal distance problem.
//!
//! This module defines the `Problem` trait, which represents a nonlinear
//! least squares problem seen by the damped Gauss-Newton iteration, and
//! `OdrProblem`, the errors-in-both-variables problem built from a model and
//! a data set with optional per-point uncertainties on each axis.

use ndarray::{s, Array1, Array2, ArrayView1, Axis};

use crate::error::{FitError, Result};
use crate::fit::FitData;
use crate::model::Model;
use crate::utils::finite_difference::{parameter_jacobian, x_derivative};

/// A trait representing a nonlinear least squares problem.
pub trait Problem {
    /// Evaluate the residual vector at the given parameters.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter values at which to evaluate the residuals
    ///
    /// # Returns
    ///
    /// * A vector of residuals, or an error if the evaluation fails
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>>;

    /// Get the number of parameters in the problem.
    fn parameter_count(&self) -> usize;

    /// Get the number of residuals in the problem.
    fn residual_count(&self) -> usize;

    /// Evaluate the sum of squared residuals at the given parameters.
    fn eval_cost(&self, params: &Array1<f64>) -> Result<f64> {
        let residuals = self.eval(params)?;
        Ok(residuals.iter().map(|r| r.powi(2)).sum())
    }
}

/// First-order expansion of the orthogonal distance residuals.
///
/// For point `i` with x-correction `δ_i` the two weighted residuals are
///
/// * `r_i     = (f(β, x_i + δ_i) - y_i) / sy_i`
/// * `r_{M+i} = δ_i / sx_i`
///
/// so the Jacobian has a dense `M×N` block `∂r_i/∂β` (`beta_jacobian`), a
/// diagonal block `∂r_i/∂δ_i` (`delta_slope`) and a constant diagonal block
/// `∂r_{M+i}/∂δ_i = 1/sx_i` (`delta_weight`).
#[derive(Debug, Clone)]
pub struct Linearization {
    /// Weighted model gradient with respect to the parameters (M×N).
    pub beta_jacobian: Array2<f64>,
    /// Weighted model slope with respect to x at each corrected point.
    pub delta_slope: Array1<f64>,
    /// Inverse x uncertainty of each point.
    pub delta_weight: Array1<f64>,
}

/// Orthogonal distance regression problem.
///
/// The optimization vector is the concatenation `[β, δ]` of the `N` model
/// parameters and the `M` x-corrections. Missing uncertainties default to 1,
/// which gives every point the same weight on each axis.
pub struct OdrProblem<'a, M: Model + ?Sized> {
    model: &'a M,
    x: &'a Array1<f64>,
    y: &'a Array1<f64>,
    weight_x: Array1<f64>,
    weight_y: Array1<f64>,
    n_params: usize,
    diff_step: Option<f64>,
}

/// Turn an optional uncertainty array into inverse weights, checking each value.
fn inverse_weights(errors: Option<&Array1<f64>>, len: usize, axis: &str) -> Result<Array1<f64>> {
    match errors {
        None => Ok(Array1::ones(len)),
        Some(errors) => {
            if let Some((i, bad)) = errors
                .iter()
                .enumerate()
                .find(|(_, e)| !e.is_finite() || **e <= 0.0)
            {
                return Err(FitError::InvalidInput(format!(
                    "{} uncertainty at index {} must be finite and positive, got {}",
                    axis, i, bad
                )));
            }
            Ok(errors.mapv(|e| 1.0 / e))
        }
    }
}

impl<'a, M: Model + ?Sized> OdrProblem<'a, M> {
    /// Create the problem for `n_params` model parameters.
    ///
    /// The data set must already have consistent lengths; uncertainties must
    /// be finite and strictly positive.
    pub fn new(model: &'a M, data: &'a FitData, n_params: usize) -> Result<Self> {
        let len = data.len();
        let weight_x = inverse_weights(data.err_x(), len, "x")?;
        let weight_y = inverse_weights(data.err_y(), len, "y")?;

        Ok(Self {
            model,
            x: data.x(),
            y: data.y(),
            weight_x,
            weight_y,
            n_params,
            diff_step: None,
        })
    }

    /// Set the relative finite-difference step used by [`linearize`](Self::linearize).
    pub fn with_diff_step(mut self, step: f64) -> Self {
        self.diff_step = Some(step);
        self
    }

    /// Number of data points.
    pub fn point_count(&self) -> usize {
        self.x.len()
    }

    /// Inverse y uncertainty of each point.
    pub fn weight_y(&self) -> &Array1<f64> {
        &self.weight_y
    }

    /// Split an optimization vector into its parameter and correction parts.
    pub fn split<'p>(&self, params: &'p Array1<f64>) -> (ArrayView1<'p, f64>, ArrayView1<'p, f64>) {
        (
            params.slice(s![..self.n_params]),
            params.slice(s![self.n_params..]),
        )
    }

    /// Build the initial optimization vector: `β0` followed by zero corrections.
    pub fn initial_vector(&self, beta0: &Array1<f64>) -> Array1<f64> {
        let mut params = Array1::zeros(self.n_params + self.point_count());
        params.slice_mut(s![..self.n_params]).assign(beta0);
        params
    }

    /// Evaluate the model at the corrected points `x + δ`.
    pub fn predict(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        let (beta, delta) = self.split(params);
        let shifted = self.x + &delta;
        let predicted = self.model.eval(&beta.to_owned(), &shifted);

        if predicted.len() != self.point_count() {
            return Err(FitError::FunctionEvaluation(format!(
                "model '{}' returned {} values for {} points",
                self.model.name(),
                predicted.len(),
                self.point_count()
            )));
        }
        Ok(predicted)
    }

    /// Differentiate the residuals at `params`.
    ///
    /// Costs `2N + 2` model evaluations.
    pub fn linearize(&self, params: &Array1<f64>) -> Linearization {
        let (beta, delta) = self.split(params);
        let beta = beta.to_owned();
        let shifted = self.x + &delta;

        let weight_y = self.weight_y.view().insert_axis(Axis(1));
        let beta_jacobian =
            parameter_jacobian(self.model, &beta, &shifted, self.diff_step) * &weight_y;
        let delta_slope =
            x_derivative(self.model, &beta, &shifted, self.diff_step) * &self.weight_y;

        Linearization {
            beta_jacobian,
            delta_slope,
            delta_weight: self.weight_x.clone(),
        }
    }
}

impl<'a, M: Model + ?Sized> Problem for OdrProblem<'a, M> {
    fn eval(&self, params: &Array1<f64>) -> Result<Array1<f64>> {
        if params.len() != self.parameter_count() {
            return Err(FitError::DimensionMismatch(format!(
                "Expected {} optimization variables, got {}",
                self.parameter_count(),
                params.len()
            )));
        }

        let predicted = self.predict(params)?;
        let (_, delta) = self.split(params);
        let m = self.point_count();

        let mut residuals = Array1::zeros(2 * m);
        residuals
            .slice_mut(s![..m])
            .assign(&((&predicted - self.y) * &self.weight_y));
        residuals
            .slice_mut(s![m..])
            .assign(&(&delta * &self.weight_x));
        Ok(residuals)
    }

    fn parameter_count(&self) -> usize {
        self.n_params + self.point_count()
    }

    fn residual_count(&self) -> usize {
        2 * self.point_count()
    }
}
