//! Implementation of the orthogonal distance regression solver.
//!
//! This module contains a Levenberg-Marquardt iteration over the joint vector
//! of model parameters β and x-corrections δ. The δ block of the normal
//! equations is diagonal, so it is eliminated analytically and only an N×N
//! system is factorized per step.

use nalgebra::DMatrix;
use ndarray::{s, Array1, Array2, Axis};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{FitError, Result};
use crate::fit::FitData;
use crate::model::Model;
use crate::problem::{Linearization, OdrProblem, Problem};
use crate::uncertainty::standard_errors_from_covariance;
use crate::utils::matrix_convert::{
    nalgebra_to_ndarray, nalgebra_vec_to_ndarray, ndarray_to_nalgebra, ndarray_vec_to_nalgebra,
};

use super::config::OdrConfig;
use super::convergence::{ConvergenceCriteria, StopReason};
use super::OrthogonalSolver;

/// Message appended when the parameter covariance is rank deficient.
pub const NOT_FULL_RANK: &str = "Problem is not full rank at solution";

// Smallest pivot, relative to a unit diagonal, that counts as identified
const RANK_TOLERANCE: f64 = 1.4901161193847656e-8;

/// Raw output of an orthogonal distance fit.
///
/// Field names follow ODRPACK. Outputs produced by other solvers (or built
/// by hand) may leave numeric fields empty; only `stop_reason` is used for
/// reporting.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OdrOutput {
    /// Fitted parameters
    pub beta: Array1<f64>,

    /// Standard deviation of each parameter, `sqrt(diag(cov_beta) * res_var)`
    pub sd_beta: Array1<f64>,

    /// Unscaled covariance of the parameters
    pub cov_beta: Array2<f64>,

    /// Estimated x-corrections
    pub delta: Array1<f64>,

    /// Estimated y-errors, `f(beta, x + delta) - y`
    pub eps: Array1<f64>,

    /// Residual variance, weighted sum of squares over the degrees of freedom
    pub res_var: f64,

    /// Weighted sum of squares at the solution
    pub sum_square: f64,

    /// Weighted sum of squares of the x-corrections
    pub sum_square_delta: f64,

    /// Weighted sum of squares of the y-errors
    pub sum_square_eps: f64,

    /// Number of accepted steps
    pub iterations: usize,

    /// Number of model evaluations
    pub func_evals: usize,

    /// Machine-readable stop condition, when produced by the built-in solver
    pub info: Option<StopReason>,

    /// Human-readable stop condition(s)
    pub stop_reason: Vec<String>,
}

impl OdrOutput {
    /// Build an output that only carries stop-reason text.
    pub fn from_stop_reason<S: Into<String>>(reasons: impl IntoIterator<Item = S>) -> Self {
        Self {
            stop_reason: reasons.into_iter().map(Into::into).collect(),
            ..Self::default()
        }
    }

    /// Whether the solver reported convergence.
    pub fn converged(&self) -> bool {
        self.info.map_or(false, |info| info.is_converged())
    }
}

impl fmt::Display for OdrOutput {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ODR Output:")?;
        writeln!(f, "  Beta: {:?}", self.beta)?;
        writeln!(f, "  Beta Std Error: {:?}", self.sd_beta)?;
        writeln!(f, "  Residual Variance: {:.6e}", self.res_var)?;
        writeln!(f, "  Sum of squares: {:.6e}", self.sum_square)?;
        writeln!(f, "  Iterations: {}", self.iterations)?;
        writeln!(f, "  Function evaluations: {}", self.func_evals)?;
        writeln!(f, "  Reason(s) for Halting:")?;
        for reason in &self.stop_reason {
            writeln!(f, "    {}", reason)?;
        }
        Ok(())
    }
}

/// Levenberg-Marquardt solver for explicit orthogonal distance regression.
///
/// Minimizes
///
/// S(β, δ) = Σ ((f(β, x + δ) - y) / sy)² + Σ (δ / sx)²
///
/// with Marquardt (diagonal) scaling of the damping term.
#[derive(Debug, Clone, Copy, Default)]
pub struct LevenbergMarquardtOdr;

impl LevenbergMarquardtOdr {
    /// Create a new solver.
    pub fn new() -> Self {
        Self
    }

    /// Run the damped iteration on an already built problem.
    pub fn minimize<M: Model + ?Sized>(
        &self,
        problem: &OdrProblem<'_, M>,
        beta0: &Array1<f64>,
        config: &OdrConfig,
    ) -> Result<OdrOutput> {
        let n_params = beta0.len();
        let m = problem.point_count();
        let criteria = ConvergenceCriteria::new(config.sstol, config.partol, config.max_iterations);

        let mut params = problem.initial_vector(beta0);
        let mut residuals = problem.eval(&params)?;
        let mut func_evals = 1;

        if residuals.iter().any(|r| !r.is_finite()) {
            return Err(FitError::FunctionEvaluation(
                "model returned non-finite values at the initial parameters".to_string(),
            ));
        }

        let mut cost = sum_of_squares(&residuals);
        let mut lambda = config.initial_lambda;
        let mut iterations = 0;

        let info = 'outer: loop {
            if cost == 0.0 {
                break StopReason::SumOfSquaresConvergence;
            }
            if iterations >= config.max_iterations {
                break StopReason::IterationLimit;
            }

            let lin = problem.linearize(&params);
            func_evals += 2 * n_params + 2;

            // Damping loop: retry with larger lambda until the cost does not increase
            loop {
                let step = match solve_step(&lin, &residuals, lambda) {
                    Some(step) => step,
                    None => {
                        lambda = (lambda * config.lambda_up_factor).min(config.max_lambda);
                        if lambda >= config.max_lambda {
                            break 'outer StopReason::NumericalError;
                        }
                        continue;
                    }
                };

                let beta = params.slice(s![..n_params]).to_vec();
                let beta_step = step.slice(s![..n_params]).to_vec();
                let relative_step = criteria.relative_step(&beta, &beta_step);

                let trial = &params + &step;
                let trial_residuals = problem.eval(&trial)?;
                func_evals += 1;
                let trial_cost = sum_of_squares(&trial_residuals);

                if trial_cost.is_finite() && trial_cost <= cost {
                    let reduction = (cost - trial_cost) / cost;
                    params = trial;
                    residuals = trial_residuals;
                    cost = trial_cost;
                    lambda = (lambda * config.lambda_down_factor).max(config.min_lambda);
                    iterations += 1;

                    report_iteration(config, iterations, cost, lambda, relative_step);

                    match criteria.check(reduction, relative_step, iterations) {
                        Some(StopReason::IterationLimit) | None => break,
                        Some(reason) => break 'outer reason,
                    }
                } else {
                    if relative_step < config.partol {
                        break 'outer StopReason::ParameterConvergence;
                    }
                    lambda = (lambda * config.lambda_up_factor).min(config.max_lambda);
                    if lambda >= config.max_lambda {
                        break 'outer StopReason::NumericalError;
                    }
                }
            }
        };

        // Covariance at the solution
        let lin = problem.linearize(&params);
        func_evals += 2 * n_params + 2;
        let mut stop_reason = vec![info.description().to_string()];
        let cov_beta = match parameter_covariance(&lin) {
            Some((cov, rank)) => {
                if rank < n_params {
                    log::debug!("covariance has rank {} of {}", rank, n_params);
                    stop_reason.push(NOT_FULL_RANK.to_string());
                }
                cov
            }
            None => {
                stop_reason.push(NOT_FULL_RANK.to_string());
                Array2::from_elem((n_params, n_params), f64::NAN)
            }
        };

        let dof = m.saturating_sub(n_params);
        let res_var = if dof > 0 { cost / dof as f64 } else { cost };
        let sd_beta = standard_errors_from_covariance(&cov_beta, res_var);

        let (beta, delta) = problem.split(&params);
        let eps = &residuals.slice(s![..m]) / problem.weight_y();

        let output = OdrOutput {
            beta: beta.to_owned(),
            sd_beta,
            cov_beta,
            delta: delta.to_owned(),
            eps,
            res_var,
            sum_square: cost,
            sum_square_delta: sum_of_squares(&residuals.slice(s![m..]).to_owned()),
            sum_square_eps: sum_of_squares(&residuals.slice(s![..m]).to_owned()),
            iterations,
            func_evals,
            info: Some(info),
            stop_reason,
        };

        if config.verbosity >= 1 {
            log::info!(
                "ODR finished after {} iterations: {} (sum of squares {:.6e})",
                output.iterations,
                output.stop_reason.join("; "),
                output.sum_square
            );
        }

        Ok(output)
    }
}

impl OrthogonalSolver for LevenbergMarquardtOdr {
    fn solve<M: Model + ?Sized>(
        &self,
        model: &M,
        data: &FitData,
        beta0: &Array1<f64>,
        config: &OdrConfig,
    ) -> Result<OdrOutput> {
        let problem = OdrProblem::new(model, data, beta0.len())?.with_diff_step(config.diff_step);
        self.minimize(&problem, beta0, config)
    }
}

fn sum_of_squares(values: &Array1<f64>) -> f64 {
    values.iter().map(|v| v * v).sum()
}

fn report_iteration(config: &OdrConfig, iteration: usize, cost: f64, lambda: f64, step: f64) {
    if config.verbosity >= 2 {
        log::debug!(
            "iteration {}: sum of squares {:.6e}, lambda {:.2e}, relative step {:.2e}",
            iteration,
            cost,
            lambda,
            step
        );
    } else {
        log::trace!(
            "iteration {}: sum of squares {:.6e}, lambda {:.2e}",
            iteration,
            cost,
            lambda
        );
    }
}

/// Solve the damped normal equations for the joint step `[Δβ, Δδ]`.
///
/// Returns `None` when the reduced system is not positive definite.
fn solve_step(lin: &Linearization, residuals: &Array1<f64>, lambda: f64) -> Option<Array1<f64>> {
    let g = &lin.beta_jacobian;
    let a = &lin.delta_slope;
    let b = &lin.delta_weight;
    let m = a.len();
    let n = g.ncols();

    let r_eps = residuals.slice(s![..m]);
    let r_delta = residuals.slice(s![m..]);

    // Gradient blocks
    let grad_beta = g.t().dot(&r_eps);
    let grad_delta = a * &r_eps + &(b * &r_delta);

    // Damped diagonal of the δ block
    let d = (a * a + b * b) * (1.0 + lambda);

    // Reduced system: (A + λ diag(A) - Gᵀ diag(a²/d) G) Δβ = -g_β + Gᵀ (a g_δ / d)
    let mut reduced = g.t().dot(g);
    let diag_max = reduced.diag().fold(0.0f64, |acc, v| acc.max(*v));
    let floor = if diag_max > 0.0 { diag_max * f64::EPSILON } else { 1.0 };
    for k in 0..n {
        let scale = reduced[[k, k]].max(floor);
        reduced[[k, k]] += lambda * scale;
    }
    let coupling = (a * a) / &d;
    let weighted_g = g * &coupling.view().insert_axis(Axis(1));
    reduced = reduced - g.t().dot(&weighted_g);

    let rhs = -&grad_beta + &g.t().dot(&(a * &grad_delta / &d));

    let cholesky = ndarray_to_nalgebra(&reduced).cholesky()?;
    let beta_step = nalgebra_vec_to_ndarray(&cholesky.solve(&ndarray_vec_to_nalgebra(&rhs)));
    if beta_step.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let delta_step = (-&grad_delta - &(a * &g.dot(&beta_step))) / &d;

    let mut step = Array1::zeros(n + m);
    step.slice_mut(s![..n]).assign(&beta_step);
    step.slice_mut(s![n..]).assign(&delta_step);
    Some(step)
}

/// Unscaled parameter covariance with the x-corrections eliminated.
///
/// Equals `(Σ w_i g_i g_iᵀ)⁻¹` with the effective weight
/// `w_i = 1 / (sy_i² + f'(x_i)² sx_i²)`. Only the parameters the data
/// identify are inverted; the others get zero rows and columns. Returns the
/// covariance and the number of identified parameters.
fn parameter_covariance(lin: &Linearization) -> Option<(Array2<f64>, usize)> {
    let g = &lin.beta_jacobian;
    let a = &lin.delta_slope;
    let b = &lin.delta_weight;

    let effective = (b * b) / &(a * a + b * b);
    let weighted_g = g * &effective.view().insert_axis(Axis(1));
    let normal = g.t().dot(&weighted_g);
    if normal.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let identified = identified_parameters(&normal);
    let k = identified.len();
    let mut reduced = Array2::zeros((k, k));
    for (r, &i) in identified.iter().enumerate() {
        for (c, &j) in identified.iter().enumerate() {
            reduced[[r, c]] = normal[[i, j]];
        }
    }

    let cholesky = ndarray_to_nalgebra(&reduced).cholesky()?;
    let inverse: DMatrix<f64> = cholesky.inverse();
    let reduced_cov = nalgebra_to_ndarray(&inverse);
    if reduced_cov.iter().any(|v| !v.is_finite()) {
        return None;
    }

    let n = normal.nrows();
    let mut cov = Array2::zeros((n, n));
    for (r, &i) in identified.iter().enumerate() {
        for (c, &j) in identified.iter().enumerate() {
            cov[[i, j]] = reduced_cov[[r, c]];
        }
    }
    Some((cov, k))
}

/// Indices of the parameters the normal matrix determines, in ascending order.
///
/// Runs a diagonal-pivoted Cholesky on the correlation form of `normal` and
/// stops once the largest remaining pivot falls below `RANK_TOLERANCE`.
fn identified_parameters(normal: &Array2<f64>) -> Vec<usize> {
    let n = normal.nrows();
    let scale = normal.diag().mapv(f64::sqrt);

    let mut work = Array2::<f64>::zeros((n, n));
    for i in 0..n {
        for j in 0..n {
            let s = scale[i] * scale[j];
            if s > 0.0 {
                work[[i, j]] = normal[[i, j]] / s;
            }
        }
    }

    let mut remaining: Vec<usize> = (0..n).filter(|&i| scale[i] > 0.0).collect();
    let mut chosen = Vec::with_capacity(remaining.len());
    loop {
        let best = remaining
            .iter()
            .enumerate()
            .max_by(|p, q| work[[*p.1, *p.1]].total_cmp(&work[[*q.1, *q.1]]));
        let Some((pos, &pivot)) = best else {
            break;
        };
        let d = work[[pivot, pivot]];
        if d <= RANK_TOLERANCE {
            break;
        }

        remaining.swap_remove(pos);
        chosen.push(pivot);
        for &i in &remaining {
            for &j in &remaining {
                work[[i, j]] -= work[[i, pivot]] * work[[pivot, j]] / d;
            }
        }
    }

    chosen.sort_unstable();
    chosen
}
