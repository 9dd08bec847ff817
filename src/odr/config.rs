//! Configuration options for the orthogonal distance solver.
//!
//! Defaults follow ODRPACK for explicit models: `sstol = sqrt(eps)`,
//! `partol = eps^(2/3)` and at most 50 iterations.

use crate::utils::finite_difference::DEFAULT_STEP;

/// Default tolerance for the relative reduction of the sum of squares.
pub const DEFAULT_SSTOL: f64 = 1.490_116_119_384_765_6e-8;

/// Default tolerance for the relative parameter change.
pub const DEFAULT_PARTOL: f64 = 3.666_852_862_501_036e-11;

/// Default iteration limit.
pub const DEFAULT_MAX_ITERATIONS: usize = 50;

/// Configuration options for the orthogonal distance solver.
#[derive(Debug, Clone)]
pub struct OdrConfig {
    /// Tolerance for the relative reduction of the sum of squares. Default: sqrt(eps)
    pub sstol: f64,

    /// Tolerance for the relative change in parameter values. Default: eps^(2/3)
    pub partol: f64,

    /// Maximum number of iterations. Default: 50
    pub max_iterations: usize,

    /// Reporting level: 0 silent, 1 summary, 2 every iteration. Default: 0
    pub verbosity: u32,

    /// Initial value for the damping parameter. Default: 1e-3
    pub initial_lambda: f64,

    /// Factor by which to increase lambda. Default: 10.0
    pub lambda_up_factor: f64,

    /// Factor by which to decrease lambda. Default: 0.1
    pub lambda_down_factor: f64,

    /// Minimum value for lambda. Default: 1e-12
    pub min_lambda: f64,

    /// Maximum value for lambda. Default: 1e12
    pub max_lambda: f64,

    /// Relative step for finite differences. Default: eps^(1/3)
    pub diff_step: f64,
}

impl Default for OdrConfig {
    fn default() -> Self {
        Self {
            sstol: DEFAULT_SSTOL,
            partol: DEFAULT_PARTOL,
            max_iterations: DEFAULT_MAX_ITERATIONS,
            verbosity: 0,
            initial_lambda: 1e-3,
            lambda_up_factor: 10.0,
            lambda_down_factor: 0.1,
            min_lambda: 1e-12,
            max_lambda: 1e12,
            diff_step: DEFAULT_STEP,
        }
    }
}

impl OdrConfig {
    /// Set the sum-of-squares tolerance.
    pub fn with_sstol(mut self, sstol: f64) -> Self {
        self.sstol = sstol;
        self
    }

    /// Set the parameter tolerance.
    pub fn with_partol(mut self, partol: f64) -> Self {
        self.partol = partol;
        self
    }

    /// Set the maximum number of iterations.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the reporting level.
    pub fn with_verbosity(mut self, verbosity: u32) -> Self {
        self.verbosity = verbosity;
        self
    }

    /// Set the initial value for the damping parameter.
    pub fn with_lambda(mut self, lambda: f64) -> Self {
        self.initial_lambda = lambda;
        self
    }

    /// Set the relative finite-difference step.
    pub fn with_diff_step(mut self, step: f64) -> Self {
        self.diff_step = step;
        self
    }
}
