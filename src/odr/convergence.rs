//! Convergence criteria for the orthogonal distance solver.
//!
//! This module defines the stop conditions of the damped Gauss-Newton
//! iteration and the wording used to report them.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Reason the solver stopped iterating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The relative reduction of the sum of squares fell below `sstol`.
    SumOfSquaresConvergence,

    /// The relative parameter step fell below `partol`.
    ParameterConvergence,

    /// Both criteria were met on the same step.
    BothConvergence,

    /// The iteration limit was reached before convergence.
    IterationLimit,

    /// No step could reduce the sum of squares.
    NumericalError,
}

impl StopReason {
    /// Returns true if the solver stopped because it converged.
    pub fn is_converged(&self) -> bool {
        matches!(
            self,
            StopReason::SumOfSquaresConvergence
                | StopReason::ParameterConvergence
                | StopReason::BothConvergence
        )
    }

    /// Returns a description of the stop reason.
    pub fn description(&self) -> &'static str {
        match self {
            StopReason::SumOfSquaresConvergence => "Sum of squares convergence",
            StopReason::ParameterConvergence => "Parameter convergence",
            StopReason::BothConvergence => "Both sum of squares and parameter convergence",
            StopReason::IterationLimit => "Iteration limit reached",
            StopReason::NumericalError => "Numerical error detected",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Criteria for deciding when an accepted step ends the iteration.
#[derive(Debug, Clone)]
pub struct ConvergenceCriteria {
    /// Tolerance for the relative reduction of the sum of squares.
    pub sstol: f64,

    /// Tolerance for the relative change of the parameters.
    pub partol: f64,

    /// Maximum number of accepted steps.
    pub max_iterations: usize,
}

impl ConvergenceCriteria {
    /// Creates a new set of convergence criteria with the given tolerances.
    pub fn new(sstol: f64, partol: f64, max_iterations: usize) -> Self {
        Self {
            sstol,
            partol,
            max_iterations,
        }
    }

    /// Relative size of a parameter step.
    ///
    /// `partol` in the denominator keeps the ratio finite for all-zero parameters.
    pub fn relative_step(&self, params: &[f64], step: &[f64]) -> f64 {
        let step_norm = step.iter().map(|s| s * s).sum::<f64>().sqrt();
        let param_norm = params.iter().map(|p| p * p).sum::<f64>().sqrt();
        step_norm / (param_norm + self.partol)
    }

    /// Checks an accepted step.
    ///
    /// # Arguments
    ///
    /// * `reduction` - Relative reduction of the sum of squares achieved by the step
    /// * `relative_step` - Relative parameter step (see [`relative_step`](Self::relative_step))
    /// * `iterations` - Number of accepted steps so far, including this one
    ///
    /// # Returns
    ///
    /// * `Some(reason)` if the iteration should stop, `None` otherwise
    pub fn check(
        &self,
        reduction: f64,
        relative_step: f64,
        iterations: usize,
    ) -> Option<StopReason> {
        let sum_of_squares = reduction < self.sstol;
        let parameters = relative_step < self.partol;

        match (sum_of_squares, parameters) {
            (true, true) => Some(StopReason::BothConvergence),
            (true, false) => Some(StopReason::SumOfSquaresConvergence),
            (false, true) => Some(StopReason::ParameterConvergence),
            (false, false) if iterations >= self.max_iterations => Some(StopReason::IterationLimit),
            (false, false) => None,
        }
    }
}
