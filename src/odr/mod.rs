//! Orthogonal distance regression solver.
//!
//! This module provides a damped Gauss-Newton (Levenberg-Marquardt) solver for
//! explicit models with uncertainties on both axes. Results use ODRPACK field
//! names and stop-reason wording so they can be compared with other ODR tools.

pub mod algorithm;
pub mod config;
pub mod convergence;

use ndarray::Array1;

use crate::error::Result;
use crate::fit::FitData;
use crate::model::Model;

// Re-export key types
pub use algorithm::{LevenbergMarquardtOdr, OdrOutput, NOT_FULL_RANK};
pub use config::{OdrConfig, DEFAULT_MAX_ITERATIONS, DEFAULT_PARTOL, DEFAULT_SSTOL};
pub use convergence::{ConvergenceCriteria, StopReason};

/// A solver for orthogonal distance regression problems.
///
/// Implementors take a model, a data set and a starting guess and return the
/// raw solver output. The fitting layer turns that output into a
/// [`FitResult`](crate::FitResult).
pub trait OrthogonalSolver: Send + Sync {
    /// Fit `model` to `data` starting from `beta0`.
    fn solve<M: Model + ?Sized>(
        &self,
        model: &M,
        data: &FitData,
        beta0: &Array1<f64>,
        config: &OdrConfig,
    ) -> Result<OdrOutput>;
}
