//! # Parameter Uncertainty
//!
//! This module provides the value type used to report fitted parameters and
//! the tools for estimating their uncertainty:
//!
//! - Standard deviations and correlations from the solver covariance
//! - Leave-one-out jackknife resampling with include/exclude selection

mod covariance;
pub mod jackknife;
mod value;

pub use covariance::{correlation_matrix, scaled_covariance, standard_errors_from_covariance};
pub use jackknife::{jackknife, JackknifeOptions, JackknifeResult, SkipReason, SkippedSubset};
pub use value::{nominal_values, std_devs, UncertainValue};
