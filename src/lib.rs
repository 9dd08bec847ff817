//! # odrfit
//!
//! `odrfit` fits models to experimental data with uncertainties on both axes
//! using orthogonal distance regression, and estimates parameter uncertainty
//! by jackknife resampling.
//!
//! The library provides:
//! - A Levenberg-Marquardt orthogonal distance solver with ODRPACK defaults
//! - A fit engine that validates inputs and reports R² and adjusted R²
//! - Leave-one-out jackknife estimates with include/exclude selection
//! - Reference models: polynomial and asymmetric pseudo-Voigt peak
//!
//! ## Basic Usage
//!
//! ```
//! use ndarray::Array1;
//! use odrfit::{FitData, FitOptions, Fittable, JackknifeOptions, Polynomial};
//!
//! let x = Array1::<f64>::linspace(0.0, 10.0, 11);
//! let y = x.mapv(|x| 2.0 * x + 1.0 + 0.01 * (3.0 * x).sin());
//! let data = FitData::new(x, y).with_y_errors(Array1::from_elem(11, 0.01));
//!
//! let model = Polynomial::with_degree(1);
//! let result = model.fit_odr(&data, &[0.0, 0.0], &FitOptions::default()).unwrap();
//! println!("{}", result);
//!
//! let jk = result.jackknife(&model, &data, &JackknifeOptions::default()).unwrap();
//! assert_eq!(jk.parameters.len(), 2);
//! assert_eq!(jk.fits.len(), 11);
//! ```
//!
//! The jackknife target must be able to fit; anything else is rejected at
//! compile time:
//!
//! ```compile_fail
//! use ndarray::array;
//! use odrfit::{FitData, FitOptions, Fittable, JackknifeOptions, Polynomial};
//!
//! struct NotAFitter;
//!
//! let data = FitData::new(array![0.0, 1.0, 2.0], array![1.0, 3.0, 5.0]);
//! let result = Polynomial::new().fit_odr(&data, &[0.0, 0.0], &FitOptions::default()).unwrap();
//! let _ = result.jackknife(&NotAFitter, &data, &JackknifeOptions::default());
//! ```

pub mod error;
pub mod fit;
pub mod model;
pub mod models;
pub mod odr;
pub mod problem;
pub mod result;
pub mod stats;
pub mod uncertainty;
pub mod utils;

// Re-exports for convenience
pub use error::{FitError, Result};
pub use fit::{fit, fit_with_solver, FitData, FitOptions, Fittable, Fitter};
pub use model::{FnModel, Model};
pub use models::{asymmetric_pseudo_voigt, polynomial, AsymmetricPseudoVoigt, Polynomial};
pub use odr::{LevenbergMarquardtOdr, OdrConfig, OdrOutput, OrthogonalSolver, StopReason};
pub use problem::Problem;
pub use result::{FitResult, GoodnessOfFit};
pub use stats::coefficient_of_determination;
pub use uncertainty::{
    nominal_values, std_devs, JackknifeOptions, JackknifeResult, SkipReason, SkippedSubset,
    UncertainValue,
};

/// Version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
