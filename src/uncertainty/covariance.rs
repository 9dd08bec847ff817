//! # Covariance Matrix Helpers
//!
//! Functions for turning the unscaled parameter covariance reported by the
//! solver into standard deviations and correlation coefficients.

use ndarray::{Array1, Array2};

/// Scale the unscaled covariance by the residual variance.
///
///   cov = res_var * cov_beta
pub fn scaled_covariance(cov_beta: &Array2<f64>, res_var: f64) -> Array2<f64> {
    cov_beta * res_var
}

/// Extract parameter standard deviations from the unscaled covariance.
///
/// Standard deviations are `sqrt(diag(cov_beta) * res_var)`. Non-finite or
/// negative diagonal entries give `NaN`.
pub fn standard_errors_from_covariance(cov_beta: &Array2<f64>, res_var: f64) -> Array1<f64> {
    cov_beta.diag().mapv(|c| {
        let variance = c * res_var;
        if variance >= 0.0 {
            variance.sqrt()
        } else {
            f64::NAN
        }
    })
}

/// Calculate the correlation matrix from a covariance matrix.
///
/// The correlation matrix is calculated as:
///   correl[i,j] = covar[i,j] / sqrt(covar[i,i] * covar[j,j])
///
/// Pairs involving a parameter with zero variance get a correlation of 0.
pub fn correlation_matrix(covar: &Array2<f64>) -> Array2<f64> {
    let n = covar.nrows();
    let mut correl = Array2::zeros((n, n));

    for i in 0..n {
        for j in 0..n {
            if i == j {
                correl[[i, j]] = 1.0;
            } else {
                let denom = (covar[[i, i]] * covar[[j, j]]).sqrt();
                correl[[i, j]] = if denom > 0.0 {
                    covar[[i, j]] / denom
                } else {
                    0.0
                };
            }
        }
    }

    correl
}
