//! Goodness-of-fit statistics.

use ndarray::Array1;

/// Arithmetic mean; `NaN` for an empty array.
pub fn mean(values: &Array1<f64>) -> f64 {
    values.mean().unwrap_or(f64::NAN)
}

/// Coefficient of determination and its adjusted form.
///
/// R² = 1 − SSR / SST and adjusted R² = 1 − (1 − R²)(n − 1)/(n − k − 1),
/// with `n = y.len()` and `k = n_params`.
///
/// The adjusted value is only meaningful for `n > k + 1`. It is not guarded:
/// otherwise the division yields a non-finite or out-of-range number.
///
/// # Arguments
///
/// * `y` - Observed dependent values
/// * `residuals` - Observed minus predicted values
/// * `n_params` - Number of fitted parameters
///
/// # Returns
///
/// * `(r2, r2_adjusted)`
pub fn coefficient_of_determination(
    y: &Array1<f64>,
    residuals: &Array1<f64>,
    n_params: usize,
) -> (f64, f64) {
    let ssr: f64 = residuals.iter().map(|r| r * r).sum();
    let y_mean = mean(y);
    let sst: f64 = y.iter().map(|v| (v - y_mean).powi(2)).sum();

    let r2 = 1.0 - ssr / sst;

    let n = y.len() as f64;
    let k = n_params as f64;
    let r2_adjusted = 1.0 - (1.0 - r2) * (n - 1.0) / (n - k - 1.0);

    (r2, r2_adjusted)
}
