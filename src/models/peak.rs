//! Peak models for fitting data.
//!
//! This module provides an asymmetric pseudo-Voigt lineshape, widely used for
//! spectroscopy and diffraction peaks whose flanks have different widths.

use crate::model::Model;
use ndarray::Array1;

/// Number of parameters of the asymmetric pseudo-Voigt model.
const APV_PARAMS: usize = 7;

/// Gaussian component, unit height at the center.
fn gaussian(x: f64, center: f64, sigma: f64) -> f64 {
    let arg = (x - center) / sigma;
    (-0.5 * arg * arg).exp()
}

/// Lorentzian component, unit height at the center.
fn lorentzian(x: f64, center: f64, sigma: f64) -> f64 {
    let arg = (x - center) / sigma;
    1.0 / (1.0 + arg * arg)
}

/// Evaluate an asymmetric pseudo-Voigt peak.
///
/// The parameters are `(A, x0, sigma_1, eta_1, sigma_2, eta_2, y0)`:
///
/// f(x) = A * [eta * G(x) + (1 - eta) * L(x)] + y0
///
/// where `G` and `L` are a Gaussian and a Lorentzian of width `sigma`, and the
/// pair `(sigma_1, eta_1)` is used for `x < x0` and `(sigma_2, eta_2)` for
/// `x >= x0`.
///
/// The mixing fractions are clamped to `[0, 1]` before evaluation. A parameter
/// vector of the wrong length yields `NaN` everywhere instead of panicking.
pub fn asymmetric_pseudo_voigt(params: &[f64], x: &Array1<f64>) -> Array1<f64> {
    if params.len() != APV_PARAMS {
        return Array1::from_elem(x.len(), f64::NAN);
    }

    let amplitude = params[0];
    let center = params[1];
    let (sigma_1, eta_1) = (params[2], params[3].clamp(0.0, 1.0));
    let (sigma_2, eta_2) = (params[4], params[5].clamp(0.0, 1.0));
    let baseline = params[6];

    x.mapv(|x_val| {
        let (sigma, eta) = if x_val < center {
            (sigma_1, eta_1)
        } else {
            (sigma_2, eta_2)
        };
        amplitude
            * (eta * gaussian(x_val, center, sigma)
                + (1.0 - eta) * lorentzian(x_val, center, sigma))
            + baseline
    })
}

/// An asymmetric pseudo-Voigt peak model.
///
/// See [`asymmetric_pseudo_voigt`] for the parameter layout.
#[derive(Debug, Clone, Copy, Default)]
pub struct AsymmetricPseudoVoigt;

impl AsymmetricPseudoVoigt {
    /// Create a new asymmetric pseudo-Voigt model.
    pub fn new() -> Self {
        Self
    }
}

impl Model for AsymmetricPseudoVoigt {
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        match params.as_slice() {
            Some(p) => asymmetric_pseudo_voigt(p, x),
            None => asymmetric_pseudo_voigt(&params.to_vec(), x),
        }
    }

    fn name(&self) -> &str {
        "asymmetric_pseudo_voigt"
    }

    fn description(&self) -> Option<&str> {
        Some(
            "Asymmetric pseudo-Voigt peak A*(eta*G + (1-eta)*L) + y0.\n\
             Parameters: A, x0, sigma_1, eta_1, sigma_2, eta_2, y0; \
             index 1 applies for x < x0 and index 2 for x >= x0.",
        )
    }

    fn parameter_count(&self) -> Option<usize> {
        Some(APV_PARAMS)
    }
}
