//! Polynomial model for fitting data.

use crate::model::Model;
use ndarray::Array1;

/// Evaluate a polynomial with coefficients given from low to high degree.
///
/// The polynomial function is defined as:
///
/// f(x) = c[0] + c[1]*x + c[2]*x^2 + ... + c[n]*x^n
///
/// An empty coefficient slice evaluates to zero everywhere.
///
/// ```
/// use ndarray::array;
/// use odrfit::models::polynomial;
///
/// let y = polynomial(&[1.0, 2.0, 3.0], &array![0.0, 1.0, 2.0]);
/// assert_eq!(y, array![1.0, 6.0, 17.0]);
/// ```
pub fn polynomial(coeffs: &[f64], x: &Array1<f64>) -> Array1<f64> {
    // Horner's scheme, highest degree first
    x.mapv(|x_val| coeffs.iter().rev().fold(0.0, |acc, &c| acc * x_val + c))
}

/// A polynomial model.
///
/// Without a declared degree the model accepts any number of coefficients
/// and the degree follows the length of the initial parameter vector.
#[derive(Debug, Clone, Default)]
pub struct Polynomial {
    degree: Option<usize>,
}

impl Polynomial {
    /// Create a polynomial model whose degree follows the parameter vector.
    pub fn new() -> Self {
        Self { degree: None }
    }

    /// Create a polynomial model of a fixed degree (`degree + 1` coefficients).
    pub fn with_degree(degree: usize) -> Self {
        Self {
            degree: Some(degree),
        }
    }

    /// The declared degree, if any.
    pub fn degree(&self) -> Option<usize> {
        self.degree
    }
}

impl Model for Polynomial {
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        match params.as_slice() {
            Some(coeffs) => polynomial(coeffs, x),
            None => polynomial(&params.to_vec(), x),
        }
    }

    fn name(&self) -> &str {
        "polynomial"
    }

    fn description(&self) -> Option<&str> {
        Some(
            "Polynomial y = a_0 + a_1*x + ... + a_n*x^n.\n\
             Parameters are the coefficients from the constant term upwards.",
        )
    }

    fn parameter_count(&self) -> Option<usize> {
        self.degree.map(|d| d + 1)
    }
}
