//! Finite difference methods for numerical differentiation.
//!
//! The orthogonal distance solver needs two kinds of model derivatives: the
//! gradient with respect to each parameter and the slope with respect to x.
//! Both are approximated here with central differences.

use crate::model::Model;
use ndarray::{Array1, Array2};

/// Default relative step size for central differences (cube root of machine epsilon).
pub const DEFAULT_STEP: f64 = 6.055_454_452_393_343e-6;

/// Step actually used around `value`, scaled to its magnitude.
#[inline]
fn scaled_step(value: f64, step: f64) -> f64 {
    if value.abs() > step {
        value.abs() * step
    } else {
        step
    }
}

/// Compute the model Jacobian with respect to the parameters.
///
/// Returns the matrix `J[i, k] = ∂f(params, x_i)/∂params[k]` using central
/// differences, at a cost of two model evaluations per parameter.
///
/// # Arguments
///
/// * `model` - The model to differentiate
/// * `params` - The parameter values at which to evaluate the Jacobian
/// * `x` - The points at which the model is evaluated
/// * `step` - Relative step size (optional)
pub fn parameter_jacobian<M: Model + ?Sized>(
    model: &M,
    params: &Array1<f64>,
    x: &Array1<f64>,
    step: Option<f64>,
) -> Array2<f64> {
    let step = step.unwrap_or(DEFAULT_STEP);
    let mut jac = Array2::zeros((x.len(), params.len()));

    for k in 0..params.len() {
        let h = scaled_step(params[k], step);

        let mut forward = params.clone();
        forward[k] += h;
        let mut backward = params.clone();
        backward[k] -= h;

        let f_forward = model.eval(&forward, x);
        let f_backward = model.eval(&backward, x);

        // A malformed evaluation poisons the column instead of panicking
        if f_forward.len() != x.len() || f_backward.len() != x.len() {
            jac.column_mut(k).fill(f64::NAN);
            continue;
        }
        for i in 0..x.len() {
            jac[[i, k]] = (f_forward[i] - f_backward[i]) / (2.0 * h);
        }
    }

    jac
}

/// Compute the slope `∂f(params, x_i)/∂x_i` at every point.
///
/// Models are vectorized and pointwise, so all points are perturbed at once
/// and the whole slope vector costs two model evaluations.
pub fn x_derivative<M: Model + ?Sized>(
    model: &M,
    params: &Array1<f64>,
    x: &Array1<f64>,
    step: Option<f64>,
) -> Array1<f64> {
    let step = step.unwrap_or(DEFAULT_STEP);
    let h = x.mapv(|x_val| scaled_step(x_val, step));

    let forward = model.eval(params, &(x + &h));
    let backward = model.eval(params, &(x - &h));
    if forward.len() != x.len() || backward.len() != x.len() {
        return Array1::from_elem(x.len(), f64::NAN);
    }

    (&forward - &backward) / (2.0 * &h)
}
