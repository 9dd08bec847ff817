//! Model trait and closure-backed model implementation.
//!
//! A model is a pure, vectorized function `f(params, x) -> y`. It carries no
//! parameter state of its own: the parameter vector is supplied on every call,
//! so the same model value can be shared by many fits (including the
//! leave-one-out fits of the jackknife).

use ndarray::Array1;
use std::fmt;

/// A trait representing a model function that can be fit to data.
///
/// Implementations must tolerate any real-valued parameter vector the solver
/// visits during optimization. Physically meaningless parameters may produce
/// `inf` or `NaN`, which the solver treats as a rejected step; `eval` itself
/// must not panic.
pub trait Model: Send + Sync {
    /// Evaluates the model at the given x values.
    ///
    /// # Arguments
    ///
    /// * `params` - The parameter vector
    /// * `x` - The independent variable values
    ///
    /// # Returns
    ///
    /// * The predicted values, one per element of `x`
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64>;

    /// Name used in reports and log lines.
    fn name(&self) -> &str;

    /// Optional human readable description of the model.
    fn description(&self) -> Option<&str> {
        None
    }

    /// Number of parameters the model expects, if fixed.
    ///
    /// Models with a variable number of parameters (e.g. polynomials of any
    /// degree) return `None`.
    fn parameter_count(&self) -> Option<usize> {
        None
    }

    /// Returns a multi-line description of the model for display.
    fn describe(&self) -> String {
        match self.description() {
            Some(doc) if !doc.trim().is_empty() => {
                format!("Function {}:\n{}", self.name(), doc.trim())
            }
            _ => format!("Function {}: no description available.", self.name()),
        }
    }
}

type ModelFn = dyn Fn(&Array1<f64>, &Array1<f64>) -> Array1<f64> + Send + Sync;

/// A model backed by a closure.
///
/// This is the quickest way to fit an ad-hoc function:
///
/// ```
/// use ndarray::array;
/// use odrfit::model::{FnModel, Model};
///
/// let line = FnModel::new("line", |p, x| x.mapv(|x| p[0] * x + p[1]))
///     .with_parameter_count(2);
/// let y = line.eval(&array![2.0, 1.0], &array![0.0, 1.0, 2.0]);
/// assert_eq!(y, array![1.0, 3.0, 5.0]);
/// ```
pub struct FnModel {
    name: String,
    description: Option<String>,
    parameter_count: Option<usize>,
    func: Box<ModelFn>,
}

impl FnModel {
    /// Create a new closure model.
    pub fn new<F>(name: &str, func: F) -> Self
    where
        F: Fn(&Array1<f64>, &Array1<f64>) -> Array1<f64> + Send + Sync + 'static,
    {
        Self {
            name: name.to_string(),
            description: None,
            parameter_count: None,
            func: Box::new(func),
        }
    }

    /// Attach a description shown by [`Model::describe`].
    pub fn with_description(mut self, description: &str) -> Self {
        self.description = Some(description.to_string());
        self
    }

    /// Declare the number of parameters the closure expects.
    pub fn with_parameter_count(mut self, count: usize) -> Self {
        self.parameter_count = Some(count);
        self
    }
}

impl Model for FnModel {
    fn eval(&self, params: &Array1<f64>, x: &Array1<f64>) -> Array1<f64> {
        (self.func)(params, x)
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn parameter_count(&self) -> Option<usize> {
        self.parameter_count
    }
}

impl fmt::Debug for FnModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FnModel")
            .field("name", &self.name)
            .field("parameter_count", &self.parameter_count)
            .finish_non_exhaustive()
    }
}
