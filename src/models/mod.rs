//! Built-in model implementations for common fitting problems.
//!
//! This module provides the reference models of the toolkit: a polynomial of
//! arbitrary degree and an asymmetric pseudo-Voigt peak. Each is available
//! both as a free function `f(params, x)` and as a [`Model`](crate::model::Model)
//! type that can be handed to the fit engine.

mod peak;
mod polynomial;

// Re-export the models
pub use peak::{asymmetric_pseudo_voigt, AsymmetricPseudoVoigt};
pub use polynomial::{polynomial, Polynomial};
