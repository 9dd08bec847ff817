//! Leave-one-out jackknife estimates of parameter uncertainty.
//!
//! For a sample of `n` points the model is refitted `n` times, each time with
//! one point removed. With θ̂ the original estimate and θ̄ the mean of the
//! subset estimates, each parameter gets
//!
//! * estimate: `n·θ̂ − (n−1)·θ̄`
//! * standard error: `sqrt((n−1)/n · Σ (θ_i − θ̄)²)`
//!
//! Subsets can be restricted with an include list or an exclude list. Subsets
//! whose fit fails are logged and left out of the aggregate; `n` stays the
//! full sample size in both formulas, so skipped subsets shrink the spread
//! term without changing the scale factors.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{FitError, LogOnError, Result};
use crate::fit::{FitData, FitOptions, Fittable};
use crate::result::FitResult;

use super::value::UncertainValue;

/// Options for a jackknife run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JackknifeOptions {
    /// Starting parameters for every subset fit. Defaults to the nominal
    /// values of the original fit when `None` or empty.
    pub p0: Option<Vec<f64>>,

    /// Options forwarded to every subset fit
    pub fit: FitOptions,

    /// Indices whose leave-one-out subset is not fitted
    pub exclude: Vec<usize>,

    /// If non-empty, only these leave-one-out subsets are fitted
    pub include: Vec<usize>,

    /// Fit subsets on the rayon thread pool (requires the `parallel` feature)
    pub parallel: bool,
}

impl JackknifeOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_p0(mut self, p0: Vec<f64>) -> Self {
        self.p0 = Some(p0);
        self
    }

    pub fn with_fit_options(mut self, fit: FitOptions) -> Self {
        self.fit = fit;
        self
    }

    pub fn with_exclude(mut self, exclude: Vec<usize>) -> Self {
        self.exclude = exclude;
        self
    }

    pub fn with_include(mut self, include: Vec<usize>) -> Self {
        self.include = include;
        self
    }

    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }
}

/// Why a leave-one-out subset did not contribute to the estimate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SkipReason {
    /// An include list was given and the index is not in it.
    NotIncluded,

    /// The index is in the exclude list.
    Excluded,

    /// The subset fit returned an error.
    FitFailed(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotIncluded => write!(f, "not in the include list"),
            SkipReason::Excluded => write!(f, "excluded"),
            SkipReason::FitFailed(err) => write!(f, "fit failed: {}", err),
        }
    }
}

/// A leave-one-out subset that was not aggregated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedSubset {
    /// Index of the point left out of this subset
    pub index: usize,

    pub reason: SkipReason,
}

/// Outcome of a jackknife run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JackknifeResult {
    /// Jackknife estimate and standard error of each parameter
    pub parameters: Vec<UncertainValue>,

    /// Successful subset fits, in index order
    pub fits: Vec<FitResult>,

    /// Index of the point left out of each entry of `fits`
    pub fitted_indices: Vec<usize>,

    /// Subsets that were not fitted or whose fit failed, in index order
    pub skipped: Vec<SkippedSubset>,
}

impl JackknifeResult {
    /// Consume the result, keeping the estimates and the subset fits.
    pub fn into_parts(self) -> (Vec<UncertainValue>, Vec<FitResult>) {
        (self.parameters, self.fits)
    }
}

/// Run the leave-one-out jackknife around `original`.
///
/// # Arguments
///
/// * `original` - The fit of the full data set; provides θ̂ and the default `p0`
/// * `target` - Fits each subset
/// * `data` - The full data set
/// * `options` - Starting values, fit options and subset selection
///
/// # Errors
///
/// * `InvalidArguments` if both `include` and `exclude` are non-empty
/// * `InvalidState` if no `p0` is given and `original` has no parameters
/// * `DimensionMismatch` if the data lengths disagree, or a subset fit
///   returns a different number of parameters than `original`
/// * `AggregationFailure` if no subset fit succeeded
pub fn jackknife<F: Fittable + ?Sized>(
    original: &FitResult,
    target: &F,
    data: &FitData,
    options: &JackknifeOptions,
) -> Result<JackknifeResult> {
    run_jackknife(original, target, data, options).log_critical("jackknife")
}

fn run_jackknife<F: Fittable + ?Sized>(
    original: &FitResult,
    target: &F,
    data: &FitData,
    options: &JackknifeOptions,
) -> Result<JackknifeResult> {
    if !options.include.is_empty() && !options.exclude.is_empty() {
        return Err(FitError::InvalidArguments(
            "'include' and 'exclude' cannot both be given".to_string(),
        ));
    }

    let estimates = original.nominal_values();
    let p0 = match options.p0.as_deref() {
        Some(p0) if !p0.is_empty() => p0.to_vec(),
        _ if !estimates.is_empty() => estimates.clone(),
        _ => {
            return Err(FitError::InvalidState(
                "no original parameters to infer p0 from".to_string(),
            ))
        }
    };

    data.validate()?;
    let n = data.len();

    let (planned, mut skipped) = plan_subsets(n, &options.include, &options.exclude);
    let outcomes = run_subsets(target, data, &planned, &p0, options);

    let mut fits = Vec::with_capacity(outcomes.len());
    let mut fitted_indices = Vec::with_capacity(outcomes.len());
    for (index, outcome) in planned.iter().zip(outcomes) {
        match outcome {
            Ok(fit) => {
                fits.push(fit);
                fitted_indices.push(*index);
            }
            Err(reason) => skipped.push(SkippedSubset {
                index: *index,
                reason: SkipReason::FitFailed(reason),
            }),
        }
    }
    skipped.sort_by_key(|s| s.index);

    if fits.is_empty() {
        return Err(FitError::AggregationFailure(
            "no subset fit succeeded during the jackknife".to_string(),
        ));
    }

    let subset_estimates: Vec<Vec<f64>> = fits.iter().map(FitResult::nominal_values).collect();
    let parameters = aggregate(&estimates, &subset_estimates, n)?;

    log::debug!(
        "jackknife aggregated {} of {} subsets",
        fits.len(),
        n
    );

    Ok(JackknifeResult {
        parameters,
        fits,
        fitted_indices,
        skipped,
    })
}

/// Split `0..n` into indices to fit and indices skipped by the selection.
fn plan_subsets(
    n: usize,
    include: &[usize],
    exclude: &[usize],
) -> (Vec<usize>, Vec<SkippedSubset>) {
    let include: HashSet<usize> = include.iter().copied().collect();
    let exclude: HashSet<usize> = exclude.iter().copied().collect();

    let mut planned = Vec::with_capacity(n);
    let mut skipped = Vec::new();
    for index in 0..n {
        let reason = if !include.is_empty() && !include.contains(&index) {
            Some(SkipReason::NotIncluded)
        } else if exclude.contains(&index) {
            Some(SkipReason::Excluded)
        } else {
            None
        };

        match reason {
            Some(reason) => {
                log::info!("Subset {} skipped: {}", index + 1, reason);
                skipped.push(SkippedSubset { index, reason });
            }
            None => planned.push(index),
        }
    }
    (planned, skipped)
}

fn fit_subset<F: Fittable + ?Sized>(
    target: &F,
    data: &FitData,
    index: usize,
    p0: &[f64],
    options: &FitOptions,
) -> std::result::Result<FitResult, String> {
    let outcome = target.fit_odr_unlogged(&data.without(index), p0, options);
    let reason = outcome.as_ref().err().map(ToString::to_string);
    outcome
        .log_recoverable(&format!("jackknife subset {}", index + 1))
        .ok_or_else(|| reason.unwrap_or_default())
}

#[cfg(feature = "parallel")]
fn run_subsets<F: Fittable + ?Sized>(
    target: &F,
    data: &FitData,
    planned: &[usize],
    p0: &[f64],
    options: &JackknifeOptions,
) -> Vec<std::result::Result<FitResult, String>> {
    let fit_one = |&index: &usize| fit_subset(target, data, index, p0, &options.fit);
    if options.parallel {
        planned.par_iter().map(fit_one).collect()
    } else {
        planned.iter().map(fit_one).collect()
    }
}

#[cfg(not(feature = "parallel"))]
fn run_subsets<F: Fittable + ?Sized>(
    target: &F,
    data: &FitData,
    planned: &[usize],
    p0: &[f64],
    options: &JackknifeOptions,
) -> Vec<std::result::Result<FitResult, String>> {
    if options.parallel {
        log::debug!("parallel jackknife requested without the `parallel` feature");
    }
    planned
        .iter()
        .map(|&index| fit_subset(target, data, index, p0, &options.fit))
        .collect()
}

/// Combine the original estimates with the subset estimates.
///
/// `n` is the full sample size, not the number of subsets.
fn aggregate(original: &[f64], subsets: &[Vec<f64>], n: usize) -> Result<Vec<UncertainValue>> {
    if let Some(bad) = subsets.iter().find(|s| s.len() != original.len()) {
        return Err(FitError::DimensionMismatch(format!(
            "subset fit returned {} parameters, original fit has {}",
            bad.len(),
            original.len()
        )));
    }

    let n = n as f64;
    let count = subsets.len() as f64;

    let parameters = original
        .iter()
        .enumerate()
        .map(|(k, &theta_hat)| {
            let mean = subsets.iter().map(|s| s[k]).sum::<f64>() / count;
            let spread: f64 = subsets.iter().map(|s| (s[k] - mean).powi(2)).sum();
            let estimate = n * theta_hat - (n - 1.0) * mean;
            let std_err = ((n - 1.0) / n * spread).sqrt();
            UncertainValue::new(estimate, std_err)
        })
        .collect();

    Ok(parameters)
}
