//! Fit results and reporting.

use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::Result;
use crate::fit::{FitData, Fittable};
use crate::model::Model;
use crate::odr::OdrOutput;
use crate::uncertainty::jackknife::{jackknife, JackknifeOptions, JackknifeResult};
use crate::uncertainty::{correlation_matrix, nominal_values, UncertainValue};

/// Goodness-of-fit statistics of a single fit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoodnessOfFit {
    /// Coefficient of determination
    pub r2: f64,

    /// R² adjusted for the number of parameters
    pub r2_adjusted: f64,

    /// Observed minus predicted values, one per data point
    pub residuals: Array1<f64>,
}

impl GoodnessOfFit {
    pub fn new(r2: f64, r2_adjusted: f64, residuals: Array1<f64>) -> Self {
        Self {
            r2,
            r2_adjusted,
            residuals,
        }
    }
}

/// The outcome of one fit.
///
/// Holds the fitted parameters with their standard deviations, the optional
/// goodness-of-fit statistics and the raw solver output. R², adjusted R² and
/// the residuals are either all present or all absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FitResult {
    parameters: Vec<UncertainValue>,
    statistics: Option<GoodnessOfFit>,
    output: OdrOutput,
}

/// The fields of a [`FitResult`] in reporting order:
/// parameters, R², adjusted R², residuals, raw solver output.
pub type FitParts<'a> = (
    &'a [UncertainValue],
    Option<f64>,
    Option<f64>,
    Option<&'a Array1<f64>>,
    &'a OdrOutput,
);

impl FitResult {
    /// Create a result from its parts.
    pub fn new(
        parameters: Vec<UncertainValue>,
        statistics: Option<GoodnessOfFit>,
        output: OdrOutput,
    ) -> Self {
        Self {
            parameters,
            statistics,
            output,
        }
    }

    /// Fitted parameters in the order of `p0`.
    pub fn parameters(&self) -> &[UncertainValue] {
        &self.parameters
    }

    pub fn statistics(&self) -> Option<&GoodnessOfFit> {
        self.statistics.as_ref()
    }

    pub fn r2(&self) -> Option<f64> {
        self.statistics.as_ref().map(|s| s.r2)
    }

    pub fn r2_adjusted(&self) -> Option<f64> {
        self.statistics.as_ref().map(|s| s.r2_adjusted)
    }

    pub fn residuals(&self) -> Option<&Array1<f64>> {
        self.statistics.as_ref().map(|s| &s.residuals)
    }

    /// Raw solver output.
    pub fn output(&self) -> &OdrOutput {
        &self.output
    }

    /// Borrow all fields at once, in reporting order.
    pub fn decompose(&self) -> FitParts<'_> {
        (
            &self.parameters,
            self.r2(),
            self.r2_adjusted(),
            self.residuals(),
            &self.output,
        )
    }

    /// Consume the result and return its owned parts.
    pub fn into_parts(self) -> (Vec<UncertainValue>, Option<GoodnessOfFit>, OdrOutput) {
        (self.parameters, self.statistics, self.output)
    }

    /// Nominal values of the fitted parameters.
    pub fn nominal_values(&self) -> Vec<f64> {
        nominal_values(&self.parameters)
    }

    /// Evaluate `model` at `x` with the fitted nominal parameters.
    pub fn predict<M: Model + ?Sized>(&self, model: &M, x: &Array1<f64>) -> Array1<f64> {
        model.eval(&Array1::from(self.nominal_values()), x)
    }

    /// Parameter correlation matrix from the solver covariance.
    pub fn correlation(&self) -> Array2<f64> {
        correlation_matrix(&self.output.cov_beta)
    }

    /// Pretty-printed JSON representation.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Leave-one-out jackknife estimate of the parameters.
    ///
    /// Each subset is fitted with `target`, which need not be the model that
    /// produced this result. See [`jackknife`](crate::uncertainty::jackknife::jackknife)
    /// for the procedure.
    pub fn jackknife<F: Fittable + ?Sized>(
        &self,
        target: &F,
        data: &FitData,
        options: &JackknifeOptions,
    ) -> Result<JackknifeResult> {
        jackknife(self, target, data, options)
    }
}

impl fmt::Display for FitResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let border = "#".repeat(32);
        writeln!(f, "{}", border)?;
        writeln!(f, "#########  Fit result  #########")?;
        writeln!(f, "{}", border)?;

        writeln!(f, "* Parameters:")?;
        for (i, p) in self.parameters.iter().enumerate() {
            writeln!(f, "      - p{} = {}", i + 1, p)?;
        }

        match self.r2() {
            Some(r2) => writeln!(f, "* R² = {:.4}", r2)?,
            None => writeln!(f, "* R² = N/A")?,
        }
        match self.r2_adjusted() {
            Some(r2_adj) => writeln!(f, "* Adjusted R² = {:.4}", r2_adj)?,
            None => writeln!(f, "* Adjusted R² = N/A")?,
        }

        writeln!(f, "* Stop reason(s):")?;
        if self.output.stop_reason.is_empty() {
            writeln!(f, "      - N/A")?;
        }
        for reason in &self.output.stop_reason {
            writeln!(f, "      - {}", reason)?;
        }

        write!(f, "{}", border)
    }
}
