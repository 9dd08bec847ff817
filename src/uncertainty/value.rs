//! A real number paired with its standard deviation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A nominal value with a one-sigma uncertainty.
///
/// Fitted parameters and jackknife estimates are reported as `UncertainValue`s.
/// No propagation arithmetic is defined; aggregation works on nominal values.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UncertainValue {
    nominal: f64,
    std_dev: f64,
}

impl UncertainValue {
    /// Create a new value with the given standard deviation.
    pub fn new(nominal: f64, std_dev: f64) -> Self {
        Self { nominal, std_dev }
    }

    /// Create a value with zero uncertainty.
    pub fn exact(nominal: f64) -> Self {
        Self::new(nominal, 0.0)
    }

    /// The nominal value.
    pub fn nominal_value(&self) -> f64 {
        self.nominal
    }

    /// The standard deviation.
    pub fn std_dev(&self) -> f64 {
        self.std_dev
    }

    /// Standard deviation relative to the magnitude of the nominal value.
    pub fn relative_uncertainty(&self) -> f64 {
        self.std_dev / self.nominal.abs()
    }
}

impl From<(f64, f64)> for UncertainValue {
    fn from((nominal, std_dev): (f64, f64)) -> Self {
        Self::new(nominal, std_dev)
    }
}

impl fmt::Display for UncertainValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ± {}",
            format_significant(self.nominal, 4),
            format_significant(self.std_dev, 2)
        )
    }
}

/// Nominal values of a parameter list, in order.
pub fn nominal_values(values: &[UncertainValue]) -> Vec<f64> {
    values.iter().map(UncertainValue::nominal_value).collect()
}

/// Standard deviations of a parameter list, in order.
pub fn std_devs(values: &[UncertainValue]) -> Vec<f64> {
    values.iter().map(UncertainValue::std_dev).collect()
}

/// Format a number with `digits` significant digits, `%g` style.
///
/// Trailing zeros are dropped and scientific notation is used for very
/// large or very small magnitudes.
pub(crate) fn format_significant(value: f64, digits: usize) -> String {
    if value.is_nan() {
        return "nan".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "inf" } else { "-inf" }.to_string();
    }
    if value == 0.0 {
        return "0".to_string();
    }

    let digits = digits.max(1);
    let scientific = format!("{:.*e}", digits - 1, value);
    let (mantissa, exponent) = match scientific.split_once('e') {
        Some(parts) => parts,
        None => return scientific,
    };
    let exponent: i32 = exponent.parse().unwrap_or(0);

    if exponent < -4 || exponent >= digits as i32 {
        let sign = if exponent < 0 { '-' } else { '+' };
        format!("{}e{}{:02}", trim_zeros(mantissa), sign, exponent.abs())
    } else {
        let decimals = (digits as i32 - 1 - exponent).max(0) as usize;
        trim_zeros(&format!("{:.*}", decimals, value)).to_string()
    }
}

fn trim_zeros(number: &str) -> &str {
    if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    }
}
