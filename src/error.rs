//! Errors returned by the costing formulas and the cash-flow ledger.
use crate::parameters::Parameter;
use itertools::Itertools;
use thiserror::Error;

/// A failure to evaluate a cost metric or build a ledger.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CostError {
    /// One or more parameters needed by the calculation have not been set
    #[error("Missing parameters: {}", format_missing(.0))]
    MissingParameters(Vec<Parameter>),
    /// A per-year input series has fewer values than the number of years analysed
    #[error("Insufficient data for {series}: {len} values provided for {years} years")]
    InsufficientData {
        /// Name of the series
        series: String,
        /// Number of values provided
        len: usize,
        /// Number of years in the analysis horizon
        years: u32,
    },
    /// The inputs lead to a zero denominator or a non-finite result
    #[error("Degenerate valuation: {0}")]
    DegenerateValuation(String),
    /// A cost in one unit family was requested where another is needed
    #[error("Unit mismatch: {0}")]
    UnitMismatch(String),
    /// A parameter was given an invalid value or an unknown name
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// Format a list of missing parameters as `name (unit)` pairs
fn format_missing(params: &[Parameter]) -> String {
    params
        .iter()
        .map(|param| match param.unit() {
            "" => param.to_string(),
            unit => format!("{param} ({unit})"),
        })
        .join(", ")
}

/// Convenience alias for results of costing calculations
pub type CostResult<T> = Result<T, CostError>;

/// Return a [`CostError::DegenerateValuation`] error unless `value` is finite
pub fn ensure_finite(value: f64, what: &str) -> CostResult<f64> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(CostError::DegenerateValuation(format!(
            "{what} is not finite"
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_parameters_message() {
        let err = CostError::MissingParameters(vec![
            Parameter::DensityTesMaterial,
            Parameter::TesEfficiency,
        ]);
        assert_eq!(
            err.to_string(),
            "Missing parameters: density_tes_material (kg/m³), tes_efficiency"
        );
    }

    #[test]
    fn test_insufficient_data_message() {
        let err = CostError::InsufficientData {
            series: "energy_price".into(),
            len: 2,
            years: 5,
        };
        assert_eq!(
            err.to_string(),
            "Insufficient data for energy_price: 2 values provided for 5 years"
        );
    }

    #[test]
    fn test_ensure_finite() {
        assert_eq!(ensure_finite(1.0, "x"), Ok(1.0));
        assert_eq!(
            ensure_finite(f64::NAN, "LCOS"),
            Err(CostError::DegenerateValuation("LCOS is not finite".into()))
        );
    }
}
