//! Calibration of material prices against known capital costs.
//!
//! The unit prices of steel and insulation are often unknown, while the total CAPEX of one or
//! more comparable tanks is. The functions here search a regular grid of candidate price pairs
//! for the pair that best reproduces the known costs.
use crate::error::{CostError, CostResult};
use crate::tes::{CapexMethod, TesCostModel};
use crate::units::{Money, MoneyPerVolume};
use log::{debug, info};
use serde::{Deserialize, Serialize};

/// The default number of samples along each price axis
pub const DEFAULT_SAMPLES: usize = 1000;

fn default_samples() -> usize {
    DEFAULT_SAMPLES
}

fn default_method() -> CapexMethod {
    CapexMethod::Pereira
}

/// Inclusive bounds on a price
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PriceBounds {
    /// Lowest price to try
    pub lo: f64,
    /// Highest price to try
    pub hi: f64,
}

impl PriceBounds {
    fn validate(&self, name: &str) -> CostResult<()> {
        if self.lo.is_finite() && self.hi.is_finite() && 0.0 <= self.lo && self.lo <= self.hi {
            Ok(())
        } else {
            Err(CostError::InvalidParameter(format!(
                "Bounds for {name} must satisfy 0 <= lo <= hi, got [{}, {}]",
                self.lo, self.hi
            )))
        }
    }
}

/// Options for the price grid search
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CalibrationOptions {
    /// Bounds on the price of steel
    pub iron_price: PriceBounds,
    /// Bounds on the price of insulation
    pub insulation_price: PriceBounds,
    /// Number of samples along each axis
    #[serde(default = "default_samples")]
    pub samples: usize,
    /// The CAPEX method to calibrate
    #[serde(default = "default_method")]
    pub method: CapexMethod,
}

impl CalibrationOptions {
    /// Check the bounds, sample count and method are usable
    pub fn validate(&self) -> CostResult<()> {
        self.iron_price.validate("iron price")?;
        self.insulation_price.validate("insulation price")?;
        if self.samples == 0 {
            return Err(CostError::InvalidParameter(
                "Calibration needs at least one sample per axis".into(),
            ));
        }
        if !self.method.is_absolute() {
            return Err(CostError::UnitMismatch(format!(
                "Cannot calibrate against the {} method, which gives a cost per unit capacity",
                self.method
            )));
        }

        Ok(())
    }
}

/// The best price pair found by a grid search
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CalibrationResult {
    /// Price of steel
    pub price_per_cubic_meter_iron: f64,
    /// Price of insulation
    pub price_per_cubic_meter_insulation: f64,
    /// The value of the objective at the best point
    pub residual: f64,
    /// Number of grid cells which could not be evaluated
    pub skipped: usize,
}

/// `n` evenly spaced values from `lo` to `hi` inclusive (just `lo` if `n` is one)
pub fn linspace(lo: f64, hi: f64, n: usize) -> impl Iterator<Item = f64> {
    let last = n.saturating_sub(1).max(1) as f64;
    (0..n).map(move |k| lo + (hi - lo) * (k as f64) / last)
}

/// Find the prices for which a model's CAPEX is closest to `target`.
///
/// The residual is the absolute difference between the calculated and target CAPEX. The model
/// itself is not modified.
pub fn calibrate_prices(
    model: &TesCostModel,
    target: Money,
    options: &CalibrationOptions,
) -> CostResult<CalibrationResult> {
    options.validate()?;
    let mut trial = model.clone();
    let result = grid_search(options, |iron, insulation| {
        let capex = capex_at(&mut trial, iron, insulation, options.method)?;
        Ok((capex - target).value().abs())
    })?;
    info!(
        "Calibrated prices: iron {} $/m³, insulation {} $/m³ (residual {})",
        result.price_per_cubic_meter_iron, result.price_per_cubic_meter_insulation, result.residual
    );

    Ok(result)
}

/// Find the common prices which best reproduce the CAPEX of several models.
///
/// The residual is the sum of the squared differences between the calculated and target CAPEX
/// for each model.
pub fn calibrate_prices_multi(
    targets: &[(TesCostModel, Money)],
    options: &CalibrationOptions,
) -> CostResult<CalibrationResult> {
    options.validate()?;
    if targets.is_empty() {
        return Err(CostError::InvalidParameter(
            "At least one calibration target is required".into(),
        ));
    }

    let mut trials: Vec<_> = targets
        .iter()
        .map(|(model, target)| (model.clone(), *target))
        .collect();
    let result = grid_search(options, |iron, insulation| {
        let mut sum = 0.0;
        for (trial, target) in &mut trials {
            let error = (capex_at(trial, iron, insulation, options.method)? - *target).value();
            sum += error * error;
        }
        Ok(sum)
    })?;
    info!(
        "Calibrated prices over {} models: iron {} $/m³, insulation {} $/m³ (residual {})",
        targets.len(),
        result.price_per_cubic_meter_iron,
        result.price_per_cubic_meter_insulation,
        result.residual
    );

    Ok(result)
}

/// Set the prices on a trial model and evaluate its CAPEX
fn capex_at(
    trial: &mut TesCostModel,
    iron: f64,
    insulation: f64,
    method: CapexMethod,
) -> CostResult<Money> {
    trial.set_price_per_cubic_meter_iron(MoneyPerVolume(iron))?;
    trial.set_price_per_cubic_meter_insulation(MoneyPerVolume(insulation))?;
    trial.capex_total(method)
}

/// Evaluate `objective` over the price grid and return the minimum.
///
/// Cells which fail to evaluate are skipped. If no cell can be evaluated, the first error is
/// returned.
fn grid_search<F>(options: &CalibrationOptions, mut objective: F) -> CostResult<CalibrationResult>
where
    F: FnMut(f64, f64) -> CostResult<f64>,
{
    let mut best: Option<CalibrationResult> = None;
    let mut first_error = None;
    let mut skipped = 0;

    let iron_prices = linspace(options.iron_price.lo, options.iron_price.hi, options.samples);
    for iron in iron_prices {
        let insulation_prices = linspace(
            options.insulation_price.lo,
            options.insulation_price.hi,
            options.samples,
        );
        for insulation in insulation_prices {
            let residual = match objective(iron, insulation) {
                Ok(residual) if residual.is_finite() => residual,
                Ok(residual) => {
                    debug!("Skipping prices ({iron}, {insulation}): residual is {residual}");
                    skipped += 1;
                    continue;
                }
                Err(err) => {
                    debug!("Skipping prices ({iron}, {insulation}): {err}");
                    skipped += 1;
                    first_error.get_or_insert(err);
                    continue;
                }
            };

            if best.is_none_or(|best| residual < best.residual) {
                best = Some(CalibrationResult {
                    price_per_cubic_meter_iron: iron,
                    price_per_cubic_meter_insulation: insulation,
                    residual,
                    skipped: 0,
                });
            }
        }
    }

    match best {
        Some(best) => Ok(CalibrationResult { skipped, ..best }),
        None => Err(first_error.unwrap_or_else(|| {
            CostError::DegenerateValuation("No price pair could be evaluated".into())
        })),
    }
}
