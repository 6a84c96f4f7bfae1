//! Functionality for evaluating a scenario and writing the results.
use crate::calibration::calibrate_prices;
use crate::cashflow::build_ledger;
use crate::input::Scenario;
use crate::output::DataWriter;
use anyhow::{Context, Result};
use log::{info, warn};
use std::path::Path;

/// Evaluate the costs of a scenario.
///
/// Cost metrics are always written. The cash-flow ledger and the calibrated prices are written if
/// the scenario asks for them.
///
/// # Arguments:
///
/// * `scenario` - The scenario to evaluate
/// * `output_path` - The folder to which output files will be written
pub fn run(scenario: &Scenario, output_path: &Path) -> Result<()> {
    let writer = DataWriter::new(output_path);
    if let Some(description) = &scenario.description {
        info!("Scenario: {description}");
    }
    for line in scenario.model.to_string().lines() {
        info!("{line}");
    }

    let summary = scenario.model.summary(scenario.lcos_method);
    for metric in &summary.metrics {
        match &metric.result {
            Ok((value, unit)) => info!("{}: {value} {unit}", metric.name),
            Err(err) => warn!("Could not calculate {}: {err}", metric.name),
        }
    }
    writer.write_costs(&summary)?;

    if let Some(inputs) = &scenario.cash_flow {
        let rows = build_ledger(inputs).context("Failed to build cash-flow ledger.")?;
        if let Some(last) = rows.last() {
            match last.irr {
                Some(irr) => info!("NPV after {} years: {} (IRR {irr})", last.year, last.npv),
                None => info!("NPV after {} years: {} (IRR undefined)", last.year, last.npv),
            }
        }
        writer.write_cash_flow(&rows)?;
    }

    if let Some(task) = &scenario.calibration {
        let result = calibrate_prices(&scenario.model, task.target, &task.options)
            .context("Failed to calibrate prices.")?;
        if result.skipped > 0 {
            warn!("{} price pairs could not be evaluated", result.skipped);
        }
        writer.write_calibration(&result)?;
    }

    Ok(())
}
