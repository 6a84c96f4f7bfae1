//! The module responsible for writing output data to disk.
use crate::calibration::CalibrationResult;
use crate::cashflow::LedgerRow;
use crate::tes::CostSummary;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::fs::File;
use std::path::{Path, PathBuf};

/// The root folder in which scenario-specific output folders will be created
const OUTPUT_DIRECTORY_ROOT: &str = "tescost_results";

/// The output file name for cost metrics
pub const COSTS_FILE_NAME: &str = "costs.csv";

/// The output file name for the cash-flow ledger
pub const CASH_FLOW_FILE_NAME: &str = "cash_flow.csv";

/// The output file name for calibrated prices
pub const CALIBRATION_FILE_NAME: &str = "calibration.csv";

/// Get the default output directory for the scenario at the specified path
pub fn get_output_dir(model_dir: &Path) -> Result<PathBuf> {
    // Get the scenario name from the dir path. Canonicalise in case the user has specified "."
    let model_dir = model_dir
        .canonicalize()
        .context("Could not resolve path to model")?;

    let model_name = model_dir
        .file_name()
        .context("Model cannot be in root folder")?
        .to_str()
        .context("Invalid chars in model dir name")?;

    // Construct path
    Ok([OUTPUT_DIRECTORY_ROOT, model_name].iter().collect())
}

/// Create a new output directory, with parents.
///
/// An existing directory which contains files is only reused if `allow_overwrite` is true, in
/// which case it is emptied first.
///
/// # Returns
///
/// True if an existing directory is being overwritten
pub fn create_output_directory(output_dir: &Path, allow_overwrite: bool) -> Result<bool> {
    let overwrite = if let Ok(mut it) = fs::read_dir(output_dir) {
        if it.next().is_none() {
            // Folder exists and is empty: nothing to do
            return Ok(false);
        }

        anyhow::ensure!(
            allow_overwrite,
            "Output folder already exists and is not empty. Use --overwrite to replace it."
        );

        fs::remove_dir_all(output_dir)?;
        true
    } else {
        false
    };

    fs::create_dir_all(output_dir)?;

    Ok(overwrite)
}

/// Represents a row in the cost metrics CSV file
#[derive(Serialize, Deserialize, Debug, PartialEq)]
struct CostRow {
    metric: String,
    value: Option<f64>,
    unit: String,
    error: String,
}

/// An object for writing results to CSV files
pub struct DataWriter {
    output_path: PathBuf,
}

impl DataWriter {
    /// Create a writer for the specified folder
    ///
    /// # Arguments
    ///
    /// * `output_path` - Folder where files will be saved
    pub fn new(output_path: &Path) -> Self {
        Self {
            output_path: output_path.to_path_buf(),
        }
    }

    /// Open a new CSV file in the output folder
    fn new_writer(&self, file_name: &str) -> Result<csv::Writer<File>> {
        let file_path = self.output_path.join(file_name);
        csv::Writer::from_path(&file_path)
            .with_context(|| format!("Could not create {}", file_path.display()))
    }

    /// Write every cost metric, with the error message for any which could not be calculated
    pub fn write_costs(&self, summary: &CostSummary) -> Result<()> {
        let mut writer = self.new_writer(COSTS_FILE_NAME)?;
        for metric in &summary.metrics {
            let row = match &metric.result {
                Ok((value, unit)) => CostRow {
                    metric: metric.name.clone(),
                    value: Some(*value),
                    unit: (*unit).to_string(),
                    error: String::new(),
                },
                Err(err) => CostRow {
                    metric: metric.name.clone(),
                    value: None,
                    unit: String::new(),
                    error: err.to_string(),
                },
            };
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the cash-flow ledger
    pub fn write_cash_flow(&self, rows: &[LedgerRow]) -> Result<()> {
        let mut writer = self.new_writer(CASH_FLOW_FILE_NAME)?;
        for row in rows {
            writer.serialize(row)?;
        }
        writer.flush()?;

        Ok(())
    }

    /// Write the calibrated prices
    pub fn write_calibration(&self, result: &CalibrationResult) -> Result<()> {
        let mut writer = self.new_writer(CALIBRATION_FILE_NAME)?;
        writer.serialize(result)?;
        writer.flush()?;

        Ok(())
    }
}
