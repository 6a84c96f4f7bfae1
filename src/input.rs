//! Common routines for handling input data.
//!
//! A scenario lives in its own directory and is described by a single `scenario.toml` file with
//! sections for the tank, its components, the optional cost parameters and, optionally, a
//! cash-flow analysis and a price calibration.
use crate::calibration::{CalibrationOptions, DEFAULT_SAMPLES, PriceBounds};
use crate::cashflow::{CashFlowInputs, Series};
use crate::geometry::CylindricalTank;
use crate::parameters::ExtendedParameters;
use crate::tes::{CapexMethod, Component, TesCostModel};
use crate::units::{Money, MoneyPerVolume, Volume};
use anyhow::{Context, Result, bail, ensure};
use serde::Deserialize;
use serde::de::{DeserializeOwned, Deserializer};
use std::fs;
use std::path::Path;

/// The name of the scenario file in a model directory
pub const SCENARIO_FILE_NAME: &str = "scenario.toml";

/// Format an error message to include the file path
pub fn input_err_msg<P: AsRef<Path>>(file_path: P) -> String {
    format!("Error reading {}", file_path.as_ref().display())
}

/// Parse a TOML file at the specified path.
///
/// # Arguments
///
/// * `file_path` - Path to the TOML file
///
/// # Returns
///
/// * The deserialised TOML data or an error if the file could not be read or parsed.
pub fn read_toml<T: DeserializeOwned>(file_path: &Path) -> Result<T> {
    let toml_str = fs::read_to_string(file_path).with_context(|| input_err_msg(file_path))?;
    let toml_data = toml::from_str(&toml_str).with_context(|| input_err_msg(file_path))?;
    Ok(toml_data)
}

/// Read an f64, checking that it is between 0 and 1
pub fn deserialise_proportion<'de, D>(deserialiser: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = f64::deserialize(deserialiser)?;
    if !(0.0..=1.0).contains(&value) {
        Err(serde::de::Error::custom("Value is not between 0 and 1"))?;
    }

    Ok(value)
}

fn default_lcos_method() -> CapexMethod {
    CapexMethod::Pereira
}

/// The tank section of a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct TankSection {
    iron_volume: Option<f64>,
    insulation_volume: Option<f64>,
    geometry: Option<CylindricalTank>,
    price_per_cubic_meter_iron: f64,
    price_per_cubic_meter_insulation: f64,
}

impl TankSection {
    /// Get the steel and insulation volumes, either given directly or from the geometry
    fn volumes(&self) -> Result<(Volume, Volume)> {
        match (self.geometry, self.iron_volume, self.insulation_volume) {
            (Some(geometry), None, None) => {
                geometry.validate()?;
                Ok((geometry.steel_volume(), geometry.insulation_volume()))
            }
            (Some(_), _, _) => bail!("Tank volumes cannot be given along with a geometry"),
            (None, Some(iron), Some(insulation)) => Ok((Volume(iron), Volume(insulation))),
            (None, _, _) => {
                bail!("Tank must have either a geometry or both iron_volume and insulation_volume")
            }
        }
    }
}

/// A reference to the capital cost calculated by the model
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum CapexLink {
    Capex,
}

/// A reference to the operating cost calculated by the model
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
enum OpexLink {
    Opex,
}

/// The initial investment: a fixed amount or the model's CAPEX
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum InvestmentInput {
    Value(f64),
    Capex(CapexLink),
}

impl Default for InvestmentInput {
    fn default() -> Self {
        Self::Value(0.0)
    }
}

/// O&M costs: a series or the model's OPEX every year
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum OmCostsInput {
    Series(Series),
    Opex(OpexLink),
}

impl Default for OmCostsInput {
    fn default() -> Self {
        Self::Series(Series::default())
    }
}

/// A reference to the volume of storage medium in a tank with a geometry
#[derive(Debug, Clone, Copy, Deserialize, PartialEq)]
#[serde(rename_all = "snake_case")]
enum MediumVolumeLink {
    MediumVolume,
}

/// The quantity of a component: a number of units or the tank's medium volume in m³
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(untagged)]
enum QuantityInput {
    Value(f64),
    MediumVolume(MediumVolumeLink),
}

/// A component in a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ComponentSection {
    name: String,
    unit_price: f64,
    quantity: QuantityInput,
}

impl ComponentSection {
    /// Resolve the quantity to give a [`Component`]
    fn into_component(self, geometry: Option<&CylindricalTank>) -> Result<Component> {
        let quantity = match self.quantity {
            QuantityInput::Value(quantity) => quantity,
            QuantityInput::MediumVolume(_) => geometry
                .with_context(|| {
                    format!(
                        "Component {} uses the medium volume, but the tank has no geometry",
                        self.name
                    )
                })?
                .medium_volume()
                .value(),
        };

        Ok(Component::new(&self.name, self.unit_price, quantity))
    }
}

/// The cash-flow section of a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct CashFlowSection {
    years: u32,
    energy_price: Series,
    annual_production: Series,
    #[serde(default)]
    subsidies: Series,
    #[serde(default)]
    om_costs: OmCostsInput,
    #[serde(default)]
    fuel_costs: Series,
    #[serde(default)]
    capital_costs: Series,
    #[serde(default)]
    insurance_costs: Series,
    #[serde(default)]
    other_costs: Series,
    #[serde(default)]
    initial_investment: InvestmentInput,
    #[serde(default, deserialize_with = "deserialise_proportion")]
    tax_rate: f64,
    discount_rate: Option<f64>,
}

/// The calibration section of a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct CalibrationSection {
    target_capex: f64,
    iron_price: PriceBounds,
    insulation_price: PriceBounds,
    samples: Option<usize>,
    method: Option<CapexMethod>,
}

/// The contents of a scenario file
#[derive(Debug, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
struct ScenarioFile {
    description: Option<String>,
    #[serde(default = "default_lcos_method")]
    lcos_method: CapexMethod,
    tank: TankSection,
    #[serde(default)]
    components: Vec<ComponentSection>,
    #[serde(default)]
    parameters: ExtendedParameters,
    cash_flow: Option<CashFlowSection>,
    calibration: Option<CalibrationSection>,
}

/// A price calibration to perform for a scenario
#[derive(Debug, Clone, PartialEq)]
pub struct CalibrationTask {
    /// The CAPEX to reproduce
    pub target: Money,
    /// Grid search options
    pub options: CalibrationOptions,
}

/// A fully loaded and checked scenario
#[derive(Debug, Clone, PartialEq)]
pub struct Scenario {
    /// Free-text description of the scenario
    pub description: Option<String>,
    /// The cost model
    pub model: TesCostModel,
    /// The CAPEX method used for LCOS and linked cash-flow inputs
    pub lcos_method: CapexMethod,
    /// Inputs for the cash-flow ledger, if requested
    pub cash_flow: Option<CashFlowInputs>,
    /// A price calibration, if requested
    pub calibration: Option<CalibrationTask>,
}

/// Load a scenario from the specified model directory.
///
/// # Arguments
///
/// * `model_dir` - Folder containing `scenario.toml`
///
/// # Returns
///
/// The scenario or an error if the file is missing or invalid.
pub fn load_scenario(model_dir: &Path) -> Result<Scenario> {
    let file_path = model_dir.join(SCENARIO_FILE_NAME);
    let file: ScenarioFile = read_toml(&file_path)?;
    build_scenario(file).with_context(|| input_err_msg(&file_path))
}

/// Check the contents of a scenario file and assemble the scenario
fn build_scenario(file: ScenarioFile) -> Result<Scenario> {
    ensure!(
        file.lcos_method.is_absolute(),
        "lcos_method must give an absolute cost, not {}",
        file.lcos_method
    );

    let (iron_volume, insulation_volume) = file.tank.volumes()?;
    let components = file
        .components
        .into_iter()
        .map(|component| component.into_component(file.tank.geometry.as_ref()))
        .collect::<Result<Vec<_>>>()?;
    let model = TesCostModel::new(
        iron_volume,
        insulation_volume,
        MoneyPerVolume(file.tank.price_per_cubic_meter_iron),
        MoneyPerVolume(file.tank.price_per_cubic_meter_insulation),
        components,
    )?
    .with_parameters(file.parameters)?;

    let cash_flow = file
        .cash_flow
        .map(|section| cash_flow_inputs(section, &model, file.lcos_method))
        .transpose()
        .context("Invalid cash_flow section")?;

    let calibration = file.calibration.map(|section| CalibrationTask {
        target: Money(section.target_capex),
        options: CalibrationOptions {
            iron_price: section.iron_price,
            insulation_price: section.insulation_price,
            samples: section.samples.unwrap_or(DEFAULT_SAMPLES),
            method: section.method.unwrap_or(file.lcos_method),
        },
    });
    if let Some(task) = &calibration {
        task.options
            .validate()
            .context("Invalid calibration section")?;
    }

    Ok(Scenario {
        description: file.description,
        model,
        lcos_method: file.lcos_method,
        cash_flow,
        calibration,
    })
}

/// Convert the cash-flow section into ledger inputs, resolving links to the model's costs
fn cash_flow_inputs(
    section: CashFlowSection,
    model: &TesCostModel,
    capex_method: CapexMethod,
) -> Result<CashFlowInputs> {
    let initial_investment = match section.initial_investment {
        InvestmentInput::Value(value) => value,
        InvestmentInput::Capex(_) => model
            .capex_total(capex_method)
            .context("Could not calculate CAPEX for initial_investment")?
            .value(),
    };
    let om_costs = match section.om_costs {
        OmCostsInput::Series(series) => series,
        OmCostsInput::Opex(_) => Series::Scalar(
            model
                .opex()
                .context("Could not calculate OPEX for om_costs")?
                .value(),
        ),
    };
    let discount_rate = match section.discount_rate {
        Some(rate) => rate,
        None => model
            .parameters()
            .annual_discount_rate
            .context("discount_rate must be given if annual_discount_rate is not set")?,
    };

    Ok(CashFlowInputs {
        years: section.years,
        energy_price: section.energy_price,
        annual_production: section.annual_production,
        subsidies: section.subsidies,
        om_costs,
        fuel_costs: section.fuel_costs,
        capital_costs: section.capital_costs,
        insurance_costs: section.insurance_costs,
        other_costs: section.other_costs,
        initial_investment,
        tax_rate: section.tax_rate,
        discount_rate,
    })
}
