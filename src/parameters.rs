//! Optional parameters of a thermal energy storage cost model.
//!
//! Each costing method needs a different subset of parameters. The full schema is described by
//! [`Parameter`] and the values are held in [`ExtendedParameters`]. A costing method declares the
//! parameters it needs and fetches them with [`ExtendedParameters::values`], which fails with the
//! complete list of missing parameters if any are unset.
use crate::error::{CostError, CostResult};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// The name of an optional cost model parameter
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, EnumIter)]
#[strum(serialize_all = "snake_case")]
pub enum Parameter {
    DensityTesMaterial,
    VolumeTesMaterial,
    SpecificHeatTesMaterial,
    TemperatureDifference,
    TesEfficiency,
    KMctigue,
    FinalPressure,
    TemporalAdjustmentIndex,
    InstallationPercentage,
    DeltaPressureCharge,
    DeltaPressureDischarge,
    MassFlowRateCharge,
    MassFlowRateDischarge,
    WorkingFluidDensity,
    ChargingTime,
    DischargingTime,
    CyclesPerYear,
    ServiceYears,
    ElectricityCostPerJoule,
    FanEfficiency,
    CapexMaintenancePercentage,
    AnnualDiscountRate,
    TesEnergyCapacity,
}

impl Parameter {
    /// The unit in which the parameter is expressed (empty if dimensionless)
    pub fn unit(self) -> &'static str {
        match self {
            Self::DensityTesMaterial | Self::WorkingFluidDensity => "kg/m³",
            Self::VolumeTesMaterial => "m³",
            Self::SpecificHeatTesMaterial => "kJ/(kg·K)",
            Self::TemperatureDifference => "K",
            Self::FinalPressure | Self::DeltaPressureCharge | Self::DeltaPressureDischarge => "Pa",
            Self::MassFlowRateCharge | Self::MassFlowRateDischarge => "kg/s",
            Self::ChargingTime | Self::DischargingTime => "hours",
            Self::ElectricityCostPerJoule => "$/J",
            Self::TesEnergyCapacity => "kWh",
            Self::TesEfficiency
            | Self::KMctigue
            | Self::TemporalAdjustmentIndex
            | Self::InstallationPercentage
            | Self::CyclesPerYear
            | Self::ServiceYears
            | Self::FanEfficiency
            | Self::CapexMaintenancePercentage
            | Self::AnnualDiscountRate => "",
        }
    }

    /// Check that `value` is acceptable for this parameter
    fn validate(self, value: f64) -> CostResult<()> {
        let ok = value.is_finite()
            && match self {
                Self::TesEfficiency | Self::FanEfficiency => (0.0..=1.0).contains(&value),
                Self::AnnualDiscountRate => value > -1.0,
                Self::ServiceYears => {
                    value >= 0.0 && value.fract() == 0.0 && value <= f64::from(u32::MAX)
                }
                _ => value >= 0.0,
            };

        if ok {
            Ok(())
        } else {
            Err(CostError::InvalidParameter(format!(
                "{value} is not a valid value for {self}"
            )))
        }
    }
}

/// Values for the optional cost model parameters.
///
/// Unset parameters are `None`. Values can be set individually with [`ExtendedParameters::set`]
/// or read from a scenario file.
#[allow(missing_docs)]
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExtendedParameters {
    pub density_tes_material: Option<f64>,
    pub volume_tes_material: Option<f64>,
    pub specific_heat_tes_material: Option<f64>,
    pub temperature_difference: Option<f64>,
    pub tes_efficiency: Option<f64>,
    pub k_mctigue: Option<f64>,
    pub final_pressure: Option<f64>,
    pub temporal_adjustment_index: Option<f64>,
    pub installation_percentage: Option<f64>,
    pub delta_pressure_charge: Option<f64>,
    pub delta_pressure_discharge: Option<f64>,
    pub mass_flow_rate_charge: Option<f64>,
    pub mass_flow_rate_discharge: Option<f64>,
    pub working_fluid_density: Option<f64>,
    pub charging_time: Option<f64>,
    pub discharging_time: Option<f64>,
    pub cycles_per_year: Option<f64>,
    pub service_years: Option<u32>,
    pub electricity_cost_per_joule: Option<f64>,
    pub fan_efficiency: Option<f64>,
    pub capex_maintenance_percentage: Option<f64>,
    pub annual_discount_rate: Option<f64>,
    pub tes_energy_capacity: Option<f64>,
}

impl ExtendedParameters {
    /// Get the value of a parameter, if set
    pub fn get(&self, param: Parameter) -> Option<f64> {
        match param {
            Parameter::DensityTesMaterial => self.density_tes_material,
            Parameter::VolumeTesMaterial => self.volume_tes_material,
            Parameter::SpecificHeatTesMaterial => self.specific_heat_tes_material,
            Parameter::TemperatureDifference => self.temperature_difference,
            Parameter::TesEfficiency => self.tes_efficiency,
            Parameter::KMctigue => self.k_mctigue,
            Parameter::FinalPressure => self.final_pressure,
            Parameter::TemporalAdjustmentIndex => self.temporal_adjustment_index,
            Parameter::InstallationPercentage => self.installation_percentage,
            Parameter::DeltaPressureCharge => self.delta_pressure_charge,
            Parameter::DeltaPressureDischarge => self.delta_pressure_discharge,
            Parameter::MassFlowRateCharge => self.mass_flow_rate_charge,
            Parameter::MassFlowRateDischarge => self.mass_flow_rate_discharge,
            Parameter::WorkingFluidDensity => self.working_fluid_density,
            Parameter::ChargingTime => self.charging_time,
            Parameter::DischargingTime => self.discharging_time,
            Parameter::CyclesPerYear => self.cycles_per_year,
            Parameter::ServiceYears => self.service_years.map(f64::from),
            Parameter::ElectricityCostPerJoule => self.electricity_cost_per_joule,
            Parameter::FanEfficiency => self.fan_efficiency,
            Parameter::CapexMaintenancePercentage => self.capex_maintenance_percentage,
            Parameter::AnnualDiscountRate => self.annual_discount_rate,
            Parameter::TesEnergyCapacity => self.tes_energy_capacity,
        }
    }

    /// Set the value of a parameter, replacing any previous value.
    ///
    /// Fails if the value is out of range for the parameter (e.g. a negative volume, an
    /// efficiency above one or a fractional number of service years).
    pub fn set(&mut self, param: Parameter, value: f64) -> CostResult<()> {
        param.validate(value)?;

        let slot = match param {
            Parameter::ServiceYears => {
                // Validated above as a non-negative whole number within range
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                let years = value as u32;
                self.service_years = Some(years);
                return Ok(());
            }
            Parameter::DensityTesMaterial => &mut self.density_tes_material,
            Parameter::VolumeTesMaterial => &mut self.volume_tes_material,
            Parameter::SpecificHeatTesMaterial => &mut self.specific_heat_tes_material,
            Parameter::TemperatureDifference => &mut self.temperature_difference,
            Parameter::TesEfficiency => &mut self.tes_efficiency,
            Parameter::KMctigue => &mut self.k_mctigue,
            Parameter::FinalPressure => &mut self.final_pressure,
            Parameter::TemporalAdjustmentIndex => &mut self.temporal_adjustment_index,
            Parameter::InstallationPercentage => &mut self.installation_percentage,
            Parameter::DeltaPressureCharge => &mut self.delta_pressure_charge,
            Parameter::DeltaPressureDischarge => &mut self.delta_pressure_discharge,
            Parameter::MassFlowRateCharge => &mut self.mass_flow_rate_charge,
            Parameter::MassFlowRateDischarge => &mut self.mass_flow_rate_discharge,
            Parameter::WorkingFluidDensity => &mut self.working_fluid_density,
            Parameter::ChargingTime => &mut self.charging_time,
            Parameter::DischargingTime => &mut self.discharging_time,
            Parameter::CyclesPerYear => &mut self.cycles_per_year,
            Parameter::ElectricityCostPerJoule => &mut self.electricity_cost_per_joule,
            Parameter::FanEfficiency => &mut self.fan_efficiency,
            Parameter::CapexMaintenancePercentage => &mut self.capex_maintenance_percentage,
            Parameter::AnnualDiscountRate => &mut self.annual_discount_rate,
            Parameter::TesEnergyCapacity => &mut self.tes_energy_capacity,
        };
        *slot = Some(value);

        Ok(())
    }

    /// Set a parameter by its name (e.g. `"tes_efficiency"`)
    pub fn set_by_name(&mut self, name: &str, value: f64) -> CostResult<()> {
        let param = Parameter::from_str(name)
            .map_err(|_| CostError::InvalidParameter(format!("Unknown parameter: {name}")))?;
        self.set(param, value)
    }

    /// Check every parameter which has been set has a valid value.
    ///
    /// Values set with [`ExtendedParameters::set`] are always valid, but values deserialised
    /// from a file have not been checked.
    pub fn validate(&self) -> CostResult<()> {
        for param in Parameter::iter() {
            if let Some(value) = self.get(param) {
                param.validate(value)?;
            }
        }

        Ok(())
    }

    /// Get the parameters in `required` which have not been set, in the order given
    pub fn missing(&self, required: &[Parameter]) -> Vec<Parameter> {
        required
            .iter()
            .copied()
            .filter(|param| self.get(*param).is_none())
            .collect()
    }

    /// Get the values of all the parameters in `required`.
    ///
    /// # Returns
    ///
    /// The values in the same order as `required`, or a [`CostError::MissingParameters`] error
    /// listing every parameter which has not been set.
    pub fn values<const N: usize>(&self, required: [Parameter; N]) -> CostResult<[f64; N]> {
        let missing = self.missing(&required);
        if !missing.is_empty() {
            return Err(CostError::MissingParameters(missing));
        }

        Ok(required.map(|param| self.get(param).unwrap_or_default()))
    }

    /// Iterate over the parameters which have been set, with their values
    pub fn iter_set(&self) -> impl Iterator<Item = (Parameter, f64)> + '_ {
        Parameter::iter().filter_map(|param| self.get(param).map(|value| (param, value)))
    }
}
