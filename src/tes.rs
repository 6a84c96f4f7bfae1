//! The cost model for a thermal energy storage (TES) system.
//!
//! A [`TesCostModel`] holds the physical and economic description of a single storage system and
//! evaluates five alternative CAPEX formulas, the annual OPEX and the levelised cost of storage
//! (LCOS). Costing methods never modify the model, so the same model can be re-evaluated any
//! number of times, e.g. while calibrating prices.
//!
//! Note that the Kocher method returns a cost per unit of effective thermal capacity rather than
//! an absolute cost. It therefore has its own return type and is rejected wherever an absolute
//! CAPEX is required.
use crate::error::{CostError, CostResult, ensure_finite};
use crate::finance::{annual_capital_cost, present_value};
use crate::parameters::{ExtendedParameters, Parameter};
use crate::units::{
    Dimensionless, Energy, EnergyPerVolume, Money, MoneyPerEnergy, MoneyPerVolume, MoneyPerYear,
    Volume,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fmt;
use strum::{Display, EnumIter, EnumString, IntoEnumIterator};

/// Converts a volumetric heat capacity in kJ/m³ into kWh/m³
const SECONDS_PER_HOUR: f64 = 3600.0;

/// Parameters needed by the OPEX calculation
const OPEX_PARAMETERS: [Parameter; 12] = [
    Parameter::DeltaPressureCharge,
    Parameter::DeltaPressureDischarge,
    Parameter::MassFlowRateCharge,
    Parameter::MassFlowRateDischarge,
    Parameter::WorkingFluidDensity,
    Parameter::ChargingTime,
    Parameter::DischargingTime,
    Parameter::CyclesPerYear,
    Parameter::ServiceYears,
    Parameter::ElectricityCostPerJoule,
    Parameter::FanEfficiency,
    Parameter::CapexMaintenancePercentage,
];

/// Parameters needed by the LCOS calculation, in addition to those for OPEX and CAPEX
const LCOS_PARAMETERS: [Parameter; 3] = [
    Parameter::AnnualDiscountRate,
    Parameter::TesEnergyCapacity,
    Parameter::TesEfficiency,
];

/// A purchased item included in the capital cost (e.g. a pump or a quantity of storage fluid)
#[derive(Debug, Clone, PartialEq)]
pub struct Component {
    /// A human-readable name
    pub name: String,
    /// Price per unit
    pub unit_price: f64,
    /// Number of units (may be fractional, e.g. cubic metres of fluid)
    pub quantity: f64,
}

impl Component {
    /// Create a new [`Component`]
    pub fn new(name: &str, unit_price: f64, quantity: f64) -> Self {
        Self {
            name: name.to_string(),
            unit_price,
            quantity,
        }
    }

    /// Total cost of this component
    pub fn cost(&self) -> Money {
        Money(self.unit_price * self.quantity)
    }
}

/// A method for estimating capital expenditure
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CapexMethod {
    /// Material and component costs
    Knobloch,
    /// Material costs per unit of effective thermal capacity
    Kocher,
    /// Steel cost plus a pressure-dependent term
    McTigue,
    /// Material costs with time-adjusted insulation
    Trevisan,
    /// Time-adjusted material and component costs plus installation
    Pereira,
}

impl CapexMethod {
    /// Parameters which must be set to evaluate this method
    pub fn required_parameters(self) -> &'static [Parameter] {
        match self {
            Self::Knobloch => &[],
            Self::Kocher => &[
                Parameter::DensityTesMaterial,
                Parameter::VolumeTesMaterial,
                Parameter::SpecificHeatTesMaterial,
                Parameter::TemperatureDifference,
                Parameter::TesEfficiency,
            ],
            Self::McTigue => &[
                Parameter::KMctigue,
                Parameter::VolumeTesMaterial,
                Parameter::FinalPressure,
            ],
            Self::Trevisan => &[Parameter::TemporalAdjustmentIndex],
            Self::Pereira => &[
                Parameter::TemporalAdjustmentIndex,
                Parameter::InstallationPercentage,
            ],
        }
    }

    /// Whether this method gives an absolute cost (as opposed to a cost per unit capacity)
    pub fn is_absolute(self) -> bool {
        self != Self::Kocher
    }
}

/// The result of a CAPEX calculation, tagged by unit family
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Capex {
    /// An absolute capital cost
    Total(Money),
    /// A capital cost per unit of effective thermal capacity
    PerCapacity(MoneyPerEnergy),
}

impl Capex {
    /// The numeric value, whatever the unit
    pub fn value(self) -> f64 {
        match self {
            Self::Total(money) => money.value(),
            Self::PerCapacity(cost) => cost.value(),
        }
    }

    /// The unit symbol for the value
    pub fn unit(self) -> &'static str {
        match self {
            Self::Total(_) => Money::UNIT,
            Self::PerCapacity(_) => MoneyPerEnergy::UNIT,
        }
    }
}

/// Cost model for a single thermal energy storage system
#[derive(Debug, Clone, PartialEq)]
pub struct TesCostModel {
    iron_volume: Volume,
    insulation_volume: Volume,
    price_per_cubic_meter_iron: MoneyPerVolume,
    price_per_cubic_meter_insulation: MoneyPerVolume,
    components: Vec<Component>,
    parameters: ExtendedParameters,
}

/// Check that a mandatory model input is finite and non-negative
fn check_non_negative(name: &str, value: f64) -> CostResult<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(CostError::InvalidParameter(format!(
            "{name} must be a non-negative number, got {value}"
        )))
    }
}

impl TesCostModel {
    /// Create a new cost model with no optional parameters set.
    ///
    /// # Arguments
    ///
    /// * `iron_volume` - Volume of steel
    /// * `insulation_volume` - Volume of insulation
    /// * `price_per_cubic_meter_iron` - Price of steel
    /// * `price_per_cubic_meter_insulation` - Price of insulation
    /// * `components` - Additional purchased components
    pub fn new(
        iron_volume: Volume,
        insulation_volume: Volume,
        price_per_cubic_meter_iron: MoneyPerVolume,
        price_per_cubic_meter_insulation: MoneyPerVolume,
        components: Vec<Component>,
    ) -> CostResult<Self> {
        check_non_negative("iron_volume", iron_volume.value())?;
        check_non_negative("insulation_volume", insulation_volume.value())?;
        check_non_negative(
            "price_per_cubic_meter_iron",
            price_per_cubic_meter_iron.value(),
        )?;
        check_non_negative(
            "price_per_cubic_meter_insulation",
            price_per_cubic_meter_insulation.value(),
        )?;
        for component in &components {
            check_non_negative(&format!("{} unit_price", component.name), component.unit_price)?;
            check_non_negative(&format!("{} quantity", component.name), component.quantity)?;
        }

        Ok(Self {
            iron_volume,
            insulation_volume,
            price_per_cubic_meter_iron,
            price_per_cubic_meter_insulation,
            components,
            parameters: ExtendedParameters::default(),
        })
    }

    /// Volume of steel
    pub fn iron_volume(&self) -> Volume {
        self.iron_volume
    }

    /// Volume of insulation
    pub fn insulation_volume(&self) -> Volume {
        self.insulation_volume
    }

    /// Price of steel
    pub fn price_per_cubic_meter_iron(&self) -> MoneyPerVolume {
        self.price_per_cubic_meter_iron
    }

    /// Price of insulation
    pub fn price_per_cubic_meter_insulation(&self) -> MoneyPerVolume {
        self.price_per_cubic_meter_insulation
    }

    /// Additional purchased components
    pub fn components(&self) -> &[Component] {
        &self.components
    }

    /// The optional parameters
    pub fn parameters(&self) -> &ExtendedParameters {
        &self.parameters
    }

    /// Set the price of steel
    pub fn set_price_per_cubic_meter_iron(&mut self, price: MoneyPerVolume) -> CostResult<()> {
        check_non_negative("price_per_cubic_meter_iron", price.value())?;
        self.price_per_cubic_meter_iron = price;
        Ok(())
    }

    /// Set the price of insulation
    pub fn set_price_per_cubic_meter_insulation(
        &mut self,
        price: MoneyPerVolume,
    ) -> CostResult<()> {
        check_non_negative("price_per_cubic_meter_insulation", price.value())?;
        self.price_per_cubic_meter_insulation = price;
        Ok(())
    }

    /// Set a single optional parameter
    pub fn set_parameter(&mut self, param: Parameter, value: f64) -> CostResult<()> {
        self.parameters.set(param, value)
    }

    /// Set several optional parameters by name.
    ///
    /// Parameters are applied in order and the first invalid name or value aborts the update;
    /// parameters earlier in the list remain set.
    pub fn set_parameters<'a, I>(&mut self, params: I) -> CostResult<()>
    where
        I: IntoIterator<Item = (&'a str, f64)>,
    {
        for (name, value) in params {
            self.parameters.set_by_name(name, value)?;
        }

        Ok(())
    }

    /// Replace all of the optional parameters
    pub fn with_parameters(mut self, parameters: ExtendedParameters) -> CostResult<Self> {
        parameters.validate()?;
        self.parameters = parameters;
        Ok(self)
    }

    /// Get the parameters in `required` which have not been set
    pub fn check_parameters(&self, required: &[Parameter]) -> Vec<Parameter> {
        self.parameters.missing(required)
    }

    /// Cost of the steel shell
    pub fn iron_cost(&self) -> Money {
        self.iron_volume * self.price_per_cubic_meter_iron
    }

    /// Cost of the insulation
    pub fn insulation_cost(&self) -> Money {
        self.insulation_volume * self.price_per_cubic_meter_insulation
    }

    /// Total cost of the additional components
    pub fn components_cost(&self) -> Money {
        self.components.iter().map(Component::cost).sum()
    }

    /// CAPEX as the sum of material and component costs (Knobloch)
    pub fn capex_knobloch(&self) -> Money {
        self.iron_cost() + self.insulation_cost() + self.components_cost()
    }

    /// Energy stored per unit volume of storage material for the configured temperature swing
    pub fn energy_storage_density(&self) -> CostResult<EnergyPerVolume> {
        let [density, specific_heat, temperature_difference] = self.parameters.values([
            Parameter::DensityTesMaterial,
            Parameter::SpecificHeatTesMaterial,
            Parameter::TemperatureDifference,
        ])?;

        Ok(EnergyPerVolume(
            density * specific_heat * temperature_difference / SECONDS_PER_HOUR,
        ))
    }

    /// CAPEX of steel and insulation per unit of effective thermal capacity (Kocher).
    ///
    /// Unlike the other methods, the result is a cost per kWh of capacity, not an absolute cost.
    pub fn capex_kocher(&self) -> CostResult<MoneyPerEnergy> {
        let [_, volume, _, _, efficiency] = self
            .parameters
            .values(Self::method_parameters::<5>(CapexMethod::Kocher))?;
        let capacity =
            Volume(volume) * self.energy_storage_density()? * Dimensionless(efficiency);
        if capacity.value() == 0.0 {
            return Err(CostError::DegenerateValuation(
                "Effective thermal capacity is zero".into(),
            ));
        }

        let capex = (self.iron_cost() + self.insulation_cost()) / capacity;
        ensure_finite(capex.value(), "Kocher CAPEX")?;
        Ok(capex)
    }

    /// CAPEX as steel cost plus a pressure-dependent term (McTigue)
    pub fn capex_mctigue(&self) -> CostResult<Money> {
        let [k_mctigue, volume, final_pressure] = self
            .parameters
            .values(Self::method_parameters::<3>(CapexMethod::McTigue))?;

        Ok(self.iron_cost() + Money(k_mctigue * volume * final_pressure))
    }

    /// CAPEX with only the insulation cost adjusted for time (Trevisan)
    pub fn capex_trevisan(&self) -> CostResult<Money> {
        let [index] = self
            .parameters
            .values(Self::method_parameters::<1>(CapexMethod::Trevisan))?;

        Ok(self.iron_cost() + self.insulation_cost() * Dimensionless(index))
    }

    /// CAPEX with time-adjusted insulation, components and installation (Pereira)
    pub fn capex_pereira(&self) -> CostResult<Money> {
        let [index, installation] = self
            .parameters
            .values(Self::method_parameters::<2>(CapexMethod::Pereira))?;
        let base =
            self.iron_cost() + self.insulation_cost() * Dimensionless(index) + self.components_cost();

        Ok(base * Dimensionless(1.0 + installation))
    }

    /// Evaluate the CAPEX with the given method
    pub fn capex(&self, method: CapexMethod) -> CostResult<Capex> {
        Ok(match method {
            CapexMethod::Knobloch => Capex::Total(self.capex_knobloch()),
            CapexMethod::Kocher => Capex::PerCapacity(self.capex_kocher()?),
            CapexMethod::McTigue => Capex::Total(self.capex_mctigue()?),
            CapexMethod::Trevisan => Capex::Total(self.capex_trevisan()?),
            CapexMethod::Pereira => Capex::Total(self.capex_pereira()?),
        })
    }

    /// Evaluate the CAPEX with the given method, which must give an absolute cost
    pub fn capex_total(&self, method: CapexMethod) -> CostResult<Money> {
        match self.capex(method)? {
            Capex::Total(money) => Ok(money),
            Capex::PerCapacity(_) => Err(CostError::UnitMismatch(format!(
                "{method} CAPEX is a cost per unit capacity, not an absolute cost"
            ))),
        }
    }

    /// Annual operating cost: fan electricity for charging and discharging plus maintenance.
    ///
    /// The maintenance term is a fraction of the Knobloch CAPEX spread over the service life.
    pub fn opex(&self) -> CostResult<MoneyPerYear> {
        let [
            delta_pressure_charge,
            delta_pressure_discharge,
            mass_flow_rate_charge,
            mass_flow_rate_discharge,
            fluid_density,
            charging_time,
            discharging_time,
            cycles_per_year,
            service_years,
            electricity_cost,
            fan_efficiency,
            maintenance,
        ] = self.parameters.values(OPEX_PARAMETERS)?;

        for (param, value) in [
            (Parameter::ServiceYears, service_years),
            (Parameter::WorkingFluidDensity, fluid_density),
            (Parameter::FanEfficiency, fan_efficiency),
        ] {
            if value == 0.0 {
                return Err(CostError::DegenerateValuation(format!(
                    "{param} is zero, so OPEX is undefined"
                )));
            }
        }

        let charge = mass_flow_rate_charge * delta_pressure_charge / fluid_density * charging_time;
        let discharge =
            mass_flow_rate_discharge * delta_pressure_discharge / fluid_density * discharging_time;
        let pumping = (cycles_per_year / service_years)
            * (electricity_cost / fan_efficiency)
            * (charge + discharge);
        let opex = pumping + maintenance * self.capex_knobloch().value() / service_years;

        Ok(MoneyPerYear(ensure_finite(opex, "OPEX")?))
    }

    /// Levelised cost of storage using the Pereira CAPEX
    pub fn lcos(&self) -> CostResult<MoneyPerEnergy> {
        self.lcos_with(CapexMethod::Pereira)
    }

    /// Levelised cost of storage using the given CAPEX method.
    ///
    /// OPEX and the energy delivered by each year's cycles are both discounted over the service
    /// life. Every missing parameter (for LCOS, OPEX and the CAPEX method) is reported together.
    pub fn lcos_with(&self, method: CapexMethod) -> CostResult<MoneyPerEnergy> {
        if !method.is_absolute() {
            return Err(CostError::UnitMismatch(format!(
                "LCOS requires an absolute CAPEX, but the {method} method gives a cost per unit \
                 capacity"
            )));
        }

        let required = LCOS_PARAMETERS
            .iter()
            .chain(OPEX_PARAMETERS.iter())
            .chain(method.required_parameters())
            .copied()
            .unique()
            .collect_vec();
        let missing = self.check_parameters(&required);
        if !missing.is_empty() {
            return Err(CostError::MissingParameters(missing));
        }

        let [discount_rate, capacity, efficiency, cycles_per_year] = self.parameters.values([
            Parameter::AnnualDiscountRate,
            Parameter::TesEnergyCapacity,
            Parameter::TesEfficiency,
            Parameter::CyclesPerYear,
        ])?;
        let service_years = self.parameters.service_years.unwrap_or_default();
        if service_years == 0 {
            return Err(CostError::DegenerateValuation(
                "service_years is zero, so LCOS is undefined".into(),
            ));
        }

        let capex = self.capex_total(method)?;
        let opex = self.opex()?;
        let discount_rate = Dimensionless(discount_rate);
        let opex_total = present_value(Money(opex.value()), discount_rate, service_years);
        let energy_per_year = Energy(cycles_per_year * capacity * efficiency);
        let discounted_energy = present_value(energy_per_year, discount_rate, service_years);
        if discounted_energy.value() == 0.0 {
            return Err(CostError::DegenerateValuation(
                "No energy is delivered over the service life, so LCOS is undefined".into(),
            ));
        }

        let lcos = (capex + opex_total) / discounted_energy;
        ensure_finite(lcos.value(), "LCOS")?;
        Ok(lcos)
    }

    /// CAPEX spread evenly over the service life with the capital recovery factor
    pub fn annualised_capex(&self, method: CapexMethod) -> CostResult<MoneyPerYear> {
        let [_, discount_rate] = self
            .parameters
            .values([Parameter::ServiceYears, Parameter::AnnualDiscountRate])?;
        let service_years = self.parameters.service_years.unwrap_or_default();
        if service_years == 0 {
            return Err(CostError::DegenerateValuation(
                "service_years is zero, so annualised CAPEX is undefined".into(),
            ));
        }

        let capex = self.capex_total(method)?;
        Ok(annual_capital_cost(
            capex,
            service_years,
            Dimensionless(discount_rate),
        ))
    }

    /// Evaluate every cost metric, recording failures alongside successes
    pub fn summary(&self, lcos_method: CapexMethod) -> CostSummary {
        let mut metrics = CapexMethod::iter()
            .map(|method| CostMetric {
                name: format!("capex_{method}"),
                result: self.capex(method).map(|capex| (capex.value(), capex.unit())),
            })
            .collect_vec();
        metrics.push(CostMetric {
            name: "opex".into(),
            result: self.opex().map(|opex| (opex.value(), MoneyPerYear::UNIT)),
        });
        metrics.push(CostMetric {
            name: format!("lcos_{lcos_method}"),
            result: self
                .lcos_with(lcos_method)
                .map(|lcos| (lcos.value(), MoneyPerEnergy::UNIT)),
        });
        metrics.push(CostMetric {
            name: format!("annualised_capex_{lcos_method}"),
            result: self
                .annualised_capex(lcos_method)
                .map(|capex| (capex.value(), MoneyPerYear::UNIT)),
        });

        CostSummary { metrics }
    }

    /// The parameters for a CAPEX method as a fixed-size array
    fn method_parameters<const N: usize>(method: CapexMethod) -> [Parameter; N] {
        let params = method.required_parameters();
        std::array::from_fn(|i| params[i])
    }
}

impl fmt::Display for TesCostModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Iron volume: {}", self.iron_volume)?;
        writeln!(f, "Insulation volume: {}", self.insulation_volume)?;
        writeln!(f, "Price per cubic metre of iron: {}", self.price_per_cubic_meter_iron)?;
        writeln!(
            f,
            "Price per cubic metre of insulation: {}",
            self.price_per_cubic_meter_insulation
        )?;
        write!(f, "Components:")?;
        for component in &self.components {
            write!(
                f,
                "\n  - {}: ${} x {}",
                component.name, component.unit_price, component.quantity
            )?;
        }

        Ok(())
    }
}

/// The outcome of evaluating one cost metric
#[derive(Debug, Clone, PartialEq)]
pub struct CostMetric {
    /// The name of the metric (e.g. `capex_pereira`)
    pub name: String,
    /// The value and its unit, or the reason it could not be calculated
    pub result: CostResult<(f64, &'static str)>,
}

/// Every cost metric for a model
#[derive(Debug, Clone, PartialEq)]
pub struct CostSummary {
    /// Metrics in a fixed order
    pub metrics: Vec<CostMetric>,
}

impl CostSummary {
    /// Look up the value of a metric by name, if it was calculated successfully
    pub fn value(&self, name: &str) -> Option<f64> {
        self.metrics
            .iter()
            .find(|metric| metric.name == name)
            .and_then(|metric| metric.result.as_ref().ok())
            .map(|(value, _)| *value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::{assert_error, worked_example, worked_example_with_parameters};
    use float_cmp::assert_approx_eq;
    use rstest::rstest;

    fn empty_model() -> TesCostModel {
        TesCostModel::new(
            Volume(100.0),
            Volume(50.0),
            MoneyPerVolume(0.0),
            MoneyPerVolume(0.0),
            Vec::new(),
        )
        .unwrap()
    }

    #[rstest]
    fn test_capex_knobloch(worked_example: TesCostModel) {
        assert_eq!(worked_example.iron_cost(), Money(20000.0));
        assert_eq!(worked_example.insulation_cost(), Money(2500.0));
        assert_eq!(worked_example.components_cost(), Money(16000.0));
        assert_eq!(worked_example.capex_knobloch(), Money(38500.0));
    }

    #[rstest]
    fn test_capex_methods(worked_example_with_parameters: TesCostModel) {
        let model = worked_example_with_parameters;
        assert_approx_eq!(
            MoneyPerEnergy,
            model.capex_kocher().unwrap(),
            MoneyPerEnergy(0.15625),
            epsilon = 1e-12
        );
        assert_approx_eq!(
            Money,
            model.capex_mctigue().unwrap(),
            Money(4883600.0),
            epsilon = 1e-6
        );
        assert_approx_eq!(
            Money,
            model.capex_trevisan().unwrap(),
            Money(22625.0),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            Money,
            model.capex_pereira().unwrap(),
            Money(44418.75),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_prices_give_zero_capex() {
        let mut model = empty_model();
        model
            .set_parameters([
                ("temporal_adjustment_index", 1.05),
                ("installation_percentage", 0.15),
            ])
            .unwrap();
        assert_eq!(model.capex_knobloch(), Money(0.0));
        assert_eq!(model.capex_trevisan(), Ok(Money(0.0)));
        assert_eq!(model.capex_pereira(), Ok(Money(0.0)));
    }

    #[rstest]
    #[case(CapexMethod::Kocher, "Missing parameters: density_tes_material (kg/m³), volume_tes_material (m³), specific_heat_tes_material (kJ/(kg·K)), temperature_difference (K), tes_efficiency")]
    #[case(CapexMethod::McTigue, "Missing parameters: k_mctigue, volume_tes_material (m³), final_pressure (Pa)")]
    #[case(CapexMethod::Trevisan, "Missing parameters: temporal_adjustment_index")]
    #[case(CapexMethod::Pereira, "Missing parameters: temporal_adjustment_index, installation_percentage")]
    fn test_capex_missing_parameters(
        worked_example: TesCostModel,
        #[case] method: CapexMethod,
        #[case] msg: &str,
    ) {
        assert_error!(worked_example.capex(method), msg);
    }

    #[rstest]
    fn test_capex_kocher_zero_capacity(mut worked_example_with_parameters: TesCostModel) {
        worked_example_with_parameters
            .set_parameter(Parameter::TemperatureDifference, 0.0)
            .unwrap();
        assert!(matches!(
            worked_example_with_parameters.capex_kocher(),
            Err(CostError::DegenerateValuation(_))
        ));
    }

    #[rstest]
    fn test_pereira_reduces_to_knobloch(mut worked_example: TesCostModel) {
        worked_example
            .set_parameters([
                ("temporal_adjustment_index", 1.0),
                ("installation_percentage", 0.0),
            ])
            .unwrap();
        assert_eq!(
            worked_example.capex_pereira().unwrap(),
            worked_example.capex_knobloch()
        );
    }

    #[rstest]
    fn test_knobloch_monotonic_in_prices(mut worked_example: TesCostModel) {
        let mut previous = worked_example.capex_knobloch();
        for price in [250.0, 300.0, 1000.0] {
            worked_example
                .set_price_per_cubic_meter_iron(MoneyPerVolume(price))
                .unwrap();
            let capex = worked_example.capex_knobloch();
            assert!(capex >= previous);
            previous = capex;
        }
        for price in [60.0, 75.0, 500.0] {
            worked_example
                .set_price_per_cubic_meter_insulation(MoneyPerVolume(price))
                .unwrap();
            let capex = worked_example.capex_knobloch();
            assert!(capex >= previous);
            previous = capex;
        }
    }

    #[test]
    fn test_knobloch_monotonic_in_components() {
        let capex_with = |price, quantity| {
            TesCostModel::new(
                Volume(1.0),
                Volume(1.0),
                MoneyPerVolume(1.0),
                MoneyPerVolume(1.0),
                vec![Component::new("Pump", price, quantity)],
            )
            .unwrap()
            .capex_knobloch()
        };
        assert!(capex_with(100.0, 2.0) <= capex_with(150.0, 2.0));
        assert!(capex_with(100.0, 2.0) <= capex_with(100.0, 3.0));
    }

    #[rstest]
    fn test_price_last_write_wins(mut worked_example: TesCostModel) {
        assert_eq!(worked_example.capex_knobloch(), Money(38500.0));
        worked_example
            .set_price_per_cubic_meter_iron(MoneyPerVolume(300.0))
            .unwrap();
        worked_example
            .set_price_per_cubic_meter_iron(MoneyPerVolume(100.0))
            .unwrap();
        assert_eq!(worked_example.capex_knobloch(), Money(28500.0));
    }

    #[test]
    fn test_new_rejects_negative_values() {
        let result = TesCostModel::new(
            Volume(-1.0),
            Volume(50.0),
            MoneyPerVolume(200.0),
            MoneyPerVolume(50.0),
            Vec::new(),
        );
        assert_error!(
            result,
            "Invalid parameter: iron_volume must be a non-negative number, got -1"
        );

        let result = TesCostModel::new(
            Volume(1.0),
            Volume(50.0),
            MoneyPerVolume(200.0),
            MoneyPerVolume(50.0),
            vec![Component::new("Valve", 1500.0, -4.0)],
        );
        assert_error!(
            result,
            "Invalid parameter: Valve quantity must be a non-negative number, got -4"
        );
    }

    #[rstest]
    fn test_set_price_rejects_negative(mut worked_example: TesCostModel) {
        assert!(
            worked_example
                .set_price_per_cubic_meter_insulation(MoneyPerVolume(-5.0))
                .is_err()
        );
        assert_eq!(
            worked_example.price_per_cubic_meter_insulation(),
            MoneyPerVolume(50.0)
        );
    }

    #[rstest]
    fn test_opex(worked_example_with_parameters: TesCostModel) {
        assert_approx_eq!(
            MoneyPerYear,
            worked_example_with_parameters.opex().unwrap(),
            MoneyPerYear(113.00367647058823),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_opex_missing_parameters(worked_example: TesCostModel) {
        match worked_example.opex() {
            Err(CostError::MissingParameters(missing)) => assert_eq!(missing, OPEX_PARAMETERS),
            other => panic!("Unexpected result: {other:?}"),
        }
    }

    #[rstest]
    #[case(Parameter::ServiceYears)]
    #[case(Parameter::WorkingFluidDensity)]
    #[case(Parameter::FanEfficiency)]
    fn test_opex_zero_denominator(
        mut worked_example_with_parameters: TesCostModel,
        #[case] param: Parameter,
    ) {
        worked_example_with_parameters
            .set_parameter(param, 0.0)
            .unwrap();
        assert!(matches!(
            worked_example_with_parameters.opex(),
            Err(CostError::DegenerateValuation(_))
        ));
    }

    #[rstest]
    fn test_lcos(worked_example_with_parameters: TesCostModel) {
        assert_approx_eq!(
            MoneyPerEnergy,
            worked_example_with_parameters.lcos().unwrap(),
            MoneyPerEnergy(8.171731324993576),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            MoneyPerEnergy,
            worked_example_with_parameters
                .lcos_with(CapexMethod::Knobloch)
                .unwrap(),
            MoneyPerEnergy(7.116318407360455),
            epsilon = 1e-9
        );
    }

    #[rstest]
    fn test_lcos_zero_service_years(mut worked_example_with_parameters: TesCostModel) {
        worked_example_with_parameters
            .set_parameter(Parameter::ServiceYears, 0.0)
            .unwrap();
        assert!(matches!(
            worked_example_with_parameters.lcos(),
            Err(CostError::DegenerateValuation(_))
        ));
    }

    #[rstest]
    fn test_lcos_zero_capacity(mut worked_example_with_parameters: TesCostModel) {
        worked_example_with_parameters
            .set_parameter(Parameter::TesEnergyCapacity, 0.0)
            .unwrap();
        assert_error!(
            worked_example_with_parameters.lcos(),
            "Degenerate valuation: No energy is delivered over the service life, so LCOS is \
             undefined"
        );
    }

    #[rstest]
    fn test_lcos_kocher_unit_mismatch(worked_example_with_parameters: TesCostModel) {
        assert!(matches!(
            worked_example_with_parameters.lcos_with(CapexMethod::Kocher),
            Err(CostError::UnitMismatch(_))
        ));
    }

    #[rstest]
    fn test_lcos_reports_all_missing(mut worked_example: TesCostModel) {
        worked_example
            .set_parameters([("annual_discount_rate", 0.05), ("cycles_per_year", 250.0)])
            .unwrap();
        let Err(CostError::MissingParameters(missing)) = worked_example.lcos() else {
            panic!("Expected missing parameters");
        };
        assert!(missing.contains(&Parameter::TesEnergyCapacity));
        assert!(missing.contains(&Parameter::FanEfficiency));
        assert!(missing.contains(&Parameter::InstallationPercentage));
        assert!(!missing.contains(&Parameter::AnnualDiscountRate));
        assert!(!missing.contains(&Parameter::CyclesPerYear));
        assert_eq!(missing.iter().unique().count(), missing.len());
    }

    #[rstest]
    fn test_costing_does_not_mutate(worked_example_with_parameters: TesCostModel) {
        let before = worked_example_with_parameters.clone();
        let _ = worked_example_with_parameters.summary(CapexMethod::Pereira);
        assert_eq!(worked_example_with_parameters, before);
    }

    #[rstest]
    fn test_summary(worked_example: TesCostModel) {
        let summary = worked_example.summary(CapexMethod::Pereira);
        assert_eq!(summary.metrics.len(), 8);
        assert_eq!(summary.value("capex_knobloch"), Some(38500.0));
        assert_eq!(summary.value("capex_pereira"), None);
        assert!(summary.metrics[1].result.is_err());
    }

    #[rstest]
    fn test_annualised_capex(worked_example_with_parameters: TesCostModel) {
        // 38500 × CRF(20 years, 5%)
        assert_approx_eq!(
            MoneyPerYear,
            worked_example_with_parameters
                .annualised_capex(CapexMethod::Knobloch)
                .unwrap(),
            MoneyPerYear(38500.0 * 0.08024258719069129),
            epsilon = 1e-6
        );
    }

    #[rstest]
    fn test_display(worked_example: TesCostModel) {
        assert_eq!(
            worked_example.to_string(),
            "Iron volume: 100 m³\nInsulation volume: 50 m³\nPrice per cubic metre of iron: 200 \
             $/m³\nPrice per cubic metre of insulation: 50 $/m³\nComponents:\n  - Pump: $5000 x \
             2\n  - Valve: $1500 x 4"
        );
    }

    #[test]
    fn test_capex_method_names() {
        assert_eq!(CapexMethod::McTigue.to_string(), "mctigue");
        assert_eq!("pereira".parse::<CapexMethod>().unwrap(), CapexMethod::Pereira);
    }
}
