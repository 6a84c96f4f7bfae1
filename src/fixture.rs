//! Fixtures for tests

use crate::tes::{Component, TesCostModel};
use crate::units::{MoneyPerVolume, Volume};
use rstest::fixture;

/// Assert that an error with the given message occurs
macro_rules! assert_error {
    ($result:expr, $msg:expr) => {
        assert_eq!($result.unwrap_err().to_string(), $msg);
    };
}
pub(crate) use assert_error;

/// 100 m³ of steel at $200/m³, 50 m³ of insulation at $50/m³, two pumps and four valves
#[fixture]
pub fn worked_example() -> TesCostModel {
    TesCostModel::new(
        Volume(100.0),
        Volume(50.0),
        MoneyPerVolume(200.0),
        MoneyPerVolume(50.0),
        vec![
            Component::new("Pump", 5000.0, 2.0),
            Component::new("Valve", 1500.0, 4.0),
        ],
    )
    .unwrap()
}

/// The worked example with every optional parameter set
#[fixture]
pub fn worked_example_with_parameters(mut worked_example: TesCostModel) -> TesCostModel {
    worked_example
        .set_parameters([
            ("density_tes_material", 1600.0),
            ("volume_tes_material", 1200.0),
            ("specific_heat_tes_material", 1.0),
            ("temperature_difference", 300.0),
            ("tes_efficiency", 0.9),
            ("k_mctigue", 0.02),
            ("final_pressure", 202_650.0),
            ("temporal_adjustment_index", 1.05),
            ("installation_percentage", 0.15),
            ("delta_pressure_charge", 101_325.0),
            ("delta_pressure_discharge", 101_325.0),
            ("mass_flow_rate_charge", 100.0),
            ("mass_flow_rate_discharge", 100.0),
            ("working_fluid_density", 1000.0),
            ("charging_time", 5.0),
            ("discharging_time", 5.0),
            ("cycles_per_year", 250.0),
            ("service_years", 20.0),
            ("electricity_cost_per_joule", 5e-5),
            ("fan_efficiency", 0.85),
            ("capex_maintenance_percentage", 0.02),
            ("annual_discount_rate", 0.05),
            ("tes_energy_capacity", 2.0),
        ])
        .unwrap();
    worked_example
}
