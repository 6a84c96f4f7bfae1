//! The year-by-year cash-flow ledger for a storage project.
//!
//! Each row of the ledger records the revenue, costs, taxes and cash flows for one year of the
//! analysis, together with the NPV and IRR of the free cash flows up to and including that year.
use crate::error::{CostError, CostResult};
use crate::finance::{irr, npv};
use log::debug;
use serde::{Deserialize, Serialize};

/// A per-year input: either a single value used for every year or one value per year
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Series {
    /// The same value every year
    Scalar(f64),
    /// A value for each year, starting with the first
    PerYear(Vec<f64>),
}

impl Default for Series {
    fn default() -> Self {
        Self::Scalar(0.0)
    }
}

impl From<f64> for Series {
    fn from(value: f64) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<f64>> for Series {
    fn from(values: Vec<f64>) -> Self {
        Self::PerYear(values)
    }
}

impl Series {
    /// Get exactly `years` values, broadcasting a scalar.
    ///
    /// Values beyond the horizon are ignored. A series with too few values fails with
    /// [`CostError::InsufficientData`].
    pub fn expand(&self, name: &str, years: u32) -> CostResult<Vec<f64>> {
        let values = match self {
            Self::Scalar(value) => vec![*value; years as usize],
            Self::PerYear(values) => {
                if values.len() < years as usize {
                    return Err(CostError::InsufficientData {
                        series: name.to_string(),
                        len: values.len(),
                        years,
                    });
                }
                values[..years as usize].to_vec()
            }
        };

        if let Some(value) = values.iter().find(|value| !value.is_finite()) {
            return Err(CostError::InvalidParameter(format!(
                "{name} contains a non-finite value ({value})"
            )));
        }

        Ok(values)
    }
}

/// Inputs for building a cash-flow ledger
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CashFlowInputs {
    /// Number of years to analyse
    pub years: u32,
    /// Sale price of energy (per kWh)
    pub energy_price: Series,
    /// Energy sold each year (kWh)
    pub annual_production: Series,
    /// Subsidies received each year
    pub subsidies: Series,
    /// Operation and maintenance costs
    pub om_costs: Series,
    /// Fuel costs
    pub fuel_costs: Series,
    /// Interest and loan repayments
    pub capital_costs: Series,
    /// Insurance costs
    pub insurance_costs: Series,
    /// Any other costs
    pub other_costs: Series,
    /// Investment made in the first year
    pub initial_investment: f64,
    /// Tax rate applied to net income
    pub tax_rate: f64,
    /// Discount rate used for the NPV
    pub discount_rate: f64,
}

/// One year of the cash-flow ledger
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerRow {
    /// Year of the analysis, starting at 1
    #[serde(rename = "Year")]
    pub year: u32,
    /// Income from energy sales
    #[serde(rename = "Revenue")]
    pub revenue: f64,
    /// Subsidies received
    #[serde(rename = "Subsidies")]
    pub subsidies: f64,
    /// Operation and maintenance costs
    #[serde(rename = "O&M Costs")]
    pub om_costs: f64,
    /// Fuel costs
    #[serde(rename = "Fuel Costs")]
    pub fuel_costs: f64,
    /// Interest and loan repayments
    #[serde(rename = "Capital Costs")]
    pub capital_costs: f64,
    /// Insurance costs
    #[serde(rename = "Insurance")]
    pub insurance_costs: f64,
    /// Any other costs
    #[serde(rename = "Other Costs")]
    pub other_costs: f64,
    /// Sum of all costs
    #[serde(rename = "Total Expenses")]
    pub total_expenses: f64,
    /// Revenue plus subsidies less total expenses
    #[serde(rename = "Net Income")]
    pub net_income: f64,
    /// Tax on net income
    #[serde(rename = "Taxes")]
    pub taxes: f64,
    /// Net income after tax
    #[serde(rename = "Operating Cash Flow")]
    pub operating_cash_flow: f64,
    /// Investment (only in the first year)
    #[serde(rename = "Capital Investment")]
    pub capital_investment: f64,
    /// Operating cash flow less capital investment
    #[serde(rename = "Free Cash Flow")]
    pub free_cash_flow: f64,
    /// NPV of the free cash flows up to this year
    #[serde(rename = "NPV")]
    pub npv: f64,
    /// IRR of the free cash flows up to this year, if defined
    #[serde(rename = "IRR")]
    pub irr: Option<f64>,
}

/// Build the cash-flow ledger, one row per year.
///
/// # Returns
///
/// The ledger rows or an error if the horizon is zero, a per-year series is too short or a rate
/// is invalid.
pub fn build_ledger(inputs: &CashFlowInputs) -> CostResult<Vec<LedgerRow>> {
    let years = inputs.years;
    if years == 0 {
        return Err(CostError::DegenerateValuation(
            "Cash-flow ledger needs at least one year".into(),
        ));
    }
    if !inputs.tax_rate.is_finite() || !inputs.initial_investment.is_finite() {
        return Err(CostError::InvalidParameter(
            "Tax rate and initial investment must be finite".into(),
        ));
    }
    if !(inputs.discount_rate.is_finite() && inputs.discount_rate > -1.0) {
        return Err(CostError::InvalidParameter(format!(
            "Discount rate must be greater than -1, got {}",
            inputs.discount_rate
        )));
    }

    let energy_price = inputs.energy_price.expand("energy_price", years)?;
    let annual_production = inputs.annual_production.expand("annual_production", years)?;
    let subsidies = inputs.subsidies.expand("subsidies", years)?;
    let om_costs = inputs.om_costs.expand("om_costs", years)?;
    let fuel_costs = inputs.fuel_costs.expand("fuel_costs", years)?;
    let capital_costs = inputs.capital_costs.expand("capital_costs", years)?;
    let insurance_costs = inputs.insurance_costs.expand("insurance_costs", years)?;
    let other_costs = inputs.other_costs.expand("other_costs", years)?;

    let mut free_cash_flows = Vec::with_capacity(years as usize);
    let mut rows = Vec::with_capacity(years as usize);
    for (idx, year) in (1..=years).enumerate() {
        let revenue = annual_production[idx] * energy_price[idx];
        let total_expenses = om_costs[idx]
            + fuel_costs[idx]
            + capital_costs[idx]
            + insurance_costs[idx]
            + other_costs[idx];
        let net_income = revenue + subsidies[idx] - total_expenses;
        let taxes = net_income * inputs.tax_rate;
        let operating_cash_flow = net_income - taxes;
        let capital_investment = if year == 1 {
            inputs.initial_investment
        } else {
            0.0
        };
        let free_cash_flow = operating_cash_flow - capital_investment;

        // NPV and IRR are recalculated over the cash flows to date for every row,
        // so each row shows the valuation as if the analysis ended that year
        free_cash_flows.push(free_cash_flow);
        let npv = npv(inputs.discount_rate, &free_cash_flows);
        let irr = irr(&free_cash_flows);

        rows.push(LedgerRow {
            year,
            revenue,
            subsidies: subsidies[idx],
            om_costs: om_costs[idx],
            fuel_costs: fuel_costs[idx],
            capital_costs: capital_costs[idx],
            insurance_costs: insurance_costs[idx],
            other_costs: other_costs[idx],
            total_expenses,
            net_income,
            taxes,
            operating_cash_flow,
            capital_investment,
            free_cash_flow,
            npv,
            irr,
        });
    }

    debug!("Built cash-flow ledger for {years} years");

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::assert_error;
    use float_cmp::assert_approx_eq;
    use rstest::{fixture, rstest};

    #[fixture]
    fn inputs() -> CashFlowInputs {
        CashFlowInputs {
            years: 3,
            energy_price: 1.0.into(),
            annual_production: 500.0.into(),
            initial_investment: 1000.0,
            discount_rate: 0.1,
            ..Default::default()
        }
    }

    #[test]
    fn test_single_year() {
        let inputs = CashFlowInputs {
            years: 1,
            energy_price: vec![0.1].into(),
            annual_production: vec![1000.0].into(),
            tax_rate: 0.2,
            discount_rate: 0.07,
            ..Default::default()
        };
        let rows = build_ledger(&inputs).unwrap();
        assert_eq!(rows.len(), 1);
        let row = &rows[0];
        assert_eq!(row.year, 1);
        assert_approx_eq!(f64, row.revenue, 100.0);
        assert_eq!(row.total_expenses, 0.0);
        assert_approx_eq!(f64, row.net_income, 100.0);
        assert_approx_eq!(f64, row.taxes, 20.0);
        assert_approx_eq!(f64, row.operating_cash_flow, 80.0);
        assert_approx_eq!(f64, row.free_cash_flow, 80.0);
        assert_approx_eq!(f64, row.npv, 80.0 / 1.07, epsilon = 1e-9);
        assert_eq!(row.irr, None);
    }

    #[rstest]
    fn test_running_valuation(inputs: CashFlowInputs) {
        let rows = build_ledger(&inputs).unwrap();
        let free_cash_flows: Vec<_> = rows.iter().map(|row| row.free_cash_flow).collect();
        assert_eq!(free_cash_flows, [-500.0, 500.0, 500.0]);
        assert_eq!(rows[0].capital_investment, 1000.0);
        assert_eq!(rows[1].capital_investment, 0.0);

        for (k, row) in rows.iter().enumerate() {
            let prefix = &free_cash_flows[..=k];
            assert_approx_eq!(f64, row.npv, npv(0.1, prefix), epsilon = 1e-9);
        }

        assert_eq!(rows[0].irr, None);
        assert_approx_eq!(f64, rows[1].irr.unwrap(), 0.0, epsilon = 1e-9);
        // (1 + r)² = (1 + r) + 1, i.e. the golden ratio
        assert_approx_eq!(f64, rows[2].irr.unwrap(), 0.618_033_988_749_895, epsilon = 1e-9);
    }

    #[rstest]
    fn test_expense_totals(mut inputs: CashFlowInputs) {
        inputs.subsidies = 50.0.into();
        inputs.om_costs = vec![10.0, 20.0, 30.0].into();
        inputs.fuel_costs = 1.0.into();
        inputs.capital_costs = 2.0.into();
        inputs.insurance_costs = 3.0.into();
        inputs.other_costs = 4.0.into();
        inputs.tax_rate = 0.25;

        let rows = build_ledger(&inputs).unwrap();
        let row = &rows[2];
        assert_eq!(row.om_costs, 30.0);
        assert_approx_eq!(f64, row.total_expenses, 40.0);
        assert_approx_eq!(f64, row.net_income, 510.0);
        assert_approx_eq!(f64, row.taxes, 127.5);
        assert_approx_eq!(f64, row.free_cash_flow, 382.5);
    }

    #[rstest]
    fn test_longer_series_truncated(mut inputs: CashFlowInputs) {
        inputs.energy_price = vec![1.0, 2.0, 3.0, 4.0, 5.0].into();
        let rows = build_ledger(&inputs).unwrap();
        assert_eq!(rows.len(), 3);
        assert_approx_eq!(f64, rows[2].revenue, 1500.0);
    }

    #[rstest]
    fn test_insufficient_data(mut inputs: CashFlowInputs) {
        inputs.insurance_costs = vec![1.0, 2.0].into();
        assert_error!(
            build_ledger(&inputs),
            "Insufficient data for insurance_costs: 2 values provided for 3 years"
        );
    }

    #[rstest]
    fn test_zero_years(mut inputs: CashFlowInputs) {
        inputs.years = 0;
        assert!(matches!(
            build_ledger(&inputs),
            Err(CostError::DegenerateValuation(_))
        ));
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    fn test_invalid_discount_rate(mut inputs: CashFlowInputs, #[case] rate: f64) {
        inputs.discount_rate = rate;
        assert!(matches!(
            build_ledger(&inputs),
            Err(CostError::InvalidParameter(_))
        ));
    }

    #[test]
    fn test_series_deserialise() {
        #[derive(Deserialize)]
        struct Wrapper {
            a: Series,
            b: Series,
        }
        let wrapper: Wrapper = toml::from_str("a = 2.5\nb = [1.0, 2.0]").unwrap();
        assert_eq!(wrapper.a, Series::Scalar(2.5));
        assert_eq!(wrapper.b, Series::PerYear(vec![1.0, 2.0]));
    }

    #[test]
    fn test_series_expand() {
        assert_eq!(Series::Scalar(2.0).expand("x", 3), Ok(vec![2.0; 3]));
        assert!(matches!(
            Series::PerYear(vec![1.0, f64::INFINITY]).expand("x", 2),
            Err(CostError::InvalidParameter(_))
        ));
    }
}
