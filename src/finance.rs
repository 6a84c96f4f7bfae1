//! General functions related to finance.
use crate::units::{Dimensionless, Money, MoneyPerYear};
use std::iter::Sum;
use std::ops::Mul;

/// Absolute tolerance on the rate when refining an IRR root
const IRR_TOLERANCE: f64 = 1e-12;

/// Maximum number of bisection steps when refining an IRR root
const IRR_MAX_ITERATIONS: u32 = 200;

/// Calculates the capital recovery factor (CRF) for a given lifetime and discount rate.
///
/// The CRF is used to annualize capital costs over the lifetime of an asset.
pub fn capital_recovery_factor(lifetime: u32, discount_rate: Dimensionless) -> Dimensionless {
    if lifetime == 0 {
        return Dimensionless(0.0);
    }
    if discount_rate == Dimensionless(0.0) {
        return Dimensionless(1.0) / Dimensionless(lifetime as f64);
    }
    let factor = (Dimensionless(1.0) + discount_rate).powi(lifetime_exponent(lifetime));
    (discount_rate * factor) / (factor - Dimensionless(1.0))
}

/// Calculates the annualised capital cost of an investment
pub fn annual_capital_cost(
    capital_cost: Money,
    lifetime: u32,
    discount_rate: Dimensionless,
) -> MoneyPerYear {
    let crf = capital_recovery_factor(lifetime, discount_rate);
    MoneyPerYear((capital_cost * crf).value())
}

/// The factor by which a value received at the end of `year` is discounted
pub fn discount_factor(discount_rate: Dimensionless, year: u32) -> Dimensionless {
    Dimensionless(1.0) / (Dimensionless(1.0) + discount_rate).powi(lifetime_exponent(year))
}

/// Present value of the same amount received at the end of each of `years` years.
///
/// Returns the sum of `annual_value / (1 + discount_rate)^n` for `n` in `1..=years`, which is
/// zero when `years` is zero.
pub fn present_value<T>(annual_value: T, discount_rate: Dimensionless, years: u32) -> T
where
    T: Copy + Mul<Dimensionless, Output = T> + Sum,
{
    (1..=years)
        .map(|year| annual_value * discount_factor(discount_rate, year))
        .sum()
}

/// Net present value of a series of cash flows.
///
/// The first cash flow is taken to occur at the end of the first period and is discounted once.
pub fn npv(discount_rate: f64, cash_flows: &[f64]) -> f64 {
    let one_plus_r = 1.0 + discount_rate;
    let mut discount = 1.0;
    let mut result = 0.0;
    for cash_flow in cash_flows {
        discount *= one_plus_r;
        result += cash_flow / discount;
    }

    result
}

/// Internal rate of return of a series of cash flows.
///
/// The IRR is the discount rate (greater than -100%) at which the NPV of the series is zero. The
/// rates between -99% and 10,000% are scanned for sign changes in the NPV and each bracketed
/// root is refined by bisection. If there are several roots, the one closest to zero is
/// returned.
///
/// # Returns
///
/// The IRR, or `None` if the series has no real root (e.g. a single cash flow or cash flows
/// which all have the same sign).
pub fn irr(cash_flows: &[f64]) -> Option<f64> {
    if cash_flows.len() < 2 || cash_flows.iter().all(|cf| *cf == 0.0) {
        return None;
    }

    let f = |rate: f64| npv(rate, cash_flows);
    let mut best: Option<f64> = None;
    let mut consider = |root: f64| {
        if best.is_none_or(|b| root.abs() < b.abs()) {
            best = Some(root);
        }
    };

    let mut grid = irr_search_grid();
    let mut lo = grid.next()?;
    let mut f_lo = f(lo);
    if f_lo == 0.0 {
        consider(lo);
    }
    for hi in grid {
        let f_hi = f(hi);
        if f_hi == 0.0 {
            consider(hi);
        } else if f_lo * f_hi < 0.0 {
            consider(bisect(&f, lo, hi, f_lo));
        }
        lo = hi;
        f_lo = f_hi;
    }

    best
}

/// The trial rates scanned for sign changes when searching for an IRR
fn irr_search_grid() -> impl Iterator<Item = f64> {
    let fine = (0..=1990).map(|i| -0.99 + f64::from(i) * 0.001);
    let coarse = (1..=990).map(|i| 1.0 + f64::from(i) * 0.1);
    let wide = (1..=99).map(|i| 100.0 * f64::from(i));
    fine.chain(coarse).chain(wide)
}

/// Refine a root of `f` known to lie between `lo` and `hi`
fn bisect<F>(f: &F, mut lo: f64, mut hi: f64, mut f_lo: f64) -> f64
where
    F: Fn(f64) -> f64,
{
    for _ in 0..IRR_MAX_ITERATIONS {
        let mid = 0.5 * (lo + hi);
        let f_mid = f(mid);
        if f_mid == 0.0 || (hi - lo).abs() < IRR_TOLERANCE {
            return mid;
        }
        if f_lo * f_mid < 0.0 {
            hi = mid;
        } else {
            lo = mid;
            f_lo = f_mid;
        }
    }

    0.5 * (lo + hi)
}

/// Convert a number of years into an exponent for `powi`
fn lifetime_exponent(years: u32) -> i32 {
    i32::try_from(years).unwrap_or(i32::MAX)
}
