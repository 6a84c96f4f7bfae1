//! Quantity types used by the costing formulas.
//!
//! Each quantity is a thin wrapper around an `f64`. Only the combinations which appear in the
//! costing formulas have arithmetic defined, so that, for example, a cost per unit of capacity
//! cannot be added to an absolute cost by accident.

/// Represents a dimensionless quantity.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, derive_more::Add, derive_more::Sub)]
pub struct Dimensionless(pub f64);

impl std::ops::Mul for Dimensionless {
    type Output = Dimensionless;

    fn mul(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 * rhs.0)
    }
}

impl std::ops::Div for Dimensionless {
    type Output = Dimensionless;

    fn div(self, rhs: Dimensionless) -> Self::Output {
        Dimensionless(self.0 / rhs.0)
    }
}

impl Dimensionless {
    /// Raise to an integer power
    pub fn powi(self, rhs: i32) -> Self {
        Dimensionless(self.0.powi(rhs))
    }
}

impl From<f64> for Dimensionless {
    fn from(val: f64) -> Self {
        Self(val)
    }
}

impl From<Dimensionless> for f64 {
    fn from(val: Dimensionless) -> Self {
        val.0
    }
}

impl float_cmp::ApproxEq for Dimensionless {
    type Margin = float_cmp::F64Margin;

    fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
        float_cmp::ApproxEq::approx_eq(self.0, other.0, margin)
    }
}

macro_rules! unit_struct {
    ($name:ident, $symbol:literal) => {
        #[doc = concat!("A quantity measured in ", $symbol, ".")]
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            PartialOrd,
            Default,
            derive_more::Add,
            derive_more::Sub,
            derive_more::AddAssign,
        )]
        pub struct $name(pub f64);

        impl $name {
            /// The unit symbol for this quantity
            pub const UNIT: &'static str = $symbol;

            /// Returns the value of the quantity as a f64.
            pub fn value(self) -> f64 {
                self.0
            }
        }

        impl From<f64> for $name {
            fn from(val: f64) -> Self {
                Self(val)
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{} {}", self.0, $symbol)
            }
        }

        impl std::ops::Mul<Dimensionless> for $name {
            type Output = $name;
            fn mul(self, rhs: Dimensionless) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Mul<$name> for Dimensionless {
            type Output = $name;
            fn mul(self, rhs: $name) -> $name {
                $name(self.0 * rhs.0)
            }
        }

        impl std::ops::Div<Dimensionless> for $name {
            type Output = $name;
            fn div(self, rhs: Dimensionless) -> $name {
                $name(self.0 / rhs.0)
            }
        }

        impl std::iter::Sum for $name {
            fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
                $name(iter.map(|x| x.0).sum())
            }
        }

        impl float_cmp::ApproxEq for $name {
            type Margin = float_cmp::F64Margin;

            fn approx_eq<M: Into<Self::Margin>>(self, other: Self, margin: M) -> bool {
                float_cmp::ApproxEq::approx_eq(self.0, other.0, margin)
            }
        }
    };
}

macro_rules! impl_mul {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Mul<$Rhs> for $Lhs {
            type Output = $Out;
            fn mul(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 * rhs.0)
            }
        }
        impl std::ops::Mul<$Lhs> for $Rhs {
            type Output = $Out;
            fn mul(self, lhs: $Lhs) -> $Out {
                <$Out>::from(self.0 * lhs.0)
            }
        }
    };
}

macro_rules! impl_div {
    ($Lhs:ty, $Rhs:ty, $Out:ty) => {
        impl std::ops::Div<$Rhs> for $Lhs {
            type Output = $Out;
            fn div(self, rhs: $Rhs) -> $Out {
                <$Out>::from(self.0 / rhs.0)
            }
        }
    };
}

// Base quantities
unit_struct!(Money, "$");
unit_struct!(Volume, "m³");
unit_struct!(Energy, "kWh");

// Derived quantities
unit_struct!(MoneyPerVolume, "$/m³");
unit_struct!(MoneyPerEnergy, "$/kWh");
unit_struct!(MoneyPerYear, "$/year");
unit_struct!(EnergyPerVolume, "kWh/m³");

// Division rules
impl_div!(Money, Energy, MoneyPerEnergy);
impl_div!(Money, Volume, MoneyPerVolume);

// Multiplication rules
impl_mul!(Volume, MoneyPerVolume, Money);
impl_mul!(Volume, EnergyPerVolume, Energy);
impl_mul!(MoneyPerEnergy, Energy, Money);

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    #[test]
    fn test_volume_times_price_is_money() {
        let cost = Volume(100.0) * MoneyPerVolume(200.0);
        assert_eq!(cost, Money(20000.0));
        assert_eq!(MoneyPerVolume(200.0) * Volume(100.0), cost);
    }

    #[test]
    fn test_money_per_energy() {
        let cost = Money(1000.0) / Energy(4.0);
        assert_approx_eq!(MoneyPerEnergy, cost, MoneyPerEnergy(250.0));
        assert_eq!(cost * Energy(4.0), Money(1000.0));
    }

    #[test]
    fn test_sum_and_scale() {
        let total: Money = [Money(1.0), Money(2.5)].into_iter().sum();
        assert_eq!(total * Dimensionless(2.0), Money(7.0));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money(38500.0).to_string(), "38500 $");
        assert_eq!(Volume(1.5).to_string(), "1.5 m³");
    }
}
