//! Material volumes for a vertical cylindrical storage tank.
use crate::error::{CostError, CostResult};
use crate::units::Volume;
use serde::Deserialize;
use std::f64::consts::PI;

/// Dimensions of a vertical cylindrical tank with a steel shell and an insulation layer.
///
/// The shell and insulation wrap the side wall and both end caps. All lengths are in metres.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CylindricalTank {
    /// Height of the storage medium
    pub height: f64,
    /// Inner radius of the tank
    pub radius: f64,
    /// Thickness of the steel shell
    pub steel_thickness: f64,
    /// Thickness of the insulation layer
    pub insulation_thickness: f64,
}

impl CylindricalTank {
    /// Check that all dimensions are finite and non-negative
    pub fn validate(&self) -> CostResult<()> {
        let dims = [
            ("height", self.height),
            ("radius", self.radius),
            ("steel_thickness", self.steel_thickness),
            ("insulation_thickness", self.insulation_thickness),
        ];
        for (name, value) in dims {
            if !(value.is_finite() && value >= 0.0) {
                return Err(CostError::InvalidParameter(format!(
                    "Tank {name} must be a non-negative number, got {value}"
                )));
            }
        }

        Ok(())
    }

    /// Volume of steel in the shell
    pub fn steel_volume(&self) -> Volume {
        let (h, r, s) = (self.height, self.radius, self.steel_thickness);
        Volume(2.0 * PI * (h * ((r + s).powi(2) - r.powi(2)) + 2.0 * s * r.powi(2)))
    }

    /// Volume of the insulation layer around the steel shell
    pub fn insulation_volume(&self) -> Volume {
        let (h, r, s, i) = (
            self.height,
            self.radius,
            self.steel_thickness,
            self.insulation_thickness,
        );
        Volume(2.0 * PI * (h * ((r + s + i).powi(2) - (r + s).powi(2)) + 2.0 * i * r.powi(2)))
    }

    /// Volume of storage medium inside the tank
    pub fn medium_volume(&self) -> Volume {
        Volume(PI * self.height * self.radius.powi(2))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::assert_approx_eq;

    fn tank() -> CylindricalTank {
        CylindricalTank {
            height: 11.5,
            radius: 15.0,
            steel_thickness: 0.07,
            insulation_thickness: 0.04,
        }
    }

    #[test]
    fn test_volumes() {
        let tank = tank();
        // 2π(11.5 × (15.07² − 15²) + 2 × 0.07 × 15²)
        assert_approx_eq!(
            Volume,
            tank.steel_volume(),
            Volume(2.0 * PI * (11.5 * 2.1049 + 31.5)),
            epsilon = 1e-9
        );
        // 2π(11.5 × (15.11² − 15.07²) + 2 × 0.04 × 15²)
        assert_approx_eq!(
            Volume,
            tank.insulation_volume(),
            Volume(2.0 * PI * (11.5 * 1.2072 + 18.0)),
            epsilon = 1e-9
        );
        assert_approx_eq!(
            Volume,
            tank.medium_volume(),
            Volume(PI * 11.5 * 225.0),
            epsilon = 1e-9
        );
    }

    #[test]
    fn test_zero_thickness() {
        let tank = CylindricalTank {
            steel_thickness: 0.0,
            insulation_thickness: 0.0,
            ..tank()
        };
        assert_eq!(tank.steel_volume(), Volume(0.0));
        assert_eq!(tank.insulation_volume(), Volume(0.0));
    }

    #[test]
    fn test_validate() {
        assert!(tank().validate().is_ok());
        let tank = CylindricalTank {
            radius: -1.0,
            ..tank()
        };
        assert_eq!(
            tank.validate(),
            Err(CostError::InvalidParameter(
                "Tank radius must be a non-negative number, got -1".into()
            ))
        );
    }
}
