//! Area and length units with fixed conversion factors from square feet / feet

use serde::{Deserialize, Serialize};

/// Area units supported for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AreaUnit {
    SquareFeet,
    SquareMeters,
    Acres,
    Hectares,
}

/// Linear units supported for output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LinearUnit {
    Feet,
    Meters,
    Yards,
    Kilometers,
    Miles,
}

impl AreaUnit {
    pub const ALL: [AreaUnit; 4] = [
        AreaUnit::SquareFeet,
        AreaUnit::SquareMeters,
        AreaUnit::Acres,
        AreaUnit::Hectares,
    ];

    /// Multiplier from square feet to this unit
    pub fn factor_from_sqft(self) -> f64 {
        match self {
            AreaUnit::SquareFeet => 1.0,
            AreaUnit::SquareMeters => 0.092903,
            AreaUnit::Acres => 0.0000229568,
            AreaUnit::Hectares => 0.0000092903,
        }
    }

    pub fn from_square_feet(self, value_sqft: f64) -> f64 {
        value_sqft * self.factor_from_sqft()
    }

    pub fn to_square_feet(self, value: f64) -> f64 {
        value / self.factor_from_sqft()
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            AreaUnit::SquareFeet => "sq ft",
            AreaUnit::SquareMeters => "m²",
            AreaUnit::Acres => "acres",
            AreaUnit::Hectares => "ha",
        }
    }
}

impl LinearUnit {
    pub const ALL: [LinearUnit; 5] = [
        LinearUnit::Feet,
        LinearUnit::Meters,
        LinearUnit::Yards,
        LinearUnit::Kilometers,
        LinearUnit::Miles,
    ];

    /// Multiplier from feet to this unit
    pub fn factor_from_ft(self) -> f64 {
        match self {
            LinearUnit::Feet => 1.0,
            LinearUnit::Meters => 0.3048,
            LinearUnit::Yards => 0.333333,
            LinearUnit::Kilometers => 0.0003048,
            LinearUnit::Miles => 0.000189394,
        }
    }

    pub fn from_feet(self, value_ft: f64) -> f64 {
        value_ft * self.factor_from_ft()
    }

    pub fn to_feet(self, value: f64) -> f64 {
        value / self.factor_from_ft()
    }

    pub fn abbreviation(self) -> &'static str {
        match self {
            LinearUnit::Feet => "ft",
            LinearUnit::Meters => "m",
            LinearUnit::Yards => "yd",
            LinearUnit::Kilometers => "km",
            LinearUnit::Miles => "mi",
        }
    }
}

/// Round to `decimal_places` using `round(v·10^p) / 10^p`
pub fn round_to_precision(value: f64, decimal_places: u8) -> f64 {
    let multiplier = 10_f64.powi(decimal_places as i32);
    (value * multiplier).round() / multiplier
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_area_factors() {
        assert_eq!(AreaUnit::SquareFeet.from_square_feet(1234.5), 1234.5);
        assert!((AreaUnit::SquareMeters.from_square_feet(10_000.0) - 929.03).abs() < 1e-9);
        assert!((AreaUnit::Acres.from_square_feet(43_560.0) - 1.0).abs() < 1e-4);
        assert!((AreaUnit::Hectares.from_square_feet(107_639.0) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_linear_factors() {
        assert!((LinearUnit::Meters.from_feet(100.0) - 30.48).abs() < 1e-12);
        assert!((LinearUnit::Yards.from_feet(3.0) - 0.999999).abs() < 1e-12);
        assert!((LinearUnit::Miles.from_feet(5280.0) - 1.0).abs() < 1e-4);
        assert!((LinearUnit::Kilometers.from_feet(3280.84) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_unit_round_trip() {
        for &x in &[0.37, 12.0, 4_356.25, 87_120.0, 1_234_567.89] {
            for precision in 0..=6u8 {
                for unit in AreaUnit::ALL {
                    let rounded = round_to_precision(unit.from_square_feet(x), precision);
                    let back = unit.to_square_feet(rounded);
                    // Rounding error of half a unit in the last place, scaled back to ft²
                    let tolerance = 0.5 * 10_f64.powi(-(precision as i32)) / unit.factor_from_sqft() + 1e-9 * x;
                    assert!((back - x).abs() <= tolerance, "{:?} p={} x={} back={}", unit, precision, x, back);
                }
            }
        }
    }

    #[test]
    fn test_round_to_precision() {
        assert_eq!(round_to_precision(1.23456, 2), 1.23);
        assert_eq!(round_to_precision(1.235001, 2), 1.24);
        assert_eq!(round_to_precision(1234.5, 0), 1235.0);
    }
}
