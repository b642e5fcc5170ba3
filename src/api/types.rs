//! Measurement request/result types and precision settings

use crate::algorithms::TerrainProfile;
use crate::api::units::{AreaUnit, LinearUnit};
use crate::core::Polygon;
use crate::validation::accuracy::{AccuracyReport, AcquisitionContext};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Number formatting conventions for display strings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum DisplayLocale {
    /// `12,345.68`
    #[default]
    EnUs,
    /// `12.345,68`
    DeDe,
    /// `12 345,68`
    FrFr,
}

impl DisplayLocale {
    pub fn thousands_separator(self) -> char {
        match self {
            DisplayLocale::EnUs => ',',
            DisplayLocale::DeDe => '.',
            DisplayLocale::FrFr => ' ',
        }
    }

    pub fn decimal_separator(self) -> char {
        match self {
            DisplayLocale::EnUs => '.',
            DisplayLocale::DeDe | DisplayLocale::FrFr => ',',
        }
    }
}

/// Output units, rounding and pipeline toggles
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PrecisionSettings {
    pub area_unit: AreaUnit,
    pub linear_unit: LinearUnit,
    pub decimal_places: u8,
    /// Run terrain adjustment (requires elevations)
    pub use_3d: bool,
    /// Also emit every other unit of the same family
    pub show_conversions: bool,
    #[serde(default)]
    pub locale: DisplayLocale,
}

impl Default for PrecisionSettings {
    fn default() -> Self {
        Self {
            area_unit: AreaUnit::SquareFeet,
            linear_unit: LinearUnit::Feet,
            decimal_places: 2,
            use_3d: true,
            show_conversions: false,
            locale: DisplayLocale::EnUs,
        }
    }
}

impl PrecisionSettings {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_area_unit(mut self, unit: AreaUnit) -> Self {
        self.area_unit = unit;
        self
    }

    pub fn with_linear_unit(mut self, unit: LinearUnit) -> Self {
        self.linear_unit = unit;
        self
    }

    pub fn with_decimal_places(mut self, decimal_places: u8) -> Self {
        self.decimal_places = decimal_places;
        self
    }

    pub fn with_3d(mut self, use_3d: bool) -> Self {
        self.use_3d = use_3d;
        self
    }

    pub fn with_conversions(mut self, show_conversions: bool) -> Self {
        self.show_conversions = show_conversions;
        self
    }

    pub fn with_locale(mut self, locale: DisplayLocale) -> Self {
        self.locale = locale;
        self
    }
}

/// Output of one measurement pass, before verification
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawMeasurement {
    /// Projected planar area (ft²)
    pub area_2d_sqft: f64,
    /// Reported area: 3D surface when terrain ran, otherwise the planar area (ft²)
    pub area_sqft: f64,
    pub perimeter_ft: f64,
    pub terrain: Option<TerrainProfile>,
}

impl RawMeasurement {
    pub fn terrain_applied(&self) -> bool {
        self.terrain.is_some()
    }
}

/// Whether terrain adjustment contributed to a result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TerrainStatus {
    Applied,
    /// `use_3d` was off
    Disabled,
    /// Elevation lookup failed and the caller allowed a 2D result
    Unavailable { reason: String },
}

/// Surfaces subtracted from the gross parcel area
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExclusionKind {
    Building,
    Driveway,
    Pool,
    Patio,
    Other,
}

impl ExclusionKind {
    pub fn label(self) -> &'static str {
        match self {
            ExclusionKind::Building => "building",
            ExclusionKind::Driveway => "driveway",
            ExclusionKind::Pool => "pool",
            ExclusionKind::Patio => "patio",
            ExclusionKind::Other => "other",
        }
    }
}

/// Named sub-area of a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionInput {
    pub name: String,
    pub polygon: Polygon,
}

/// Surface to subtract from the parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionInput {
    pub kind: ExclusionKind,
    pub polygon: Polygon,
}

/// Everything one measurement needs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRequest {
    /// Caller-supplied identifier, carried into results and exports
    pub id: String,
    pub boundary: Polygon,
    #[serde(default)]
    pub sections: Vec<SectionInput>,
    #[serde(default)]
    pub exclusions: Vec<ExclusionInput>,
    #[serde(default)]
    pub context: AcquisitionContext,
}

impl MeasurementRequest {
    pub fn new(id: impl Into<String>, boundary: Polygon) -> Self {
        Self {
            id: id.into(),
            boundary,
            sections: Vec::new(),
            exclusions: Vec::new(),
            context: AcquisitionContext::default(),
        }
    }

    pub fn with_section(mut self, name: impl Into<String>, polygon: Polygon) -> Self {
        self.sections.push(SectionInput { name: name.into(), polygon });
        self
    }

    pub fn with_exclusion(mut self, kind: ExclusionKind, polygon: Polygon) -> Self {
        self.exclusions.push(ExclusionInput { kind, polygon });
        self
    }

    pub fn with_context(mut self, context: AcquisitionContext) -> Self {
        self.context = context;
        self
    }
}

/// Measured section of a parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionBreakdown {
    pub name: String,
    pub area_sqft: f64,
    pub perimeter_ft: f64,
    pub vertex_count: usize,
    /// Share of the parcel's planar area (%)
    pub share_pct: f64,
}

/// Final, immutable output of one measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementResult {
    pub id: String,
    pub area_sqft: f64,
    pub area_sqm: f64,
    pub area_2d_sqft: f64,
    /// `area_sqft` minus all exclusions, floored at zero
    pub net_area_sqft: f64,
    pub perimeter_ft: f64,
    pub perimeter_m: f64,
    pub terrain: Option<TerrainProfile>,
    pub terrain_status: TerrainStatus,
    pub accuracy: AccuracyReport,
    pub sections: Vec<SectionBreakdown>,
    pub excluded: BTreeMap<ExclusionKind, f64>,
    pub boundary: Polygon,
}

impl MeasurementResult {
    pub fn total_excluded_sqft(&self) -> f64 {
        self.excluded.values().sum()
    }

    pub fn vertex_count(&self) -> usize {
        self.boundary.vertex_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_precision_settings() {
        let settings = PrecisionSettings::default();
        assert_eq!(settings.area_unit, AreaUnit::SquareFeet);
        assert_eq!(settings.linear_unit, LinearUnit::Feet);
        assert_eq!(settings.decimal_places, 2);
        assert!(settings.use_3d);
        assert!(!settings.show_conversions);
    }

    #[test]
    fn test_precision_builder() {
        let settings = PrecisionSettings::new()
            .with_area_unit(AreaUnit::Acres)
            .with_linear_unit(LinearUnit::Meters)
            .with_decimal_places(4)
            .with_3d(false)
            .with_conversions(true)
            .with_locale(DisplayLocale::DeDe);
        assert_eq!(settings.area_unit, AreaUnit::Acres);
        assert_eq!(settings.decimal_places, 4);
        assert!(!settings.use_3d);
        assert_eq!(settings.locale.decimal_separator(), ',');
    }

    #[test]
    fn test_request_builder_and_serde() {
        let boundary = Polygon::from_lat_lng(&[(0.0, 0.0), (0.0, 0.001), (0.001, 0.001), (0.001, 0.0)]).unwrap();
        let pool = Polygon::from_lat_lng(&[(0.0002, 0.0002), (0.0002, 0.0004), (0.0004, 0.0004)]).unwrap();
        let request = MeasurementRequest::new("lot-7", boundary.clone())
            .with_section("front", boundary)
            .with_exclusion(ExclusionKind::Pool, pool);
        assert_eq!(request.sections.len(), 1);
        assert_eq!(request.exclusions[0].kind, ExclusionKind::Pool);

        let json = serde_json::to_string(&request).unwrap();
        assert!(json.contains("\"pool\""));
        let back: MeasurementRequest = serde_json::from_str(&json).unwrap();
        assert_eq!(back, request);
    }
}
