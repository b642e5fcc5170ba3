//! Measurement output formatting
//!
//! Converts raw square-feet / feet values into the caller's units, rounds
//! them, and renders locale-aware display strings.

use crate::api::types::{DisplayLocale, MeasurementResult, PrecisionSettings, TerrainStatus};
use crate::api::units::{round_to_precision, AreaUnit, LinearUnit};
use serde::{Deserialize, Serialize};
use std::fmt;

/// One value in one unit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertedValue {
    pub value: f64,
    pub unit: String,
}

/// Rounded value, its unit, and a display string
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedMeasurement {
    pub value: f64,
    pub unit: String,
    pub display: String,
    /// Same quantity in every other unit of the family, when requested
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub conversions: Vec<ConvertedValue>,
}

impl fmt::Display for FormattedMeasurement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display)
    }
}

/// Format an area given in square feet (US display conventions, no conversions)
pub fn format_area(value_sqft: f64, unit: AreaUnit, decimal_places: u8) -> FormattedMeasurement {
    format_area_with(value_sqft, unit, decimal_places, DisplayLocale::EnUs, false)
}

/// Format a length given in feet (US display conventions, no conversions)
pub fn format_length(value_ft: f64, unit: LinearUnit, decimal_places: u8) -> FormattedMeasurement {
    format_length_with(value_ft, unit, decimal_places, DisplayLocale::EnUs, false)
}

fn format_area_with(
    value_sqft: f64,
    unit: AreaUnit,
    decimal_places: u8,
    locale: DisplayLocale,
    show_conversions: bool,
) -> FormattedMeasurement {
    let value = round_to_precision(unit.from_square_feet(value_sqft), decimal_places);
    let conversions = if show_conversions {
        AreaUnit::ALL
            .iter()
            .filter(|&&other| other != unit)
            .map(|&other| ConvertedValue {
                value: round_to_precision(other.from_square_feet(value_sqft), decimal_places),
                unit: other.abbreviation().to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    FormattedMeasurement {
        value,
        unit: unit.abbreviation().to_string(),
        display: format!("{} {}", format_number(value, decimal_places, locale), unit.abbreviation()),
        conversions,
    }
}

fn format_length_with(
    value_ft: f64,
    unit: LinearUnit,
    decimal_places: u8,
    locale: DisplayLocale,
    show_conversions: bool,
) -> FormattedMeasurement {
    let value = round_to_precision(unit.from_feet(value_ft), decimal_places);
    let conversions = if show_conversions {
        LinearUnit::ALL
            .iter()
            .filter(|&&other| other != unit)
            .map(|&other| ConvertedValue {
                value: round_to_precision(other.from_feet(value_ft), decimal_places),
                unit: other.abbreviation().to_string(),
            })
            .collect()
    } else {
        Vec::new()
    };

    FormattedMeasurement {
        value,
        unit: unit.abbreviation().to_string(),
        display: format!("{} {}", format_number(value, decimal_places, locale), unit.abbreviation()),
        conversions,
    }
}

/// Render `value` with fixed decimals and the locale's separators
pub fn format_number(value: f64, decimal_places: u8, locale: DisplayLocale) -> String {
    let fixed = format!("{:.*}", decimal_places as usize, value.abs());
    let (integer, fraction) = match fixed.split_once('.') {
        Some((integer, fraction)) => (integer, Some(fraction)),
        None => (fixed.as_str(), None),
    };

    let separator = locale.thousands_separator();
    let mut grouped = String::with_capacity(fixed.len() + integer.len() / 3 + 1);
    if value.is_sign_negative() && value != 0.0 && fixed.bytes().any(|b| b.is_ascii_digit() && b != b'0') {
        grouped.push('-');
    }
    for (i, digit) in integer.chars().enumerate() {
        if i > 0 && (integer.len() - i) % 3 == 0 {
            grouped.push(separator);
        }
        grouped.push(digit);
    }
    if let Some(fraction) = fraction {
        grouped.push(locale.decimal_separator());
        grouped.push_str(fraction);
    }
    grouped
}

/// Formatted view of one section
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedSection {
    pub name: String,
    pub area: FormattedMeasurement,
    pub perimeter: FormattedMeasurement,
    pub share_pct: f64,
}

/// Display-ready view of a `MeasurementResult`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormattedReport {
    pub id: String,
    pub area: FormattedMeasurement,
    pub net_area: FormattedMeasurement,
    pub perimeter: FormattedMeasurement,
    pub confidence_pct: u8,
    pub error_margin_pct: f64,
    pub terrain_status: TerrainStatus,
    pub sections: Vec<FormattedSection>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Formatter bound to a set of precision settings
#[derive(Debug, Clone, Default)]
pub struct MeasurementFormatter {
    settings: PrecisionSettings,
}

impl MeasurementFormatter {
    pub fn new(settings: PrecisionSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &PrecisionSettings {
        &self.settings
    }

    pub fn area(&self, value_sqft: f64) -> FormattedMeasurement {
        format_area_with(
            value_sqft,
            self.settings.area_unit,
            self.settings.decimal_places,
            self.settings.locale,
            self.settings.show_conversions,
        )
    }

    pub fn length(&self, value_ft: f64) -> FormattedMeasurement {
        format_length_with(
            value_ft,
            self.settings.linear_unit,
            self.settings.decimal_places,
            self.settings.locale,
            self.settings.show_conversions,
        )
    }

    pub fn format_result(&self, result: &MeasurementResult) -> FormattedReport {
        let sections = result
            .sections
            .iter()
            .map(|section| FormattedSection {
                name: section.name.clone(),
                area: self.area(section.area_sqft),
                perimeter: self.length(section.perimeter_ft),
                share_pct: round_to_precision(section.share_pct, self.settings.decimal_places),
            })
            .collect();

        let mut warnings = Vec::new();
        if let TerrainStatus::Unavailable { reason } = &result.terrain_status {
            warnings.push(format!("terrain adjustment unavailable: {}", reason));
        }
        if let Some(warning) = &result.accuracy.warning {
            warnings.push(warning.to_string());
        }

        FormattedReport {
            id: result.id.clone(),
            area: self.area(result.area_sqft),
            net_area: self.area(result.net_area_sqft),
            perimeter: self.length(result.perimeter_ft),
            confidence_pct: result.accuracy.confidence_pct(),
            error_margin_pct: round_to_precision(result.accuracy.error_margin_pct, self.settings.decimal_places),
            terrain_status: result.terrain_status.clone(),
            sections,
            warnings,
        }
    }

    /// Multi-line human-readable summary
    pub fn format_text(&self, result: &MeasurementResult) -> String {
        let report = self.format_result(result);
        let mut output = format!("Parcel {}\n", report.id);
        output.push_str(&format!("  Area:       {}\n", report.area));
        if result.total_excluded_sqft() > 0.0 {
            output.push_str(&format!("  Net area:   {}\n", report.net_area));
        }
        output.push_str(&format!("  Perimeter:  {}\n", report.perimeter));
        output.push_str(&format!(
            "  Confidence: {}% (±{}%)\n",
            report.confidence_pct, report.error_margin_pct
        ));
        for section in &report.sections {
            output.push_str(&format!("  - {}: {} ({}%)\n", section.name, section.area, section.share_pct));
        }
        for warning in &report.warnings {
            output.push_str(&format!("  ! {}\n", warning));
        }
        output
    }
}
