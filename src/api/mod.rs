//! Measurement API: request/result types, units, formatting, export and the engine

pub mod elevation;
pub mod engine;
pub mod export;
pub mod formatting;
pub mod types;
pub mod units;

// Re-export commonly used API types
pub use elevation::{ElevationService, ElevationServiceError, FailingElevationService, StaticElevationService};
pub use engine::{measure_pass, MeasurementEngine};
pub use export::{CsvExporter, ExportError, ExportResult, JsonExporter, MarkupExporter};
pub use formatting::{format_area, format_length, FormattedMeasurement, FormattedReport, MeasurementFormatter};
pub use types::{
    DisplayLocale, ExclusionKind, MeasurementRequest, MeasurementResult, PrecisionSettings, RawMeasurement,
    SectionBreakdown, TerrainStatus,
};
pub use units::{AreaUnit, LinearUnit};
