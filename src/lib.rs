//! Parcel Measurement Engine
//!
//! Measures land parcels from boundary vertices: planar area, perimeter,
//! terrain-adjusted surface area, a verification pass with a confidence
//! model, and unit-aware formatting and export.

pub mod core;
pub mod algorithms;
pub mod validation;
pub mod api;
pub mod utils;

// Re-export commonly used types
pub use self::core::{Coordinate, LatLng, Polygon, Triangle, EARTH_RADIUS_M};
pub use algorithms::{TerrainClass, TerrainProfile, Triangulator};
pub use validation::{AccuracyReport, AcquisitionContext, AcquisitionMethod, ImageryQuality, MeasureError, MeasureResult};
pub use api::{
    AreaUnit, CsvExporter, ElevationService, FormattedMeasurement, JsonExporter, LinearUnit, MarkupExporter,
    MeasurementEngine, MeasurementFormatter, MeasurementRequest, MeasurementResult, PrecisionSettings, TerrainStatus,
};
pub use utils::{ConfigurationManager, EngineConfig};
