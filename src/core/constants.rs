//! Physical constants and unit conversion factors

/// Mean Earth radius used by the projection and haversine formulas (m)
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Square meters to square feet
pub const SQM_TO_SQFT: f64 = 10.7639;

/// Meters to feet
pub const M_TO_FT: f64 = 3.28084;

/// Consecutive vertices closer than this (degrees) are merged
pub const DEFAULT_DUPLICATE_TOLERANCE_DEG: f64 = 1e-6;

/// Slope is clamped here before computing the correction factor (degrees)
pub const MAX_SLOPE_DEG: f64 = 89.0;

/// Terrain class boundaries (degrees)
pub const FLAT_SLOPE_LIMIT_DEG: f64 = 2.0;
pub const GENTLE_SLOPE_LIMIT_DEG: f64 = 8.0;
pub const MODERATE_SLOPE_LIMIT_DEG: f64 = 15.0;
