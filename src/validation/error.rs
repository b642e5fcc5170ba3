use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Result type for measurement operations
pub type MeasureResult<T> = Result<T, MeasureError>;

/// Error classification for the measurement engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Error)]
pub enum MeasureError {
    /// Boundary cannot be measured (too few vertices, bad coordinates, self-intersection)
    #[error("invalid polygon: {issue}")]
    InvalidPolygon { issue: PolygonIssue },

    /// Ear clipping found no ear and the fallback was disabled
    #[error("triangulation stalled with {remaining} vertices remaining")]
    DegenerateTriangle { remaining: usize },

    /// Elevation data missing for terrain adjustment
    #[error("elevation unavailable: {reason}")]
    ElevationUnavailable { reason: String },

    /// Verification passes disagree by more than the sanity threshold
    #[error("verification passes diverged by {deviation_pct:.3}% (threshold {threshold_pct:.3}%)")]
    VerificationDivergence { deviation_pct: f64, threshold_pct: f64 },
}

/// Specific reasons a polygon is rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum PolygonIssue {
    TooFewVertices { unique: usize },
    CoordinateOutOfRange { index: usize, latitude: f64, longitude: f64 },
    NonFiniteCoordinate { index: usize },
    SelfIntersecting { first_edge: usize, second_edge: usize },
}

/// Error severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Measurement cannot be produced
    Critical,
    /// Measurement can be produced in degraded form if the caller opts in
    Degraded,
    /// Measurement is produced; confidence is lowered
    Warning,
}

impl MeasureError {
    /// Shorthand for an `InvalidPolygon` error
    pub fn invalid_polygon(issue: PolygonIssue) -> Self {
        MeasureError::InvalidPolygon { issue }
    }

    /// Shorthand for an `ElevationUnavailable` error
    pub fn elevation_unavailable(reason: impl Into<String>) -> Self {
        MeasureError::ElevationUnavailable { reason: reason.into() }
    }

    /// Stable name of the error kind, used for logging and reports
    pub fn kind_name(&self) -> &'static str {
        match self {
            MeasureError::InvalidPolygon { .. } => "InvalidPolygon",
            MeasureError::DegenerateTriangle { .. } => "DegenerateTriangle",
            MeasureError::ElevationUnavailable { .. } => "ElevationUnavailable",
            MeasureError::VerificationDivergence { .. } => "VerificationDivergence",
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            MeasureError::InvalidPolygon { .. } => ErrorSeverity::Critical,
            MeasureError::DegenerateTriangle { .. } => ErrorSeverity::Critical,
            MeasureError::ElevationUnavailable { .. } => ErrorSeverity::Degraded,
            MeasureError::VerificationDivergence { .. } => ErrorSeverity::Warning,
        }
    }

    /// Whether a measurement can still be returned after this error
    pub fn is_recoverable(&self) -> bool {
        self.severity() != ErrorSeverity::Critical
    }
}

impl fmt::Display for PolygonIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PolygonIssue::TooFewVertices { unique } => {
                write!(f, "{} unique vertices, at least 3 required", unique)
            }
            PolygonIssue::CoordinateOutOfRange { index, latitude, longitude } => {
                write!(f, "vertex {} out of range ({:.7}, {:.7})", index, latitude, longitude)
            }
            PolygonIssue::NonFiniteCoordinate { index } => {
                write!(f, "vertex {} is not a finite coordinate", index)
            }
            PolygonIssue::SelfIntersecting { first_edge, second_edge } => {
                write!(f, "edges {} and {} intersect", first_edge, second_edge)
            }
        }
    }
}
