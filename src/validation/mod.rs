//! Boundary validation, error model and verification

pub mod accuracy;
pub mod error;
pub mod polygon;

pub use accuracy::{AccuracyReport, AcquisitionContext, AcquisitionMethod, ImageryQuality, Verifier};
pub use error::{ErrorSeverity, MeasureError, MeasureResult, PolygonIssue};
