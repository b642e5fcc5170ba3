//! Dual-pass verification and confidence scoring
//!
//! The second pass reruns the same measurement on the same inputs. It only
//! detects variation in how those inputs were acquired; it does not catch
//! bugs in the deterministic geometry itself.

use crate::api::types::RawMeasurement;
use crate::validation::error::{MeasureError, MeasureResult};
use log::warn;
use serde::{Deserialize, Serialize};

/// Default sanity threshold for inter-pass deviation (%)
pub const DEFAULT_DIVERGENCE_THRESHOLD_PCT: f64 = 5.0;

/// Floor applied to every error margin (%)
pub const MIN_ERROR_MARGIN_PCT: f64 = 1.0;

/// Confidence penalty when passes diverge
const DIVERGENCE_CONFIDENCE_PENALTY: f64 = 0.10;

/// How the boundary vertices were acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum AcquisitionMethod {
    #[default]
    Manual,
    Hybrid,
    AiAssisted,
}

impl AcquisitionMethod {
    pub fn base_confidence(self) -> f64 {
        match self {
            AcquisitionMethod::Manual => 0.70,
            AcquisitionMethod::Hybrid => 0.85,
            AcquisitionMethod::AiAssisted => 0.95,
        }
    }

    pub fn base_error_margin_pct(self) -> f64 {
        match self {
            AcquisitionMethod::Manual => 10.0,
            AcquisitionMethod::Hybrid => 5.0,
            AcquisitionMethod::AiAssisted => 2.0,
        }
    }
}

/// Quality of the imagery the boundary was traced on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ImageryQuality {
    High,
    Medium,
    Low,
}

impl ImageryQuality {
    /// (confidence delta, margin delta in %)
    fn adjustment(self) -> (f64, f64) {
        match self {
            ImageryQuality::High => (0.02, -0.5),
            ImageryQuality::Medium => (0.0, 0.0),
            ImageryQuality::Low => (-0.05, 2.0),
        }
    }
}

/// Acquisition details that feed the confidence model
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct AcquisitionContext {
    pub method: AcquisitionMethod,
    /// Vertices were snapped to detected boundaries
    #[serde(default)]
    pub boundary_snapping: bool,
    #[serde(default)]
    pub imagery_quality: Option<ImageryQuality>,
}

impl AcquisitionContext {
    pub fn new(method: AcquisitionMethod) -> Self {
        Self { method, ..Default::default() }
    }

    pub fn with_boundary_snapping(mut self) -> Self {
        self.boundary_snapping = true;
        self
    }

    pub fn with_imagery_quality(mut self, quality: ImageryQuality) -> Self {
        self.imagery_quality = Some(quality);
        self
    }
}

/// Confidence and error margin attached to a measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccuracyReport {
    /// 0.0 to 1.0
    pub confidence: f64,
    pub error_margin_pct: f64,
    pub verification_passes: u32,
    pub deviation_pct: f64,
    pub method: AcquisitionMethod,
    /// Set when the passes diverged beyond the threshold
    pub warning: Option<MeasureError>,
}

impl AccuracyReport {
    pub fn is_diverged(&self) -> bool {
        self.warning.is_some()
    }

    /// Confidence as a whole percentage (0-100)
    pub fn confidence_pct(&self) -> u8 {
        (self.confidence * 100.0).round().clamp(0.0, 100.0) as u8
    }
}

/// `|a2 - a1| / a1 · 100`; 0 when both are zero, 100 when only the first is
pub fn deviation_pct(first_area: f64, second_area: f64) -> f64 {
    if first_area == 0.0 {
        return if second_area == 0.0 { 0.0 } else { 100.0 };
    }
    (second_area - first_area).abs() / first_area.abs() * 100.0
}

/// Method base values plus additive adjustments, clamped
pub fn confidence_and_margin(context: &AcquisitionContext, terrain_applied: bool) -> (f64, f64) {
    let mut confidence = context.method.base_confidence();
    let mut margin = context.method.base_error_margin_pct();

    if context.boundary_snapping {
        confidence += 0.05;
        margin -= 1.0;
    }
    if terrain_applied {
        confidence += 0.03;
        margin -= 0.5;
    }
    if let Some(quality) = context.imagery_quality {
        let (dc, dm) = quality.adjustment();
        confidence += dc;
        margin += dm;
    }

    (confidence.clamp(0.0, 1.0), margin.max(MIN_ERROR_MARGIN_PCT))
}

/// Runs and scores the verification pass
#[derive(Debug, Clone, Copy)]
pub struct Verifier {
    divergence_threshold_pct: f64,
}

impl Default for Verifier {
    fn default() -> Self {
        Self { divergence_threshold_pct: DEFAULT_DIVERGENCE_THRESHOLD_PCT }
    }
}

impl Verifier {
    pub fn new(divergence_threshold_pct: f64) -> Self {
        Self { divergence_threshold_pct }
    }

    pub fn divergence_threshold_pct(&self) -> f64 {
        self.divergence_threshold_pct
    }

    /// Run `recompute` as the second pass and score it against `first_pass`
    pub fn verify<F>(
        &self,
        first_pass: &RawMeasurement,
        context: &AcquisitionContext,
        recompute: F,
    ) -> MeasureResult<AccuracyReport>
    where
        F: FnOnce() -> MeasureResult<RawMeasurement>,
    {
        let second_pass = recompute()?;
        Ok(self.assess(first_pass, &second_pass, context))
    }

    /// Run both passes concurrently; returns the first pass and its report
    pub fn verify_concurrent<F>(
        &self,
        context: &AcquisitionContext,
        pass: F,
    ) -> MeasureResult<(RawMeasurement, AccuracyReport)>
    where
        F: Fn() -> MeasureResult<RawMeasurement> + Sync,
    {
        let (first, second) = rayon::join(&pass, &pass);
        let (first, second) = (first?, second?);
        let report = self.assess(&first, &second, context);
        Ok((first, report))
    }

    /// Score two completed passes
    pub fn assess(
        &self,
        first_pass: &RawMeasurement,
        second_pass: &RawMeasurement,
        context: &AcquisitionContext,
    ) -> AccuracyReport {
        let deviation = deviation_pct(first_pass.area_sqft, second_pass.area_sqft);
        let (mut confidence, mut margin) = confidence_and_margin(context, first_pass.terrain_applied());

        let warning = if deviation > self.divergence_threshold_pct {
            warn!(
                "verification passes diverged by {:.3}% (threshold {:.3}%)",
                deviation, self.divergence_threshold_pct
            );
            confidence = (confidence - DIVERGENCE_CONFIDENCE_PENALTY).clamp(0.0, 1.0);
            margin = margin.max(deviation);
            Some(MeasureError::VerificationDivergence {
                deviation_pct: deviation,
                threshold_pct: self.divergence_threshold_pct,
            })
        } else {
            None
        };

        AccuracyReport {
            confidence,
            error_margin_pct: margin,
            verification_passes: 2,
            deviation_pct: deviation,
            method: context.method,
            warning,
        }
    }
}
