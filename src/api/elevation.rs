//! Elevation lookup seam
//!
//! The engine asks for all boundary elevations in a single batched call.

use crate::core::LatLng;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

/// Failure reported by an elevation provider
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ElevationServiceError {
    #[error("elevation service unreachable: {0}")]
    Unreachable(String),

    #[error("elevation service rejected request: {0}")]
    Rejected(String),
}

/// Batched elevation provider
pub trait ElevationService: Send + Sync {
    /// Elevations (m) for `points`, same order and length; `None` where the
    /// provider has no data
    fn fetch_elevations(
        &self,
        points: &[LatLng],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send;
}

type ElevationFn = dyn Fn(&LatLng) -> Option<f64> + Send + Sync;

/// In-process provider computing elevations from a function of position
#[derive(Clone)]
pub struct StaticElevationService {
    lookup: Arc<ElevationFn>,
}

impl StaticElevationService {
    /// Same elevation everywhere
    pub fn uniform(elevation_m: f64) -> Self {
        Self::from_fn(move |_| Some(elevation_m))
    }

    pub fn from_fn<F>(lookup: F) -> Self
    where
        F: Fn(&LatLng) -> Option<f64> + Send + Sync + 'static,
    {
        Self { lookup: Arc::new(lookup) }
    }

    /// Plane rising `meters_per_degree` per degree of latitude from `base_m` at the equator
    pub fn north_slope(base_m: f64, meters_per_degree: f64) -> Self {
        Self::from_fn(move |point| Some(base_m + point.latitude * meters_per_degree))
    }
}

impl std::fmt::Debug for StaticElevationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticElevationService").finish_non_exhaustive()
    }
}

impl ElevationService for StaticElevationService {
    fn fetch_elevations(
        &self,
        points: &[LatLng],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send {
        let elevations = points.iter().map(|point| (self.lookup)(point)).collect();
        std::future::ready(Ok(elevations))
    }
}

/// Provider that always fails
#[derive(Debug, Clone)]
pub struct FailingElevationService {
    error: ElevationServiceError,
}

impl Default for FailingElevationService {
    fn default() -> Self {
        Self::new(ElevationServiceError::Unreachable("service offline".to_string()))
    }
}

impl FailingElevationService {
    pub fn new(error: ElevationServiceError) -> Self {
        Self { error }
    }
}

impl ElevationService for FailingElevationService {
    fn fetch_elevations(
        &self,
        _points: &[LatLng],
    ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send {
        std::future::ready(Err(self.error.clone()))
    }
}
