//! Measurement pipeline
//!
//! validation → triangulation → {area, terrain} → verification → result.
//! The only suspension point is the batched elevation lookup in
//! [`MeasurementEngine::measure`], which needs a tokio runtime with the time
//! driver enabled.

use crate::algorithms::{perimeter_ft, planar_area_sqft, surface_area_3d, terrain_profile_with_limit, triangulate};
use crate::api::elevation::ElevationService;
use crate::api::types::{
    ExclusionKind, MeasurementRequest, MeasurementResult, PrecisionSettings, RawMeasurement, SectionBreakdown,
    TerrainStatus,
};
use crate::api::units::{AreaUnit, LinearUnit};
use crate::core::{Polygon, MAX_SLOPE_DEG};
use crate::utils::config::EngineConfig;
use crate::validation::accuracy::Verifier;
use crate::validation::error::{MeasureError, MeasureResult};
use log::{debug, warn};
use rayon::prelude::*;
use std::collections::BTreeMap;

/// One full measurement pass over `boundary`.
///
/// With `use_terrain` every vertex must carry an elevation; the reported area
/// is then the 3D surface area. Otherwise it is the planar area.
pub fn measure_pass(boundary: &Polygon, use_terrain: bool) -> MeasureResult<RawMeasurement> {
    measure_pass_with_limit(boundary, use_terrain, MAX_SLOPE_DEG)
}

fn measure_pass_with_limit(boundary: &Polygon, use_terrain: bool, max_slope_deg: f64) -> MeasureResult<RawMeasurement> {
    let area_2d_sqft = planar_area_sqft(boundary.vertices())?;
    let perimeter_ft = perimeter_ft(boundary.vertices());

    if !use_terrain {
        return Ok(RawMeasurement {
            area_2d_sqft,
            area_sqft: area_2d_sqft,
            perimeter_ft,
            terrain: None,
        });
    }

    let triangles = triangulate(boundary)?;
    let profile = terrain_profile_with_limit(boundary.vertices(), max_slope_deg)?;
    let area_sqft = surface_area_3d(&triangles)?;

    Ok(RawMeasurement {
        area_2d_sqft,
        area_sqft,
        perimeter_ft,
        terrain: Some(profile),
    })
}

/// Engine handle; holds configuration only, no per-measurement state
#[derive(Debug, Clone, Default)]
pub struct MeasurementEngine {
    config: EngineConfig,
}

impl MeasurementEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn precision(&self) -> &PrecisionSettings {
        &self.config.precision
    }

    /// Replace the precision settings between calls, returning the previous ones
    pub fn set_precision(&mut self, precision: PrecisionSettings) -> PrecisionSettings {
        std::mem::replace(&mut self.config.precision, precision)
    }

    fn verifier(&self) -> Verifier {
        Verifier::new(self.config.divergence_threshold_pct)
    }

    /// Measure a request, fetching boundary elevations from `service` in one batch
    pub async fn measure<S: ElevationService>(
        &self,
        request: &MeasurementRequest,
        service: &S,
    ) -> MeasureResult<MeasurementResult> {
        let boundary = self.prepare_boundary(request)?;

        let (boundary, terrain_status) = if !self.config.precision.use_3d {
            (boundary, TerrainStatus::Disabled)
        } else if boundary.has_elevation() {
            (boundary, TerrainStatus::Applied)
        } else {
            let fetched = self.fetch_boundary_elevations(&boundary, service).await;
            self.settle_elevations(&request.id, boundary, fetched)?
        };

        self.complete(request, boundary, terrain_status)
    }

    /// Measure without an elevation service; terrain runs only when every
    /// boundary vertex already carries an elevation
    pub fn measure_offline(&self, request: &MeasurementRequest) -> MeasureResult<MeasurementResult> {
        let boundary = self.prepare_boundary(request)?;

        let (boundary, terrain_status) = if !self.config.precision.use_3d {
            (boundary, TerrainStatus::Disabled)
        } else if boundary.has_elevation() {
            (boundary, TerrainStatus::Applied)
        } else {
            let missing = Err(MeasureError::elevation_unavailable(
                "boundary has no elevations and no elevation service was given",
            ));
            self.settle_elevations(&request.id, boundary, missing)?
        };

        self.complete(request, boundary, terrain_status)
    }

    /// Measure many requests in parallel; results keep the input order
    pub fn measure_batch_offline(&self, requests: &[MeasurementRequest]) -> Vec<MeasureResult<MeasurementResult>> {
        requests.par_iter().map(|request| self.measure_offline(request)).collect()
    }

    /// Re-apply the configured duplicate tolerance to the request boundary
    fn prepare_boundary(&self, request: &MeasurementRequest) -> MeasureResult<Polygon> {
        debug!("measuring {} ({} vertices)", request.id, request.boundary.vertex_count());
        self.renormalize(&request.boundary)
    }

    fn renormalize(&self, polygon: &Polygon) -> MeasureResult<Polygon> {
        Polygon::with_tolerance(polygon.vertices().to_vec(), self.config.duplicate_tolerance_deg)
    }

    async fn fetch_boundary_elevations<S: ElevationService>(&self, boundary: &Polygon, service: &S) -> MeasureResult<Polygon> {
        let points = boundary.lat_lngs();
        let fetched = tokio::time::timeout(self.config.elevation_timeout(), service.fetch_elevations(&points))
            .await
            .map_err(|_| {
                MeasureError::elevation_unavailable(format!(
                    "elevation lookup timed out after {} ms",
                    self.config.elevation_timeout_ms
                ))
            })?
            .map_err(|e| MeasureError::elevation_unavailable(e.to_string()))?;

        if fetched.len() != points.len() {
            return Err(MeasureError::elevation_unavailable(format!(
                "elevation service returned {} values for {} points",
                fetched.len(),
                points.len()
            )));
        }

        let elevations = fetched
            .into_iter()
            .enumerate()
            .map(|(index, elevation)| {
                elevation.ok_or_else(|| MeasureError::elevation_unavailable(format!("no elevation for vertex {}", index)))
            })
            .collect::<MeasureResult<Vec<f64>>>()?;

        boundary.with_elevations(&elevations)
    }

    /// Turn an elevation outcome into the boundary to measure, applying the
    /// 2D fallback when configured
    fn settle_elevations(
        &self,
        id: &str,
        flat_boundary: Polygon,
        outcome: MeasureResult<Polygon>,
    ) -> MeasureResult<(Polygon, TerrainStatus)> {
        match outcome {
            Ok(elevated) => Ok((elevated, TerrainStatus::Applied)),
            Err(MeasureError::ElevationUnavailable { reason }) if self.config.allow_2d_fallback => {
                warn!("{}: terrain adjustment skipped, {}", id, reason);
                Ok((flat_boundary, TerrainStatus::Unavailable { reason }))
            }
            Err(e) => Err(e),
        }
    }

    fn complete(
        &self,
        request: &MeasurementRequest,
        boundary: Polygon,
        terrain_status: TerrainStatus,
    ) -> MeasureResult<MeasurementResult> {
        let use_terrain = terrain_status == TerrainStatus::Applied;
        let max_slope_deg = self.config.max_slope_deg;

        let (raw, accuracy) = self
            .verifier()
            .verify_concurrent(&request.context, || measure_pass_with_limit(&boundary, use_terrain, max_slope_deg))?;

        let sections = request
            .sections
            .iter()
            .map(|section| {
                let polygon = self.renormalize(&section.polygon)?;
                let area_sqft = planar_area_sqft(polygon.vertices())?;
                Ok(SectionBreakdown {
                    name: section.name.clone(),
                    area_sqft,
                    perimeter_ft: perimeter_ft(polygon.vertices()),
                    vertex_count: polygon.vertex_count(),
                    share_pct: share_pct(area_sqft, raw.area_2d_sqft),
                })
            })
            .collect::<MeasureResult<Vec<_>>>()?;

        let mut excluded: BTreeMap<ExclusionKind, f64> = BTreeMap::new();
        for exclusion in &request.exclusions {
            let polygon = self.renormalize(&exclusion.polygon)?;
            *excluded.entry(exclusion.kind).or_insert(0.0) += planar_area_sqft(polygon.vertices())?;
        }
        let net_area_sqft = (raw.area_sqft - excluded.values().sum::<f64>()).max(0.0);

        debug!(
            "measured {}: {:.2} sq ft ({:.2} sq ft planar), deviation {:.4}%",
            request.id, raw.area_sqft, raw.area_2d_sqft, accuracy.deviation_pct
        );

        Ok(MeasurementResult {
            id: request.id.clone(),
            area_sqft: raw.area_sqft,
            area_sqm: AreaUnit::SquareMeters.from_square_feet(raw.area_sqft),
            area_2d_sqft: raw.area_2d_sqft,
            net_area_sqft,
            perimeter_ft: raw.perimeter_ft,
            perimeter_m: LinearUnit::Meters.from_feet(raw.perimeter_ft),
            terrain: raw.terrain,
            terrain_status,
            accuracy,
            sections,
            excluded,
            boundary,
        })
    }
}

fn share_pct(part: f64, whole: f64) -> f64 {
    if whole > 0.0 {
        part / whole * 100.0
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{irregular_lot, square};
    use crate::api::elevation::{ElevationServiceError, FailingElevationService, StaticElevationService};
    use crate::core::{Coordinate, LatLng};
    use crate::validation::accuracy::{AcquisitionContext, AcquisitionMethod};
    use std::future::Future;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    /// Counts batched calls and forwards to a static service
    struct CountingService {
        inner: StaticElevationService,
        calls: AtomicUsize,
        points_seen: AtomicUsize,
    }

    impl CountingService {
        fn uniform(elevation_m: f64) -> Self {
            Self {
                inner: StaticElevationService::uniform(elevation_m),
                calls: AtomicUsize::new(0),
                points_seen: AtomicUsize::new(0),
            }
        }
    }

    impl ElevationService for CountingService {
        fn fetch_elevations(
            &self,
            points: &[LatLng],
        ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.points_seen.fetch_add(points.len(), Ordering::SeqCst);
            self.inner.fetch_elevations(points)
        }
    }

    /// Never answers within any reasonable timeout
    struct SlowService;

    impl ElevationService for SlowService {
        fn fetch_elevations(
            &self,
            points: &[LatLng],
        ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send {
            let count = points.len();
            async move {
                tokio::time::sleep(Duration::from_secs(30)).await;
                Ok(vec![Some(0.0); count])
            }
        }
    }

    /// Returns one value fewer than requested
    struct ShortService;

    impl ElevationService for ShortService {
        fn fetch_elevations(
            &self,
            points: &[LatLng],
        ) -> impl Future<Output = Result<Vec<Option<f64>>, ElevationServiceError>> + Send {
            std::future::ready(Ok(vec![Some(1.0); points.len() - 1]))
        }
    }

    fn request(id: &str, side_m: f64) -> MeasurementRequest {
        MeasurementRequest::new(id, Polygon::new(square(39.74, -104.99, side_m)).unwrap())
    }

    fn flat_engine() -> MeasurementEngine {
        MeasurementEngine::new(EngineConfig::default().with_precision(PrecisionSettings::new().with_3d(false)))
    }

    #[test]
    fn test_hundred_foot_square() {
        let result = flat_engine().measure_offline(&request("square", 30.48)).unwrap();
        assert!((result.area_sqft - 10_000.0).abs() / 10_000.0 < 0.005, "area {}", result.area_sqft);
        assert!((result.perimeter_ft - 400.0).abs() / 400.0 < 0.005, "perimeter {}", result.perimeter_ft);
        assert!((result.area_sqm - result.area_sqft * 0.092903).abs() < 1e-9);
        assert!((result.perimeter_m - result.perimeter_ft * 0.3048).abs() < 1e-9);
        assert_eq!(result.terrain, None);
        assert_eq!(result.terrain_status, TerrainStatus::Disabled);
        assert_eq!(result.area_sqft, result.area_2d_sqft);
    }

    #[test]
    fn test_near_duplicate_vertex_tenth_acre_lot() {
        // 0.1 acre = 4356 ft² ≈ 404.69 m², a square of ~20.117 m
        let corners = square(39.74, -104.99, 20.1168);
        let mut with_duplicate = corners.clone();
        with_duplicate.insert(
            2,
            Coordinate::new(corners[1].latitude + 5e-8, corners[1].longitude - 5e-8),
        );

        let engine = flat_engine();
        let clean = engine
            .measure_offline(&MeasurementRequest::new("clean", Polygon::new(corners).unwrap()))
            .unwrap();
        let noisy = engine
            .measure_offline(&MeasurementRequest::new("noisy", Polygon::new(with_duplicate).unwrap()))
            .unwrap();

        assert_eq!(noisy.vertex_count(), 4);
        assert_eq!(noisy.area_sqft, clean.area_sqft);
        assert!((clean.area_sqft - 4_356.0).abs() / 4_356.0 < 0.005, "area {}", clean.area_sqft);
    }

    #[test]
    fn test_sections_and_exclusions() {
        let boundary = Polygon::new(square(39.74, -104.99, 30.48)).unwrap();
        let quarter = Polygon::new(square(39.74, -104.99, 15.24)).unwrap();
        let shed = Polygon::new(square(39.7401, -104.9899, 3.0)).unwrap();
        let request = MeasurementRequest::new("lot", boundary)
            .with_section("south-west corner", quarter.clone())
            .with_exclusion(ExclusionKind::Building, shed.clone())
            .with_exclusion(ExclusionKind::Building, shed)
            .with_exclusion(ExclusionKind::Pool, quarter);

        let result = flat_engine().measure_offline(&request).unwrap();

        assert_eq!(result.sections.len(), 1);
        let section = &result.sections[0];
        assert!((section.share_pct - 25.0).abs() < 0.1, "share {}", section.share_pct);
        assert_eq!(section.vertex_count, 4);

        assert_eq!(result.excluded.len(), 2);
        let building = result.excluded[&ExclusionKind::Building];
        assert!((building - 2.0 * 9.0 * 10.7639).abs() < 1.0, "building {}", building);
        assert!((result.net_area_sqft - (result.area_sqft - result.total_excluded_sqft())).abs() < 1e-9);
    }

    #[test]
    fn test_duplicate_tolerance_applies_to_sections_and_exclusions() {
        let corners = square(39.74, -104.99, 15.24);
        let mut jittered = corners.clone();
        jittered.insert(
            2,
            Coordinate::new(corners[1].latitude + 5e-6, corners[1].longitude - 5e-6),
        );
        let jittered = Polygon::new(jittered).unwrap();
        assert_eq!(jittered.vertex_count(), 5);

        let request = MeasurementRequest::new("lot", Polygon::new(square(39.74, -104.99, 30.48)).unwrap())
            .with_section("corner", jittered.clone())
            .with_exclusion(ExclusionKind::Driveway, jittered);

        let loose = MeasurementEngine::new(
            EngineConfig::default()
                .with_precision(PrecisionSettings::new().with_3d(false))
                .with_duplicate_tolerance_deg(1e-5),
        );
        let result = loose.measure_offline(&request).unwrap();
        assert_eq!(result.sections[0].vertex_count, 4);

        let clean = Polygon::new(corners).unwrap();
        let expected = planar_area_sqft(clean.vertices()).unwrap();
        assert_eq!(result.sections[0].area_sqft, expected);
        assert_eq!(result.excluded[&ExclusionKind::Driveway], expected);

        let strict = flat_engine().measure_offline(&request).unwrap();
        assert_eq!(strict.sections[0].vertex_count, 5);
    }

    #[test]
    fn test_net_area_floors_at_zero() {
        let boundary = Polygon::new(square(10.0, 10.0, 10.0)).unwrap();
        let request = MeasurementRequest::new("tiny", boundary.clone())
            .with_exclusion(ExclusionKind::Other, boundary.clone())
            .with_exclusion(ExclusionKind::Patio, boundary);
        let result = flat_engine().measure_offline(&request).unwrap();
        assert_eq!(result.net_area_sqft, 0.0);
    }

    #[test]
    fn test_offline_terrain_with_embedded_elevations() {
        let boundary = Polygon::new(square(39.74, -104.99, 30.48))
            .unwrap()
            .with_elevations(&[100.0, 100.0, 110.0, 110.0])
            .unwrap();
        let request = MeasurementRequest::new("hill", boundary)
            .with_context(AcquisitionContext::new(AcquisitionMethod::Hybrid));
        let result = MeasurementEngine::default().measure_offline(&request).unwrap();

        assert_eq!(result.terrain_status, TerrainStatus::Applied);
        let terrain = result.terrain.as_ref().unwrap();
        assert!(terrain.correction_factor > 1.0);
        assert!(result.area_sqft > result.area_2d_sqft);
        assert!((result.accuracy.confidence - 0.88).abs() < 1e-12);
        assert!((result.accuracy.error_margin_pct - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_offline_without_elevations_requires_fallback() {
        let strict = MeasurementEngine::default();
        let result = strict.measure_offline(&request("flat", 20.0));
        assert!(matches!(result, Err(MeasureError::ElevationUnavailable { .. })));

        let lenient = MeasurementEngine::new(EngineConfig::default().with_2d_fallback(true));
        let result = lenient.measure_offline(&request("flat", 20.0)).unwrap();
        assert!(result.terrain.is_none());
        assert!(matches!(result.terrain_status, TerrainStatus::Unavailable { .. }));
    }

    #[tokio::test]
    async fn test_measure_uses_one_batched_lookup() {
        let service = CountingService::uniform(50.0);
        let engine = MeasurementEngine::default();
        let lot = MeasurementRequest::new("irregular", irregular_lot());

        let result = engine.measure(&lot, &service).await.unwrap();

        assert_eq!(service.calls.load(Ordering::SeqCst), 1);
        assert_eq!(service.points_seen.load(Ordering::SeqCst), 6);
        assert_eq!(result.terrain_status, TerrainStatus::Applied);
        let terrain = result.terrain.as_ref().unwrap();
        assert_eq!(terrain.slope_degrees, 0.0);
        assert!((result.area_sqft - result.area_2d_sqft).abs() / result.area_2d_sqft < 1e-4);
        assert!(result.boundary.has_elevation());
        assert_eq!(result.accuracy.deviation_pct, 0.0);
    }

    #[tokio::test]
    async fn test_measure_timeout() {
        let config = EngineConfig::default().with_elevation_timeout_ms(20);
        let result = MeasurementEngine::new(config.clone()).measure(&request("slow", 20.0), &SlowService).await;
        match result {
            Err(MeasureError::ElevationUnavailable { reason }) => assert!(reason.contains("timed out")),
            other => panic!("expected timeout, got {:?}", other),
        }

        let fallback = MeasurementEngine::new(config.with_2d_fallback(true));
        let result = fallback.measure(&request("slow", 20.0), &SlowService).await.unwrap();
        assert!(matches!(result.terrain_status, TerrainStatus::Unavailable { .. }));
        assert!(result.area_sqft > 0.0);
    }

    #[tokio::test]
    async fn test_measure_service_failures() {
        let engine = MeasurementEngine::default();
        let failing = engine.measure(&request("down", 20.0), &FailingElevationService::default()).await;
        assert!(matches!(failing, Err(MeasureError::ElevationUnavailable { .. })));

        let short = engine.measure(&request("short", 20.0), &ShortService).await;
        assert!(matches!(short, Err(MeasureError::ElevationUnavailable { .. })));

        let gaps = StaticElevationService::from_fn(|p| (p.longitude <= -104.99).then_some(1.0));
        let partial = engine.measure(&request("gaps", 20.0), &gaps).await;
        assert!(matches!(partial, Err(MeasureError::ElevationUnavailable { .. })));
    }

    #[tokio::test]
    async fn test_measure_with_3d_disabled_skips_lookup() {
        let service = CountingService::uniform(10.0);
        let result = flat_engine().measure(&request("flat", 20.0), &service).await.unwrap();
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(result.terrain_status, TerrainStatus::Disabled);
    }

    #[test]
    fn test_batch_preserves_order() {
        let requests: Vec<MeasurementRequest> =
            (1..=8).map(|i| request(&format!("lot-{}", i), 10.0 * i as f64)).collect();
        let results = flat_engine().measure_batch_offline(&requests);
        assert_eq!(results.len(), 8);
        let mut previous = 0.0;
        for (request, result) in requests.iter().zip(&results) {
            let result = result.as_ref().unwrap();
            assert_eq!(result.id, request.id);
            assert!(result.area_sqft > previous);
            previous = result.area_sqft;
        }
    }

    #[test]
    fn test_set_precision_returns_previous() {
        let mut engine = MeasurementEngine::default();
        let previous = engine.set_precision(PrecisionSettings::new().with_decimal_places(4));
        assert_eq!(previous.decimal_places, 2);
        assert_eq!(engine.precision().decimal_places, 4);
    }

    #[test]
    fn test_measure_pass_is_deterministic() {
        let polygon = irregular_lot();
        let first = measure_pass(&polygon, false).unwrap();
        let second = measure_pass(&polygon, false).unwrap();
        assert_eq!(first, second);
        assert!(matches!(
            measure_pass(&polygon, true),
            Err(MeasureError::ElevationUnavailable { .. })
        ));
    }
}
