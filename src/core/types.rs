//! Core data types for parcel measurement

use crate::algorithms::{area, perimeter};
use crate::core::constants::DEFAULT_DUPLICATE_TOLERANCE_DEG;
use crate::validation::error::{MeasureError, MeasureResult};
use crate::validation::polygon::normalize_vertices;
use serde::{Deserialize, Serialize};

/// Geodetic vertex with optional elevation (meters above datum)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elevation: Option<f64>,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude, elevation: None }
    }

    pub fn with_elevation(mut self, elevation: f64) -> Self {
        self.elevation = Some(elevation);
        self
    }

    pub fn lat_lng(&self) -> LatLng {
        LatLng { latitude: self.latitude, longitude: self.longitude }
    }

    pub fn lat_rad(&self) -> f64 {
        self.latitude.to_radians()
    }

    pub fn lng_rad(&self) -> f64 {
        self.longitude.to_radians()
    }

    /// Both axes within `tolerance_deg` of `other`
    pub fn coincides_with(&self, other: &Coordinate, tolerance_deg: f64) -> bool {
        (self.latitude - other.latitude).abs() <= tolerance_deg
            && (self.longitude - other.longitude).abs() <= tolerance_deg
    }
}

/// Horizontal position, the key used for elevation lookups
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

/// Simple, implicitly closed boundary with at least 3 distinct vertices.
///
/// Only constructible through validation, so every `Polygon` in the crate
/// is measurable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Coordinate>", into = "Vec<Coordinate>")]
pub struct Polygon {
    vertices: Vec<Coordinate>,
}

impl Polygon {
    /// Validate vertices with the default near-duplicate tolerance
    pub fn new(vertices: Vec<Coordinate>) -> MeasureResult<Self> {
        Self::with_tolerance(vertices, DEFAULT_DUPLICATE_TOLERANCE_DEG)
    }

    /// Validate vertices, merging consecutive vertices closer than `tolerance_deg`
    pub fn with_tolerance(vertices: Vec<Coordinate>, tolerance_deg: f64) -> MeasureResult<Self> {
        let vertices = normalize_vertices(vertices, tolerance_deg)?;
        Ok(Self { vertices })
    }

    /// Build from `(latitude, longitude)` pairs
    pub fn from_lat_lng(points: &[(f64, f64)]) -> MeasureResult<Self> {
        Self::new(points.iter().map(|&(lat, lng)| Coordinate::new(lat, lng)).collect())
    }

    pub fn vertices(&self) -> &[Coordinate] {
        &self.vertices
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn lat_lngs(&self) -> Vec<LatLng> {
        self.vertices.iter().map(Coordinate::lat_lng).collect()
    }

    /// Every vertex carries an elevation
    pub fn has_elevation(&self) -> bool {
        self.vertices.iter().all(|v| v.elevation.is_some())
    }

    /// Copy of this polygon with one elevation per vertex, in vertex order
    pub fn with_elevations(&self, elevations: &[f64]) -> MeasureResult<Self> {
        if elevations.len() != self.vertices.len() {
            return Err(MeasureError::elevation_unavailable(format!(
                "expected {} elevations, got {}",
                self.vertices.len(),
                elevations.len()
            )));
        }
        if let Some(index) = elevations.iter().position(|e| !e.is_finite()) {
            return Err(MeasureError::elevation_unavailable(format!(
                "elevation for vertex {} is not finite",
                index
            )));
        }
        let vertices = self
            .vertices
            .iter()
            .zip(elevations)
            .map(|(v, &e)| v.with_elevation(e))
            .collect();
        Ok(Self { vertices })
    }

    /// Same boundary traversed in the opposite direction
    pub fn reversed(&self) -> Self {
        let mut vertices = self.vertices.clone();
        vertices.reverse();
        Self { vertices }
    }

    /// Same boundary starting at vertex `k`
    pub fn rotated(&self, k: usize) -> Self {
        let mut vertices = self.vertices.clone();
        let len = vertices.len();
        vertices.rotate_left(k % len);
        Self { vertices }
    }

    /// Planar (2D) area in square feet
    pub fn area_sqft(&self) -> f64 {
        area::shoelace_area_sqft(&self.vertices)
    }

    /// Closed-loop perimeter in feet
    pub fn perimeter_ft(&self) -> f64 {
        perimeter::perimeter_ft(&self.vertices)
    }
}

impl TryFrom<Vec<Coordinate>> for Polygon {
    type Error = MeasureError;

    fn try_from(vertices: Vec<Coordinate>) -> Result<Self, Self::Error> {
        Polygon::new(vertices)
    }
}

impl From<Polygon> for Vec<Coordinate> {
    fn from(polygon: Polygon) -> Self {
        polygon.vertices
    }
}

/// Three polygon vertices; produced only by the triangulator
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Triangle {
    vertices: [Coordinate; 3],
}

impl Triangle {
    pub(crate) fn new(a: Coordinate, b: Coordinate, c: Coordinate) -> Self {
        Self { vertices: [a, b, c] }
    }

    pub fn vertices(&self) -> &[Coordinate; 3] {
        &self.vertices
    }

    pub fn has_elevation(&self) -> bool {
        self.vertices.iter().all(|v| v.elevation.is_some())
    }

    /// Area in square feet within the given polygon's projection plane
    pub fn planar_area_sqft(&self, projection: &area::LocalProjection) -> f64 {
        projection.area_sqft(&self.vertices)
    }
}
