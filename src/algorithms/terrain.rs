//! Terrain adjustment: slope, aspect, correction factor and exact 3D surface area
//!
//! Every computation here requires an elevation on every vertex. A missing
//! elevation is an `ElevationUnavailable` error; it is never read as zero.

use crate::algorithms::area::LocalProjection;
use crate::algorithms::perimeter::haversine_distance_m;
use crate::core::{
    Coordinate, Triangle, EARTH_RADIUS_M, FLAT_SLOPE_LIMIT_DEG, GENTLE_SLOPE_LIMIT_DEG, MAX_SLOPE_DEG,
    MODERATE_SLOPE_LIMIT_DEG, SQM_TO_SQFT,
};
use crate::validation::error::{MeasureError, MeasureResult, PolygonIssue};
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Coarse terrain classification by mean slope
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TerrainClass {
    /// Below 2°
    Flat,
    /// 2° to 8°
    Gentle,
    /// 8° to 15°
    Moderate,
    /// 15° and above
    Steep,
}

impl TerrainClass {
    pub fn from_slope(slope_degrees: f64) -> Self {
        if slope_degrees < FLAT_SLOPE_LIMIT_DEG {
            TerrainClass::Flat
        } else if slope_degrees < GENTLE_SLOPE_LIMIT_DEG {
            TerrainClass::Gentle
        } else if slope_degrees < MODERATE_SLOPE_LIMIT_DEG {
            TerrainClass::Moderate
        } else {
            TerrainClass::Steep
        }
    }
}

/// Derived terrain summary for one measurement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainProfile {
    /// Mean edge slope (degrees)
    pub slope_degrees: f64,
    /// Compass bearing from the lowest to the highest vertex (degrees, [0, 360))
    pub aspect_degrees: f64,
    /// Lowest vertex elevation (m)
    pub elevation_min: f64,
    /// Highest vertex elevation (m)
    pub elevation_max: f64,
    /// Flat-to-inclined area multiplier, always >= 1
    pub correction_factor: f64,
    pub terrain_class: TerrainClass,
}

impl TerrainProfile {
    /// Elevation range across the boundary (m)
    pub fn relief_m(&self) -> f64 {
        self.elevation_max - self.elevation_min
    }

    /// Inclined-surface estimate of a flat area
    pub fn corrected_area(&self, flat_area: f64) -> f64 {
        flat_area * self.correction_factor
    }
}

/// `1 / cos(slope)` with the slope clamped to [0, 89] degrees
pub fn correction_factor(slope_degrees: f64) -> f64 {
    limited_correction_factor(slope_degrees, MAX_SLOPE_DEG)
}

/// `1 / cos(slope)` with the slope clamped to [0, max_slope_degrees]
pub fn limited_correction_factor(slope_degrees: f64, max_slope_degrees: f64) -> f64 {
    let limit = max_slope_degrees.clamp(0.0, MAX_SLOPE_DEG);
    let clamped = if slope_degrees.is_finite() {
        slope_degrees.clamp(0.0, limit)
    } else {
        limit
    };
    1.0 / clamped.to_radians().cos()
}

/// Compute the terrain profile of an elevated vertex ring
pub fn terrain_profile(vertices: &[Coordinate]) -> MeasureResult<TerrainProfile> {
    terrain_profile_with_limit(vertices, MAX_SLOPE_DEG)
}

/// Terrain profile whose correction factor clamps the slope at `max_slope_degrees`
pub fn terrain_profile_with_limit(vertices: &[Coordinate], max_slope_degrees: f64) -> MeasureResult<TerrainProfile> {
    if vertices.len() < 3 {
        return Err(MeasureError::invalid_polygon(PolygonIssue::TooFewVertices { unique: vertices.len() }));
    }
    let elevations = require_elevations(vertices)?;

    let slope_degrees = mean_edge_slope(vertices, &elevations);

    let (min_index, elevation_min) = extreme(&elevations, |candidate, best| candidate < best);
    let (max_index, elevation_max) = extreme(&elevations, |candidate, best| candidate > best);

    let aspect_degrees = if min_index == max_index {
        0.0
    } else {
        let projection = LocalProjection::for_vertices(vertices);
        let low = projection.project(&vertices[min_index]);
        let high = projection.project(&vertices[max_index]);
        bearing_degrees(high.x - low.x, high.y - low.y)
    };

    Ok(TerrainProfile {
        slope_degrees,
        aspect_degrees,
        elevation_min,
        elevation_max,
        correction_factor: limited_correction_factor(slope_degrees, max_slope_degrees),
        terrain_class: TerrainClass::from_slope(slope_degrees),
    })
}

/// Exact surface area (ft²) of elevated triangles.
///
/// Vertices sit on a sphere of radius `R + (elevation - lowest)`, where
/// `lowest` is the minimum elevation over all triangles, so a level lot
/// matches its planar area at any altitude.
pub fn surface_area_3d(triangles: &[Triangle]) -> MeasureResult<f64> {
    let mut corners = Vec::with_capacity(triangles.len());
    for (index, triangle) in triangles.iter().enumerate() {
        let [a, b, c] = triangle.vertices();
        match (a.elevation, b.elevation, c.elevation) {
            (Some(_), Some(_), Some(_)) => corners.push([a, b, c]),
            _ => {
                return Err(MeasureError::elevation_unavailable(format!(
                    "triangle {} has a vertex without elevation",
                    index
                )))
            }
        }
    }

    let reference_m = corners
        .iter()
        .flatten()
        .filter_map(|v| v.elevation)
        .fold(f64::INFINITY, f64::min);

    let total_m2: f64 = corners
        .iter()
        .map(|[a, b, c]| {
            let (pa, pb, pc) = (
                to_cartesian(a, reference_m),
                to_cartesian(b, reference_m),
                to_cartesian(c, reference_m),
            );
            0.5 * (pb - pa).cross(&(pc - pa)).norm()
        })
        .sum();
    Ok(total_m2 * SQM_TO_SQFT)
}

/// Earth-centered Cartesian position at radius `R + (elevation - reference)`
fn to_cartesian(coordinate: &Coordinate, reference_m: f64) -> Vector3<f64> {
    let radius = EARTH_RADIUS_M + coordinate.elevation.unwrap_or(reference_m) - reference_m;
    let (lat, lng) = (coordinate.lat_rad(), coordinate.lng_rad());
    Vector3::new(
        radius * lat.cos() * lng.cos(),
        radius * lat.cos() * lng.sin(),
        radius * lat.sin(),
    )
}

fn require_elevations(vertices: &[Coordinate]) -> MeasureResult<Vec<f64>> {
    vertices
        .iter()
        .enumerate()
        .map(|(index, v)| {
            v.elevation
                .ok_or_else(|| MeasureError::elevation_unavailable(format!("vertex {} has no elevation", index)))
        })
        .collect()
}

/// Mean of `atan(|Δe| / horizontal distance)` over all edges, closing edge
/// included; zero-length edges carry no slope and are skipped.
fn mean_edge_slope(vertices: &[Coordinate], elevations: &[f64]) -> f64 {
    let n = vertices.len();
    let slopes: Vec<f64> = (0..n)
        .filter_map(|i| {
            let j = (i + 1) % n;
            let horizontal = haversine_distance_m(&vertices[i], &vertices[j]);
            if horizontal <= 0.0 {
                return None;
            }
            let rise = (elevations[j] - elevations[i]).abs();
            Some((rise / horizontal).atan().to_degrees())
        })
        .collect();

    if slopes.is_empty() {
        0.0
    } else {
        slopes.iter().sum::<f64>() / slopes.len() as f64
    }
}

/// Index and value of the first element preferred by `better`
fn extreme(values: &[f64], better: impl Fn(f64, f64) -> bool) -> (usize, f64) {
    values
        .iter()
        .copied()
        .enumerate()
        .fold((0, values[0]), |best, (i, v)| if better(v, best.1) { (i, v) } else { best })
}

/// Compass bearing of an east/north displacement, normalized to [0, 360)
fn bearing_degrees(east: f64, north: f64) -> f64 {
    let bearing = east.atan2(north).to_degrees().rem_euclid(360.0);
    if bearing >= 360.0 {
        0.0
    } else {
        bearing
    }
}
