//! Geodesic area via local equirectangular projection and the Shoelace formula

use crate::core::{Coordinate, EARTH_RADIUS_M, SQM_TO_SQFT};
use crate::validation::error::{MeasureError, MeasureResult, PolygonIssue};
use nalgebra::Point2;
use std::f64::consts::{PI, TAU};

/// Equirectangular plane anchored at a polygon's mean latitude.
///
/// `x = R·cos(lat0)·(lng - lng0)`, `y = R·(lat - lat0)`, radians. Offsetting by
/// the anchor keeps the Shoelace products small; the area is unchanged. The
/// longitude offset is wrapped into [-π, π), so rings crossing the
/// antimeridian stay contiguous.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalProjection {
    anchor_lat_rad: f64,
    anchor_lng_rad: f64,
    cos_anchor_lat: f64,
}

impl LocalProjection {
    /// Anchor at the given point (degrees)
    pub fn anchored_at(latitude: f64, longitude: f64) -> Self {
        let anchor_lat_rad = latitude.to_radians();
        Self {
            anchor_lat_rad,
            anchor_lng_rad: longitude.to_radians(),
            cos_anchor_lat: anchor_lat_rad.cos(),
        }
    }

    /// Anchor at the mean latitude and circular mean longitude of `vertices`
    pub fn for_vertices(vertices: &[Coordinate]) -> Self {
        if vertices.is_empty() {
            return Self::anchored_at(0.0, 0.0);
        }
        let n = vertices.len() as f64;
        let mean_lat = vertices.iter().map(|v| v.latitude).sum::<f64>() / n;
        let (sin_sum, cos_sum) = vertices
            .iter()
            .fold((0.0, 0.0), |(s, c), v| (s + v.lng_rad().sin(), c + v.lng_rad().cos()));
        Self::anchored_at(mean_lat, sin_sum.atan2(cos_sum).to_degrees())
    }

    /// Project a vertex to local east/north meters
    pub fn project(&self, coordinate: &Coordinate) -> Point2<f64> {
        let dlng = wrap_radians(coordinate.lng_rad() - self.anchor_lng_rad);
        Point2::new(
            EARTH_RADIUS_M * self.cos_anchor_lat * dlng,
            EARTH_RADIUS_M * (coordinate.lat_rad() - self.anchor_lat_rad),
        )
    }

    pub fn project_all(&self, vertices: &[Coordinate]) -> Vec<Point2<f64>> {
        vertices.iter().map(|v| self.project(v)).collect()
    }

    /// Unsigned planar area of a vertex ring in this plane (ft²)
    pub fn area_sqft(&self, vertices: &[Coordinate]) -> f64 {
        signed_area_m2(&self.project_all(vertices)).abs() * SQM_TO_SQFT
    }
}

/// Normalize an angle difference into [-π, π)
pub(crate) fn wrap_radians(angle: f64) -> f64 {
    (angle + PI).rem_euclid(TAU) - PI
}

/// Normalize a longitude difference into [-180, 180)
pub(crate) fn wrap_degrees(delta: f64) -> f64 {
    (delta + 180.0).rem_euclid(360.0) - 180.0
}

/// Signed Shoelace area (m²); positive for counter-clockwise rings
pub fn signed_area_m2(points: &[Point2<f64>]) -> f64 {
    let n = points.len();
    if n < 3 {
        return 0.0;
    }
    let twice_area: f64 = (0..n)
        .map(|i| {
            let a = points[i];
            let b = points[(i + 1) % n];
            a.x * b.y - b.x * a.y
        })
        .sum();
    twice_area / 2.0
}

/// Planar area in square meters
pub fn planar_area_sqm(vertices: &[Coordinate]) -> MeasureResult<f64> {
    if vertices.len() < 3 {
        return Err(MeasureError::invalid_polygon(PolygonIssue::TooFewVertices { unique: vertices.len() }));
    }
    let projection = LocalProjection::for_vertices(vertices);
    Ok(signed_area_m2(&projection.project_all(vertices)).abs())
}

/// Planar area in square feet; fewer than 3 vertices is an error, never 0
pub fn planar_area_sqft(vertices: &[Coordinate]) -> MeasureResult<f64> {
    Ok(planar_area_sqm(vertices)? * SQM_TO_SQFT)
}

/// Area of an already-validated ring (ft²)
pub(crate) fn shoelace_area_sqft(vertices: &[Coordinate]) -> f64 {
    LocalProjection::for_vertices(vertices).area_sqft(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{irregular_lot, square};

    #[test]
    fn test_hundred_foot_square() {
        let vertices = square(45.0, -93.0, 30.48);
        let area = planar_area_sqft(&vertices).unwrap();
        assert!((area - 10_000.0).abs() / 10_000.0 < 0.01, "area {}", area);
    }

    #[test]
    fn test_area_direction_and_rotation_invariant() {
        let polygon = irregular_lot();
        let base = polygon.area_sqft();
        assert!(base > 0.0);

        let reversed = polygon.reversed().area_sqft();
        assert!((reversed - base).abs() / base < 1e-9);

        for k in 0..polygon.vertex_count() {
            let rotated = polygon.rotated(k).area_sqft();
            assert!((rotated - base).abs() / base < 1e-9, "rotation {} gave {}", k, rotated);
        }
    }

    #[test]
    fn test_collinear_area_is_zero() {
        let vertices = vec![
            Coordinate::new(10.0, 10.0),
            Coordinate::new(10.001, 10.001),
            Coordinate::new(10.002, 10.002),
        ];
        let area = planar_area_sqft(&vertices).unwrap();
        assert!(area.abs() < 1e-6);
    }

    #[test]
    fn test_too_few_vertices_is_error() {
        let vertices = vec![Coordinate::new(0.0, 0.0), Coordinate::new(0.0, 0.001)];
        assert!(matches!(
            planar_area_sqft(&vertices),
            Err(MeasureError::InvalidPolygon { issue: PolygonIssue::TooFewVertices { unique: 2 } })
        ));
    }

    #[test]
    fn test_tiny_polygon_is_not_zero() {
        let vertices = square(10.0, 10.0, 0.5);
        let area = planar_area_sqft(&vertices).unwrap();
        assert!(area > 2.0 && area < 3.0, "area {}", area);
    }

    #[test]
    fn test_lot_across_antimeridian() {
        let straddling = vec![
            Coordinate::new(-16.8, 179.9999),
            Coordinate::new(-16.8, -179.9999),
            Coordinate::new(-16.7999, -179.9999),
            Coordinate::new(-16.7999, 179.9999),
        ];
        let area = planar_area_sqft(&straddling).unwrap();
        assert!(area > 2_400.0 && area < 2_700.0, "area {}", area);

        // Same footprint away from the antimeridian
        let inland = vec![
            Coordinate::new(-16.8, -0.0001),
            Coordinate::new(-16.8, 0.0001),
            Coordinate::new(-16.7999, 0.0001),
            Coordinate::new(-16.7999, -0.0001),
        ];
        let reference = planar_area_sqft(&inland).unwrap();
        assert!((area - reference).abs() / reference < 1e-6, "{} vs {}", area, reference);
    }

    #[test]
    fn test_wrap_degrees() {
        assert!((wrap_degrees(-359.9998) - 0.0002).abs() < 1e-9);
        assert_eq!(wrap_degrees(180.0), -180.0);
        assert_eq!(wrap_degrees(10.0), 10.0);
        assert!((wrap_radians(3.0 * PI / 2.0) + PI / 2.0).abs() < 1e-12);
    }

    #[test]
    fn test_signed_area_orientation() {
        let ccw = [Point2::new(0.0, 0.0), Point2::new(1.0, 0.0), Point2::new(1.0, 1.0), Point2::new(0.0, 1.0)];
        assert!((signed_area_m2(&ccw) - 1.0).abs() < 1e-12);
        let mut cw = ccw;
        cw.reverse();
        assert!((signed_area_m2(&cw) + 1.0).abs() < 1e-12);
    }
}
