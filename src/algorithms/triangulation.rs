//! Ear-clipping triangulation of simple polygons
//!
//! Works in the polygon's local projection so triangle areas sum to the
//! polygon's planar area. Clockwise boundaries are walked in reverse so every
//! clipped ear is counter-clockwise.

use crate::algorithms::area::{signed_area_m2, LocalProjection};
use crate::core::{Polygon, Triangle};
use crate::validation::error::{MeasureError, MeasureResult};
use log::debug;
use nalgebra::Point2;

/// Ear-clipping triangulator
#[derive(Debug, Clone, Copy)]
pub struct Triangulator {
    /// Clip the first three remaining vertices when a pass finds no ear
    allow_fallback: bool,
}

impl Default for Triangulator {
    fn default() -> Self {
        Self { allow_fallback: true }
    }
}

impl Triangulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with `DegenerateTriangle` instead of falling back, and refuse to
    /// emit a zero-area final triangle
    pub fn strict() -> Self {
        Self { allow_fallback: false }
    }

    /// Decompose `polygon` into exactly `n - 2` triangles
    pub fn triangulate(&self, polygon: &Polygon) -> MeasureResult<Vec<Triangle>> {
        let vertices = polygon.vertices();
        let projection = LocalProjection::for_vertices(vertices);
        let points = projection.project_all(vertices);

        let mut remaining: Vec<usize> = (0..points.len()).collect();
        if signed_area_m2(&points) < 0.0 {
            remaining.reverse();
        }

        let mut triangles = Vec::with_capacity(points.len().saturating_sub(2));
        while remaining.len() > 3 {
            let ear = match find_ear(&points, &remaining) {
                Some(index) => index,
                None if self.allow_fallback => {
                    debug!("no ear among {} vertices, clipping first three", remaining.len());
                    1
                }
                None => return Err(MeasureError::DegenerateTriangle { remaining: remaining.len() }),
            };

            let m = remaining.len();
            let prev = remaining[(ear + m - 1) % m];
            let curr = remaining[ear];
            let next = remaining[(ear + 1) % m];
            triangles.push(Triangle::new(vertices[prev], vertices[curr], vertices[next]));
            remaining.remove(ear);
        }
        let (a, b, c) = (remaining[0], remaining[1], remaining[2]);
        if !self.allow_fallback && cross(points[a], points[b], points[c]) <= 0.0 {
            return Err(MeasureError::DegenerateTriangle { remaining: 3 });
        }
        triangles.push(Triangle::new(vertices[a], vertices[b], vertices[c]));

        Ok(triangles)
    }
}

/// Triangulate with the default (fallback-enabled) triangulator
pub fn triangulate(polygon: &Polygon) -> MeasureResult<Vec<Triangle>> {
    Triangulator::default().triangulate(polygon)
}

fn find_ear(points: &[Point2<f64>], remaining: &[usize]) -> Option<usize> {
    (0..remaining.len()).find(|&i| is_ear(points, remaining, i))
}

fn is_ear(points: &[Point2<f64>], remaining: &[usize], i: usize) -> bool {
    let m = remaining.len();
    let prev = remaining[(i + m - 1) % m];
    let curr = remaining[i];
    let next = remaining[(i + 1) % m];
    let (a, b, c) = (points[prev], points[curr], points[next]);

    if cross(a, b, c) <= 0.0 {
        return false;
    }

    !remaining
        .iter()
        .filter(|&&k| k != prev && k != curr && k != next)
        .any(|&k| point_in_triangle(points[k], a, b, c))
}

fn cross(a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> f64 {
    (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

fn edge_sign(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>) -> f64 {
    (p.x - b.x) * (a.y - b.y) - (a.x - b.x) * (p.y - b.y)
}

/// Barycentric-sign test; points on an edge count as inside
pub fn point_in_triangle(p: Point2<f64>, a: Point2<f64>, b: Point2<f64>, c: Point2<f64>) -> bool {
    let d1 = edge_sign(p, a, b);
    let d2 = edge_sign(p, b, c);
    let d3 = edge_sign(p, c, a);
    let has_negative = d1 < 0.0 || d2 < 0.0 || d3 < 0.0;
    let has_positive = d1 > 0.0 || d2 > 0.0 || d3 > 0.0;
    !(has_negative && has_positive)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithms::fixtures::{irregular_lot, square};
    use crate::core::Coordinate;

    fn assert_covers(polygon: &Polygon) {
        let triangles = triangulate(polygon).unwrap();
        assert_eq!(triangles.len(), polygon.vertex_count() - 2);

        let projection = LocalProjection::for_vertices(polygon.vertices());
        let total: f64 = triangles.iter().map(|t| t.planar_area_sqft(&projection)).sum();
        let area = polygon.area_sqft();
        assert!((total - area).abs() / area < 1e-6, "triangles {} vs polygon {}", total, area);
    }

    #[test]
    fn test_square_triangulation() {
        let polygon = Polygon::new(square(45.0, 7.0, 50.0)).unwrap();
        assert_covers(&polygon);
    }

    #[test]
    fn test_concave_triangulation_both_orientations() {
        let polygon = irregular_lot();
        assert_covers(&polygon);
        assert_covers(&polygon.reversed());
        for k in 0..polygon.vertex_count() {
            assert_covers(&polygon.rotated(k));
        }
    }

    #[test]
    fn test_l_shaped_lot() {
        let polygon = Polygon::from_lat_lng(&[
            (0.0, 0.0),
            (0.0, 0.002),
            (0.001, 0.002),
            (0.001, 0.001),
            (0.002, 0.001),
            (0.002, 0.0),
        ])
        .unwrap();
        assert_covers(&polygon);
    }

    #[test]
    fn test_triangle_passthrough() {
        let polygon = Polygon::from_lat_lng(&[(1.0, 1.0), (1.0, 1.001), (1.001, 1.0)]).unwrap();
        let triangles = triangulate(&polygon).unwrap();
        assert_eq!(triangles.len(), 1);
    }

    #[test]
    fn test_collinear_ring_fallback_and_strict() {
        let polygon = Polygon::new(vec![
            Coordinate::new(0.0, 0.0),
            Coordinate::new(0.0, 0.001),
            Coordinate::new(0.0, 0.002),
        ])
        .unwrap();
        assert_eq!(triangulate(&polygon).unwrap().len(), 1);
        assert_eq!(
            Triangulator::strict().triangulate(&polygon),
            Err(MeasureError::DegenerateTriangle { remaining: 3 })
        );

        let lot = Polygon::new(square(12.0, 12.0, 20.0)).unwrap();
        assert_eq!(Triangulator::strict().triangulate(&lot).unwrap().len(), 2);
    }

    #[test]
    fn test_collinear_chain_has_no_ear() {
        let points = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(2.0, 0.0),
            Point2::new(3.0, 0.0),
        ];
        assert_eq!(find_ear(&points, &[0, 1, 2, 3]), None);
    }

    #[test]
    fn test_point_in_triangle() {
        let a = Point2::new(0.0, 0.0);
        let b = Point2::new(4.0, 0.0);
        let c = Point2::new(0.0, 4.0);
        assert!(point_in_triangle(Point2::new(1.0, 1.0), a, b, c));
        assert!(point_in_triangle(Point2::new(2.0, 0.0), a, b, c));
        assert!(!point_in_triangle(Point2::new(3.0, 3.0), a, b, c));
        assert!(!point_in_triangle(Point2::new(-1.0, 0.0), a, b, c));
    }
}
