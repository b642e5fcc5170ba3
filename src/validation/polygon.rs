//! Boundary validation: coordinate ranges, near-duplicate vertices, self-intersection

use crate::algorithms::area::wrap_degrees;
use crate::core::Coordinate;
use crate::validation::error::{MeasureError, MeasureResult, PolygonIssue};
use log::debug;

/// Validate raw boundary vertices and return the normalized vertex ring.
///
/// Consecutive vertices within `tolerance_deg` of each other are merged (the
/// earlier one is kept), as is a closing vertex that repeats the first one.
pub fn normalize_vertices(vertices: Vec<Coordinate>, tolerance_deg: f64) -> MeasureResult<Vec<Coordinate>> {
    for (index, vertex) in vertices.iter().enumerate() {
        check_coordinate(index, vertex)?;
    }

    let original_len = vertices.len();
    let mut ring: Vec<Coordinate> = Vec::with_capacity(original_len);
    for vertex in vertices {
        match ring.last() {
            Some(last) if last.coincides_with(&vertex, tolerance_deg) => {}
            _ => ring.push(vertex),
        }
    }
    while ring.len() > 1 && ring[ring.len() - 1].coincides_with(&ring[0], tolerance_deg) {
        ring.pop();
    }

    if ring.len() != original_len {
        debug!("merged {} near-duplicate vertices", original_len - ring.len());
    }

    if ring.len() < 3 {
        return Err(MeasureError::invalid_polygon(PolygonIssue::TooFewVertices { unique: ring.len() }));
    }

    if let Some((first_edge, second_edge)) = find_self_intersection(&ring) {
        return Err(MeasureError::invalid_polygon(PolygonIssue::SelfIntersecting { first_edge, second_edge }));
    }

    Ok(ring)
}

fn check_coordinate(index: usize, vertex: &Coordinate) -> MeasureResult<()> {
    let elevation_finite = vertex.elevation.map_or(true, f64::is_finite);
    if !vertex.latitude.is_finite() || !vertex.longitude.is_finite() || !elevation_finite {
        return Err(MeasureError::invalid_polygon(PolygonIssue::NonFiniteCoordinate { index }));
    }
    if !(-90.0..=90.0).contains(&vertex.latitude) || !(-180.0..=180.0).contains(&vertex.longitude) {
        return Err(MeasureError::invalid_polygon(PolygonIssue::CoordinateOutOfRange {
            index,
            latitude: vertex.latitude,
            longitude: vertex.longitude,
        }));
    }
    Ok(())
}

/// First pair of non-adjacent edges that touch or cross, if any.
///
/// Edge `i` runs from vertex `i` to vertex `i + 1` (wrapping). The test runs
/// in degree space with longitudes unwrapped around the first vertex;
/// intersection is preserved by the axis scaling of any local projection.
pub fn find_self_intersection(ring: &[Coordinate]) -> Option<(usize, usize)> {
    let n = ring.len();
    if n < 4 {
        return None;
    }
    let origin = ring[0].longitude;
    let points: Vec<(f64, f64)> = ring
        .iter()
        .map(|v| (origin + wrap_degrees(v.longitude - origin), v.latitude))
        .collect();
    let point = |i: usize| points[i % n];

    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            if segments_intersect(point(i), point(i + 1), point(j), point(j + 1)) {
                return Some((i, j));
            }
        }
    }
    None
}

fn orientation(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    p.0 >= a.0.min(b.0) && p.0 <= a.0.max(b.0) && p.1 >= a.1.min(b.1) && p.1 <= a.1.max(b.1)
}

fn segments_intersect(p1: (f64, f64), p2: (f64, f64), q1: (f64, f64), q2: (f64, f64)) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if ((d1 > 0.0 && d2 < 0.0) || (d1 < 0.0 && d2 > 0.0))
        && ((d3 > 0.0 && d4 < 0.0) || (d3 < 0.0 && d4 > 0.0))
    {
        return true;
    }

    (d1 == 0.0 && on_segment(q1, q2, p1))
        || (d2 == 0.0 && on_segment(q1, q2, p2))
        || (d3 == 0.0 && on_segment(p1, p2, q1))
        || (d4 == 0.0 && on_segment(p1, p2, q2))
}
