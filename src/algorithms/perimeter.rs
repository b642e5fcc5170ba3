//! Closed-loop perimeter from great-circle (haversine) edge lengths

use crate::core::{Coordinate, EARTH_RADIUS_M, M_TO_FT};

/// Great-circle distance between two vertices in meters
pub fn haversine_distance_m(a: &Coordinate, b: &Coordinate) -> f64 {
    let dlat = b.lat_rad() - a.lat_rad();
    let dlng = b.lng_rad() - a.lng_rad();
    let h = (dlat / 2.0).sin().powi(2) + a.lat_rad().cos() * b.lat_rad().cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().atan2((1.0 - h).sqrt())
}

/// Edge lengths in meters, closing edge (last to first) included
pub fn edge_lengths_m(vertices: &[Coordinate]) -> Vec<f64> {
    let n = vertices.len();
    if n < 2 {
        return Vec::new();
    }
    (0..n)
        .map(|i| haversine_distance_m(&vertices[i], &vertices[(i + 1) % n]))
        .collect()
}

/// Perimeter in meters
pub fn perimeter_m(vertices: &[Coordinate]) -> f64 {
    edge_lengths_m(vertices).iter().sum()
}

/// Perimeter in feet
pub fn perimeter_ft(vertices: &[Coordinate]) -> f64 {
    perimeter_m(vertices) * M_TO_FT
}
