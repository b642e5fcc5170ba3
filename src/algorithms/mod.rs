//! Core measurement algorithms

pub mod area;
pub mod perimeter;
pub mod triangulation;
pub mod terrain;

pub use area::{planar_area_sqft, LocalProjection};
pub use perimeter::{haversine_distance_m, perimeter_ft};
pub use terrain::{
    correction_factor, surface_area_3d, terrain_profile, terrain_profile_with_limit, TerrainClass, TerrainProfile,
};
pub use triangulation::{triangulate, Triangulator};

#[cfg(test)]
pub(crate) mod fixtures {
    use crate::core::{Coordinate, Polygon, EARTH_RADIUS_M};

    /// Axis-aligned square of `side_m` meters with its south-west corner at (lat, lng)
    pub fn square(lat: f64, lng: f64, side_m: f64) -> Vec<Coordinate> {
        let dlat = (side_m / EARTH_RADIUS_M).to_degrees();
        let dlng = (side_m / (EARTH_RADIUS_M * lat.to_radians().cos())).to_degrees();
        vec![
            Coordinate::new(lat, lng),
            Coordinate::new(lat, lng + dlng),
            Coordinate::new(lat + dlat, lng + dlng),
            Coordinate::new(lat + dlat, lng),
        ]
    }

    /// Concave six-vertex lot (one reflex vertex), counter-clockwise
    pub fn irregular_lot() -> Polygon {
        Polygon::from_lat_lng(&[
            (39.7392, -104.9903),
            (39.7393, -104.9897),
            (39.7398, -104.9895),
            (39.7401, -104.9899),
            (39.7397, -104.9901),
            (39.7399, -104.9906),
        ])
        .unwrap()
    }
}
