//! Distances between coordinates and district boundaries.

use chattanooga_vote_district_models::Coordinate;
use geo::{Closest, ClosestPoint, LineString, MultiPolygon, Point};

/// Mean Earth radius used for great-circle distances.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates in kilometers
/// (haversine formula).
#[must_use]
pub fn haversine_km(a: &Coordinate, b: &Coordinate) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let dlat = (b.latitude - a.latitude).to_radians();
    let dlon = (b.longitude - a.longitude).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().min(1.0).asin()
}

/// Closest point on any ring (exterior or hole) of `polygon` to `point`,
/// together with its planar distance in degrees.
///
/// Returns `None` only for a polygon without usable rings.
#[must_use]
pub fn closest_boundary_point(polygon: &MultiPolygon<f64>, point: &Point<f64>) -> Option<(Point<f64>, f64)> {
    polygon
        .iter()
        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
        .filter_map(|ring| closest_on_ring(ring, point))
        .map(|closest| (closest, planar_degrees(&closest, point)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Great-circle distance in kilometers from `coord` to the nearest point
/// on the polygon boundary.
#[must_use]
pub fn boundary_distance_km(polygon: &MultiPolygon<f64>, coord: &Coordinate) -> Option<f64> {
    let point = Point::new(coord.longitude, coord.latitude);
    closest_boundary_point(polygon, &point).map(|(closest, _)| {
        haversine_km(coord, &Coordinate::new(closest.y(), closest.x()))
    })
}

fn closest_on_ring(ring: &LineString<f64>, point: &Point<f64>) -> Option<Point<f64>> {
    match ring.closest_point(point) {
        Closest::Intersection(p) | Closest::SinglePoint(p) => Some(p),
        Closest::Indeterminate => None,
    }
}

fn planar_degrees(a: &Point<f64>, b: &Point<f64>) -> f64 {
    (a.x() - b.x()).hypot(a.y() - b.y())
}
