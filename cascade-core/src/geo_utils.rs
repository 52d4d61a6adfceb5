//! Pure geographic CRS utilities: bearing and distance math. Per the
//! spec, these have a defined contract independent of the graph or
//! routing machinery, so they are free functions over [`geo::Point`]
//! rather than methods on any routing type.

use geo::{HaversineBearing, HaversineDistance, HaversineLength, LineString, Point};

/// Great-circle distance between two points, in meters.
#[must_use]
pub fn haversine(a: Point<f64>, b: Point<f64>) -> f64 {
    a.haversine_distance(&b)
}

/// Cumulative great-circle length of a `LineString`, in meters.
#[must_use]
pub fn arc_length(line: &LineString<f64>) -> f64 {
    line.haversine_length()
}

/// Initial bearing from `a` to `b`, in degrees clockwise from north,
/// `[0, 360)`.
#[must_use]
pub fn bearing(a: Point<f64>, b: Point<f64>) -> f64 {
    a.haversine_bearing(b)
}

/// Signed angular delta between two bearings, normalized to `(-180, 180]`.
///
/// Implemented exactly as specified: `((post - pre + 540) mod 360) - 180`.
#[must_use]
pub fn normalize_angle(pre: f64, post: f64) -> f64 {
    let wrapped = (post - pre + 540.0).rem_euclid(360.0);
    wrapped - 180.0
}
