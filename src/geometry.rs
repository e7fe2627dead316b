use geo::{Area, Centroid, Point, Polygon};

/// Square feet per US acre.
const SQUARE_FEET_PER_ACRE: f64 = 43_560.0;

/// Rounds to 2 decimal places, half away from zero. Applied identically to
/// every computed area at every stage.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Polygon area in square feet. Coordinates are in the projected CRS's
/// US-foot units, so unsigned planar area is square feet directly.
pub fn area_square_feet(polygon: &Polygon<f64>) -> f64 {
    round2(polygon.unsigned_area())
}

/// Polygon area in US acres.
pub fn area_acres(polygon: &Polygon<f64>) -> f64 {
    round2(polygon.unsigned_area() / SQUARE_FEET_PER_ACRE)
}

/// The representative point used for reference-layer containment tests.
/// A parcel is matched to a boundary polygon only when this point falls
/// inside it, not when the geometries merely touch.
pub fn representative_point(polygon: &Polygon<f64>) -> Option<Point<f64>> {
    polygon.centroid()
}
