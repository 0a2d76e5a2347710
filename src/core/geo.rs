//! Planar geometry against the fixed target zone.
//!
//! The target zone is an axis-aligned rectangle in the same projected
//! coordinate system as the trajectory records. Every spatial feature is
//! derived relative to it.

use serde::{Deserialize, Serialize};

/// Western bound of the target zone.
pub const ZONE_X_MIN: f64 = 3750901.5068;
/// Eastern bound of the target zone.
pub const ZONE_X_MAX: f64 = 3770901.5068;
/// Southern bound of the target zone.
pub const ZONE_Y_MIN: f64 = -19268905.6133;
/// Northern bound of the target zone.
pub const ZONE_Y_MAX: f64 = -19208905.6133;

/// Centroid of the target zone.
pub const ZONE_CENTER: Point = Point {
    x: 3760901.5068,
    y: -19238905.6133,
};

/// A coordinate pair in the projected planar system.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    /// Straight-line distance to another point.
    pub fn distance_to(&self, other: Point) -> f64 {
        ((other.x - self.x).powi(2) + (other.y - self.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// Where a point lies relative to the target zone.
///
/// The nine regions are mutually exclusive and cover the whole plane.
/// Points on the boundary belong to `Inside`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneRegion {
    Inside,
    West,
    East,
    South,
    North,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl ZoneRegion {
    /// Classify a point against the zone bounds.
    pub fn classify(point: Point) -> Self {
        let x_aligned = (ZONE_X_MIN..=ZONE_X_MAX).contains(&point.x);
        let y_aligned = (ZONE_Y_MIN..=ZONE_Y_MAX).contains(&point.y);

        match (x_aligned, y_aligned) {
            (true, true) => ZoneRegion::Inside,
            (false, true) if point.x < ZONE_X_MIN => ZoneRegion::West,
            (false, true) => ZoneRegion::East,
            (true, false) if point.y < ZONE_Y_MIN => ZoneRegion::South,
            (true, false) => ZoneRegion::North,
            (false, false) => match (point.x > ZONE_X_MAX, point.y > ZONE_Y_MAX) {
                (true, true) => ZoneRegion::NorthEast,
                (false, true) => ZoneRegion::NorthWest,
                (true, false) => ZoneRegion::SouthEast,
                (false, false) => ZoneRegion::SouthWest,
            },
        }
    }

    /// Distance from a point in this region to the nearest edge or corner.
    pub fn boundary_distance(self, point: Point) -> f64 {
        match self {
            ZoneRegion::Inside => 0.0,
            ZoneRegion::West => ZONE_X_MIN - point.x,
            ZoneRegion::East => point.x - ZONE_X_MAX,
            ZoneRegion::South => ZONE_Y_MIN - point.y,
            ZoneRegion::North => point.y - ZONE_Y_MAX,
            ZoneRegion::NorthEast => point.distance_to(Point::new(ZONE_X_MAX, ZONE_Y_MAX)),
            ZoneRegion::NorthWest => point.distance_to(Point::new(ZONE_X_MIN, ZONE_Y_MAX)),
            ZoneRegion::SouthEast => point.distance_to(Point::new(ZONE_X_MAX, ZONE_Y_MIN)),
            ZoneRegion::SouthWest => point.distance_to(Point::new(ZONE_X_MIN, ZONE_Y_MIN)),
        }
    }
}

/// Whether a point lies within the target zone (bounds inclusive).
pub fn in_zone(point: Point) -> bool {
    ZoneRegion::classify(point) == ZoneRegion::Inside
}

/// Distance from a point to the nearest edge or corner of the zone, zero inside.
pub fn distance_to_zone(point: Point) -> f64 {
    ZoneRegion::classify(point).boundary_distance(point)
}

/// Distance from a point to the zone centroid.
pub fn distance_to_center(point: Point) -> f64 {
    point.distance_to(ZONE_CENTER)
}

/// Initial compass bearing from `a` to `b` in degrees, within `[0, 360)`.
///
/// Uses the great-circle initial-bearing formula with the `x` component as
/// latitude and `y` as longitude. Applied to projected coordinates this is
/// only an approximation of direction, and downstream models are trained on
/// exactly these values.
pub fn compass_bearing(a: Point, b: Point) -> f64 {
    let lat1 = a.x.to_radians();
    let lat2 = b.x.to_radians();
    let diff_long = (b.y - a.y).to_radians();

    let x = diff_long.sin() * lat2.cos();
    let y = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * diff_long.cos();

    let initial_bearing = x.atan2(y).to_degrees();
    (initial_bearing + 360.0) % 360.0
}

/// Compass bearing from untyped coordinate slices.
///
/// Both inputs must be two-element `[x, y]` pairs.
pub fn compass_bearing_from_slices(a: &[f64], b: &[f64]) -> Result<f64, GeoError> {
    match (a, b) {
        ([ax, ay], [bx, by]) => Ok(compass_bearing(
            Point::new(*ax, *ay),
            Point::new(*bx, *by),
        )),
        ([_, _], _) => Err(GeoError::NotACoordinatePair { len: b.len() }),
        _ => Err(GeoError::NotACoordinatePair { len: a.len() }),
    }
}

/// Wrap an angle difference into `[-180, 180]`.
pub fn wrap_bearing_diff(diff: f64) -> f64 {
    if diff > 180.0 {
        diff - 360.0
    } else if diff < -180.0 {
        diff + 360.0
    } else {
        diff
    }
}

/// Geometry errors.
#[derive(Debug, Clone, PartialEq)]
pub enum GeoError {
    NotACoordinatePair { len: usize },
}

impl std::fmt::Display for GeoError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeoError::NotACoordinatePair { len } => {
                write!(f, "expected a coordinate pair, got {len} values")
            }
        }
    }
}

impl std::error::Error for GeoError {}
