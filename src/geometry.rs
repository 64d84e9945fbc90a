//! Geometry and coordinate utilities: headings, distances, lat/long math,
//! turn-angle arithmetic and wind-vector composition.
//!
//! All headings in this module are plain degrees, `[0, 360)`, with no
//! distinction between true and magnetic — callers apply
//! [`true_to_magnetic`]/[`magnetic_to_true`] at the boundary where it
//! matters (see `solve::target_heading`).

use serde::{Deserialize, Serialize};

const EARTH_RADIUS_NM: f64 = 3440.065;

/// A position in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    pub fn is_zero(&self) -> bool {
        self.lat == 0.0 && self.lon == 0.0
    }
}

/// A 2D vector in knots (nm-per-hour), used for ground velocity and wind.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn zero() -> Self {
        Self { x: 0.0, y: 0.0 }
    }

    /// Builds a vector from a heading (degrees, 0 = north, clockwise) and magnitude.
    pub fn from_heading(heading_deg: f64, magnitude: f64) -> Self {
        let rad = heading_deg.to_radians();
        Self {
            x: magnitude * rad.sin(),
            y: magnitude * rad.cos(),
        }
    }

    pub fn add(&self, other: Vector2) -> Vector2 {
        Vector2::new(self.x + other.x, self.y + other.y)
    }

    pub fn sub(&self, other: Vector2) -> Vector2 {
        Vector2::new(self.x - other.x, self.y - other.y)
    }

    pub fn scale(&self, factor: f64) -> Vector2 {
        Vector2::new(self.x * factor, self.y * factor)
    }

    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    /// Heading (degrees, 0-360) this vector points towards.
    pub fn heading(&self) -> f64 {
        normalize_heading(self.x.atan2(self.y).to_degrees())
    }

    /// Sign of the 2D cross product `self x other`. Positive means `other`
    /// is clockwise (to the right) of `self`.
    pub fn cross_sign(&self, other: Vector2) -> f64 {
        (self.x * other.y - self.y * other.x).signum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnDirection {
    Left,
    Right,
}

impl TurnDirection {
    pub fn opposite(&self) -> TurnDirection {
        match self {
            TurnDirection::Left => TurnDirection::Right,
            TurnDirection::Right => TurnDirection::Left,
        }
    }
}

/// How a commanded turn picks its direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnMethod {
    Closest,
    Left,
    Right,
}

/// Normalizes a heading (or any angle) to `[0, 360)`.
pub fn normalize_heading(deg: f64) -> f64 {
    let h = deg % 360.0;
    if h < 0.0 {
        h + 360.0
    } else {
        h
    }
}

/// Signed difference `target - current` normalized to `(-180, 180]`,
/// positive meaning a clockwise (right) turn is shorter.
pub fn heading_diff_signed(current: f64, target: f64) -> f64 {
    let raw = normalize_heading(target - current + 180.0) - 180.0;
    if raw <= -180.0 {
        raw + 360.0
    } else {
        raw
    }
}

/// Absolute angular distance between two headings, `[0, 180]`.
pub fn heading_diff_abs(a: f64, b: f64) -> f64 {
    heading_diff_signed(a, b).abs()
}

/// The signed turn angle to fly from `current` to `target` using the given
/// method. Positive is a right turn, negative a left turn. `Closest` picks
/// whichever side is shorter; `Left`/`Right` force that direction even if it
/// is the long way around.
pub fn turn_angle(current: f64, target: f64, method: TurnMethod) -> f64 {
    match method {
        TurnMethod::Closest => heading_diff_signed(current, target),
        TurnMethod::Right => {
            let diff = normalize_heading(target - current);
            diff
        }
        TurnMethod::Left => {
            let diff = normalize_heading(target - current);
            diff - 360.0
        }
    }
}

/// Great-circle distance between two points, in nautical miles.
pub fn haversine_nm(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlat = (b.lat - a.lat).to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().asin();

    EARTH_RADIUS_NM * c
}

/// True-course bearing from `a` to `b`, degrees `[0, 360)`.
pub fn bearing_deg(a: LatLon, b: LatLon) -> f64 {
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();
    let dlon = (b.lon - a.lon).to_radians();

    let y = dlon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * dlon.cos();

    normalize_heading(y.atan2(x).to_degrees())
}

/// Destination point from `origin` along `bearing_deg_val` for `distance_nm`.
pub fn destination_point(origin: LatLon, bearing_deg_val: f64, distance_nm: f64) -> LatLon {
    let lat_rad = origin.lat.to_radians();
    let lon_rad = origin.lon.to_radians();
    let bearing_rad = bearing_deg_val.to_radians();
    let angular_distance = distance_nm / EARTH_RADIUS_NM;

    let dest_lat = (lat_rad.sin() * angular_distance.cos()
        + lat_rad.cos() * angular_distance.sin() * bearing_rad.cos())
    .asin();

    let dest_lon = lon_rad
        + (bearing_rad.sin() * angular_distance.sin() * lat_rad.cos())
            .atan2(angular_distance.cos() - lat_rad.sin() * dest_lat.sin());

    LatLon::new(dest_lat.to_degrees(), dest_lon.to_degrees())
}

/// Advances a position by a ground velocity vector (knots, x=east, y=north)
/// over `delta_t_s` seconds, using `nm_per_longitude` sampled at the
/// aircraft's latitude (supplied by the `World` collaborator).
pub fn advance_position(
    position: LatLon,
    ground_velocity: Vector2,
    nm_per_longitude: f64,
    delta_t_s: f64,
) -> LatLon {
    let distance_nm_x = ground_velocity.x * (delta_t_s / 3600.0);
    let distance_nm_y = ground_velocity.y * (delta_t_s / 3600.0);

    let delta_lat = distance_nm_y / 60.0;
    let delta_lon = if nm_per_longitude.abs() > 1e-9 {
        distance_nm_x / nm_per_longitude
    } else {
        0.0
    };

    LatLon::new(position.lat + delta_lat, position.lon + delta_lon)
}

/// Magnetic heading from a true heading, given the local variation
/// (east-positive, i.e. added to true to get magnetic).
pub fn true_to_magnetic(true_heading: f64, magnetic_variation: f64) -> f64 {
    normalize_heading(true_heading + magnetic_variation)
}

pub fn magnetic_to_true(magnetic_heading: f64, magnetic_variation: f64) -> f64 {
    normalize_heading(magnetic_heading - magnetic_variation)
}

/// Linear interpolation of `value` from `[from_lo, from_hi]` into
/// `[to_lo, to_hi]`, clamped to the output range.
pub fn lerp_clamped(value: f64, from_lo: f64, from_hi: f64, to_lo: f64, to_hi: f64) -> f64 {
    if (from_hi - from_lo).abs() < 1e-9 {
        return to_lo;
    }
    let t = ((value - from_lo) / (from_hi - from_lo)).clamp(0.0, 1.0);
    to_lo + t * (to_hi - to_lo)
}

/// Rounds to the nearest 1,000ft, the convention `GoAround`'s missed
/// approach altitude is quoted in (spec.md §4.9/§8 S6).
pub fn round_to_1000(feet: f64) -> f64 {
    (feet / 1000.0).round() * 1000.0
}

/// Estimated time to cover `distance_nm` at `speed_kts`, in seconds.
/// Returns `f64::INFINITY` for non-positive speed rather than panicking or
/// dividing by zero silently (callers treat an infinite ETA as "never").
pub fn eta_seconds(distance_nm: f64, speed_kts: f64) -> f64 {
    if speed_kts <= 0.0 {
        f64::INFINITY
    } else {
        (distance_nm / speed_kts) * 3600.0
    }
}

/// Perpendicular (cross-track) distance, in nautical miles, from `point` to
/// the infinite line through `line_start` -> `line_end`, in a local flat-earth
/// approximation valid for the short distances PT/localizer geometry spans.
/// Positive values mean `point` is to the right of the line's direction.
pub fn signed_distance_to_line(
    point: LatLon,
    line_start: LatLon,
    line_end: LatLon,
    nm_per_longitude: f64,
) -> f64 {
    let to_xy = |p: LatLon| -> (f64, f64) {
        (
            (p.lon - line_start.lon) * nm_per_longitude,
            (p.lat - line_start.lat) * 60.0,
        )
    };
    let (ex, ey) = to_xy(line_end);
    let (px, py) = to_xy(point);

    let line_len = (ex * ex + ey * ey).sqrt();
    if line_len < 1e-9 {
        return 0.0;
    }

    // cross product of (line direction) x (point offset), normalized
    (ex * py - ey * px) / line_len
}
