//! The `WindModel` external collaborator (spec.md §6): a read-only source
//! of wind vectors, sampled either as a single average or per
//! position/altitude.

use crate::geometry::{LatLon, Vector2};

/// Read-only wind source. Implementations must be cheap to call and safe
/// to share across concurrently-ticking `Nav`s (spec.md §5).
pub trait WindModel: Send + Sync {
    /// A single representative wind vector (knots, x=east, y=north) used
    /// for most heading/speed corrections.
    fn average_wind_vector(&self) -> Vector2;

    /// Wind sampled at a specific position and altitude, for collaborators
    /// that model wind shear. Implementations that don't model shear may
    /// just return [`WindModel::average_wind_vector`].
    fn wind_vector(&self, position: LatLon, altitude_ft: f64) -> Vector2;
}

/// Calm air. Useful as a test fixture and as the default when no wind
/// collaborator is configured.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoWind;

impl WindModel for NoWind {
    fn average_wind_vector(&self) -> Vector2 {
        Vector2::zero()
    }

    fn wind_vector(&self, _position: LatLon, _altitude_ft: f64) -> Vector2 {
        Vector2::zero()
    }
}

/// A single wind vector applied uniformly everywhere.
#[derive(Debug, Clone, Copy)]
pub struct ConstantWind {
    pub vector: Vector2,
}

impl ConstantWind {
    pub fn from_heading_speed(heading_from_deg: f64, speed_kts: f64) -> Self {
        // Wind is conventionally named for where it blows FROM; the
        // vector points where the air is going TO, i.e. the reciprocal.
        let blowing_towards = crate::geometry::normalize_heading(heading_from_deg + 180.0);
        Self {
            vector: Vector2::from_heading(blowing_towards, speed_kts),
        }
    }
}

impl WindModel for ConstantWind {
    fn average_wind_vector(&self) -> Vector2 {
        self.vector
    }

    fn wind_vector(&self, _position: LatLon, _altitude_ft: f64) -> Vector2 {
        self.vector
    }
}

/// Wind that scales linearly with altitude between two reference bands,
/// for tests/scenarios that care about shear (e.g. approach vs. cruise
/// wind correction differing).
#[derive(Debug, Clone, Copy)]
pub struct LayeredWind {
    pub surface: Vector2,
    pub aloft: Vector2,
    pub aloft_altitude_ft: f64,
}

impl WindModel for LayeredWind {
    fn average_wind_vector(&self) -> Vector2 {
        self.aloft
    }

    fn wind_vector(&self, _position: LatLon, altitude_ft: f64) -> Vector2 {
        let t = (altitude_ft / self.aloft_altitude_ft.max(1.0)).clamp(0.0, 1.0);
        Vector2::new(
            crate::geometry::lerp_clamped(t, 0.0, 1.0, self.surface.x, self.aloft.x),
            crate::geometry::lerp_clamped(t, 0.0, 1.0, self.surface.y, self.aloft.y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_wind_is_zero_everywhere() {
        let w = NoWind;
        assert_eq!(w.average_wind_vector(), Vector2::zero());
        assert_eq!(w.wind_vector(LatLon::new(0.0, 0.0), 10000.0), Vector2::zero());
    }

    #[test]
    fn constant_wind_from_heading_points_reciprocal() {
        // Wind "from the north" (0) at 20kt should point south (y negative).
        let w = ConstantWind::from_heading_speed(0.0, 20.0);
        assert!(w.vector.y < 0.0);
        assert!(w.vector.x.abs() < 1e-6);
    }

    #[test]
    fn layered_wind_interpolates_between_bands() {
        let w = LayeredWind {
            surface: Vector2::new(0.0, 0.0),
            aloft: Vector2::new(40.0, 0.0),
            aloft_altitude_ft: 10000.0,
        };
        let mid = w.wind_vector(LatLon::new(0.0, 0.0), 5000.0);
        assert!((mid.x - 20.0).abs() < 1e-6);
    }
}
