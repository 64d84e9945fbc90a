//! `FlightState` (spec.md §3): the physical state advanced by the tick.
//! Everything here is plain data — the solvers in `solve` compute targets
//! from it, `physics` advances it, and `Nav` owns one copy per aircraft.

use serde::{Deserialize, Serialize};

use crate::geometry::LatLon;

/// The physically-observable state of one aircraft: where it is, which
/// way it's pointed, and how fast. Altitude is feet MSL, IAS/GS are
/// knots, heading is true degrees `[0, 360)`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FlightState {
    pub is_departure: bool,
    pub departure_loc: LatLon,
    pub arrival_loc: LatLon,
    pub departure_elev_ft: f64,
    pub arrival_elev_ft: f64,
    /// East-positive magnetic variation at the aircraft's position.
    pub magnetic_variation: f64,
    /// Nautical miles per degree of longitude at the aircraft's
    /// latitude, supplied by the `World` collaborator and refreshed each
    /// tick (it narrows toward the poles).
    pub nm_per_longitude: f64,
    pub position: LatLon,
    pub heading: f64,
    pub altitude_ft: f64,
    pub ias_kts: f64,
    pub gs_kts: f64,
}

impl FlightState {
    /// An aircraft sitting at `loc`, on the ground, pointed `heading`,
    /// used by `Nav::make_departure` before the takeoff roll begins.
    pub fn on_ground(loc: LatLon, elev_ft: f64, heading: f64, magnetic_variation: f64) -> Self {
        Self {
            is_departure: true,
            departure_loc: loc,
            arrival_loc: LatLon::new(0.0, 0.0),
            departure_elev_ft: elev_ft,
            arrival_elev_ft: 0.0,
            magnetic_variation,
            nm_per_longitude: 40.0,
            position: loc,
            heading,
            altitude_ft: elev_ft,
            ias_kts: 0.0,
            gs_kts: 0.0,
        }
    }

    /// Whether the aircraft is airborne, used by the departure
    /// initial-climb solver (spec.md §4.1's AGL threshold).
    pub fn height_agl_ft(&self) -> f64 {
        let field_elev = if self.is_departure {
            self.departure_elev_ft
        } else {
            self.arrival_elev_ft
        };
        self.altitude_ft - field_elev
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_ground_starts_with_zero_speed_at_field_elevation() {
        let fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 500.0, 90.0, -2.0);
        assert_eq!(fs.ias_kts, 0.0);
        assert_eq!(fs.altitude_ft, 500.0);
        assert_eq!(fs.height_agl_ft(), 0.0);
    }

    #[test]
    fn height_agl_tracks_departure_field_once_airborne() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 500.0, 90.0, -2.0);
        fs.altitude_ft = 2500.0;
        assert_eq!(fs.height_agl_ft(), 2000.0);
    }
}
