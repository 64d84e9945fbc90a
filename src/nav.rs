//! `Nav` (spec.md §2, §4.1): one aircraft's full guidance state and the
//! `update` tick that drives it. External collaborators (`WindModel`,
//! `World`, `EventPoster`, `Clock`, `RandomSource`) are passed as
//! parameters to `update` rather than stored on `Nav` (spec.md §9), so
//! `Nav` itself stays plain, serializable data.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::config::NavTuning;
use crate::events::{Event, EventPoster};
use crate::flight_state::FlightState;
use crate::guidance::{DeferredHeading, NavAltitude, NavFixAssignment, NavHeading, NavSpeed, Waypoint};
use crate::approach::NavApproach;
use crate::geometry::LatLon;
use crate::perf::Perf;
use crate::physics;
use crate::rand_source::RandomSource;
use crate::solve;
use crate::waypoints;
use crate::wind::WindModel;
use crate::world::World;

const SPEED_CHANGE_THRESHOLD_KTS: f64 = 0.5;
const ALTITUDE_CHANGE_THRESHOLD_FT: f64 = 10.0;

/// One aircraft's complete guidance state: physical state, the three
/// axis directives, the attached approach, and the charted route ahead
/// of it. Fully serializable so a scenario can be saved and resumed
/// mid-flight (spec.md §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nav {
    pub flight_state: FlightState,
    pub perf: Perf,
    pub altitude: NavAltitude,
    pub speed: NavSpeed,
    pub heading: NavHeading,
    pub approach: NavApproach,
    pub deferred_heading: Option<DeferredHeading>,
    pub fix_assignments: HashMap<String, NavFixAssignment>,
    pub final_altitude_ft: f64,
    pub waypoints: Vec<Waypoint>,
}

impl Nav {
    /// Builds a departure sitting on the runway, takeoff roll not yet
    /// started (`ias_kts == 0`).
    pub fn make_departure_nav(
        departure_loc: LatLon,
        departure_elev_ft: f64,
        runway_heading: f64,
        magnetic_variation: f64,
        perf: Perf,
        final_altitude_ft: f64,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        let flight_state =
            FlightState::on_ground(departure_loc, departure_elev_ft, runway_heading, magnetic_variation);
        Self {
            flight_state,
            perf,
            altitude: NavAltitude::default(),
            speed: NavSpeed::default(),
            heading: NavHeading::default(),
            approach: NavApproach::default(),
            deferred_heading: None,
            fix_assignments: HashMap::new(),
            final_altitude_ft,
            waypoints,
        }
    }

    /// Builds an arrival already airborne, inbound toward `arrival_loc`.
    #[allow(clippy::too_many_arguments)]
    pub fn make_arrival_nav(
        position: LatLon,
        heading: f64,
        altitude_ft: f64,
        ias_kts: f64,
        arrival_loc: LatLon,
        arrival_elev_ft: f64,
        magnetic_variation: f64,
        nm_per_longitude: f64,
        perf: Perf,
        final_altitude_ft: f64,
        waypoints: Vec<Waypoint>,
    ) -> Self {
        let flight_state = FlightState {
            is_departure: false,
            departure_loc: LatLon::new(0.0, 0.0),
            arrival_loc,
            departure_elev_ft: 0.0,
            arrival_elev_ft,
            magnetic_variation,
            nm_per_longitude,
            position,
            heading,
            altitude_ft,
            ias_kts,
            gs_kts: ias_kts,
        };
        Self {
            flight_state,
            perf,
            altitude: NavAltitude::default(),
            speed: NavSpeed::default(),
            heading: NavHeading::default(),
            approach: NavApproach::default(),
            deferred_heading: None,
            fix_assignments: HashMap::new(),
            final_altitude_ft,
            waypoints,
        }
    }

    /// Advances this aircraft by `delta_t_s` seconds: refreshes the
    /// location-dependent `World` facts, runs the three axis solvers in
    /// the fixed order speed -> altitude -> heading (spec.md §4.1),
    /// advances position, then sequences the waypoint queue. Returns the
    /// waypoint popped this tick, if any, and posts a radio transmission
    /// for it.
    #[allow(clippy::too_many_arguments)]
    pub fn update(
        &mut self,
        callsign: &str,
        wind: &dyn WindModel,
        world: &dyn World,
        events: &dyn EventPoster,
        clock: &dyn Clock,
        _rand: &dyn RandomSource,
        tuning: &NavTuning,
        delta_t_s: f64,
    ) -> Option<Waypoint> {
        self.flight_state.nm_per_longitude = world.nm_per_longitude(self.flight_state.position.lat);
        self.flight_state.magnetic_variation = world.magnetic_variation(self.flight_state.position);

        let (speed_target, speed_rate) = solve::target_speed(self, tuning);
        let (altitude_target, altitude_rate) = solve::target_altitude(self);
        let (heading_target, turn_method, turn_rate) = solve::target_heading(self, wind, clock, tuning);

        let speed_changing =
            (speed_target - self.flight_state.ias_kts).abs() > SPEED_CHANGE_THRESHOLD_KTS;
        let altitude_changing =
            (altitude_target - self.flight_state.altitude_ft).abs() > ALTITUDE_CHANGE_THRESHOLD_FT;

        physics::update_airspeed(
            &mut self.flight_state,
            &self.perf,
            speed_target,
            speed_rate,
            altitude_changing,
            delta_t_s,
        );
        physics::update_altitude(
            &mut self.flight_state,
            &self.perf,
            altitude_target,
            altitude_rate,
            speed_changing,
            self.altitude.expedite,
            delta_t_s,
        );
        physics::update_heading(&mut self.flight_state, heading_target, turn_method, turn_rate, delta_t_s);
        physics::update_position_and_gs(&mut self.flight_state, wind, delta_t_s);

        // Waypoints advance only while no controller heading is active;
        // a vectored aircraft does not consume its route.
        let popped = if self.heading.assigned_heading().is_none() {
            waypoints::update_waypoints(self, wind)
        } else {
            None
        };
        if let Some(wp) = &popped {
            events.post_event(Event::RadioTransmission {
                aircraft: callsign.to_string(),
                message: format!("passing {}", wp.fix_name),
            });
        }

        popped
    }
}
