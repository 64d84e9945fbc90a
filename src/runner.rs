//! Drives a collection of [`Nav`]s forward in real time. Grounded on the
//! teacher's `simulator::runner::SimulationRunner`: an `Arc<RwLock<Self>>`
//! shared into a `tokio::time::interval` loop, ticking every aircraft
//! once per interval and logging the fleet's state after each pass.

use std::sync::Arc;

use tokio::sync::RwLock;
use tokio::time::{interval, Duration};

use crate::clock::Clock;
use crate::config::NavTuning;
use crate::events::EventPoster;
use crate::nav::Nav;
use crate::rand_source::RandomSource;
use crate::wind::WindModel;
use crate::world::World;

/// One aircraft under simulation, paired with the callsign `Nav::update`
/// needs for radio-transmission events.
pub struct Aircraft {
    pub callsign: String,
    pub nav: Nav,
}

/// Ticks a fleet of aircraft against a shared set of collaborators. The
/// collaborators are trait objects behind `Arc` rather than fields on
/// `Nav` itself, matching spec.md §9's "inject as collaborators, don't
/// store a back-pointer" guidance.
pub struct SimulationRunner {
    pub aircraft: Vec<Aircraft>,
    pub wind: Arc<dyn WindModel>,
    pub world: Arc<dyn World>,
    pub events: Arc<dyn EventPoster>,
    pub clock: Arc<dyn Clock>,
    pub rand: Arc<dyn RandomSource>,
    pub tuning: NavTuning,
    pub tick_seconds: f64,
}

impl SimulationRunner {
    pub fn new(
        wind: Arc<dyn WindModel>,
        world: Arc<dyn World>,
        events: Arc<dyn EventPoster>,
        clock: Arc<dyn Clock>,
        rand: Arc<dyn RandomSource>,
        tuning: NavTuning,
        tick_seconds: f64,
    ) -> Self {
        Self {
            aircraft: Vec::new(),
            wind,
            world,
            events,
            clock,
            rand,
            tuning,
            tick_seconds,
        }
    }

    pub fn add_aircraft(&mut self, callsign: impl Into<String>, nav: Nav) {
        self.aircraft.push(Aircraft {
            callsign: callsign.into(),
            nav,
        });
    }

    /// Advances every aircraft by one `tick_seconds` step.
    fn tick(&mut self) {
        for aircraft in &mut self.aircraft {
            let popped = aircraft.nav.update(
                &aircraft.callsign,
                self.wind.as_ref(),
                self.world.as_ref(),
                self.events.as_ref(),
                self.clock.as_ref(),
                self.rand.as_ref(),
                &self.tuning,
                self.tick_seconds,
            );
            tracing::debug!(
                callsign = %aircraft.callsign,
                lat = aircraft.nav.flight_state.position.lat,
                lon = aircraft.nav.flight_state.position.lon,
                altitude_ft = aircraft.nav.flight_state.altitude_ft,
                ias_kts = aircraft.nav.flight_state.ias_kts,
                heading = aircraft.nav.flight_state.heading,
                "tick"
            );
            if let Some(wp) = popped {
                tracing::info!(callsign = %aircraft.callsign, fix = %wp.fix_name, "sequenced waypoint");
            }
        }
    }

    /// Runs the fleet forward indefinitely, ticking once every
    /// `tick_seconds` of wall-clock time. Intended for the demo binary;
    /// a test harness instead calls [`SimulationRunner::tick`]-equivalent
    /// logic (`Nav::update`) directly so it can control time itself.
    pub async fn run(runner: Arc<RwLock<Self>>) {
        let tick_seconds = { runner.read().await.tick_seconds };
        let mut ticker = interval(Duration::from_secs_f64(tick_seconds));

        tracing::info!(
            aircraft = runner.read().await.aircraft.len(),
            tick_seconds,
            "starting simulation"
        );

        loop {
            ticker.tick().await;
            let mut r = runner.write().await;
            r.tick();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::SimClock;
    use crate::events::TracingEventPoster;
    use crate::geometry::LatLon;
    use crate::perf::Perf;
    use crate::rand_source::SeededRandomSource;
    use crate::wind::NoWind;
    use crate::world::InMemoryWorld;

    fn sample_perf() -> Perf {
        Perf {
            v2_kts: 150.0,
            min_kts: 130.0,
            max_kts: 340.0,
            landing_kts: 130.0,
            cruise_kts: 290.0,
            climb_fpm: 3000.0,
            descent_fpm: 1800.0,
            accel_kts_s: 2.0,
            decel_kts_s: 1.5,
            ceiling_ft: 41000.0,
        }
    }

    fn sample_runner() -> SimulationRunner {
        SimulationRunner::new(
            Arc::new(NoWind),
            Arc::new(InMemoryWorld::new(-2.0)),
            Arc::new(TracingEventPoster),
            Arc::new(SimClock::new(0.0)),
            Arc::new(SeededRandomSource::new(1)),
            NavTuning::default(),
            1.0,
        )
    }

    #[test]
    fn tick_advances_every_aircraft_in_the_fleet() {
        let mut runner = sample_runner();
        let nav = Nav::make_arrival_nav(
            LatLon::new(51.0, 0.0),
            90.0,
            10000.0,
            250.0,
            LatLon::new(51.5, 1.0),
            50.0,
            -2.0,
            40.0,
            sample_perf(),
            0.0,
            Vec::new(),
        );
        runner.add_aircraft("TST123", nav);

        let before = runner.aircraft[0].nav.flight_state.position;
        runner.tick();
        assert_ne!(runner.aircraft[0].nav.flight_state.position, before);
    }

    #[tokio::test]
    async fn run_ticks_at_least_once_before_being_aborted() {
        let mut runner = sample_runner();
        runner.tick_seconds = 0.01;
        let nav = Nav::make_arrival_nav(
            LatLon::new(51.0, 0.0),
            90.0,
            10000.0,
            250.0,
            LatLon::new(51.5, 1.0),
            50.0,
            -2.0,
            40.0,
            sample_perf(),
            0.0,
            Vec::new(),
        );
        runner.add_aircraft("TST123", nav);
        let shared = Arc::new(RwLock::new(runner));
        let shared_clone = Arc::clone(&shared);

        let handle = tokio::spawn(async move {
            SimulationRunner::run(shared_clone).await;
        });
        tokio::time::sleep(Duration::from_millis(50)).await;
        handle.abort();

        let before = LatLon::new(51.0, 0.0);
        assert_ne!(shared.read().await.aircraft[0].nav.flight_state.position, before);
    }
}
