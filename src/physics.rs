//! Physics step (spec.md §4.1-§4.4): turns the solver targets into
//! actual motion over `delta_t_s`. Separate from `solve` because these
//! functions apply the rate *clamps* (performance limits, the 0.6/0.7
//! concurrent-axis de-rate, expedite override, snap-within-tolerance)
//! rather than deciding what the target should be.

use crate::flight_state::FlightState;
use crate::geometry::{advance_position, normalize_heading, turn_angle, Vector2};
use crate::perf::Perf;
use crate::wind::WindModel;

const ALTITUDE_SNAP_FT: f64 = 3.0;
const SPEED_SNAP_KTS: f64 = 0.5;
const HEADING_SNAP_DEG: f64 = 1.0;
/// Concurrent-axis de-rate: a climb/descent already competing with an
/// airspeed change (or vice versa) doesn't get the aircraft's full rate.
const CONCURRENT_AXIS_SCALE: f64 = 0.7;

/// Airspeed-change de-rate when a climb/descent is in progress on the
/// same tick: the aircraft doesn't get its full accel/decel baseline.
const CONCURRENT_ALTITUDE_SCALE: f64 = 0.6;

/// Advances IAS toward `target_kts` at up to `requested_rate_kts_per_min`,
/// clamped to the aircraft's half-accel/decel baseline and snapped
/// exactly onto the target within `SPEED_SNAP_KTS`. `concurrent_altitude_change`
/// scales the rate by [`CONCURRENT_ALTITUDE_SCALE`].
pub fn update_airspeed(
    fs: &mut FlightState,
    perf: &Perf,
    target_kts: f64,
    requested_rate_kts_per_min: f64,
    concurrent_altitude_change: bool,
    delta_t_s: f64,
) {
    let diff = target_kts - fs.ias_kts;
    if diff.abs() < SPEED_SNAP_KTS {
        fs.ias_kts = target_kts;
        return;
    }

    let perf_rate_kts_per_min = if diff > 0.0 {
        perf.accel_kts_s / 2.0 * 60.0
    } else {
        perf.decel_kts_s / 2.0 * 60.0
    };
    let mut rate_kts_per_min = requested_rate_kts_per_min.abs().min(perf_rate_kts_per_min);
    if concurrent_altitude_change {
        rate_kts_per_min *= CONCURRENT_ALTITUDE_SCALE;
    }
    let step = rate_kts_per_min / 60.0 * delta_t_s;

    if diff > 0.0 {
        fs.ias_kts = (fs.ias_kts + step).min(target_kts);
    } else {
        fs.ias_kts = (fs.ias_kts - step).max(target_kts);
    }
}

/// Advances altitude toward `target_ft` at up to `requested_rate_fpm`
/// (signed, but only the magnitude matters — direction follows the
/// sign of `target_ft - altitude_ft`). `concurrent_speed_change` scales
/// the rate by [`CONCURRENT_AXIS_SCALE`] unless `expedite` overrides it.
pub fn update_altitude(
    fs: &mut FlightState,
    perf: &Perf,
    target_ft: f64,
    requested_rate_fpm: f64,
    concurrent_speed_change: bool,
    expedite: bool,
    delta_t_s: f64,
) {
    let diff = target_ft - fs.altitude_ft;
    if diff.abs() < ALTITUDE_SNAP_FT {
        fs.altitude_ft = target_ft;
        return;
    }

    let perf_rate_fpm = if expedite {
        if diff > 0.0 { perf.climb_fpm } else { perf.descent_fpm }
    } else if diff > 0.0 {
        if perf.climb_fpm >= 2500.0 && fs.altitude_ft > 5000.0 {
            perf.climb_fpm - 500.0
        } else {
            perf.climb_fpm
        }
    } else {
        let capped = if fs.altitude_ft < 10000.0 {
            perf.descent_fpm.min(2000.0)
        } else {
            perf.descent_fpm
        };
        capped * (fs.ias_kts / 250.0).min(1.0)
    };
    let mut rate_fpm = requested_rate_fpm.abs().min(perf_rate_fpm);
    if concurrent_speed_change && !expedite {
        rate_fpm *= CONCURRENT_AXIS_SCALE;
    }
    let step = rate_fpm / 60.0 * delta_t_s;

    if diff > 0.0 {
        fs.altitude_ft = (fs.altitude_ft + step).min(target_ft);
    } else {
        fs.altitude_ft = (fs.altitude_ft - step).max(target_ft);
    }
}

/// Turns heading toward `target_heading` at `rate_deg_per_s`, via
/// whichever direction `turn_angle` picks for `method`. Snaps onto the
/// target within `HEADING_SNAP_DEG` rather than oscillating around it.
pub fn update_heading(fs: &mut FlightState, target_heading: f64, method: crate::geometry::TurnMethod, rate_deg_per_s: f64, delta_t_s: f64) {
    let signed = turn_angle(fs.heading, target_heading, method);
    if signed.abs() < HEADING_SNAP_DEG {
        fs.heading = normalize_heading(target_heading);
        return;
    }

    let step = rate_deg_per_s * delta_t_s;
    let step = step.min(signed.abs()).copysign(signed);
    fs.heading = normalize_heading(fs.heading + step);
}

/// Advances lateral position and recomputes ground speed from the
/// current heading/IAS/wind. An aircraft still below flying speed
/// (`ias_kts <= 0`) does not move (spec.md invariant: "no position
/// advance below flying speed").
pub fn update_position_and_gs(fs: &mut FlightState, wind: &dyn WindModel, delta_t_s: f64) {
    if fs.ias_kts <= 0.0 {
        fs.gs_kts = 0.0;
        return;
    }

    let wind_vector = wind.wind_vector(fs.position, fs.altitude_ft);
    let air_vector = Vector2::from_heading(fs.heading, fs.ias_kts);
    let ground_vector = air_vector.add(wind_vector);

    fs.gs_kts = ground_vector.magnitude();
    fs.position = advance_position(fs.position, ground_vector, fs.nm_per_longitude, delta_t_s);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::{LatLon, TurnMethod};
    use crate::wind::NoWind;

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

    #[test]
    fn airspeed_clamps_to_half_the_performance_accel_rate() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.ias_kts = 150.0;
        let perf = sample_perf();
        // Ask for a much faster rate than the aircraft can do; it should
        // still only move at (accel_kts_s / 2) * 60 per minute.
        update_airspeed(&mut fs, &perf, 250.0, 10_000.0, false, 60.0);
        assert_eq!(fs.ias_kts, 150.0 + perf.accel_kts_s / 2.0 * 60.0);
    }

    #[test]
    fn airspeed_concurrent_altitude_change_scales_rate() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.ias_kts = 150.0;
        let perf = sample_perf();
        update_airspeed(&mut fs, &perf, 250.0, 10_000.0, true, 60.0);
        assert_eq!(fs.ias_kts, 150.0 + perf.accel_kts_s / 2.0 * 60.0 * CONCURRENT_ALTITUDE_SCALE);
    }

    #[test]
    fn airspeed_snaps_onto_target_within_tolerance() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.ias_kts = 199.8;
        let perf = sample_perf();
        update_airspeed(&mut fs, &perf, 200.0, 120.0, false, 1.0);
        assert_eq!(fs.ias_kts, 200.0);
    }

    #[test]
    fn altitude_concurrent_axis_scale_reduces_rate() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 1000.0;
        let perf = sample_perf();
        update_altitude(&mut fs, &perf, 41000.0, perf.climb_fpm, true, false, 60.0);
        assert_eq!(fs.altitude_ft, 1000.0 + perf.climb_fpm * CONCURRENT_AXIS_SCALE);
    }

    #[test]
    fn altitude_expedite_bypasses_concurrent_axis_scale() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 1000.0;
        let perf = sample_perf();
        update_altitude(&mut fs, &perf, 41000.0, perf.climb_fpm, true, true, 60.0);
        assert_eq!(fs.altitude_ft, 1000.0 + perf.climb_fpm);
    }

    #[test]
    fn climb_above_five_thousand_loses_500_fpm_when_rate_is_high_enough() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 6000.0;
        let perf = sample_perf(); // climb_fpm = 3000, so >= 2500 and above 5,000'
        update_altitude(&mut fs, &perf, 41000.0, perf.climb_fpm, false, false, 60.0);
        assert_eq!(fs.altitude_ft, 6000.0 + (perf.climb_fpm - 500.0));
    }

    #[test]
    fn climb_below_five_thousand_keeps_full_rate() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 3000.0;
        let perf = sample_perf();
        update_altitude(&mut fs, &perf, 41000.0, perf.climb_fpm, false, false, 60.0);
        assert_eq!(fs.altitude_ft, 3000.0 + perf.climb_fpm);
    }

    #[test]
    fn descent_below_ten_thousand_is_capped_and_scaled_by_ias() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 9000.0;
        fs.ias_kts = 125.0; // min(ias/250, 1) == 0.5
        let perf = sample_perf(); // descent_fpm = 1800, already below the 2,000 cap
        update_altitude(&mut fs, &perf, 0.0, perf.descent_fpm, false, false, 60.0);
        assert_eq!(fs.altitude_ft, 9000.0 - perf.descent_fpm * 0.5);
    }

    #[test]
    fn descent_above_ten_thousand_is_not_capped() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.altitude_ft = 15000.0;
        fs.ias_kts = 250.0;
        let perf = sample_perf();
        update_altitude(&mut fs, &perf, 0.0, perf.descent_fpm, false, false, 60.0);
        assert_eq!(fs.altitude_ft, 15000.0 - perf.descent_fpm);
    }

    #[test]
    fn heading_snaps_onto_target_within_one_degree() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 359.5, 0.0);
        update_heading(&mut fs, 360.0, TurnMethod::Closest, 3.0, 1.0);
        assert_eq!(fs.heading, 0.0);
    }

    #[test]
    fn aircraft_below_flying_speed_does_not_advance_position() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.ias_kts = 0.0;
        let wind = NoWind;
        let before = fs.position;
        update_position_and_gs(&mut fs, &wind, 5.0);
        assert_eq!(fs.position, before);
        assert_eq!(fs.gs_kts, 0.0);
    }

    #[test]
    fn position_advances_east_when_heading_090() {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
        fs.ias_kts = 360.0; // 0.1nm/s along a meridian-normal heading
        fs.nm_per_longitude = 40.0;
        let wind = NoWind;
        update_position_and_gs(&mut fs, &wind, 10.0);
        assert!(fs.position.lon > 0.0);
        assert!((fs.position.lat - 51.0).abs() < 1e-6);
    }
}
