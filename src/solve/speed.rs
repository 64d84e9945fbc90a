//! Target speed cascade (spec.md §4.2).

use crate::config::NavTuning;
use crate::geometry::{eta_seconds, haversine_nm, lerp_clamped};
use crate::nav::Nav;

use super::final_approach_distance_nm;

/// Picks the accel/decel rate (kts/min) appropriate for closing on
/// `target` from `current` at the aircraft's performance limits.
fn max_rate_kts_per_min(perf: &crate::perf::Perf, current: f64, target: f64) -> f64 {
    if target >= current {
        perf.accel_kts_s * 60.0
    } else {
        perf.decel_kts_s * 60.0
    }
}

fn altitude_cruise_schedule(altitude_ft: f64, cruise_kts: f64, ceiling_ft: f64) -> f64 {
    if altitude_ft <= 10_000.0 {
        250.0_f64.min(cruise_kts)
    } else {
        lerp_clamped(altitude_ft, 10_000.0, ceiling_ft, 250.0, cruise_kts)
    }
}

/// Returns `(target_ias_kts, rate_kts_per_min)` per the priority cascade
/// in spec.md §4.2. Mutates `nav.speed` when a directive is cleared or a
/// pending `after_altitude` trigger fires, matching the reference's
/// description of `TargetSpeed` as a method with side effects on Nav.
pub fn target_speed(nav: &mut Nav, tuning: &NavTuning) -> (f64, f64) {
    let perf = nav.perf;
    let current = nav.flight_state.ias_kts;

    // 1. Inside 5nm final: cancel any controller speed restriction.
    if let Some(distance) = final_approach_distance_nm(nav) {
        if distance < tuning.final_approach_clear_distance_nm {
            nav.speed.clear_all();
        }
    }

    // 2. after_altitude trigger.
    if let (Some(speed), Some(trigger_altitude)) =
        (nav.speed.after_altitude, nav.speed.after_altitude_altitude)
    {
        if (nav.flight_state.altitude_ft - trigger_altitude).abs() < 1.0 {
            nav.speed.assigned = Some(speed);
            nav.speed.after_altitude = None;
            nav.speed.after_altitude_altitude = None;
        }
    }

    let fs = &nav.flight_state;

    let (raw_target, rate) = if nav.speed.maintain_slowest_practical {
        let target = perf.v2_kts + 5.0;
        (target, max_rate_kts_per_min(&perf, current, target))
    } else if nav.speed.maintain_maximum_forward {
        let target = if nav.approach.cleared {
            (1.6 * perf.v2_kts).min(250.0).min(perf.cruise_kts)
        } else {
            altitude_cruise_schedule(fs.altitude_ft, perf.cruise_kts, perf.ceiling_ft)
        };
        (target, max_rate_kts_per_min(&perf, current, target))
    } else if fs.is_departure && fs.height_agl_ft() < tuning.initial_climb_agl_ft {
        let target = 250.0_f64.min(perf.cruise_kts);
        let factor = if fs.height_agl_ft() > 0.0 { 0.2 } else { 0.8 };
        (target, factor * perf.accel_kts_s * 60.0)
    } else if let Some(assigned) = nav.speed.assigned {
        (assigned, max_rate_kts_per_min(&perf, current, assigned))
    } else if nav.heading.is_following_route() && nav.waypoints.first().and_then(|wp| wp.speed_kts).is_some()
    {
        let wp = nav.waypoints.first().expect("checked above");
        let restriction_kts = wp.speed_kts.expect("checked above");
        let distance = haversine_nm(fs.position, wp.location);
        let eta = eta_seconds(distance, fs.gs_kts);

        if eta < 5.0 {
            (restriction_kts, max_rate_kts_per_min(&perf, current, restriction_kts))
        } else if restriction_kts > current {
            (restriction_kts, perf.accel_kts_s * 60.0)
        } else {
            let delta = (current - restriction_kts).abs();
            (restriction_kts, 0.8 * (delta / eta) * 60.0)
        }
    } else if let Some(restriction_kts) = nav.speed.restriction {
        if nav.approach.cleared {
            (current, 0.0)
        } else {
            (restriction_kts, max_rate_kts_per_min(&perf, current, restriction_kts))
        }
    } else if nav.approach.cleared {
        match final_approach_distance_nm(nav) {
            Some(distance) if distance < tuning.cleared_approach_speed_schedule_nm => {
                let schedule_target = lerp_clamped(
                    distance,
                    1.0,
                    10.0,
                    perf.landing_kts,
                    1.25 * perf.landing_kts,
                );
                let target = schedule_target.min(current);
                (target, perf.decel_kts_s * 60.0)
            }
            _ => (current, 0.0),
        }
    } else {
        let target = altitude_cruise_schedule(fs.altitude_ft, perf.cruise_kts, perf.ceiling_ft);
        (target, max_rate_kts_per_min(&perf, current, target))
    };

    let clamped_target = raw_target.clamp(perf.min_kts, perf.max_kts);
    (clamped_target, rate)
}
