//! Waypoint altitude look-ahead (spec.md §4.7): finds the nearest point
//! at which the route constrains altitude and works backward from there,
//! narrowing the physically-reachable range at the aircraft's climb or
//! descent rate until a target for *right now* falls out.

use crate::geometry::{eta_seconds, haversine_nm};
use crate::guidance::UNBOUNDED_CEILING_FT;
use crate::nav::Nav;

#[derive(Debug, Clone, PartialEq)]
pub struct AltitudeLookahead {
    pub altitude_ft: f64,
    pub eta_seconds: f64,
    pub final_fix: String,
    pub final_altitude_ft: f64,
}

/// Feet per minute achievable toward the restricted waypoint, scaled the
/// way the physics model scales a sustained climb/descent (spec.md §4.7):
/// departures shed 500fpm off a brisk climb, arrivals cap the descent at
/// 2000fpm and further de-rate it by airspeed and a 0.7 margin.
fn alt_rate_fpm(nav: &Nav) -> f64 {
    let perf = &nav.perf;
    let fs = &nav.flight_state;
    if fs.is_departure {
        let base = if perf.climb_fpm > 2500.0 {
            perf.climb_fpm - 500.0
        } else {
            perf.climb_fpm
        };
        0.9 * base
    } else {
        let capped = perf.descent_fpm.min(2000.0);
        let ias_scale = (fs.ias_kts / 250.0).min(1.0);
        0.7 * capped * ias_scale
    }
}

pub fn waypoint_altitude_constraint(nav: &Nav) -> Option<AltitudeLookahead> {
    let fs = &nav.flight_state;
    let last_idx = nav
        .waypoints
        .iter()
        .rposition(|wp| wp.altitude_restriction.is_some())?;

    let rate_fpm = alt_rate_fpm(nav);

    // Prefix distance from the aircraft to each waypoint up to and
    // including the last restricted one.
    let mut prefix_distance_nm = vec![0.0; last_idx + 1];
    let mut cumulative = 0.0;
    let mut prev_point = fs.position;
    for (i, wp) in nav.waypoints[..=last_idx].iter().enumerate() {
        cumulative += haversine_nm(prev_point, wp.location);
        prefix_distance_nm[i] = cumulative;
        prev_point = wp.location;
    }

    let mut possible_range = (0.0, UNBOUNDED_CEILING_FT);
    let mut feasible = true;

    for i in (0..=last_idx).rev() {
        let Some(restriction) = nav.waypoints[i].altitude_restriction else {
            continue;
        };
        let distance_nm = prefix_distance_nm[i];
        let eta_s = eta_seconds(distance_nm, fs.gs_kts.max(1.0));
        let max_dalt = rate_fpm / 60.0 * eta_s;
        let reachable = if fs.is_departure {
            (fs.altitude_ft, fs.altitude_ft + max_dalt)
        } else {
            (fs.altitude_ft - max_dalt, fs.altitude_ft)
        };

        let (clamped, this_feasible) = restriction.clamp_range(reachable);
        let (narrowed, both_feasible) = AltitudeRangeExt::intersect(possible_range, clamped);
        possible_range = narrowed;
        feasible = feasible && this_feasible && both_feasible;
    }

    let final_wp = &nav.waypoints[last_idx];
    let restriction = final_wp
        .altitude_restriction
        .expect("last_idx located by rposition on altitude_restriction.is_some()");

    if !feasible {
        tracing::warn!(
            fix = %final_wp.fix_name,
            "altitude lookahead: restriction unreachable at current rate, clamping to nearest edge"
        );
    }

    let altitude_ft = fs.altitude_ft.clamp(possible_range.0, possible_range.1);
    let total_eta_s = eta_seconds(prefix_distance_nm[last_idx], fs.gs_kts.max(1.0));

    Some(AltitudeLookahead {
        altitude_ft,
        eta_seconds: total_eta_s,
        final_fix: final_wp.fix_name.clone(),
        final_altitude_ft: restriction.target_altitude(fs.altitude_ft),
    })
}

trait AltitudeRangeExt {
    fn intersect(a: (f64, f64), b: (f64, f64)) -> ((f64, f64), bool);
}

impl AltitudeRangeExt for (f64, f64) {
    fn intersect(a: (f64, f64), b: (f64, f64)) -> ((f64, f64), bool) {
        let lo = a.0.max(b.0);
        let hi = a.1.min(b.1);
        if lo <= hi {
            ((lo, hi), true)
        } else {
            ((b.0, b.1), false)
        }
    }
}
