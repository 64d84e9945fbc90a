//! Target altitude cascade (spec.md §4.3).

use crate::guidance::HeadingMode;
use crate::nav::Nav;
use crate::procedures::RacetrackState;

use super::lookahead::waypoint_altitude_constraint;

/// `getAssignedRate()` from spec.md §4.3: departures ramp gently below
/// 10,000' while still accelerating, arrivals just use the full
/// performance rate. `target_altitude_ft` picks climb vs. descent.
fn assigned_rate_fpm(nav: &Nav, target_altitude_ft: f64) -> f64 {
    let perf = &nav.perf;
    let fs = &nav.flight_state;

    if fs.is_departure {
        let below_10k = fs.altitude_ft < 10_000.0;
        let accelerating_through_climb_speed = fs.ias_kts < 0.9 * perf.cruise_kts;
        if below_10k && accelerating_through_climb_speed {
            0.2 * perf.climb_fpm
        } else {
            0.7 * perf.climb_fpm
        }
    } else if target_altitude_ft >= fs.altitude_ft {
        perf.climb_fpm
    } else {
        perf.descent_fpm
    }
}

fn racetrack_pt_state(nav: &Nav) -> Option<&crate::procedures::RacetrackPtState> {
    match &nav.heading.mode.0 {
        HeadingMode::RacetrackPt(state) => Some(state),
        _ => None,
    }
}

/// Returns `(target_altitude_ft, rate_ft_per_min)`. `rate` is signed:
/// positive climbs, negative descends; `physics::update_altitude`
/// applies the baseline performance clamp and scaling on top of it.
pub fn target_altitude(nav: &mut Nav) -> (f64, f64) {
    let fs = nav.flight_state;

    // 1. after_speed trigger.
    if let (Some(target_altitude), Some(trigger_speed)) =
        (nav.altitude.after_speed, nav.altitude.after_speed_speed)
    {
        let assigned_absent_or_at_altitude = nav
            .altitude
            .assigned
            .map(|a| (a - fs.altitude_ft).abs() < 1.0)
            .unwrap_or(true);
        if assigned_absent_or_at_altitude && (fs.ias_kts - trigger_speed).abs() < 1.0 {
            nav.altitude.assigned = Some(target_altitude);
            nav.altitude.after_speed = None;
            nav.altitude.after_speed_speed = None;
        }
    }

    let (mut target, mut rate) = if fs.is_departure && fs.ias_kts <= nav.perf.v2_kts {
        // 2. Not yet airborne: hold.
        (fs.altitude_ft, 0.0)
    } else if fs.is_departure && fs.altitude_ft < fs.departure_elev_ft + 1500.0 {
        // 3. Just airborne, below the initial climb gate.
        (fs.departure_elev_ft + 1500.0, 0.6 * nav.perf.climb_fpm)
    } else if let Some(pt) = racetrack_pt_state(nav) {
        // 4. Active racetrack PT past its exit altitude.
        if pt.exit_altitude > 0.0 && fs.altitude_ft > pt.exit_altitude && pt.state != RacetrackState::Approaching
        {
            (pt.exit_altitude, -nav.perf.descent_fpm)
        } else if let Some(assigned) = nav.altitude.assigned {
            (assigned, assigned_rate_fpm(nav, assigned))
        } else if nav.altitude.cleared.is_some() {
            let cleared = nav.altitude.cleared.expect("checked above");
            (cleared, assigned_rate_fpm(nav, cleared))
        } else if let Some(restriction) = nav.altitude.restriction {
            let target = restriction.target_altitude(fs.altitude_ft);
            (target, assigned_rate_fpm(nav, target))
        } else {
            (fs.altitude_ft, 0.0)
        }
    } else if let Some(assigned) = nav.altitude.assigned {
        // 5. Controller-assigned altitude.
        (assigned, assigned_rate_fpm(nav, assigned))
    } else if nav.heading.is_procedure_turn_active() || nav.heading.assigned_heading().is_some() {
        // Look-ahead is suppressed mid-PT or under an assigned heading;
        // fall through to the carried restriction / cleared / hold chain.
        altitude_without_lookahead(nav)
    } else if let Some(lookahead) = waypoint_altitude_constraint(nav) {
        // 6. Waypoint look-ahead constraint.
        (lookahead.altitude_ft, assigned_rate_fpm(nav, lookahead.altitude_ft))
    } else {
        altitude_without_lookahead(nav)
    };

    // Always clip by FinalAltitude (spec.md invariant 4), resolving the
    // ApproachCleared/FinalAltitude Open Question by clamping
    // unconditionally rather than only on some paths (see DESIGN.md).
    if nav.final_altitude_ft > 0.0 {
        target = target.min(nav.final_altitude_ft);
    }

    if nav.altitude.expedite {
        rate = if target >= fs.altitude_ft {
            nav.perf.climb_fpm.max(rate.abs())
        } else {
            -nav.perf.descent_fpm.max(rate.abs())
        };
    }

    (target, rate)
}

fn altitude_without_lookahead(nav: &Nav) -> (f64, f64) {
    let fs = nav.flight_state;
    if let Some(cleared) = nav.altitude.cleared {
        // 7. Initial clearance.
        (cleared, assigned_rate_fpm(nav, cleared))
    } else if let Some(restriction) = nav.altitude.restriction {
        // 8. Carried restriction.
        let target = restriction.target_altitude(fs.altitude_ft);
        (target, assigned_rate_fpm(nav, target))
    } else {
        // 9. Hold.
        (fs.altitude_ft, 0.0)
    }
}
