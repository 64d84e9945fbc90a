//! Target heading cascade (spec.md §4.4).

use crate::approach::{localizer_heading, InterceptState};
use crate::clock::Clock;
use crate::config::NavTuning;
use crate::geometry::{
    bearing_deg, destination_point, haversine_nm, normalize_heading, true_to_magnetic, LatLon,
    TurnDirection, TurnMethod, Vector2,
};
use crate::guidance::{ArcSpec, HeadingMode};
use crate::nav::Nav;
use crate::procedures::PtContext;
use crate::wind::WindModel;

const ARC_JOIN_TOLERANCE_NM: f64 = 1.0;

/// Required heading (true) to make good `desired_true_track` over the
/// ground at `gs_kts` against `wind`, using the same additive
/// vector-composition model the ghost-aircraft sims use (just inverted):
/// subtract the wind vector from the desired ground vector rather than
/// solving the wind-triangle trigonometrically.
fn heading_for_ground_track(desired_true_track: f64, gs_kts: f64, wind: Vector2) -> f64 {
    if gs_kts <= 0.0 {
        return desired_true_track;
    }
    let desired_ground_vector = Vector2::from_heading(desired_true_track, gs_kts);
    let required_air_vector = desired_ground_vector.sub(wind);
    if required_air_vector.magnitude() < 1e-6 {
        desired_true_track
    } else {
        required_air_vector.heading()
    }
}

fn arc_tangential_true_heading(direction: TurnDirection, bearing_to_center: f64) -> f64 {
    match direction {
        TurnDirection::Right => normalize_heading(bearing_to_center + 90.0),
        TurnDirection::Left => normalize_heading(bearing_to_center - 90.0),
    }
}

/// Drives the DME arc machine one tick, returning the true-course target
/// and whether it just finished joining. `nav`'s `joining_arc` flag is
/// flipped in place once the aircraft settles onto the arc radius.
fn arc_true_heading(nav: &mut Nav, spec: ArcSpec, joining_arc: bool) -> f64 {
    let position = nav.flight_state.position;
    let bearing_to_center = bearing_deg(position, spec.center);
    let distance_nm = haversine_nm(position, spec.center);

    if joining_arc {
        if (distance_nm - spec.radius_nm).abs() < ARC_JOIN_TOLERANCE_NM {
            nav.heading.set_arc(spec, false);
            arc_tangential_true_heading(spec.direction, bearing_to_center)
        } else {
            let lead_point = destination_point(spec.center, bearing_to_center, spec.radius_nm);
            bearing_deg(position, lead_point)
        }
    } else {
        arc_tangential_true_heading(spec.direction, bearing_to_center)
    }
}

/// Returns `(target_heading_magnetic, turn_method, rate_deg_per_s)`.
/// Mutates `nav.heading`/`nav.approach`/`nav.waypoints` when a
/// lower-priority machine (localizer, procedure turn, deferred heading)
/// retires or installs a new directive this tick.
pub fn target_heading(
    nav: &mut Nav,
    wind: &dyn WindModel,
    clock: &dyn Clock,
    tuning: &NavTuning,
) -> (f64, TurnMethod, f64) {
    let rate = tuning.standard_turn_rate_deg_s;

    // 1. Deferred heading adoption (pilot reaction delay, spec.md §9).
    if let Some(deferred) = nav.deferred_heading.clone() {
        if clock.now_seconds() >= deferred.scheduled_time {
            nav.heading.set_assigned(deferred.heading, deferred.turn_method);
            nav.deferred_heading = None;
        }
    }

    // 2. Localizer interception delegation.
    if matches!(
        nav.approach.intercept_state,
        InterceptState::InitialHeading | InterceptState::TurningToJoin
    ) {
        if let (Some((assigned_heading, assigned_turn_method)), Some(approach)) =
            (nav.heading.assigned_heading(), nav.approach.assigned.clone())
        {
            let outcome = localizer_heading(
                nav.approach.intercept_state,
                assigned_heading,
                assigned_turn_method,
                &approach,
                &nav.flight_state,
                wind,
                nav.approach.cleared,
            );
            nav.approach.intercept_state = outcome.new_intercept_state;
            if let Some(route) = outcome.replace_route {
                nav.waypoints = route;
            }
            if outcome.clear_assigned_heading {
                nav.heading.clear();
            }
            if outcome.clear_altitude_directive {
                nav.altitude.clear_all();
            }
            if let Some((heading, method)) = outcome.target_heading {
                return (true_to_magnetic(heading, nav.flight_state.magnetic_variation), method, rate);
            }
        }
    }

    // 3. Procedure-turn delegation.
    let pt_ctx = PtContext {
        position: nav.flight_state.position,
        heading: nav.flight_state.heading,
        gs_kts: nav.flight_state.gs_kts,
        nm_per_longitude: nav.flight_state.nm_per_longitude,
        wind,
    };
    match &mut nav.heading.mode.0 {
        HeadingMode::RacetrackPt(pt) => {
            if let Some((heading, method)) = pt.target_heading(&pt_ctx) {
                return (
                    true_to_magnetic(heading, nav.flight_state.magnetic_variation),
                    method,
                    rate,
                );
            } else {
                nav.heading.clear();
            }
        }
        HeadingMode::Standard45Pt(pt) => {
            let tick = 1.0;
            if let Some((heading, method)) = pt.target_heading(&pt_ctx, tick) {
                return (
                    true_to_magnetic(heading, nav.flight_state.magnetic_variation),
                    method,
                    rate,
                );
            } else {
                nav.heading.clear();
            }
        }
        _ => {}
    }

    // 4. Assigned heading.
    if let Some((heading, method)) = nav.heading.assigned_heading() {
        return (heading, method, rate);
    }

    // 5/6. Geometric target point + wind correction.
    let fs = nav.flight_state;
    let desired_true_track = match nav.heading.mode.0 {
        HeadingMode::Arc { spec, joining_arc } => arc_true_heading(nav, spec, joining_arc),
        _ => match nav.waypoints.first() {
            Some(wp) => bearing_deg(fs.position, wp.location),
            None => fs.heading,
        },
    };

    let wind_vector = wind.wind_vector(fs.position, fs.altitude_ft);
    let true_heading = heading_for_ground_track(desired_true_track, fs.gs_kts, wind_vector);
    let magnetic_heading = true_to_magnetic(true_heading, fs.magnetic_variation);

    (magnetic_heading, TurnMethod::Closest, rate)
}
