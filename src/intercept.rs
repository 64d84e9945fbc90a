//! Shared "ghost aircraft" simulation used by both localizer interception
//! (`approach::localizer_heading`) and procedure-turn outbound/inbound
//! turn timing (`procedures`). Both need the same primitive: fly a fixed
//! heading forward a few seconds and ask whether the simulated track is
//! about to cross a reference line.

use crate::geometry::{
    advance_position, destination_point, eta_seconds, haversine_nm, heading_diff_abs,
    signed_distance_to_line, LatLon, Vector2,
};
use crate::wind::WindModel;

/// Ground velocity for flying `heading_deg` at `gs_kts`, nose corrected
/// into the wind the way `solve::target_heading` does for the real
/// aircraft. The ghost sims use the *resulting* ground track, so wind
/// drift is represented even though the ghost never turns.
fn ground_velocity(heading_deg: f64, gs_kts: f64, wind: &dyn WindModel) -> Vector2 {
    Vector2::from_heading(heading_deg, gs_kts).add(wind.average_wind_vector())
}

/// Simulates flying `heading_deg` forward from `start` and reports whether
/// the track is about to cross `line` (start -> end) within `0.25nm` with
/// a resulting ground track within `tolerance_deg` of `reference_course`.
/// Used for localizer capture (spec.md §4.5) and the teardrop/parallel
/// inbound-radial check in the racetrack procedure turn (spec.md §4.6).
pub fn should_turn_to_intercept(
    start: LatLon,
    heading_deg: f64,
    wind: &dyn WindModel,
    reference_course: f64,
    line: (LatLon, LatLon),
    gs_kts: f64,
    nm_per_longitude: f64,
    max_seconds: u32,
) -> bool {
    if gs_kts <= 0.0 {
        return false;
    }

    let gv = ground_velocity(heading_deg, gs_kts, wind);
    let mut pos = start;
    let mut prev_sign = signed_distance_to_line(pos, line.0, line.1, nm_per_longitude).signum();

    for _ in 0..max_seconds {
        pos = advance_position(pos, gv, nm_per_longitude, 1.0);
        let dist = signed_distance_to_line(pos, line.0, line.1, nm_per_longitude);
        let sign = dist.signum();

        let close_enough = dist.abs() < 0.25;
        let aligned = heading_diff_abs(gv.heading(), reference_course) <= 3.5;

        if close_enough && aligned {
            return true;
        }
        if sign != 0.0 && sign != prev_sign && dist.abs() < 0.25 {
            return true;
        }
        prev_sign = sign;
    }

    false
}

/// Decides whether to start the outbound turn at a waypoint or PT leg, per
/// spec.md §4.8: true when ETA to `fix` is under 2 seconds, or when flying
/// `outbound_heading` for `1 + turn_angle/3` one-second ticks would cross
/// the outbound radial (the line through `fix` along `outbound_heading`).
pub fn should_turn_for_outbound(
    position: LatLon,
    current_heading: f64,
    outbound_heading: f64,
    wind: &dyn WindModel,
    fix: LatLon,
    gs_kts: f64,
    nm_per_longitude: f64,
) -> bool {
    let dist_to_fix = haversine_nm(position, fix);
    let eta = eta_seconds(dist_to_fix, gs_kts);
    if eta < 2.0 {
        return true;
    }

    let turn_angle = heading_diff_abs(current_heading, outbound_heading);
    let ticks = (1.0 + turn_angle / 3.0).round().max(1.0) as u32;

    let radial_far_point = destination_point(fix, outbound_heading, 5.0);
    let start_sign =
        signed_distance_to_line(position, fix, radial_far_point, nm_per_longitude).signum();

    let gv = ground_velocity(outbound_heading, gs_kts, wind);
    let mut pos = position;
    for _ in 0..ticks {
        pos = advance_position(pos, gv, nm_per_longitude, 1.0);
        let sign = signed_distance_to_line(pos, fix, radial_far_point, nm_per_longitude).signum();
        if sign != 0.0 && sign != start_sign {
            return true;
        }
    }

    false
}
