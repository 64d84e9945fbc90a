//! Waypoint sequencing (spec.md §4.8): decides when to start turning for
//! the next leg and what happens the instant a waypoint is popped —
//! splicing in a cleared-at-fix route, clearing a spent arc/altitude
//! directive, promoting the charted restriction onto the carried
//! restriction, and starting a procedure turn if one is charted there.

use crate::geometry::TurnMethod;
use crate::guidance::{HeadingMode, ProcedureTurnChart, Waypoint};
use crate::intercept::should_turn_for_outbound;
use crate::nav::Nav;
use crate::procedures::{RacetrackPtState, Standard45PtState};
use crate::wind::WindModel;

/// Picks the outbound heading used to decide *when* to start the turn
/// for the waypoint about to be popped (spec.md §4.8 a-g):
///
/// a. a charted fixed heading on the waypoint itself
/// b. the tangential heading of a charted arc
/// c. the course toward the following waypoint
/// d. the aircraft's current heading, if nothing else applies
fn outbound_heading(nav: &Nav, wp: &Waypoint) -> f64 {
    if let Some(heading) = wp.heading {
        return heading;
    }
    if let Some(arc) = wp.arc {
        let bearing_to_center = crate::geometry::bearing_deg(wp.location, arc.center);
        return match arc.direction {
            crate::geometry::TurnDirection::Right => {
                crate::geometry::normalize_heading(bearing_to_center + 90.0)
            }
            crate::geometry::TurnDirection::Left => {
                crate::geometry::normalize_heading(bearing_to_center - 90.0)
            }
        };
    }
    if let Some(next) = nav.waypoints.get(1) {
        return crate::geometry::bearing_deg(wp.location, next.location);
    }
    nav.flight_state.heading
}

fn apply_fix_assignment(nav: &mut Nav, fix_name: &str) {
    if let Some(assignment) = nav.fix_assignments.remove(fix_name) {
        if let Some(restriction) = assignment.arrive_altitude {
            nav.altitude.restriction = Some(restriction);
        }
        if let Some(speed) = assignment.arrive_speed {
            nav.speed.restriction = Some(speed);
        }
        if let Some(heading) = assignment.depart_heading {
            nav.heading.set_assigned(heading, TurnMethod::Closest);
        }
    }
}

/// Advances the waypoint queue one tick. Returns the waypoint that was
/// just popped, if any — `nav::Nav::update` uses this to post a
/// radio-transmission event ("passing FIXNAME").
pub fn update_waypoints(nav: &mut Nav, wind: &dyn WindModel) -> Option<Waypoint> {
    let wp = nav.waypoints.first()?.clone();
    let fs = nav.flight_state;

    // Precedence (a): a cleared-at-fix approach route is waiting at this
    // exact fix. Head toward its next leg rather than the charted one.
    let cleared_at_fix_matches = nav
        .approach
        .at_fix_cleared_route
        .as_ref()
        .and_then(|route| route.first())
        .is_some_and(|first| first.fix_name == wp.fix_name);

    // A charted procedure turn with `no_pt`/entry_180_no_pt semantics is
    // skipped rather than flown when the aircraft already arrives close
    // to the inbound course.
    let pt_applies = wp.procedure_turn.is_some()
        && !wp.no_pt
        && !(wp.entry_180_no_pt
            && ProcedureTurnChart::entry_180_no_pt_applies(
                crate::geometry::bearing_deg(wp.location, fs.position),
                crate::geometry::bearing_deg(fs.position, wp.location),
            ));

    let target_outbound = if pt_applies {
        // The PT machine decides its own outbound leg; we only need to
        // know when to hand off, which happens exactly when the fix
        // itself is reached.
        crate::geometry::bearing_deg(fs.position, wp.location)
    } else if cleared_at_fix_matches {
        nav.approach
            .at_fix_cleared_route
            .as_ref()
            .and_then(|route| route.get(1))
            .map(|next| crate::geometry::bearing_deg(wp.location, next.location))
            .unwrap_or_else(|| outbound_heading(nav, &wp))
    } else {
        outbound_heading(nav, &wp)
    };

    let should_turn = should_turn_for_outbound(
        fs.position,
        fs.heading,
        target_outbound,
        wind,
        wp.location,
        fs.gs_kts,
        fs.nm_per_longitude,
    );

    if !should_turn {
        return None;
    }

    apply_fix_assignment(nav, &wp.fix_name);

    // On turn: a matching cleared-at-fix route replaces the charted one
    // before the rest of the pop logic runs, so restriction/PT promotion
    // below sees the approach's own copy of this fix.
    let wp = if cleared_at_fix_matches {
        nav.approach.cleared = true;
        nav.speed.assigned = None;
        let route = nav.approach.at_fix_cleared_route.take().expect("checked above");
        let spliced_wp = route.first().cloned().unwrap_or(wp);
        nav.waypoints = route;
        spliced_wp
    } else {
        wp
    };

    if let Some(restriction) = wp.altitude_restriction {
        nav.altitude.restriction = Some(restriction);
    }
    if let Some(speed) = wp.speed_kts {
        nav.speed.restriction = Some(speed);
    }

    if matches!(nav.heading.mode.0, HeadingMode::Arc { .. }) {
        nav.heading.clear();
    }
    if nav.approach.cleared {
        nav.altitude.cleared = None;
    }

    if pt_applies {
        match wp.procedure_turn.expect("pt_applies implies Some") {
            ProcedureTurnChart::Racetrack {
                direction,
                nm_limit,
                minute_limit,
                exit_altitude,
            } => {
                let approach_kind = nav
                    .approach
                    .assigned
                    .as_ref()
                    .map(|a| a.kind)
                    .unwrap_or(crate::guidance::ApproachKind::Ils);
                let aircraft_to_fix_heading = crate::geometry::bearing_deg(fs.position, wp.location);
                let pt = RacetrackPtState::new(
                    direction,
                    nm_limit,
                    minute_limit,
                    exit_altitude,
                    approach_kind,
                    wp.location,
                    target_outbound_reciprocal(target_outbound),
                    aircraft_to_fix_heading,
                    fs.gs_kts,
                );
                nav.heading.set_racetrack_pt(pt);
            }
            ProcedureTurnChart::Standard45 { direction } => {
                let pt = Standard45PtState::new(
                    direction,
                    wp.location,
                    target_outbound_reciprocal(target_outbound),
                );
                nav.heading.set_standard45_pt(pt);
            }
        }
    } else if let Some(heading) = wp.heading {
        nav.heading.set_assigned(heading, TurnMethod::Closest);
    }

    if nav.waypoints.first().map(|first| &first.fix_name) == Some(&wp.fix_name) {
        nav.waypoints.remove(0);
    }
    Some(wp)
}

/// Starts the charted procedure turn at the head of the route, if any,
/// outside the normal waypoint-pop path. Used by `commands::cleared_approach`
/// (spec.md §4.9: "trigger PT check") when clearance lands while the
/// aircraft is already flying direct to a PT fix with no assigned heading.
pub(crate) fn maybe_start_procedure_turn(nav: &mut Nav) {
    let Some(wp) = nav.waypoints.first().cloned() else {
        return;
    };
    if nav.heading.assigned_heading().is_some() {
        return;
    }
    let fs = nav.flight_state;
    let pt_applies = wp.procedure_turn.is_some()
        && !wp.no_pt
        && !(wp.entry_180_no_pt
            && ProcedureTurnChart::entry_180_no_pt_applies(
                crate::geometry::bearing_deg(wp.location, fs.position),
                crate::geometry::bearing_deg(fs.position, wp.location),
            ));
    if !pt_applies {
        return;
    }

    let inbound = target_outbound_reciprocal(crate::geometry::bearing_deg(fs.position, wp.location));
    match wp.procedure_turn.expect("pt_applies implies Some") {
        ProcedureTurnChart::Racetrack {
            direction,
            nm_limit,
            minute_limit,
            exit_altitude,
        } => {
            let approach_kind = nav
                .approach
                .assigned
                .as_ref()
                .map(|a| a.kind)
                .unwrap_or(crate::guidance::ApproachKind::Ils);
            let aircraft_to_fix_heading = crate::geometry::bearing_deg(fs.position, wp.location);
            let pt = RacetrackPtState::new(
                direction,
                nm_limit,
                minute_limit,
                exit_altitude,
                approach_kind,
                wp.location,
                inbound,
                aircraft_to_fix_heading,
                fs.gs_kts,
            );
            nav.heading.set_racetrack_pt(pt);
        }
        ProcedureTurnChart::Standard45 { direction } => {
            let pt = Standard45PtState::new(direction, wp.location, inbound);
            nav.heading.set_standard45_pt(pt);
        }
    }
}

/// The PT constructors take the *inbound* course to the fix; waypoints
/// only ever carry the leg's outbound-facing heading in `heading`, so we
/// reciprocal it when handing off into a procedure turn.
fn target_outbound_reciprocal(outbound: f64) -> f64 {
    crate::geometry::normalize_heading(outbound + 180.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approach::NavApproach;
    use crate::flight_state::FlightState;
    use crate::geometry::LatLon;
    use crate::guidance::{AltitudeRestriction, NavAltitude, NavHeading, NavSpeed};
    use crate::perf::Perf;
    use crate::wind::NoWind;
    use std::collections::HashMap;

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

    fn sample_nav() -> Nav {
        let mut fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 0.0, 0.0);
        fs.is_departure = false;
        fs.gs_kts = 200.0;
        fs.ias_kts = 200.0;
        Nav {
            flight_state: fs,
            perf: sample_perf(),
            altitude: NavAltitude::default(),
            speed: NavSpeed::default(),
            heading: NavHeading::default(),
            approach: NavApproach::default(),
            deferred_heading: None,
            fix_assignments: HashMap::new(),
            final_altitude_ft: 0.0,
            waypoints: Vec::new(),
        }
    }

    #[test]
    fn no_waypoints_returns_none() {
        let mut nav = sample_nav();
        let wind = NoWind;
        assert!(update_waypoints(&mut nav, &wind).is_none());
    }

    #[test]
    fn does_not_turn_while_far_from_the_fix() {
        let mut nav = sample_nav();
        nav.waypoints.push(Waypoint::new("AAA", LatLon::new(55.0, 0.0)));
        let wind = NoWind;
        assert!(update_waypoints(&mut nav, &wind).is_none());
        assert_eq!(nav.waypoints.len(), 1);
    }

    #[test]
    fn pops_and_promotes_restriction_once_close_to_the_fix() {
        let mut nav = sample_nav();
        nav.flight_state.position = LatLon::new(50.9995, 0.0);
        nav.waypoints.push(
            Waypoint::new("AAA", LatLon::new(51.0, 0.0))
                .with_altitude_restriction(AltitudeRestriction::at_or_below(8000.0)),
        );
        let wind = NoWind;
        let popped = update_waypoints(&mut nav, &wind);
        assert!(popped.is_some());
        assert_eq!(nav.waypoints.len(), 0);
        assert_eq!(nav.altitude.restriction, Some(AltitudeRestriction::at_or_below(8000.0)));
    }

    #[test]
    fn splices_cleared_at_fix_route_once_the_matching_fix_is_reached() {
        let mut nav = sample_nav();
        nav.flight_state.position = LatLon::new(50.9995, 0.0);
        nav.speed.assigned = Some(180.0);
        nav.waypoints.push(Waypoint::new("AAA", LatLon::new(51.0, 0.0)));
        nav.approach.at_fix_cleared_route = Some(vec![
            Waypoint::new("AAA", LatLon::new(51.0, 0.0)),
            Waypoint::new("BBB", LatLon::new(51.2, 0.0)),
        ]);

        let wind = NoWind;
        let popped = update_waypoints(&mut nav, &wind);

        assert!(popped.is_some());
        assert!(nav.approach.cleared);
        assert!(nav.speed.assigned.is_none());
        assert!(nav.approach.at_fix_cleared_route.is_none());
        assert_eq!(nav.waypoints.len(), 1);
        assert_eq!(nav.waypoints[0].fix_name, "BBB");
    }

    #[test]
    fn applies_pending_fix_assignment_when_popped() {
        let mut nav = sample_nav();
        nav.flight_state.position = LatLon::new(50.9995, 0.0);
        nav.waypoints.push(Waypoint::new("AAA", LatLon::new(51.0, 0.0)));
        nav.fix_assignments.insert(
            "AAA".to_string(),
            crate::guidance::NavFixAssignment {
                arrive_altitude: Some(AltitudeRestriction::at(5000.0)),
                arrive_speed: None,
                depart_fix: None,
                depart_heading: None,
            },
        );
        let wind = NoWind;
        update_waypoints(&mut nav, &wind);
        assert_eq!(nav.altitude.restriction, Some(AltitudeRestriction::at(5000.0)));
    }
}
