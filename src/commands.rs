//! The controller command surface (spec.md §4.9): validates a directive
//! against the aircraft's current state/performance and, if accepted,
//! mutates `Nav` and returns the readback string the controller sees.
//! Heading changes go through [`crate::rand_source::RandomSource`] and
//! [`crate::clock::Clock`] to model pilot reaction delay rather than
//! taking effect immediately.

use crate::error::CommandRejection;
use crate::clock::Clock;
use crate::events::{Event, EventPoster};
use crate::geometry::{round_to_1000, TurnMethod};
use crate::guidance::{AltitudeRestriction, ApproachKind, DeferredHeading, NavFixAssignment};
use crate::approach::InterceptState;
use crate::nav::Nav;
use crate::rand_source::RandomSource;
use crate::world::World;

/// Tolerance (spec.md §4.3, §4.2) below which a speed/altitude is
/// considered "reached" for the purposes of arming an after-X trigger
/// immediately instead of waiting for it.
const SPEED_REACHED_TOLERANCE_KTS: f64 = 1.0;
const ALTITUDE_REACHED_TOLERANCE_FT: f64 = 1.0;

/// Queues a heading change to take effect after a pilot-reaction delay
/// (spec.md §4.9, §9) rather than applying it immediately. Cancels any
/// approach clearance if the aircraft wasn't already being vectored, and
/// clears a standing no-procedure-turn restriction.
pub fn assign_heading(
    nav: &mut Nav,
    heading: f64,
    turn_method: TurnMethod,
    clock: &dyn Clock,
    rand: &dyn RandomSource,
) -> Result<String, CommandRejection> {
    if !(heading > 0.0 && heading <= 360.0) {
        return Err(CommandRejection::HeadingOutOfRange { heading });
    }

    if nav.heading.assigned_heading().is_none() {
        nav.approach.cleared = false;
    }
    nav.approach.no_pt = false;

    let scheduled_time = clock.now_seconds() + rand.pilot_reaction_delay_seconds();
    nav.deferred_heading = Some(DeferredHeading {
        scheduled_time,
        heading,
        turn_method,
    });

    Ok(format!("fly heading {heading:.0}"))
}

/// Assigns an altitude directly, or — when `after_speed` is set and the
/// aircraft hasn't yet reached its assigned speed — arms it to take
/// effect once that speed is reached (spec.md §4.9).
pub fn assign_altitude(nav: &mut Nav, altitude_ft: f64, after_speed: bool) -> Result<String, CommandRejection> {
    if altitude_ft > nav.perf.ceiling_ft {
        return Err(CommandRejection::AltitudeAboveCeiling {
            altitude: altitude_ft,
            ceiling: nav.perf.ceiling_ft,
        });
    }

    if after_speed {
        if let Some(trigger_speed) = nav.speed.assigned {
            if (trigger_speed - nav.flight_state.ias_kts).abs() > SPEED_REACHED_TOLERANCE_KTS {
                nav.altitude.arm_after_speed(altitude_ft, trigger_speed);
                return Ok(format!("after reaching {trigger_speed:.0} knots, maintain {altitude_ft:.0}"));
            }
        }
    }

    nav.altitude.assigned = Some(altitude_ft);
    nav.altitude.after_speed = None;
    nav.altitude.after_speed_speed = None;

    let verb = if altitude_ft >= nav.flight_state.altitude_ft {
        "climb"
    } else {
        "descend"
    };
    Ok(format!("{verb} and maintain {altitude_ft:.0}"))
}

/// Assigns a speed directly, or — when `after_altitude` is set and the
/// aircraft hasn't yet reached its assigned altitude — arms it to take
/// effect once that altitude is reached (spec.md §4.9). A speed assigned
/// while cleared for the approach only holds until 5 mile final, where
/// the approach's own deceleration schedule takes back over.
pub fn assign_speed(nav: &mut Nav, speed_kts: f64, after_altitude: bool) -> Result<String, CommandRejection> {
    if speed_kts < nav.perf.landing_kts {
        return Err(CommandRejection::SpeedBelowLanding {
            speed: speed_kts,
            landing: nav.perf.landing_kts,
        });
    }
    if speed_kts > nav.perf.max_kts {
        return Err(CommandRejection::SpeedAboveMax {
            speed: speed_kts,
            max: nav.perf.max_kts,
        });
    }

    if after_altitude {
        if let Some(trigger_altitude) = nav.altitude.assigned {
            if (trigger_altitude - nav.flight_state.altitude_ft).abs() > ALTITUDE_REACHED_TOLERANCE_FT {
                nav.speed.arm_after_altitude(speed_kts, trigger_altitude);
                return Ok(format!("after reaching {trigger_altitude:.0}, maintain {speed_kts:.0} knots"));
            }
        }
    }

    nav.speed.assigned = Some(speed_kts);
    nav.speed.after_altitude = None;
    nav.speed.after_altitude_altitude = None;
    nav.speed.maintain_slowest_practical = false;
    nav.speed.maintain_maximum_forward = false;

    if nav.approach.cleared {
        return Ok(format!("maintain {speed_kts:.0} knots until 5 mile final"));
    }

    Ok(format!("maintain {speed_kts:.0} knots"))
}

/// Proceeds direct to `fix_name`, dropping any waypoints ahead of it and
/// clearing any pending deferred turn, localizer intercept, or
/// no-procedure-turn restriction — none of it applies to the new route.
pub fn direct_fix(nav: &mut Nav, fix_name: &str) -> Result<String, CommandRejection> {
    let index = nav
        .waypoints
        .iter()
        .position(|wp| wp.fix_name == fix_name)
        .ok_or_else(|| CommandRejection::FixNotInRoute {
            fix: fix_name.to_string(),
        })?;

    nav.waypoints.drain(0..index);
    nav.heading.clear();
    nav.deferred_heading = None;
    nav.approach.intercept_state = InterceptState::NotIntercepting;
    nav.approach.no_pt = false;

    Ok(format!("direct {fix_name}"))
}

/// Attaches a crossing restriction to a fix already in the route.
pub fn cross_fix_at(
    nav: &mut Nav,
    fix_name: &str,
    altitude: Option<AltitudeRestriction>,
    speed_kts: Option<f64>,
) -> Result<String, CommandRejection> {
    if !nav.waypoints.iter().any(|wp| wp.fix_name == fix_name) {
        return Err(CommandRejection::FixNotInRoute {
            fix: fix_name.to_string(),
        });
    }

    let entry = nav
        .fix_assignments
        .entry(fix_name.to_string())
        .or_insert_with(NavFixAssignment::default);
    if altitude.is_some() {
        entry.arrive_altitude = altitude;
    }
    if speed_kts.is_some() {
        entry.arrive_speed = speed_kts;
    }

    Ok(format!("cross {fix_name}"))
}

/// Attaches an approach to `Nav` without yet clearing it, per spec.md
/// §4.5 (`ExpectApproach` vs. `ClearedApproach`).
///
/// Looks for a fix common to both the current route and one of the
/// approach's charted transitions; that fix becomes the splice point
/// `waypoints::update_waypoints` watches for (`at_fix_cleared_route`).
/// With no common fix, there is nothing to wait for: the route is
/// replaced immediately and the aircraft holds its present heading
/// until a new one is assigned.
pub fn expect_approach(
    nav: &mut Nav,
    world: &dyn World,
    airport_id: &str,
    approach_id: &str,
) -> Result<String, CommandRejection> {
    let approach = world
        .airport(airport_id)
        .and_then(|airport| airport.approaches.get(approach_id).cloned())
        .ok_or_else(|| CommandRejection::UnknownApproach {
            approach_id: approach_id.to_string(),
        })?;

    let splice = approach.waypoints.iter().find_map(|transition| {
        transition
            .iter()
            .position(|wp| nav.waypoints.iter().any(|existing| existing.fix_name == wp.fix_name))
            .map(|idx| transition[idx..].to_vec())
    });

    match splice {
        Some(route) => nav.approach.at_fix_cleared_route = Some(route),
        None => {
            nav.waypoints = approach.waypoints.first().cloned().unwrap_or_default();
            nav.heading
                .set_assigned(nav.flight_state.heading, TurnMethod::Closest);
            nav.approach.at_fix_cleared_route = None;
        }
    }

    nav.approach.assigned = Some(approach);
    nav.approach.assigned_id = Some(approach_id.to_string());

    Ok(format!("expect the {approach_id} approach"))
}

pub fn cleared_approach(nav: &mut Nav) -> Result<String, CommandRejection> {
    if nav.approach.assigned.is_none() {
        return Err(CommandRejection::NoApproachAttached);
    }
    nav.approach.cleared = true;
    if nav.heading.assigned_heading().is_none() {
        crate::waypoints::maybe_start_procedure_turn(nav);
    }
    Ok("cleared approach".to_string())
}

/// Starts the localizer intercept machine (spec.md §4.5). Requires an
/// assigned vector heading to intercept from and an ILS approach.
pub fn intercept_localizer(nav: &mut Nav) -> Result<String, CommandRejection> {
    let Some(approach) = &nav.approach.assigned else {
        return Err(CommandRejection::NoApproachAttached);
    };
    if approach.kind != ApproachKind::Ils {
        return Err(CommandRejection::InterceptRequiresIls {
            approach_id: nav.approach.assigned_id.clone().unwrap_or_default(),
        });
    }
    if nav.heading.assigned_heading().is_none() {
        return Err(CommandRejection::InterceptWithoutAssignedHeading);
    }

    nav.approach.intercept_state = InterceptState::InitialHeading;
    Ok("intercept the localizer".to_string())
}

/// Aborts the approach: climbs to `round_to_1000(elev + 2500)` on the
/// current heading and discards any approach/route state (spec.md §4.9,
/// §8 S6). Posts a radio-transmission event, plus a handoff back to the
/// approach controller when the aircraft was being worked by the tower.
pub fn go_around(
    nav: &mut Nav,
    callsign: &str,
    tracked_by_tower: bool,
    approach_controller: &str,
    events: &dyn EventPoster,
) -> Result<String, CommandRejection> {
    let runway_heading = nav.flight_state.heading;
    let missed_approach_altitude_ft = round_to_1000(nav.flight_state.arrival_elev_ft + 2500.0);

    nav.approach.clear();
    nav.speed.clear_all();
    nav.altitude.clear_all();
    nav.altitude.assigned = Some(missed_approach_altitude_ft);
    nav.heading.set_assigned(runway_heading, TurnMethod::Closest);
    nav.waypoints.clear();

    events.post_event(Event::RadioTransmission {
        aircraft: callsign.to_string(),
        message: "going around".to_string(),
    });
    if tracked_by_tower {
        events.post_event(Event::Handoff {
            aircraft: callsign.to_string(),
            to_controller: approach_controller.to_string(),
        });
    }

    Ok("going around".to_string())
}

/// Releases a controller-assigned altitude so the charted SID
/// restrictions (via the look-ahead solver) take over.
pub fn climb_via_sid(nav: &mut Nav) -> Result<String, CommandRejection> {
    nav.altitude.assigned = None;
    nav.altitude.cleared = None;
    Ok("climb via the SID".to_string())
}

/// Releases a controller-assigned altitude so the charted STAR
/// restrictions (via the look-ahead solver) take over.
pub fn descend_via_star(nav: &mut Nav) -> Result<String, CommandRejection> {
    nav.altitude.assigned = None;
    nav.altitude.cleared = None;
    Ok("descend via the STAR".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::approach::NavApproach;
    use crate::clock::SimClock;
    use crate::flight_state::FlightState;
    use crate::geometry::LatLon;
    use crate::guidance::{NavAltitude, NavHeading, NavSpeed, Waypoint};
    use crate::perf::Perf;
    use crate::rand_source::SeededRandomSource;
    use crate::world::{Airport, InMemoryWorld};
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
        let fs = FlightState::on_ground(LatLon::new(51.0, 0.0), 0.0, 90.0, 0.0);
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
    fn assign_altitude_rejects_above_ceiling() {
        let mut nav = sample_nav();
        let result = assign_altitude(&mut nav, 50000.0, false);
        assert_eq!(
            result,
            Err(CommandRejection::AltitudeAboveCeiling {
                altitude: 50000.0,
                ceiling: 41000.0
            })
        );
    }

    #[test]
    fn assign_altitude_after_speed_arms_the_trigger_instead_of_assigning() {
        let mut nav = sample_nav();
        nav.flight_state.ias_kts = 180.0;
        nav.speed.assigned = Some(250.0);
        let result = assign_altitude(&mut nav, 10000.0, true);
        assert!(result.is_ok());
        assert_eq!(nav.altitude.assigned, None);
        assert_eq!(nav.altitude.after_speed, Some(10000.0));
        assert_eq!(nav.altitude.after_speed_speed, Some(250.0));
    }

    #[test]
    fn assign_altitude_after_speed_assigns_directly_once_speed_already_reached() {
        let mut nav = sample_nav();
        nav.flight_state.ias_kts = 250.0;
        nav.speed.assigned = Some(250.0);
        let result = assign_altitude(&mut nav, 10000.0, true);
        assert!(result.is_ok());
        assert_eq!(nav.altitude.assigned, Some(10000.0));
        assert_eq!(nav.altitude.after_speed, None);
    }

    #[test]
    fn assign_speed_rejects_below_landing_speed() {
        let mut nav = sample_nav();
        let result = assign_speed(&mut nav, 100.0, false);
        assert_eq!(
            result,
            Err(CommandRejection::SpeedBelowLanding {
                speed: 100.0,
                landing: 130.0
            })
        );
    }

    #[test]
    fn assign_speed_after_altitude_arms_the_trigger_instead_of_assigning() {
        let mut nav = sample_nav();
        nav.flight_state.altitude_ft = 8000.0;
        nav.altitude.assigned = Some(5000.0);
        let result = assign_speed(&mut nav, 210.0, true);
        assert!(result.is_ok());
        assert_eq!(nav.speed.assigned, None);
        assert_eq!(nav.speed.after_altitude, Some(210.0));
        assert_eq!(nav.speed.after_altitude_altitude, Some(5000.0));
    }

    #[test]
    fn assign_speed_while_cleared_for_approach_reads_back_until_five_mile_final() {
        let mut nav = sample_nav();
        nav.approach.cleared = true;
        let result = assign_speed(&mut nav, 180.0, false);
        assert_eq!(result, Ok("maintain 180 knots until 5 mile final".to_string()));
        assert_eq!(nav.speed.assigned, Some(180.0));
    }

    #[test]
    fn assign_heading_queues_a_deferred_change() {
        let mut nav = sample_nav();
        let clock = SimClock::new(100.0);
        let rand = SeededRandomSource::new(1);
        let result = assign_heading(&mut nav, 270.0, TurnMethod::Left, &clock, &rand);
        assert!(result.is_ok());
        let deferred = nav.deferred_heading.unwrap();
        assert_eq!(deferred.heading, 270.0);
        assert!(deferred.scheduled_time > 100.0);
    }

    #[test]
    fn assign_heading_rejects_zero_and_accepts_360() {
        let mut nav = sample_nav();
        let clock = SimClock::new(100.0);
        let rand = SeededRandomSource::new(1);
        assert_eq!(
            assign_heading(&mut nav, 0.0, TurnMethod::Left, &clock, &rand),
            Err(CommandRejection::HeadingOutOfRange { heading: 0.0 })
        );
        assert!(assign_heading(&mut nav, 360.0, TurnMethod::Left, &clock, &rand).is_ok());
    }

    #[test]
    fn assign_heading_cancels_approach_clearance_when_not_already_on_a_heading() {
        let mut nav = sample_nav();
        nav.approach.cleared = true;
        nav.approach.no_pt = true;
        let clock = SimClock::new(100.0);
        let rand = SeededRandomSource::new(1);
        assign_heading(&mut nav, 270.0, TurnMethod::Left, &clock, &rand).unwrap();
        assert!(!nav.approach.cleared);
        assert!(!nav.approach.no_pt);
    }

    #[test]
    fn assign_heading_keeps_approach_clearance_when_already_on_a_heading() {
        let mut nav = sample_nav();
        nav.heading.set_assigned(200.0, TurnMethod::Closest);
        nav.approach.cleared = true;
        let clock = SimClock::new(100.0);
        let rand = SeededRandomSource::new(1);
        assign_heading(&mut nav, 270.0, TurnMethod::Left, &clock, &rand).unwrap();
        assert!(nav.approach.cleared);
    }

    #[test]
    fn direct_fix_drops_waypoints_ahead_of_the_target() {
        let mut nav = sample_nav();
        nav.waypoints.push(Waypoint::new("AAA", LatLon::new(51.1, 0.0)));
        nav.waypoints.push(Waypoint::new("BBB", LatLon::new(51.2, 0.0)));
        let result = direct_fix(&mut nav, "BBB");
        assert!(result.is_ok());
        assert_eq!(nav.waypoints.len(), 1);
        assert_eq!(nav.waypoints[0].fix_name, "BBB");
    }

    #[test]
    fn direct_fix_clears_deferred_heading_intercept_and_no_pt() {
        let mut nav = sample_nav();
        nav.waypoints.push(Waypoint::new("BBB", LatLon::new(51.2, 0.0)));
        nav.deferred_heading = Some(DeferredHeading {
            scheduled_time: 10.0,
            heading: 90.0,
            turn_method: TurnMethod::Closest,
        });
        nav.approach.intercept_state = InterceptState::TurningToJoin;
        nav.approach.no_pt = true;
        direct_fix(&mut nav, "BBB").unwrap();
        assert!(nav.deferred_heading.is_none());
        assert_eq!(nav.approach.intercept_state, InterceptState::NotIntercepting);
        assert!(!nav.approach.no_pt);
    }

    #[test]
    fn direct_fix_rejects_unknown_fix() {
        let mut nav = sample_nav();
        let result = direct_fix(&mut nav, "ZZZ");
        assert_eq!(
            result,
            Err(CommandRejection::FixNotInRoute {
                fix: "ZZZ".to_string()
            })
        );
    }

    #[test]
    fn cleared_approach_requires_an_attached_approach() {
        let mut nav = sample_nav();
        let result = cleared_approach(&mut nav);
        assert_eq!(result, Err(CommandRejection::NoApproachAttached));
    }

    #[test]
    fn expect_approach_looks_up_the_world() {
        let mut world = InMemoryWorld::new(0.0);
        let mut approaches = HashMap::new();
        approaches.insert(
            "ILS28R".to_string(),
            crate::world::Approach {
                kind: ApproachKind::Ils,
                full_name: "ILS RWY 28R".to_string(),
                runway: "28R".to_string(),
                waypoints: vec![],
                threshold: LatLon::new(51.0, 0.0),
                course_true: 280.0,
            },
        );
        world.insert_airport(Airport {
            id: "KTST".to_string(),
            location: LatLon::new(51.0, 0.0),
            elevation_ft: 10.0,
            approaches,
        });

        let mut nav = sample_nav();
        let result = expect_approach(&mut nav, &world, "KTST", "ILS28R");
        assert!(result.is_ok());
        assert!(nav.approach.assigned.is_some());
    }

    #[test]
    fn expect_approach_records_splice_point_shared_with_the_route() {
        let mut world = InMemoryWorld::new(0.0);
        let mut approaches = HashMap::new();
        approaches.insert(
            "ILS28R".to_string(),
            crate::world::Approach {
                kind: ApproachKind::Ils,
                full_name: "ILS RWY 28R".to_string(),
                runway: "28R".to_string(),
                waypoints: vec![vec![
                    crate::guidance::Waypoint::new("IAF1", LatLon::new(51.5, 0.0)),
                    crate::guidance::Waypoint::new("FAF28R", LatLon::new(51.1, 0.0)),
                ]],
                threshold: LatLon::new(51.0, 0.0),
                course_true: 280.0,
            },
        );
        world.insert_airport(Airport {
            id: "KTST".to_string(),
            location: LatLon::new(51.0, 0.0),
            elevation_ft: 10.0,
            approaches,
        });

        let mut nav = sample_nav();
        nav.waypoints.push(crate::guidance::Waypoint::new("IAF1", LatLon::new(51.5, 0.0)));

        expect_approach(&mut nav, &world, "KTST", "ILS28R").unwrap();

        let route = nav.approach.at_fix_cleared_route.as_ref().expect("splice point found");
        assert_eq!(route.len(), 2);
        assert_eq!(route[0].fix_name, "IAF1");
        // The existing route is untouched until the aircraft actually turns
        // for the matching fix.
        assert_eq!(nav.waypoints.len(), 1);
    }

    #[test]
    fn expect_approach_falls_back_to_replacing_the_route_with_no_shared_fix() {
        let mut world = InMemoryWorld::new(0.0);
        let mut approaches = HashMap::new();
        approaches.insert(
            "ILS28R".to_string(),
            crate::world::Approach {
                kind: ApproachKind::Ils,
                full_name: "ILS RWY 28R".to_string(),
                runway: "28R".to_string(),
                waypoints: vec![vec![crate::guidance::Waypoint::new("FAF28R", LatLon::new(51.1, 0.0))]],
                threshold: LatLon::new(51.0, 0.0),
                course_true: 280.0,
            },
        );
        world.insert_airport(Airport {
            id: "KTST".to_string(),
            location: LatLon::new(51.0, 0.0),
            elevation_ft: 10.0,
            approaches,
        });

        let mut nav = sample_nav();
        nav.waypoints.push(crate::guidance::Waypoint::new("UNRELATED", LatLon::new(52.0, 0.0)));

        expect_approach(&mut nav, &world, "KTST", "ILS28R").unwrap();

        assert!(nav.approach.at_fix_cleared_route.is_none());
        assert_eq!(nav.waypoints.len(), 1);
        assert_eq!(nav.waypoints[0].fix_name, "FAF28R");
    }

    #[test]
    fn go_around_clears_approach_and_assigns_climb() {
        let mut nav = sample_nav();
        nav.flight_state.arrival_elev_ft = 600.0;
        nav.approach.cleared = true;
        nav.speed.assigned = Some(140.0);
        let events = crate::events::TracingEventPoster;
        let result = go_around(&mut nav, "TST123", true, "LON_S_APP", &events);
        assert!(result.is_ok());
        assert!(!nav.approach.cleared);
        // round_to_1000(600 + 2500) == round_to_1000(3100) == 3000.
        assert_eq!(nav.altitude.assigned, Some(3000.0));
    }
}
