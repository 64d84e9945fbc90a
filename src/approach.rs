//! `NavApproach` and localizer interception (spec.md §4.5): the assigned
//! instrument approach, its clearance/no-PT flags, and the
//! `InterceptState` machine that steers from a vectored heading onto the
//! localizer and splices in the approach's own waypoints.

use serde::{Deserialize, Serialize};

use crate::geometry::{bearing_deg, haversine_nm, heading_diff_abs, signed_distance_to_line, TurnMethod};
use crate::guidance::Waypoint;
use crate::flight_state::FlightState;
use crate::intercept::should_turn_to_intercept;
use crate::wind::WindModel;
use crate::world::Approach;

const GHOST_SIM_MAX_SECONDS: u32 = 120;
const FLY_THROUGH_THRESHOLD_DEG: f64 = 45.0;
const JOIN_LATERAL_DISTANCE_NM: f64 = 0.2;
const SPLICE_AHEAD_THRESHOLD_DEG: f64 = 70.0;
const SPLICE_ALIGNMENT_TOLERANCE_DEG: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum InterceptState {
    #[default]
    NotIntercepting,
    InitialHeading,
    TurningToJoin,
    HoldingLocalizer,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavApproach {
    pub assigned: Option<Approach>,
    pub assigned_id: Option<String>,
    pub cleared: bool,
    pub intercept_state: InterceptState,
    pub no_pt: bool,
    /// Deep copy of the waypoints to splice in once a fix assignment
    /// clears this approach (spec.md §9: own a copy rather than alias
    /// the approach definition's waypoints).
    pub at_fix_cleared_route: Option<Vec<Waypoint>>,
}

impl NavApproach {
    pub fn clear(&mut self) {
        self.assigned = None;
        self.assigned_id = None;
        self.cleared = false;
        self.intercept_state = InterceptState::NotIntercepting;
        self.no_pt = false;
        self.at_fix_cleared_route = None;
    }
}

/// What the localizer state machine wants to happen to the rest of
/// `Nav` this tick. `target_heading.is_none()` means "no longer
/// overriding heading guidance" (the state machine has either retired
/// into `HoldingLocalizer` or has nothing to add).
pub struct LocalizerOutcome {
    pub target_heading: Option<(f64, TurnMethod)>,
    pub new_intercept_state: InterceptState,
    pub replace_route: Option<Vec<Waypoint>>,
    pub clear_assigned_heading: bool,
    pub clear_altitude_directive: bool,
}

/// Drives one tick of the `InitialHeading` / `TurningToJoin` /
/// `HoldingLocalizer` machine (spec.md §4.5). Only called when
/// `intercept_state` is `InitialHeading` or `TurningToJoin` and a
/// heading is assigned; `NotIntercepting`/`HoldingLocalizer` are handled
/// by the caller without reaching this function.
pub fn localizer_heading(
    state: InterceptState,
    assigned_heading: f64,
    assigned_turn_method: TurnMethod,
    approach: &Approach,
    fs: &FlightState,
    wind: &dyn WindModel,
    cleared_for_approach: bool,
) -> LocalizerOutcome {
    let course = approach.heading(fs.nm_per_longitude, fs.magnetic_variation);
    let line = approach.line();

    match state {
        InterceptState::InitialHeading => {
            if heading_diff_abs(assigned_heading, course) > FLY_THROUGH_THRESHOLD_DEG {
                tracing::debug!(assigned_heading, course, "localizer: vector too far off course, flying through");
                return LocalizerOutcome {
                    target_heading: Some((assigned_heading, assigned_turn_method)),
                    new_intercept_state: InterceptState::InitialHeading,
                    replace_route: None,
                    clear_assigned_heading: false,
                    clear_altitude_directive: false,
                };
            }

            let should_turn = should_turn_to_intercept(
                fs.position,
                assigned_heading,
                wind,
                course,
                line,
                fs.gs_kts,
                fs.nm_per_longitude,
                GHOST_SIM_MAX_SECONDS,
            );

            if should_turn {
                tracing::info!("localizer: turning to join");
                LocalizerOutcome {
                    target_heading: Some((course, TurnMethod::Closest)),
                    new_intercept_state: InterceptState::TurningToJoin,
                    replace_route: Some(Vec::new()),
                    clear_assigned_heading: false,
                    clear_altitude_directive: false,
                }
            } else {
                LocalizerOutcome {
                    target_heading: Some((assigned_heading, assigned_turn_method)),
                    new_intercept_state: InterceptState::InitialHeading,
                    replace_route: None,
                    clear_assigned_heading: false,
                    clear_altitude_directive: false,
                }
            }
        }

        InterceptState::TurningToJoin => {
            let lateral_distance =
                signed_distance_to_line(fs.position, line.0, line.1, fs.nm_per_longitude).abs();

            if lateral_distance < JOIN_LATERAL_DISTANCE_NM {
                let aircraft_to_threshold_nm = haversine_nm(fs.position, line.1);
                let mut spliced: Vec<Waypoint> = approach
                    .all_waypoints()
                    .filter(|wp| {
                        let ahead = heading_diff_abs(fs.heading, bearing_deg(fs.position, wp.location))
                            < SPLICE_AHEAD_THRESHOLD_DEG;
                        let closer_than_aircraft =
                            haversine_nm(wp.location, line.1) < aircraft_to_threshold_nm;
                        let aligned = heading_diff_abs(bearing_deg(wp.location, line.1), course)
                            <= SPLICE_ALIGNMENT_TOLERANCE_DEG;
                        ahead && closer_than_aircraft && aligned
                    })
                    .cloned()
                    .collect();
                spliced.sort_by(|a, b| {
                    haversine_nm(b.location, line.1)
                        .partial_cmp(&haversine_nm(a.location, line.1))
                        .unwrap_or(std::cmp::Ordering::Equal)
                });

                tracing::info!(count = spliced.len(), "localizer: holding, route replaced");
                LocalizerOutcome {
                    target_heading: None,
                    new_intercept_state: InterceptState::HoldingLocalizer,
                    replace_route: Some(spliced),
                    clear_assigned_heading: true,
                    clear_altitude_directive: cleared_for_approach,
                }
            } else {
                LocalizerOutcome {
                    target_heading: Some((course, TurnMethod::Closest)),
                    new_intercept_state: InterceptState::TurningToJoin,
                    replace_route: None,
                    clear_assigned_heading: false,
                    clear_altitude_directive: false,
                }
            }
        }

        InterceptState::NotIntercepting | InterceptState::HoldingLocalizer => LocalizerOutcome {
            target_heading: None,
            new_intercept_state: state,
            replace_route: None,
            clear_assigned_heading: false,
            clear_altitude_directive: false,
        },
    }
}
