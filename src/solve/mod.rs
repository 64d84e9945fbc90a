//! Target solvers (spec.md §2.4, §4.2-§4.4, §4.7): the interesting
//! planning logic that turns directives + route + approach state +
//! flight state into a single instantaneous target per axis.

mod altitude;
mod heading;
mod lookahead;
mod speed;

pub use altitude::target_altitude;
pub use heading::target_heading;
pub use lookahead::{waypoint_altitude_constraint, AltitudeLookahead};
pub use speed::target_speed;

use crate::geometry::haversine_nm;
use crate::nav::Nav;

/// Straight-line distance to the approach threshold, used by both the
/// speed and altitude solvers' "inside N nm final" branches. `None` when
/// no approach is attached.
pub(crate) fn final_approach_distance_nm(nav: &Nav) -> Option<f64> {
    nav.approach
        .assigned
        .as_ref()
        .map(|approach| haversine_nm(nav.flight_state.position, approach.threshold))
}
