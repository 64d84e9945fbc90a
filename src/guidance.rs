//! Guidance directives: the three composable axes (`NavAltitude`,
//! `NavSpeed`, `NavHeading`), the charted route (`Waypoint`), and the
//! per-fix controller assignments that don't fit neatly into an axis
//! (`NavFixAssignment`).

use serde::{Deserialize, Serialize};

use crate::geometry::{LatLon, TurnDirection, TurnMethod};
use crate::procedures::{RacetrackPtState, Standard45PtState};

/// An altitude window a waypoint (or controller crossing restriction)
/// requires. `hi == 0` means "at or above `lo`"; `lo == 0` means "at or
/// below `hi`"; `lo == hi` means "at".
///
/// Internally an unbounded upper edge is normalized to 60,000ft rather than
/// carried as a literal `0` past construction — see the Open Questions in
/// DESIGN.md for why this convention was picked over passing `0` through.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AltitudeRestriction {
    pub lo: f64,
    pub hi: f64,
}

/// Ceiling used whenever a restriction's upper edge is unconstrained.
pub const UNBOUNDED_CEILING_FT: f64 = 60_000.0;

impl AltitudeRestriction {
    /// Builds a restriction from the wire convention (`hi == 0` => no
    /// upper bound, `lo == 0` => no lower bound), normalizing the
    /// unbounded edge to `UNBOUNDED_CEILING_FT`/`0.0` respectively.
    pub fn from_range(lo: f64, hi: f64) -> Self {
        let lo = if lo == 0.0 { 0.0 } else { lo };
        let hi = if hi == 0.0 { UNBOUNDED_CEILING_FT } else { hi };
        Self { lo, hi }
    }

    pub fn at_or_above(lo: f64) -> Self {
        Self::from_range(lo, 0.0)
    }

    pub fn at_or_below(hi: f64) -> Self {
        Self::from_range(0.0, hi)
    }

    pub fn at(alt: f64) -> Self {
        Self { lo: alt, hi: alt }
    }

    /// The altitude in `[lo, hi]` nearest to `current`. Returns `current`
    /// unchanged when it already satisfies the restriction.
    pub fn target_altitude(&self, current: f64) -> f64 {
        current.clamp(self.lo, self.hi)
    }

    pub fn is_satisfied(&self, altitude: f64) -> bool {
        altitude >= self.lo - 1e-6 && altitude <= self.hi + 1e-6
    }

    /// Intersects `self` with `possible`, returning the clamped range and
    /// whether the intersection is non-empty (feasible).
    pub fn clamp_range(&self, possible: (f64, f64)) -> ((f64, f64), bool) {
        let lo = self.lo.max(possible.0);
        let hi = self.hi.min(possible.1);
        if lo <= hi {
            ((lo, hi), true)
        } else {
            // Infeasible: clamp to whichever edge of `self` is nearer the
            // possible range, and report it.
            let edge = if possible.1 < self.lo { self.lo } else { self.hi };
            ((edge, edge), false)
        }
    }
}

/// A DME arc assignment: fly around `center` at `radius_nm`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ArcSpec {
    pub center: LatLon,
    pub radius_nm: f64,
    pub direction: TurnDirection,
    pub initial_heading: f64,
}

/// The approach type, needed by procedure-turn geometry for default leg
/// lengths (spec.md §4.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApproachKind {
    Ils,
    Rnav,
}

/// The charted procedure-turn shape attached to a waypoint, before any
/// runtime state has been entered.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ProcedureTurnChart {
    Racetrack {
        direction: TurnDirection,
        nm_limit: Option<f64>,
        minute_limit: Option<f64>,
        exit_altitude: f64,
    },
    Standard45 {
        direction: TurnDirection,
    },
}

impl ProcedureTurnChart {
    /// Whether a PT with `entry_180_no_pt` semantics should be skipped
    /// because the aircraft is already within 90 degrees of the inbound
    /// course (spec.md §4.6).
    pub fn entry_180_no_pt_applies(inbound: f64, aircraft_to_fix_heading: f64) -> bool {
        crate::geometry::heading_diff_abs(inbound, aircraft_to_fix_heading) < 90.0
    }
}

/// A single fix along the route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    pub fix_name: String,
    pub location: LatLon,
    pub altitude_restriction: Option<AltitudeRestriction>,
    pub speed_kts: Option<f64>,
    pub heading: Option<f64>,
    pub arc: Option<ArcSpec>,
    pub procedure_turn: Option<ProcedureTurnChart>,
    #[serde(default)]
    pub no_pt: bool,
    /// True when this PT uses "entry_180_no_pt" semantics: skip the PT
    /// entirely if the aircraft arrives within 90 degrees of inbound.
    #[serde(default)]
    pub entry_180_no_pt: bool,
}

impl Waypoint {
    pub fn new(fix_name: impl Into<String>, location: LatLon) -> Self {
        Self {
            fix_name: fix_name.into(),
            location,
            altitude_restriction: None,
            speed_kts: None,
            heading: None,
            arc: None,
            procedure_turn: None,
            no_pt: false,
            entry_180_no_pt: false,
        }
    }

    pub fn with_altitude_restriction(mut self, r: AltitudeRestriction) -> Self {
        self.altitude_restriction = Some(r);
        self
    }

    pub fn with_speed(mut self, kts: f64) -> Self {
        self.speed_kts = Some(kts);
        self
    }
}

/// Vertical-axis guidance directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavAltitude {
    pub assigned: Option<f64>,
    pub cleared: Option<f64>,
    pub after_speed: Option<f64>,
    pub after_speed_speed: Option<f64>,
    #[serde(default)]
    pub expedite: bool,
    pub restriction: Option<AltitudeRestriction>,
}

impl NavAltitude {
    pub fn clear_all(&mut self) {
        self.assigned = None;
        self.cleared = None;
        self.after_speed = None;
        self.after_speed_speed = None;
        self.expedite = false;
    }

    pub fn arm_after_speed(&mut self, altitude: f64, trigger_speed: f64) {
        self.after_speed = Some(altitude);
        self.after_speed_speed = Some(trigger_speed);
    }
}

/// Speed-axis guidance directive.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavSpeed {
    pub assigned: Option<f64>,
    pub after_altitude: Option<f64>,
    pub after_altitude_altitude: Option<f64>,
    #[serde(default)]
    pub maintain_slowest_practical: bool,
    #[serde(default)]
    pub maintain_maximum_forward: bool,
    pub restriction: Option<f64>,
}

impl NavSpeed {
    pub fn clear_all(&mut self) {
        self.assigned = None;
        self.after_altitude = None;
        self.after_altitude_altitude = None;
        self.maintain_slowest_practical = false;
        self.maintain_maximum_forward = false;
    }

    pub fn arm_after_altitude(&mut self, speed: f64, trigger_altitude: f64) {
        self.after_altitude = Some(speed);
        self.after_altitude_altitude = Some(trigger_altitude);
    }
}

/// The lateral guidance mode. Exactly one variant is ever "active" per
/// spec.md invariant 2; `None` means "follow the charted route".
///
/// Internally tagged for serde so the active variant survives a
/// round-trip (spec.md §9, Design Notes: "do not hide variant identity
/// behind an interface-only abstraction").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode")]
pub enum HeadingMode {
    None,
    Assigned {
        heading: f64,
        turn_method: TurnMethod,
    },
    Arc {
        spec: ArcSpec,
        joining_arc: bool,
    },
    RacetrackPt(RacetrackPtState),
    Standard45Pt(Standard45PtState),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavHeading {
    pub mode: HeadingModeBox,
}

/// Thin wrapper so `NavHeading` can `#[derive(Default)]` (the tagged enum
/// itself has no derivable default variant without this).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadingModeBox(pub HeadingMode);

impl Default for HeadingModeBox {
    fn default() -> Self {
        HeadingModeBox(HeadingMode::None)
    }
}

impl NavHeading {
    pub fn is_following_route(&self) -> bool {
        matches!(self.mode.0, HeadingMode::None)
    }

    pub fn assigned_heading(&self) -> Option<(f64, TurnMethod)> {
        match &self.mode.0 {
            HeadingMode::Assigned {
                heading,
                turn_method,
            } => Some((*heading, *turn_method)),
            _ => None,
        }
    }

    pub fn set_assigned(&mut self, heading: f64, turn_method: TurnMethod) {
        self.mode = HeadingModeBox(HeadingMode::Assigned {
            heading,
            turn_method,
        });
    }

    pub fn clear(&mut self) {
        self.mode = HeadingModeBox(HeadingMode::None);
    }

    pub fn set_arc(&mut self, spec: ArcSpec, joining_arc: bool) {
        self.mode = HeadingModeBox(HeadingMode::Arc { spec, joining_arc });
    }

    pub fn set_racetrack_pt(&mut self, state: RacetrackPtState) {
        self.mode = HeadingModeBox(HeadingMode::RacetrackPt(state));
    }

    pub fn set_standard45_pt(&mut self, state: Standard45PtState) {
        self.mode = HeadingModeBox(HeadingMode::Standard45Pt(state));
    }

    pub fn is_procedure_turn_active(&self) -> bool {
        matches!(
            self.mode.0,
            HeadingMode::RacetrackPt(_) | HeadingMode::Standard45Pt(_)
        )
    }
}

/// A controller-issued heading change queued to take effect a few seconds
/// later, modelling pilot reaction delay (spec.md §4.9, §9).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeferredHeading {
    pub scheduled_time: f64,
    pub heading: f64,
    pub turn_method: TurnMethod,
}

/// Per-fix controller assignments that don't map onto a single global
/// axis directive (crossing restrictions, departure fix/heading).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavFixAssignment {
    pub arrive_altitude: Option<AltitudeRestriction>,
    pub arrive_speed: Option<f64>,
    pub depart_fix: Option<String>,
    pub depart_heading: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn restriction_at_or_above_normalizes_unbounded_hi() {
        let r = AltitudeRestriction::at_or_above(5000.0);
        assert_eq!(r.lo, 5000.0);
        assert_eq!(r.hi, UNBOUNDED_CEILING_FT);
    }

    #[test]
    fn target_altitude_is_current_when_already_satisfied() {
        let r = AltitudeRestriction::from_range(4000.0, 6000.0);
        assert_eq!(r.target_altitude(5000.0), 5000.0);
        // boundary behaviour: exactly at lo/hi returns current unchanged
        assert_eq!(r.target_altitude(4000.0), 4000.0);
        assert_eq!(r.target_altitude(6000.0), 6000.0);
    }

    #[test]
    fn target_altitude_clamps_outside_range() {
        let r = AltitudeRestriction::from_range(4000.0, 6000.0);
        assert_eq!(r.target_altitude(3000.0), 4000.0);
        assert_eq!(r.target_altitude(7000.0), 6000.0);
    }

    #[test]
    fn clamp_range_intersects_when_feasible() {
        let r = AltitudeRestriction::from_range(4000.0, 10000.0);
        let (range, feasible) = r.clamp_range((6000.0, 20000.0));
        assert!(feasible);
        assert_eq!(range, (6000.0, 10000.0));
    }

    #[test]
    fn clamp_range_reports_infeasible_and_clamps_to_nearest_edge() {
        let r = AltitudeRestriction::from_range(4000.0, 6000.0);
        let (range, feasible) = r.clamp_range((7000.0, 9000.0));
        assert!(!feasible);
        assert_eq!(range, (6000.0, 6000.0));
    }

    #[test]
    fn nav_heading_default_follows_route() {
        let h = NavHeading::default();
        assert!(h.is_following_route());
    }

    #[test]
    fn heading_mode_round_trips_through_json_with_tag() {
        let mut h = NavHeading::default();
        h.set_assigned(270.0, TurnMethod::Left);
        let json = serde_json::to_string(&h).unwrap();
        assert!(json.contains("\"mode\":\"Assigned\""));
        let back: NavHeading = serde_json::from_str(&json).unwrap();
        assert_eq!(h, back);
    }
}
