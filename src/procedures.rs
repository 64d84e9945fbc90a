//! Procedure-turn state machines (spec.md §4.6): the racetrack
//! (holding-in-lieu-of-PT) and standard 45/180 course reversals flown
//! when a waypoint with a charted `ProcedureTurnChart` is popped while
//! cleared for the approach.
//!
//! Both machines are driven one tick at a time from `nav::Nav::update`,
//! which passes a fresh [`PtContext`] rather than a back-pointer to
//! `Nav` itself (spec.md §9's note against embedding a back-reference).

use serde::{Deserialize, Serialize};

use crate::geometry::{
    bearing_deg, destination_point, haversine_nm, heading_diff_abs, heading_diff_signed,
    normalize_heading, LatLon, TurnDirection, TurnMethod,
};
use crate::guidance::ApproachKind;
use crate::intercept::{should_turn_for_outbound, should_turn_to_intercept};
use crate::wind::WindModel;

const ALIGNMENT_TOLERANCE_DEG: f64 = 5.0;
const GHOST_SIM_MAX_SECONDS: u32 = 120;
const STANDARD_LEG_SECONDS: f64 = 60.0;

/// Everything a procedure-turn state machine needs to decide its next
/// target heading, bundled so `Nav::update` can pass it by value instead
/// of a back-pointer to the whole `Nav`.
pub struct PtContext<'a> {
    pub position: LatLon,
    pub heading: f64,
    pub gs_kts: f64,
    pub nm_per_longitude: f64,
    pub wind: &'a dyn WindModel,
}

/// How the aircraft enters a racetrack procedure turn, chosen from the
/// angle between the inbound course and the aircraft's direct-to-fix
/// heading (the classic 70/110 sectoring rule).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PtEntry {
    Parallel,
    Teardrop,
    DirectShort,
    DirectLong,
}

impl PtEntry {
    /// spec.md §4.6: "entry selection based on inbound heading vs.
    /// aircraft-to-fix heading". `direction` is the PT's charted turn
    /// direction, used to tell a short direct entry (turn matches PT
    /// direction) from a long one (turn is against it).
    pub fn select(
        direction: TurnDirection,
        inbound_heading: f64,
        aircraft_to_fix_heading: f64,
    ) -> PtEntry {
        let outbound_heading = normalize_heading(inbound_heading + 180.0);
        let diff = heading_diff_signed(outbound_heading, aircraft_to_fix_heading);
        let abs_diff = diff.abs();

        if abs_diff <= 70.0 {
            let same_side = match direction {
                TurnDirection::Right => diff >= 0.0,
                TurnDirection::Left => diff <= 0.0,
            };
            if same_side {
                PtEntry::DirectShort
            } else {
                PtEntry::DirectLong
            }
        } else if abs_diff >= 110.0 {
            PtEntry::Parallel
        } else {
            PtEntry::Teardrop
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RacetrackState {
    Approaching,
    TurningOutbound,
    FlyingOutbound,
    TurningInbound,
    FlyingInbound,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RacetrackPtState {
    pub entry: PtEntry,
    pub state: RacetrackState,
    pub direction: TurnDirection,
    pub fix: LatLon,
    pub inbound_heading: f64,
    pub outbound_heading: f64,
    pub outbound_turn_method: TurnMethod,
    pub leg_length_nm: f64,
    pub exit_altitude: f64,
    /// Offset inbound heading flown during the parallel entry's extra
    /// `FlyingInbound` leg before it rejoins the inbound course.
    pub parallel_offset_heading: f64,
}

impl RacetrackPtState {
    /// Builds a fresh racetrack PT, picking the entry and outbound
    /// heading/leg length per spec.md §4.6. `gs_kts` is sampled once at
    /// entry to size the outbound leg; the PT does not re-derive it.
    pub fn new(
        direction: TurnDirection,
        nm_limit: Option<f64>,
        minute_limit: Option<f64>,
        exit_altitude: f64,
        approach_kind: ApproachKind,
        fix: LatLon,
        inbound_heading: f64,
        aircraft_to_fix_heading: f64,
        gs_kts: f64,
    ) -> Self {
        let entry = PtEntry::select(direction, inbound_heading, aircraft_to_fix_heading);
        let base_outbound = normalize_heading(inbound_heading + 180.0);

        let outbound_heading = if entry == PtEntry::Teardrop {
            match direction {
                TurnDirection::Right => normalize_heading(base_outbound + 30.0),
                TurnDirection::Left => normalize_heading(base_outbound - 30.0),
            }
        } else {
            base_outbound
        };

        let outbound_turn_method = match entry {
            PtEntry::Parallel => match direction {
                TurnDirection::Right => TurnMethod::Left,
                TurnDirection::Left => TurnMethod::Right,
            },
            PtEntry::Teardrop => TurnMethod::Closest,
            PtEntry::DirectShort | PtEntry::DirectLong => match direction {
                TurnDirection::Right => TurnMethod::Right,
                TurnDirection::Left => TurnMethod::Left,
            },
        };

        let default_leg_nm = match approach_kind {
            ApproachKind::Ils => gs_kts / 60.0,
            ApproachKind::Rnav => 2.0,
        };
        let mut leg_length_nm = nm_limit
            .map(|nm| nm / 2.0)
            .or_else(|| minute_limit.map(|min| min * gs_kts / 60.0))
            .unwrap_or(default_leg_nm);
        if entry == PtEntry::Teardrop {
            leg_length_nm *= 1.5;
        }

        let parallel_offset_heading = match direction {
            TurnDirection::Right => normalize_heading(inbound_heading - 30.0),
            TurnDirection::Left => normalize_heading(inbound_heading + 30.0),
        };

        Self {
            entry,
            state: RacetrackState::Approaching,
            direction,
            fix,
            inbound_heading,
            outbound_heading,
            outbound_turn_method,
            leg_length_nm,
            exit_altitude,
            parallel_offset_heading,
        }
    }

    fn inbound_line(&self) -> (LatLon, LatLon) {
        (
            destination_point(self.fix, normalize_heading(self.inbound_heading + 180.0), 5.0),
            destination_point(self.fix, self.inbound_heading, 5.0),
        )
    }

    /// Advances the state machine one tick and returns the target
    /// heading/turn method to steer toward, or `None` once the PT has
    /// retired and route-following should resume.
    pub fn target_heading(&mut self, ctx: &PtContext) -> Option<(f64, TurnMethod)> {
        match self.state {
            RacetrackState::Approaching => {
                let turn_now = match self.entry {
                    PtEntry::DirectShort => {
                        let dist = haversine_nm(ctx.position, self.fix);
                        crate::geometry::eta_seconds(dist, ctx.gs_kts) < 2.0
                    }
                    PtEntry::DirectLong => should_turn_for_outbound(
                        ctx.position,
                        ctx.heading,
                        self.inbound_heading,
                        ctx.wind,
                        self.fix,
                        ctx.gs_kts,
                        ctx.nm_per_longitude,
                    ),
                    PtEntry::Parallel | PtEntry::Teardrop => should_turn_for_outbound(
                        ctx.position,
                        ctx.heading,
                        self.outbound_heading,
                        ctx.wind,
                        self.fix,
                        ctx.gs_kts,
                        ctx.nm_per_longitude,
                    ),
                };

                if turn_now {
                    self.state = RacetrackState::TurningOutbound;
                    Some((self.outbound_heading, self.outbound_turn_method))
                } else {
                    Some((bearing_deg(ctx.position, self.fix), TurnMethod::Closest))
                }
            }

            RacetrackState::TurningOutbound => {
                if heading_diff_abs(ctx.heading, self.outbound_heading) < ALIGNMENT_TOLERANCE_DEG {
                    self.state = RacetrackState::FlyingOutbound;
                }
                Some((self.outbound_heading, self.outbound_turn_method))
            }

            RacetrackState::FlyingOutbound => {
                let past_leg_length =
                    haversine_nm(ctx.position, self.fix) > self.leg_length_nm;
                let teardrop_intercept = self.entry == PtEntry::Teardrop
                    && should_turn_to_intercept(
                        ctx.position,
                        ctx.heading,
                        ctx.wind,
                        self.inbound_heading,
                        self.inbound_line(),
                        ctx.gs_kts,
                        ctx.nm_per_longitude,
                        GHOST_SIM_MAX_SECONDS,
                    );

                if past_leg_length || teardrop_intercept {
                    self.state = RacetrackState::TurningInbound;
                }
                Some((self.outbound_heading, self.outbound_turn_method))
            }

            RacetrackState::TurningInbound => {
                if self.entry == PtEntry::Parallel {
                    if heading_diff_abs(ctx.heading, self.parallel_offset_heading)
                        < ALIGNMENT_TOLERANCE_DEG
                    {
                        self.state = RacetrackState::FlyingInbound;
                    }
                    Some((self.parallel_offset_heading, TurnMethod::Closest))
                } else {
                    if heading_diff_abs(ctx.heading, self.inbound_heading)
                        < ALIGNMENT_TOLERANCE_DEG
                    {
                        self.state = RacetrackState::Done;
                        return None;
                    }
                    Some((self.inbound_heading, TurnMethod::Closest))
                }
            }

            RacetrackState::FlyingInbound => {
                let ready_to_rejoin = should_turn_to_intercept(
                    ctx.position,
                    ctx.heading,
                    ctx.wind,
                    self.inbound_heading,
                    self.inbound_line(),
                    ctx.gs_kts,
                    ctx.nm_per_longitude,
                    GHOST_SIM_MAX_SECONDS,
                );
                if ready_to_rejoin {
                    self.state = RacetrackState::Done;
                    return None;
                }
                Some((self.parallel_offset_heading, TurnMethod::Closest))
            }

            RacetrackState::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == RacetrackState::Done
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Pt45State {
    Approaching,
    TurningOutbound,
    FlyingOutbound,
    TurningAway,
    FlyingAway,
    TurningIn,
    FlyingIn,
    TurningToIntercept,
    Done,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Standard45PtState {
    pub state: Pt45State,
    pub direction: TurnDirection,
    pub fix: LatLon,
    pub inbound_heading: f64,
    pub outbound_heading: f64,
    pub away_heading: f64,
    pub elapsed_s: f64,
}

impl Standard45PtState {
    pub fn new(direction: TurnDirection, fix: LatLon, inbound_heading: f64) -> Self {
        let outbound_heading = normalize_heading(inbound_heading + 180.0);
        let away_heading = match direction {
            TurnDirection::Right => normalize_heading(outbound_heading + 45.0),
            TurnDirection::Left => normalize_heading(outbound_heading - 45.0),
        };
        Self {
            state: Pt45State::Approaching,
            direction,
            fix,
            inbound_heading,
            outbound_heading,
            away_heading,
            elapsed_s: 0.0,
        }
    }

    fn turn_method(&self) -> TurnMethod {
        match self.direction {
            TurnDirection::Right => TurnMethod::Right,
            TurnDirection::Left => TurnMethod::Left,
        }
    }

    fn inbound_line(&self) -> (LatLon, LatLon) {
        (
            destination_point(self.fix, normalize_heading(self.inbound_heading + 180.0), 5.0),
            destination_point(self.fix, self.inbound_heading, 5.0),
        )
    }

    /// Advances the state machine by `delta_t_s` seconds. `Done` retires
    /// the PT the same way [`RacetrackPtState::target_heading`] does.
    pub fn target_heading(&mut self, ctx: &PtContext, delta_t_s: f64) -> Option<(f64, TurnMethod)> {
        match self.state {
            Pt45State::Approaching => {
                let turn_now = should_turn_for_outbound(
                    ctx.position,
                    ctx.heading,
                    self.outbound_heading,
                    ctx.wind,
                    self.fix,
                    ctx.gs_kts,
                    ctx.nm_per_longitude,
                );
                if turn_now {
                    self.state = Pt45State::TurningOutbound;
                    Some((self.outbound_heading, self.turn_method()))
                } else {
                    Some((bearing_deg(ctx.position, self.fix), TurnMethod::Closest))
                }
            }

            Pt45State::TurningOutbound => {
                if heading_diff_abs(ctx.heading, self.outbound_heading) < ALIGNMENT_TOLERANCE_DEG {
                    self.state = Pt45State::FlyingOutbound;
                    self.elapsed_s = 0.0;
                }
                Some((self.outbound_heading, self.turn_method()))
            }

            Pt45State::FlyingOutbound => {
                self.elapsed_s += delta_t_s;
                if self.elapsed_s >= STANDARD_LEG_SECONDS {
                    self.state = Pt45State::TurningAway;
                }
                Some((self.outbound_heading, TurnMethod::Closest))
            }

            Pt45State::TurningAway => {
                if heading_diff_abs(ctx.heading, self.away_heading) < ALIGNMENT_TOLERANCE_DEG {
                    self.state = Pt45State::FlyingAway;
                    self.elapsed_s = 0.0;
                }
                Some((self.away_heading, self.turn_method()))
            }

            Pt45State::FlyingAway => {
                self.elapsed_s += delta_t_s;
                if self.elapsed_s >= STANDARD_LEG_SECONDS {
                    self.state = Pt45State::TurningIn;
                }
                Some((self.away_heading, TurnMethod::Closest))
            }

            Pt45State::TurningIn => {
                let turning_in_heading = normalize_heading(self.away_heading + 180.0);
                if heading_diff_abs(ctx.heading, turning_in_heading) < ALIGNMENT_TOLERANCE_DEG {
                    self.state = Pt45State::FlyingIn;
                }
                Some((turning_in_heading, self.turn_method()))
            }

            Pt45State::FlyingIn => {
                let turning_in_heading = normalize_heading(self.away_heading + 180.0);
                let ready = should_turn_to_intercept(
                    ctx.position,
                    ctx.heading,
                    ctx.wind,
                    self.inbound_heading,
                    self.inbound_line(),
                    ctx.gs_kts,
                    ctx.nm_per_longitude,
                    GHOST_SIM_MAX_SECONDS,
                );
                if ready {
                    self.state = Pt45State::TurningToIntercept;
                }
                Some((turning_in_heading, TurnMethod::Closest))
            }

            Pt45State::TurningToIntercept => {
                if heading_diff_abs(ctx.heading, self.inbound_heading) < ALIGNMENT_TOLERANCE_DEG {
                    self.state = Pt45State::Done;
                    return None;
                }
                Some((self.inbound_heading, self.turn_method()))
            }

            Pt45State::Done => None,
        }
    }

    pub fn is_done(&self) -> bool {
        self.state == Pt45State::Done
    }
}
