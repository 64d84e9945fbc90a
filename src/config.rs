//! Tunable constants and the demo-scenario file format. Mirrors the
//! teacher's split between a `Default`-derived constants struct
//! (`SimulationConfig` there, `NavTuning` here) and a serde-loaded
//! profile (`ProfileConfig::load` there, `ScenarioConfig` here).

use std::fs;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::Level;

/// The magic numbers spec.md leaves inline: standard turn rate, the
/// departure initial-climb AGL threshold, localizer capture tolerances,
/// procedure-turn leg defaults, and the pilot-reaction delay window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavTuning {
    pub standard_turn_rate_deg_s: f64,
    pub initial_climb_agl_ft: f64,
    pub localizer_capture_lateral_nm: f64,
    pub localizer_capture_course_deg: f64,
    pub localizer_join_lateral_nm: f64,
    pub pilot_reaction_min_s: f64,
    pub pilot_reaction_max_s: f64,
    pub final_approach_clear_distance_nm: f64,
    pub cleared_approach_speed_schedule_nm: f64,
}

impl Default for NavTuning {
    fn default() -> Self {
        Self {
            standard_turn_rate_deg_s: 3.0,
            initial_climb_agl_ft: 1500.0,
            localizer_capture_lateral_nm: 0.25,
            localizer_capture_course_deg: 3.5,
            localizer_join_lateral_nm: 0.2,
            pilot_reaction_min_s: 3.0,
            pilot_reaction_max_s: 6.0,
            final_approach_clear_distance_nm: 5.0,
            cleared_approach_speed_schedule_nm: 15.0,
        }
    }
}

/// Initializes the global `tracing` subscriber. Called once, from
/// `main`, exactly as the teacher's `main.rs` does — library code never
/// initializes a subscriber itself.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}

/// A single aircraft to spawn in a demo scenario.
///
/// Arrival initial state is simplified the way the teacher's
/// `spawn_transit` simplifies it ("Get heading (default for now)"):
/// rather than computing an intercept geometry, the scenario just states
/// where the aircraft starts.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioAircraft {
    pub callsign: String,
    pub type_designator: String,
    pub is_departure: bool,
    pub departure_airport: String,
    pub arrival_airport: String,
    pub final_altitude_ft: f64,
    #[serde(default = "default_runway_heading")]
    pub departure_runway_heading_true: f64,
    #[serde(default)]
    pub arrival_initial_position: Option<crate::geometry::LatLon>,
    #[serde(default)]
    pub arrival_initial_heading: f64,
    #[serde(default)]
    pub arrival_initial_altitude_ft: f64,
    #[serde(default)]
    pub arrival_initial_ias_kts: f64,
}

fn default_runway_heading() -> f64 {
    360.0
}

/// Describes a demo/test scenario: which aircraft to create and which
/// performance/world fixtures to run them against. Loaded from JSON the
/// way the teacher's `ProfileConfig::load` loads a profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    pub name: String,
    pub magnetic_variation: f64,
    #[serde(default = "default_tick_seconds")]
    pub tick_seconds: f64,
    pub aircraft: Vec<ScenarioAircraft>,
}

fn default_tick_seconds() -> f64 {
    1.0
}

impl ScenarioConfig {
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario file: {path}"))?;
        let config: ScenarioConfig = serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse scenario JSON: {path}"))?;
        Ok(config)
    }
}
