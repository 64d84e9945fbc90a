//! The `World`/airport-database external collaborator (spec.md §6):
//! read-only lookups for airport location/elevation and the approaches
//! charted at it. Replaces the teacher's sector-file parser
//! (`utils/navigation.rs`) with the "read-only table built at startup"
//! shape, loadable from JSON instead of a proprietary sector format.

use std::collections::HashMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::geometry::{destination_point, normalize_heading, true_to_magnetic, LatLon};
use crate::guidance::{ApproachKind, Waypoint};

/// A single charted instrument approach.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Approach {
    pub kind: ApproachKind,
    pub full_name: String,
    pub runway: String,
    /// One ordered waypoint list per transition; `DirectFix`/splice logic
    /// picks the transition whose waypoints contain the matched fix.
    pub waypoints: Vec<Vec<Waypoint>>,
    pub threshold: LatLon,
    /// True course of the final approach segment.
    pub course_true: f64,
}

impl Approach {
    /// Magnetic course of the approach (spec.md §6: `Heading(nm_per_lon,
    /// mag_var)`). `nm_per_longitude` is accepted for interface parity
    /// with the spec but unused: course is a pure bearing, independent
    /// of the local nm/degree scale.
    pub fn heading(&self, _nm_per_longitude: f64, magnetic_variation: f64) -> f64 {
        true_to_magnetic(self.course_true, magnetic_variation)
    }

    /// The localizer line as `(far_point, threshold)`, far enough out
    /// (25nm) to comfortably contain any realistic interception geometry.
    pub fn line(&self) -> (LatLon, LatLon) {
        let reciprocal = normalize_heading(self.course_true + 180.0);
        let far_point = destination_point(self.threshold, reciprocal, 25.0);
        (far_point, self.threshold)
    }

    /// All waypoints across every transition, used by the approach-fix
    /// splice logic in `commands::expect_approach`/`cleared_approach`.
    pub fn all_waypoints(&self) -> impl Iterator<Item = &Waypoint> {
        self.waypoints.iter().flatten()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Airport {
    pub id: String,
    pub location: LatLon,
    pub elevation_ft: f64,
    pub approaches: HashMap<String, Approach>,
}

/// Read-only geography/airport lookup. Implementations must be safe to
/// share across concurrently-ticking `Nav`s (spec.md §5).
pub trait World: Send + Sync {
    fn airport(&self, id: &str) -> Option<Arc<Airport>>;
    fn magnetic_variation(&self, position: LatLon) -> f64;
    /// Nautical miles per degree of longitude at `latitude`, used to
    /// convert east/west ground speed into a longitude delta.
    fn nm_per_longitude(&self, latitude: f64) -> f64;
}

/// In-memory implementation, built programmatically or loaded from JSON.
#[derive(Debug, Clone, Default)]
pub struct InMemoryWorld {
    airports: HashMap<String, Arc<Airport>>,
    /// Flat magnetic variation applied everywhere; real variation maps
    /// are out of scope (spec.md §1 Non-goals exclude aerodynamics
    /// fidelity, and a full isogonic model is the same kind of fidelity).
    magnetic_variation: f64,
}

impl InMemoryWorld {
    pub fn new(magnetic_variation: f64) -> Self {
        Self {
            airports: HashMap::new(),
            magnetic_variation,
        }
    }

    pub fn insert_airport(&mut self, airport: Airport) {
        self.airports.insert(airport.id.clone(), Arc::new(airport));
    }

    pub fn load_from_json(text: &str, magnetic_variation: f64) -> anyhow::Result<Self> {
        let airports: Vec<Airport> = serde_json::from_str(text)?;
        let mut world = Self::new(magnetic_variation);
        for airport in airports {
            world.insert_airport(airport);
        }
        Ok(world)
    }
}

impl World for InMemoryWorld {
    fn airport(&self, id: &str) -> Option<Arc<Airport>> {
        self.airports.get(id).cloned()
    }

    fn magnetic_variation(&self, _position: LatLon) -> f64 {
        self.magnetic_variation
    }

    fn nm_per_longitude(&self, latitude: f64) -> f64 {
        60.0 * latitude.to_radians().cos()
    }
}
