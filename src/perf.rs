//! Aircraft performance: the per-type constants the solvers clamp and
//! rate-limit against, plus a lookup collaborator. Adapted from the
//! teacher's `utils/performance.rs` PERFAC/PERFLINE loader, reshaped to
//! the fields this system actually consumes (no Mach/FL-banded cruise
//! table — that fidelity is out of scope).

use std::collections::HashMap;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Per-type performance constants (spec.md Glossary, §6).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Perf {
    pub v2_kts: f64,
    pub min_kts: f64,
    pub max_kts: f64,
    pub landing_kts: f64,
    pub cruise_kts: f64,
    pub climb_fpm: f64,
    pub descent_fpm: f64,
    pub accel_kts_s: f64,
    pub decel_kts_s: f64,
    pub ceiling_ft: f64,
}

impl Perf {
    /// Fallback V2 when the database omits it: `1.15 * landing` (Glossary).
    pub fn v2_or_default(landing_kts: f64, v2_kts: Option<f64>) -> f64 {
        v2_kts.unwrap_or(1.15 * landing_kts)
    }
}

/// Read-only aircraft performance lookup, keyed by ICAO type designator.
pub trait AircraftPerformanceDatabase: Send + Sync {
    fn lookup(&self, type_designator: &str) -> Option<Perf>;
}

/// In-memory database, built programmatically or from a PERFAC/PERFLINE
/// text table (the teacher's loader format).
#[derive(Debug, Clone, Default)]
pub struct InMemoryPerformanceDatabase {
    entries: HashMap<String, Perf>,
}

impl InMemoryPerformanceDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, type_designator: impl Into<String>, perf: Perf) {
        self.entries.insert(type_designator.into(), perf);
    }

    /// Parses a performance table in the teacher's line-oriented format:
    ///
    /// ```text
    /// PERFAC:B738
    /// PERFLINE:v2=150,min=130,max=340,landing=130,cruise=290,climb=3000,descent=1800,accel=2.0,decel=1.5,ceiling=41000
    /// ```
    ///
    /// Blank lines and lines starting with `#` are ignored. A `PERFLINE`
    /// with no preceding `PERFAC` is a format error.
    pub fn load_from_str(text: &str) -> Result<Self> {
        let mut db = Self::new();
        let mut current_type: Option<String> = None;

        for (line_no, raw_line) in text.lines().enumerate() {
            let line = raw_line.trim();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }

            if let Some(type_designator) = line.strip_prefix("PERFAC:") {
                current_type = Some(type_designator.trim().to_string());
                continue;
            }

            if let Some(fields) = line.strip_prefix("PERFLINE:") {
                let type_designator = current_type.clone().with_context(|| {
                    format!("PERFLINE at line {} with no preceding PERFAC", line_no + 1)
                })?;
                let perf = parse_perfline(fields)
                    .with_context(|| format!("malformed PERFLINE at line {}", line_no + 1))?;
                db.insert(type_designator, perf);
                continue;
            }
        }

        Ok(db)
    }
}

impl AircraftPerformanceDatabase for InMemoryPerformanceDatabase {
    fn lookup(&self, type_designator: &str) -> Option<Perf> {
        self.entries.get(type_designator).copied()
    }
}

fn parse_perfline(fields: &str) -> Result<Perf> {
    let mut map = HashMap::new();
    for kv in fields.split(',') {
        let (key, value) = kv
            .split_once('=')
            .with_context(|| format!("expected key=value, got {kv:?}"))?;
        let parsed: f64 = value
            .trim()
            .parse()
            .with_context(|| format!("expected a number for {key}, got {value:?}"))?;
        map.insert(key.trim(), parsed);
    }

    let field = |name: &str| -> Result<f64> {
        map.get(name)
            .copied()
            .with_context(|| format!("missing field {name:?}"))
    };

    Ok(Perf {
        v2_kts: field("v2")?,
        min_kts: field("min")?,
        max_kts: field("max")?,
        landing_kts: field("landing")?,
        cruise_kts: field("cruise")?,
        climb_fpm: field("climb")?,
        descent_fpm: field("descent")?,
        accel_kts_s: field("accel")?,
        decel_kts_s: field("decel")?,
        ceiling_ft: field("ceiling")?,
    })
}
