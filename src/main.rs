use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::sync::RwLock;
use tracing::info;

use navcore::clock::SystemClock;
use navcore::config::{self, NavTuning, ScenarioConfig};
use navcore::events::TracingEventPoster;
use navcore::nav::Nav;
use navcore::perf::{AircraftPerformanceDatabase, InMemoryPerformanceDatabase};
use navcore::rand_source::ThreadRandomSource;
use navcore::runner::SimulationRunner;
use navcore::wind::NoWind;
use navcore::world::{InMemoryWorld, World};

#[derive(Parser)]
#[command(name = "navcore")]
#[command(about = "Aircraft guidance/navigation core for the controller training simulator", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Loads a scenario and ticks its aircraft forward in real time.
    Run {
        #[arg(short, long)]
        scenario: String,

        #[arg(short, long)]
        world: String,

        #[arg(short, long)]
        perf: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    config::init_tracing();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run { scenario, world, perf } => run_scenario(&scenario, &world, &perf).await?,
    }

    Ok(())
}

async fn run_scenario(scenario_path: &str, world_path: &str, perf_path: &str) -> Result<()> {
    let scenario = ScenarioConfig::load(scenario_path)
        .with_context(|| format!("failed to load scenario {scenario_path}"))?;

    let world_json = std::fs::read_to_string(world_path)
        .with_context(|| format!("failed to read world file {world_path}"))?;
    let world = InMemoryWorld::load_from_json(&world_json, scenario.magnetic_variation)
        .with_context(|| format!("failed to parse world file {world_path}"))?;

    let perf_text = std::fs::read_to_string(perf_path)
        .with_context(|| format!("failed to read performance table {perf_path}"))?;
    let perf_db = InMemoryPerformanceDatabase::load_from_str(&perf_text)
        .with_context(|| format!("failed to parse performance table {perf_path}"))?;

    let mut runner = SimulationRunner::new(
        Arc::new(NoWind),
        Arc::new(world.clone()),
        Arc::new(TracingEventPoster),
        Arc::new(SystemClock),
        Arc::new(ThreadRandomSource),
        NavTuning::default(),
        scenario.tick_seconds,
    );

    for aircraft in &scenario.aircraft {
        let perf = perf_db
            .lookup(&aircraft.type_designator)
            .with_context(|| format!("no performance entry for {}", aircraft.type_designator))?;

        let nav = if aircraft.is_departure {
            let airport = world
                .airport(&aircraft.departure_airport)
                .with_context(|| format!("unknown departure airport {}", aircraft.departure_airport))?;
            Nav::make_departure_nav(
                airport.location,
                airport.elevation_ft,
                aircraft.departure_runway_heading_true,
                scenario.magnetic_variation,
                perf,
                aircraft.final_altitude_ft,
                Vec::new(),
            )
        } else {
            let arrival = world
                .airport(&aircraft.arrival_airport)
                .with_context(|| format!("unknown arrival airport {}", aircraft.arrival_airport))?;
            let position = aircraft.arrival_initial_position.unwrap_or(arrival.location);
            Nav::make_arrival_nav(
                position,
                aircraft.arrival_initial_heading,
                aircraft.arrival_initial_altitude_ft,
                aircraft.arrival_initial_ias_kts,
                arrival.location,
                arrival.elevation_ft,
                scenario.magnetic_variation,
                world.nm_per_longitude(position.lat),
                perf,
                aircraft.final_altitude_ft,
                Vec::new(),
            )
        };

        info!(callsign = %aircraft.callsign, "spawned aircraft");
        runner.add_aircraft(aircraft.callsign.clone(), nav);
    }

    info!(name = %scenario.name, aircraft = runner.aircraft.len(), "scenario loaded");
    let runner = Arc::new(RwLock::new(runner));
    SimulationRunner::run(runner).await;

    Ok(())
}
