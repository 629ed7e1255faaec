// ABOUTME: Headless CLI demo exercising the field-based Simulator across a handful of seeds
// ABOUTME: Not part of the core API - a thin harness a host application would not ship with

use clap::Parser;
use strata::{ConstructionError, Preset, RockType, SimulatorConfig, Simulator};

#[derive(Parser)]
#[command(name = "strata-demo")]
#[command(about = "Run the strata geological simulator and print a summary of the result")]
struct Args {
    /// World size in kilometers
    #[arg(short, long, default_value = "256")]
    world_size_km: f32,

    /// Seed to generate from
    #[arg(long, default_value = "1")]
    seed: u64,

    /// Quality preset: performance, balanced, quality, ultra
    #[arg(short, long, default_value = "balanced")]
    preset: String,

    /// Print a sampled transect across the world instead of just a summary
    #[arg(long)]
    transect: bool,
}

fn parse_preset(name: &str) -> Preset {
    match name.to_lowercase().as_str() {
        "performance" => Preset::Performance,
        "quality" => Preset::Quality,
        "ultra" => Preset::Ultra,
        _ => Preset::Balanced,
    }
}

fn main() -> Result<(), ConstructionError> {
    let args = Args::parse();
    let config = SimulatorConfig { preset: parse_preset(&args.preset), ..Default::default() };

    let mut sim = Simulator::new(args.world_size_km, config)?;
    sim.initialize(args.seed);

    println!(
        "strata-demo: world={}km resolution={} total_steps={}",
        sim.world_size_km(),
        sim.resolution(),
        sim.total_steps()
    );

    while sim.step() {}

    println!("Simulation complete at step {}/{}", sim.current_step(), sim.total_steps());

    if let Some(layout) = sim.continent_layout() {
        println!("Continents: {}", layout.plates.len());
        println!("Rivers: {}", layout.rivers.len());
        println!("Ridges: {}", layout.ridges.len());
    }

    if args.transect {
        let world_m = args.world_size_km * 1000.0;
        let samples = 20;
        for i in 0..samples {
            let x = world_m * i as f32 / samples as f32;
            let sample = sim.sample_at(x, world_m / 2.0);
            let rock_label = match sample.rock_type {
                RockType::Granite => "granite",
                RockType::Basalt => "basalt",
                RockType::Limestone => "limestone",
                RockType::Sandstone => "sandstone",
                _ => "other",
            };
            println!(
                "x={x:>9.0}m  elevation={:>7.1}m  rock={rock_label:<10} rainfall={:>6.0}mm",
                sample.elevation_m, sample.annual_rainfall_mm
            );
        }
    }

    Ok(())
}
