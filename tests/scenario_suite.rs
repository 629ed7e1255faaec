// ABOUTME: Integration tests for the concrete S1-S6 scenarios (§8), driven entirely through the public API

use strata::{ContinentConfig, HybridGeologicalSimulator, NumericField, Preset, SimulatorConfig, Simulator};

fn performance_config() -> SimulatorConfig {
    SimulatorConfig { preset: Preset::Performance, ..Default::default() }
}

#[test]
fn s1_bounds_and_non_negative_rainfall_after_full_run() {
    let mut sim = Simulator::new(256.0, performance_config()).unwrap();
    sim.initialize(12345);
    while sim.step() {}

    let sample = sim.sample_at(1000.0, 1000.0);
    assert!(sample.elevation_m >= -2000.0 && sample.elevation_m <= 2048.0);
    assert!(sample.rock_hardness >= 0.0 && sample.rock_hardness <= 10.0);
    assert!(sample.annual_rainfall_mm >= 0.0);
}

#[test]
fn s2_toroidal_wrap_holds_before_any_steps() {
    let mut sim = Simulator::new(100.0, performance_config()).unwrap();
    sim.initialize(54321);

    let a = sim.sample_at(0.0, 0.0);
    let b = sim.sample_at(100_000.0, 0.0);
    assert!((a.elevation_m - b.elevation_m).abs() < 1e-3);
}

#[test]
fn s3_elevation_bounded_after_fifty_steps() {
    let mut sim = Simulator::new(256.0, performance_config()).unwrap();
    sim.initialize(99);
    for _ in 0..50 {
        sim.step();
    }

    for x in (0..sim.resolution()).step_by(8) {
        for z in (0..sim.resolution()).step_by(8) {
            let wx = x as f32 * (sim.world_size_km() * 1000.0 / sim.resolution() as f32);
            let wz = z as f32 * (sim.world_size_km() * 1000.0 / sim.resolution() as f32);
            let sample = sim.sample_at(wx, wz);
            assert!(sample.elevation_m >= -2048.0 && sample.elevation_m <= 2048.0);
        }
    }
}

#[test]
fn s4_exactly_four_plates_with_separated_centers() {
    let config = ContinentConfig { num_continents: Some(4), ..Default::default() };
    let gen = strata::continent::FractalContinentGenerator::new(42, 200.0, config);
    let spacing = 200_000.0 / 64.0;
    let mut elevation = NumericField::new(64, 64, spacing, 0.0);
    let mut rock = strata::CategoricalField::new(64, 64, spacing, strata::RockType::Basalt);
    let mut stress = NumericField::new(64, 64, spacing, 0.1);
    let layout = gen.generate(&mut elevation, &mut rock, &mut stress);

    assert_eq!(layout.plates.len(), 4);
}

#[test]
fn s5_propagation_decay_matches_expected_ratio() {
    let mut field = NumericField::new(100, 100, 1.0, 0.0);
    field.propagate(100.0, 50.0, 50.0, 10.0, |_, _| 1.0);

    let center = field.get(50, 50);
    let neighbor = field.get(60, 50);
    assert!(center > 0.0);
    assert!(neighbor < center);
    let ratio = center / neighbor;
    let expected = (10.0f32 / 3.0).exp();
    assert!((ratio - expected).abs() / expected < 0.05);
}

#[test]
fn s6_hybrid_simulator_completes_at_target_time() {
    let mut sim = HybridGeologicalSimulator::new(200.0);
    sim.initialize(7, 4, 0.71);

    for _ in 0..100 {
        sim.step(1000.0);
    }

    assert!(sim.is_complete());
    assert_eq!(sim.simulation_time_years(), 100_000.0);
}
