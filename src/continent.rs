// ABOUTME: Voronoi-distributed continent seeding - elevation/rock/mantle-stress, rivers, ridges (§4.C)
// ABOUTME: Pure function of (seed, world_size, config); writes into caller-owned fields and retains templates

use crate::field::{toroidal_distance, CategoricalField, NumericField};
use crate::lsystem;
use crate::noise;
use crate::rock::RockType;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Caller-tunable knobs for continent seeding (a subset of `CustomConfig`, §6).
#[derive(Debug, Clone)]
pub struct ContinentConfig {
    pub num_continents: Option<usize>,
    pub ocean_ratio: f32,
    pub force_ocean_generation: bool,
}

impl Default for ContinentConfig {
    fn default() -> Self {
        Self {
            num_continents: None,
            ocean_ratio: 0.68,
            force_ocean_generation: false,
        }
    }
}

/// A seeded continental plate (§3 "Continental plate"). Discarded by
/// callers after initial field population except where retained for
/// later query (river/ridge templates reference `plate_id`).
#[derive(Debug, Clone)]
pub struct ContinentalPlate {
    pub plate_id: usize,
    pub center: (f32, f32),
    pub radius: f32,
    pub base_elevation: f32,
    pub dominant_rock: RockType,
    pub tectonic_activity: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OceanFeatureKind {
    Ridge,
    Trench,
    Basin,
}

#[derive(Debug, Clone)]
pub struct OceanFeature {
    pub position: (f32, f32),
    pub kind: OceanFeatureKind,
}

#[derive(Debug, Clone)]
pub struct RiverTemplate {
    pub continent_id: usize,
    pub source: (f32, f32),
    pub mouth: (f32, f32),
    pub stem: Vec<(f32, f32)>,
    pub tributaries: Vec<Vec<(f32, f32)>>,
}

#[derive(Debug, Clone)]
pub struct RidgeTemplate {
    pub plate_a: usize,
    pub plate_b: usize,
    pub path: Vec<(f32, f32)>,
}

/// Output retained after seeding for later query (§4.C "Outputs").
#[derive(Debug, Clone, Default)]
pub struct ContinentLayout {
    pub plates: Vec<ContinentalPlate>,
    pub ocean_features: Vec<OceanFeature>,
    pub rivers: Vec<RiverTemplate>,
    pub ridges: Vec<RidgeTemplate>,
}

pub struct FractalContinentGenerator {
    seed: u64,
    world_size_m: f32,
    config: ContinentConfig,
}

impl FractalContinentGenerator {
    pub fn new(seed: u64, world_size_km: f32, config: ContinentConfig) -> Self {
        Self { seed, world_size_m: world_size_km * 1000.0, config }
    }

    /// Run the full seeding algorithm, writing elevation, rock type and
    /// mantle stress into the caller-owned fields and returning the
    /// retained layout (§4.C steps 1-9).
    pub fn generate(
        &self,
        elevation: &mut NumericField,
        rock: &mut CategoricalField<RockType>,
        mantle_stress: &mut NumericField,
    ) -> ContinentLayout {
        let mut rng = StdRng::seed_from_u64(self.seed);

        let base_count = 3 + (self.seed % 5) as usize;
        let count = self
            .config
            .num_continents
            .unwrap_or(base_count)
            .clamp(3, 7);

        let centers = self.place_centers(&mut rng, count);
        let plates = self.build_plates(&mut rng, &centers);

        self.stamp_elevation_and_rock(elevation, rock, &plates);
        let ocean_features = self.classify_ocean_features(elevation, &plates);
        let rivers = self.generate_rivers(&mut rng, &plates, elevation);
        let ridges = self.generate_ridges(&mut rng, &plates, elevation);
        self.stamp_mantle_stress(mantle_stress, &plates);

        ContinentLayout { plates, ocean_features, rivers, ridges }
    }

    /// Mitchell's best-candidate sampling: 100 candidates per accepted
    /// center, keeping the one maximizing the minimum toroidal distance to
    /// already-placed centers (§4.C step 2).
    /// Best-candidate placement with a hard floor: a candidate below
    /// `0.15 * world_size` from every already-accepted center is rejected
    /// outright and re-rolled, not merely disfavored. Falls back to the
    /// best candidate seen once the retry budget is exhausted, which only
    /// matters for pathological configs (many more continents than the
    /// world has room for at the floor spacing).
    fn place_centers(&self, rng: &mut StdRng, count: usize) -> Vec<(f32, f32)> {
        let mut centers: Vec<(f32, f32)> = Vec::with_capacity(count);
        let w = self.world_size_m;
        let min_separation = 0.15 * w;

        for _ in 0..count {
            let mut best: Option<((f32, f32), f32)> = None;
            let mut accepted = None;
            for _ in 0..500 {
                let candidate = (rng.gen_range(0.0..w), rng.gen_range(0.0..w));
                let min_dist = if centers.is_empty() {
                    f32::INFINITY
                } else {
                    centers
                        .iter()
                        .map(|&(cx, cz)| toroidal_distance(candidate.0, candidate.1, cx, cz, w, w))
                        .fold(f32::INFINITY, f32::min)
                };
                if best.map(|(_, d)| min_dist > d).unwrap_or(true) {
                    best = Some((candidate, min_dist));
                }
                if min_dist >= min_separation {
                    accepted = Some(candidate);
                    break;
                }
            }
            if let Some(point) = accepted.or_else(|| best.map(|(point, _)| point)) {
                centers.push(point);
            }
        }
        centers
    }

    fn build_plates(&self, rng: &mut StdRng, centers: &[(f32, f32)]) -> Vec<ContinentalPlate> {
        centers
            .iter()
            .enumerate()
            .map(|(id, &center)| {
                let radius = 0.5 * self.world_size_m * rng.gen_range(0.05f32..0.40);
                let base_elevation = rng.gen_range(100.0f32..400.0);
                let rock_roll: f32 = rng.gen_range(0.0..1.0);
                let dominant_rock = if rock_roll < 0.40 {
                    RockType::Granite
                } else if rock_roll < 0.70 {
                    RockType::Quartzite
                } else {
                    RockType::Sandstone
                };
                let tectonic_activity = rng.gen_range(0.3f32..1.0);
                ContinentalPlate { plate_id: id, center, radius, base_elevation, dominant_rock, tectonic_activity }
            })
            .collect()
    }

    fn nearest_plate<'a>(&self, plates: &'a [ContinentalPlate], x: f32, z: f32) -> (&'a ContinentalPlate, f32) {
        let w = self.world_size_m;
        plates
            .iter()
            .map(|p| (p, toroidal_distance(x, z, p.center.0, p.center.1, w, w)))
            .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .expect("at least one plate")
    }

    fn effective_radius(&self, plate: &ContinentalPlate, x: f32, z: f32) -> f32 {
        let perturb = noise::octave_noise(x, z, 3e-5, 3, 0.5);
        plate.radius * (1.0 + 0.2 * perturb)
    }

    fn stamp_elevation_and_rock(&self, elevation: &mut NumericField, rock: &mut CategoricalField<RockType>, plates: &[ContinentalPlate]) {
        let spacing = elevation.spacing();
        for z in 0..elevation.height() as i64 {
            for x in 0..elevation.width() as i64 {
                let wx = x as f32 * spacing;
                let wz = z as f32 * spacing;
                let (plate, dist) = self.nearest_plate(plates, wx, wz);
                let eff_radius = self.effective_radius(plate, wx, wz);

                if dist <= eff_radius {
                    let coastline_noise = noise::octave_noise(wx, wz, 2e-4, 4, 0.5) * 60.0;
                    elevation.set(x, z, crate::constants::clamp_elevation(plate.base_elevation + coastline_noise));
                    rock.set(x, z, plate.dominant_rock);
                } else {
                    let depth = self.ocean_depth(wx, wz, plates, plate, dist);
                    elevation.set(x, z, depth);
                    rock.set(x, z, RockType::Basalt);
                }
            }
        }
    }

    fn ocean_depth(&self, x: f32, z: f32, _plates: &[ContinentalPlate], nearest: &ContinentalPlate, dist_to_nearest: f32) -> f32 {
        let ridge_noise = noise::octave_noise(x, z, 2e-4, 4, 0.5);
        let trench_noise = noise::octave_noise(x, z, 5e-4, 4, 0.5);
        let near_continent_frac = dist_to_nearest / self.world_size_m;

        let depth = if ridge_noise > 0.6 {
            -400.0 + ridge_noise * 200.0
        } else if near_continent_frac < 0.15 && trench_noise < -0.5 {
            -1900.0 + trench_noise * 100.0
        } else {
            let t = (near_continent_frac / 0.5).clamp(0.0, 1.0);
            let base = -1000.0 + t * (-1800.0 - -1000.0);
            let jitter = noise::octave_noise(x + 1000.0, z - 1000.0, 8e-5, 4, 0.5) * 200.0;
            base + jitter
        };

        let _ = nearest;
        depth.clamp(-2000.0, -100.0)
    }

    fn classify_ocean_features(&self, elevation: &NumericField, plates: &[ContinentalPlate]) -> Vec<OceanFeature> {
        let spacing = elevation.spacing();
        let sample_stride = (elevation.width() / 32).max(1);
        let mut features = Vec::new();

        for z in (0..elevation.height()).step_by(sample_stride) {
            for x in (0..elevation.width()).step_by(sample_stride) {
                let wx = x as f32 * spacing;
                let wz = z as f32 * spacing;
                let (_, dist) = self.nearest_plate(plates, wx, wz);
                let near_continent_frac = dist / self.world_size_m;
                let ridge_noise = noise::octave_noise(wx, wz, 2e-4, 4, 0.5);
                let trench_noise = noise::octave_noise(wx, wz, 5e-4, 4, 0.5);

                let kind = if ridge_noise > 0.6 {
                    Some(OceanFeatureKind::Ridge)
                } else if near_continent_frac < 0.15 && trench_noise < -0.5 {
                    Some(OceanFeatureKind::Trench)
                } else if elevation.get(x as i64, z as i64) < -1200.0 {
                    Some(OceanFeatureKind::Basin)
                } else {
                    None
                };
                if let Some(kind) = kind {
                    features.push(OceanFeature { position: (wx, wz), kind });
                }
            }
        }
        features
    }

    /// River stems via L-system `F -> F[+F]F[-F]F`, 3 iterations, 30° branch
    /// angle, plus 1-3 tributaries (§4.C step 6).
    fn generate_rivers(&self, rng: &mut StdRng, plates: &[ContinentalPlate], elevation: &NumericField) -> Vec<RiverTemplate> {
        let angle = 30f32.to_radians();
        let mut rivers = Vec::new();

        for plate in plates {
            let num_rivers = rng.gen_range(2..=4);
            for _ in 0..num_rivers {
                let theta: f32 = rng.gen_range(0.0..std::f32::consts::TAU);
                let radial_frac: f32 = rng.gen_range(0.3..0.7);
                let source = (
                    plate.center.0 + radial_frac * plate.radius * theta.cos(),
                    plate.center.1 + radial_frac * plate.radius * theta.sin(),
                );
                let eff_radius = self.effective_radius(plate, source.0, source.1);
                let mouth = (
                    plate.center.0 + eff_radius * theta.cos(),
                    plate.center.1 + eff_radius * theta.sin(),
                );

                let program = lsystem::expand("F[+F]F[-F]F", 3);
                let target_len = ((mouth.0 - source.0).powi(2) + (mouth.1 - source.1).powi(2)).sqrt().max(1.0);
                let step = lsystem::step_size_for_target_length(&program, target_len);
                let heading = (mouth.1 - source.1).atan2(mouth.0 - source.0);
                let stem = lsystem::interpret(&program, source, heading, step, angle);

                let num_tributaries = rng.gen_range(1..=3);
                let mut tributaries = Vec::new();
                for _ in 0..num_tributaries {
                    if stem.len() < 3 {
                        break;
                    }
                    let branch_idx = rng.gen_range(1..stem.len() - 1);
                    let branch_origin = stem[branch_idx];
                    let branch_heading = heading + rng.gen_range(-1.0f32..1.0);
                    let branch_len = target_len * rng.gen_range(0.1..0.3);
                    let trib_program = lsystem::expand("F[+F]F[-F]F", 1);
                    let trib_step = lsystem::step_size_for_target_length(&trib_program, branch_len);
                    tributaries.push(lsystem::interpret(&trib_program, branch_origin, branch_heading, trib_step, angle));
                }

                rivers.push(RiverTemplate { continent_id: plate.plate_id, source, mouth, stem, tributaries });
            }
        }
        let _ = elevation;
        rivers
    }

    /// Mountain ridges between nearby plate pairs via L-system
    /// `F -> F+F-F-F+F`, 2 iterations, stamped as `max(current, base+ΔU(0,1))`
    /// along the polyline (§4.C step 7).
    fn generate_ridges(&self, rng: &mut StdRng, plates: &[ContinentalPlate], elevation: &mut NumericField) -> Vec<RidgeTemplate> {
        let angle = 45f32.to_radians();
        let w = self.world_size_m;
        let mut ridges = Vec::new();

        for i in 0..plates.len() {
            for j in (i + 1)..plates.len() {
                let a = &plates[i];
                let b = &plates[j];
                let dist = toroidal_distance(a.center.0, a.center.1, b.center.0, b.center.1, w, w);
                if dist > 1.2 * (a.radius + b.radius) {
                    continue;
                }

                let program = lsystem::expand("F+F-F-F+F", 2);
                let step = lsystem::step_size_for_target_length(&program, dist.max(1.0));
                let heading = (b.center.1 - a.center.1).atan2(b.center.0 - a.center.0);
                let path = lsystem::interpret(&program, a.center, heading, step, angle);

                for &(px, pz) in &path {
                    let ix = (px / elevation.spacing()).round() as i64;
                    let iz = (pz / elevation.spacing()).round() as i64;
                    let current = elevation.get(ix, iz);
                    let base = (a.base_elevation + b.base_elevation) * 0.5;
                    let bump = base + rng.gen_range(0.0f32..1.0) * 800.0;
                    elevation.set(ix, iz, crate::constants::clamp_elevation(current.max(bump)));
                }

                ridges.push(RidgeTemplate { plate_a: a.plate_id, plate_b: b.plate_id, path });
            }
        }
        ridges
    }

    /// Background mantle stress of 0.1 everywhere plus a per-plate
    /// contribution decaying away from the plate boundary (§4.C step 9).
    fn stamp_mantle_stress(&self, mantle_stress: &mut NumericField, plates: &[ContinentalPlate]) {
        let spacing = mantle_stress.spacing();
        for z in 0..mantle_stress.height() as i64 {
            for x in 0..mantle_stress.width() as i64 {
                let wx = x as f32 * spacing;
                let wz = z as f32 * spacing;
                let mut stress = 0.1f32;
                for plate in plates {
                    let dist = toroidal_distance(wx, wz, plate.center.0, plate.center.1, self.world_size_m, self.world_size_m);
                    let eff_radius = self.effective_radius(plate, wx, wz);
                    let d_edge = (dist - eff_radius).abs();
                    stress += plate.tectonic_activity * (-d_edge / 10_000.0).exp() * 0.5;
                }
                mantle_stress.set(x, z, stress.clamp(0.0, 1.0));
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(resolution: usize, world_size_km: f32) -> (NumericField, CategoricalField<RockType>, NumericField) {
        let spacing = world_size_km * 1000.0 / resolution as f32;
        (
            NumericField::new(resolution, resolution, spacing, 0.0),
            CategoricalField::new(resolution, resolution, spacing, RockType::Basalt),
            NumericField::new(resolution, resolution, spacing, 0.1),
        )
    }

    #[test]
    fn scenario_s4_emits_exactly_four_plates() {
        let config = ContinentConfig { num_continents: Some(4), ..Default::default() };
        let gen = FractalContinentGenerator::new(42, 200.0, config);
        let (mut elevation, mut rock, mut stress) = fields(64, 200.0);
        let layout = gen.generate(&mut elevation, &mut rock, &mut stress);
        assert_eq!(layout.plates.len(), 4);
    }

    #[test]
    fn determinism_same_seed_same_elevation() {
        let config = ContinentConfig::default();
        let gen_a = FractalContinentGenerator::new(12345, 256.0, config.clone());
        let gen_b = FractalContinentGenerator::new(12345, 256.0, config);
        let (mut e1, mut r1, mut s1) = fields(48, 256.0);
        let (mut e2, mut r2, mut s2) = fields(48, 256.0);
        gen_a.generate(&mut e1, &mut r1, &mut s1);
        gen_b.generate(&mut e2, &mut r2, &mut s2);
        assert_eq!(e1.data(), e2.data());
    }

    #[test]
    fn elevation_stays_within_hard_bounds() {
        let gen = FractalContinentGenerator::new(99, 256.0, ContinentConfig::default());
        let (mut elevation, mut rock, mut stress) = fields(48, 256.0);
        gen.generate(&mut elevation, &mut rock, &mut stress);
        for &v in elevation.data() {
            assert!(v >= -2048.0 && v <= 2048.0);
        }
    }

    #[test]
    fn rivers_and_ridges_are_generated_when_plates_are_close() {
        let config = ContinentConfig { num_continents: Some(5), ..Default::default() };
        let gen = FractalContinentGenerator::new(7, 150.0, config);
        let (mut elevation, mut rock, mut stress) = fields(48, 150.0);
        let layout = gen.generate(&mut elevation, &mut rock, &mut stress);
        assert!(!layout.rivers.is_empty());
    }

    #[test]
    fn mantle_stress_is_clamped_to_unit_range() {
        let gen = FractalContinentGenerator::new(5, 200.0, ContinentConfig::default());
        let (mut elevation, mut rock, mut stress) = fields(48, 200.0);
        gen.generate(&mut elevation, &mut rock, &mut stress);
        for &v in stress.data() {
            assert!((0.0..=1.0).contains(&v));
        }
    }
}
