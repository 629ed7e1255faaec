// ABOUTME: Particle-based tectonic substrate for the hybrid variant (§4.H ParticleSimulationEngine)
// ABOUTME: Carries plate state as discrete particles instead of a field; rebuilds its spatial hash every step

use crate::rock::RockType;
use crate::spatial_hash::SpatialHashGrid;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::f32::consts::TAU;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParticleKind {
    Continental,
    Oceanic,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContinentShape {
    Circular,
    Oval,
    Elongated,
    Crescent,
}

#[derive(Debug, Clone, Copy)]
pub struct TectonicParticle {
    pub position: (f32, f32),
    pub velocity: (f32, f32),
    pub age_years: f32,
    pub density: f32,
    pub crustal_thickness_km: f32,
    pub elevation_m: f32,
    pub rock_type: RockType,
    pub kind: ParticleKind,
    pub continent_id: Option<usize>,
    pub stress: f32,
}

/// What `sample_at` returns when no particle lies within `2·R_interaction`.
#[derive(Debug, Clone, Copy)]
pub struct ParticleSample {
    pub elevation_m: f32,
    pub rock_type: RockType,
    pub crustal_thickness_km: f32,
    pub density: f32,
    pub stress: f32,
}

impl ParticleSample {
    /// Abyssal-plain default used when a query point has no nearby particles (§4.H `sample_at`).
    fn default_oceanic() -> Self {
        Self {
            elevation_m: -100.0,
            rock_type: RockType::Basalt,
            crustal_thickness_km: 6.5,
            density: 2900.0,
            stress: 0.0,
        }
    }
}

struct ContinentSeed {
    center: (f32, f32),
    radius_avg: f32,
    shape: ContinentShape,
    elongation: f32,
    orientation: f32,
    particle_count: usize,
}

pub struct ParticleSimulationEngine {
    world_size_m: f32,
    r_interaction: f32,
    particles: Vec<TectonicParticle>,
    hash: SpatialHashGrid,
}

impl ParticleSimulationEngine {
    pub fn new(world_size_km: f32) -> Self {
        let world_size_m = world_size_km * 1000.0;
        Self {
            world_size_m,
            r_interaction: world_size_m * 0.01,
            particles: Vec::new(),
            hash: SpatialHashGrid::new(world_size_m, world_size_m, world_size_m * 0.01),
        }
    }

    pub fn particles(&self) -> &[TectonicParticle] {
        &self.particles
    }

    /// Places `continent_count` continents by Poisson-disk-style retry
    /// (minimum separation `1.2·r_avg`), emits 300-1200 particles per
    /// continent (85% concentrated core, 15% periphery), then fills the
    /// remaining oceanic area on an overlapping grid (§4.H "Initialization").
    pub fn initialize(&mut self, seed: u64, continent_count: usize, ocean_ratio: f32) {
        let mut rng = StdRng::seed_from_u64(seed);
        let seeds = self.place_continents(&mut rng, seed, continent_count, ocean_ratio);

        self.particles.clear();
        for (continent_id, continent) in seeds.iter().enumerate() {
            self.emit_continental_particles(&mut rng, continent_id, continent);
        }
        self.fill_oceanic_grid(&mut rng, &seeds);

        let spacing_estimate = (self.world_size_m * self.world_size_m / self.particles.len().max(1) as f32).sqrt();
        self.r_interaction = (spacing_estimate * 1.5).max(1.0);
        self.hash = SpatialHashGrid::new(self.world_size_m, self.world_size_m, self.r_interaction);
    }

    fn place_continents(&self, rng: &mut StdRng, seed: u64, continent_count: usize, ocean_ratio: f32) -> Vec<ContinentSeed> {
        let w = self.world_size_m;
        let land_fraction = (1.0 - ocean_ratio).clamp(0.05, 0.9);
        let total_land_area = w * w * land_fraction;
        let radius_avg = (total_land_area / (continent_count.max(1) as f32 * std::f32::consts::PI)).sqrt();

        let mut centers: Vec<(f32, f32)> = Vec::with_capacity(continent_count);
        for _ in 0..continent_count {
            let mut placed = false;
            for _attempt in 0..200 {
                let candidate = (rng.gen_range(0.0..w), rng.gen_range(0.0..w));
                let ok = centers.iter().all(|&(cx, cz)| {
                    let dx = candidate.0 - cx;
                    let dz = candidate.1 - cz;
                    (dx * dx + dz * dz).sqrt() >= 1.2 * radius_avg
                });
                if ok {
                    centers.push(candidate);
                    placed = true;
                    break;
                }
            }
            if !placed {
                centers.push((rng.gen_range(0.0..w), rng.gen_range(0.0..w)));
            }
        }

        centers
            .into_iter()
            .enumerate()
            .map(|(i, center)| {
                let mut sub_rng = StdRng::seed_from_u64(seed ^ (0x9E3779B97F4A7C15u64.wrapping_mul(i as u64 + 1)));
                let shape = match sub_rng.gen_range(0..4) {
                    0 => ContinentShape::Circular,
                    1 => ContinentShape::Oval,
                    2 => ContinentShape::Elongated,
                    _ => ContinentShape::Crescent,
                };
                ContinentSeed {
                    center,
                    radius_avg: radius_avg * sub_rng.gen_range(0.7..1.3),
                    shape,
                    elongation: sub_rng.gen_range(0.8..2.5),
                    orientation: sub_rng.gen_range(0.0..TAU),
                    particle_count: sub_rng.gen_range(300..=1200),
                }
            })
            .collect()
    }

    /// Warps a `(radius, angle)` polar offset per the continent's shape
    /// class. Oval/Elongated stretch along the orientation axis; Elongated
    /// additionally biases the angle toward that axis so the particle cloud
    /// reads as a spine rather than a smooth ellipse. Crescent excludes a
    /// wedge opposite the orientation, leaving a moon shape.
    fn shaped_offset(shape: ContinentShape, elongation: f32, orientation: f32, radius: f32, angle: f32) -> (f32, f32) {
        let angle = match shape {
            ContinentShape::Elongated => {
                let rel = angle - orientation;
                orientation + rel * 0.5
            }
            ContinentShape::Crescent => {
                let rel = (angle - orientation).rem_euclid(TAU);
                let rel = rel * (1.4 / 2.0);
                orientation + rel - std::f32::consts::FRAC_PI_2
            }
            _ => angle,
        };

        match shape {
            ContinentShape::Circular => (radius * angle.cos(), radius * angle.sin()),
            _ => {
                let local = angle - orientation;
                let major = radius * elongation.sqrt();
                let minor = radius / elongation.sqrt();
                let lx = major * local.cos();
                let lz = minor * local.sin();
                let (sin_o, cos_o) = orientation.sin_cos();
                (lx * cos_o - lz * sin_o, lx * sin_o + lz * cos_o)
            }
        }
    }

    fn emit_continental_particles(&mut self, rng: &mut StdRng, continent_id: usize, continent: &ContinentSeed) {
        let core_count = (continent.particle_count as f32 * 0.85).round() as usize;
        let periphery_count = continent.particle_count - core_count;

        for _ in 0..core_count {
            let u: f32 = rng.gen_range(0.0f32..1.0);
            let r = continent.radius_avg * u.powf(2.0 / 3.0);
            let theta = rng.gen_range(0.0..TAU);
            let (ox, oz) = Self::shaped_offset(continent.shape, continent.elongation, continent.orientation, r, theta);
            let elevation = rng.gen_range(200.0f32..900.0);
            self.push_continental_particle(rng, continent_id, continent.center, (ox, oz), elevation);
        }
        for _ in 0..periphery_count {
            let r = continent.radius_avg * rng.gen_range(0.9f32..1.1);
            let theta = rng.gen_range(0.0..TAU);
            let (ox, oz) = Self::shaped_offset(continent.shape, continent.elongation, continent.orientation, r, theta);
            let elevation = rng.gen_range(80.0f32..200.0);
            self.push_continental_particle(rng, continent_id, continent.center, (ox, oz), elevation);
        }
    }

    fn push_continental_particle(&mut self, rng: &mut StdRng, continent_id: usize, center: (f32, f32), offset: (f32, f32), elevation: f32) {
        let position = ((center.0 + offset.0).rem_euclid(self.world_size_m), (center.1 + offset.1).rem_euclid(self.world_size_m));
        let rock_roll: f32 = rng.gen_range(0.0..1.0);
        let rock_type = if rock_roll < 0.5 {
            RockType::Granite
        } else if rock_roll < 0.8 {
            RockType::Quartzite
        } else {
            RockType::Sandstone
        };
        self.particles.push(TectonicParticle {
            position,
            velocity: (rng.gen_range(-0.05f32..0.05), rng.gen_range(-0.05f32..0.05)),
            age_years: rng.gen_range(0.0f32..4.5e9),
            density: 2700.0,
            crustal_thickness_km: rng.gen_range(35.0f32..50.0),
            elevation_m: elevation,
            rock_type,
            kind: ParticleKind::Continental,
            continent_id: Some(continent_id),
            stress: 0.0,
        });
    }

    fn fill_oceanic_grid(&mut self, rng: &mut StdRng, continents: &[ContinentSeed]) {
        let target_spacing = self.r_interaction.max(self.world_size_m / 200.0);
        let steps = (self.world_size_m / target_spacing).round().max(1.0) as i64;
        let spacing = self.world_size_m / steps as f32;

        for gz in 0..steps {
            for gx in 0..steps {
                let base_x = gx as f32 * spacing;
                let base_z = gz as f32 * spacing;
                let jitter_x = rng.gen_range(-0.3f32..0.3) * spacing;
                let jitter_z = rng.gen_range(-0.3f32..0.3) * spacing;
                let x = (base_x + jitter_x).rem_euclid(self.world_size_m);
                let z = (base_z + jitter_z).rem_euclid(self.world_size_m);

                let inside_continent = continents.iter().any(|c| {
                    let dx = x - c.center.0;
                    let dz = z - c.center.1;
                    (dx * dx + dz * dz).sqrt() < c.radius_avg * 1.1
                });
                if inside_continent {
                    continue;
                }

                self.particles.push(TectonicParticle {
                    position: (x, z),
                    velocity: (rng.gen_range(-0.05f32..0.05), rng.gen_range(-0.05f32..0.05)),
                    age_years: rng.gen_range(0.0f32..4.5e9),
                    density: 2900.0,
                    crustal_thickness_km: rng.gen_range(5.0f32..8.0),
                    elevation_m: -100.0,
                    rock_type: RockType::Basalt,
                    kind: ParticleKind::Oceanic,
                    continent_id: None,
                    stress: 0.0,
                });
            }
        }
    }

    /// Advances every particle by `dt_yr` (§4.H "Step").
    pub fn step(&mut self, dt_yr: f32) {
        self.rebuild_hash();
        self.integrate_positions(dt_yr);
        self.rebuild_hash();
        self.accumulate_neighbor_stress();
        self.resolve_overlaps();
        self.prune_out_of_bounds();
    }

    fn rebuild_hash(&mut self) {
        self.hash.clear();
        for (i, p) in self.particles.iter().enumerate() {
            self.hash.insert(i as u32, p.position.0, p.position.1);
        }
    }

    fn integrate_positions(&mut self, dt_yr: f32) {
        let w = self.world_size_m;
        for p in &mut self.particles {
            let mut nx = p.position.0 + p.velocity.0 * dt_yr;
            let mut nz = p.position.1 + p.velocity.1 * dt_yr;

            if nx < 0.0 || nx > w {
                p.velocity.0 *= -0.5;
                nx = nx.clamp(0.0, w);
            }
            if nz < 0.0 || nz > w {
                p.velocity.1 *= -0.5;
                nz = nz.clamp(0.0, w);
            }
            p.position = (nx, nz);
            p.age_years += dt_yr;
        }
    }

    /// Relative-velocity stress accumulation from neighbors within
    /// `r_interaction`, then a flat 5%/step decay.
    fn accumulate_neighbor_stress(&mut self) {
        let mut deltas = vec![0.0f32; self.particles.len()];
        for i in 0..self.particles.len() {
            let p = self.particles[i];
            let neighbors = self.hash.query_radius(p.position.0, p.position.1, self.r_interaction);
            let mut delta = 0.0f32;
            for n in neighbors {
                let n = n as usize;
                if n == i {
                    continue;
                }
                let q = self.particles[n];
                let dx = p.position.0 - q.position.0;
                let dz = p.position.1 - q.position.1;
                let dist = (dx * dx + dz * dz).sqrt().max(1e-3);
                let rel_v = ((p.velocity.0 - q.velocity.0).powi(2) + (p.velocity.1 - q.velocity.1).powi(2)).sqrt();
                delta += rel_v / dist;
            }
            deltas[i] = delta;
        }
        for (p, delta) in self.particles.iter_mut().zip(deltas) {
            p.stress = (p.stress + delta) * 0.95;
        }
    }

    /// Symmetric repulsion on overlapping neighbors plus a 1% stress
    /// transfer toward equilibrium, resolved pairwise with `i < j` so each
    /// pair is only applied once.
    fn resolve_overlaps(&mut self) {
        let particle_radius = self.r_interaction / 4.0;
        let mut position_deltas = vec![(0.0f32, 0.0f32); self.particles.len()];
        let mut stress_deltas = vec![0.0f32; self.particles.len()];

        for i in 0..self.particles.len() {
            let p = self.particles[i];
            let neighbors = self.hash.query_radius(p.position.0, p.position.1, particle_radius * 2.0);
            for n in neighbors {
                let j = n as usize;
                if j <= i {
                    continue;
                }
                let q = self.particles[j];
                let dx = p.position.0 - q.position.0;
                let dz = p.position.1 - q.position.1;
                let dist = (dx * dx + dz * dz).sqrt();
                let overlap = particle_radius * 2.0 - dist;
                if overlap <= 0.0 {
                    continue;
                }
                let (ux, uz) = if dist > 1e-6 { (dx / dist, dz / dist) } else { (1.0, 0.0) };
                let push = overlap * 0.5;
                position_deltas[i].0 += ux * push;
                position_deltas[i].1 += uz * push;
                position_deltas[j].0 -= ux * push;
                position_deltas[j].1 -= uz * push;

                let transfer = 0.01 * (q.stress - p.stress);
                stress_deltas[i] += transfer;
                stress_deltas[j] -= transfer;
            }
        }

        let w = self.world_size_m;
        for (i, p) in self.particles.iter_mut().enumerate() {
            p.position.0 = (p.position.0 + position_deltas[i].0).clamp(0.0, w);
            p.position.1 = (p.position.1 + position_deltas[i].1).clamp(0.0, w);
            p.stress += stress_deltas[i];
        }
    }

    fn prune_out_of_bounds(&mut self) {
        let w = self.world_size_m;
        self.particles.retain(|p| p.position.0 >= 0.0 && p.position.0 <= w && p.position.1 >= 0.0 && p.position.1 <= w);
    }

    /// Inverse-square-distance-weighted interpolation of every neighbor
    /// within `2·R_interaction`, with weighted-mode rock-type selection
    /// (§4.H `sample_at`).
    pub fn sample_at(&self, x: f32, z: f32) -> ParticleSample {
        let reach = 2.0 * self.r_interaction;
        let neighbors = self.hash.query_radius(x, z, reach);
        if neighbors.is_empty() {
            return ParticleSample::default_oceanic();
        }

        let mut weight_sum = 0.0f32;
        let mut elevation = 0.0f32;
        let mut thickness = 0.0f32;
        let mut density = 0.0f32;
        let mut stress = 0.0f32;
        let mut rock_weights: std::collections::HashMap<RockType, f32> = std::collections::HashMap::new();
        let mut any = false;

        for n in neighbors {
            let p = self.particles[n as usize];
            let dx = x - p.position.0;
            let dz = z - p.position.1;
            let dist_sq = (dx * dx + dz * dz).max(1e-6);
            if dist_sq.sqrt() > reach {
                continue;
            }
            let weight = 1.0 / dist_sq;
            weight_sum += weight;
            elevation += p.elevation_m * weight;
            thickness += p.crustal_thickness_km * weight;
            density += p.density * weight;
            stress += p.stress * weight;
            *rock_weights.entry(p.rock_type).or_insert(0.0) += weight;
            any = true;
        }

        if !any || weight_sum <= 0.0 {
            return ParticleSample::default_oceanic();
        }

        let rock_type = rock_weights
            .into_iter()
            .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap())
            .map(|(rock, _)| rock)
            .unwrap_or(RockType::Basalt);

        ParticleSample {
            elevation_m: elevation / weight_sum,
            rock_type,
            crustal_thickness_km: thickness / weight_sum,
            density: density / weight_sum,
            stress: stress / weight_sum,
        }
    }

    pub fn particle_count(&self) -> usize {
        self.particles.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initialize_produces_a_non_trivial_population() {
        let mut engine = ParticleSimulationEngine::new(256.0);
        engine.initialize(1, 4, 0.68);
        assert!(engine.particle_count() > 1000);
    }

    #[test]
    fn determinism_same_seed_same_layout() {
        let mut a = ParticleSimulationEngine::new(128.0);
        let mut b = ParticleSimulationEngine::new(128.0);
        a.initialize(42, 3, 0.6);
        b.initialize(42, 3, 0.6);
        assert_eq!(a.particle_count(), b.particle_count());
        let pa: Vec<_> = a.particles().iter().map(|p| p.position).collect();
        let pb: Vec<_> = b.particles().iter().map(|p| p.position).collect();
        assert_eq!(pa, pb);
    }

    #[test]
    fn particles_stay_within_world_bounds_after_steps() {
        let mut engine = ParticleSimulationEngine::new(100.0);
        engine.initialize(7, 3, 0.6);
        for _ in 0..10 {
            engine.step(1000.0);
        }
        for p in engine.particles() {
            assert!(p.position.0 >= 0.0 && p.position.0 <= 100_000.0);
            assert!(p.position.1 >= 0.0 && p.position.1 <= 100_000.0);
        }
    }

    #[test]
    fn sample_at_falls_back_to_oceanic_default_far_from_everything() {
        let engine = ParticleSimulationEngine::new(256.0);
        let sample = engine.sample_at(1.0, 1.0);
        assert_eq!(sample.rock_type, RockType::Basalt);
        assert_eq!(sample.elevation_m, -100.0);
    }

    #[test]
    fn sample_at_near_a_continent_returns_positive_elevation() {
        let mut engine = ParticleSimulationEngine::new(256.0);
        engine.initialize(3, 2, 0.5);
        let continent_particle = engine.particles().iter().find(|p| p.kind == ParticleKind::Continental).unwrap();
        let sample = engine.sample_at(continent_particle.position.0, continent_particle.position.1);
        assert!(sample.elevation_m > -50.0);
    }
}
