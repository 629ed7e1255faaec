// ABOUTME: Composes the particle and fractal-detail engines into one lightweight simulator (§4.J)
// ABOUTME: Meant for interactive/streaming use where the field-based Simulator's per-step cost is too high

use crate::detail::{DetailContext, FractalDetailEngine};
use crate::particle::{ParticleSample, ParticleSimulationEngine};
use crate::rock::RockType;

/// Time the hybrid simulator clamps at (§4.J `step`).
const TARGET_TIME_YEARS: f32 = 100_000.0;
const DEFAULT_DT_YEARS: f32 = 1000.0;

pub struct HybridGeologicalSimulator {
    particles: ParticleSimulationEngine,
    detail: FractalDetailEngine,
    world_size_m: f32,
    simulation_time_years: f32,
    fractal_weight: f32,
}

impl HybridGeologicalSimulator {
    pub fn new(world_size_km: f32) -> Self {
        Self {
            particles: ParticleSimulationEngine::new(world_size_km),
            detail: FractalDetailEngine::new(),
            world_size_m: world_size_km * 1000.0,
            simulation_time_years: 0.0,
            fractal_weight: 0.3,
        }
    }

    /// Overrides the default 0.7/0.3 particle/fractal elevation blend.
    pub fn with_fractal_weight(mut self, fractal_weight: f32) -> Self {
        self.fractal_weight = fractal_weight.clamp(0.0, 1.0);
        self
    }

    pub fn initialize(&mut self, seed: u64, continent_count: usize, ocean_ratio: f32) {
        self.particles.initialize(seed, continent_count, ocean_ratio);
        self.detail.clear_cache();
        self.simulation_time_years = 0.0;
    }

    /// Advances particles by `dt_yr`, clears the (now-stale) detail cache
    /// and clamps the simulator's clock at `TARGET_TIME_YEARS` (§4.J `step`).
    pub fn step(&mut self, dt_yr: f32) {
        if self.simulation_time_years >= TARGET_TIME_YEARS {
            return;
        }
        let dt = dt_yr.min(TARGET_TIME_YEARS - self.simulation_time_years);
        self.particles.step(dt);
        self.detail.clear_cache();
        self.simulation_time_years += dt;
    }

    pub fn step_default(&mut self) {
        self.step(DEFAULT_DT_YEARS);
    }

    pub fn simulation_time_years(&self) -> f32 {
        self.simulation_time_years
    }

    pub fn is_complete(&self) -> bool {
        self.simulation_time_years >= TARGET_TIME_YEARS
    }

    /// `particleElevation + fractalWeight · (fractalDetail − particleElevation)` (§4.J).
    pub fn elevation_at(&mut self, x: f32, z: f32, resolution: f32) -> f32 {
        let particle_sample = self.particles.sample_at(x, z);
        let ctx = self.detail_context(x, z, &particle_sample);
        let fractal_detail = self.detail.detail_at(x, z, particle_sample.elevation_m, ctx, resolution);
        particle_sample.elevation_m + self.fractal_weight * (fractal_detail - particle_sample.elevation_m)
    }

    pub fn rock_type_at(&self, x: f32, z: f32) -> RockType {
        self.particles.sample_at(x, z).rock_type
    }

    /// `0.7·min(1, max(0,e)/1000) + 0.3·min(1, max(0, thickness−5km)/30km)` (§4.J).
    fn continental_proximity(elevation_m: f32, crustal_thickness_km: f32) -> f32 {
        let elevation_term = (elevation_m.max(0.0) / 1000.0).min(1.0);
        let thickness_term = ((crustal_thickness_km - 5.0).max(0.0) / 30.0).min(1.0);
        0.7 * elevation_term + 0.3 * thickness_term
    }

    /// Eight radial samples at 5 km; on a land/ocean sign flip, binary-search
    /// (5 iterations) for the crossing and keep the minimum distance found (§4.J).
    fn distance_to_coast(&mut self, x: f32, z: f32) -> f32 {
        const RADIAL_STEP_M: f32 = 5_000.0;
        const DIRECTIONS: usize = 8;
        let center_is_land = self.particles.sample_at(x, z).elevation_m > 0.0;

        let mut min_dist = f32::INFINITY;
        for i in 0..DIRECTIONS {
            let angle = i as f32 * std::f32::consts::TAU / DIRECTIONS as f32;
            let (dx, dz) = (angle.cos(), angle.sin());
            let sample_point = (x + dx * RADIAL_STEP_M, z + dz * RADIAL_STEP_M);
            let ray_is_land = self.particles.sample_at(sample_point.0, sample_point.1).elevation_m > 0.0;

            if ray_is_land != center_is_land {
                let mut near = 0.0f32;
                let mut far = RADIAL_STEP_M;
                for _ in 0..5 {
                    let mid = (near + far) * 0.5;
                    let mid_point = (x + dx * mid, z + dz * mid);
                    let mid_is_land = self.particles.sample_at(mid_point.0, mid_point.1).elevation_m > 0.0;
                    if mid_is_land == center_is_land {
                        near = mid;
                    } else {
                        far = mid;
                    }
                }
                min_dist = min_dist.min((near + far) * 0.5);
            }
        }

        if min_dist.is_finite() {
            min_dist
        } else {
            RADIAL_STEP_M
        }
    }

    fn detail_context(&mut self, x: f32, z: f32, particle_sample: &ParticleSample) -> DetailContext {
        let continental_proximity = Self::continental_proximity(particle_sample.elevation_m, particle_sample.crustal_thickness_km);
        let distance_to_coast_m = self.distance_to_coast(x, z);
        DetailContext {
            continental_proximity,
            distance_to_coast_m,
            stress: particle_sample.stress,
            crustal_thickness_km: particle_sample.crustal_thickness_km,
            plate_velocity_magnitude: 0.0,
            rock_type: particle_sample.rock_type,
        }
    }

    pub fn world_size_km(&self) -> f32 {
        self.world_size_m / 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn step_clamps_at_target_time() {
        let mut sim = HybridGeologicalSimulator::new(128.0);
        sim.initialize(1, 3, 0.6);
        for _ in 0..200 {
            sim.step(1000.0);
        }
        assert!(sim.is_complete());
        assert_eq!(sim.simulation_time_years(), 100_000.0);
    }

    #[test]
    fn elevation_at_blends_particle_and_fractal_layers() {
        let mut sim = HybridGeologicalSimulator::new(128.0);
        sim.initialize(42, 3, 0.6);
        let elevation = sim.elevation_at(10_000.0, 10_000.0, 1000.0);
        assert!(elevation.is_finite());
    }

    #[test]
    fn continental_proximity_saturates_at_one() {
        assert_eq!(HybridGeologicalSimulator::continental_proximity(5000.0, 60.0), 1.0);
        assert_eq!(HybridGeologicalSimulator::continental_proximity(-200.0, 0.0), 0.0);
    }

    #[test]
    fn step_resets_detail_cache_each_call() {
        let mut sim = HybridGeologicalSimulator::new(64.0);
        sim.initialize(5, 2, 0.5);
        let _ = sim.elevation_at(1000.0, 1000.0, 500.0);
        assert!(sim.detail.cache_len() > 0);
        sim.step(1000.0);
        assert_eq!(sim.detail.cache_len(), 0);
    }
}
