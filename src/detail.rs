// ABOUTME: Stateless multi-scale noise oracle with a bounded, evict-oldest-half cache (§4.I FractalDetailEngine)
// ABOUTME: Five fixed noise layers gated by query resolution and shaped by caller-supplied context modifiers

use crate::noise;
use crate::rock::RockType;
use std::collections::HashMap;

/// Context passed alongside a query point; these are not fields the engine
/// owns, they're whatever the caller (the hybrid simulator) already knows
/// about that point (§4.I step 3).
#[derive(Debug, Clone, Copy)]
pub struct DetailContext {
    pub continental_proximity: f32,
    pub distance_to_coast_m: f32,
    pub stress: f32,
    pub crustal_thickness_km: f32,
    pub plate_velocity_magnitude: f32,
    pub rock_type: RockType,
}

struct NoiseLayer {
    scale_m: f32,
    amplitude: f32,
    octaves: u32,
    persistence: f32,
    sub_seed_offset: f32,
}

/// Scale/amplitude/octave/persistence per layer (§4.I). `sub_seed_offset`
/// shifts the sample coordinates per layer so the five layers don't share
/// lattice structure despite using the same underlying hash noise.
const LAYERS: [NoiseLayer; 5] = [
    NoiseLayer { scale_m: 100_000.0, amplitude: 500.0, octaves: 4, persistence: 0.6, sub_seed_offset: 0.0 },
    NoiseLayer { scale_m: 10_000.0, amplitude: 200.0, octaves: 5, persistence: 0.5, sub_seed_offset: 91_727.0 },
    NoiseLayer { scale_m: 5_000.0, amplitude: 1000.0, octaves: 6, persistence: 0.5, sub_seed_offset: 403_913.0 },
    NoiseLayer { scale_m: 1_000.0, amplitude: 100.0, octaves: 4, persistence: 0.6, sub_seed_offset: 777_551.0 },
    NoiseLayer { scale_m: 100.0, amplitude: 10.0, octaves: 3, persistence: 0.4, sub_seed_offset: 1_299_709.0 },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct CacheKey {
    qx: i64,
    qz: i64,
    qres: i64,
}

pub struct FractalDetailEngine {
    cache: HashMap<CacheKey, f32>,
    cache_limit: usize,
}

impl FractalDetailEngine {
    pub fn new() -> Self {
        Self::with_cache_limit(10_000)
    }

    pub fn with_cache_limit(cache_limit: usize) -> Self {
        Self { cache: HashMap::new(), cache_limit: cache_limit.max(1) }
    }

    pub fn clear_cache(&mut self) {
        self.cache.clear();
    }

    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Composed multi-scale detail offset at `(x, z)` (§4.I `detail_at`).
    pub fn detail_at(&mut self, x: f32, z: f32, base_elevation: f32, ctx: DetailContext, resolution: f32) -> f32 {
        let key = CacheKey {
            qx: (x / resolution.max(1e-3)).round() as i64,
            qz: (z / resolution.max(1e-3)).round() as i64,
            qres: resolution.max(1e-3) as i64,
        };
        if let Some(&cached) = self.cache.get(&key) {
            return cached;
        }

        let mut total = 0.0f32;
        for (i, layer) in LAYERS.iter().enumerate() {
            if resolution < 0.1 * layer.scale_m {
                continue;
            }
            let freq = 1.0 / layer.scale_m;
            let raw = noise::octave_noise(x + layer.sub_seed_offset, z + layer.sub_seed_offset, freq, layer.octaves, layer.persistence);
            let mut contribution = raw * layer.amplitude;

            contribution *= match i {
                0 => ctx.continental_proximity,
                1 => (-ctx.distance_to_coast_m / 50_000.0).exp(),
                2 => (ctx.stress / 1e6).min(1.0) * ctx.continental_proximity,
                _ => 1.0,
            };

            let geological_weight = 0.5 * (1.0 + ctx.crustal_thickness_km / 35.0) * (0.8 + 0.2 * (ctx.plate_velocity_magnitude / 0.1).min(1.0));
            contribution *= geological_weight;
            total += contribution;
        }

        total *= ctx.rock_type.detail_multiplier();
        total *= 1.0 + (ctx.stress / 1e7).min(0.5);

        let result = base_elevation + total;
        self.store(key, result);
        result
    }

    fn store(&mut self, key: CacheKey, value: f32) {
        if self.cache.len() >= self.cache_limit {
            let evict_count = self.cache.len() / 2;
            let victims: Vec<CacheKey> = self.cache.keys().take(evict_count).copied().collect();
            for victim in victims {
                self.cache.remove(&victim);
            }
        }
        self.cache.insert(key, value);
    }
}

impl Default for FractalDetailEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx() -> DetailContext {
        DetailContext {
            continental_proximity: 1.0,
            distance_to_coast_m: 0.0,
            stress: 0.0,
            crustal_thickness_km: 35.0,
            plate_velocity_magnitude: 0.0,
            rock_type: RockType::Granite,
        }
    }

    #[test]
    fn cache_hit_returns_identical_value() {
        let mut engine = FractalDetailEngine::new();
        let a = engine.detail_at(1000.0, 2000.0, 100.0, ctx(), 100.0);
        let b = engine.detail_at(1000.0, 2000.0, 100.0, ctx(), 100.0);
        assert_eq!(a, b);
        assert_eq!(engine.cache_len(), 1);
    }

    #[test]
    fn low_resolution_gates_out_fine_layers() {
        let mut high_res = FractalDetailEngine::new();
        let mut low_res = FractalDetailEngine::new();
        let coarse_ctx = DetailContext { continental_proximity: 0.0, ..ctx() };

        let with_fine = high_res.detail_at(500.0, 500.0, 0.0, coarse_ctx, 50_000.0);
        let without_fine = low_res.detail_at(500.0, 500.0, 0.0, coarse_ctx, 5.0);
        assert_ne!(with_fine, without_fine);
    }

    #[test]
    fn cache_evicts_first_half_once_full() {
        let mut engine = FractalDetailEngine::with_cache_limit(4);
        for i in 0..4 {
            engine.detail_at(i as f32 * 10_000.0, 0.0, 0.0, ctx(), 100.0);
        }
        assert_eq!(engine.cache_len(), 4);
        engine.detail_at(999_999.0, 0.0, 0.0, ctx(), 100.0);
        assert!(engine.cache_len() <= 3);
    }

    #[test]
    fn rock_type_multiplier_scales_output_magnitude() {
        let mut granite_engine = FractalDetailEngine::new();
        let mut sandstone_engine = FractalDetailEngine::new();
        let granite = granite_engine.detail_at(3000.0, 4000.0, 0.0, ctx(), 100.0);
        let sandstone = sandstone_engine.detail_at(3000.0, 4000.0, 0.0, DetailContext { rock_type: RockType::Sandstone, ..ctx() }, 100.0);
        assert!((granite / sandstone - RockType::Granite.detail_multiplier() / RockType::Sandstone.detail_multiplier()).abs() < 1e-3);
    }
}
