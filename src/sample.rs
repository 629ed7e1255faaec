// ABOUTME: Composite value produced by the public sample_at(x,z) accessor (§3 "Geological sample")

use crate::rock::RockType;

/// Everything a chunk generator needs to know about one world-space point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeologicalSample {
    pub elevation_m: f32,
    pub rock_type: RockType,
    pub rock_hardness: f32,
    pub water_flow: f32,
    pub tectonic_stress: f32,
    pub temperature_c: f32,
    pub annual_rainfall_mm: f32,
    pub features: FeatureFlags,
}

/// Boolean feature flags carried by a `GeologicalSample`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FeatureFlags {
    pub joints: bool,
    pub caves: bool,
    pub quartz_veins: bool,
    pub wetlands: bool,
    pub springs: bool,
    pub lakes: bool,
    pub rivers: bool,
}

/// Derive temperature (°C) from elevation using a fixed lapse rate of
/// 6 °C/km above a sea-level baseline (§4.G `sample_at`).
pub fn temperature_from_elevation(elevation_m: f32, sea_level_baseline_c: f32) -> f32 {
    sea_level_baseline_c - 6.0 * (elevation_m.max(0.0) / 1000.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lapse_rate_cools_with_altitude() {
        let sea = temperature_from_elevation(0.0, 20.0);
        let mountain = temperature_from_elevation(3000.0, 20.0);
        assert_eq!(sea, 20.0);
        assert!((mountain - 2.0).abs() < 1e-5);
    }

    #[test]
    fn negative_elevation_does_not_warm_past_baseline() {
        assert_eq!(temperature_from_elevation(-500.0, 20.0), 20.0);
    }
}
