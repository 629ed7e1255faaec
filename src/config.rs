// ABOUTME: Simulator configuration - quality presets and the custom knob set (§6 Construction)
// ABOUTME: serde-derived so hosts can load/save configs without the core touching a file

use crate::error::ConstructionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Preset {
    Performance,
    Balanced,
    Quality,
    Ultra,
    Custom,
}

impl Preset {
    /// `(resolution, step_budget)` per §4.G's preset table. `Custom` needs
    /// `custom.simulation_detail_level` to resolve; callers should prefer
    /// [`SimulatorConfig::resolution_and_steps`] over calling this directly.
    fn resolution_and_steps(self) -> Option<(usize, u32)> {
        match self {
            Preset::Performance => Some((256, 100)),
            Preset::Balanced => Some((512, 200)),
            Preset::Quality => Some((1024, 500)),
            Preset::Ultra => Some((2048, 1000)),
            Preset::Custom => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomConfig {
    pub enable_chemical_weathering: bool,
    pub enable_joint_systems: bool,
    pub enable_cave_systems: bool,
    pub enable_glacial_features: bool,
    pub time_scale_multiplier: f32,
    pub simulation_detail_level: i32,
    pub num_continents: i32,
    pub max_continent_size_pct: f32,
    pub min_ocean_coverage_pct: f32,
    pub force_ocean_generation: bool,
}

impl Default for CustomConfig {
    fn default() -> Self {
        Self {
            enable_chemical_weathering: true,
            enable_joint_systems: true,
            enable_cave_systems: true,
            enable_glacial_features: false,
            time_scale_multiplier: 1.0,
            simulation_detail_level: 256,
            num_continents: 4,
            max_continent_size_pct: 9.0,
            min_ocean_coverage_pct: 68.0,
            force_ocean_generation: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulatorConfig {
    pub preset: Preset,
    pub custom: CustomConfig,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { preset: Preset::Balanced, custom: CustomConfig::default() }
    }
}

impl SimulatorConfig {
    /// Resolution and step budget implied by `preset`, folding in the
    /// `Custom` preset's `clamp(detail/4, 256, 2048)` rule (§4.G).
    pub fn resolution_and_steps(&self) -> (usize, u32) {
        match self.preset.resolution_and_steps() {
            Some(pair) => pair,
            None => {
                let detail = self.custom.simulation_detail_level.clamp(100, 10_000);
                let resolution = ((detail / 4).clamp(256, 2048)) as usize;
                (resolution, detail as u32)
            }
        }
    }

    pub fn time_scale(&self) -> f32 {
        self.custom.time_scale_multiplier.clamp(0.1, 5.0)
    }

    pub fn num_continents(&self) -> usize {
        self.custom.num_continents.clamp(3, 7) as usize
    }

    /// Load a configuration from a YAML file.
    pub fn load_from_file(path: &str) -> Result<Self, ConstructionError> {
        let content = std::fs::read_to_string(path)?;
        let config: SimulatorConfig = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    /// Save this configuration to a YAML file.
    pub fn save_to_file(&self, path: &str) -> Result<(), ConstructionError> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn performance_preset_matches_table() {
        let cfg = SimulatorConfig { preset: Preset::Performance, ..Default::default() };
        assert_eq!(cfg.resolution_and_steps(), (256, 100));
    }

    #[test]
    fn custom_preset_derives_resolution_from_detail_level() {
        let cfg = SimulatorConfig {
            preset: Preset::Custom,
            custom: CustomConfig { simulation_detail_level: 4000, ..Default::default() },
        };
        assert_eq!(cfg.resolution_and_steps(), (1000, 4000));
    }

    #[test]
    fn custom_preset_clamps_resolution_bounds() {
        let cfg = SimulatorConfig {
            preset: Preset::Custom,
            custom: CustomConfig { simulation_detail_level: 100, ..Default::default() },
        };
        assert_eq!(cfg.resolution_and_steps().0, 256);
    }

    #[test]
    fn save_then_load_round_trips_through_yaml() {
        let path = std::env::temp_dir().join(format!("strata-config-test-{}.yaml", std::process::id()));
        let path = path.to_str().unwrap();
        let cfg = SimulatorConfig {
            preset: Preset::Custom,
            custom: CustomConfig { num_continents: 5, ..Default::default() },
        };

        cfg.save_to_file(path).unwrap();
        let loaded = SimulatorConfig::load_from_file(path).unwrap();
        std::fs::remove_file(path).unwrap();

        assert_eq!(loaded.preset, cfg.preset);
        assert_eq!(loaded.custom.num_continents, cfg.custom.num_continents);
    }

    #[test]
    fn time_scale_multiplier_is_clamped() {
        let cfg = SimulatorConfig {
            custom: CustomConfig { time_scale_multiplier: 99.0, ..Default::default() },
            ..Default::default()
        };
        assert_eq!(cfg.time_scale(), 5.0);
    }
}
