// ABOUTME: Owns every field plus one instance of each engine; drives the interleaved step loop (§4.G)
// ABOUTME: The only fallible operation in the whole crate is constructing this type (§7)

use crate::config::SimulatorConfig;
use crate::constants::{self, T_BASE_YEARS, TAU_DETAIL, TAU_EROSION, TAU_TECTONIC, TAU_VOLCANIC, TAU_WATER};
use crate::continent::{ContinentConfig, ContinentLayout, FractalContinentGenerator};
use crate::diagnostics::{DiagnosticsSink, NullDiagnostics, StderrDiagnostics};
use crate::error::ConstructionError;
use crate::erosion::{ErosionEngine, ErosionFieldSet};
use crate::field::{CategoricalField, NumericField};
use crate::rock::RockType;
use crate::sample::{temperature_from_elevation, FeatureFlags, GeologicalSample};
use crate::snapshot::{Snapshot, SnapshotManager, SnapshotMetadata, WaterSnapshotFields};
use crate::tectonic::{RiftZone, TectonicEngine, TectonicFieldSet};
use crate::water::{WaterFieldSet, WaterSystemSimulator};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Sanity bound on cell count so construction can fail cleanly instead of
/// the process aborting on an allocator OOM (§7 "resource exhaustion").
const MAX_CELLS: usize = 8192 * 8192;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimState {
    Uninitialized,
    Initialized,
    Running,
    Paused,
    Complete,
}

#[derive(Debug, Clone, Default)]
pub struct PhaseInfo {
    pub phase: String,
    pub phase_progress: f32,
    pub total_progress: f32,
    pub process_name: String,
}

pub struct Simulator {
    world_size_km: f32,
    resolution: usize,
    spacing: f32,
    total_steps: u32,
    current_step: u32,
    state: SimState,
    config: SimulatorConfig,
    diagnostics: Arc<dyn DiagnosticsSink>,

    elevation: NumericField,
    rock_type: CategoricalField<RockType>,
    rock_hardness: NumericField,
    mantle_stress: NumericField,
    crust_stress: NumericField,
    crustal_thickness: NumericField,
    mantle_temperature: NumericField,
    isostasy_adjustment: NumericField,

    precipitation: NumericField,
    surface_water_depth: NumericField,
    groundwater_depth: NumericField,
    permeability: NumericField,
    spring_flow: NumericField,
    water_flow: NumericField,
    sediment_load: NumericField,
    erosion_rate: NumericField,

    tectonic: TectonicEngine,
    erosion: ErosionEngine,
    water: WaterSystemSimulator,
    rift_zones: Vec<RiftZone>,
    continent_layout: Option<ContinentLayout>,

    snapshots: SnapshotManager,
    last_snapshot_at: Instant,
    progress_callback: Option<Box<dyn FnMut(PhaseInfo) + Send>>,
}

impl Simulator {
    /// The only fallible entry point in the crate (§7). Validates
    /// `world_size_km` and the implied cell count before allocating.
    pub fn new(world_size_km: f32, config: SimulatorConfig) -> Result<Self, ConstructionError> {
        if world_size_km <= 0.0 {
            return Err(ConstructionError::InvalidWorldSize { world_size_km });
        }
        let (resolution, total_steps) = config.resolution_and_steps();
        let cells = resolution * resolution;
        if cells > MAX_CELLS {
            return Err(ConstructionError::AllocationFailed { field: "elevation", cells });
        }
        let spacing = world_size_km * 1000.0 / resolution as f32;

        Ok(Self {
            world_size_km,
            resolution,
            spacing,
            total_steps,
            current_step: 0,
            state: SimState::Uninitialized,
            config,
            diagnostics: Arc::new(StderrDiagnostics::default()),

            elevation: NumericField::new(resolution, resolution, spacing, 0.0),
            rock_type: CategoricalField::new(resolution, resolution, spacing, RockType::Granite),
            rock_hardness: NumericField::new(resolution, resolution, spacing, RockType::Granite.hardness()),
            mantle_stress: NumericField::new(resolution, resolution, spacing, 0.1),
            crust_stress: NumericField::new(resolution, resolution, spacing, 0.0),
            crustal_thickness: NumericField::new(resolution, resolution, spacing, constants::CRUST_THICKNESS_STANDARD_KM),
            mantle_temperature: NumericField::new(resolution, resolution, spacing, 1300.0),
            isostasy_adjustment: NumericField::new(resolution, resolution, spacing, 0.0),

            precipitation: NumericField::new(resolution, resolution, spacing, 500.0),
            surface_water_depth: NumericField::new(resolution, resolution, spacing, 0.0),
            groundwater_depth: NumericField::new(resolution, resolution, spacing, 20.0),
            permeability: NumericField::new(resolution, resolution, spacing, 0.5),
            spring_flow: NumericField::new(resolution, resolution, spacing, 0.0),
            water_flow: NumericField::new(resolution, resolution, spacing, 0.0),
            sediment_load: NumericField::new(resolution, resolution, spacing, 0.0),
            erosion_rate: NumericField::new(resolution, resolution, spacing, 0.0),

            tectonic: TectonicEngine::new(Arc::new(NullDiagnostics)),
            erosion: ErosionEngine::new(),
            water: WaterSystemSimulator::new(),
            rift_zones: Vec::new(),
            continent_layout: None,

            snapshots: SnapshotManager::new(10),
            last_snapshot_at: Instant::now(),
            progress_callback: None,
        })
    }

    /// Supply a host-provided diagnostics sink, replacing the stderr default.
    pub fn with_diagnostics(mut self, sink: Arc<dyn DiagnosticsSink>) -> Self {
        self.tectonic = TectonicEngine::new(sink.clone());
        self.diagnostics = sink;
        self
    }

    pub fn set_progress_callback(&mut self, callback: Box<dyn FnMut(PhaseInfo) + Send>) {
        self.progress_callback = Some(callback);
    }

    pub fn state(&self) -> SimState {
        self.state
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn is_complete(&self) -> bool {
        self.state == SimState::Complete
    }

    pub fn is_paused(&self) -> bool {
        self.state == SimState::Paused
    }

    pub fn pause(&mut self) {
        if self.state == SimState::Running {
            self.state = SimState::Paused;
        }
    }

    pub fn resume(&mut self) {
        if self.state == SimState::Paused {
            self.state = SimState::Running;
        }
    }

    /// Seed fields via `FractalContinentGenerator`, then fill derived
    /// fields. Idempotent: a second call is a no-op outside debug builds,
    /// where it trips a `debug_assert!` (§7 "double initialize").
    pub fn initialize(&mut self, seed: u64) {
        debug_assert!(
            self.state == SimState::Uninitialized,
            "initialize() called twice without an intervening reset"
        );
        if self.state != SimState::Uninitialized {
            return;
        }

        let continent_config = ContinentConfig {
            num_continents: Some(self.config.num_continents()),
            ocean_ratio: self.config.custom.min_ocean_coverage_pct / 100.0,
            force_ocean_generation: self.config.custom.force_ocean_generation,
        };
        let generator = FractalContinentGenerator::new(seed, self.world_size_km, continent_config);
        let layout = generator.generate(&mut self.elevation, &mut self.rock_type, &mut self.mantle_stress);

        for z in 0..self.resolution as i64 {
            for x in 0..self.resolution as i64 {
                let rock = self.rock_type.get(x, z);
                self.rock_hardness.set(x, z, rock.hardness());
                self.permeability.set(x, z, rock.permeability());
            }
        }

        self.continent_layout = Some(layout);
        self.current_step = 0;
        self.state = SimState::Initialized;
        self.last_snapshot_at = Instant::now();
    }

    pub fn continent_layout(&self) -> Option<&ContinentLayout> {
        self.continent_layout.as_ref()
    }

    pub fn add_rift_zone(&mut self, rift: RiftZone) {
        self.rift_zones.push(rift);
    }

    /// One tick of the interleaved loop in the fixed order of §4.G. Returns
    /// `false` once the simulator has reached `totalSteps` (i.e. "nothing
    /// more to do"), never to signal an error.
    pub fn step(&mut self) -> bool {
        if self.state == SimState::Paused || self.state == SimState::Complete {
            return !self.is_complete();
        }
        if self.state == SimState::Initialized {
            self.state = SimState::Running;
        }
        if self.state != SimState::Running {
            return false;
        }

        let time_scale = self.config.time_scale();
        let base = T_BASE_YEARS * time_scale;

        self.run_tectonic_step(base);
        self.run_volcanic_step(base);
        self.run_erosion_step(base);
        if self.current_step % 5 == 0 && self.config.custom.enable_glacial_features {
            self.run_glacial_step(base * 5.0);
        }
        self.run_water_step(base);
        if self.config.custom.enable_cave_systems {
            self.run_cave_coupling_step(base);
        }
        self.run_detail_step(base);
        if self.current_step % 10 == 0 {
            self.run_isostasy_step(base * 10.0);
        }

        self.current_step += 1;
        let complete = self.current_step >= self.total_steps;
        if complete {
            self.state = SimState::Complete;
            self.emit_snapshot("complete");
        } else if self.last_snapshot_at.elapsed() >= Duration::from_millis(500) {
            self.emit_snapshot("running");
        }

        self.report_progress();
        !complete
    }

    fn run_tectonic_step(&mut self, base: f32) {
        let dt = base * TAU_TECTONIC;
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut self.mantle_stress,
            crust_stress: &mut self.crust_stress,
            elevation: &mut self.elevation,
            crustal_thickness: &mut self.crustal_thickness,
            mantle_temperature: &mut self.mantle_temperature,
            isostasy_adjustment: &mut self.isostasy_adjustment,
            rock_type: &mut self.rock_type,
            rock_hardness: &mut self.rock_hardness,
        };
        self.tectonic.mantle_convection(&mut fields, &self.rift_zones, dt);
        self.tectonic.plate_movement(&mut fields, dt);
        self.tectonic.mountain_building(&mut fields, dt);
    }

    fn run_volcanic_step(&mut self, base: f32) {
        let dt = base * TAU_VOLCANIC;
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut self.mantle_stress,
            crust_stress: &mut self.crust_stress,
            elevation: &mut self.elevation,
            crustal_thickness: &mut self.crustal_thickness,
            mantle_temperature: &mut self.mantle_temperature,
            isostasy_adjustment: &mut self.isostasy_adjustment,
            rock_type: &mut self.rock_type,
            rock_hardness: &mut self.rock_hardness,
        };
        self.tectonic.volcanic_activity(&mut fields, dt);
    }

    /// Field bundles are built inline at each call site (not behind a
    /// `&mut self` helper method) so the borrow checker can see the
    /// per-field borrows as disjoint from `self.erosion`/`self.water`.
    fn run_erosion_step(&mut self, base: f32) {
        let dt = base * TAU_EROSION / 1000.0;
        if self.config.custom.enable_chemical_weathering {
            let mut fields = ErosionFieldSet {
                elevation: &mut self.elevation,
                rock_hardness: &mut self.rock_hardness,
                water_flow: &mut self.water_flow,
                precipitation: &self.precipitation,
                surface_water_depth: &self.surface_water_depth,
                sediment_load: &mut self.sediment_load,
                erosion_rate: &mut self.erosion_rate,
                rock_type: &self.rock_type,
            };
            self.erosion.chemical_weathering(&mut fields, dt);
        }
        let mut fields = ErosionFieldSet {
            elevation: &mut self.elevation,
            rock_hardness: &mut self.rock_hardness,
            water_flow: &mut self.water_flow,
            precipitation: &self.precipitation,
            surface_water_depth: &self.surface_water_depth,
            sediment_load: &mut self.sediment_load,
            erosion_rate: &mut self.erosion_rate,
            rock_type: &self.rock_type,
        };
        self.erosion.physical_erosion(&mut fields, dt);
        self.erosion.water_driven_erosion(&mut fields, dt);
        self.erosion.sediment_transport(&mut fields, dt);
        self.erosion.erosion_uplift_balance(&mut fields, dt);
    }

    fn run_glacial_step(&mut self, base: f32) {
        let dt = base * TAU_EROSION / 1000.0;
        let mut fields = ErosionFieldSet {
            elevation: &mut self.elevation,
            rock_hardness: &mut self.rock_hardness,
            water_flow: &mut self.water_flow,
            precipitation: &self.precipitation,
            surface_water_depth: &self.surface_water_depth,
            sediment_load: &mut self.sediment_load,
            erosion_rate: &mut self.erosion_rate,
            rock_type: &self.rock_type,
        };
        self.erosion.glacial_erosion(&mut fields, dt);
    }

    fn run_water_step(&mut self, base: f32) {
        let dt = base * TAU_WATER;
        {
            let mut fields = WaterFieldSet {
                precipitation: &mut self.precipitation,
                surface_water_depth: &mut self.surface_water_depth,
                groundwater_depth: &mut self.groundwater_depth,
                permeability: &mut self.permeability,
                spring_flow: &mut self.spring_flow,
                water_flow: &mut self.water_flow,
                elevation: &self.elevation,
                rock_type: &self.rock_type,
            };
            self.water.precipitation(&mut fields);
            self.water.surface_accumulation(&mut fields, dt);
            self.water.river_formation(&mut fields, dt);
        }
        {
            let mut fields = ErosionFieldSet {
                elevation: &mut self.elevation,
                rock_hardness: &mut self.rock_hardness,
                water_flow: &mut self.water_flow,
                precipitation: &self.precipitation,
                surface_water_depth: &self.surface_water_depth,
                sediment_load: &mut self.sediment_load,
                erosion_rate: &mut self.erosion_rate,
                rock_type: &self.rock_type,
            };
            self.erosion.river_carving(&mut fields, dt);
        }
        {
            let mut fields = WaterFieldSet {
                precipitation: &mut self.precipitation,
                surface_water_depth: &mut self.surface_water_depth,
                groundwater_depth: &mut self.groundwater_depth,
                permeability: &mut self.permeability,
                spring_flow: &mut self.spring_flow,
                water_flow: &mut self.water_flow,
                elevation: &self.elevation,
                rock_type: &self.rock_type,
            };
            self.water.groundwater_recharge(&mut fields, dt);
            self.water.spring_formation(&mut fields);
            if self.current_step % 3 == 0 {
                self.water.flood_plains(&mut fields, dt * 3.0);
                self.water.lakes(&mut fields, dt * 3.0);
            }
            if self.current_step % 2 == 0 {
                self.water.wetlands(&mut fields, dt * 2.0);
            }
        }
    }

    fn run_cave_coupling_step(&mut self, base: f32) {
        let dt = base * TAU_WATER;
        let mut fields = WaterFieldSet {
            precipitation: &mut self.precipitation,
            surface_water_depth: &mut self.surface_water_depth,
            groundwater_depth: &mut self.groundwater_depth,
            permeability: &mut self.permeability,
            spring_flow: &mut self.spring_flow,
            water_flow: &mut self.water_flow,
            elevation: &self.elevation,
            rock_type: &self.rock_type,
        };
        self.water.cave_water_coupling(&mut fields, dt);
    }

    fn run_detail_step(&mut self, base: f32) {
        let dt = base * TAU_DETAIL / 1000.0;
        let mut fields = ErosionFieldSet {
            elevation: &mut self.elevation,
            rock_hardness: &mut self.rock_hardness,
            water_flow: &mut self.water_flow,
            precipitation: &self.precipitation,
            surface_water_depth: &self.surface_water_depth,
            sediment_load: &mut self.sediment_load,
            erosion_rate: &mut self.erosion_rate,
            rock_type: &self.rock_type,
        };
        self.erosion.micro_weathering(&mut fields, dt);
        self.erosion.sediment_deposition(&mut fields, dt);
    }

    fn run_isostasy_step(&mut self, base: f32) {
        let dt_years = base * TAU_TECTONIC;
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut self.mantle_stress,
            crust_stress: &mut self.crust_stress,
            elevation: &mut self.elevation,
            crustal_thickness: &mut self.crustal_thickness,
            mantle_temperature: &mut self.mantle_temperature,
            isostasy_adjustment: &mut self.isostasy_adjustment,
            rock_type: &mut self.rock_type,
            rock_hardness: &mut self.rock_hardness,
        };
        self.tectonic.isostasy_adjustment(&mut fields, dt_years);
    }

    fn emit_snapshot(&mut self, phase: &str) {
        let completion = self.current_step as f32 / self.total_steps.max(1) as f32;
        let snapshot = Snapshot {
            elevation: self.elevation.clone(),
            rock_type: self.rock_type.clone(),
            mantle_stress: self.mantle_stress.clone(),
            water: Some(WaterSnapshotFields {
                surface_water_depth: self.surface_water_depth.clone(),
                precipitation: self.precipitation.clone(),
                groundwater_depth: self.groundwater_depth.clone(),
                water_flow: self.water_flow.clone(),
                sediment_load: self.sediment_load.clone(),
            }),
            metadata: SnapshotMetadata {
                simulation_time_years: self.current_step as f64 * T_BASE_YEARS as f64,
                phase_description: phase.to_string(),
                step_index: self.current_step,
                completion_fraction: completion.clamp(0.0, 1.0),
                generation_cost_ms: 0.0,
            },
        };
        self.snapshots.push(snapshot);
        self.last_snapshot_at = Instant::now();
    }

    fn report_progress(&mut self) {
        if let Some(callback) = &mut self.progress_callback {
            let total_progress = self.current_step as f32 / self.total_steps.max(1) as f32;
            callback(PhaseInfo {
                phase: "step".to_string(),
                phase_progress: total_progress,
                total_progress,
                process_name: "GeologicalSimulator".to_string(),
            });
        }
    }

    pub fn latest_snapshot(&self) -> Option<&Snapshot> {
        self.snapshots.latest()
    }

    pub fn snapshot_count(&self) -> usize {
        self.snapshots.count()
    }

    pub fn set_current_snapshot(&mut self, index: usize) -> bool {
        self.snapshots.set_current(index)
    }

    pub fn next_snapshot(&mut self) -> Option<&Snapshot> {
        self.snapshots.next()
    }

    pub fn previous_snapshot(&mut self) -> Option<&Snapshot> {
        self.snapshots.previous()
    }

    /// Read-only gather across every owned field (§4.G `sample_at`).
    pub fn sample_at(&self, x: f32, z: f32) -> GeologicalSample {
        let elevation_m = self.elevation.sample_at(x, z);
        let rock_type = self.rock_type.sample_at(x, z);
        let water_flow = self.water_flow.sample_at(x, z);
        let tectonic_stress = self.crust_stress.sample_at(x, z) - self.mantle_stress.sample_at(x, z);
        let annual_rainfall_mm = self.precipitation.sample_at(x, z);
        let groundwater_depth = self.groundwater_depth.sample_at(x, z);
        let spring_flow = self.spring_flow.sample_at(x, z);
        let surface_water = self.surface_water_depth.sample_at(x, z);

        GeologicalSample {
            elevation_m,
            rock_type,
            rock_hardness: rock_type.hardness(),
            water_flow,
            tectonic_stress: tectonic_stress.clamp(-10.0, 10.0),
            temperature_c: temperature_from_elevation(elevation_m, 20.0),
            annual_rainfall_mm,
            features: FeatureFlags {
                joints: self.config.custom.enable_joint_systems && tectonic_stress.abs() > 1.5,
                caves: self.config.custom.enable_cave_systems
                    && matches!(rock_type, RockType::Limestone | RockType::Sandstone)
                    && groundwater_depth < 50.0,
                quartz_veins: rock_type == RockType::Quartzite,
                wetlands: surface_water > 0.5 && elevation_m < 50.0,
                springs: spring_flow > 0.0,
                lakes: surface_water > 2.0,
                rivers: water_flow > 0.5,
            },
        }
    }

    pub fn world_size_km(&self) -> f32 {
        self.world_size_km
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn current_step(&self) -> u32 {
        self.current_step
    }

    pub fn total_steps(&self) -> u32 {
        self.total_steps
    }
}
