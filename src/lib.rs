// ABOUTME: Library interface for the strata geological world-generation engine
// ABOUTME: Exposes a clean public API for external use while keeping internal module organization

pub mod background;
pub mod config;
pub mod constants;
pub mod continent;
pub mod detail;
pub mod diagnostics;
pub mod erosion;
pub mod error;
pub mod field;
pub mod hybrid;
pub mod lsystem;
pub mod noise;
pub mod particle;
pub mod rock;
pub mod sample;
pub mod simulator;
pub mod snapshot;
pub mod spatial_hash;
pub mod tectonic;
pub mod water;

pub use background::BackgroundSimulation;
pub use config::{CustomConfig, Preset, SimulatorConfig};
pub use continent::{ContinentConfig, ContinentLayout, ContinentalPlate, OceanFeature, OceanFeatureKind, RidgeTemplate, RiverTemplate};
pub use detail::{DetailContext, FractalDetailEngine};
pub use diagnostics::{DiagnosticEvent, DiagnosticsSink, NullDiagnostics, StderrDiagnostics};
pub use erosion::{ErosionEngine, ErosionFieldSet};
pub use error::ConstructionError;
pub use field::{CategoricalField, NumericField};
pub use hybrid::HybridGeologicalSimulator;
pub use particle::{ContinentShape, ParticleKind, ParticleSample, ParticleSimulationEngine, TectonicParticle};
pub use rock::RockType;
pub use sample::{FeatureFlags, GeologicalSample};
pub use simulator::{PhaseInfo, SimState, Simulator};
pub use snapshot::{Snapshot, SnapshotManager, SnapshotMetadata, WaterSnapshotFields};
pub use tectonic::{RiftZone, TectonicEngine, TectonicFieldSet};
pub use water::{WaterFieldSet, WaterSystemSimulator};
