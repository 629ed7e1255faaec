// ABOUTME: Stateless tectonic operators over a borrowed TectonicFieldSet handle bundle (§4.D)
// ABOUTME: Every elevation mutation routes through the shared clamp + extreme-value diagnostic

use crate::constants::{self, clamp_elevation};
use crate::diagnostics::{DiagnosticEvent, DiagnosticsSink};
use crate::field::{CategoricalField, NumericField};
use crate::noise;
use crate::rock::RockType;
use std::sync::Arc;

/// A long-lived subsidence bias region (§3 "Rift zone"). Orientation is
/// radians measured from +x; `length`/`width` are the full ellipse axes.
#[derive(Debug, Clone, Copy)]
pub struct RiftZone {
    pub center: (f32, f32),
    pub orientation_rad: f32,
    pub length: f32,
    pub width: f32,
    pub extension_rate: f32,
    pub target_depth: f32,
}

impl RiftZone {
    /// `0` at the ellipse boundary/outside, `1` at the center; smooth falloff
    /// in between so the bias doesn't produce a hard edge.
    fn containment(&self, x: f32, z: f32) -> f32 {
        let dx = x - self.center.0;
        let dz = z - self.center.1;
        let (sin, cos) = self.orientation_rad.sin_cos();
        let lx = dx * cos + dz * sin;
        let lz = -dx * sin + dz * cos;
        let a = (self.length * 0.5).max(1e-3);
        let b = (self.width * 0.5).max(1e-3);
        let r2 = (lx / a).powi(2) + (lz / b).powi(2);
        if r2 >= 1.0 {
            0.0
        } else {
            1.0 - r2
        }
    }
}

/// Mutable borrow bundle the tectonic engine operates over for the
/// duration of one call; never retained past the call (§4.D).
pub struct TectonicFieldSet<'a> {
    pub mantle_stress: &'a mut NumericField,
    pub crust_stress: &'a mut NumericField,
    pub elevation: &'a mut NumericField,
    pub crustal_thickness: &'a mut NumericField,
    pub mantle_temperature: &'a mut NumericField,
    pub isostasy_adjustment: &'a mut NumericField,
    pub rock_type: &'a mut CategoricalField<RockType>,
    pub rock_hardness: &'a mut NumericField,
}

pub struct TectonicEngine {
    diagnostics: Arc<dyn DiagnosticsSink>,
}

impl TectonicEngine {
    pub fn new(diagnostics: Arc<dyn DiagnosticsSink>) -> Self {
        Self { diagnostics }
    }

    fn clamp_and_set(&self, elevation: &mut NumericField, x: i64, z: i64, unclamped: f32) {
        if unclamped.abs() > constants::E_EXTREME_THRESHOLD {
            self.diagnostics.report(DiagnosticEvent::ExtremeElevation { x, z, unclamped });
        }
        elevation.set(x, z, clamp_elevation(unclamped));
    }

    /// Mantle convection: fractal intensity drives both a mantle-stress
    /// equilibrium approach and a direct elevation nudge (§4.D).
    pub fn mantle_convection(&self, fields: &mut TectonicFieldSet, rifts: &[RiftZone], dt_myr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let spacing = fields.elevation.spacing();
        let time_scale = (dt_myr / 10_000.0).min(1.0);
        let mantle_stress = &*fields.mantle_stress;
        let elevation = &*fields.elevation;

        let updates: Vec<(f32, f32)> = crate::field::par_grid_map(width, height, |x, z| {
            let wx = x as f32 * spacing;
            let wz = z as f32 * spacing;

            let f1 = noise::octave_noise(wx, wz, 1e-4, 3, 0.5);
            let f2 = noise::octave_noise(wx, wz, 3e-4, 4, 0.5);
            let zone = 1.0 + 0.3 * ((0.0005 * wx).sin() + (0.0005 * wz).cos());
            let intensity = (0.7 * f1 + 0.3 * f2) * time_scale * zone;

            let sigma = mantle_stress.get(x, z);
            let sigma = sigma + 0.95 * (sigma + intensity - sigma);
            let sigma = sigma.clamp(-constants::MANTLE_STRESS_MAX, constants::MANTLE_STRESS_MAX);

            let mut delta = 100.0 * intensity;
            let current_elevation = elevation.get(x, z);
            if current_elevation < -500.0 {
                delta -= 20.0 * time_scale;
            }
            for rift in rifts {
                let containment = rift.containment(wx, wz);
                if containment > 0.0 {
                    delta -= rift.extension_rate * containment * dt_myr * 1e-3;
                }
            }

            (sigma, current_elevation + delta)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                let (sigma, unclamped_elevation) = updates[i];
                i += 1;
                fields.mantle_stress.set(x, z, sigma);
                self.clamp_and_set(fields.elevation, x, z, unclamped_elevation);
            }
        }
    }

    /// Crust stress accumulates with the local stress gradient magnitude and
    /// dissipates towards equilibrium at 0.1%/kyr (§4.D).
    pub fn plate_movement(&self, fields: &mut TectonicFieldSet, dt_myr: f32) {
        let width = fields.mantle_stress.width();
        let height = fields.mantle_stress.height();
        let dissipation = (1.0 - 0.001 * dt_myr * 1000.0).clamp(0.0, 1.0);
        let mantle_stress = &*fields.mantle_stress;
        let crust_stress = &*fields.crust_stress;

        let updates: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let gx = mantle_stress.get(x + 1, z) - mantle_stress.get(x - 1, z);
            let gz = mantle_stress.get(x, z + 1) - mantle_stress.get(x, z - 1);
            let grad_mag = (gx * gx + gz * gz).sqrt();

            let current = crust_stress.get(x, z);
            (current * dissipation + 0.01 * grad_mag * dt_myr).clamp(0.0, constants::CRUST_STRESS_MAX)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.crust_stress.set(x, z, updates[i]);
                i += 1;
            }
        }
    }

    /// Compression-driven uplift above the stress threshold, with
    /// high-stress metamorphism (§4.D).
    pub fn mountain_building(&self, fields: &mut TectonicFieldSet, dt_myr: f32) {
        let width = fields.crust_stress.width();
        let height = fields.crust_stress.height();
        let crust_stress = &*fields.crust_stress;
        let elevation = &*fields.elevation;
        let rock_type = &*fields.rock_type;

        let updates: Vec<Option<(f32, Option<RockType>)>> = crate::field::par_grid_map(width, height, |x, z| {
            let sigma = crust_stress.get(x, z);
            if sigma <= 0.5 {
                return None;
            }
            let e = elevation.get(x, z);
            let compression = (sigma - 0.5) / (1.0 + 0.0005 * e) * dt_myr * 5e-6;
            let compression = compression.clamp(0.0, constants::MAX_ELEVATION_DELTA_PER_STEP);
            let transformed = if sigma > 2.0 { Some(rock_type.get(x, z).metamorphose_under_stress()) } else { None };
            Some((e + compression, transformed))
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                if let Some((new_elevation, transformed)) = updates[i] {
                    self.clamp_and_set(fields.elevation, x, z, new_elevation);
                    if let Some(rock) = transformed {
                        fields.rock_type.set(x, z, rock);
                        fields.rock_hardness.set(x, z, rock.hardness());
                    }
                }
                i += 1;
            }
        }
    }

    /// Mantle-stress-driven volcanic uplift; resets rock type to basalt
    /// where it fires (§4.D).
    pub fn volcanic_activity(&self, fields: &mut TectonicFieldSet, dt_myr: f32) {
        let width = fields.mantle_stress.width();
        let height = fields.mantle_stress.height();
        let mantle_stress = &*fields.mantle_stress;
        let elevation = &*fields.elevation;

        let updates: Vec<Option<f32>> = crate::field::par_grid_map(width, height, |x, z| {
            let sigma = mantle_stress.get(x, z);
            if sigma <= 3.0 {
                return None;
            }
            let uplift = (sigma - 3.0) * dt_myr * 1e-4;
            Some(elevation.get(x, z) + uplift)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                if let Some(new_elevation) = updates[i] {
                    self.clamp_and_set(fields.elevation, x, z, new_elevation);
                    fields.rock_type.set(x, z, RockType::Basalt);
                    fields.rock_hardness.set(x, z, RockType::Basalt.hardness());
                }
                i += 1;
            }
        }
    }

    /// Isostatic rebound towards standard crustal thickness; Δt is
    /// pre-clamped to ≤100 yr to prevent instability (§4.D).
    pub fn isostasy_adjustment(&self, fields: &mut TectonicFieldSet, dt_years: f32) {
        let dt_safe = if dt_years > 100.0 {
            self.diagnostics.report(DiagnosticEvent::TimeStepClamped { engine: "isostasy_adjustment", requested: dt_years, clamped: 100.0 });
            100.0
        } else {
            dt_years
        };

        let width = fields.crustal_thickness.width();
        let height = fields.crustal_thickness.height();
        let crustal_thickness = &*fields.crustal_thickness;
        let elevation = &*fields.elevation;

        let updates: Vec<(f32, f32)> = crate::field::par_grid_map(width, height, |x, z| {
            let thickness = crustal_thickness.get(x, z);
            let adjustment = ((thickness - constants::CRUST_THICKNESS_STANDARD_KM) * 1e-6 * dt_safe).clamp(-10.0, 10.0);
            (adjustment, elevation.get(x, z) + adjustment)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                let (adjustment, new_elevation) = updates[i];
                i += 1;
                fields.isostasy_adjustment.set(x, z, adjustment);
                self.clamp_and_set(fields.elevation, x, z, new_elevation);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::NullDiagnostics;

    fn engine() -> TectonicEngine {
        TectonicEngine::new(Arc::new(NullDiagnostics))
    }

    fn fresh_fields(size: usize) -> (
        NumericField, NumericField, NumericField, NumericField, NumericField, NumericField, CategoricalField<RockType>, NumericField,
    ) {
        (
            NumericField::new(size, size, 100.0, 0.0),
            NumericField::new(size, size, 100.0, 0.0),
            NumericField::new(size, size, 100.0, 200.0),
            NumericField::new(size, size, 100.0, constants::CRUST_THICKNESS_STANDARD_KM),
            NumericField::new(size, size, 100.0, 1000.0),
            NumericField::new(size, size, 100.0, 0.0),
            CategoricalField::new(size, size, 100.0, RockType::Granite),
            NumericField::new(size, size, 100.0, RockType::Granite.hardness()),
        )
    }

    #[test]
    fn mantle_convection_keeps_elevation_within_hard_bounds() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(16);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        for _ in 0..20 {
            eng.mantle_convection(&mut fields, &[], 1000.0);
        }
        for &v in fields.elevation.data() {
            assert!(v >= -constants::E_MAX && v <= constants::E_MAX);
        }
    }

    #[test]
    fn mountain_building_only_acts_above_stress_threshold() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(8);
        crust.fill(0.1);
        let before = elevation.get(0, 0);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        eng.mountain_building(&mut fields, 1000.0);
        assert_eq!(fields.elevation.get(0, 0), before);
    }

    #[test]
    fn high_crust_stress_metamorphoses_sandstone_to_slate() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(4);
        crust.fill(3.0);
        rock.fill(RockType::Sandstone);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        eng.mountain_building(&mut fields, 1000.0);
        assert_eq!(fields.rock_type.get(0, 0), RockType::Slate);
    }

    #[test]
    fn volcanic_activity_sets_basalt_above_mantle_threshold() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(4);
        mantle.fill(5.0);
        rock.fill(RockType::Limestone);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        eng.volcanic_activity(&mut fields, 100.0);
        assert_eq!(fields.rock_type.get(0, 0), RockType::Basalt);
    }

    #[test]
    fn isostasy_pulls_thin_crust_elevation_upward() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(4);
        thickness.fill(constants::CRUST_THICKNESS_STANDARD_KM - 10.0);
        let before = elevation.get(0, 0);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        eng.isostasy_adjustment(&mut fields, 50.0);
        assert!(fields.elevation.get(0, 0) < before);
    }

    #[test]
    fn isostasy_clamps_oversized_time_step() {
        let eng = engine();
        let (mut mantle, mut crust, mut elevation, mut thickness, mut temp, mut isostasy, mut rock, mut hardness) = fresh_fields(4);
        thickness.fill(200_000.0);
        let mut fields = TectonicFieldSet {
            mantle_stress: &mut mantle,
            crust_stress: &mut crust,
            elevation: &mut elevation,
            crustal_thickness: &mut thickness,
            mantle_temperature: &mut temp,
            isostasy_adjustment: &mut isostasy,
            rock_type: &mut rock,
            rock_hardness: &mut hardness,
        };
        // (200_000 - 35) * 1e-6 * 100 (dt clamped from 1_000_000) = ~19.9965, past the +10.0 clamp.
        eng.isostasy_adjustment(&mut fields, 1_000_000.0);
        assert_eq!(fields.isostasy_adjustment.get(0, 0), 10.0);
    }
}
