// ABOUTME: Stateless hydrological operators over a borrowed WaterFieldSet handle bundle (§4.F)
// ABOUTME: Flood-plain/lake/wetland hooks are present but intentionally inactive per spec

use crate::field::{CategoricalField, NumericField};
use crate::noise;
use crate::rock::RockType;

/// Mutable borrow bundle the water engine operates over for the duration
/// of one call (§4.F).
pub struct WaterFieldSet<'a> {
    pub precipitation: &'a mut NumericField,
    pub surface_water_depth: &'a mut NumericField,
    pub groundwater_depth: &'a mut NumericField,
    pub permeability: &'a mut NumericField,
    pub spring_flow: &'a mut NumericField,
    pub water_flow: &'a mut NumericField,
    pub elevation: &'a NumericField,
    pub rock_type: &'a CategoricalField<RockType>,
}

pub struct WaterSystemSimulator;

impl WaterSystemSimulator {
    pub fn new() -> Self {
        Self
    }

    /// Permeability tracks rock type directly; resynced whenever rock type
    /// may have changed (metamorphism, volcanism) rather than every step.
    pub fn sync_permeability(&self, fields: &mut WaterFieldSet) {
        let width = fields.permeability.width();
        let height = fields.permeability.height();
        let rock_type = fields.rock_type;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| rock_type.get(x, z).permeability());

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.permeability.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Orographic + latitudinal precipitation, fully resampled each call (§4.F).
    pub fn precipitation(&self, fields: &mut WaterFieldSet) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let spacing = fields.elevation.spacing();
        let elevation = &*fields.elevation;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let e = elevation.get(x, z);
            let wx = x as f32 * spacing;
            let wz = z as f32 * spacing;
            let p = 500.0 * (1.0 + (1.0 + e / 1000.0).min(2.0)) + 200.0 * noise::octave_noise(wx, wz, 1e-3, 4, 0.5);
            p.max(0.0)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.precipitation.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Inflow from precipitation, 1%/Δt evaporation, 5%/Δt drainage;
    /// clamped ≥ 0 (§4.F).
    pub fn surface_accumulation(&self, fields: &mut WaterFieldSet, dt_water: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let elevation = &*fields.elevation;
        let precipitation = &*fields.precipitation;
        let surface_water_depth = &*fields.surface_water_depth;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let e = elevation.get(x, z);
            let precip = precipitation.get(x, z);
            let inflow = precip / 1000.0 * dt_water * (1.0 - e / 1000.0).max(0.1);

            let depth = surface_water_depth.get(x, z) + inflow;
            let depth = depth * (1.0 - 0.01 * dt_water) * (1.0 - 0.05 * dt_water);
            depth.max(0.0)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.surface_water_depth.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Steepest-descent flow magnitude over the 8-neighborhood (§4.F).
    pub fn river_formation(&self, fields: &mut WaterFieldSet, dt_water: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        const OFFSETS: [(i64, i64); 8] = [(-1, -1), (0, -1), (1, -1), (-1, 0), (1, 0), (-1, 1), (0, 1), (1, 1)];
        let elevation = &*fields.elevation;
        let surface_water_depth = &*fields.surface_water_depth;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let center = elevation.get(x, z);
            let mut max_slope = 0.0f32;
            for &(dx, dz) in &OFFSETS {
                let neighbor = elevation.get(x + dx, z + dz);
                let drop = center - neighbor;
                if drop > max_slope {
                    max_slope = drop;
                }
            }
            let depth = surface_water_depth.get(x, z);
            (max_slope * depth * dt_water * 0.1).max(0.0)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.water_flow.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Recharge proportional to permeability; depth clamped ≥ 1 m (§4.F).
    pub fn groundwater_recharge(&self, fields: &mut WaterFieldSet, dt_water: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let precipitation = &*fields.precipitation;
        let permeability = &*fields.permeability;
        let groundwater_depth = &*fields.groundwater_depth;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let precip = precipitation.get(x, z);
            let perm = permeability.get(x, z);
            let recharge = precip / 1000.0 * perm * dt_water * 0.1;
            (groundwater_depth.get(x, z) - recharge).max(1.0)
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.groundwater_depth.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Springs where groundwater is shallow and elevation is mid-range (§4.F).
    pub fn spring_formation(&self, fields: &mut WaterFieldSet) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let elevation = &*fields.elevation;
        let groundwater_depth = &*fields.groundwater_depth;

        let values: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let depth = groundwater_depth.get(x, z);
            let e = elevation.get(x, z);
            if depth < 5.0 && e > 100.0 && e < 800.0 {
                (5.0 - depth) / 5.0 * 0.1
            } else {
                0.0
            }
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.spring_flow.set(x, z, values[i]);
                i += 1;
            }
        }
    }

    /// Limestone/sandstone-only amplification of local flow when
    /// groundwater is shallow (§4.F).
    pub fn cave_water_coupling(&self, fields: &mut WaterFieldSet, dt_water: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let rock_type = fields.rock_type;
        let groundwater_depth = &*fields.groundwater_depth;
        let water_flow = &*fields.water_flow;

        let additions: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let rock = rock_type.get(x, z);
            if !matches!(rock, RockType::Limestone | RockType::Sandstone) {
                return 0.0;
            }
            let depth = groundwater_depth.get(x, z);
            if depth >= 50.0 {
                return 0.0;
            }
            let amplification = ((50.0 - depth) / 50.0).min(1.0) * dt_water * 0.1;
            water_flow.get(x, z) * amplification
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                fields.water_flow.add(x, z, additions[i]);
                i += 1;
            }
        }
    }

    /// Present but inactive per spec - hook for future flood-plain modeling.
    pub fn flood_plains(&self, _fields: &mut WaterFieldSet, _dt_water: f32) {}

    /// Present but inactive per spec - hook for future lake modeling.
    pub fn lakes(&self, _fields: &mut WaterFieldSet, _dt_water: f32) {}

    /// Present but inactive per spec - hook for future wetland modeling.
    pub fn wetlands(&self, _fields: &mut WaterFieldSet, _dt_water: f32) {}
}

impl Default for WaterSystemSimulator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(size: usize) -> (
        NumericField, NumericField, NumericField, NumericField, NumericField, NumericField, NumericField, CategoricalField<RockType>,
    ) {
        (
            NumericField::new(size, size, 1000.0, 0.0),
            NumericField::new(size, size, 1000.0, 0.0),
            NumericField::new(size, size, 1000.0, 10.0),
            NumericField::new(size, size, 1000.0, 0.5),
            NumericField::new(size, size, 1000.0, 0.0),
            NumericField::new(size, size, 1000.0, 0.0),
            NumericField::new(size, size, 1000.0, 200.0),
            CategoricalField::new(size, size, 1000.0, RockType::Limestone),
        )
    }

    #[test]
    fn precipitation_is_non_negative_everywhere() {
        let sim = WaterSystemSimulator::new();
        let (mut precip, mut surface, mut gw, mut perm, mut spring, mut flow, elevation, rock) = fields(8);
        let mut set = WaterFieldSet {
            precipitation: &mut precip,
            surface_water_depth: &mut surface,
            groundwater_depth: &mut gw,
            permeability: &mut perm,
            spring_flow: &mut spring,
            water_flow: &mut flow,
            elevation: &elevation,
            rock_type: &rock,
        };
        sim.precipitation(&mut set);
        for &v in set.precipitation.data() {
            assert!(v >= 0.0);
        }
    }

    #[test]
    fn sync_permeability_matches_rock_table() {
        let sim = WaterSystemSimulator::new();
        let (mut precip, mut surface, mut gw, mut perm, mut spring, mut flow, elevation, mut rock) = fields(4);
        rock.set(1, 1, RockType::Granite);
        let mut set = WaterFieldSet {
            precipitation: &mut precip,
            surface_water_depth: &mut surface,
            groundwater_depth: &mut gw,
            permeability: &mut perm,
            spring_flow: &mut spring,
            water_flow: &mut flow,
            elevation: &elevation,
            rock_type: &rock,
        };
        sim.sync_permeability(&mut set);
        assert_eq!(set.permeability.get(1, 1), RockType::Granite.permeability());
        assert_eq!(set.permeability.get(0, 0), RockType::Limestone.permeability());
    }

    #[test]
    fn spring_formation_only_in_shallow_midrange_cells() {
        let sim = WaterSystemSimulator::new();
        let (mut precip, mut surface, mut gw, mut perm, mut spring, mut flow, mut elevation, rock) = fields(4);
        gw.fill(2.0);
        elevation.fill(300.0);
        let mut set = WaterFieldSet {
            precipitation: &mut precip,
            surface_water_depth: &mut surface,
            groundwater_depth: &mut gw,
            permeability: &mut perm,
            spring_flow: &mut spring,
            water_flow: &mut flow,
            elevation: &elevation,
            rock_type: &rock,
        };
        sim.spring_formation(&mut set);
        assert!(set.spring_flow.get(0, 0) > 0.0);
    }

    #[test]
    fn cave_water_coupling_skips_non_karst_rock() {
        let sim = WaterSystemSimulator::new();
        let (mut precip, mut surface, mut gw, mut perm, mut spring, mut flow, elevation, mut rock) = fields(4);
        rock.fill(RockType::Granite);
        gw.fill(5.0);
        flow.fill(1.0);
        let mut set = WaterFieldSet {
            precipitation: &mut precip,
            surface_water_depth: &mut surface,
            groundwater_depth: &mut gw,
            permeability: &mut perm,
            spring_flow: &mut spring,
            water_flow: &mut flow,
            elevation: &elevation,
            rock_type: &rock,
        };
        sim.cave_water_coupling(&mut set, 1.0);
        assert_eq!(set.water_flow.get(0, 0), 1.0);
    }
}
