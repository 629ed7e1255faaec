// ABOUTME: Stateless erosion operators over a borrowed ErosionFieldSet handle bundle (§4.E)
// ABOUTME: erosion_uplift_balance is intentionally near-inert - an earlier aggressive version

use crate::constants::clamp_elevation;
use crate::field::{CategoricalField, NumericField};
use crate::rock::RockType;
use crate::sample::temperature_from_elevation;

/// Mutable borrow bundle the erosion engine operates over for the duration
/// of one call (§4.E). Time-step arguments to every method are in kyr.
pub struct ErosionFieldSet<'a> {
    pub elevation: &'a mut NumericField,
    pub rock_hardness: &'a mut NumericField,
    pub water_flow: &'a mut NumericField,
    pub precipitation: &'a NumericField,
    pub surface_water_depth: &'a NumericField,
    pub sediment_load: &'a mut NumericField,
    pub erosion_rate: &'a mut NumericField,
    pub rock_type: &'a CategoricalField<RockType>,
}

/// Central-difference slope magnitude (unitless rise/run) at a cell.
fn slope_at(elevation: &NumericField, x: i64, z: i64) -> f32 {
    let s = elevation.spacing();
    let dx = (elevation.get(x + 1, z) - elevation.get(x - 1, z)) / (2.0 * s);
    let dz = (elevation.get(x, z + 1) - elevation.get(x, z - 1)) / (2.0 * s);
    (dx * dx + dz * dz).sqrt()
}

/// Climate scaling for chemical weathering, derived from the elevation
/// lapse-rate temperature (spec is silent on the exact formula here; we
/// ground it in the same lapse rate `sample_at` already uses).
fn climate_factor(elevation_m: f32) -> f32 {
    let temp_c = temperature_from_elevation(elevation_m, 20.0);
    (1.0 + temp_c / 50.0).clamp(0.2, 2.0)
}

pub struct ErosionEngine;

impl ErosionEngine {
    pub fn new() -> Self {
        Self
    }

    fn lower(&self, fields: &mut ErosionFieldSet, x: i64, z: i64, amount: f32) {
        let e = fields.elevation.get(x, z);
        fields.elevation.set(x, z, clamp_elevation(e - amount));
    }

    /// `rate = precipitation/1000 * climateFactor / hardness * dt * 10`;
    /// 30% of removed mass feeds sediment (§4.E).
    pub fn chemical_weathering(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let rock_hardness = &*fields.rock_hardness;
        let precipitation = fields.precipitation;
        let elevation = &*fields.elevation;

        let rates: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let hardness = rock_hardness.get(x, z).max(0.01);
            let precip = precipitation.get(x, z);
            let e = elevation.get(x, z);
            precip / 1000.0 * climate_factor(e) / hardness * dt_kyr * 10.0
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                let rate = rates[i];
                i += 1;
                self.lower(fields, x, z, rate);
                fields.sediment_load.add(x, z, rate * 0.30);
                fields.erosion_rate.add(x, z, rate);
            }
        }
    }

    /// Slope-driven mechanical erosion, capped at 0.5 m/step (§4.E).
    ///
    /// Reads elevation at neighboring cells while also writing elevation at
    /// the current one, so rows cannot be evaluated out of order without a
    /// double-buffered elevation snapshot - left sequential.
    pub fn physical_erosion(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width() as i64;
        let height = fields.elevation.height() as i64;
        for z in 0..height {
            for x in 0..width {
                let hardness = fields.rock_hardness.get(x, z);
                if hardness <= 0.01 {
                    continue;
                }
                let slope = slope_at(fields.elevation, x, z);
                if slope <= 0.001 {
                    continue;
                }
                let rate = 50.0 * (1.0 + (5.0 * slope).min(4.0)) / hardness.max(0.1) * dt_kyr / 1e6;
                let rate = rate.min(0.5);
                self.lower(fields, x, z, rate);
                fields.sediment_load.add(x, z, rate * 0.50);
                fields.erosion_rate.add(x, z, rate);
            }
        }
    }

    /// Manning-velocity water-driven erosion, capped at 200 m/step (§4.E).
    ///
    /// Also reads neighboring elevation (via `slope_at`) while writing
    /// elevation at the current cell - left sequential for the same reason
    /// as `physical_erosion`.
    pub fn water_driven_erosion(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width() as i64;
        let height = fields.elevation.height() as i64;
        for z in 0..height {
            for x in 0..width {
                let flow = fields.water_flow.get(x, z);
                let depth = fields.surface_water_depth.get(x, z);
                if flow <= 0.01 && depth <= 0.01 {
                    continue;
                }
                let slope = slope_at(fields.elevation, x, z);
                let velocity = (1.0 / 0.03) * depth.max(0.0).powf(2.0 / 3.0) * slope.max(0.0).sqrt();
                let power = 500.0 * (1.0 + (0.5 * velocity * velocity * flow.min(10.0)).min(3.0)) * dt_kyr / 1e6;
                let power = power.min(200.0);
                self.lower(fields, x, z, power);
                fields.erosion_rate.add(x, z, power);
            }
        }
    }

    /// River channel incision, capped at 0.3 m/step (§4.E).
    pub fn river_carving(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let water_flow = &*fields.water_flow;

        let carves: Vec<Option<f32>> = crate::field::par_grid_map(width, height, |x, z| {
            let flow = water_flow.get(x, z);
            if flow <= 0.5 {
                return None;
            }
            let carve = 3.0 * (1.0 + (0.5 * flow).min(5.0)) * dt_kyr / 1000.0;
            Some(carve.min(0.3))
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                if let Some(carve) = carves[i] {
                    self.lower(fields, x, z, carve);
                    fields.erosion_rate.add(x, z, carve);
                }
                i += 1;
            }
        }
    }

    /// Glacial carving above the snowline, capped at 1000 m/step (§4.E).
    pub fn glacial_erosion(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let elevation = &*fields.elevation;

        let carves: Vec<Option<f32>> = crate::field::par_grid_map(width, height, |x, z| {
            let e = elevation.get(x, z);
            if e <= 800.0 {
                return None;
            }
            let carve = 5000.0 * (1.0 + ((e - 800.0) / 1000.0).min(2.0)) * dt_kyr / 1e6;
            Some(carve.min(1000.0))
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                if let Some(carve) = carves[i] {
                    self.lower(fields, x, z, carve);
                    fields.erosion_rate.add(x, z, carve);
                }
                i += 1;
            }
        }
    }

    /// Capacity-limited sediment transport: excess deposits (≤5 m/kyr),
    /// deficit erodes local rock to make up the difference (§4.E).
    ///
    /// Reads neighboring elevation via `slope_at` while writing elevation
    /// at the current cell - left sequential, as in `physical_erosion`.
    pub fn sediment_transport(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width() as i64;
        let height = fields.elevation.height() as i64;
        for z in 0..height {
            for x in 0..width {
                let flow = fields.water_flow.get(x, z);
                let slope = slope_at(fields.elevation, x, z);
                let capacity = flow * (1.0 + 5.0 * slope) * 0.1;
                let load = fields.sediment_load.get(x, z);

                if load > capacity {
                    let deposit = (load - capacity).min(5.0 * dt_kyr);
                    fields.elevation.add(x, z, deposit * 0.01);
                    fields.elevation.set(x, z, clamp_elevation(fields.elevation.get(x, z)));
                    fields.sediment_load.add(x, z, -deposit);
                } else {
                    let deficit = (capacity - load).min(1.0);
                    self.lower(fields, x, z, deficit * 0.01);
                    fields.sediment_load.add(x, z, deficit);
                }
            }
        }
    }

    /// Independent low-flow deposition pass, capped at `20*dt` m/step (§4.E).
    pub fn sediment_deposition(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let cap = 20.0 * dt_kyr;
        let water_flow = &*fields.water_flow;
        let sediment_load = &*fields.sediment_load;

        let deposits: Vec<Option<f32>> = crate::field::par_grid_map(width, height, |x, z| {
            let flow = water_flow.get(x, z);
            if flow >= 0.1 {
                return None;
            }
            let load = sediment_load.get(x, z);
            if load <= 0.0 {
                return None;
            }
            Some(load.min(cap))
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                if let Some(deposit) = deposits[i] {
                    fields.elevation.add(x, z, deposit * 0.001);
                    fields.elevation.set(x, z, clamp_elevation(fields.elevation.get(x, z)));
                    fields.sediment_load.add(x, z, -deposit);
                }
                i += 1;
            }
        }
    }

    /// Rock-resistance-weighted background weathering (§4.E).
    pub fn micro_weathering(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width();
        let height = fields.elevation.height();
        let rock_type = fields.rock_type;

        let decrements: Vec<f32> = crate::field::par_grid_map(width, height, |x, z| {
            let resistance = rock_type.get(x, z).erosion_resistance().max(0.1);
            dt_kyr * 1e-3 / resistance
        });

        let mut i = 0;
        for z in 0..height as i64 {
            for x in 0..width as i64 {
                self.lower(fields, x, z, decrements[i]);
                i += 1;
            }
        }
    }

    /// Deliberately near-zero op: only a tiny isostatic-rebound correction
    /// so the other processes dominate (historic bug mitigation, §4.E).
    /// Every cell gets the same scalar correction, so there's no per-cell
    /// work worth handing to a worker pool.
    pub fn erosion_uplift_balance(&self, fields: &mut ErosionFieldSet, dt_kyr: f32) {
        let width = fields.elevation.width() as i64;
        let height = fields.elevation.height() as i64;
        for z in 0..height {
            for x in 0..width {
                let correction = 0.0001 * dt_kyr;
                fields.elevation.add(x, z, correction);
                fields.elevation.set(x, z, clamp_elevation(fields.elevation.get(x, z)));
            }
        }
    }
}

impl Default for ErosionEngine {
    fn default() -> Self {
        Self::new()
    }
}
