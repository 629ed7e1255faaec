// ABOUTME: Toroidal 2-D field substrate - flat-buffer storage, bicubic+noise sampling, propagation
// ABOUTME: Two concrete specializations (numeric, categorical) replace the source's compile-time T branching

use crate::noise;
use rayon::prelude::*;

/// Evaluates `f` for every `(x, z)` cell of a `width x height` grid in
/// parallel, row by row, returning the results in row-major order.
///
/// Only safe to use for passes whose formula reads nothing that the same
/// pass also mutates at a neighboring cell - each row is handed to a
/// worker independently, so there is no defined order between rows or
/// within a row. Engine passes that read a neighbor of a field they are
/// simultaneously writing (slope-driven erosion, river formation) must
/// keep their own sequential loop instead.
pub fn par_grid_map<T, F>(width: usize, height: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(i64, i64) -> T + Sync,
{
    (0..height as i64)
        .into_par_iter()
        .map(|z| (0..width as i64).map(|x| f(x, z)).collect::<Vec<T>>())
        .collect::<Vec<Vec<T>>>()
        .into_iter()
        .flatten()
        .collect()
}

/// Wrap a signed grid index into `[0, len)`.
#[inline]
fn wrap_index(i: i64, len: usize) -> usize {
    let len = len as i64;
    (((i % len) + len) % len) as usize
}

/// Squared toroidal distance between two world-space points on a
/// `world_w x world_h` meter torus (§3, `d²(p,q)`).
#[inline]
pub fn toroidal_distance_sq(px: f32, pz: f32, qx: f32, qz: f32, world_w: f32, world_h: f32) -> f32 {
    let dx = (px - qx).abs();
    let dz = (pz - qz).abs();
    let dx = dx.min(world_w - dx);
    let dz = dz.min(world_h - dz);
    dx * dx + dz * dz
}

#[inline]
pub fn toroidal_distance(px: f32, pz: f32, qx: f32, qz: f32, world_w: f32, world_h: f32) -> f32 {
    toroidal_distance_sq(px, pz, qx, qz, world_w, world_h).sqrt()
}

/// Catmull-Rom cubic interpolation through four evenly-spaced samples,
/// `t` the fractional offset past `p1` towards `p2`.
#[inline]
fn cubic_interp(p0: f32, p1: f32, p2: f32, p3: f32, t: f32) -> f32 {
    let a = 2.0 * p1;
    let b = p2 - p0;
    let c = 2.0 * p0 - 5.0 * p1 + 4.0 * p2 - p3;
    let d = 3.0 * (p1 - p2) + p3 - p0;
    0.5 * (a + (b + (c + d * t) * t) * t)
}

/// A toroidal 2-D grid of `f32` samples with bicubic + noise-enhanced
/// continuous sampling and a distance-weighted propagation primitive
/// (§4.A `ContinuousField<T>`, numeric specialization).
#[derive(Clone, Debug)]
pub struct NumericField {
    data: Vec<f32>,
    width: usize,
    height: usize,
    spacing: f32,
}

impl NumericField {
    pub fn new(width: usize, height: usize, spacing: f32, default: f32) -> Self {
        Self {
            data: vec![default; width * height],
            width,
            height,
            spacing,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn spacing(&self) -> f32 {
        self.spacing
    }

    #[inline]
    pub fn world_width(&self) -> f32 {
        self.width as f32 * self.spacing
    }

    #[inline]
    pub fn world_height(&self) -> f32 {
        self.height as f32 * self.spacing
    }

    #[inline]
    fn index(&self, ix: i64, iz: i64) -> usize {
        let x = wrap_index(ix, self.width);
        let z = wrap_index(iz, self.height);
        z * self.width + x
    }

    /// Grid-cell read; indices are taken modulo `(W, H)` so all integer
    /// pairs are legal.
    #[inline]
    pub fn get(&self, ix: i64, iz: i64) -> f32 {
        self.data[self.index(ix, iz)]
    }

    #[inline]
    pub fn set(&mut self, ix: i64, iz: i64, v: f32) {
        let idx = self.index(ix, iz);
        self.data[idx] = v;
    }

    #[inline]
    pub fn add(&mut self, ix: i64, iz: i64, v: f32) {
        let idx = self.index(ix, iz);
        self.data[idx] += v;
    }

    pub fn fill(&mut self, v: f32) {
        for cell in &mut self.data {
            *cell = v;
        }
    }

    pub fn clear(&mut self) {
        self.fill(0.0);
    }

    pub fn data(&self) -> &[f32] {
        &self.data
    }

    pub fn data_mut(&mut self) -> &mut [f32] {
        &mut self.data
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = (usize, usize, f32)> + '_ {
        (0..self.height).flat_map(move |z| (0..self.width).map(move |x| (x, z, self.get(x as i64, z as i64))))
    }

    /// Wrap a real world coordinate into `[0, world_extent)`.
    #[inline]
    fn wrap_coord(v: f32, extent: f32) -> f32 {
        let m = v % extent;
        if m < 0.0 {
            m + extent
        } else {
            m
        }
    }

    /// Sample the field at an arbitrary real-valued world coordinate.
    /// Bicubic Hermite tensor-product over the wrapped 4x4 neighborhood,
    /// plus a `0.1 * base * n(x,z)` organic perturbation (§4.A).
    pub fn sample_at(&self, x: f32, z: f32) -> f32 {
        let ww = self.world_width();
        let wh = self.world_height();
        let wx = Self::wrap_coord(x, ww);
        let wz = Self::wrap_coord(z, wh);

        let cell_x = (wx / self.spacing).floor();
        let cell_z = (wz / self.spacing).floor();
        let fx = wx / self.spacing - cell_x;
        let fz = wz / self.spacing - cell_z;
        let cell_x = cell_x as i64;
        let cell_z = cell_z as i64;

        let mut rows = [0.0f32; 4];
        for (i, dz) in (-1..=2).enumerate() {
            let p0 = self.get(cell_x - 1, cell_z + dz);
            let p1 = self.get(cell_x, cell_z + dz);
            let p2 = self.get(cell_x + 1, cell_z + dz);
            let p3 = self.get(cell_x + 2, cell_z + dz);
            rows[i] = cubic_interp(p0, p1, p2, p3, fx);
        }
        let base = cubic_interp(rows[0], rows[1], rows[2], rows[3], fz);

        base + 0.1 * base * noise::n(x, z)
    }

    /// Distribute `v` into neighboring cells weighted by toroidal distance
    /// and a caller-supplied positional resistance (§4.A `propagate`).
    pub fn propagate<F>(&mut self, v: f32, x: f32, z: f32, range: f32, resistance: F)
    where
        F: Fn(f32, f32) -> f32,
    {
        if range <= 0.0 {
            return;
        }
        let ww = self.world_width();
        let wh = self.world_height();
        let grid_radius = (range / self.spacing).ceil() as i64;

        let cx = (x / self.spacing).floor() as i64;
        let cz = (z / self.spacing).floor() as i64;

        for dz in -grid_radius..=grid_radius {
            for dx in -grid_radius..=grid_radius {
                let ix = cx + dx;
                let iz = cz + dz;
                let world_cx = wrap_index(ix, self.width) as f32 * self.spacing;
                let world_cz = wrap_index(iz, self.height) as f32 * self.spacing;
                let d = toroidal_distance(x, z, world_cx, world_cz, ww, wh);
                if d <= range {
                    let weight = (-d / (0.3 * range)).exp();
                    let r = resistance(world_cx, world_cz).max(1e-6);
                    self.add(ix, iz, v * weight / r);
                }
            }
        }
    }
}

/// A toroidal 2-D grid over a small `Copy + PartialEq` categorical type
/// (rock type). `sample_at` returns the nearest-cell value; no blending
/// (§4.A, categorical specialization).
#[derive(Clone, Debug)]
pub struct CategoricalField<T: Copy + PartialEq> {
    data: Vec<T>,
    width: usize,
    height: usize,
    spacing: f32,
}

impl<T: Copy + PartialEq> CategoricalField<T> {
    pub fn new(width: usize, height: usize, spacing: f32, default: T) -> Self {
        Self {
            data: vec![default; width * height],
            width,
            height,
            spacing,
        }
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    fn index(&self, ix: i64, iz: i64) -> usize {
        let x = wrap_index(ix, self.width);
        let z = wrap_index(iz, self.height);
        z * self.width + x
    }

    #[inline]
    pub fn get(&self, ix: i64, iz: i64) -> T {
        self.data[self.index(ix, iz)]
    }

    #[inline]
    pub fn set(&mut self, ix: i64, iz: i64, v: T) {
        let idx = self.index(ix, iz);
        self.data[idx] = v;
    }

    pub fn fill(&mut self, v: T) {
        for cell in &mut self.data {
            *cell = v;
        }
    }

    pub fn iter_coords(&self) -> impl Iterator<Item = (usize, usize, T)> + '_ {
        (0..self.height).flat_map(move |z| (0..self.width).map(move |x| (x, z, self.get(x as i64, z as i64))))
    }

    /// Nearest-cell lookup for an arbitrary real coordinate; no interpolation.
    pub fn sample_at(&self, x: f32, z: f32) -> T {
        let ww = self.width as f32 * self.spacing;
        let wh = self.height as f32 * self.spacing;
        let wx = NumericField::wrap_coord(x, ww);
        let wz = NumericField::wrap_coord(z, wh);
        let ix = (wx / self.spacing).floor() as i64;
        let iz = (wz / self.spacing).floor() as i64;
        self.get(ix, iz)
    }
}
