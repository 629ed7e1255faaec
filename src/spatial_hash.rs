// ABOUTME: Uniform-cell spatial index over 2-D points for O(k) radius queries (§4.B SpatialHashGrid)
// ABOUTME: Not thread-safe; callers rebuild per step (one single-threaded scan), per spec §4.B/§5

use std::collections::HashMap;

/// Uniform cell grid of size `cell_size` over a `domain_w x domain_h`
/// meter domain. Indexes point *indices* (e.g. particle ids), not the
/// points themselves - callers look up their own backing storage.
pub struct SpatialHashGrid {
    cell_size: f32,
    domain_w: f32,
    domain_h: f32,
    cells: HashMap<(i64, i64), Vec<u32>>,
}

impl SpatialHashGrid {
    pub fn new(domain_w: f32, domain_h: f32, cell_size: f32) -> Self {
        Self {
            cell_size: cell_size.max(1e-3),
            domain_w,
            domain_h,
            cells: HashMap::new(),
        }
    }

    #[inline]
    fn cell_of(&self, x: f32, z: f32) -> (i64, i64) {
        ((x / self.cell_size).floor() as i64, (z / self.cell_size).floor() as i64)
    }

    /// Insert a point index at the cell containing `(x, z)`.
    pub fn insert(&mut self, index: u32, x: f32, z: f32) {
        self.cells.entry(self.cell_of(x, z)).or_default().push(index);
    }

    /// Reset the grid to empty; callers rebuild per step.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Enumerate every index in a cell whose center lies within
    /// `radius + cell_size/sqrt(2)` of `(x, z)`, deduplicated.
    pub fn query_radius(&self, x: f32, z: f32, radius: f32) -> Vec<u32> {
        let reach = radius + self.cell_size / std::f32::consts::SQRT_2;
        let cell_reach = (reach / self.cell_size).ceil() as i64;
        let (cx, cz) = self.cell_of(x, z);

        let mut seen = std::collections::HashSet::new();
        let mut out = Vec::new();
        for dz in -cell_reach..=cell_reach {
            for dx in -cell_reach..=cell_reach {
                if let Some(indices) = self.cells.get(&(cx + dx, cz + dz)) {
                    for &i in indices {
                        if seen.insert(i) {
                            out.push(i);
                        }
                    }
                }
            }
        }
        out
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    pub fn domain(&self) -> (f32, f32) {
        (self.domain_w, self.domain_h)
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_query_finds_nearby_points() {
        let mut grid = SpatialHashGrid::new(1000.0, 1000.0, 50.0);
        grid.insert(0, 10.0, 10.0);
        grid.insert(1, 500.0, 500.0);
        grid.insert(2, 12.0, 14.0);

        let nearby = grid.query_radius(10.0, 10.0, 20.0);
        assert!(nearby.contains(&0));
        assert!(nearby.contains(&2));
        assert!(!nearby.contains(&1));
    }

    #[test]
    fn clear_removes_all_indices() {
        let mut grid = SpatialHashGrid::new(100.0, 100.0, 10.0);
        grid.insert(0, 5.0, 5.0);
        grid.clear();
        assert_eq!(grid.cell_count(), 0);
        assert!(grid.query_radius(5.0, 5.0, 50.0).is_empty());
    }

    #[test]
    fn query_deduplicates_indices_seen_in_multiple_cells() {
        let mut grid = SpatialHashGrid::new(100.0, 100.0, 10.0);
        grid.insert(7, 5.0, 5.0);
        let results = grid.query_radius(5.0, 5.0, 100.0);
        let count = results.iter().filter(|&&i| i == 7).count();
        assert_eq!(count, 1);
    }
}
