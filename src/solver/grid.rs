//! The solver grid and its greedy minimum-entropy collapse loop.

use glam::{IVec3, UVec3};
use log::{debug, info, trace};
use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::config::{ConstraintRegion, LockedRegion, SolverConfig};
use super::constraint::GridContext;
use super::vertex::{VertexArena, WriteOutcome};
use crate::geometry::GridDims;
use crate::noise::NoiseField;

/// Lowest entropy an unresolved cell can have (one open corner).
const MIN_OPEN_ENTROPY: u32 = 2;

/// Counters collected while solving.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SolveStats {
    /// Number of cells resolved by the loop.
    pub resolve_calls: usize,
    /// Vertices that went from unset to set during the loop.
    pub corners_resolved: usize,
    /// Resolved, unlocked vertices that a forcing constraint changed.
    pub corners_overwritten: usize,
    /// Vertices that were unset when a locked region claimed them.
    pub corners_locked: usize,
}

/// Dense grid of cells over one shared vertex arena.
#[derive(Debug, Clone)]
pub struct SolverGrid {
    dims: GridDims,
    vertices: VertexArena,
    cells: Vec<Cell>,
    stats: SolveStats,
}

impl SolverGrid {
    /// Allocates the arena and binds every cell's corners through the offset table.
    pub fn new(dims: GridDims) -> Self {
        let vertices = VertexArena::new(dims);
        let cells: Vec<Cell> = dims
            .cell_coords()
            .map(|pos| Cell::new(pos, dims.corner_indices(pos)))
            .collect();

        debug!(
            "Allocated {}x{}x{} grid: {} cells, {} vertices",
            dims.width,
            dims.height,
            dims.depth,
            cells.len(),
            vertices.len()
        );

        Self {
            dims,
            vertices,
            cells,
            stats: SolveStats::default(),
        }
    }

    /// Builds a grid and applies every region in `config`.
    pub fn with_config(dims: GridDims, config: &SolverConfig) -> Self {
        let mut grid = Self::new(dims);
        for locked in &config.locked_regions {
            grid.lock_region(locked);
        }
        for assigned in &config.constraint_regions {
            grid.assign_constraint(assigned);
        }
        grid
    }

    /// Hard-locks every node inside the region. Returns the number of nodes touched.
    pub fn lock_region(&mut self, locked: &LockedRegion) -> usize {
        let mut touched = 0;
        for pos in locked.region.positions(self.dims.nodes()) {
            let index = self.dims.node_index(pos);
            if !self.vertices.vertex(index).is_resolved() {
                self.stats.corners_locked += 1;
            }
            self.vertices.set_locked(index, locked.value);
            touched += 1;
        }
        debug!("Locked {} nodes to {:?}", touched, locked.value);
        touched
    }

    /// Assigns a constraint to every cell inside the region. Returns the number of cells touched.
    pub fn assign_constraint(&mut self, assigned: &ConstraintRegion) -> usize {
        let mut touched = 0;
        for pos in assigned.region.positions(self.dims.cells()) {
            let index = self.dims.cell_index(pos);
            self.cells[index].set_constraint(assigned.constraint);
            touched += 1;
        }
        debug!("Assigned {} to {} cells", assigned.constraint.name(), touched);
        touched
    }

    pub fn dims(&self) -> &GridDims {
        &self.dims
    }

    pub fn vertices(&self) -> &VertexArena {
        &self.vertices
    }

    #[cfg(test)]
    pub(crate) fn vertices_mut(&mut self) -> &mut VertexArena {
        &mut self.vertices
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cell(&self, index: usize) -> &Cell {
        &self.cells[index]
    }

    /// Cell at an unsigned position, `None` outside the grid.
    pub fn cell_at(&self, pos: UVec3) -> Option<&Cell> {
        self.cell_at_signed(pos.as_ivec3())
    }

    /// Cell at a signed position, `None` outside the grid.
    pub fn cell_at_signed(&self, pos: IVec3) -> Option<&Cell> {
        if self.dims.contains_cell(pos) {
            Some(&self.cells[self.dims.cell_index(pos.as_uvec3())])
        } else {
            None
        }
    }

    pub fn entropy(&self, index: usize) -> u32 {
        self.cells[index].entropy(&self.vertices)
    }

    /// True once every vertex is set, which is exactly when every cell is resolved.
    pub fn is_resolved(&self) -> bool {
        self.vertices.unresolved_count() == 0
    }

    pub fn stats(&self) -> SolveStats {
        self.stats
    }

    /// Index of the unresolved cell with the lowest entropy, lowest index on ties.
    pub fn min_entropy_cell(&self) -> Option<usize> {
        let mut best: Option<(usize, u32)> = None;

        for (index, cell) in self.cells.iter().enumerate() {
            let entropy = cell.entropy(&self.vertices);
            if entropy == 1 {
                continue;
            }
            if best.map_or(true, |(_, lowest)| entropy < lowest) {
                best = Some((index, entropy));
                if entropy == MIN_OPEN_ENTROPY {
                    break;
                }
            }
        }

        best.map(|(index, _)| index)
    }

    /// Runs one iteration of the collapse loop.
    ///
    /// Returns the index of the cell that was resolved, or `None` if the grid
    /// was already fully resolved.
    pub fn step(&mut self, noise: &NoiseField) -> Option<usize> {
        let index = self.min_entropy_cell()?;

        let assignment = {
            let ctx = GridContext { grid: &*self, noise };
            self.cells[index].resolve(&ctx)
        };
        debug_assert!(
            self.cells[index].covers(&self.vertices, &assignment),
            "constraint left cell {} unresolved",
            index
        );

        let mut resolved = 0;
        for (slot, value) in self.cells[index].corners().into_iter().zip(assignment) {
            let Some(value) = value else { continue };
            match self.vertices.set(slot, value) {
                WriteOutcome::Resolved => resolved += 1,
                WriteOutcome::Overwritten => self.stats.corners_overwritten += 1,
                WriteOutcome::Unchanged => {}
            }
        }
        debug_assert!(resolved > 0, "resolving cell {} set no new corners", index);

        self.stats.resolve_calls += 1;
        self.stats.corners_resolved += resolved;
        trace!(
            "Resolved cell {} at {:?} with {} ({} new corners)",
            index,
            self.cells[index].position(),
            self.cells[index].constraint().name(),
            resolved
        );

        Some(index)
    }

    /// Collapses the grid to completion.
    pub fn solve(&mut self, noise: &NoiseField) -> SolveStats {
        while self.step(noise).is_some() {}

        info!(
            "Solved {} cells in {} resolves ({} corners resolved, {} overwritten, {} locked)",
            self.cells.len(),
            self.stats.resolve_calls,
            self.stats.corners_resolved,
            self.stats.corners_overwritten,
            self.stats.corners_locked
        );
        self.stats
    }

    /// Fraction of vertices on the solid side.
    pub fn solid_fraction(&self) -> f32 {
        let solid = self
            .vertices
            .iter()
            .filter(|v| v.get().is_some_and(|side| side.is_solid()))
            .count();
        solid as f32 / self.vertices.len() as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::noise::NoiseConfig;
    use crate::solver::config::Region;
    use crate::solver::constraint::Constraint;
    use crate::solver::vertex::Side;

    fn dims(w: u32, h: u32, d: u32) -> GridDims {
        GridDims::new(w, h, d).unwrap()
    }

    fn node_value(grid: &SolverGrid, x: u32, y: u32, z: u32) -> Option<Side> {
        grid.vertices().at(UVec3::new(x, y, z)).and_then(|v| v.get())
    }

    #[test]
    fn test_default_scenario_terminates() {
        let mut grid = SolverGrid::new(dims(3, 3, 3));
        let noise = NoiseField::new(NoiseConfig::with_seed(2024));

        let stats = grid.solve(&noise);

        assert!(grid.is_resolved());
        assert_eq!(grid.vertices().len(), 64);
        assert!(grid.vertices().iter().all(|v| v.is_resolved()));
        assert!(grid.cells().iter().all(|c| c.is_resolved(grid.vertices())));
        assert!(grid.cells().iter().all(|c| c.entropy(grid.vertices()) == 1));
        assert_eq!(stats.corners_resolved, 64);
        assert!(stats.resolve_calls <= 64);
    }

    #[test]
    fn test_resolve_events_match_node_count() {
        for (w, h, d) in [(2, 2, 2), (2, 5, 3), (4, 3, 2), (5, 5, 5)] {
            let mut grid = SolverGrid::new(dims(w, h, d));
            let noise = NoiseField::new(NoiseConfig::with_seed(7));
            let stats = grid.solve(&noise);

            let nodes = ((w + 1) * (h + 1) * (d + 1)) as usize;
            assert_eq!(stats.corners_resolved, nodes, "grid {}x{}x{}", w, h, d);
            assert!(stats.resolve_calls >= 1 && stats.resolve_calls <= nodes);
            assert_eq!(stats.corners_overwritten, 0, "noise fill never overwrites");
        }
    }

    #[test]
    fn test_entropy_formula_holds_every_step() {
        let mut grid = SolverGrid::new(dims(3, 2, 3));
        let noise = NoiseField::new(NoiseConfig::with_seed(11));

        loop {
            for cell in grid.cells() {
                let open = cell.unresolved_corners(grid.vertices());
                let entropy = cell.entropy(grid.vertices());
                assert_eq!(entropy, 1 << open);
                assert!(entropy.is_power_of_two() && entropy <= 256);
            }
            if grid.step(&noise).is_none() {
                break;
            }
        }
        assert!(grid.is_resolved());
    }

    #[test]
    fn test_first_pick_is_lowest_index() {
        let mut grid = SolverGrid::new(dims(3, 3, 3));
        let noise = NoiseField::new(NoiseConfig::default());
        assert_eq!(grid.min_entropy_cell(), Some(0));
        assert_eq!(grid.step(&noise), Some(0));

        // The +x neighbor now has four open corners, the lowest entropy left.
        assert_eq!(grid.min_entropy_cell(), Some(1));
        assert_eq!(grid.entropy(1), 16);
    }

    #[test]
    fn test_min_entropy_prefers_lowest_value() {
        let mut grid = SolverGrid::new(dims(3, 3, 3));
        let target = grid.dims().cell_index(UVec3::new(2, 2, 2));
        let corners = grid.cell(target).corners();
        for &index in &corners[..7] {
            grid.vertices_mut().set(index, Side::Above);
        }
        assert_eq!(grid.entropy(target), 2);
        assert_eq!(grid.min_entropy_cell(), Some(target));
    }

    #[test]
    fn test_shared_vertices_never_diverge() {
        let mut grid = SolverGrid::new(dims(3, 3, 3));
        let noise = NoiseField::new(NoiseConfig::with_seed(5));
        let d = *grid.dims();

        let check = |grid: &SolverGrid| {
            for pos in d.cell_coords() {
                let cell = grid.cell_at(pos).unwrap();
                let values = cell.corner_values(grid.vertices());
                if let Some(right) = grid.cell_at_signed(pos.as_ivec3() + IVec3::X) {
                    let rv = right.corner_values(grid.vertices());
                    assert_eq!(
                        (values[1], values[3], values[5], values[7]),
                        (rv[0], rv[2], rv[4], rv[6])
                    );
                }
                if let Some(up) = grid.cell_at_signed(pos.as_ivec3() + IVec3::Y) {
                    let uv = up.corner_values(grid.vertices());
                    assert_eq!(&values[4..], &uv[..4]);
                }
                if let Some(back) = grid.cell_at_signed(pos.as_ivec3() + IVec3::Z) {
                    let bv = back.corner_values(grid.vertices());
                    assert_eq!(
                        (values[2], values[3], values[6], values[7]),
                        (bv[0], bv[1], bv[4], bv[5])
                    );
                }
            }
        };

        while grid.step(&noise).is_some() {
            check(&grid);
        }
    }

    #[test]
    fn test_same_seed_same_terrain() {
        let solve = |seed| {
            let mut grid = SolverGrid::new(dims(4, 3, 4));
            grid.solve(&NoiseField::new(NoiseConfig::with_seed(seed)));
            grid.vertices().iter().map(|v| v.get()).collect::<Vec<_>>()
        };
        assert_eq!(solve(77), solve(77));
    }

    #[test]
    fn test_locked_vertices_survive_solving() {
        let d = dims(4, 4, 4);
        let config = SolverConfig::default()
            .with_lock(Region::new([0, 2, 0], [5, 3, 5]), Side::Below)
            .with_constraint(Region::new([0, 0, 0], [4, 4, 4]), Constraint::Flatten);
        let mut grid = SolverGrid::with_config(d, &config);
        let stats = grid.solve(&NoiseField::new(NoiseConfig::with_seed(1)));

        assert_eq!(stats.corners_locked, 25);
        assert_eq!(stats.corners_locked + stats.corners_resolved, d.node_count());
        for x in 0..5 {
            for z in 0..5 {
                assert_eq!(node_value(&grid, x, 2, z), Some(Side::Below));
                assert!(grid.vertices().at(UVec3::new(x, 2, z)).unwrap().is_locked());
            }
        }
    }

    #[test]
    fn test_gap_fill_cells_still_resolve() {
        let d = dims(3, 3, 3);
        let config = SolverConfig::default()
            .with_constraint(Region::new([0, 0, 0], [3, 3, 3]), Constraint::GapFill);
        let mut grid = SolverGrid::with_config(d, &config);
        grid.solve(&NoiseField::new(NoiseConfig::default()));
        assert!(grid.is_resolved());
    }

    #[test]
    fn test_floor_scenario_no_terrain_above_floor() {
        let d = dims(5, 5, 5);
        let mut grid = SolverGrid::with_config(d, &SolverConfig::no_overhang_above_floor(d));
        let stats = grid.solve(&NoiseField::new(NoiseConfig::with_seed(31)));

        assert!(grid.is_resolved());
        for x in 0..=5 {
            for z in 0..=5 {
                assert_eq!(node_value(&grid, x, 0, z), Some(Side::Below));
                for y in 1..=5 {
                    assert_eq!(
                        node_value(&grid, x, y, z),
                        Some(Side::Above),
                        "node ({}, {}, {}) must be air above the seeded floor",
                        x,
                        y,
                        z
                    );
                }
            }
        }
        for cell in grid.cells().iter().filter(|c| c.position().y > 0) {
            assert!(!cell.has_surface(grid.vertices()));
        }
        assert_eq!(stats.corners_overwritten, 0);
    }

    #[test]
    fn test_ceiling_scenario_ground_below_upper_surface() {
        let d = dims(4, 5, 4);
        let nodes = d.nodes();
        let config = SolverConfig::default()
            .with_lock(Region::layers(nodes, 4, 5), Side::Below)
            .with_lock(Region::layers(nodes, 5, 6), Side::Above)
            .with_constraint(Region::layers(d.cells(), 0, 4), Constraint::NoOverhang);
        let mut grid = SolverGrid::with_config(d, &config);
        grid.solve(&NoiseField::new(NoiseConfig::with_seed(8)));

        for pos in d.cell_coords().filter(|p| p.y < 4) {
            let cell = grid.cell_at(pos).unwrap();
            assert_eq!(
                cell.solid_corners(grid.vertices()),
                8,
                "cell {:?} below the seeded surface must be solid",
                pos
            );
        }
    }

    #[test]
    fn test_out_of_range_lookups_are_none() {
        let grid = SolverGrid::new(dims(2, 2, 2));
        assert!(grid.cell_at(UVec3::new(2, 0, 0)).is_none());
        assert!(grid.cell_at_signed(IVec3::new(0, -1, 0)).is_none());
        assert!(grid.cell_at(UVec3::new(1, 1, 1)).is_some());
    }

    #[test]
    fn test_solid_fraction_bounds() {
        let mut grid = SolverGrid::new(dims(4, 4, 4));
        grid.solve(&NoiseField::new(NoiseConfig::with_seed(3)));
        let fraction = grid.solid_fraction();
        assert!((0.0..=1.0).contains(&fraction));
    }
}
