//! A single grid cell and its view onto the shared vertex arena.

use glam::{UVec3, Vec3};

use super::constraint::{noise_fill, Constraint, CornerAssignment, GridContext};
use super::vertex::{Side, VertexArena};
use crate::geometry::CORNER_OFFSETS;

/// One element of the solver grid.
///
/// A cell does not own its corners; it stores the arena indices of the eight
/// nodes at [`CORNER_OFFSETS`] from its position.
#[derive(Debug, Clone)]
pub struct Cell {
    position: UVec3,
    corners: [usize; 8],
    constraint: Constraint,
}

impl Cell {
    /// Creates a cell using the default noise constraint.
    pub fn new(position: UVec3, corners: [usize; 8]) -> Self {
        Self {
            position,
            corners,
            constraint: Constraint::default(),
        }
    }

    pub fn position(&self) -> UVec3 {
        self.position
    }

    /// Arena indices of the eight corners.
    pub fn corners(&self) -> [usize; 8] {
        self.corners
    }

    pub fn constraint(&self) -> Constraint {
        self.constraint
    }

    pub fn set_constraint(&mut self, constraint: Constraint) {
        self.constraint = constraint;
    }

    /// Grid position of corner `i`, as sampled by the noise prior.
    pub fn corner_position(&self, i: usize) -> Vec3 {
        (self.position + CORNER_OFFSETS[i]).as_vec3()
    }

    /// Current value of every corner.
    pub fn corner_values(&self, arena: &VertexArena) -> CornerAssignment {
        self.corners.map(|index| arena.get(index))
    }

    /// Number of corners still unset.
    pub fn unresolved_corners(&self, arena: &VertexArena) -> u32 {
        self.corners
            .iter()
            .filter(|&&index| !arena.vertex(index).is_resolved())
            .count() as u32
    }

    /// `2^k` where `k` is the number of unset corners; recomputed on every call.
    pub fn entropy(&self, arena: &VertexArena) -> u32 {
        1 << self.unresolved_corners(arena)
    }

    pub fn is_resolved(&self, arena: &VertexArena) -> bool {
        self.entropy(arena) == 1
    }

    /// True when the cell is resolved and its corners are not all on one side,
    /// i.e. the terrain surface passes through it.
    pub fn has_surface(&self, arena: &VertexArena) -> bool {
        let values = self.corner_values(arena);
        match values[0] {
            Some(first) => {
                values.iter().all(|v| v.is_some()) && values.iter().any(|&v| v != Some(first))
            }
            None => false,
        }
    }

    /// Runs the assigned constraint, then fills any corner it left open from
    /// the noise prior.
    ///
    /// The returned assignment covers every corner that is unset in the arena,
    /// so writing it resolves the cell.
    pub fn resolve(&self, ctx: &GridContext<'_>) -> CornerAssignment {
        let mut assignment = self.constraint.apply(self, ctx);
        noise_fill(self, ctx, &mut assignment);
        assignment
    }

    /// Returns true if every corner is either already resolved or assigned.
    pub fn covers(&self, arena: &VertexArena, assignment: &CornerAssignment) -> bool {
        self.corners
            .iter()
            .zip(assignment)
            .all(|(&index, value)| value.is_some() || arena.vertex(index).is_resolved())
    }

    /// Counts corners on the solid side.
    pub fn solid_corners(&self, arena: &VertexArena) -> usize {
        self.corner_values(arena)
            .iter()
            .filter(|v| matches!(v, Some(Side::Below)))
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::GridDims;

    fn setup() -> (GridDims, VertexArena, Cell) {
        let dims = GridDims::new(2, 2, 2).unwrap();
        let arena = VertexArena::new(dims);
        let pos = UVec3::new(1, 0, 1);
        let cell = Cell::new(pos, dims.corner_indices(pos));
        (dims, arena, cell)
    }

    #[test]
    fn test_entropy_tracks_unresolved_corners() {
        let (_, mut arena, cell) = setup();
        assert_eq!(cell.entropy(&arena), 256);

        let corners = cell.corners();
        for (k, &index) in corners.iter().enumerate() {
            arena.set(index, Side::Above);
            assert_eq!(cell.entropy(&arena), 1 << (7 - k));
        }
        assert!(cell.is_resolved(&arena));
    }

    #[test]
    fn test_has_surface() {
        let (_, mut arena, cell) = setup();
        let corners = cell.corners();

        for &index in &corners[..7] {
            arena.set(index, Side::Below);
        }
        assert!(!cell.has_surface(&arena), "unresolved cells have no surface");

        arena.set(corners[7], Side::Below);
        assert!(!cell.has_surface(&arena), "uniform cells have no surface");

        arena.set(corners[7], Side::Above);
        assert!(cell.has_surface(&arena));
        assert_eq!(cell.solid_corners(&arena), 7);
    }

    #[test]
    fn test_corner_positions_follow_offset_table() {
        let (_, _, cell) = setup();
        assert_eq!(cell.corner_position(0), Vec3::new(1.0, 0.0, 1.0));
        assert_eq!(cell.corner_position(7), Vec3::new(2.0, 1.0, 2.0));
        assert_eq!(cell.corner_position(2), Vec3::new(1.0, 0.0, 2.0));
    }

    #[test]
    fn test_default_constraint_is_noise() {
        let (_, _, cell) = setup();
        assert_eq!(cell.constraint(), Constraint::NoiseFill);
    }
}
