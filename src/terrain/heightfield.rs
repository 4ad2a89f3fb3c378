//! Dense above/below field over the node lattice, padded with air.

use glam::{IVec3, UVec3};
use log::warn;

use crate::geometry::{linear_index, position_of, volume};
use crate::solver::{Side, SolverGrid};

/// Per-node side values, read by the triangulator.
///
/// Node `(x, y, z)` sits at world position `origin + (x, y, z)`.
#[derive(Debug, Clone, PartialEq)]
pub struct Heightfield {
    dims: UVec3,
    origin: IVec3,
    values: Vec<Side>,
}

impl Heightfield {
    /// Creates a field of `dims` nodes, all set to `fill`.
    pub fn new(dims: UVec3, origin: IVec3, fill: Side) -> Self {
        Self {
            dims,
            origin,
            values: vec![fill; volume(dims)],
        }
    }

    /// Copies a solved grid into a field with one node of air on every side.
    ///
    /// The result has `(w + 3) x (h + 3) x (d + 3)` nodes and origin `(-1, -1, -1)`.
    pub fn from_grid(grid: &SolverGrid) -> Self {
        let nodes = grid.dims().nodes();
        let mut field = Self::new(nodes + UVec3::splat(2), IVec3::splat(-1), Side::Above);

        let mut unresolved = 0usize;
        for vertex in grid.vertices().iter() {
            let value = vertex.get().unwrap_or_else(|| {
                unresolved += 1;
                Side::Above
            });
            field.set(vertex.position() + UVec3::ONE, value);
        }
        if unresolved > 0 {
            warn!("Copied {} unresolved vertices into the heightfield as air", unresolved);
        }

        field
    }

    /// Node extents.
    pub fn dims(&self) -> UVec3 {
        self.dims
    }

    /// World position of node `(0, 0, 0)`.
    pub fn origin(&self) -> IVec3 {
        self.origin
    }

    pub fn values(&self) -> &[Side] {
        &self.values
    }

    pub fn node_count(&self) -> usize {
        self.values.len()
    }

    /// Number of marching cells: one fewer than the nodes on each axis.
    pub fn cell_dims(&self) -> UVec3 {
        self.dims.saturating_sub(UVec3::ONE)
    }

    /// Returns the value at a node.
    ///
    /// # Panics
    /// Panics if the node is out of bounds.
    pub fn get(&self, pos: UVec3) -> Side {
        self.values[linear_index(self.dims, pos)]
    }

    /// Sets the value at a node.
    ///
    /// # Panics
    /// Panics if the node is out of bounds.
    pub fn set(&mut self, pos: UVec3, value: Side) {
        let index = linear_index(self.dims, pos);
        self.values[index] = value;
    }

    /// World position of a node.
    pub fn world_position(&self, pos: UVec3) -> IVec3 {
        self.origin + pos.as_ivec3()
    }

    /// Number of solid nodes.
    pub fn solid_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_solid()).count()
    }

    /// Iterates `(node position, value)` pairs in storage order.
    pub fn iter(&self) -> impl Iterator<Item = (UVec3, Side)> + '_ {
        self.values
            .iter()
            .enumerate()
            .map(|(i, &v)| (position_of(self.dims, i), v))
    }
}
