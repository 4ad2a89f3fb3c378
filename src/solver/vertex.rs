//! Shared corner vertices and the arena that owns them.

use glam::UVec3;
use serde::{Deserialize, Serialize};

use crate::geometry::GridDims;

/// Which side of the terrain surface a node lies on.
///
/// `Below` is solid ground, `Above` is air.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    Below,
    Above,
}

impl Side {
    /// Returns true for the solid polarity.
    pub fn is_solid(self) -> bool {
        self == Side::Below
    }
}

/// A single scalar decision point at an integer grid position.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vertex {
    position: UVec3,
    value: Option<Side>,
    locked: bool,
}

impl Vertex {
    /// Creates an unset, unlocked vertex.
    pub fn new(position: UVec3) -> Self {
        Self {
            position,
            value: None,
            locked: false,
        }
    }

    pub fn position(&self) -> UVec3 {
        self.position
    }

    /// Current value, `None` while unset.
    pub fn get(&self) -> Option<Side> {
        self.value
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_resolved(&self) -> bool {
        self.value.is_some()
    }

    /// Assigns a value unless the vertex is locked. Returns true if the value changed.
    pub fn set(&mut self, value: Side) -> bool {
        if self.locked || self.value == Some(value) {
            return false;
        }
        self.value = Some(value);
        true
    }

    /// Assigns a value and makes it immutable for the rest of generation.
    pub fn set_locked(&mut self, value: Side) {
        self.value = Some(value);
        self.locked = true;
    }
}

/// Outcome of a single arena write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The vertex went from unset to set.
    Resolved,
    /// An already-resolved vertex took a different value.
    Overwritten,
    /// Nothing changed: the vertex is locked or already held the value.
    Unchanged,
}

/// The single store of every node in the grid, indexed like [`GridDims::node_index`].
///
/// Cells refer to their corners by arena index, so neighboring cells observe
/// each other's writes without any copying.
#[derive(Debug, Clone)]
pub struct VertexArena {
    dims: GridDims,
    vertices: Vec<Vertex>,
    unresolved: usize,
}

impl VertexArena {
    /// Allocates one unset vertex per node of `dims`.
    pub fn new(dims: GridDims) -> Self {
        let vertices: Vec<Vertex> = (0..dims.node_count())
            .map(|i| Vertex::new(dims.node_position(i)))
            .collect();
        let unresolved = vertices.len();
        Self {
            dims,
            vertices,
            unresolved,
        }
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Number of vertices still unset.
    pub fn unresolved_count(&self) -> usize {
        self.unresolved
    }

    pub fn vertex(&self, index: usize) -> &Vertex {
        &self.vertices[index]
    }

    pub fn get(&self, index: usize) -> Option<Side> {
        self.vertices[index].get()
    }

    /// Looks up a vertex by node position, `None` outside the lattice.
    pub fn at(&self, pos: UVec3) -> Option<&Vertex> {
        let nodes = self.dims.nodes();
        if pos.cmplt(nodes).all() {
            Some(&self.vertices[self.dims.node_index(pos)])
        } else {
            None
        }
    }

    /// Writes a value through [`Vertex::set`].
    pub fn set(&mut self, index: usize, value: Side) -> WriteOutcome {
        let vertex = &mut self.vertices[index];
        let was_resolved = vertex.is_resolved();
        if !vertex.set(value) {
            return WriteOutcome::Unchanged;
        }
        if was_resolved {
            WriteOutcome::Overwritten
        } else {
            self.unresolved -= 1;
            WriteOutcome::Resolved
        }
    }

    /// Writes a value through [`Vertex::set_locked`].
    pub fn set_locked(&mut self, index: usize, value: Side) {
        let vertex = &mut self.vertices[index];
        if !vertex.is_resolved() {
            self.unresolved -= 1;
        }
        vertex.set_locked(value);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Vertex> {
        self.vertices.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_set_and_lock() {
        let mut v = Vertex::new(UVec3::ZERO);
        assert!(!v.is_resolved());
        assert_eq!(v.get(), None);

        assert!(v.set(Side::Below));
        assert!(v.is_resolved());
        assert!(v.set(Side::Above), "unlocked vertices may be overwritten");

        v.set_locked(Side::Below);
        assert!(v.is_locked());
        assert!(!v.set(Side::Above), "locked vertices ignore set");
        assert_eq!(v.get(), Some(Side::Below));
    }

    #[test]
    fn test_side_polarity() {
        assert!(Side::Below.is_solid());
        assert!(!Side::Above.is_solid());
    }

    #[test]
    fn test_arena_tracks_unresolved() {
        let dims = GridDims::new(2, 2, 2).unwrap();
        let mut arena = VertexArena::new(dims);
        assert_eq!(arena.len(), 27);
        assert_eq!(arena.unresolved_count(), 27);

        assert_eq!(arena.set(0, Side::Above), WriteOutcome::Resolved);
        assert_eq!(arena.set(0, Side::Above), WriteOutcome::Unchanged);
        assert_eq!(arena.set(0, Side::Below), WriteOutcome::Overwritten);
        assert_eq!(arena.unresolved_count(), 26);

        arena.set_locked(1, Side::Below);
        arena.set_locked(0, Side::Above);
        assert_eq!(arena.unresolved_count(), 25);
        assert_eq!(arena.set(1, Side::Above), WriteOutcome::Unchanged);
    }

    #[test]
    fn test_arena_positions_match_layout() {
        let dims = GridDims::new(3, 2, 4).unwrap();
        let arena = VertexArena::new(dims);
        let pos = UVec3::new(2, 1, 3);
        let v = arena.at(pos).unwrap();
        assert_eq!(v.position(), pos);
        assert!(arena.at(UVec3::new(4, 0, 0)).is_none());
    }
}
