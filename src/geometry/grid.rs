//! Grid dimensions and index layout for the cell grid and its node lattice.

use glam::{IVec3, UVec3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Smallest accepted extent along any axis, in cells.
pub const MIN_EXTENT: u32 = 2;

/// Unit-cube offsets of a cell's eight corners.
///
/// Corners 0-3 form the bottom face (y = 0), corners 4-7 the top face.
pub const CORNER_OFFSETS: [UVec3; 8] = [
    UVec3::new(0, 0, 0),
    UVec3::new(1, 0, 0),
    UVec3::new(0, 0, 1),
    UVec3::new(1, 0, 1),
    UVec3::new(0, 1, 0),
    UVec3::new(1, 1, 0),
    UVec3::new(0, 1, 1),
    UVec3::new(1, 1, 1),
];

/// Errors raised when validating grid dimensions or regions.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridError {
    #[error("Grid extent {axis} = {value} is below the minimum of {MIN_EXTENT}")]
    ExtentTooSmall { axis: &'static str, value: u32 },
    #[error("Region {min:?}..{max:?} lies outside the {kind} lattice {bounds:?}")]
    RegionOutOfBounds {
        kind: &'static str,
        min: [u32; 3],
        max: [u32; 3],
        bounds: [u32; 3],
    },
    #[error("Region {min:?}..{max:?} is empty")]
    EmptyRegion { min: [u32; 3], max: [u32; 3] },
}

/// Dimensions of the solver grid, measured in cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GridDims {
    pub width: u32,
    pub height: u32,
    pub depth: u32,
}

impl GridDims {
    /// Creates validated dimensions; every extent must be at least 2.
    pub fn new(width: u32, height: u32, depth: u32) -> Result<Self, GridError> {
        for (axis, value) in [("width", width), ("height", height), ("depth", depth)] {
            if value < MIN_EXTENT {
                return Err(GridError::ExtentTooSmall { axis, value });
            }
        }
        Ok(Self { width, height, depth })
    }

    /// Cell extents as a vector.
    pub fn cells(&self) -> UVec3 {
        UVec3::new(self.width, self.height, self.depth)
    }

    /// Node (vertex) extents: one more than the cell extents on each axis.
    pub fn nodes(&self) -> UVec3 {
        self.cells() + UVec3::ONE
    }

    /// Total number of cells.
    pub fn cell_count(&self) -> usize {
        volume(self.cells())
    }

    /// Total number of nodes, i.e. the size of the shared vertex arena.
    pub fn node_count(&self) -> usize {
        volume(self.nodes())
    }

    /// Returns true if the signed cell coordinate lies inside the grid.
    pub fn contains_cell(&self, pos: IVec3) -> bool {
        contains(self.cells(), pos)
    }

    /// Linear index of a cell. Rows (y) are outermost, then z, then x.
    pub fn cell_index(&self, pos: UVec3) -> usize {
        linear_index(self.cells(), pos)
    }

    /// Linear index of a node in the vertex arena.
    pub fn node_index(&self, pos: UVec3) -> usize {
        linear_index(self.nodes(), pos)
    }

    /// Inverse of [`GridDims::cell_index`].
    pub fn cell_position(&self, index: usize) -> UVec3 {
        position_of(self.cells(), index)
    }

    /// Inverse of [`GridDims::node_index`].
    pub fn node_position(&self, index: usize) -> UVec3 {
        position_of(self.nodes(), index)
    }

    /// Arena indices of the eight corners of the cell at `pos`.
    pub fn corner_indices(&self, pos: UVec3) -> [usize; 8] {
        CORNER_OFFSETS.map(|offset| self.node_index(pos + offset))
    }

    /// Iterates all cell coordinates in linear-index order.
    pub fn cell_coords(&self) -> impl Iterator<Item = UVec3> {
        let dims = self.cells();
        (0..dims.y).flat_map(move |y| {
            (0..dims.z).flat_map(move |z| (0..dims.x).map(move |x| UVec3::new(x, y, z)))
        })
    }
}

/// Number of lattice points in a box of the given extents.
pub fn volume(extent: UVec3) -> usize {
    extent.x as usize * extent.y as usize * extent.z as usize
}

/// Row-major index with y outermost: `x + z * ex + y * ex * ez`.
pub fn linear_index(extent: UVec3, pos: UVec3) -> usize {
    debug_assert!(pos.x < extent.x && pos.y < extent.y && pos.z < extent.z);
    let (ex, ez) = (extent.x as usize, extent.z as usize);
    pos.x as usize + pos.z as usize * ex + pos.y as usize * ex * ez
}

/// Inverse of [`linear_index`].
pub fn position_of(extent: UVec3, index: usize) -> UVec3 {
    let (ex, ez) = (extent.x as usize, extent.z as usize);
    let x = index % ex;
    let z = (index / ex) % ez;
    let y = index / (ex * ez);
    UVec3::new(x as u32, y as u32, z as u32)
}

/// Returns true if `pos` lies in `[0, extent)` on every axis.
pub fn contains(extent: UVec3, pos: IVec3) -> bool {
    pos.cmpge(IVec3::ZERO).all() && pos.cmplt(extent.as_ivec3()).all()
}
