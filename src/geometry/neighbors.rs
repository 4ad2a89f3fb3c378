//! Neighbor lookups on the cell grid.
//!
//! Lookups never fail: a coordinate outside the grid is simply absent from
//! the result, which callers treat as "no information available".

use glam::{IVec3, UVec3};

use super::GridDims;

/// Returns the cell at `pos + (dx, dy, dz)`, or `None` if it falls outside the grid.
pub fn offset_cell(dims: &GridDims, pos: UVec3, dx: i32, dy: i32, dz: i32) -> Option<UVec3> {
    let target = pos.as_ivec3() + IVec3::new(dx, dy, dz);
    dims.contains_cell(target).then(|| target.as_uvec3())
}

/// Returns the in-grid lateral (same-height) Moore neighbors of a cell as `(dx, dz, pos)`.
///
/// Up to eight entries; cells on the border of the grid get fewer.
pub fn lateral_neighbors(dims: &GridDims, pos: UVec3) -> Vec<(i32, i32, UVec3)> {
    let mut out = Vec::with_capacity(8);

    for dz in -1..=1 {
        for dx in -1..=1 {
            if dx == 0 && dz == 0 {
                continue;
            }
            if let Some(n) = offset_cell(dims, pos, dx, 0, dz) {
                out.push((dx, dz, n));
            }
        }
    }

    out
}

/// Returns every other cell in the vertical column of `pos`, bottom to top.
pub fn column_cells(dims: &GridDims, pos: UVec3) -> impl Iterator<Item = UVec3> + '_ {
    (0..dims.height)
        .filter(move |&y| y != pos.y)
        .map(move |y| UVec3::new(pos.x, y, pos.z))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offset_cell_out_of_range() {
        let dims = GridDims::new(3, 3, 3).unwrap();
        let origin = UVec3::ZERO;
        assert_eq!(offset_cell(&dims, origin, -1, 0, 0), None);
        assert_eq!(offset_cell(&dims, origin, 0, -1, 0), None);
        assert_eq!(offset_cell(&dims, UVec3::new(2, 2, 2), 0, 0, 1), None);
        assert_eq!(offset_cell(&dims, origin, 1, 1, 1), Some(UVec3::ONE));
    }

    #[test]
    fn test_lateral_neighbors_interior_and_corner() {
        let dims = GridDims::new(3, 3, 3).unwrap();

        let interior = lateral_neighbors(&dims, UVec3::new(1, 1, 1));
        assert_eq!(interior.len(), 8);
        assert!(interior.iter().all(|(_, _, p)| p.y == 1), "neighbors stay in the same row");
        assert!(!interior.iter().any(|(_, _, p)| *p == UVec3::new(1, 1, 1)));

        let corner = lateral_neighbors(&dims, UVec3::new(0, 2, 0));
        assert_eq!(corner.len(), 3);
    }

    #[test]
    fn test_column_cells_excludes_self_and_is_ordered() {
        let dims = GridDims::new(2, 5, 2).unwrap();
        let column: Vec<_> = column_cells(&dims, UVec3::new(1, 2, 0)).collect();
        let rows: Vec<u32> = column.iter().map(|p| p.y).collect();
        assert_eq!(rows, vec![0, 1, 3, 4]);
        assert!(column.iter().all(|p| p.x == 1 && p.z == 0));
    }
}
