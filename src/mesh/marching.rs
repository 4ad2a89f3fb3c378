//! Marching-cubes extraction of an unindexed triangle mesh from a heightfield.

use glam::{UVec3, Vec3};
use log::debug;

use super::tables::{triangles, CORNER_POSITIONS, EDGE_CORNERS};
use crate::terrain::Heightfield;

/// An unindexed triangle list.
///
/// Every three consecutive positions form one triangle; `indices` is the
/// identity mapping and `normals` holds one flat face normal per vertex.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    pub positions: Vec<Vec3>,
    pub normals: Vec<Vec3>,
    pub indices: Vec<u32>,
}

impl Mesh {
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Iterates the triangles as vertex triples.
    pub fn triangles(&self) -> impl Iterator<Item = [Vec3; 3]> + '_ {
        self.positions
            .chunks_exact(3)
            .map(|tri| [tri[0], tri[1], tri[2]])
    }

    /// Rebuilds the identity index list and the per-vertex face normals.
    ///
    /// Degenerate triangles get a zero normal.
    pub fn recalculate_normals(&mut self) {
        self.indices = (0..self.positions.len() as u32).collect();
        self.normals = self
            .triangles()
            .flat_map(|[a, b, c]| {
                let n = (b - a).cross(c - a).normalize_or_zero();
                [n, n, n]
            })
            .collect();
    }

    /// Axis-aligned bounds of all positions, `None` for an empty mesh.
    pub fn bounds(&self) -> Option<(Vec3, Vec3)> {
        let first = *self.positions.first()?;
        Some(
            self.positions
                .iter()
                .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p))),
        )
    }
}

/// Builds the 8-bit configuration code of the marching cell at `cell`.
///
/// Bit `i` is set when table corner `i` is solid.
pub fn cell_configuration(field: &Heightfield, cell: UVec3) -> u8 {
    CORNER_POSITIONS
        .iter()
        .enumerate()
        .fold(0u8, |code, (i, &offset)| {
            if field.get(cell + offset).is_solid() {
                code | (1 << i)
            } else {
                code
            }
        })
}

/// Extracts the surface between solid and air nodes at unit cell size.
pub fn triangulate(field: &Heightfield) -> Mesh {
    triangulate_scaled(field, 1.0)
}

/// Extracts the surface, scaling every world position by `cell_size`.
///
/// Each triangle vertex sits at the midpoint of a cell edge whose end
/// corners disagree. Fully solid and fully empty cells contribute nothing.
pub fn triangulate_scaled(field: &Heightfield, cell_size: f32) -> Mesh {
    let mut mesh = Mesh::default();
    let cells = field.cell_dims();

    for y in 0..cells.y {
        for z in 0..cells.z {
            for x in 0..cells.x {
                let cell = UVec3::new(x, y, z);
                let config = cell_configuration(field, cell);
                if config == 0 || config == u8::MAX {
                    continue;
                }

                let base = field.world_position(cell).as_vec3();
                for tri in triangles(config) {
                    // Rows wind toward solid corners; reversed so faces point into air.
                    for edge in [tri[0], tri[2], tri[1]] {
                        let [a, b] = EDGE_CORNERS[edge];
                        let midpoint = (CORNER_POSITIONS[a] + CORNER_POSITIONS[b]).as_vec3() * 0.5;
                        mesh.positions.push((base + midpoint) * cell_size);
                    }
                }
            }
        }
    }

    mesh.recalculate_normals();
    debug!(
        "Triangulated {} cells into {} triangles",
        cells.x * cells.y * cells.z,
        mesh.triangle_count()
    );
    mesh
}
