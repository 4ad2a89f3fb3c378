//! The generated terrain volume and its intermediate products.

use crate::geometry::GridDims;
use crate::mesh::Mesh;
use crate::noise::{NoiseConfig, NoiseField};
use crate::solver::{SolveStats, SolverGrid};

use super::Heightfield;

/// A terrain volume being generated.
///
/// Later stages fill in the optional products.
#[derive(Debug, Clone)]
pub struct Terrain {
    /// Grid dimensions in cells.
    pub dims: GridDims,
    /// Noise prior used by the solver.
    pub noise: NoiseField,
    /// The solved grid (populated after the collapse stage).
    pub grid: Option<SolverGrid>,
    /// Solver counters (populated after the collapse stage).
    pub stats: Option<SolveStats>,
    /// Padded side field (populated after the heightfield stage).
    pub heightfield: Option<Heightfield>,
    /// Triangle soup (populated after the mesh stage).
    pub mesh: Option<Mesh>,
}

impl Terrain {
    /// Creates an empty terrain volume with a freshly seeded noise field.
    pub fn new(dims: GridDims, noise: NoiseConfig) -> Self {
        Self {
            dims,
            noise: NoiseField::new(noise),
            grid: None,
            stats: None,
            heightfield: None,
            mesh: None,
        }
    }

    /// Returns the seed of the noise prior.
    pub fn seed(&self) -> u64 {
        self.noise.config().seed
    }

    /// Returns true if the collapse stage has run.
    pub fn is_solved(&self) -> bool {
        self.grid.as_ref().is_some_and(|grid| grid.is_resolved())
    }

    /// Drops every generated product, keeping the dimensions and noise prior.
    pub fn reset(&mut self) {
        self.grid = None;
        self.stats = None;
        self.heightfield = None;
        self.mesh = None;
    }

    /// Reseeds the noise prior and drops every generated product.
    pub fn reseed(&mut self, seed: Option<u64>) {
        self.noise.refresh(seed);
        self.reset();
    }

    /// Fraction of heightfield nodes that are solid, or 0 before the heightfield stage.
    pub fn solid_fraction(&self) -> f32 {
        self.heightfield
            .as_ref()
            .map(|field| field.solid_count() as f32 / field.node_count() as f32)
            .unwrap_or(0.0)
    }

    /// Number of mesh triangles, or 0 before the mesh stage.
    pub fn triangle_count(&self) -> usize {
        self.mesh.as_ref().map(|m| m.triangle_count()).unwrap_or(0)
    }
}
