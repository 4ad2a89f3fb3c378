//! Binary terrain generation by wave-function collapse.
//!
//! This crate solves a lattice of above/below vertices cell by cell, always
//! picking the cell with the fewest open corners, guided by a layered noise
//! prior and per-cell constraints. The solved lattice is copied into a padded
//! heightfield and triangulated with marching cubes.

pub mod geometry;
pub mod mesh;
pub mod noise;
pub mod pipeline;
pub mod solver;
pub mod terrain;

pub use geometry::{GridDims, GridError};
pub use mesh::{triangulate, Mesh};
pub use noise::{NoiseConfig, NoiseField};
pub use pipeline::{generate_terrain, GenerationStage, Pipeline, PipelineError, StageConfig};
pub use solver::{Constraint, Side, SolverConfig, SolverGrid};
pub use terrain::{Heightfield, Terrain};
