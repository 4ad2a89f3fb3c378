//! Surface extraction from a solved heightfield.

mod marching;
pub mod tables;

pub use marching::{cell_configuration, triangulate, triangulate_scaled, Mesh};
