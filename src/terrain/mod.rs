//! Terrain module.
//!
//! Provides the Terrain volume produced by generation and the padded
//! Heightfield handed to the triangulator.

mod heightfield;
mod volume;

pub use heightfield::Heightfield;
pub use volume::Terrain;
