//! Grid geometry module.
//!
//! Provides validated grid dimensions, the shared index layout used by the
//! solver and the heightfield, and bounds-safe neighbor lookups.

mod grid;
pub mod neighbors;

pub use grid::{
    contains, linear_index, position_of, volume, GridDims, GridError, CORNER_OFFSETS,
    MIN_EXTENT,
};
