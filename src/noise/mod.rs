//! Noise generation module for the default terrain decision rule.
//!
//! Uses simdnoise for the per-octave gradient noise.

mod fractal;

pub use fractal::{NoiseConfig, NoiseField, OFFSET_RANGE};
