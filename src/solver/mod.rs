//! Constraint-propagation solver deciding which side of the surface each
//! grid node lies on.
//!
//! Neighboring cells hold arena indices of the same vertices, so a value
//! written while resolving one cell is immediately visible to every other
//! cell sharing that node. There is no separate propagation pass.

mod cell;
mod config;
mod constraint;
mod grid;
mod vertex;

pub use cell::Cell;
pub use config::{ConstraintRegion, LockedRegion, Region, SolverConfig};
pub use constraint::{Constraint, CornerAssignment, GridContext, FLAT_PATTERN};
pub use grid::{SolveStats, SolverGrid};
pub use vertex::{Side, Vertex, VertexArena, WriteOutcome};
