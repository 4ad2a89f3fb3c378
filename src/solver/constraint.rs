//! Local decision policies applied when a cell is resolved.

use serde::{Deserialize, Serialize};

use super::cell::Cell;
use super::grid::SolverGrid;
use super::vertex::Side;
use crate::geometry::neighbors::{column_cells, lateral_neighbors};
use crate::noise::NoiseField;

/// Proposed values for a cell's eight corners; `None` leaves a corner alone.
pub type CornerAssignment = [Option<Side>; 8];

/// Bottom four corners solid, top four air.
pub const FLAT_PATTERN: [Side; 8] = [
    Side::Below,
    Side::Below,
    Side::Below,
    Side::Below,
    Side::Above,
    Side::Above,
    Side::Above,
    Side::Above,
];

/// Read-only view handed to constraints while a cell resolves.
#[derive(Clone, Copy)]
pub struct GridContext<'a> {
    pub grid: &'a SolverGrid,
    pub noise: &'a NoiseField,
}

/// The closed set of cell policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constraint {
    /// Sample the noise prior for every unset corner.
    #[default]
    NoiseFill,
    /// Snap to the flat pattern next to resolved non-flat terrain.
    Flatten,
    /// Forbid terrain above a lower surface and air below a higher one.
    NoOverhang,
    /// Reserved slot; proposes nothing.
    GapFill,
}

impl Constraint {
    pub fn name(&self) -> &'static str {
        match self {
            Constraint::NoiseFill => "noise_fill",
            Constraint::Flatten => "flatten",
            Constraint::NoOverhang => "no_overhang",
            Constraint::GapFill => "gap_fill",
        }
    }

    /// Computes corner values for `cell` without mutating anything.
    ///
    /// Corners left `None` are filled from the noise prior by [`Cell::resolve`].
    pub fn apply(&self, cell: &Cell, ctx: &GridContext<'_>) -> CornerAssignment {
        let mut assignment = [None; 8];
        match self {
            Constraint::NoiseFill => noise_fill(cell, ctx, &mut assignment),
            Constraint::Flatten => {
                if has_non_flat_neighbor(cell, ctx.grid) {
                    assignment = FLAT_PATTERN.map(Some);
                }
            }
            Constraint::NoOverhang => {
                if let Some(side) = column_override(cell, ctx.grid) {
                    assignment = [Some(side); 8];
                }
            }
            Constraint::GapFill => {}
        }
        assignment
    }
}

/// Fills every corner that is neither assigned nor resolved from the noise prior.
pub(crate) fn noise_fill(cell: &Cell, ctx: &GridContext<'_>, assignment: &mut CornerAssignment) {
    let arena = ctx.grid.vertices();
    for (i, &index) in cell.corners().iter().enumerate() {
        if assignment[i].is_none() && !arena.vertex(index).is_resolved() {
            assignment[i] = Some(ctx.noise.sample(cell.corner_position(i)));
        }
    }
}

/// Returns true if a resolved lateral neighbor deviates from [`FLAT_PATTERN`].
fn has_non_flat_neighbor(cell: &Cell, grid: &SolverGrid) -> bool {
    let arena = grid.vertices();
    lateral_neighbors(grid.dims(), cell.position())
        .into_iter()
        .filter_map(|(_, _, pos)| grid.cell_at(pos))
        .filter(|neighbor| neighbor.is_resolved(arena))
        .any(|neighbor| neighbor.corner_values(arena) != FLAT_PATTERN.map(Some))
}

/// Scans the column bottom-up for the first resolved cell carrying a surface.
///
/// A surface below forces air; a surface above forces ground.
fn column_override(cell: &Cell, grid: &SolverGrid) -> Option<Side> {
    let arena = grid.vertices();
    let row = cell.position().y;
    column_cells(grid.dims(), cell.position())
        .filter_map(|pos| grid.cell_at(pos))
        .find(|other| other.is_resolved(arena) && other.has_surface(arena))
        .map(|other| {
            if other.position().y < row {
                Side::Above
            } else {
                Side::Below
            }
        })
}
