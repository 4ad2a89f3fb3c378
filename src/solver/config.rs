//! Initial conditions applied to the solver grid before collapsing.

use glam::UVec3;
use serde::{Deserialize, Serialize};

use super::constraint::Constraint;
use super::vertex::Side;
use crate::geometry::{GridDims, GridError};

/// A half-open box `[min, max)` of lattice coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub min: [u32; 3],
    pub max: [u32; 3],
}

impl Region {
    pub fn new(min: [u32; 3], max: [u32; 3]) -> Self {
        Self { min, max }
    }

    /// All lattice points with `y` in `[y_min, y_max)` across the full `extent`.
    pub fn layers(extent: UVec3, y_min: u32, y_max: u32) -> Self {
        Self::new([0, y_min, 0], [extent.x, y_max, extent.z])
    }

    pub fn is_empty(&self) -> bool {
        (0..3).any(|axis| self.min[axis] >= self.max[axis])
    }

    /// Intersects the region with `[0, extent)`; `None` if nothing remains.
    pub fn clipped(&self, extent: UVec3) -> Option<(UVec3, UVec3)> {
        let min = UVec3::from_array(self.min);
        let max = UVec3::from_array(self.max).min(extent);
        (min.cmplt(max).all()).then_some((min, max))
    }

    /// Iterates the in-bounds lattice points of the region.
    pub fn positions(&self, extent: UVec3) -> impl Iterator<Item = UVec3> {
        let (min, max) = self.clipped(extent).unwrap_or((UVec3::ZERO, UVec3::ZERO));
        (min.y..max.y).flat_map(move |y| {
            (min.z..max.z).flat_map(move |z| (min.x..max.x).map(move |x| UVec3::new(x, y, z)))
        })
    }

    /// Rejects empty regions and regions reaching past `extent`.
    pub fn validate(&self, kind: &'static str, extent: UVec3) -> Result<(), GridError> {
        if self.is_empty() {
            return Err(GridError::EmptyRegion {
                min: self.min,
                max: self.max,
            });
        }
        if UVec3::from_array(self.max).cmpgt(extent).any() {
            return Err(GridError::RegionOutOfBounds {
                kind,
                min: self.min,
                max: self.max,
                bounds: extent.to_array(),
            });
        }
        Ok(())
    }
}

/// Nodes forced to a fixed side before solving. Coordinates are node positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockedRegion {
    pub region: Region,
    pub value: Side,
}

/// Cells given a non-default constraint. Coordinates are cell positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConstraintRegion {
    pub region: Region,
    pub constraint: Constraint,
}

/// Initial conditions for a solve.
///
/// Regions are applied in order, so later locks win over earlier ones.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub locked_regions: Vec<LockedRegion>,
    #[serde(default)]
    pub constraint_regions: Vec<ConstraintRegion>,
}

impl SolverConfig {
    /// Locks node layer 0 solid and node layer 1 air, seeding a flat surface
    /// through the bottom row of cells.
    pub fn seeded_floor(dims: GridDims) -> Self {
        let nodes = dims.nodes();
        Self::default()
            .with_lock(Region::layers(nodes, 0, 1), Side::Below)
            .with_lock(Region::layers(nodes, 1, 2), Side::Above)
    }

    /// A seeded floor with [`Constraint::NoOverhang`] on every cell row above it.
    pub fn no_overhang_above_floor(dims: GridDims) -> Self {
        Self::seeded_floor(dims)
            .with_constraint(Region::layers(dims.cells(), 1, dims.height), Constraint::NoOverhang)
    }

    /// Assigns [`Constraint::Flatten`] to the lowest cell row that the locked
    /// regions do not pin completely.
    pub fn with_flattened_base(self, dims: GridDims) -> Self {
        let row = self.lowest_free_row(dims);
        self.with_constraint(Region::layers(dims.cells(), row, row + 1), Constraint::Flatten)
    }

    /// Lowest cell row whose two node layers are not both covered by a
    /// full-layer lock. Falls back to the top row.
    pub fn lowest_free_row(&self, dims: GridDims) -> u32 {
        let nodes = dims.nodes();
        let layer_locked = |y: u32| {
            self.locked_regions.iter().any(|locked| {
                let r = locked.region;
                r.min[0] == 0
                    && r.min[2] == 0
                    && r.max[0] >= nodes.x
                    && r.max[2] >= nodes.z
                    && (r.min[1]..r.max[1]).contains(&y)
            })
        };
        (0..dims.height)
            .find(|&y| !(layer_locked(y) && layer_locked(y + 1)))
            .unwrap_or(dims.height - 1)
    }

    pub fn with_lock(mut self, region: Region, value: Side) -> Self {
        self.locked_regions.push(LockedRegion { region, value });
        self
    }

    pub fn with_constraint(mut self, region: Region, constraint: Constraint) -> Self {
        self.constraint_regions.push(ConstraintRegion { region, constraint });
        self
    }

    /// Checks every region against the grid. The solver itself clips silently.
    pub fn validate(&self, dims: &GridDims) -> Result<(), GridError> {
        for locked in &self.locked_regions {
            locked.region.validate("node", dims.nodes())?;
        }
        for assigned in &self.constraint_regions {
            assigned.region.validate("cell", dims.cells())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_region_clipping() {
        let region = Region::new([1, 0, 1], [10, 2, 3]);
        let (min, max) = region.clipped(UVec3::new(4, 4, 4)).unwrap();
        assert_eq!(min, UVec3::new(1, 0, 1));
        assert_eq!(max, UVec3::new(4, 2, 3));
        assert_eq!(region.positions(UVec3::new(4, 4, 4)).count(), 3 * 2 * 2);

        let outside = Region::new([5, 0, 0], [6, 1, 1]);
        assert!(outside.clipped(UVec3::new(4, 4, 4)).is_none());
        assert_eq!(outside.positions(UVec3::new(4, 4, 4)).count(), 0);
    }

    #[test]
    fn test_region_validation() {
        let extent = UVec3::new(3, 3, 3);
        assert!(Region::new([0, 0, 0], [3, 1, 3]).validate("node", extent).is_ok());
        assert!(matches!(
            Region::new([0, 0, 0], [4, 1, 3]).validate("node", extent),
            Err(GridError::RegionOutOfBounds { .. })
        ));
        assert!(matches!(
            Region::new([1, 1, 1], [1, 2, 2]).validate("cell", extent),
            Err(GridError::EmptyRegion { .. })
        ));
    }

    #[test]
    fn test_presets_validate() {
        let dims = GridDims::new(5, 5, 5).unwrap();
        let config = SolverConfig::no_overhang_above_floor(dims);
        assert_eq!(config.locked_regions.len(), 2);
        assert_eq!(config.constraint_regions.len(), 1);
        assert!(config.validate(&dims).is_ok());
        assert_eq!(config.constraint_regions[0].region.min, [0, 1, 0]);
        assert_eq!(config.constraint_regions[0].region.max, [5, 5, 5]);
    }

    #[test]
    fn test_flattened_base_skips_locked_rows() {
        let dims = GridDims::new(4, 4, 4).unwrap();
        assert_eq!(SolverConfig::default().lowest_free_row(dims), 0);
        assert_eq!(SolverConfig::seeded_floor(dims).lowest_free_row(dims), 1);

        let config = SolverConfig::seeded_floor(dims).with_flattened_base(dims);
        let flatten = config.constraint_regions.last().unwrap();
        assert_eq!(flatten.constraint, Constraint::Flatten);
        assert_eq!(flatten.region, Region::new([0, 1, 0], [4, 2, 4]));

        let partial =
            SolverConfig::default().with_lock(Region::new([0, 0, 0], [2, 2, 5]), Side::Below);
        assert_eq!(partial.lowest_free_row(dims), 0, "partial locks leave the row free");
    }

    #[test]
    fn test_flattened_base_reaches_solver_cells() {
        let dims = GridDims::new(3, 3, 3).unwrap();
        let config = SolverConfig::no_overhang_above_floor(dims).with_flattened_base(dims);
        let grid = crate::solver::SolverGrid::with_config(dims, &config);

        for cell in grid.cells() {
            let expected = match cell.position().y {
                0 => Constraint::NoiseFill,
                1 => Constraint::Flatten,
                _ => Constraint::NoOverhang,
            };
            assert_eq!(cell.constraint(), expected, "cell {:?}", cell.position());
        }
    }

    #[test]
    fn test_config_from_json() {
        let json = r#"{
            "locked_regions": [
                { "region": { "min": [0, 0, 0], "max": [4, 1, 4] }, "value": "below" }
            ],
            "constraint_regions": [
                { "region": { "min": [0, 1, 0], "max": [3, 3, 3] }, "constraint": "flatten" }
            ]
        }"#;
        let config: SolverConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.locked_regions[0].value, Side::Below);
        assert_eq!(config.constraint_regions[0].constraint, Constraint::Flatten);
        assert!(config.validate(&GridDims::new(3, 3, 3).unwrap()).is_ok());

        let empty: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(empty, SolverConfig::default());
    }
}
