//! Generation stage trait and pipeline orchestration.

use std::collections::HashMap;
use std::time::Instant;

use log::{debug, info};
use thiserror::Error;

use crate::geometry::{GridDims, GridError};
use crate::mesh::triangulate_scaled;
use crate::noise::NoiseConfig;
use crate::solver::{SolverConfig, SolverGrid};
use crate::terrain::{Heightfield, Terrain};

/// Stage parameter holding the world size of one cell.
pub const CELL_SIZE_PARAM: &str = "cell_size";

/// Unique identifier for generation stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Wave-function collapse of the vertex lattice.
    Collapse,
    /// Copy of the solved lattice into a padded side field.
    Heightfield,
    /// Marching-cubes surface extraction.
    Mesh,
}

impl StageId {
    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Collapse => "collapse",
            StageId::Heightfield => "heightfield",
            StageId::Mesh => "mesh",
        }
    }
}

/// Configuration passed to each generation stage.
#[derive(Debug, Clone, Default)]
pub struct StageConfig {
    /// Additional stage-specific parameters.
    pub params: HashMap<String, f32>,
}

impl StageConfig {
    /// Sets a stage parameter.
    pub fn set_param(&mut self, key: &str, value: f32) -> &mut Self {
        self.params.insert(key.to_string(), value);
        self
    }

    /// Gets a stage parameter, returning a default if not set.
    pub fn get_param(&self, key: &str, default: f32) -> f32 {
        self.params.get(key).copied().unwrap_or(default)
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{0}' failed: {1}")]
    StageFailed(String, String),
    #[error("Missing dependency: stage '{0}' requires '{1}'")]
    MissingDependency(String, String),
    #[error("Invalid grid: {0}")]
    InvalidGrid(#[from] GridError),
}

/// Trait for implementing generation stages.
///
/// Each stage fills in one product of the [`Terrain`], reading the products
/// of the stages it depends on.
pub trait GenerationStage: Send + Sync {
    /// Returns the unique identifier for this stage.
    fn id(&self) -> StageId;

    /// Returns a human-readable name for the stage.
    fn name(&self) -> &str;

    /// Returns the stage IDs that must be executed before this stage.
    fn dependencies(&self) -> &[StageId] {
        &[]
    }

    /// Executes the generation stage, modifying the terrain in place.
    fn execute(&self, terrain: &mut Terrain, config: &StageConfig) -> Result<(), PipelineError>;
}

/// Orchestrates generation stages into a complete pipeline.
pub struct Pipeline {
    stages: Vec<Box<dyn GenerationStage>>,
    config: StageConfig,
}

impl Pipeline {
    /// Creates a new empty pipeline with the given configuration.
    pub fn new(config: StageConfig) -> Self {
        Self {
            stages: Vec::new(),
            config,
        }
    }

    /// Creates a pipeline running collapse, heightfield and mesh in order.
    pub fn standard(solver: SolverConfig, config: StageConfig) -> Self {
        let mut pipeline = Self::new(config);
        pipeline
            .add_stage(CollapseStage::new(solver))
            .add_stage(HeightfieldStage)
            .add_stage(MeshStage);
        pipeline
    }

    /// Adds a stage to the pipeline.
    pub fn add_stage<S: GenerationStage + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Box::new(stage));
        self
    }

    /// Returns the number of stages in the pipeline.
    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    pub fn config(&self) -> &StageConfig {
        &self.config
    }

    /// Executes all stages in order on the given terrain.
    pub fn run(&self, terrain: &mut Terrain) -> Result<(), PipelineError> {
        self.run_with_callbacks(terrain, |_, _, _| {}, |_, _, _| {})
    }

    /// Executes all stages, reporting `(name, index, total)` as each one
    /// starts and finishes.
    pub fn run_with_callbacks<F1, F2>(
        &self,
        terrain: &mut Terrain,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<(), PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        let total = self.stages.len();
        let mut completed: Vec<StageId> = Vec::new();

        for (i, stage) in self.stages.iter().enumerate() {
            on_stage_start(stage.name(), i, total);

            for dep in stage.dependencies() {
                if !completed.contains(dep) {
                    return Err(PipelineError::MissingDependency(
                        stage.name().to_string(),
                        dep.name().to_string(),
                    ));
                }
            }

            let start = Instant::now();
            stage.execute(terrain, &self.config)?;
            completed.push(stage.id());
            info!("Stage '{}' finished in {:.2?}", stage.name(), start.elapsed());

            on_stage_complete(stage.name(), i, total);
        }

        Ok(())
    }
}

/// Solves the vertex lattice with the terrain's noise prior.
pub struct CollapseStage {
    pub config: SolverConfig,
}

impl CollapseStage {
    pub fn new(config: SolverConfig) -> Self {
        Self { config }
    }
}

impl GenerationStage for CollapseStage {
    fn id(&self) -> StageId {
        StageId::Collapse
    }

    fn name(&self) -> &str {
        "Wave Function Collapse"
    }

    fn execute(&self, terrain: &mut Terrain, _config: &StageConfig) -> Result<(), PipelineError> {
        self.config.validate(&terrain.dims)?;

        let mut grid = SolverGrid::with_config(terrain.dims, &self.config);
        let stats = grid.solve(&terrain.noise);
        if !grid.is_resolved() {
            return Err(PipelineError::StageFailed(
                self.name().to_string(),
                format!("{} vertices left unresolved", grid.vertices().unresolved_count()),
            ));
        }

        terrain.reset();
        terrain.grid = Some(grid);
        terrain.stats = Some(stats);
        Ok(())
    }
}

/// Copies the solved lattice into a heightfield padded with air.
pub struct HeightfieldStage;

impl GenerationStage for HeightfieldStage {
    fn id(&self) -> StageId {
        StageId::Heightfield
    }

    fn name(&self) -> &str {
        "Heightfield Extraction"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Collapse]
    }

    fn execute(&self, terrain: &mut Terrain, _config: &StageConfig) -> Result<(), PipelineError> {
        let grid = terrain.grid.as_ref().ok_or_else(|| {
            PipelineError::StageFailed(
                self.name().to_string(),
                "terrain has no solved grid".to_string(),
            )
        })?;

        let field = Heightfield::from_grid(grid);
        debug!(
            "Heightfield has {} nodes, {} solid",
            field.node_count(),
            field.solid_count()
        );
        terrain.heightfield = Some(field);
        terrain.mesh = None;
        Ok(())
    }
}

/// Triangulates the heightfield, scaled by the `cell_size` parameter.
pub struct MeshStage;

impl GenerationStage for MeshStage {
    fn id(&self) -> StageId {
        StageId::Mesh
    }

    fn name(&self) -> &str {
        "Surface Triangulation"
    }

    fn dependencies(&self) -> &[StageId] {
        &[StageId::Heightfield]
    }

    fn execute(&self, terrain: &mut Terrain, config: &StageConfig) -> Result<(), PipelineError> {
        let cell_size = config.get_param(CELL_SIZE_PARAM, 1.0);
        if !(cell_size.is_finite() && cell_size > 0.0) {
            return Err(PipelineError::StageFailed(
                self.name().to_string(),
                format!("cell size must be positive, got {}", cell_size),
            ));
        }

        let field = terrain.heightfield.as_ref().ok_or_else(|| {
            PipelineError::StageFailed(
                self.name().to_string(),
                "terrain has no heightfield".to_string(),
            )
        })?;

        terrain.mesh = Some(triangulate_scaled(field, cell_size));
        Ok(())
    }
}

/// Runs the standard pipeline at unit cell size on a fresh terrain.
pub fn generate_terrain(
    dims: GridDims,
    noise: NoiseConfig,
    solver: SolverConfig,
) -> Result<Terrain, PipelineError> {
    let mut terrain = Terrain::new(dims, noise);
    Pipeline::standard(solver, StageConfig::default()).run(&mut terrain)?;
    Ok(terrain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Region, Side};

    fn small_dims() -> GridDims {
        GridDims::new(4, 4, 4).unwrap()
    }

    #[test]
    fn test_stage_config() {
        let mut config = StageConfig::default();
        config.set_param(CELL_SIZE_PARAM, 0.5);

        assert_eq!(config.get_param(CELL_SIZE_PARAM, 1.0), 0.5);
        assert_eq!(config.get_param("missing", 1.0), 1.0);
    }

    #[test]
    fn test_pipeline_execution() {
        let mut terrain = Terrain::new(small_dims(), NoiseConfig::with_seed(42));
        let pipeline = Pipeline::standard(SolverConfig::default(), StageConfig::default());
        assert_eq!(pipeline.stage_count(), 3);
        pipeline.run(&mut terrain).unwrap();

        assert!(terrain.is_solved());
        let stats = terrain.stats.unwrap();
        assert!(stats.resolve_calls > 0);
        assert_eq!(stats.corners_resolved, small_dims().node_count());

        let field = terrain.heightfield.as_ref().unwrap();
        assert_eq!(field.dims(), small_dims().nodes() + 2);
        assert!(terrain.mesh.is_some());
    }

    #[test]
    fn test_missing_dependency() {
        let mut pipeline = Pipeline::new(StageConfig::default());
        pipeline.add_stage(MeshStage);

        let mut terrain = Terrain::new(small_dims(), NoiseConfig::default());
        let err = pipeline.run(&mut terrain).unwrap_err();
        assert!(matches!(err, PipelineError::MissingDependency(ref stage, ref dep)
            if stage == "Surface Triangulation" && dep == "heightfield"));
    }

    #[test]
    fn test_invalid_region_is_reported() {
        let solver =
            SolverConfig::default().with_lock(Region::new([0, 0, 0], [9, 1, 9]), Side::Below);
        let err = generate_terrain(small_dims(), NoiseConfig::default(), solver).unwrap_err();
        assert!(matches!(err, PipelineError::InvalidGrid(GridError::RegionOutOfBounds { .. })));
    }

    #[test]
    fn test_invalid_cell_size() {
        let mut config = StageConfig::default();
        config.set_param(CELL_SIZE_PARAM, 0.0);
        let pipeline = Pipeline::standard(SolverConfig::default(), config);

        let mut terrain = Terrain::new(small_dims(), NoiseConfig::default());
        let err = pipeline.run(&mut terrain).unwrap_err();
        assert!(matches!(err, PipelineError::StageFailed(..)));
        assert!(terrain.heightfield.is_some());
        assert!(terrain.mesh.is_none());
    }

    #[test]
    fn test_cell_size_scales_mesh() {
        let dims = small_dims();
        let solver = SolverConfig::seeded_floor(dims);
        let unit = generate_terrain(dims, NoiseConfig::with_seed(3), solver).unwrap();

        let mut config = StageConfig::default();
        config.set_param(CELL_SIZE_PARAM, 2.0);
        let mut scaled = Terrain::new(dims, NoiseConfig::with_seed(3));
        Pipeline::standard(SolverConfig::seeded_floor(dims), config)
            .run(&mut scaled)
            .unwrap();

        let a = unit.mesh.unwrap();
        let b = scaled.mesh.unwrap();
        assert_eq!(a.triangle_count(), b.triangle_count());
        for (p, q) in a.positions.iter().zip(&b.positions) {
            assert_eq!(*p * 2.0, *q);
        }
    }

    #[test]
    fn test_generation_is_deterministic() {
        let dims = small_dims();
        let a = generate_terrain(dims, NoiseConfig::with_seed(7), SolverConfig::default()).unwrap();
        let b = generate_terrain(dims, NoiseConfig::with_seed(7), SolverConfig::default()).unwrap();
        assert_eq!(a.heightfield, b.heightfield);
        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.stats, b.stats);
    }

    #[test]
    fn test_pipeline_with_callbacks() {
        let pipeline = Pipeline::standard(SolverConfig::default(), StageConfig::default());
        let mut terrain = Terrain::new(small_dims(), NoiseConfig::default());
        let mut started = Vec::new();
        let mut completed = 0;

        pipeline
            .run_with_callbacks(
                &mut terrain,
                |name, i, total| {
                    assert_eq!(total, 3);
                    started.push((i, name.to_string()));
                },
                |_, _, _| completed += 1,
            )
            .unwrap();

        assert_eq!(completed, 3);
        assert_eq!(started[0], (0, "Wave Function Collapse".to_string()));
        assert_eq!(started[2].1, "Surface Triangulation");
    }

    #[test]
    fn test_rerunning_collapse_drops_stale_products() {
        let dims = small_dims();
        let mut terrain =
            generate_terrain(dims, NoiseConfig::default(), SolverConfig::default()).unwrap();
        assert!(terrain.mesh.is_some());

        CollapseStage::new(SolverConfig::default())
            .execute(&mut terrain, &StageConfig::default())
            .unwrap();
        assert!(terrain.grid.is_some());
        assert!(terrain.heightfield.is_none());
        assert!(terrain.mesh.is_none());
    }

    #[test]
    fn test_stage_id_name() {
        assert_eq!(StageId::Collapse.name(), "collapse");
        assert_eq!(StageId::Heightfield.name(), "heightfield");
        assert_eq!(StageId::Mesh.name(), "mesh");
    }
}
