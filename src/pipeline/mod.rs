//! Pipeline module for orchestrating terrain generation stages.
//!
//! Provides a trait-based architecture for generation stages that are
//! composed into the collapse, heightfield and mesh sequence.

mod stage;

pub use stage::{
    generate_terrain, CollapseStage, GenerationStage, HeightfieldStage, MeshStage, Pipeline,
    PipelineError, StageConfig, StageId, CELL_SIZE_PARAM,
};
