// Cleaning pipeline: stage contract, stage implementations, and the orchestrator

pub mod pipeline;
pub mod processing;
pub mod steps;

pub use pipeline::{Pipeline, PipelineResult};
pub use steps::{DropCause, Stage, StageOutput, StageStats};
