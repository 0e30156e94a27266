//! recipe-pipeline - runs the step pipelines of declarative build recipes

pub mod cli;
pub mod core;
pub mod execution;
pub mod runner;

// Re-export commonly used types
pub use core::{Configuration, PipelineBuild, PipelineError, Purl, RunSummary, Step, StepOutcome};
pub use execution::{ExecutionEvent, InterruptGate, PipelineRunner};
pub use runner::{Debugger, LocalRunner, Runner, RunnerConfig, RunnerError};
