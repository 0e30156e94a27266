//! Core domain models for build recipes
//!
//! This module defines the recipe data model, the template namespace and
//! the pure transformations applied to steps before they are executed.

pub mod arch;
pub mod compile;
pub mod condition;
pub mod config;
pub mod context;
pub mod error;
pub mod inputs;
pub mod loader;
pub mod namespace;
pub mod provenance;
pub mod state;
pub mod step;
pub mod substitution;

pub use arch::Arch;
pub use compile::Compiler;
pub use condition::{ComparisonEvaluator, ConditionEvaluator};
pub use config::Configuration;
pub use context::*;
pub use error::PipelineError;
pub use provenance::Purl;
pub use state::*;
pub use step::*;
