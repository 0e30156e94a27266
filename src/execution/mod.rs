//! Pipeline execution

pub mod command;
pub mod debug;
pub mod executor;
pub mod signal;

pub use command::{build_eval_run_command, DEFAULT_PATH, DEFAULT_WORKDIR};
pub use executor::{EventHandler, ExecutionEvent, PipelineRunner};
pub use signal::{InterruptGate, InterruptScope, InterruptSource, SuppressGuard};
