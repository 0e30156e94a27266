//! Execution backends that run rendered step commands

pub mod local;

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::path::PathBuf;
use thiserror::Error;

pub use local::LocalRunner;

/// Error types for backend operations
#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("command exited with code {0}")]
    Exit(i32),

    #[error("command terminated by signal")]
    Signaled,

    #[error("failed to start command: {0}")]
    Spawn(String),

    #[error("empty command")]
    EmptyCommand,

    #[error("Internal error: {0}")]
    Internal(String),
}

impl RunnerError {
    /// Exit code of the command, if it ran to completion
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunnerError::Exit(code) => Some(*code),
            _ => None,
        }
    }
}

/// Settings describing the environment commands run in
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    /// Identifier of the build environment
    pub pod_id: String,

    /// Host directory mounted as the build workspace
    pub workspace_dir: Option<PathBuf>,

    /// Extra environment passed to every command
    pub environment: BTreeMap<String, String>,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            pod_id: "local".to_string(),
            workspace_dir: None,
            environment: BTreeMap::new(),
        }
    }
}

impl RunnerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod_id(mut self, pod_id: impl Into<String>) -> Self {
        self.pod_id = pod_id.into();
        self
    }

    pub fn with_workspace(mut self, dir: impl Into<PathBuf>) -> Self {
        self.workspace_dir = Some(dir.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.environment.insert(key.into(), value.into());
        self
    }
}

/// Trait for command execution - allows for different backends
#[async_trait]
pub trait Runner: Send + Sync {
    /// Run a command to completion; a non-zero exit is an error
    async fn run(&self, config: &RunnerConfig, args: &[String]) -> Result<(), RunnerError>;

    /// Interactive attach capability, when the backend has one
    fn as_debugger(&self) -> Option<&dyn Debugger> {
        None
    }

    /// Backend name used in diagnostics
    fn name(&self) -> &str;
}

/// Backends able to attach an operator to an interactive session
#[async_trait]
pub trait Debugger: Send + Sync {
    /// Attach a terminal to `args` and block until it exits.
    ///
    /// Exit code 0 returns `Ok(())`.
    async fn debug(&self, config: &RunnerConfig, args: &[String]) -> Result<(), RunnerError>;
}
