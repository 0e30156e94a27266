//! Host subprocess backend
//!
//! Runs commands directly on the host, without any isolation. Useful for
//! trying recipes out locally.

use crate::runner::{Debugger, Runner, RunnerConfig, RunnerError};
use async_trait::async_trait;
use std::process::{ExitStatus, Stdio};
use tokio::process::Command;
use tracing::{debug, warn};

/// Backend executing commands as host subprocesses
#[derive(Debug, Clone, Default)]
pub struct LocalRunner {
    /// Allow interactive debug sessions
    interactive: bool,
}

impl LocalRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    fn command(config: &RunnerConfig, args: &[String]) -> Result<Command, RunnerError> {
        let (program, rest) = args.split_first().ok_or(RunnerError::EmptyCommand)?;

        let mut command = Command::new(program);
        command
            .args(rest)
            .envs(&config.environment)
            .kill_on_drop(true);
        if let Some(dir) = &config.workspace_dir {
            command.current_dir(dir);
        }
        Ok(command)
    }
}

fn check_status(status: ExitStatus) -> Result<(), RunnerError> {
    if status.success() {
        return Ok(());
    }
    match status.code() {
        Some(code) => Err(RunnerError::Exit(code)),
        None => Err(RunnerError::Signaled),
    }
}

#[async_trait]
impl Runner for LocalRunner {
    async fn run(&self, config: &RunnerConfig, args: &[String]) -> Result<(), RunnerError> {
        debug!("Spawning local command in {}: {:?}", config.pod_id, args);

        let status = Self::command(config, args)?
            .stdin(Stdio::null())
            .status()
            .await
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        if let Err(err) = check_status(status) {
            warn!("Local command failed: {}", err);
            return Err(err);
        }
        Ok(())
    }

    fn as_debugger(&self) -> Option<&dyn Debugger> {
        if self.interactive {
            Some(self as &dyn Debugger)
        } else {
            None
        }
    }

    fn name(&self) -> &str {
        "local"
    }
}

#[async_trait]
impl Debugger for LocalRunner {
    async fn debug(&self, config: &RunnerConfig, args: &[String]) -> Result<(), RunnerError> {
        debug!("Attaching interactive session: {:?}", args);

        let status = Self::command(config, args)?
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| RunnerError::Spawn(e.to_string()))?;

        check_status(status)
    }
}
