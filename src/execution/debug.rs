//! Interactive recovery when a step fails

use crate::{
    core::PipelineError,
    execution::executor::PipelineRunner,
    runner::Runner,
};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

impl<R: Runner> PipelineRunner<R> {
    /// Offer the operator a shell in the failing step's working directory.
    ///
    /// Returns `Ok(())` when the operator leaves the session with `exit 0`,
    /// meaning the run continues. In every other case an error is returned:
    /// `original` when the run is not interactive or the backend cannot
    /// attach, [`PipelineError::Cancelled`] when the run was torn down, and
    /// [`PipelineError::DebugFailed`] carrying both failures otherwise.
    ///
    /// Cancelling `token` while the session is open abandons it.
    pub async fn maybe_debug(
        &self,
        token: &CancellationToken,
        workdir: &str,
        original: PipelineError,
    ) -> Result<(), PipelineError> {
        if !self.interactive {
            return Err(original);
        }

        let Some(debugger) = self.runner.as_debugger() else {
            error!("Interactive debugging is not supported by the {} runner", self.runner.name());
            return Err(original);
        };

        if token.is_cancelled() {
            return Err(PipelineError::Cancelled);
        }

        info!("Execing into pod {:?} to debug interactively (workdir {})", self.config.pod_id, workdir);
        info!("Type 'exit 0' to continue the next pipeline step or 'exit 1' to abort.");

        let shell = vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            format!("cd {} && exec /bin/sh", workdir),
        ];

        let _suppressed = self.gate.suppress();
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(PipelineError::Cancelled),
            result = debugger.debug(&self.config, &shell) => {
                result.map_err(|debug| PipelineError::DebugFailed {
                    debug,
                    original: Box::new(original),
                })
            }
        }
    }
}
