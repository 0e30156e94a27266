//! Pipeline runner - walks the step tree and drives the backend

use crate::{
    core::{
        ComparisonEvaluator, ConditionEvaluator, ExecutionStatus, PipelineError, RunSummary, Step,
        StepOutcome,
    },
    execution::{
        command::{build_eval_run_command, DEFAULT_PATH, DEFAULT_WORKDIR},
        signal::{InterruptGate, InterruptScope, InterruptSource},
    },
    runner::{Runner, RunnerConfig},
};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use uuid::Uuid;

/// Events that can occur during a pipeline run
#[derive(Debug, Clone)]
pub enum ExecutionEvent {
    PipelineStarted {
        run_id: Uuid,
        steps: usize,
    },
    StepStarted {
        step: String,
    },
    StepSkipped {
        step: String,
    },
    StepRecovered {
        step: String,
    },
    StepFailed {
        step: String,
        error: String,
    },
    PipelineCompleted {
        run_id: Uuid,
        status: ExecutionStatus,
    },
}

/// Type for event handlers
pub type EventHandler = Arc<dyn Fn(ExecutionEvent) + Send + Sync>;

type StepFuture<'a> = Pin<Box<dyn Future<Output = Result<StepOutcome, PipelineError>> + Send + 'a>>;

/// Runs compiled steps against an execution backend
pub struct PipelineRunner<R> {
    pub(super) runner: R,
    pub(super) config: RunnerConfig,
    pub(super) interactive: bool,
    pub(super) gate: InterruptGate,
    interrupts: InterruptSource,
    debug: bool,
    sys_path: String,
    evaluator: Arc<dyn ConditionEvaluator>,
    event_handlers: Vec<EventHandler>,
}

impl<R: Runner> PipelineRunner<R> {
    pub fn new(runner: R, config: RunnerConfig) -> Self {
        Self {
            runner,
            config,
            interactive: false,
            gate: InterruptGate::new(),
            interrupts: InterruptSource::default(),
            debug: false,
            sys_path: DEFAULT_PATH.to_string(),
            evaluator: Arc::new(ComparisonEvaluator),
            event_handlers: Vec::new(),
        }
    }

    /// Trace every shell command (`set -x`)
    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    /// Offer an interactive shell when a step fails
    pub fn with_interactive(mut self, interactive: bool) -> Self {
        self.interactive = interactive;
        self
    }

    pub fn with_sys_path(mut self, sys_path: impl Into<String>) -> Self {
        self.sys_path = sys_path.into();
        self
    }

    pub fn with_evaluator(mut self, evaluator: Arc<dyn ConditionEvaluator>) -> Self {
        self.evaluator = evaluator;
        self
    }

    /// Share an interrupt gate with the caller
    pub fn with_gate(mut self, gate: InterruptGate) -> Self {
        self.gate = gate;
        self
    }

    pub fn with_interrupts(mut self, interrupts: InterruptSource) -> Self {
        self.interrupts = interrupts;
        self
    }

    /// Add an event handler
    pub fn add_event_handler<F>(&mut self, handler: F)
    where
        F: Fn(ExecutionEvent) + Send + Sync + 'static,
    {
        self.event_handlers.push(Arc::new(handler));
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn gate(&self) -> &InterruptGate {
        &self.gate
    }

    fn emit(&self, event: ExecutionEvent) {
        for handler in &self.event_handlers {
            handler(event.clone());
        }
    }

    /// Run a sequence of top-level steps, stopping at the first failure
    pub async fn run_pipelines(
        &self,
        token: &CancellationToken,
        steps: &[Step],
    ) -> Result<RunSummary, PipelineError> {
        let mut summary = RunSummary::start();
        info!("Starting pipeline run {} ({} steps)", summary.run_id, steps.len());
        self.emit(ExecutionEvent::PipelineStarted {
            run_id: summary.run_id,
            steps: steps.len(),
        });

        for step in steps {
            match self.run_pipeline(token, step).await {
                Ok(outcome) => summary.record(outcome),
                Err(err) => {
                    let status = if err.is_cancelled() {
                        ExecutionStatus::Cancelled
                    } else {
                        ExecutionStatus::Failed
                    };
                    summary.finish(status);
                    self.emit(ExecutionEvent::PipelineCompleted {
                        run_id: summary.run_id,
                        status,
                    });
                    return Err(PipelineError::Nested(Box::new(err)));
                }
            }
        }

        summary.finish(ExecutionStatus::Completed);
        info!(
            "Pipeline run {} finished: {} ran, {} skipped",
            summary.run_id, summary.steps_ran, summary.steps_skipped
        );
        self.emit(ExecutionEvent::PipelineCompleted {
            run_id: summary.run_id,
            status: summary.status,
        });
        Ok(summary)
    }

    /// Run one step and, depth-first, its children.
    ///
    /// Returns [`StepOutcome::Skipped`] when the guard is false, in which case
    /// neither the step nor its children run.
    pub fn run_pipeline<'a>(&'a self, token: &'a CancellationToken, step: &'a Step) -> StepFuture<'a> {
        Box::pin(async move {
            if token.is_cancelled() {
                return Err(PipelineError::Cancelled);
            }

            if !self.should_run(step)? {
                debug!("Skipping step {:?}: guard is false", step.identity());
                self.emit(ExecutionEvent::StepSkipped {
                    step: step.identity().to_string(),
                });
                return Ok(StepOutcome::Skipped);
            }

            let id = step.identity();
            let workdir = step
                .working_directory
                .as_deref()
                .filter(|dir| !dir.is_empty())
                .unwrap_or(DEFAULT_WORKDIR);

            // Ctrl-C cancels this step (and its children) rather than the process
            let scope = self
                .interactive
                .then(|| InterruptScope::install(token, &self.gate, &self.interrupts));
            let token = scope.as_ref().map(InterruptScope::token).unwrap_or(token);

            if id != "???" {
                info!("running step {:?}", id);
            }
            self.emit(ExecutionEvent::StepStarted { step: id.to_string() });

            let command = build_eval_run_command(
                &step.environment,
                self.debug,
                &self.sys_path,
                workdir,
                &step.runs,
            );

            let result = tokio::select! {
                biased;
                _ = token.cancelled() => return Err(PipelineError::Cancelled),
                result = self.runner.run(&self.config, &command) => result,
            };

            if let Err(source) = result {
                error!("Step failed: {}\n{}", source, command.join(" "));
                let failure = PipelineError::Execution {
                    step: id.to_string(),
                    command: command.clone(),
                    source,
                };
                if let Err(err) = self.maybe_debug(token, workdir, failure).await {
                    self.emit(ExecutionEvent::StepFailed {
                        step: id.to_string(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
                info!("Step {:?} recovered, continuing", id);
                self.emit(ExecutionEvent::StepRecovered { step: id.to_string() });
            }

            let mut ran = 0;
            for child in &step.pipeline {
                let outcome = self
                    .run_pipeline(token, child)
                    .await
                    .map_err(|err| PipelineError::Nested(Box::new(err)))?;
                if outcome.ran() {
                    ran += 1;
                }
            }

            if let Some(assertions) = &step.assertions {
                if assertions.required_steps != ran {
                    let err = PipelineError::Assertion {
                        step: id.to_string(),
                        expected: assertions.required_steps,
                        actual: ran,
                    };
                    self.emit(ExecutionEvent::StepFailed {
                        step: id.to_string(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }

            Ok(StepOutcome::Ran)
        })
    }

    fn should_run(&self, step: &Step) -> Result<bool, PipelineError> {
        match step.guard() {
            None => Ok(true),
            Some(expression) => {
                self.evaluator
                    .evaluate(expression)
                    .map_err(|source| PipelineError::Condition {
                        expression: expression.to_string(),
                        source,
                    })
            }
        }
    }
}
