//! Errors raised while compiling or running a pipeline

use crate::core::{
    condition::ConditionError, inputs::InputError, loader::LoaderError,
    provenance::PurlError, substitution::SubstitutionError,
};
use crate::runner::RunnerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("step {step:?}: {source}")]
    Substitution {
        step: String,
        #[source]
        source: SubstitutionError,
    },

    #[error("step {step:?}: {source}")]
    Input {
        step: String,
        #[source]
        source: InputError,
    },

    #[error(transparent)]
    Fragment(#[from] LoaderError),

    #[error("parsing pipeline fragment {uses:?}: {source}")]
    FragmentParse {
        uses: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("pipeline fragment {0:?} nests too deeply")]
    FragmentDepth(String),

    #[error("step {step:?}: computing external refs: {source}")]
    Provenance {
        step: String,
        #[source]
        source: PurlError,
    },

    #[error("evaluating if-conditional {expression:?}: {source}")]
    Condition {
        expression: String,
        #[source]
        source: ConditionError,
    },

    #[error("step {step:?} failed: {source}")]
    Execution {
        step: String,
        command: Vec<String>,
        #[source]
        source: RunnerError,
    },

    #[error("step {step:?} did not run the required {expected} steps, only {actual}")]
    Assertion {
        step: String,
        expected: usize,
        actual: usize,
    },

    #[error("failed to debug: {debug}; original error: {original}")]
    DebugFailed {
        debug: RunnerError,
        original: Box<PipelineError>,
    },

    #[error("pipeline run cancelled")]
    Cancelled,

    #[error("unable to run pipeline: {0}")]
    Nested(#[source] Box<PipelineError>),
}

impl PipelineError {
    /// The innermost error, unwrapping nested pipeline failures
    pub fn root(&self) -> &PipelineError {
        match self {
            PipelineError::Nested(inner) => inner.root(),
            other => other,
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self.root(), PipelineError::Cancelled)
    }
}
