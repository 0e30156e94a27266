//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Result of one successful step invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepOutcome {
    /// Guard evaluated false; nothing ran
    Skipped,
    /// Command executed, or failed and was recovered interactively
    Ran,
}

impl StepOutcome {
    pub fn ran(self) -> bool {
        matches!(self, StepOutcome::Ran)
    }
}

/// Overall pipeline run status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExecutionStatus {
    Running,
    Completed,
    Failed,
    Cancelled,
}

/// Summary of a top-level pipeline run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    /// Unique run ID
    pub run_id: Uuid,

    pub status: ExecutionStatus,

    pub started_at: DateTime<Utc>,

    pub finished_at: Option<DateTime<Utc>>,

    /// Top-level steps whose guard held
    pub steps_ran: usize,

    /// Top-level steps skipped by their guard
    pub steps_skipped: usize,
}

impl RunSummary {
    /// Start a new run
    pub fn start() -> Self {
        Self {
            run_id: Uuid::new_v4(),
            status: ExecutionStatus::Running,
            started_at: Utc::now(),
            finished_at: None,
            steps_ran: 0,
            steps_skipped: 0,
        }
    }

    /// Count a finished top-level step
    pub fn record(&mut self, outcome: StepOutcome) {
        match outcome {
            StepOutcome::Ran => self.steps_ran += 1,
            StepOutcome::Skipped => self.steps_skipped += 1,
        }
    }

    /// Mark the run finished with the given status
    pub fn finish(&mut self, status: ExecutionStatus) {
        self.status = status;
        self.finished_at = Some(Utc::now());
    }

    /// Wall-clock duration, if finished
    pub fn duration(&self) -> Option<chrono::Duration> {
        self.finished_at.map(|end| end - self.started_at)
    }
}
