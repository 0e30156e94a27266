//! CLI output formatting

use crate::{
    core::{ExecutionStatus, Purl, RunSummary},
    execution::ExecutionEvent,
};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static SPINNER: Emoji<'_, '_> = Emoji("⏳ ", "~ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "!");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");
pub static SKIP: Emoji<'_, '_> = Emoji("⏭️  ", "- ");

/// Format a run status for display
pub fn format_status(status: ExecutionStatus) -> String {
    match status {
        ExecutionStatus::Running => style("RUNNING").yellow().to_string(),
        ExecutionStatus::Completed => style("COMPLETED").green().to_string(),
        ExecutionStatus::Failed => style("FAILED").red().to_string(),
        ExecutionStatus::Cancelled => style("CANCELLED").yellow().to_string(),
    }
}

fn short_id(id: &uuid::Uuid) -> String {
    id.to_string()[..8].to_string()
}

/// Format an execution event for display
pub fn format_execution_event(event: &ExecutionEvent) -> String {
    match event {
        ExecutionEvent::PipelineStarted { run_id, steps } => format!(
            "{} Starting run {} ({} steps)",
            ROCKET,
            style(short_id(run_id)).dim(),
            style(steps).cyan()
        ),
        ExecutionEvent::StepStarted { step } => format!("{} {}", SPINNER, style(step).cyan()),
        ExecutionEvent::StepSkipped { step } => {
            format!("{} {} {}", SKIP, style(step).dim(), style("(skipped)").dim())
        }
        ExecutionEvent::StepRecovered { step } => format!(
            "{} {} {}",
            WARN,
            style(step).yellow(),
            style("(recovered interactively)").dim()
        ),
        ExecutionEvent::StepFailed { step, error } => {
            format!("{} {}: {}", CROSS, style(step).red(), style(error).dim())
        }
        ExecutionEvent::PipelineCompleted { run_id, status } => format!(
            "{} Run ({}) {}",
            INFO,
            style(short_id(run_id)).dim(),
            format_status(*status)
        ),
    }
}

/// Format a finished run for display
pub fn format_run_summary(summary: &RunSummary) -> String {
    let status_icon = match summary.status {
        ExecutionStatus::Completed => CHECK,
        ExecutionStatus::Failed => CROSS,
        ExecutionStatus::Running => SPINNER,
        ExecutionStatus::Cancelled => WARN,
    };

    let duration = summary
        .duration()
        .and_then(|d| d.to_std().ok())
        .map(format_duration)
        .unwrap_or_else(|| "-".to_string());

    format!(
        "{} {} - {} - {} ran, {} skipped - {}",
        status_icon,
        style(short_id(&summary.run_id)).dim(),
        format_status(summary.status),
        style(summary.steps_ran).green(),
        style(summary.steps_skipped).dim(),
        style(duration).dim()
    )
}

/// Format a package URL with the step it came from
pub fn format_purl(step: &str, purl: &Purl) -> String {
    format!("  {} {}", style(purl.to_string()).cyan(), style(format!("({})", step)).dim())
}

pub fn format_duration(duration: std::time::Duration) -> String {
    let secs = duration.as_secs();
    if secs < 60 {
        format!("{}s", secs)
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
