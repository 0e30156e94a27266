//! Test: Debug recovery - interactive sessions after a failing step

use crate::helpers::*;
use recipe_pipeline::core::{PipelineError, Step};
use recipe_pipeline::runner::RunnerError;
use tokio_util::sync::CancellationToken;

fn recipe() -> Vec<Step> {
    vec![
        Step::script("make check")
            .with_name("check")
            .with_working_directory("/home/build/src")
            .with_children(vec![Step::script("echo after-check")]),
        Step::script("make install").with_name("install"),
    ]
}

/// Exiting the session with 0 continues as if the step succeeded
#[tokio::test]
async fn test_exit_zero_continues_run() {
    let runner = interactive_runner(FakeRunner::new().failing_on("make check").with_session_exit(0));

    let summary = runner
        .run_pipelines(&CancellationToken::new(), &recipe())
        .await
        .unwrap();

    assert_eq!(summary.steps_ran, 2);
    assert_eq!(
        runner.runner().fragments(),
        vec!["make check", "echo after-check", "make install"]
    );
    assert_eq!(
        runner.runner().sessions(),
        vec![vec![
            "/bin/sh".to_string(),
            "-c".to_string(),
            "cd /home/build/src && exec /bin/sh".to_string(),
        ]]
    );
    assert_eq!(runner.runner().suppressed_in_session(), vec![true]);
    assert!(!runner.gate().is_suppressed());
}

/// Exiting with 1 aborts with both failures in the error
#[tokio::test]
async fn test_exit_one_aborts_with_combined_error() {
    let runner = interactive_runner(FakeRunner::new().failing_on("make check").with_session_exit(1));

    let err = runner
        .run_pipelines(&CancellationToken::new(), &recipe())
        .await
        .unwrap_err();

    match err.root() {
        PipelineError::DebugFailed { debug, original } => {
            assert_eq!(debug.exit_code(), Some(1));
            assert!(matches!(
                original.as_ref(),
                PipelineError::Execution {
                    source: RunnerError::Exit(1),
                    ..
                }
            ));
        }
        other => panic!("unexpected error: {other}"),
    }
    let message = err.to_string();
    assert!(message.contains("failed to debug: command exited with code 1"));
    assert!(message.contains("original error: step \"check\" failed"));

    assert_eq!(runner.runner().fragments(), vec!["make check"]);
    assert!(!runner.gate().is_suppressed());
}

/// Backends without an attach capability surface the original failure
#[tokio::test]
async fn test_backend_without_debugger() {
    let runner = interactive_runner(FakeRunner::new().failing_on("make check"));

    let err = runner
        .run_pipelines(&CancellationToken::new(), &recipe())
        .await
        .unwrap_err();

    assert!(matches!(err.root(), PipelineError::Execution { .. }));
    assert!(runner.runner().sessions().is_empty());
}

/// Without interactive mode no session is attempted
#[tokio::test]
async fn test_non_interactive_run_fails_fast() {
    let runner = pipeline_runner(FakeRunner::new().failing_on("make check").with_session_exit(0));

    let err = runner
        .run_pipelines(&CancellationToken::new(), &recipe())
        .await
        .unwrap_err();

    match err.root() {
        PipelineError::Execution { step, command, .. } => {
            assert_eq!(step, "check");
            assert_eq!(fragment_of(&command[2]), "make check");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.runner().sessions().is_empty());
    assert_eq!(runner.runner().scripts().len(), 1);
}

/// A nested failure recovered interactively still counts as ran
#[tokio::test]
async fn test_recovered_child_counts_as_ran() {
    let step = Step::script("true")
        .with_children(vec![Step::script("make check"), Step::script("echo ok")])
        .with_required_steps(2);
    let runner = interactive_runner(FakeRunner::new().failing_on("make check").with_session_exit(0));

    runner
        .run_pipeline(&CancellationToken::new(), &step)
        .await
        .unwrap();
    assert_eq!(runner.runner().sessions().len(), 1);
}
