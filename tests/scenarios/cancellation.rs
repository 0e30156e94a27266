//! Test: Cancellation - tearing down a run mid-flight

use crate::helpers::*;
use recipe_pipeline::core::{ExecutionStatus, PipelineError, Step};
use recipe_pipeline::execution::{ExecutionEvent, InterruptSource};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn recipe() -> Vec<Step> {
    vec![
        Step::script("echo first"),
        Step::script("true").with_children(vec![
            Step::script("sleep forever"),
            Step::script("echo sibling"),
        ]),
        Step::script("echo last"),
    ]
}

/// Cancelling while a command runs aborts it and nothing else runs
#[tokio::test]
async fn test_cancel_in_flight_command() {
    let mut runner = pipeline_runner(FakeRunner::new().hanging_on("sleep forever"));
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    runner.add_event_handler(move |event| sink.lock().unwrap().push(event));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), runner.run_pipelines(&token, &recipe()))
        .await
        .expect("cancellation should abort the hanging command")
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(
        runner.runner().fragments(),
        vec!["echo first", "true", "sleep forever"]
    );
    assert!(matches!(
        events.lock().unwrap().last(),
        Some(ExecutionEvent::PipelineCompleted {
            status: ExecutionStatus::Cancelled,
            ..
        })
    ));
}

/// A run cancelled before it starts executes nothing
#[tokio::test]
async fn test_cancelled_before_start() {
    let runner = pipeline_runner(FakeRunner::new());
    let token = CancellationToken::new();
    token.cancel();

    let err = runner.run_pipelines(&token, &recipe()).await.unwrap_err();
    assert!(matches!(err.root(), PipelineError::Cancelled));
    assert!(runner.runner().scripts().is_empty());
}

/// Interactive runs honour the parent token through their step scope
#[tokio::test]
async fn test_interactive_scope_follows_parent() {
    let runner = interactive_runner(FakeRunner::new().hanging_on("sleep forever").with_session_exit(0));

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), runner.run_pipelines(&token, &recipe()))
        .await
        .expect("cancellation should abort the hanging command")
        .unwrap_err();

    assert!(err.is_cancelled());
    // Cancellation is not a failure to debug
    assert!(runner.runner().sessions().is_empty());
}

/// Cancelling while an operator session is open ends the session
#[tokio::test]
async fn test_cancel_during_debug_session() {
    let runner = interactive_runner(FakeRunner::new().failing_on("echo first").with_hanging_session());

    let token = CancellationToken::new();
    let canceller = token.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        canceller.cancel();
    });

    let err = tokio::time::timeout(Duration::from_secs(5), runner.run_pipelines(&token, &recipe()))
        .await
        .expect("cancellation should end the debug session")
        .unwrap_err();

    assert!(err.is_cancelled());
    assert_eq!(runner.runner().sessions().len(), 1);
    assert_eq!(runner.runner().suppressed_in_session(), vec![true]);
    assert!(!runner.gate().is_suppressed());
    assert_eq!(runner.runner().fragments(), vec!["echo first"]);
}

/// An interrupt cancels the running step but not the caller's token
#[tokio::test]
async fn test_interrupt_cancels_running_step() {
    let interrupts = InterruptSource::manual();
    let runner = interactive_runner(FakeRunner::new().hanging_on("sleep forever"))
        .with_interrupts(interrupts.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        interrupts.trigger();
    });

    let token = CancellationToken::new();
    let err = tokio::time::timeout(Duration::from_secs(5), runner.run_pipelines(&token, &recipe()))
        .await
        .expect("interrupt should abort the hanging command")
        .unwrap_err();

    assert!(err.is_cancelled());
    assert!(!token.is_cancelled());
    assert_eq!(
        runner.runner().fragments(),
        vec!["echo first", "true", "sleep forever"]
    );
}

/// Interrupts go to the operator's shell while a session is open
#[tokio::test]
async fn test_interrupt_ignored_during_debug_session() {
    let interrupts = InterruptSource::manual();
    let runner = interactive_runner(FakeRunner::new().failing_on("echo first").with_hanging_session())
        .with_interrupts(interrupts.clone());

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        interrupts.trigger();
    });

    let result = tokio::time::timeout(
        Duration::from_millis(300),
        runner.run_pipelines(&CancellationToken::new(), &recipe()),
    )
    .await;

    assert!(result.is_err(), "session should still be open");
    assert_eq!(runner.runner().sessions().len(), 1);
    assert!(!runner.gate().is_suppressed());
}
