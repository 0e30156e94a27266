//! Test: Guards - `if:` expressions decide which steps run

use crate::helpers::*;
use recipe_pipeline::core::{PipelineError, StepOutcome};
use tokio_util::sync::CancellationToken;

const RECIPE: &str = r#"
package:
  name: zlib
  version: "1.3"
options:
  minimal:
    vars:
      flavour: minimal
vars:
  flavour: full
pipeline:
  - name: arm only
    if: ${{build.arch}} == 'aarch64'
    runs: echo arm
    pipeline:
      - runs: echo nested-arm
  - name: full flavour
    if: ${{vars.flavour}} == 'full' && ${{options.minimal.enabled}} == 'false'
    runs: echo full
  - name: always
    runs: echo always
"#;

/// A false guard skips the step and its whole subtree
#[tokio::test]
async fn test_false_guard_skips_subtree() {
    let pb = build_for(RECIPE);
    let dir = fragment_dir(&[]);
    let steps = compile_main(&pb, dir.path());

    let runner = pipeline_runner(FakeRunner::new());
    let outcome = runner
        .run_pipeline(&CancellationToken::new(), &steps[0])
        .await
        .unwrap();

    assert_eq!(outcome, StepOutcome::Skipped);
    assert!(runner.runner().scripts().is_empty());
}

/// Guards see the resolved namespace, and skipped steps are counted
#[tokio::test]
async fn test_guards_use_resolved_values() {
    let pb = build_for(RECIPE);
    let dir = fragment_dir(&[]);
    let steps = compile_main(&pb, dir.path());

    let (runner, evaluator) = with_recording_evaluator(pipeline_runner(FakeRunner::new()));
    let summary = runner
        .run_pipelines(&CancellationToken::new(), &steps)
        .await
        .unwrap();

    assert_eq!(summary.steps_ran, 2);
    assert_eq!(summary.steps_skipped, 1);
    assert_eq!(runner.runner().fragments(), vec!["echo full", "echo always"]);
    assert_eq!(
        evaluator.expressions(),
        vec![
            "x86_64 == 'aarch64'".to_string(),
            "full == 'full' && false == 'false'".to_string(),
        ]
    );
}

/// Enabling a build option flips both its flag and its variables
#[tokio::test]
async fn test_build_option_changes_guard() {
    let mut config = recipe_pipeline::core::Configuration::from_yaml(RECIPE).unwrap();
    config.apply_build_options(&["minimal".to_string()]).unwrap();
    let pb = recipe_pipeline::core::PipelineBuild::build(
        recipe_pipeline::core::BuildContext::new(config, recipe_pipeline::core::Arch::X86_64)
            .with_options(vec!["minimal".to_string()]),
    );
    let dir = fragment_dir(&[]);
    let steps = compile_main(&pb, dir.path());

    let runner = pipeline_runner(FakeRunner::new());
    runner
        .run_pipelines(&CancellationToken::new(), &steps)
        .await
        .unwrap();
    assert_eq!(runner.runner().fragments(), vec!["echo always"]);
}

/// An expression the evaluator cannot handle fails the run
#[tokio::test]
async fn test_unsupported_guard_fails() {
    let yaml = r#"
package:
  name: zlib
  version: "1.3"
pipeline:
  - if: ${{package.version}} >= '1.0'
    runs: echo never
"#;
    let pb = build_for(yaml);
    let dir = fragment_dir(&[]);
    let steps = compile_main(&pb, dir.path());

    let runner = pipeline_runner(FakeRunner::new());
    let err = runner
        .run_pipelines(&CancellationToken::new(), &steps)
        .await
        .unwrap_err();

    match err.root() {
        PipelineError::Condition { expression, .. } => assert_eq!(expression, "1.3 >= '1.0'"),
        other => panic!("unexpected error: {other}"),
    }
    assert!(runner.runner().scripts().is_empty());
}
