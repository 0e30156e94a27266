//! Test: Variable substitution - from recipe YAML to rendered commands

use crate::helpers::*;
use recipe_pipeline::core::{
    loader::DirectoryLoader, Compiler, PipelineError, Step,
};
use tokio_util::sync::CancellationToken;

const FETCH: &str = r#"
name: Fetch and verify a tarball
inputs:
  uri:
    required: true
  expected-sha256: {}
  expected-sha512: {}
  purl-name:
    default: ${{package.name}}
  purl-version:
    default: ${{package.version}}
pipeline:
  - runs: |
      wget -O source.tar.gz ${{inputs.uri}}
      echo "${{inputs.expected-sha256}}  source.tar.gz" | sha256sum -c
"#;

const CHECKOUT: &str = r#"
name: Check out a git repository
inputs:
  repository:
    required: true
  tag: {}
  expected-commit: {}
  destination:
    default: .
pipeline:
  - runs: git clone --branch ${{inputs.tag}} ${{inputs.repository}} ${{inputs.destination}}
"#;

const MIRRORED_CHECKOUT: &str = r#"
name: Check out through a mirror
inputs:
  repository:
    required: true
pipeline:
  - uses: git-checkout
    with:
      repository: ${{inputs.repository}}/mirror
      tag: v1
"#;

const RECIPE: &str = r#"
package:
  name: hello
  version: "2.12.1"
  epoch: 3
vars:
  prefix: /usr
var-transforms:
  - from: ${{package.version}}
    match: \.(\d+)$
    replace: ""
    to: short-version
pipeline:
  - uses: fetch
    with:
      uri: https://ftp.gnu.org/gnu/hello/hello-${{package.version}}.tar.gz
      expected-sha256: 0123abcd
  - uses: git-checkout
    with:
      repository: https://github.com/GNU/Hello
      tag: v${{vars.short-version}}
      expected-commit: deadbeef
  - runs: ./configure --prefix=${{vars.prefix}} --host=${{host.triplet.gnu}}
    environment:
      DESTDIR: ${{targets.destdir}}
      VERSION: ${{package.full-version}}
subpackages:
  - name: hello-doc
    pipeline:
      - runs: mv ${{targets.destdir}}/usr/share/doc ${{targets.subpkgdir}}/
"#;

fn fragments() -> tempfile::TempDir {
    fragment_dir(&[
        ("fetch", FETCH),
        ("git-checkout", CHECKOUT),
        ("mirrored-checkout", MIRRORED_CHECKOUT),
    ])
}

/// Every template in the pipeline is resolved before it runs
#[tokio::test]
async fn test_rendered_commands_are_resolved() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let steps = compile_main(&pb, dir.path());

    let runner = pipeline_runner(FakeRunner::new());
    runner
        .run_pipelines(&CancellationToken::new(), &steps)
        .await
        .unwrap();

    let fragments = runner.runner().fragments();
    assert_eq!(
        fragments,
        vec![
            "".to_string(),
            "wget -O source.tar.gz https://ftp.gnu.org/gnu/hello/hello-2.12.1.tar.gz\n\
             echo \"0123abcd  source.tar.gz\" | sha256sum -c\n"
                .to_string(),
            "".to_string(),
            "git clone --branch v2.12 https://github.com/GNU/Hello .".to_string(),
            "./configure --prefix=/usr --host=x86_64-pc-linux-gnu".to_string(),
        ]
    );

    let scripts = runner.runner().scripts();
    assert!(!scripts.iter().any(|s| s.contains("${{")));
    assert!(scripts[4].contains("export DESTDIR='/home/build/melange-out/hello'\n"));
    assert!(scripts[4].contains("export VERSION='2.12.1-r3'\n"));
}

/// Fetch and checkout steps carry the provenance of what they pulled in
#[test]
fn test_external_refs_follow_resolved_inputs() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let steps = compile_main(&pb, dir.path());

    let fetch: Vec<String> = steps[0].external_refs.iter().map(|p| p.to_string()).collect();
    assert_eq!(
        fetch,
        vec![
            "pkg:generic/hello@2.12.1?checksum=sha256%3A0123abcd\
             &download_url=https%3A%2F%2Fftp.gnu.org%2Fgnu%2Fhello%2Fhello-2.12.1.tar.gz"
                .to_string()
        ]
    );

    let checkout: Vec<String> = steps[1].external_refs.iter().map(|p| p.to_string()).collect();
    assert_eq!(
        checkout,
        vec!["pkg:github/gnu/hello@v2.12".to_string(), "pkg:github/gnu/hello@deadbeef".to_string()]
    );

    assert!(steps[2].external_refs.is_empty());
}

/// Subpackage pipelines see their own output directory
#[tokio::test]
async fn test_subpackage_scope() {
    let pb = build_for(RECIPE);
    let subpackage = pb.configuration().subpackage("hello-doc").unwrap().clone();
    let steps = subpackage.pipeline.clone();
    let pb = pb.for_subpackage(subpackage);

    let dir = fragments();
    let loader = DirectoryLoader::new(dir.path());
    let steps = Compiler::new(&loader).compile_pipeline(&pb, &steps).unwrap();

    let runner = pipeline_runner(FakeRunner::new());
    runner
        .run_pipelines(&CancellationToken::new(), &steps)
        .await
        .unwrap();
    assert_eq!(
        runner.runner().fragments(),
        vec!["mv /home/build/melange-out/hello/usr/share/doc /home/build/melange-out/hello-doc/"]
    );
}

/// Missing required inputs are reported before anything runs
#[test]
fn test_missing_required_input() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let loader = DirectoryLoader::new(dir.path());

    let step = Step {
        uses: Some("git-checkout".to_string()),
        ..Default::default()
    };
    let err = Compiler::new(&loader).compile_pipeline(&pb, &[step]).unwrap_err();
    assert!(matches!(err, PipelineError::Input { .. }));
    assert!(err
        .to_string()
        .contains("required input \"repository\" for pipeline is missing"));
}

/// A reference to an unknown variable is a hard error
#[test]
fn test_undefined_variable() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let loader = DirectoryLoader::new(dir.path());

    let err = Compiler::new(&loader)
        .compile_pipeline(&pb, &[Step::script("echo ${{vars.missing}}")])
        .unwrap_err();
    assert!(matches!(err, PipelineError::Substitution { .. }));
}

/// Unknown step kinds fail when their fragment cannot be found
#[test]
fn test_missing_fragment() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let loader = DirectoryLoader::new(dir.path());

    let step = Step {
        uses: Some("autoconf/configure".to_string()),
        ..Default::default()
    };
    let err = Compiler::new(&loader).compile_pipeline(&pb, &[step]).unwrap_err();
    assert!(matches!(err, PipelineError::Fragment(_)));
}

/// A fragment forwarding its own input to a nested step resolves it once
#[tokio::test]
async fn test_forwarded_input_reaches_nested_step() {
    let pb = build_for(RECIPE);
    let dir = fragments();
    let loader = DirectoryLoader::new(dir.path());
    let step = Step {
        uses: Some("mirrored-checkout".to_string()),
        with: [("repository".to_string(), "https://example.com/x.git".to_string())]
            .into_iter()
            .collect(),
        ..Default::default()
    };

    for _ in 0..20 {
        let steps = Compiler::new(&loader)
            .compile_pipeline(&pb, std::slice::from_ref(&step))
            .unwrap();

        let checkout = &steps[0].pipeline[0];
        assert_eq!(
            checkout.external_refs[0].qualifiers.get("vcs_url").unwrap(),
            "git+https://example.com/x.git/mirror"
        );

        let runner = pipeline_runner(FakeRunner::new());
        runner
            .run_pipelines(&CancellationToken::new(), &steps)
            .await
            .unwrap();
        let fragments = runner.runner().fragments();
        assert_eq!(
            fragments.last().unwrap(),
            "git clone --branch v1 https://example.com/x.git/mirror ."
        );
        assert!(!runner.runner().scripts().iter().any(|s| s.contains("${{")));
    }
}
