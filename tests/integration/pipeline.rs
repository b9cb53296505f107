//! Pipeline integration tests.
//!
//! Tests that verify the complete flow from a YAML pipeline file to real
//! subprocesses and file removals.

use jobpool::{ConfigError, JobState, PipelineBuilder, PipelineLoader};
use std::io::Write;

fn write_pipeline(dir: &tempfile::TempDir, yaml: &str) -> std::path::PathBuf {
    let path = dir.path().join("pipeline.yaml");
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(yaml.as_bytes()).unwrap();
    path
}

#[tokio::test]
async fn test_create_then_remove_file() {
    let dir = tempfile::tempdir().unwrap();
    let target = dir.path().join("canvas.txt");
    let yaml = format!(
        r#"
max_concurrency: 2
jobs:
  - id: canvas
    type: command
    command: sh
    args: ["-c", "echo white > canvas.txt"]
    working_dir: {dir}
  - id: check
    type: command
    command: test
    args: ["-f", "{target}"]
    after: [canvas]
  - id: cleanup
    type: remove_file
    path: {target}
    after: [check]
"#,
        dir = dir.path().display(),
        target = target.display(),
    );
    let path = write_pipeline(&dir, &yaml);

    let config = PipelineLoader::load(&path).unwrap();
    let (handle, task) = PipelineBuilder::scheduler(&config).unwrap().start();
    let jobs = PipelineBuilder::register(&config, &handle).await.unwrap();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();

    assert_eq!(jobs.len(), 3);
    assert!(!target.exists());
}

#[tokio::test]
async fn test_failing_command_skips_cleanup() {
    let dir = tempfile::tempdir().unwrap();
    let keep = dir.path().join("keep.txt");
    std::fs::write(&keep, "data").unwrap();
    let yaml = format!(
        r#"
jobs:
  - id: broken
    type: command
    command: "false"
  - id: cleanup
    type: remove_file
    path: {keep}
    after: [broken]
"#,
        keep = keep.display(),
    );

    let config = PipelineLoader::parse(&yaml).unwrap();
    let (handle, task) = PipelineBuilder::scheduler(&config).unwrap().start();
    let jobs = PipelineBuilder::register(&config, &handle).await.unwrap();
    let cleanup = jobs["cleanup"].clone();

    let snapshot = crate::common::wait_for_state(
        &cleanup,
        JobState::Closed,
        std::time::Duration::from_secs(5),
    )
    .await;
    assert!(snapshot.failed());

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
    assert!(keep.exists());
}

#[tokio::test]
async fn test_success_codes_allow_nonzero_exit() {
    let yaml = r#"
jobs:
  - id: grep_nothing
    type: command
    command: sh
    args: ["-c", "exit 1"]
    success_codes: [0, 1]
"#;

    let config = PipelineLoader::parse(yaml).unwrap();
    let (handle, task) = PipelineBuilder::scheduler(&config).unwrap().start();
    PipelineBuilder::register(&config, &handle).await.unwrap();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_environment_reaches_command() {
    let dir = tempfile::tempdir().unwrap();
    let yaml = format!(
        r#"
jobs:
  - id: env_check
    type: command
    command: sh
    args: ["-c", "test \"$GREETING\" = hello"]
    environment:
      GREETING: hello
    working_dir: {dir}
"#,
        dir = dir.path().display(),
    );

    let config = PipelineLoader::parse(&yaml).unwrap();
    let (handle, task) = PipelineBuilder::scheduler(&config).unwrap().start();
    PipelineBuilder::register(&config, &handle).await.unwrap();

    assert!(handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_missing_program_fails_job() {
    let yaml = r#"
jobs:
  - id: ghost
    type: command
    command: definitely-not-a-real-program-jobpool
"#;

    let config = PipelineLoader::parse(yaml).unwrap();
    let (handle, task) = PipelineBuilder::scheduler(&config).unwrap().start();
    PipelineBuilder::register(&config, &handle).await.unwrap();

    assert!(!handle.shutdown().await.unwrap());
    task.await.unwrap().unwrap();
}

#[test]
fn test_forward_reference_rejected_before_running() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_pipeline(
        &dir,
        r#"
jobs:
  - id: a
    type: command
    command: "true"
    after: [b]
  - id: b
    type: command
    command: "true"
"#,
    );

    let err = PipelineLoader::load(&path).unwrap_err();
    assert!(matches!(err, ConfigError::UnknownDependency { .. }));
}
