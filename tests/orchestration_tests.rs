//! Integration tests for the orchestrator: one envelope per catalog
//! entry, isolation of failing units, and the single-artifact path.

mod common;

use std::collections::HashSet;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::time::Duration;

use browser_triage::errors::TriageError;
use browser_triage::models::ExtractionOutcome;
use browser_triage::registry::PluginRegistry;
use browser_triage::runner::ArtifactRunner;
use tempfile::TempDir;

use common::{empty_profile_opener, fixture_modules, INVOCATIONS};

fn fixture_runner(output_root: &std::path::Path) -> ArtifactRunner {
    let registry = Arc::new(PluginRegistry::load(&fixture_modules()).unwrap());
    ArtifactRunner::new(registry, empty_profile_opener(), output_root)
}

#[tokio::test]
async fn test_run_all_yields_one_envelope_per_catalog_entry() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    let mut receiver = runner.run_all();
    let mut names = Vec::new();
    while let Some(envelope) = receiver.recv().await {
        names.push(envelope.name.clone());
    }

    // Bijection: every entry exactly once, failures included.
    assert_eq!(names.len(), 4);
    let unique: HashSet<&String> = names.iter().collect();
    assert_eq!(unique.len(), 4);
    assert!(names.iter().any(|n| n == "Records and file"));
    assert!(names.iter().any(|n| n == "Panicking unit"));
}

#[tokio::test]
async fn test_failing_units_do_not_terminate_the_stream() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    let mut receiver = runner.run_all();
    let mut completed = 0;
    let mut failed = Vec::new();
    while let Some(envelope) = receiver.recv().await {
        match &envelope.outcome {
            ExtractionOutcome::Completed(_) => completed += 1,
            ExtractionOutcome::Failed(message) => failed.push((envelope.name.clone(), message.clone())),
        }
    }

    assert_eq!(completed, 2);
    assert_eq!(failed.len(), 2);

    let erroring = failed.iter().find(|(name, _)| name == "Erroring unit").unwrap();
    assert!(erroring.1.contains("synthetic extraction failure"));
    let panicking = failed.iter().find(|(name, _)| name == "Panicking unit").unwrap();
    assert!(panicking.1.contains("panicked"));
}

#[tokio::test]
async fn test_envelope_metadata_matches_descriptor() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    let envelope = runner.run_one("Records and file").await.unwrap();
    assert_eq!(envelope.service, "X");
    assert_eq!(envelope.name, "Records and file");
    assert_eq!(envelope.version, "1.0");
    assert_eq!(
        envelope.description,
        "Produces three records and one exported file"
    );

    match envelope.outcome {
        ExtractionOutcome::Completed(result) => assert_eq!(result.len(), 3),
        other => panic!("unexpected outcome: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_one_unknown_artifact() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    match runner.run_one("No such artifact").await {
        Err(TriageError::UnknownArtifact(name)) => assert_eq!(name, "No such artifact"),
        other => panic!("unexpected result: {:?}", other),
    }
}

#[tokio::test]
async fn test_run_subset_validates_names_up_front() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    assert!(matches!(
        runner.run_subset(&["Records and file".to_string(), "Typo".to_string()]),
        Err(TriageError::UnknownArtifact(_))
    ));

    let mut receiver = runner
        .run_subset(&["Records and file".to_string()])
        .unwrap();
    let envelope = receiver.recv().await.unwrap();
    assert_eq!(envelope.name, "Records and file");
    assert!(receiver.recv().await.is_none());
}

#[tokio::test]
async fn test_exported_file_written_under_artifact_namespace() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    let envelope = runner.run_one("Records and file").await.unwrap();
    assert!(!envelope.is_failed());

    let exported = output
        .path()
        .join("X")
        .join("Records_and_file_files")
        .join("thumb.bin");
    assert_eq!(std::fs::read(exported).unwrap(), b"fixture-bytes");
}

#[tokio::test]
async fn test_abandoned_run_still_completes_invocations() {
    let output = TempDir::new().unwrap();
    let runner = fixture_runner(output.path());

    let before = INVOCATIONS.load(Ordering::SeqCst);
    let receiver = runner.run_all();
    drop(receiver);

    // All four fixture extractions bump the counter on entry. Poll
    // rather than assume scheduling.
    let mut waited = 0;
    while INVOCATIONS.load(Ordering::SeqCst) < before + 4 && waited < 100 {
        tokio::time::sleep(Duration::from_millis(20)).await;
        waited += 1;
    }
    assert!(INVOCATIONS.load(Ordering::SeqCst) >= before + 4);
}
