//! End-to-end report generation: envelopes from a full fixture run
//! turned into the on-disk report layout.

mod common;

use std::sync::Arc;

use browser_triage::registry::PluginRegistry;
use browser_triage::report::{self, RunSummary};
use browser_triage::runner::ArtifactRunner;
use serde_json::Value;
use tempfile::TempDir;

use common::{empty_profile_opener, fixture_modules};

/// The scenario from the fixture catalog: unit A (service "X") returns
/// three records and writes one file, unit B (service "Y") returns
/// nothing, and two units fail. One report lands under X/, nothing under
/// Y/, and the run summary records all four outcomes.
#[tokio::test]
async fn test_full_run_report_layout() {
    let output = TempDir::new().unwrap();
    let registry = Arc::new(PluginRegistry::load(&fixture_modules()).unwrap());
    let runner = ArtifactRunner::new(registry, empty_profile_opener(), output.path());

    let mut summary = RunSummary::new(std::path::Path::new("/fixture/profile"));
    let mut receiver = runner.run_all();
    while let Some(envelope) = receiver.recv().await {
        report::write_reports(output.path(), &envelope).unwrap();
        summary.record(&envelope);
    }
    summary.write(output.path()).unwrap();

    // Unit A: JSON + CSV report plus its exported file.
    let x_dir = output.path().join("X");
    let report_path = x_dir.join("Records_and_file.json");
    assert!(report_path.exists());
    assert!(x_dir.join("Records_and_file.csv").exists());
    assert!(x_dir.join("Records_and_file_files").join("thumb.bin").exists());

    let document: Value =
        serde_json::from_str(&std::fs::read_to_string(&report_path).unwrap()).unwrap();
    assert_eq!(document["artifact_service"], "X");
    assert_eq!(document["artifact_name"], "Records and file");
    assert_eq!(document["result"].as_array().unwrap().len(), 3);
    // Records reference the exported file by location string only.
    assert_eq!(
        document["result"][0]["file"],
        "Records_and_file_files/thumb.bin"
    );

    // Unit B produced nothing: no service directory at all.
    assert!(!output.path().join("Y").exists());

    // Failures produce no reports but are visible in the summary.
    assert!(!output.path().join("Broken").join("Erroring_unit.json").exists());

    let summary_doc: Value = serde_json::from_str(
        &std::fs::read_to_string(output.path().join("run_summary.json")).unwrap(),
    )
    .unwrap();
    assert_eq!(summary_doc["artifact_count"], 4);
    assert_eq!(summary_doc["failed_count"], 2);

    let statuses: Vec<(&str, &str)> = summary_doc["artifacts"]
        .as_array()
        .unwrap()
        .iter()
        .map(|a| {
            (
                a["name"].as_str().unwrap(),
                a["status"].as_str().unwrap(),
            )
        })
        .collect();
    assert!(statuses.contains(&("Records and file", "completed")));
    assert!(statuses.contains(&("Empty result", "empty")));
    assert!(statuses.contains(&("Erroring unit", "failed")));
    assert!(statuses.contains(&("Panicking unit", "failed")));
}
