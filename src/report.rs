//! Report generation: envelopes in, per-service report files out.
//!
//! Layout: one directory per service under the output root, one JSON
//! report per artifact, plus a CSV companion for table-presentation
//! artifacts and a `run_summary.json` covering the whole run.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use log::info;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::{ExtractionOutcome, ReportPresentation, ResultEnvelope};
use crate::storage::sanitize_filename;

/// The serializable report document for a completed envelope; `None` for
/// failed envelopes, which get no report file.
pub fn document_for(envelope: &ResultEnvelope) -> Option<Value> {
    match &envelope.outcome {
        ExtractionOutcome::Completed(result) => Some(json!({
            "artifact_service": envelope.service,
            "artifact_name": envelope.name,
            "artifact_version": envelope.version,
            "artifact_description": envelope.description,
            "result": result,
        })),
        ExtractionOutcome::Failed(_) => None,
    }
}

/// Write the report file(s) for one envelope. Empty results and failures
/// produce nothing; the returned list holds whatever paths were written.
pub fn write_reports(output_root: &Path, envelope: &ResultEnvelope) -> Result<Vec<PathBuf>> {
    let result = match &envelope.outcome {
        ExtractionOutcome::Completed(result) => result,
        ExtractionOutcome::Failed(_) => return Ok(Vec::new()),
    };

    if result.is_empty() {
        info!("{} had no results, skipping", envelope.name);
        return Ok(Vec::new());
    }

    let service_dir = output_root.join(sanitize_filename(&envelope.service));
    std::fs::create_dir_all(&service_dir)
        .with_context(|| format!("Failed to create report directory {}", service_dir.display()))?;

    let base_name = sanitize_filename(&envelope.name);
    let mut written = Vec::new();

    let json_path = service_dir.join(format!("{}.json", base_name));
    info!("Generating output at {}", json_path.display());
    let document = document_for(envelope).context("Envelope has no document")?;
    let file = File::create(&json_path)
        .with_context(|| format!("Failed to create report file {}", json_path.display()))?;
    serde_json::to_writer_pretty(BufWriter::new(file), &document)
        .context("Failed to serialize report document")?;
    written.push(json_path);

    if envelope.presentation == ReportPresentation::Table {
        let csv_path = service_dir.join(format!("{}.csv", base_name));
        info!("Generating csv output at {}", csv_path.display());
        let file = File::create(&csv_path)
            .with_context(|| format!("Failed to create report file {}", csv_path.display()))?;
        let mut out = BufWriter::new(file);
        write_csv(&mut out, result.records())?;
        out.flush()?;
        written.push(csv_path);
    }

    Ok(written)
}

/// Tabular rendering of record objects: header is the union of record
/// keys in first-seen order, one row per record.
pub fn write_csv<W: Write>(out: &mut W, records: &[Value]) -> Result<()> {
    let fields = field_union(records);
    write_csv_row(out, fields.iter().map(String::as_str))?;

    for record in records {
        let object = match record.as_object() {
            Some(object) => object,
            None => continue,
        };
        let row: Vec<String> = fields
            .iter()
            .map(|field| object.get(field).map(csv_cell).unwrap_or_default())
            .collect();
        write_csv_row(out, row.iter().map(String::as_str))?;
    }
    Ok(())
}

fn field_union(records: &[Value]) -> Vec<String> {
    let mut fields: Vec<String> = Vec::new();
    for record in records {
        if let Some(object) = record.as_object() {
            for key in object.keys() {
                if !fields.iter().any(|f| f == key) {
                    fields.push(key.clone());
                }
            }
        }
    }
    fields
}

fn csv_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn write_csv_row<'a, W: Write>(out: &mut W, row: impl Iterator<Item = &'a str>) -> Result<()> {
    let escaped: Vec<String> = row.map(csv_escape).collect();
    writeln!(out, "{}", escaped.join(","))?;
    Ok(())
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

/// Per-artifact status line recorded into the run summary.
#[derive(Debug, serde::Serialize)]
struct ArtifactStatus {
    service: String,
    name: String,
    status: &'static str,
    records: usize,
    error: Option<String>,
}

/// Accumulates the outcome of a whole run and writes
/// `run_summary.json` at the output root.
pub struct RunSummary {
    run_id: String,
    profile_folder: PathBuf,
    started: DateTime<Utc>,
    statuses: Vec<ArtifactStatus>,
}

impl RunSummary {
    pub fn new(profile_folder: &Path) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            profile_folder: profile_folder.to_path_buf(),
            started: Utc::now(),
            statuses: Vec::new(),
        }
    }

    pub fn record(&mut self, envelope: &ResultEnvelope) {
        let status = match &envelope.outcome {
            ExtractionOutcome::Completed(result) if result.is_empty() => ArtifactStatus {
                service: envelope.service.clone(),
                name: envelope.name.clone(),
                status: "empty",
                records: 0,
                error: None,
            },
            ExtractionOutcome::Completed(result) => ArtifactStatus {
                service: envelope.service.clone(),
                name: envelope.name.clone(),
                status: "completed",
                records: result.len(),
                error: None,
            },
            ExtractionOutcome::Failed(message) => ArtifactStatus {
                service: envelope.service.clone(),
                name: envelope.name.clone(),
                status: "failed",
                records: 0,
                error: Some(message.clone()),
            },
        };
        self.statuses.push(status);
    }

    pub fn failed_count(&self) -> usize {
        self.statuses.iter().filter(|s| s.status == "failed").count()
    }

    pub fn write(&self, output_root: &Path) -> Result<PathBuf> {
        let summary = json!({
            "run_id": self.run_id,
            "tool_version": env!("CARGO_PKG_VERSION"),
            "profile_folder": self.profile_folder.to_string_lossy(),
            "started": self.started.to_rfc3339(),
            "finished": Utc::now().to_rfc3339(),
            "artifact_count": self.statuses.len(),
            "failed_count": self.failed_count(),
            "artifacts": self.statuses,
        });

        let summary_path = output_root.join("run_summary.json");
        let serialized = serde_json::to_string_pretty(&summary)
            .context("Failed to serialize run summary to JSON")?;
        std::fs::write(&summary_path, serialized)
            .context("Failed to write run summary")?;

        info!("Run summary written to {}", summary_path.display());
        Ok(summary_path)
    }
}
