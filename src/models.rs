//! Core data model: artifact descriptors, extraction results and the
//! envelopes the orchestrator streams back to the caller.

use log::info;
use serde::Serialize;
use serde_json::Value;

use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

/// How an artifact's records should be presented in reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPresentation {
    /// Flat records; a CSV companion report is generated alongside the JSON.
    Table,
    /// Nested or irregular records; JSON report only.
    Custom,
}

/// Extraction entry point exported by a plugin.
///
/// The function receives a fresh profile handle, a log sink and a storage
/// handle scoped to this artifact's own output namespace. It runs
/// synchronously; the orchestrator dispatches it onto a worker thread.
pub type ExtractFn =
    fn(&dyn BrowserProfile, &PluginLog, &mut ArtifactStorage) -> anyhow::Result<ArtifactResult>;

/// Immutable descriptor for one extraction unit.
///
/// Descriptors are static registrations: a plugin module exports an
/// `artifacts()` function returning its specs, and the registry owns them
/// for the life of the process.
#[derive(Debug, Clone)]
pub struct ArtifactSpec {
    /// Owning service/category, e.g. "Dropbox". Groups report files.
    pub service: &'static str,
    /// Artifact name, unique across the whole catalog.
    pub name: &'static str,
    pub description: &'static str,
    pub version: &'static str,
    pub extract: ExtractFn,
    pub presentation: ReportPresentation,
}

/// Ordered sequence of records produced by one extraction.
///
/// Each record is a JSON object whose schema is defined by the plugin,
/// not by the core. An empty result is legal and means "nothing found".
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct ArtifactResult {
    records: Vec<Value>,
}

impl ArtifactResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Records are JSON objects by convention
    /// (`serde_json::json!({..})`).
    pub fn push(&mut self, record: Value) {
        self.records.push(record);
    }

    pub fn records(&self) -> &[Value] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl From<Vec<Value>> for ArtifactResult {
    fn from(records: Vec<Value>) -> Self {
        Self { records }
    }
}

/// Outcome of a single invocation. Failures are folded into the envelope
/// rather than aborting the run, so one broken plugin cannot take the
/// rest of the catalog down with it.
#[derive(Debug, Clone)]
pub enum ExtractionOutcome {
    Completed(ArtifactResult),
    Failed(String),
}

/// The metadata-wrapped result of running one extraction unit.
#[derive(Debug, Clone)]
pub struct ResultEnvelope {
    pub service: String,
    pub name: String,
    pub version: String,
    pub description: String,
    pub presentation: ReportPresentation,
    pub outcome: ExtractionOutcome,
}

impl ResultEnvelope {
    pub fn completed(spec: &ArtifactSpec, result: ArtifactResult) -> Self {
        Self::wrap(spec, ExtractionOutcome::Completed(result))
    }

    pub fn failed(spec: &ArtifactSpec, message: impl Into<String>) -> Self {
        Self::wrap(spec, ExtractionOutcome::Failed(message.into()))
    }

    fn wrap(spec: &ArtifactSpec, outcome: ExtractionOutcome) -> Self {
        Self {
            service: spec.service.to_string(),
            name: spec.name.to_string(),
            version: spec.version.to_string(),
            description: spec.description.to_string(),
            presentation: spec.presentation,
            outcome,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.outcome, ExtractionOutcome::Failed(_))
    }
}

/// Log sink handed to extraction functions.
///
/// Messages are tagged with the artifact name and forwarded to the
/// process-wide logger, so plugin output interleaves cleanly with the
/// orchestrator's own progress lines.
#[derive(Debug, Clone)]
pub struct PluginLog {
    artifact: String,
}

impl PluginLog {
    pub fn for_artifact(name: &str) -> Self {
        Self {
            artifact: name.to_string(),
        }
    }

    pub fn message(&self, message: &str) {
        info!("[{}] {}", self.artifact, message);
    }
}
