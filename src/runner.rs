//! The orchestrator: runs registered artifacts against the profile and
//! streams envelopes back in completion order.
//!
//! Extraction functions are synchronous, so each invocation is dispatched
//! onto a blocking worker thread; a semaphore caps how many run at once.
//! One failing (or panicking) plugin is folded into its own failed
//! envelope and never takes the rest of the run down.

use std::cmp;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{info, warn};
use tokio::sync::{mpsc, Semaphore};

use crate::errors::TriageError;
use crate::models::{ArtifactSpec, PluginLog, ResultEnvelope};
use crate::profile::ProfileOpener;
use crate::registry::PluginRegistry;
use crate::storage::{sanitize_filename, ArtifactStorage};

/// Hard cap on concurrently running extractions, whatever the host's
/// core count.
const MAX_CONCURRENT_EXTRACTIONS: usize = 32;

/// Runs extraction units from a loaded catalog against a profile.
pub struct ArtifactRunner {
    registry: Arc<PluginRegistry>,
    opener: ProfileOpener,
    output_root: PathBuf,
}

impl ArtifactRunner {
    /// `opener` is called once per invocation so no two extractions ever
    /// share a profile handle; `output_root` is the report tree under
    /// which each artifact gets its own storage namespace.
    pub fn new(registry: Arc<PluginRegistry>, opener: ProfileOpener, output_root: &Path) -> Self {
        Self {
            registry,
            opener,
            output_root: output_root.to_path_buf(),
        }
    }

    /// Run every catalog entry. The receiver yields exactly one envelope
    /// per entry, in completion order, and closes once all invocations
    /// have finished. Dropping the receiver abandons the stream but
    /// already-started invocations still run to completion.
    pub fn run_all(&self) -> mpsc::UnboundedReceiver<ResultEnvelope> {
        let specs: Vec<ArtifactSpec> = self.registry.all().map(|a| a.spec.clone()).collect();
        self.spawn_invocations(specs)
    }

    /// Run a named subset of the catalog. Fails up front with
    /// `UnknownArtifact` if any name is not registered.
    pub fn run_subset(
        &self,
        names: &[String],
    ) -> Result<mpsc::UnboundedReceiver<ResultEnvelope>, TriageError> {
        let mut specs = Vec::with_capacity(names.len());
        for name in names {
            specs.push(self.registry.get(name)?.spec.clone());
        }
        Ok(self.spawn_invocations(specs))
    }

    /// Run a single named artifact to completion.
    pub async fn run_one(&self, name: &str) -> Result<ResultEnvelope, TriageError> {
        let spec = self.registry.get(name)?.spec.clone();
        Ok(run_invocation(spec, Arc::clone(&self.opener), self.output_root.clone()).await)
    }

    fn spawn_invocations(
        &self,
        specs: Vec<ArtifactSpec>,
    ) -> mpsc::UnboundedReceiver<ResultEnvelope> {
        let (tx, rx) = mpsc::unbounded_channel();
        let max_concurrent = cmp::min(num_cpus::get() * 2, MAX_CONCURRENT_EXTRACTIONS);
        let semaphore = Arc::new(Semaphore::new(max_concurrent));

        for spec in specs {
            let tx = tx.clone();
            let semaphore = Arc::clone(&semaphore);
            let opener = Arc::clone(&self.opener);
            let output_root = self.output_root.clone();

            tokio::spawn(async move {
                let _permit = semaphore.acquire_owned().await.unwrap();
                let envelope = run_invocation(spec, opener, output_root).await;
                // A dropped receiver just means nobody is listening; the
                // invocation itself already ran to completion.
                let _ = tx.send(envelope);
            });
        }

        rx
    }
}

async fn run_invocation(
    spec: ArtifactSpec,
    opener: ProfileOpener,
    output_root: PathBuf,
) -> ResultEnvelope {
    info!("Running artifact: {}", spec.name);

    let blocking_spec = spec.clone();
    match tokio::task::spawn_blocking(move || extract_blocking(blocking_spec, opener, output_root))
        .await
    {
        Ok(envelope) => envelope,
        Err(e) => {
            let message = if e.is_panic() {
                "extraction panicked".to_string()
            } else {
                format!("extraction task aborted: {}", e)
            };
            warn!("Artifact {} failed: {}", spec.name, message);
            ResultEnvelope::failed(&spec, message)
        }
    }
}

/// One complete invocation: fresh profile handle, fresh storage scope,
/// call the extraction function, wrap the outcome. Runs on a worker
/// thread so a long extraction cannot starve the scheduler.
fn extract_blocking(spec: ArtifactSpec, opener: ProfileOpener, output_root: PathBuf) -> ResultEnvelope {
    let service_dir = output_root.join(sanitize_filename(spec.service));
    let folder_name = format!("{}_files", sanitize_filename(spec.name));
    let mut storage = ArtifactStorage::new(&service_dir, &folder_name);
    let log = PluginLog::for_artifact(spec.name);

    // The profile handle lives exactly as long as this call; it is
    // dropped on success and failure alike.
    let outcome =
        (opener)().and_then(|profile| (spec.extract)(profile.as_ref(), &log, &mut storage));

    match outcome {
        Ok(result) => {
            info!("Results acquired for {} ({} records)", spec.name, result.len());
            ResultEnvelope::completed(&spec, result)
        }
        Err(e) => {
            warn!("Artifact {} failed: {:#}", spec.name, e);
            ResultEnvelope::failed(&spec, format!("{:#}", e))
        }
    }
}
