//! Run configuration: which registered artifacts a run executes.
//!
//! There is no implicit global state here: the registry is loaded from
//! an explicit module table and this config narrows it per run.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::errors::TriageError;
use crate::registry::PluginRegistry;

/// Optional YAML run configuration.
///
/// `include` empty means "run everything registered"; `exclude` is
/// subtracted afterwards. Names in either list must exist in the
/// catalog; a typo should fail the run before any work starts, not
/// silently run the wrong set.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunConfig {
    #[serde(default)]
    pub include: Vec<String>,
    #[serde(default)]
    pub exclude: Vec<String>,
}

impl RunConfig {
    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: RunConfig =
            serde_yaml::from_str(&content).context("Failed to parse YAML config")?;

        debug!("Loaded run configuration from {}", path.display());
        Ok(config)
    }

    /// Resolve the artifact names this run should execute, validated
    /// against the catalog.
    pub fn selected_artifacts(&self, registry: &PluginRegistry) -> Result<Vec<String>, TriageError> {
        for name in self.include.iter().chain(self.exclude.iter()) {
            if !registry.contains(name) {
                return Err(TriageError::UnknownArtifact(name.clone()));
            }
        }

        let candidates: Vec<String> = if self.include.is_empty() {
            registry.all().map(|a| a.spec.name.to_string()).collect()
        } else {
            self.include.clone()
        };

        Ok(candidates
            .into_iter()
            .filter(|name| !self.exclude.contains(name))
            .collect())
    }
}
