//! Error taxonomy for the triage run lifecycle.
//!
//! Startup conditions (profile/output validation, catalog duplicate
//! detection) are fatal and abort before any side effects occur.
//! Per-invocation conditions are isolated to the failing artifact and
//! folded into its result envelope.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TriageError {
    /// The profile folder is missing or not a directory. Fatal, raised
    /// before any work begins.
    #[error("profile folder {} does not exist or is not a directory", .0.display())]
    InvalidProfile(PathBuf),

    /// The output folder already exists. Fatal, raised before any work
    /// begins; a run never writes into a pre-existing report tree.
    #[error("output folder {} already exists", .0.display())]
    OutputAlreadyExists(PathBuf),

    /// Two registered descriptors share an artifact name. Fatal at load
    /// time; the process must not run with an ambiguous catalog.
    #[error("duplicate artifact name '{name}' (registered again by {origin})")]
    DuplicateArtifactName { name: String, origin: String },

    /// Lookup of an artifact name that is not in the catalog.
    #[error("unknown artifact '{0}'")]
    UnknownArtifact(String),

    /// An extraction function failed during its invocation. Recorded in
    /// that artifact's envelope; never aborts the run.
    #[error("extraction for '{name}' failed: {message}")]
    ExtractionFailure { name: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = TriageError::UnknownArtifact("Nope".to_string());
        assert_eq!(err.to_string(), "unknown artifact 'Nope'");

        let err = TriageError::DuplicateArtifactName {
            name: "Google searches".to_string(),
            origin: "plugins/google.rs".to_string(),
        };
        assert!(err.to_string().contains("Google searches"));
        assert!(err.to_string().contains("plugins/google.rs"));
    }
}
