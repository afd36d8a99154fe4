//! # browser-triage
//!
//! A plugin-driven framework for parsing website/webapp artifacts stored
//! in browser profile data.
//!
//! ## Overview
//!
//! browser-triage runs a catalog of independent artifact plugins against
//! a read-only browser profile. Each plugin recovers structured records
//! for one service (searches, chats, recovered files, ...) and can export
//! binary side-artifacts such as thumbnails. Results are persisted as one
//! report file per artifact, grouped by service.
//!
//! ## Architecture
//!
//! - plugins register immutable descriptors through an explicit module
//!   table; the registry validates name uniqueness once at startup;
//! - the runner executes every registered extraction concurrently on
//!   worker threads, opening a fresh profile handle per invocation and
//!   streaming result envelopes back in completion order;
//! - a per-invocation storage handle gives each plugin a collision-free,
//!   sanitized namespace for binary exports;
//! - report generation turns each envelope into a JSON document (plus a
//!   CSV companion for tabular artifacts) under the output folder.
//!
//! One plugin's failure is folded into its own envelope and never aborts
//! the rest of the run.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use browser_triage::plugins;
//! use browser_triage::profile::chromium::ChromiumProfileFolder;
//! use browser_triage::profile::{BrowserProfile, ProfileOpener};
//! use browser_triage::registry::PluginRegistry;
//! use browser_triage::runner::ArtifactRunner;
//!
//! # async fn example() -> anyhow::Result<()> {
//! let registry = Arc::new(PluginRegistry::load(&plugins::builtin_modules())?);
//!
//! let opener: ProfileOpener = Arc::new(|| {
//!     let profile = ChromiumProfileFolder::open("/profiles/Default".as_ref(), None)?;
//!     Ok(Box::new(profile) as Box<dyn BrowserProfile>)
//! });
//!
//! let runner = ArtifactRunner::new(registry, opener, "/tmp/report".as_ref());
//! let mut results = runner.run_all();
//! while let Some(envelope) = results.recv().await {
//!     println!("{}: {:?}", envelope.name, envelope.outcome);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`cli`]: Command-line interface definitions and argument parsing
//! - [`models`]: Descriptors, results, envelopes and the plugin log sink
//! - [`registry`]: Plugin registration and the artifact catalog
//! - [`runner`]: Concurrent orchestration of extraction invocations
//! - [`storage`]: Scoped binary-export storage for plugins
//! - [`report`]: Report document generation and run summaries
//! - [`profile`]: The profile reader boundary and the Chromium reader
//! - [`plugins`]: Built-in artifact plugins
//! - [`config`]: Run configuration (artifact include/exclude)
//! - [`errors`]: The error taxonomy for the run lifecycle

/// Command-line interface definitions and argument parsing
pub mod cli;

/// Run configuration: which registered artifacts a run executes
pub mod config;

/// Error taxonomy for startup and per-invocation failures
pub mod errors;

/// Core data model: descriptors, results and envelopes
pub mod models;

/// Built-in artifact plugins and the registration table
pub mod plugins;

/// The profile reader boundary and the built-in Chromium reader
pub mod profile;

/// Plugin registration and the artifact catalog
pub mod registry;

/// Report document generation and run summaries
pub mod report;

/// Concurrent orchestration of extraction invocations
pub mod runner;

/// Scoped binary-export storage for plugins
pub mod storage;

/// Test utilities and fixtures
#[cfg(test)]
pub mod test_utils;
