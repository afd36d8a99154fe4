//! Shared fixtures for integration tests: an inert profile and a small
//! catalog of synthetic plugins covering the success, empty, failing and
//! panicking cases.

use std::io::Write;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use anyhow::anyhow;
use regex::Regex;
use serde_json::json;

use browser_triage::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use browser_triage::profile::{
    BrowserProfile, CacheRecord, HistoryRecord, ProfileOpener, SessionStorageRecord,
};
use browser_triage::registry::PluginModule;
use browser_triage::storage::ArtifactStorage;

/// A profile whose stores are all empty; the synthetic plugins below
/// fabricate their own records.
pub struct EmptyProfile;

impl BrowserProfile for EmptyProfile {
    fn iterate_cache<'a>(
        &'a self,
        _url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = CacheRecord> + 'a> {
        Box::new(std::iter::empty())
    }

    fn iterate_history_records<'a>(
        &'a self,
        _url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = HistoryRecord> + 'a> {
        Box::new(std::iter::empty())
    }

    fn iterate_session_storage<'a>(
        &'a self,
        _host: Option<&'a Regex>,
        _key: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = SessionStorageRecord> + 'a> {
        Box::new(std::iter::empty())
    }
}

pub fn empty_profile_opener() -> ProfileOpener {
    Arc::new(|| Ok(Box::new(EmptyProfile) as Box<dyn BrowserProfile>))
}

/// Counts completed invocations across all fixture plugins, so tests can
/// observe that abandoned runs still finish.
pub static INVOCATIONS: AtomicUsize = AtomicUsize::new(0);

fn extract_records_and_file(
    _profile: &dyn BrowserProfile,
    log: &PluginLog,
    storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut out = storage.binary_stream("thumb.bin")?;
    out.write_all(b"fixture-bytes")?;
    let reference = out.location_reference().to_string();
    out.close()?;
    log.message(&format!("exported {}", reference));

    INVOCATIONS.fetch_add(1, Ordering::SeqCst);
    Ok(vec![
        json!({"n": 1, "file": reference}),
        json!({"n": 2}),
        json!({"n": 3}),
    ]
    .into())
}

fn extract_nothing(
    _profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    INVOCATIONS.fetch_add(1, Ordering::SeqCst);
    Ok(ArtifactResult::new())
}

fn extract_error(
    _profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    INVOCATIONS.fetch_add(1, Ordering::SeqCst);
    Err(anyhow!("synthetic extraction failure"))
}

fn extract_panic(
    _profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    INVOCATIONS.fetch_add(1, Ordering::SeqCst);
    panic!("synthetic extraction panic");
}

pub fn module_x() -> Vec<ArtifactSpec> {
    vec![ArtifactSpec {
        service: "X",
        name: "Records and file",
        description: "Produces three records and one exported file",
        version: "1.0",
        extract: extract_records_and_file,
        presentation: ReportPresentation::Table,
    }]
}

pub fn module_y() -> Vec<ArtifactSpec> {
    vec![ArtifactSpec {
        service: "Y",
        name: "Empty result",
        description: "Produces no records",
        version: "1.0",
        extract: extract_nothing,
        presentation: ReportPresentation::Table,
    }]
}

pub fn module_broken() -> Vec<ArtifactSpec> {
    vec![
        ArtifactSpec {
            service: "Broken",
            name: "Erroring unit",
            description: "Always fails",
            version: "1.0",
            extract: extract_error,
            presentation: ReportPresentation::Table,
        },
        ArtifactSpec {
            service: "Broken",
            name: "Panicking unit",
            description: "Always panics",
            version: "1.0",
            extract: extract_panic,
            presentation: ReportPresentation::Table,
        },
    ]
}

pub fn fixture_modules() -> Vec<PluginModule> {
    vec![
        PluginModule {
            path: "tests/module_x.rs",
            artifacts: module_x,
        },
        PluginModule {
            path: "tests/module_y.rs",
            artifacts: module_y,
        },
        PluginModule {
            path: "tests/module_broken.rs",
            artifacts: module_broken,
        },
    ]
}
