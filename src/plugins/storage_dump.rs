//! Baseline dumps of whole profile stores, useful when no
//! service-specific plugin covers the data an examiner is after.

use serde_json::json;

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

fn dump_history(
    profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let results: Vec<_> = profile
        .iterate_history_records(None)
        .map(|rec| {
            json!({
                "record location": rec.record_location,
                "title": rec.title,
                "url": rec.url,
                "visit time": rec.visit_time.map(|t| t.to_rfc3339()),
            })
        })
        .collect();

    Ok(results.into())
}

fn dump_sessionstorage(
    profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let results: Vec<_> = profile
        .iterate_session_storage(None, None)
        .map(|rec| {
            json!({
                "record location": rec.record_location,
                "host": rec.host,
                "key": rec.key,
                "value": rec.value,
                "sequence": rec.sequence_number,
            })
        })
        .collect();

    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![
        ArtifactSpec {
            service: "Data Dump",
            name: "History",
            description: "Dumps History Records",
            version: "0.1",
            extract: dump_history,
            presentation: ReportPresentation::Table,
        },
        ArtifactSpec {
            service: "Data Dump",
            name: "Sessionstorage",
            description: "Dumps Sessionstorage Records",
            version: "0.1",
            extract: dump_sessionstorage,
            presentation: ReportPresentation::Table,
        },
    ]
}
