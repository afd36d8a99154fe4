//! Recovers Dropbox user activity, browsed paths and file thumbnails.

use std::collections::BTreeSet;
use std::io::Write;

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

use super::helpers;

lazy_static! {
    static ref SESSION_HOST_PATTERN: Regex = Regex::new(r"dropbox\.com").unwrap();
    static ref SESSION_KEY_PATTERN: Regex = Regex::new(r"^uxa").unwrap();
    static ref HOME_URL_PATTERN: Regex = Regex::new(r"dropbox\.com/home").unwrap();
    static ref THUMBNAIL_URL_PATTERN: Regex =
        Regex::new(r"https://previews\.dropbox\.com/p/thumb/").unwrap();
    static ref CONTENT_DISPOSITION_FILENAME: Regex =
        Regex::new(r#"filename="(.+?)""#).unwrap();
}

fn uxa_records(
    profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for rec in
        profile.iterate_session_storage(Some(&SESSION_HOST_PATTERN), Some(&SESSION_KEY_PATTERN))
    {
        let record = match rec.key.as_str() {
            "uxa.last_active_time" => rec.value.parse::<i64>().ok().map(|ms| {
                json!({
                    "sequence": rec.sequence_number,
                    "record type": "last active time",
                    "timestamp": helpers::datetime_from_unix_ms(ms).map(|t| t.to_rfc3339()),
                })
            }),
            "uxa.inaniframe.last_active_time" => rec.value.parse::<i64>().ok().map(|ms| {
                json!({
                    "sequence": rec.sequence_number,
                    "record type": "in ani frame last active time",
                    "timestamp": helpers::datetime_from_unix_ms(ms).map(|t| t.to_rfc3339()),
                })
            }),
            "uxa.visit_id" => Some(json!({
                "sequence": rec.sequence_number,
                "record type": "visit id",
                "visit id": rec.value,
            })),
            "uxa.previous_url" => Some(json!({
                "sequence": rec.sequence_number,
                "record type": "previous url",
                "previous url": rec.value,
            })),
            "uxa.clicked_link" => serde_json::from_str::<Value>(&rec.value).ok().map(|obj| {
                json!({
                    "sequence": rec.sequence_number,
                    "record type": "clicked link",
                    "visit id": obj.get("visit_id"),
                    "url": obj.get("origin_href"),
                    "time on page": obj.get("time on page"),
                    "previous url": obj.get("url"),
                })
            }),
            _ => None,
        };

        if let Some(record) = record {
            results.push(record);
        }
    }

    results.sort_by_key(|rec| rec["sequence"].as_u64().unwrap_or(0));
    Ok(results.into())
}

fn recovered_file_system(
    profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    // Example url: https://www.dropbox.com/home/Alpha/Bravo?preview=report.pdf
    let mut paths = BTreeSet::new();

    for rec in profile.iterate_history_records(Some(&HOME_URL_PATTERN)) {
        let path = match rec.url.split_once("/home/") {
            Some((_, path)) => path,
            None => continue,
        };

        match path.split_once("?preview=") {
            Some((folder, file_name)) => {
                let folder = helpers::percent_decode(folder);
                paths.insert(format!("{}/{}", folder, helpers::percent_decode(file_name)));
                paths.insert(folder);
            }
            None => {
                paths.insert(helpers::percent_decode(path));
            }
        }
    }

    Ok(paths
        .into_iter()
        .map(|path| json!({ "path": path }))
        .collect::<Vec<_>>()
        .into())
}

fn thumbnails(
    profile: &dyn BrowserProfile,
    log: &PluginLog,
    storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for (idx, rec) in profile.iterate_cache(Some(&THUMBNAIL_URL_PATTERN)).enumerate() {
        let cache_filename = rec
            .metadata
            .as_ref()
            .and_then(|m| m.attribute("content-disposition").first().copied())
            .and_then(|disposition| {
                CONTENT_DISPOSITION_FILENAME
                    .captures(disposition)
                    .and_then(|captures| captures.get(1))
                    .map(|m| m.as_str().to_string())
            })
            .unwrap_or_else(|| "thumbnail".to_string());

        let mut file_out = storage.binary_stream(&format!("{}_{}", idx, cache_filename))?;
        file_out.write_all(&rec.data)?;
        let reference = file_out.location_reference().to_string();
        file_out.close()?;

        log.message(&format!("Exporting thumbnail to: {}", reference));

        results.push(json!({
            "url": rec.url,
            "cache request time": rec
                .metadata
                .as_ref()
                .and_then(|m| m.request_time)
                .map(|t| t.to_rfc3339()),
            "cache response time": rec
                .metadata
                .as_ref()
                .and_then(|m| m.response_time)
                .map(|t| t.to_rfc3339()),
            "extracted file reference": reference,
        }));
    }

    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![
        ArtifactSpec {
            service: "Dropbox",
            name: "Dropbox Session Storage User Activity",
            description: "Recovers user activity from 'uxa' records in Session Storage",
            version: "0.1",
            extract: uxa_records,
            presentation: ReportPresentation::Table,
        },
        ArtifactSpec {
            service: "Dropbox",
            name: "Dropbox File System",
            description: "Recovers a partial file system from URLs in the history",
            version: "0.1",
            extract: recovered_file_system,
            presentation: ReportPresentation::Table,
        },
        ArtifactSpec {
            service: "Dropbox",
            name: "Dropbox Thumbnails",
            description: "Recovers thumbnails for files stored in Dropbox",
            version: "0.1",
            extract: thumbnails,
            presentation: ReportPresentation::Table,
        },
    ]
}
