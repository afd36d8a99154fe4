//! Recovers Bing searches from URLs in history and cache.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

use super::helpers;

lazy_static! {
    static ref SEARCH_URL_PATTERN: Regex =
        Regex::new(r"https?://.*bing.*?\.[A-z]{2,3}/search").unwrap();
}

fn bing_search_urls(
    profile: &dyn BrowserProfile,
    _log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for history_rec in profile.iterate_history_records(Some(&SEARCH_URL_PATTERN)) {
        results.push(json!({
            "timestamp": history_rec.visit_time.map(|t| t.to_rfc3339()),
            "search term": helpers::query_param(&history_rec.url, "q"),
            "original url": history_rec.url,
            "source": "history",
            "location": history_rec.record_location,
        }));
    }

    for cache_rec in profile.iterate_cache(Some(&SEARCH_URL_PATTERN)) {
        results.push(json!({
            "timestamp": cache_rec
                .metadata
                .as_ref()
                .and_then(|m| m.request_time)
                .map(|t| t.to_rfc3339()),
            "search term": helpers::query_param(&cache_rec.url, "q"),
            "original url": cache_rec.url,
            "source": "cache",
            "location": cache_rec.data_location,
        }));
    }

    results.sort_by(|a, b| {
        a["timestamp"]
            .as_str()
            .unwrap_or("")
            .cmp(b["timestamp"].as_str().unwrap_or(""))
    });
    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![ArtifactSpec {
        service: "Bing",
        name: "Bing searches",
        description: "Recovers Bing searches from URLs in history, cache",
        version: "0.2",
        extract: bing_search_urls,
        presentation: ReportPresentation::Table,
    }]
}
