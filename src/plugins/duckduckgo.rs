//! Recovers DuckDuckGo searches from URLs in history and cache.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::json;

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

use super::helpers;

lazy_static! {
    // The "?t" query is at the start to omit misleading hits such as
    // partially written search terms.
    static ref SEARCH_URL_PATTERN: Regex =
        Regex::new(r"https?://.*duckduckgo.*?\.[A-z]{2,3}/\?t.*q=").unwrap();
    // Result-link requests also carry the search term and land in cache.
    static ref CACHE_URL_PATTERN: Regex = Regex::new(
        r"https?://links\.duckduckgo.*?\.[A-z]{2,3}/d\.js|https?://.*duckduckgo.*?\.[A-z]{2,3}/\?t.*q="
    )
    .unwrap();
}

fn ddg_search_urls(
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

    for cache_rec in profile.iterate_cache(Some(&CACHE_URL_PATTERN)) {
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

    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![ArtifactSpec {
        service: "Duckduckgo",
        name: "Duckduckgo searches",
        description: "Recovers Duckduckgo searches from URLs in history, cache",
        version: "0.2",
        extract: ddg_search_urls,
        presentation: ReportPresentation::Table,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FixtureProfile;
    use tempfile::TempDir;

    #[test]
    fn test_search_recovered_from_both_sources() {
        let profile = FixtureProfile::new()
            .with_history_record("https://duckduckgo.com/?t=h_&q=chromium+cache", None, None)
            .with_cache_record(
                "https://links.duckduckgo.com/d.js?q=chromium+cache&l=1",
                b"",
                vec![],
            )
            .with_history_record("https://duckduckgo.com/about", None, None);

        let tmp = TempDir::new().unwrap();
        let mut storage = ArtifactStorage::new(tmp.path(), "files");
        let log = PluginLog::for_artifact("Duckduckgo searches");

        let result = ddg_search_urls(&profile, &log, &mut storage).unwrap();
        assert_eq!(result.len(), 2);
        assert_eq!(result.records()[0]["search term"], "chromium cache");
        assert_eq!(result.records()[1]["source"], "cache");
    }
}
