//! Recovers Google searches from history, cache and session storage.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

use super::helpers;

lazy_static! {
    static ref SEARCH_URL_PATTERN: Regex =
        Regex::new(r"https?://.*google.*?\.[A-z]{2,3}/search").unwrap();
    static ref SESSION_HOST_PATTERN: Regex = Regex::new(r"^https://www\.google").unwrap();
    static ref SESSION_KEY_PATTERN: Regex = Regex::new(r"^hsb;").unwrap();
}

fn google_search_urls(
    profile: &dyn BrowserProfile,
    log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for history_rec in profile.iterate_history_records(Some(&SEARCH_URL_PATTERN)) {
        let search_term = match helpers::query_param(&history_rec.url, "q") {
            Some(term) => term,
            None => continue,
        };
        results.push(json!({
            "source": "History",
            "location": history_rec.record_location,
            "domain": helpers::hostname(&history_rec.url),
            "timestamp": history_rec.visit_time.map(|t| t.to_rfc3339()),
            "search term": search_term,
        }));
    }

    for cache_rec in profile.iterate_cache(Some(&SEARCH_URL_PATTERN)) {
        let search_term = match helpers::query_param(&cache_rec.url, "q") {
            Some(term) => term,
            None => continue,
        };
        results.push(json!({
            "source": "Cache URLs",
            "location": cache_rec.data_location,
            "domain": helpers::hostname(&cache_rec.url),
            "timestamp": cache_rec
                .metadata
                .as_ref()
                .and_then(|m| m.request_time)
                .map(|t| t.to_rfc3339()),
            "search term": search_term,
        }));
    }

    // "hsb" session storage records hold the search URL in a JSON blob
    // behind a "<prefix>_" marker; the key carries a millisecond
    // timestamp after ";;".
    for sess_rec in
        profile.iterate_session_storage(Some(&SESSION_HOST_PATTERN), Some(&SESSION_KEY_PATTERN))
    {
        let payload = match sess_rec.value.split_once('_') {
            Some((_, payload)) => payload,
            None => continue,
        };
        let hsb_obj: Value = match serde_json::from_str(payload) {
            Ok(obj) => obj,
            Err(e) => {
                log.message(&format!(
                    "WARNING: could not parse hsb record at {}: {}",
                    sess_rec.record_location, e
                ));
                continue;
            }
        };

        let search_term = hsb_obj
            .get("url")
            .and_then(Value::as_str)
            .and_then(|url| helpers::query_param(url, "q"));
        let search_term = match search_term {
            Some(term) => term,
            None => continue,
        };

        let timestamp = sess_rec
            .key
            .split_once(";;")
            .and_then(|(_, raw)| raw.parse::<i64>().ok())
            .and_then(helpers::datetime_from_unix_ms);

        results.push(json!({
            "source": "Session Storage",
            "location": sess_rec.record_location,
            "domain": helpers::hostname(&sess_rec.host),
            "timestamp": timestamp.map(|t| t.to_rfc3339()),
            "search term": search_term,
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
        service: "Google",
        name: "Google searches",
        description: "Recovers google searches from URLs in history, session storage, cache",
        version: "0.4",
        extract: google_search_urls,
        presentation: ReportPresentation::Table,
    }]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FixtureProfile;
    use tempfile::TempDir;

    #[test]
    fn test_search_sources_combined() {
        let hsb_value = format!(
            "w_{}",
            json!({"url": "https://www.google.com/search?q=session+term"})
        );
        let profile = FixtureProfile::new()
            .with_history_record(
                "https://www.google.com/search?q=history+term",
                Some("history term - Google Search"),
                None,
            )
            .with_cache_record("https://www.google.com/search?q=cache+term", b"", vec![])
            .with_session_record(
                "https://www.google.com",
                "hsb;;1700000000000",
                &hsb_value,
                41,
            )
            .with_history_record("https://www.google.com/maps", None, None);

        let tmp = TempDir::new().unwrap();
        let mut storage = ArtifactStorage::new(tmp.path(), "files");
        let log = PluginLog::for_artifact("Google searches");

        let result = google_search_urls(&profile, &log, &mut storage).unwrap();
        assert_eq!(result.len(), 3);

        let terms: Vec<&str> = result
            .records()
            .iter()
            .map(|r| r["search term"].as_str().unwrap())
            .collect();
        assert!(terms.contains(&"history term"));
        assert!(terms.contains(&"cache term"));
        assert!(terms.contains(&"session term"));

        let session_rec = result
            .records()
            .iter()
            .find(|r| r["source"] == "Session Storage")
            .unwrap();
        assert_eq!(session_rec["timestamp"], "2023-11-14T22:13:20+00:00");
        assert_eq!(session_rec["domain"], "www.google.com");
    }
}
