//! Recovers ChatGPT chat and account information from cache and history.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

use super::helpers;

lazy_static! {
    static ref CHAT_URL_PATTERN: Regex =
        Regex::new(r"https?://.*chatgpt.*?\.[A-z]{2,3}/c/[0-9a-fA-F\-]{36}$").unwrap();
    static ref CONVERSATIONS_URL_PATTERN: Regex =
        Regex::new(r"chatgpt.*?\.[A-z]{2,3}/backend-api/conversations\?offset").unwrap();
    static ref ME_URL_PATTERN: Regex =
        Regex::new(r"chatgpt.*?\.[A-z]{2,3}/backend-api/me").unwrap();
}

fn get_chatgpt_chatinfo(
    profile: &dyn BrowserProfile,
    log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    // Conversation listings cached from the backend API carry titles and
    // create/update times for each chat.
    for cache_rec in profile.iterate_cache(Some(&CONVERSATIONS_URL_PATTERN)) {
        let cache_data: Value = match serde_json::from_slice(&cache_rec.data) {
            Ok(data) => data,
            Err(e) => {
                log.message(&format!(
                    "WARNING: could not parse conversation list at {}: {}",
                    cache_rec.data_location, e
                ));
                continue;
            }
        };

        let items = cache_data
            .get("items")
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        for chat_item in items {
            results.push(json!({
                "ID": chat_item.get("id").and_then(Value::as_str),
                "Title": chat_item.get("title").and_then(Value::as_str),
                "History Timestamp": "N/A",
                "Chat Created Time": chat_item.get("create_time"),
                "Chat Updated Time": chat_item.get("update_time"),
                "Original URL": "N/A",
                "Source": "Cache",
                "Data Location": cache_rec.data_location,
            }));
        }
    }

    // Visited chat URLs end in the conversation's UUID.
    for history_rec in profile.iterate_history_records(Some(&CHAT_URL_PATTERN)) {
        let id = &history_rec.url[history_rec.url.len() - 36..];
        results.push(json!({
            "ID": id,
            "Title": history_rec.title,
            "History Timestamp": history_rec.visit_time.map(|t| t.to_rfc3339()),
            "Chat Created Time": "Unknown",
            "Chat Updated Time": "Unknown",
            "Original URL": history_rec.url,
            "Source": "History",
            "Data Location": history_rec.record_location,
        }));
    }

    Ok(results.into())
}

fn get_chatgpt_userinfo(
    profile: &dyn BrowserProfile,
    log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for cache_rec in profile.iterate_cache(Some(&ME_URL_PATTERN)) {
        let cache_data: Value = match serde_json::from_slice(&cache_rec.data) {
            Ok(data) => data,
            Err(e) => {
                log.message(&format!(
                    "WARNING: could not parse account record at {}: {}",
                    cache_rec.data_location, e
                ));
                continue;
            }
        };

        let created = cache_data
            .get("created")
            .and_then(Value::as_i64)
            .and_then(helpers::datetime_from_unix_secs);

        results.push(json!({
            "Created": created.map(|t| t.to_rfc3339()),
            "Name": cache_data.get("name"),
            "Email": cache_data.get("email"),
            "Phone Number": cache_data.get("phone_number"),
            "Source": "Cache",
            "Data Location": cache_rec.data_location,
        }));
    }

    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![
        ArtifactSpec {
            service: "ChatGPT",
            name: "ChatGPT Chat Information",
            description: "Recovers ChatGPT chat information from History and Cache",
            version: "0.1",
            extract: get_chatgpt_chatinfo,
            presentation: ReportPresentation::Table,
        },
        ArtifactSpec {
            service: "ChatGPT",
            name: "ChatGPT User Information",
            description: "Recovers ChatGPT user information from Cache",
            version: "0.1",
            extract: get_chatgpt_userinfo,
            presentation: ReportPresentation::Table,
        },
    ]
}
