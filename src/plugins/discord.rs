//! Recovers Discord chat messages from the cache.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::models::{ArtifactResult, ArtifactSpec, PluginLog, ReportPresentation};
use crate::profile::BrowserProfile;
use crate::storage::ArtifactStorage;

lazy_static! {
    static ref MESSAGES_URL_PATTERN: Regex =
        Regex::new(r"discord\.com/api/v9/channels/\d+?/messages").unwrap();
}

// A first pass designed to adhere to a tabular output; a custom report
// format would suit attachments better long-term.
fn get_messages(
    profile: &dyn BrowserProfile,
    log: &PluginLog,
    _storage: &mut ArtifactStorage,
) -> anyhow::Result<ArtifactResult> {
    let mut results = Vec::new();

    for cache_rec in profile.iterate_cache(Some(&MESSAGES_URL_PATTERN)) {
        let messages: Vec<Value> = match serde_json::from_slice(&cache_rec.data) {
            Ok(messages) => messages,
            Err(e) => {
                log.message(&format!(
                    "WARNING: could not parse message list at {}: {}",
                    cache_rec.data_location, e
                ));
                continue;
            }
        };

        for msg in messages {
            let attachments = msg
                .get("attachments")
                .and_then(Value::as_array)
                .map(|attachments| {
                    attachments
                        .iter()
                        .map(|att| {
                            format!(
                                "ID={}; filename='{}'; url='{}'",
                                att["id"].as_str().unwrap_or_default(),
                                att["filename"].as_str().unwrap_or_default(),
                                att["url"].as_str().unwrap_or_default(),
                            )
                        })
                        .collect::<Vec<_>>()
                        .join("\n")
                })
                .unwrap_or_default();

            let message_reference = msg.get("message_reference").map(|reference| {
                format!(
                    "channel={}; message={}",
                    reference["channel_id"].as_str().unwrap_or_default(),
                    reference["message_id"].as_str().unwrap_or_default(),
                )
            });

            results.push(json!({
                "channel id": msg.get("channel_id"),
                "message id": msg.get("id"),
                "author id": msg.pointer("/author/id"),
                "message type": msg.get("type"),
                "author username": msg.pointer("/author/username"),
                "author global name": msg.pointer("/author/global_name"),
                "timestamp": msg.get("timestamp"),
                "edited timestamp": msg.get("edited_timestamp"),
                "content": msg.get("content"),
                "attachments": attachments,
                "message reference": message_reference,
            }));
        }
    }

    results.sort_by(|a, b| {
        let key = |rec: &Value| {
            (
                rec["channel id"].as_str().unwrap_or("").to_string(),
                rec["timestamp"].as_str().unwrap_or("").to_string(),
            )
        };
        key(a).cmp(&key(b))
    });
    Ok(results.into())
}

pub fn artifacts() -> Vec<ArtifactSpec> {
    vec![ArtifactSpec {
        service: "Discord",
        name: "Discord Chat Messages",
        description: "Recovers Discord chat messages from the Cache",
        version: "0.1",
        extract: get_messages,
        presentation: ReportPresentation::Table,
    }]
}
