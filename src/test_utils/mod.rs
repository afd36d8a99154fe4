//! Test utilities for browser-triage
//!
//! In-memory profile fixtures shared across unit tests, so plugin and
//! orchestrator tests never need a real browser profile on disk.

#![cfg(test)]

use chrono::{DateTime, Utc};
use regex::Regex;

use crate::profile::{
    BrowserProfile, CacheMetadata, CacheRecord, HistoryRecord, SessionStorageRecord,
};

/// An in-memory profile built from canned records.
#[derive(Debug, Default)]
pub struct FixtureProfile {
    cache: Vec<CacheRecord>,
    history: Vec<HistoryRecord>,
    session: Vec<SessionStorageRecord>,
}

impl FixtureProfile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_cache_record(
        mut self,
        url: &str,
        data: &[u8],
        headers: Vec<(&str, &str)>,
    ) -> Self {
        let metadata = if headers.is_empty() {
            None
        } else {
            Some(CacheMetadata::with_headers(
                headers
                    .into_iter()
                    .map(|(name, value)| (name.to_string(), value.to_string()))
                    .collect(),
            ))
        };
        let location = format!("Cache/entry-{}", self.cache.len());
        self.cache.push(CacheRecord {
            url: url.to_string(),
            data: data.to_vec(),
            metadata,
            data_location: location,
        });
        self
    }

    pub fn with_history_record(
        mut self,
        url: &str,
        title: Option<&str>,
        visit_time: Option<DateTime<Utc>>,
    ) -> Self {
        let location = format!("History visits#{}", self.history.len() + 1);
        self.history.push(HistoryRecord {
            url: url.to_string(),
            title: title.map(str::to_string),
            visit_time,
            record_location: location,
        });
        self
    }

    pub fn with_session_record(mut self, host: &str, key: &str, value: &str, seq: u64) -> Self {
        self.session.push(SessionStorageRecord {
            host: host.to_string(),
            key: key.to_string(),
            value: value.to_string(),
            sequence_number: Some(seq),
            record_location: format!("Session Storage seq#{}", seq),
        });
        self
    }
}

impl BrowserProfile for FixtureProfile {
    fn iterate_cache<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = CacheRecord> + 'a> {
        Box::new(
            self.cache
                .iter()
                .filter(move |rec| url.map_or(true, |re| re.is_match(&rec.url)))
                .cloned(),
        )
    }

    fn iterate_history_records<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = HistoryRecord> + 'a> {
        Box::new(
            self.history
                .iter()
                .filter(move |rec| url.map_or(true, |re| re.is_match(&rec.url)))
                .cloned(),
        )
    }

    fn iterate_session_storage<'a>(
        &'a self,
        host: Option<&'a Regex>,
        key: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = SessionStorageRecord> + 'a> {
        Box::new(
            self.session
                .iter()
                .filter(move |rec| host.map_or(true, |re| re.is_match(&rec.host)))
                .filter(move |rec| key.map_or(true, |re| re.is_match(&rec.key)))
                .cloned(),
        )
    }
}
