//! The profile reader boundary.
//!
//! Record-level parsing of a browser's stores is a collaborator concern;
//! this module pins down the contract the orchestrator and the plugins
//! program against: three read-only record streams behind the
//! [`BrowserProfile`] trait, and a [`ProfileOpener`] factory so every
//! invocation gets its own scoped handle.
//!
//! [`chromium::ChromiumProfileFolder`] is the concrete reader shipped
//! with the tool; tests substitute in-memory fixtures.

pub mod chromium;
mod simple_cache;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use regex::Regex;

/// HTTP-level metadata recovered alongside a cached payload.
#[derive(Debug, Clone, Default)]
pub struct CacheMetadata {
    pub request_time: Option<DateTime<Utc>>,
    pub response_time: Option<DateTime<Utc>>,
    headers: Vec<(String, String)>,
}

impl CacheMetadata {
    pub fn with_headers(headers: Vec<(String, String)>) -> Self {
        Self {
            request_time: None,
            response_time: None,
            headers,
        }
    }

    /// All values recorded for a (case-insensitive) header name.
    pub fn attribute(&self, name: &str) -> Vec<&str> {
        self.headers
            .iter()
            .filter(|(header, _)| header.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
            .collect()
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }
}

/// One recovered cache entry: the requested URL, the cached payload and
/// whatever response metadata survived.
#[derive(Debug, Clone)]
pub struct CacheRecord {
    pub url: String,
    pub data: Vec<u8>,
    pub metadata: Option<CacheMetadata>,
    /// Where in the profile the payload was found, for evidential
    /// traceability in reports.
    pub data_location: String,
}

/// One browsing-history visit.
#[derive(Debug, Clone)]
pub struct HistoryRecord {
    pub url: String,
    pub title: Option<String>,
    pub visit_time: Option<DateTime<Utc>>,
    pub record_location: String,
}

/// One key/value record from a site's session storage area.
#[derive(Debug, Clone)]
pub struct SessionStorageRecord {
    pub host: String,
    pub key: String,
    pub value: String,
    pub sequence_number: Option<u64>,
    pub record_location: String,
}

/// Read-only iteration over a browser profile's stores.
///
/// A handle is acquired once per invocation and released (dropped) when
/// that invocation ends, whether it succeeded or failed. Individual
/// records that fail to parse are skipped by implementations; a corrupt
/// entry must not hide the rest of the store.
pub trait BrowserProfile: Send {
    /// Cache entries, optionally filtered by a URL pattern.
    fn iterate_cache<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = CacheRecord> + 'a>;

    /// History visits, optionally filtered by a URL pattern.
    fn iterate_history_records<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = HistoryRecord> + 'a>;

    /// Session storage records, optionally filtered by host and key
    /// patterns.
    fn iterate_session_storage<'a>(
        &'a self,
        host: Option<&'a Regex>,
        key: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = SessionStorageRecord> + 'a>;
}

/// Factory opening a fresh profile handle for one invocation.
///
/// The underlying stores are opened independently per invocation, so
/// concurrently running artifacts never share reader state.
pub type ProfileOpener = Arc<dyn Fn() -> anyhow::Result<Box<dyn BrowserProfile>> + Send + Sync>;
