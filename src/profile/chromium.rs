//! Concrete profile reader for Chrome/Chromium profile folders.
//!
//! Reads what this build can decode natively: Simple Cache entry files
//! for the cache stream and the `History` SQLite database for visits.
//! Session storage lives in a LevelDB store whose parsing is left to a
//! dedicated reader library; the iteration method honors the boundary
//! contract and yields nothing here.

use std::iter;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, TimeZone, Utc};
use log::{debug, warn};
use regex::Regex;
use rusqlite::{Connection, OpenFlags};
use walkdir::WalkDir;

use super::simple_cache;
use super::{
    BrowserProfile, CacheMetadata, CacheRecord, HistoryRecord, SessionStorageRecord,
};

/// A read-only handle onto one Chromium profile folder.
///
/// Opened once per invocation; dropping the handle releases the
/// underlying store handles.
pub struct ChromiumProfileFolder {
    cache_dir: Option<PathBuf>,
    history: Option<Connection>,
}

impl ChromiumProfileFolder {
    /// Open the stores under `profile_path`. `cache_folder` overrides
    /// the cache location for platforms (e.g. Android) where the cache
    /// lives outside the profile folder.
    pub fn open(profile_path: &Path, cache_folder: Option<&Path>) -> Result<Self> {
        if !profile_path.is_dir() {
            anyhow::bail!(
                "profile folder {} does not exist or is not a directory",
                profile_path.display()
            );
        }

        let cache_dir = match cache_folder {
            Some(dir) => Some(dir.to_path_buf()),
            None => locate_cache_dir(profile_path),
        };
        if cache_dir.is_none() {
            debug!(
                "No cache folder found under {}; cache iteration will yield nothing",
                profile_path.display()
            );
        }

        let history_path = profile_path.join("History");
        let history = if history_path.is_file() {
            Some(
                Connection::open_with_flags(
                    &history_path,
                    OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
                )
                .with_context(|| {
                    format!("Failed to open history store {}", history_path.display())
                })?,
            )
        } else {
            debug!("No History database under {}", profile_path.display());
            None
        };

        Ok(Self { cache_dir, history })
    }

    fn read_history(&self, url: Option<&Regex>) -> Result<Vec<HistoryRecord>> {
        let conn = match &self.history {
            Some(conn) => conn,
            None => return Ok(Vec::new()),
        };

        let mut statement = conn.prepare(
            "SELECT visits.id, urls.url, urls.title, visits.visit_time \
             FROM visits INNER JOIN urls ON visits.url = urls.id \
             ORDER BY visits.visit_time",
        )?;

        let rows = statement.query_map([], |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, Option<String>>(2)?,
                row.get::<_, i64>(3)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (visit_id, visit_url, title, visit_time) = match row {
                Ok(row) => row,
                Err(e) => {
                    debug!("Skipping unreadable history row: {}", e);
                    continue;
                }
            };
            if let Some(pattern) = url {
                if !pattern.is_match(&visit_url) {
                    continue;
                }
            }
            records.push(HistoryRecord {
                url: visit_url,
                title: title.filter(|t| !t.is_empty()),
                visit_time: webkit_timestamp_to_utc(visit_time),
                record_location: format!("History visits#{}", visit_id),
            });
        }
        Ok(records)
    }
}

impl BrowserProfile for ChromiumProfileFolder {
    fn iterate_cache<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = CacheRecord> + 'a> {
        let cache_dir = match &self.cache_dir {
            Some(dir) => dir.clone(),
            None => return Box::new(iter::empty()),
        };

        let entries = WalkDir::new(cache_dir)
            .min_depth(1)
            .max_depth(1)
            .into_iter()
            .filter_map(|entry| match entry {
                Ok(entry) => Some(entry),
                Err(e) => {
                    debug!("Skipping unreadable cache directory entry: {}", e);
                    None
                }
            })
            .filter(|entry| {
                entry
                    .file_name()
                    .to_str()
                    .map(simple_cache::is_entry_filename)
                    .unwrap_or(false)
            })
            .filter_map(|entry| {
                let bytes = match std::fs::read(entry.path()) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        debug!("Skipping cache entry {}: {}", entry.path().display(), e);
                        return None;
                    }
                };
                let parsed = match simple_cache::parse_entry(&bytes) {
                    Ok(parsed) => parsed,
                    Err(e) => {
                        debug!("Skipping cache entry {}: {}", entry.path().display(), e);
                        return None;
                    }
                };

                let metadata = if parsed.headers.is_empty() {
                    None
                } else {
                    Some(CacheMetadata::with_headers(parsed.headers))
                };
                Some(CacheRecord {
                    url: parsed.url,
                    data: parsed.data,
                    metadata,
                    data_location: format!(
                        "Cache/{}",
                        entry.file_name().to_string_lossy()
                    ),
                })
            })
            .filter(move |record| match url {
                Some(pattern) => pattern.is_match(&record.url),
                None => true,
            });

        Box::new(entries)
    }

    fn iterate_history_records<'a>(
        &'a self,
        url: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = HistoryRecord> + 'a> {
        match self.read_history(url) {
            Ok(records) => Box::new(records.into_iter()),
            Err(e) => {
                warn!("History store unreadable: {}", e);
                Box::new(iter::empty())
            }
        }
    }

    fn iterate_session_storage<'a>(
        &'a self,
        _host: Option<&'a Regex>,
        _key: Option<&'a Regex>,
    ) -> Box<dyn Iterator<Item = SessionStorageRecord> + 'a> {
        // Session storage is a LevelDB store; decoding it belongs to the
        // external reader library, not this build.
        debug!("Session storage iteration is not supported by the built-in Chromium reader");
        Box::new(iter::empty())
    }
}

/// Chromium keeps the cache either directly in `Cache/` or (newer
/// versions) in `Cache/Cache_Data/`.
fn locate_cache_dir(profile_path: &Path) -> Option<PathBuf> {
    let nested = profile_path.join("Cache").join("Cache_Data");
    if nested.is_dir() {
        return Some(nested);
    }
    let flat = profile_path.join("Cache");
    if flat.is_dir() {
        return Some(flat);
    }
    None
}

/// WebKit timestamps count microseconds since 1601-01-01 UTC; zero means
/// "not recorded".
fn webkit_timestamp_to_utc(value: i64) -> Option<DateTime<Utc>> {
    if value <= 0 {
        return None;
    }
    let epoch = Utc.with_ymd_and_hms(1601, 1, 1, 0, 0, 0).single()?;
    epoch.checked_add_signed(Duration::microseconds(value))
}
