//! Artifact storage: the scoped side-channel plugins use to export
//! binary payloads (recovered thumbnails, attachments, ...).
//!
//! Each invocation gets its own storage handle bound to a disjoint
//! output namespace, so concurrently running plugins never contend for
//! filenames. Results refer to exported bytes only through the location
//! reference strings issued here; raw bytes never land in a report.

use std::collections::HashSet;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::warn;

/// Windows device names that cannot be used as filenames even with an
/// extension appended.
const RESERVED_NAMES: &[&str] = &[
    "CON", "PRN", "AUX", "NUL", "COM1", "COM2", "COM3", "COM4", "COM5", "COM6", "COM7", "COM8",
    "COM9", "LPT1", "LPT2", "LPT3", "LPT4", "LPT5", "LPT6", "LPT7", "LPT8", "LPT9",
];

/// Sanitize a filename so it is safe on all supported platforms and can
/// never escape the directory it is written into.
pub fn sanitize_filename(filename: &str) -> String {
    let mut sanitized = String::with_capacity(filename.len());

    for ch in filename.chars() {
        match ch {
            '/' | '\\' => sanitized.push('_'),
            '\0' => continue,
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '#' | '%' | '&' | '{' | '}' | '$' | '!'
            | '\'' | '@' | '+' | '=' | '~' | '[' | ']' | '(' | ')' | '^' => sanitized.push('_'),
            c if c.is_control() => sanitized.push('_'),
            c if c.is_whitespace() => sanitized.push('_'),
            c => sanitized.push(c),
        }
    }

    if RESERVED_NAMES
        .iter()
        .any(|reserved| sanitized.eq_ignore_ascii_case(reserved))
    {
        sanitized.insert(0, '_');
    }

    if sanitized.starts_with('.') {
        sanitized.insert(0, '_');
    }

    if sanitized.is_empty() {
        sanitized = "unnamed".to_string();
    }

    sanitized
}

/// An open binary output stream plus the reference string identifying
/// where its bytes land.
///
/// The stream is buffered; `close()` flushes and syncs it. `Drop`
/// flushes as a backstop so early-return paths inside a plugin never
/// leave a partially buffered file behind.
pub struct BinaryOutput {
    writer: Option<BufWriter<File>>,
    reference: String,
}

impl BinaryOutput {
    fn create(path: &Path, reference: String) -> Result<Self> {
        let file = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(path)
            .with_context(|| format!("Failed to create output file {}", path.display()))?;

        Ok(Self {
            writer: Some(BufWriter::new(file)),
            reference,
        })
    }

    /// Stable, serializable string identifying where the bytes were
    /// written, relative to the owning service's report directory.
    pub fn location_reference(&self) -> &str {
        &self.reference
    }

    /// Flush buffered bytes to disk and close the stream.
    pub fn close(mut self) -> io::Result<()> {
        if let Some(writer) = self.writer.take() {
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        Ok(())
    }
}

impl Write for BinaryOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.writer.as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(io::ErrorKind::Other, "stream already closed")),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.writer.as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

impl Drop for BinaryOutput {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            if let Err(e) = writer.flush() {
                warn!("Failed to flush {}: {}", self.reference, e);
            }
        }
    }
}

/// Per-invocation storage handle, scoped to one artifact's own output
/// namespace (`<service dir>/<artifact name>_files/`).
///
/// Tracks every filename it has issued so two requests with the same
/// suggested name (or names that collide only after sanitization)
/// always yield distinct files.
pub struct ArtifactStorage {
    service_dir: PathBuf,
    folder_name: String,
    issued: HashSet<String>,
}

impl ArtifactStorage {
    /// `service_dir` is the report directory of the owning service;
    /// `folder_name` the artifact's file-export folder within it. The
    /// folder is created lazily on the first stream request.
    pub fn new(service_dir: &Path, folder_name: &str) -> Self {
        Self {
            service_dir: service_dir.to_path_buf(),
            folder_name: sanitize_filename(folder_name),
            issued: HashSet::new(),
        }
    }

    /// Open a new binary output stream under this scope.
    ///
    /// Returns the writable stream; its `location_reference()` is the
    /// string results should embed to point at the exported file.
    pub fn binary_stream(&mut self, file_name: &str) -> Result<BinaryOutput> {
        let out_dir = self.service_dir.join(&self.folder_name);
        // Idempotent and race-tolerant under concurrent first-writers.
        fs::create_dir_all(&out_dir)
            .with_context(|| format!("Failed to create storage directory {}", out_dir.display()))?;

        let final_name = self.disambiguate(&sanitize_filename(file_name), &out_dir);
        let reference = format!("{}/{}", self.folder_name, final_name);
        let output = BinaryOutput::create(&out_dir.join(&final_name), reference)?;

        self.issued.insert(final_name);
        Ok(output)
    }

    /// Suffix `_1`, `_2`, ... before the extension until the name is new
    /// to this scope and absent on disk.
    fn disambiguate(&self, sanitized: &str, out_dir: &Path) -> String {
        if !self.issued.contains(sanitized) && !out_dir.join(sanitized).exists() {
            return sanitized.to_string();
        }

        let (stem, extension) = match sanitized.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => (stem.to_string(), format!(".{}", ext)),
            _ => (sanitized.to_string(), String::new()),
        };

        let mut counter = 1;
        loop {
            let candidate = format!("{}_{}{}", stem, counter, extension);
            if !self.issued.contains(&candidate) && !out_dir.join(&candidate).exists() {
                return candidate;
            }
            counter += 1;
        }
    }
}
