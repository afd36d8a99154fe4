//! Minimal reader for Chromium "Simple Cache" entry files.
//!
//! An entry file (`<hash>_0`) carries a fixed header and key, followed by
//! stream 1 (the payload), an EOF record, stream 0 (serialized response
//! metadata) and a final EOF record. Only the pieces useful for artifact
//! recovery are decoded: the key (URL), the payload bytes and a
//! best-effort carve of the HTTP response headers out of stream 0.

use anyhow::{bail, Context, Result};
use log::debug;

const INITIAL_MAGIC: u64 = 0xfcfb6d1ba7725c30;
const FINAL_MAGIC: u64 = 0xf4fa6f45970546d3;

const HEADER_SIZE: usize = 20;
const EOF_SIZE: usize = 20;

const FLAG_HAS_CRC32: u32 = 1;
const FLAG_HAS_KEY_SHA256: u32 = 1 << 1;

const KEY_SHA256_SIZE: usize = 32;

/// Decoded entry: cache key (URL), payload and carved response headers.
pub(crate) struct SimpleCacheEntry {
    pub url: String,
    pub data: Vec<u8>,
    pub headers: Vec<(String, String)>,
}

struct EofRecord {
    flags: u32,
    data_crc32: u32,
    stream_size: usize,
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    let slice = bytes
        .get(offset..offset + 4)
        .context("Truncated cache entry")?;
    Ok(u32::from_le_bytes([slice[0], slice[1], slice[2], slice[3]]))
}

fn read_u64(bytes: &[u8], offset: usize) -> Result<u64> {
    let slice = bytes
        .get(offset..offset + 8)
        .context("Truncated cache entry")?;
    let mut buf = [0u8; 8];
    buf.copy_from_slice(slice);
    Ok(u64::from_le_bytes(buf))
}

fn read_eof(bytes: &[u8], offset: usize) -> Result<EofRecord> {
    if read_u64(bytes, offset)? != FINAL_MAGIC {
        bail!("Bad EOF magic at offset {}", offset);
    }
    Ok(EofRecord {
        flags: read_u32(bytes, offset + 8)?,
        data_crc32: read_u32(bytes, offset + 12)?,
        stream_size: read_u32(bytes, offset + 16)? as usize,
    })
}

/// True for filenames that look like simple cache entry files
/// (`<16 hex digits>_0`).
pub(crate) fn is_entry_filename(name: &str) -> bool {
    match name.split_once('_') {
        Some((hash, stream)) => {
            stream == "0" && hash.len() == 16 && hash.chars().all(|c| c.is_ascii_hexdigit())
        }
        None => false,
    }
}

/// Parse one entry file. Fails on structural problems; CRC mismatches
/// are logged and the payload kept (partial data still has evidential
/// value).
pub(crate) fn parse_entry(bytes: &[u8]) -> Result<SimpleCacheEntry> {
    if bytes.len() < HEADER_SIZE + EOF_SIZE {
        bail!("Entry too small ({} bytes)", bytes.len());
    }

    if read_u64(bytes, 0)? != INITIAL_MAGIC {
        bail!("Bad entry magic");
    }
    let _version = read_u32(bytes, 8)?;
    let key_length = read_u32(bytes, 12)? as usize;
    let key_end = HEADER_SIZE
        .checked_add(key_length)
        .context("Key length overflow")?;
    let key = bytes
        .get(HEADER_SIZE..key_end)
        .context("Truncated cache key")?;
    let key = String::from_utf8_lossy(key).into_owned();

    // Work backwards: the final EOF record closes stream 0.
    let eof0_offset = bytes.len() - EOF_SIZE;
    let eof0 = read_eof(bytes, eof0_offset)?;
    let sha_size = if eof0.flags & FLAG_HAS_KEY_SHA256 != 0 {
        KEY_SHA256_SIZE
    } else {
        0
    };
    let stream0_start = eof0_offset
        .checked_sub(sha_size)
        .and_then(|o| o.checked_sub(eof0.stream_size))
        .context("Stream 0 extends past start of file")?;

    let eof1_offset = stream0_start
        .checked_sub(EOF_SIZE)
        .context("Missing stream 1 EOF record")?;
    let eof1 = read_eof(bytes, eof1_offset)?;

    if eof1_offset < key_end {
        bail!("Stream layout overlaps key");
    }
    let data = bytes[key_end..eof1_offset].to_vec();
    if data.len() != eof1.stream_size {
        debug!(
            "Stream 1 size mismatch: expected {}, found {}",
            eof1.stream_size,
            data.len()
        );
    }

    if eof1.flags & FLAG_HAS_CRC32 != 0 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&data);
        if hasher.finalize() != eof1.data_crc32 {
            debug!("Stream 1 CRC mismatch for key '{}'", key);
        }
    }

    let stream0 = &bytes[stream0_start..eof0_offset - sha_size];
    let headers = carve_headers(stream0);

    Ok(SimpleCacheEntry {
        url: url_from_key(&key),
        data,
        headers,
    })
}

/// Cache keys may be double-keyed ("_dk_ <site> <site> <url>"); the real
/// request URL is the last space-separated token.
fn url_from_key(key: &str) -> String {
    match key.rsplit_once(' ') {
        Some((_, url)) => url.to_string(),
        None => key.to_string(),
    }
}

/// Best-effort recovery of HTTP response headers from the serialized
/// response-info blob: a block of NUL-separated header lines starting at
/// the status line and closed by a double NUL.
fn carve_headers(stream0: &[u8]) -> Vec<(String, String)> {
    let start = match find_subsequence(stream0, b"HTTP/") {
        Some(offset) => offset,
        None => return Vec::new(),
    };

    let block = &stream0[start..];
    let end = find_subsequence(block, b"\0\0").unwrap_or(block.len());

    let mut headers = Vec::new();
    for line in block[..end].split(|&b| b == 0) {
        let line = String::from_utf8_lossy(line);
        if let Some((name, value)) = line.split_once(':') {
            headers.push((name.trim().to_string(), value.trim().to_string()));
        }
    }
    headers
}

fn find_subsequence(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
