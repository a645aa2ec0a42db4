//! Write-temp-then-rename persistence for state files.
//!
//! Every durable JSON document in the pipeline (registry, SKU tracker, QC and
//! FINAL metadata) goes through these helpers: the content is written to a
//! `.tmp` sibling in the destination's directory and renamed over the target.
//! A crash mid-write leaves at worst a stale temp file next to an intact
//! previous version — readers never observe a half-written document.
//!
//! The temp file must live in the same directory as the destination: rename
//! is only atomic within a filesystem volume.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// `.tmp` sibling of `path`, in the same directory.
pub(crate) fn staging_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

/// Write `bytes` to `path` atomically, creating parent directories as needed.
pub fn write_bytes(path: &Path, bytes: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = staging_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)
}

/// Serialize `value` as pretty-printed JSON and write it atomically.
pub fn write_json<T: Serialize>(path: &Path, value: &T) -> io::Result<()> {
    let json = serde_json::to_vec_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    write_bytes(path, &json)
}
