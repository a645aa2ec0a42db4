//! Sequential SKU allocation and SKU recovery from filenames.
//!
//! SKUs are `<PREFIX>-<zero-padded number>`, strictly increasing, assigned at
//! intake and never reused — even after an artwork is deleted. The tracker
//! file stores only the last issued integer (`{"last": 42}`) and is written
//! atomically.
//!
//! The allocator is intentionally not safe for concurrent callers: there is
//! no lock around the read-increment-write cycle, and the design assumes a
//! single writer per tracker file. Callers that need parallel intake must
//! serialize access themselves. A deleted or corrupt tracker is treated as
//! `last = 0` with a warning, which can reissue an already-used SKU — an
//! accepted limitation of the no-lock design, not a bug.

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::atomic;
use crate::config::PipelineConfig;
use crate::error::Result;

/// A stock-keeping identifier like `ART-00042`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Sku(String);

impl Sku {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Sku {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct TrackerFile {
    last: u64,
}

/// Allocates sequential SKUs backed by a tracker file.
pub struct SkuTracker {
    path: PathBuf,
    prefix: String,
    digits: usize,
}

impl SkuTracker {
    pub fn new(config: &PipelineConfig) -> Self {
        Self {
            path: config.tracker_path(),
            prefix: config.sku.prefix.clone(),
            digits: config.sku.digits,
        }
    }

    /// Return the next sequential SKU and persist the new counter.
    ///
    /// Single-writer only; see the module docs.
    pub fn next(&self) -> Result<Sku> {
        let next = self.read_last() + 1;
        atomic::write_json(&self.path, &TrackerFile { last: next })?;
        let sku = Sku(format!(
            "{}-{:0width$}",
            self.prefix,
            next,
            width = self.digits
        ));
        tracing::info!(sku = %sku, tracker = %self.path.display(), "assigned new SKU");
        Ok(sku)
    }

    /// Last issued number; missing or unreadable tracker content counts as 0.
    fn read_last(&self) -> u64 {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(_) => return 0,
        };
        match serde_json::from_str::<TrackerFile>(&content) {
            Ok(tracker) => tracker.last,
            Err(err) => {
                tracing::warn!(
                    tracker = %self.path.display(),
                    error = %err,
                    "unreadable SKU tracker, restarting from 0",
                );
                0
            }
        }
    }
}

/// Find the first `<prefix>-<digits>` substring in `name`.
///
/// Used by the validator and repair tooling to recover a SKU from a filename
/// or folder name without a registry lookup. Returns `None` when no match
/// exists.
pub fn extract_sku(name: &str, prefix: &str) -> Option<Sku> {
    if prefix.is_empty() {
        return None;
    }
    let mut search_from = 0;
    while let Some(offset) = name[search_from..].find(prefix) {
        let start = search_from + offset;
        let rest = &name[start + prefix.len()..];
        if let Some(stripped) = rest.strip_prefix('-') {
            let digits: String = stripped
                .chars()
                .take_while(|c| c.is_ascii_digit())
                .collect();
            if !digits.is_empty() {
                return Some(Sku(format!("{prefix}-{digits}")));
            }
        }
        search_from = start + prefix.len();
    }
    None
}

/// Recover a SKU by scanning a folder's filenames; first match wins.
pub fn folder_sku(dir: &Path, prefix: &str) -> Option<Sku> {
    let entries = fs::read_dir(dir).ok()?;
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names.iter().find_map(|name| extract_sku(name, prefix))
}
