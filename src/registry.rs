//! Master artwork registry: the durable slug → artifact-path index.
//!
//! A single JSON object whose top-level keys are slugs and whose values are
//! [`ArtworkRecord`]s holding absolute path strings plus listing metadata.
//! It is the source of truth for "where is this artwork's data" across the
//! three lifecycle stages.
//!
//! # Durability rules
//!
//! - Every save is write-temp-then-rename ([`crate::atomic`]), so the file is
//!   never observed partially written.
//! - A missing or unparseable registry loads as an empty map with a warning —
//!   corruption is degraded state, never a crash.
//! - Updates are additive: a transition upserts its own slug's record and
//!   leaves every other slug untouched.
//! - No locking: the design assumes a single writer at a time per registry
//!   file. Stage transitions perform their read-modify-write as the final
//!   step so the registry never references a path that does not exist yet.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::atomic;

/// Lifecycle stage recorded in the registry's `status` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Unanalysed,
    Processed,
    Finalised,
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Status::Unanalysed => "unanalysed",
            Status::Processed => "processed",
            Status::Finalised => "finalised",
        };
        f.write_str(s)
    }
}

/// One artwork's registry entry. All paths are absolute strings so downstream
/// consumers resolve correctly regardless of their working directory.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArtworkRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_filename: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<Status>,
    /// Main artwork image for the record's current stage.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumb: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analyse: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub qc: Option<String>,
    /// Analysis document (`<SKU>-FINAL.json`).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub mockups: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_colour: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub secondary_colour: Option<String>,
}

/// In-memory view of the registry file.
#[derive(Debug)]
pub struct Registry {
    path: PathBuf,
    pub entries: BTreeMap<String, ArtworkRecord>,
}

impl Registry {
    /// Load the registry from `path`. A missing file is an empty registry; a
    /// corrupt file is an empty registry with a warning.
    pub fn load(path: &Path) -> Self {
        let entries = match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(entries) => entries,
                Err(err) => {
                    tracing::warn!(
                        registry = %path.display(),
                        error = %err,
                        "corrupt registry, treating as empty",
                    );
                    BTreeMap::new()
                }
            },
            Err(_) => BTreeMap::new(),
        };
        Self {
            path: path.to_path_buf(),
            entries,
        }
    }

    /// Persist the registry atomically.
    pub fn save(&self) -> io::Result<()> {
        atomic::write_json(&self.path, &self.entries)
    }

    pub fn get(&self, slug: &str) -> Option<&ArtworkRecord> {
        self.entries.get(slug)
    }

    /// Mutate (or create) the record for `slug` in memory.
    pub fn upsert(&mut self, slug: &str, f: impl FnOnce(&mut ArtworkRecord)) -> &ArtworkRecord {
        let record = self.entries.entry(slug.to_string()).or_default();
        f(record);
        &self.entries[slug]
    }

    /// Remove a slug's record, returning it if present.
    pub fn remove(&mut self, slug: &str) -> Option<ArtworkRecord> {
        self.entries.remove(slug)
    }
}

/// Absolute string form of a path for registry storage. Falls back to the
/// given path when it cannot be canonicalized (already-deleted files keep
/// their last known location).
pub fn abs_path_string(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}

/// Load-modify-save cycle used as the final, atomic step of a transition.
///
/// Re-reads the file so concurrent-ish sequential writers (the only supported
/// kind) cannot clobber each other's slugs, applies `f` to the slug's record,
/// and writes the whole map back atomically. Returns the updated record.
pub fn update(
    path: &Path,
    slug: &str,
    f: impl FnOnce(&mut ArtworkRecord),
) -> io::Result<ArtworkRecord> {
    let mut registry = Registry::load(path);
    registry.upsert(slug, f);
    registry.save()?;
    Ok(registry.entries[slug].clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn registry_path(tmp: &TempDir) -> PathBuf {
        tmp.path().join("registry.json")
    }

    #[test]
    fn load_missing_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        let registry = Registry::load(&registry_path(&tmp));
        assert!(registry.entries.is_empty());
    }

    #[test]
    fn load_corrupt_file_is_empty() {
        let tmp = TempDir::new().unwrap();
        fs::write(registry_path(&tmp), "{ not json").unwrap();
        let registry = Registry::load(&registry_path(&tmp));
        assert!(registry.entries.is_empty());
    }

    #[test]
    fn save_and_load_roundtrip() {
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);

        let mut registry = Registry::load(&path);
        registry.upsert("dawn", |rec| {
            rec.sku = Some("ART-00001".into());
            rec.status = Some(Status::Unanalysed);
            rec.image = Some("/abs/dawn.jpg".into());
        });
        registry.save().unwrap();

        let loaded = Registry::load(&path);
        let rec = loaded.get("dawn").unwrap();
        assert_eq!(rec.sku.as_deref(), Some("ART-00001"));
        assert_eq!(rec.status, Some(Status::Unanalysed));
        assert_eq!(rec.image.as_deref(), Some("/abs/dawn.jpg"));
    }

    #[test]
    fn update_is_additive_across_slugs() {
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);

        update(&path, "dawn", |rec| rec.sku = Some("ART-00001".into())).unwrap();
        update(&path, "dusk", |rec| rec.sku = Some("ART-00002".into())).unwrap();

        let loaded = Registry::load(&path);
        assert_eq!(loaded.entries.len(), 2);
        assert_eq!(
            loaded.get("dawn").unwrap().sku.as_deref(),
            Some("ART-00001")
        );
    }

    #[test]
    fn update_preserves_existing_fields() {
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);

        update(&path, "dawn", |rec| {
            rec.sku = Some("ART-00001".into());
            rec.image = Some("/abs/dawn.jpg".into());
        })
        .unwrap();
        update(&path, "dawn", |rec| {
            rec.status = Some(Status::Processed);
        })
        .unwrap();

        let rec = Registry::load(&path).get("dawn").cloned().unwrap();
        assert_eq!(rec.sku.as_deref(), Some("ART-00001"));
        assert_eq!(rec.status, Some(Status::Processed));
    }

    #[test]
    fn interrupted_write_never_corrupts_previous_content() {
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);
        update(&path, "dawn", |rec| rec.sku = Some("ART-00001".into())).unwrap();

        // Simulate a crash mid-write: a truncated temp file next to the
        // registry. The real file must still read back intact.
        fs::write(crate::atomic::staging_path(&path), "{\"dawn\": {\"sk").unwrap();

        let loaded = Registry::load(&path);
        assert_eq!(
            loaded.get("dawn").unwrap().sku.as_deref(),
            Some("ART-00001")
        );
    }

    #[test]
    fn remove_purges_slug() {
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);
        update(&path, "dawn", |rec| rec.sku = Some("ART-00001".into())).unwrap();

        let mut registry = Registry::load(&path);
        assert!(registry.remove("dawn").is_some());
        registry.save().unwrap();

        assert!(Registry::load(&path).get("dawn").is_none());
    }

    #[test]
    fn status_serializes_lowercase() {
        let json = serde_json::to_string(&Status::Finalised).unwrap();
        assert_eq!(json, "\"finalised\"");
    }

    #[test]
    fn empty_optionals_are_omitted() {
        let record = ArtworkRecord {
            sku: Some("ART-00001".into()),
            ..Default::default()
        };
        let json = serde_json::to_string(&record).unwrap();
        assert!(!json.contains("preview"));
        assert!(!json.contains("mockups"));
        assert!(json.contains("ART-00001"));
    }

    #[test]
    fn unknown_fields_are_tolerated_on_read() {
        // Forward compatibility: older registries written by newer versions
        // must still load.
        let tmp = TempDir::new().unwrap();
        let path = registry_path(&tmp);
        fs::write(
            &path,
            r#"{"dawn": {"sku": "ART-00001", "future_field": true}}"#,
        )
        .unwrap();
        let registry = Registry::load(&path);
        assert_eq!(
            registry.get("dawn").unwrap().sku.as_deref(),
            Some("ART-00001")
        );
    }
}
