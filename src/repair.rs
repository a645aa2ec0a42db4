//! Orphan-SKU repair tooling.
//!
//! Uploads that land in the unanalysed root without going through intake
//! (bulk copies, restored backups) have no SKU in their filename and no
//! derivatives. The repair tool finds such orphans and, in auto mode,
//! renames each to embed a freshly allocated SKU and regenerates the
//! derivative pair plus QC metadata so the unit validates as a legacy flat
//! unit.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{DecodeLimits, DerivativePaths, make_derivatives};
use crate::sku::{Sku, extract_sku};

/// Base images directly under the unanalysed root whose names carry no SKU.
pub fn scan_orphans(config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let dir = config.unanalysed_root();
    if !dir.is_dir() {
        return Err(PipelineError::NotFound(dir));
    }

    let mut orphans: Vec<PathBuf> = fs::read_dir(&dir)?
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && is_base_jpeg(p))
        .filter(|p| {
            let stem = p
                .file_stem()
                .map(|s| s.to_string_lossy().to_string())
                .unwrap_or_default();
            extract_sku(&stem, &config.sku.prefix).is_none()
        })
        .collect();
    orphans.sort();

    for orphan in &orphans {
        tracing::warn!(orphan = %orphan.display(), "orphan found");
    }
    Ok(orphans)
}

/// Rename `path` to embed `sku` and regenerate its derivatives.
///
/// Returns the renamed path. The derivative pair and QC metadata use the new
/// stem, completing a legacy flat unit.
pub fn repair_orphan(path: &Path, sku: &Sku, config: &PipelineConfig) -> Result<PathBuf> {
    if !path.is_file() {
        return Err(PipelineError::NotFound(path.to_path_buf()));
    }
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("jpg")
        .to_ascii_lowercase();

    let new_stem = format!("{stem}-{sku}");
    let new_path = path.with_file_name(format!("{new_stem}.{ext}"));
    fs::rename(path, &new_path)?;

    let base = match new_path.parent() {
        Some(parent) => parent.to_path_buf(),
        None => PathBuf::from("."),
    };
    let paths = DerivativePaths {
        thumb: base.join(format!("{new_stem}-THUMB.jpg")),
        analyse: base.join(format!("{new_stem}-ANALYSE.jpg")),
        qc: base.join(format!("{new_stem}-QC.json")),
    };
    let limits = DecodeLimits::from_config(&config.decode);
    make_derivatives(&new_path, &paths, sku, &config.derivatives, &limits)?;

    tracing::info!(repaired = %new_path.display(), sku = %sku, "repaired orphan");
    Ok(new_path)
}

fn is_base_jpeg(path: &Path) -> bool {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    name.ends_with(".jpg") && !name.ends_with("-THUMB.jpg") && !name.ends_with("-ANALYSE.jpg")
}
