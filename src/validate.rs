//! Read-only integrity validation of the artwork tree.
//!
//! Walks the unanalysed and processed stage roots and reports every missing
//! required artifact as a human-readable problem string. The validator never
//! repairs anything, never stops at the first finding, and never raises —
//! problems are accumulated data; the caller decides severity.
//!
//! Unanalysed artworks are discovered in two layouts:
//! - **sub-folder form** (canonical): one folder per artwork, identified by
//!   the presence of a `*-QC.json` file;
//! - **legacy flat form**: image files directly under the stage root with
//!   the SKU embedded in the filenames and stem-based derivative names.
//!
//! Processed artworks are one folder each; the folder's SKU is recovered by
//! scanning filenames for the SKU pattern (first match wins). Folders with
//! no recoverable SKU are reported once and skipped.
//!
//! A final reconciliation pass checks the registry against the tree: every
//! path a record references must still exist on disk.

use std::path::Path;

use walkdir::WalkDir;

use crate::config::{CONFIG_FILENAME, PipelineConfig};
use crate::naming::{self, MOCKUP_COUNT, THUMBS_DIR};
use crate::registry::Registry;
use crate::sku::{Sku, extract_sku, folder_sku};

/// Validate the whole project tree. Returns every problem found — unanalysed
/// findings first, then processed, then registry reconciliation — each
/// sub-check in discovery order. Empty means clean.
pub fn validate(config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !config.marker_path().is_file() {
        errors.push(format!("Missing {CONFIG_FILENAME}"));
    }
    errors.extend(check_unanalysed(&config.unanalysed_root(), config));
    errors.extend(check_processed(&config.processed_root(), config));
    errors.extend(check_registry(config));

    if errors.is_empty() {
        tracing::info!(root = %config.root().display(), "all artwork assets validated");
    } else {
        for error in &errors {
            tracing::error!("{error}");
        }
    }
    errors
}

/// Validate the unanalysed stage root.
pub fn check_unanalysed(dir: &Path, config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "unanalysed directory does not exist");
        return errors;
    }

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_dir() {
            errors.extend(check_unanalysed_unit(path, config));
        } else {
            errors.extend(check_legacy_flat_file(path, config));
        }
    }
    errors
}

/// One sub-folder artwork unit: original upload, THUMB, ANALYSE, QC.
fn check_unanalysed_unit(folder: &Path, config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let names = file_names(folder);

    // A folder is only an artwork unit once its QC metadata exists.
    let Some(qc_name) = names.iter().find(|n| n.ends_with("-QC.json")) else {
        tracing::debug!(folder = %folder.display(), "no QC metadata, not an artwork unit");
        return errors;
    };

    let sku = extract_sku(qc_name, &config.sku.prefix);
    let folder_name = folder
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let label = label_for(&sku, &folder_name);

    let has_original = names.iter().any(|n| {
        is_image_name(n) && !n.ends_with("-THUMB.jpg") && !n.ends_with("-ANALYSE.jpg")
    });
    if !has_original {
        errors.push(format!("Missing original for {label}"));
    }

    let thumb_present = match &sku {
        Some(sku) => folder.join(format!("{sku}-THUMB.jpg")).is_file(),
        None => names.iter().any(|n| n.ends_with("-THUMB.jpg")),
    };
    if !thumb_present {
        errors.push(format!("Missing THUMB for {label}"));
    }

    let analyse_present = match &sku {
        Some(sku) => folder.join(format!("{sku}-ANALYSE.jpg")).is_file(),
        None => names.iter().any(|n| n.ends_with("-ANALYSE.jpg")),
    };
    if !analyse_present {
        errors.push(format!("Missing ANALYSE for {label}"));
    }

    errors
}

/// Legacy flat layout: a base `.jpg` directly in the stage root with
/// stem-based derivative and QC names.
fn check_legacy_flat_file(file: &Path, config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let name = file
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    // Only base images start a unit; derivatives and metadata are siblings.
    if !name.ends_with(".jpg")
        || name.ends_with("-THUMB.jpg")
        || name.ends_with("-ANALYSE.jpg")
    {
        return errors;
    }

    let stem = name.trim_end_matches(".jpg");
    let sku = extract_sku(stem, &config.sku.prefix);
    let label = label_for(&sku, stem);
    let base = match file.parent() {
        Some(parent) => parent,
        None => return errors,
    };

    if !base.join(format!("{stem}-THUMB.jpg")).is_file() {
        errors.push(format!("Missing THUMB for {label}"));
    }
    if !base.join(format!("{stem}-ANALYSE.jpg")).is_file() {
        errors.push(format!("Missing ANALYSE for {label}"));
    }
    if !base.join(format!("{stem}-QC.json")).is_file() {
        errors.push(format!("Missing QC JSON for {label}"));
    }
    errors
}

/// Validate the processed stage root.
pub fn check_processed(dir: &Path, config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    if !dir.is_dir() {
        tracing::debug!(dir = %dir.display(), "processed directory does not exist");
        return errors;
    }

    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let folder = entry.path();
        if !folder.is_dir() {
            continue;
        }
        let slug = folder
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();

        let Some(sku) = folder_sku(folder, &config.sku.prefix) else {
            errors.push(format!("No SKU found in folder {slug}"));
            continue;
        };

        errors.extend(check_processed_unit(folder, &slug, &sku));
    }
    errors
}

fn check_processed_unit(folder: &Path, slug: &str, sku: &Sku) -> Vec<String> {
    let mut errors = Vec::new();
    let thumbs_dir = folder.join(THUMBS_DIR);
    if !thumbs_dir.is_dir() {
        errors.push(format!("Missing THUMBS folder for {sku} in {slug}"));
    }

    let required = [
        (naming::main_image(folder, slug, sku), "Main"),
        (naming::thumb_image(folder, slug, sku), "THUMB"),
        (naming::analyse_image(folder, slug, sku), "ANALYSE"),
        (naming::qc_json(folder, sku), "QC JSON"),
        (naming::final_json(folder, sku), "Final JSON"),
    ];
    for (path, desc) in &required {
        if !path.is_file() {
            errors.push(format!("Missing {desc} for {sku} in {slug}"));
        }
    }

    let mockup_prefix = format!("{slug}-{sku}-MU-");
    let mockup_count = file_names(folder)
        .iter()
        .filter(|n| {
            n.starts_with(&mockup_prefix) && n.ends_with(".jpg") && !n.ends_with("-THUMB.jpg")
        })
        .count();
    if mockup_count != MOCKUP_COUNT {
        errors.push(format!("Expected 9 mockups for {sku} in {slug}"));
    }

    for slot in 1..=MOCKUP_COUNT {
        if !naming::mockup_image(folder, slug, sku, slot).is_file() {
            errors.push(format!("Missing mockup MU-{slot:02} for {sku} in {slug}"));
        }
        if !naming::mockup_thumb(folder, slug, sku, slot).is_file() {
            errors.push(format!("Missing mockup thumb MU-{slot:02} for {sku} in {slug}"));
        }
    }

    if thumbs_dir.is_dir() {
        let thumb_count = file_names(&thumbs_dir)
            .iter()
            .filter(|n| n.starts_with(&mockup_prefix) && n.ends_with("-THUMB.jpg"))
            .count();
        if thumb_count != MOCKUP_COUNT {
            errors.push(format!("Expected 9 mockup thumbs for {sku} in {slug}"));
        }
    }

    errors
}

/// Reconcile the registry against the tree: every path a record references
/// must still exist on disk. A missing registry file is simply an empty
/// registry, not a problem.
pub fn check_registry(config: &PipelineConfig) -> Vec<String> {
    let mut errors = Vec::new();
    let registry = Registry::load(&config.registry_path());
    for (slug, record) in &registry.entries {
        let singles = [
            &record.image,
            &record.thumb,
            &record.analyse,
            &record.qc,
            &record.analysis,
            &record.preview,
        ];
        let paths = singles
            .into_iter()
            .flatten()
            .chain(record.mockups.iter());
        for path in paths {
            if !Path::new(path).exists() {
                errors.push(format!("Registry path missing for {slug}: {path}"));
            }
        }
    }
    errors
}

fn file_names(dir: &Path) -> Vec<String> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut names: Vec<String> = entries
        .filter_map(|e| e.ok())
        .filter(|e| e.path().is_file())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

fn is_image_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    ["jpg", "jpeg", "png"]
        .iter()
        .any(|ext| lower.ends_with(&format!(".{ext}")))
}

fn label_for(sku: &Option<Sku>, fallback: &str) -> String {
    match sku {
        Some(sku) => sku.to_string(),
        None => fallback.to_string(),
    }
}
