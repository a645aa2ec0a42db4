//! Artwork intake and removal.
//!
//! Intake is the entry point of the lifecycle: an uploaded image file is
//! copied into its own folder under the unanalysed root, assigned a fresh
//! SKU, and given its THUMB/ANALYSE derivative pair plus QC metadata. The
//! registry record (`status: unanalysed`) is written as the final step, so
//! the registry never points at artifacts that are not on disk yet.
//!
//! If anything fails after the folder was created, the partial folder is
//! removed again — an intake either completes or leaves no trace. The SKU
//! counter is not rolled back on failure; gaps in the sequence are harmless
//! and reuse is forbidden anyway.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{DecodeLimits, DerivativePaths, make_derivatives};
use crate::naming;
use crate::registry::{self, Registry, Status};
use crate::sku::{Sku, SkuTracker};

/// Upload formats accepted at intake.
pub const ALLOWED_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png"];

/// Outcome of a successful intake.
#[derive(Debug, Clone)]
pub struct IntakeReport {
    pub slug: String,
    pub sku: Sku,
    pub dir: PathBuf,
}

/// Bring `source` into the pipeline as a new unanalysed artwork.
pub fn intake(source: &Path, config: &PipelineConfig) -> Result<IntakeReport> {
    if !source.is_file() {
        return Err(PipelineError::NotFound(source.to_path_buf()));
    }
    let ext = source
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
        return Err(PipelineError::InvalidInput(format!(
            "unsupported upload extension {:?} for {}",
            ext,
            source.display()
        )));
    }

    let stem = source
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_default();
    let dir = naming::unique_slug(&config.unanalysed_root(), &naming::sanitize_slug(&stem));
    let slug = dir
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| naming::sanitize_slug(&stem));

    fs::create_dir_all(&dir)?;
    match ingest(source, &dir, &slug, &ext, config) {
        Ok(report) => Ok(report),
        Err(err) => {
            // No half-created units: the folder goes away with the failure.
            let _ = fs::remove_dir_all(&dir);
            Err(err)
        }
    }
}

fn ingest(
    source: &Path,
    dir: &Path,
    slug: &str,
    ext: &str,
    config: &PipelineConfig,
) -> Result<IntakeReport> {
    let original = dir.join(format!("{slug}.{ext}"));
    fs::copy(source, &original)?;

    let sku = SkuTracker::new(config).next()?;
    let paths = DerivativePaths {
        thumb: naming::intake_thumb(dir, &sku),
        analyse: naming::intake_analyse(dir, &sku),
        qc: naming::qc_json(dir, &sku),
    };
    let limits = DecodeLimits::from_config(&config.decode);
    let set = make_derivatives(&original, &paths, &sku, &config.derivatives, &limits)?;

    let original_filename = source
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    registry::update(&config.registry_path(), slug, |rec| {
        rec.sku = Some(sku.to_string());
        rec.original_filename = Some(original_filename.clone());
        rec.status = Some(Status::Unanalysed);
        rec.image = Some(registry::abs_path_string(&original));
        rec.thumb = Some(registry::abs_path_string(&set.thumb));
        rec.analyse = Some(registry::abs_path_string(&set.analyse));
        rec.qc = Some(registry::abs_path_string(&set.qc));
    })?;

    tracing::info!(slug, sku = %sku, dir = %dir.display(), "artwork taken in");

    Ok(IntakeReport {
        slug: slug.to_string(),
        sku,
        dir: dir.to_path_buf(),
    })
}

/// Remove an artwork from every lifecycle stage and purge its registry
/// entry. SKUs are never reissued for deleted artworks.
pub fn delete_artwork(slug: &str, config: &PipelineConfig) -> Result<()> {
    let slug = naming::sanitize_slug(slug);

    let mut removed_any = false;
    for root in [
        config.unanalysed_root(),
        config.processed_root(),
        config.finalised_root(),
    ] {
        let dir = root.join(&slug);
        if dir.is_dir() {
            fs::remove_dir_all(&dir)?;
            tracing::info!(slug, dir = %dir.display(), "removed stage directory");
            removed_any = true;
        }
    }

    let mut registry = Registry::load(&config.registry_path());
    if registry.remove(&slug).is_some() {
        registry.save()?;
        tracing::info!(slug, "purged registry entry");
        removed_any = true;
    }

    if removed_any {
        Ok(())
    } else {
        Err(PipelineError::NotFound(
            config.unanalysed_root().join(&slug),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::ProjectFixture;

    #[test]
    fn intake_builds_a_complete_unanalysed_unit() {
        let project = ProjectFixture::new();
        let upload = project.upload_jpeg("Dawn Over Water.jpg", 200, 160);

        let report = intake(&upload, &project.config).unwrap();
        assert_eq!(report.slug, "dawn-over-water");
        assert_eq!(report.sku.to_string(), "ART-00001");

        let dir = &report.dir;
        assert!(dir.join("dawn-over-water.jpg").exists());
        assert!(dir.join("ART-00001-THUMB.jpg").exists());
        assert!(dir.join("ART-00001-ANALYSE.jpg").exists());
        assert!(dir.join("ART-00001-QC.json").exists());

        let registry = Registry::load(&project.config.registry_path());
        let rec = registry.get("dawn-over-water").unwrap();
        assert_eq!(rec.status, Some(Status::Unanalysed));
        assert_eq!(rec.sku.as_deref(), Some("ART-00001"));
        assert_eq!(rec.original_filename.as_deref(), Some("Dawn Over Water.jpg"));
    }

    #[test]
    fn second_intake_of_same_name_gets_suffixed_slug() {
        let project = ProjectFixture::new();
        let upload = project.upload_jpeg("dawn.jpg", 100, 100);

        let first = intake(&upload, &project.config).unwrap();
        let second = intake(&upload, &project.config).unwrap();

        assert_eq!(first.slug, "dawn");
        assert_eq!(second.slug, "dawn-1");
        assert_ne!(first.sku, second.sku);
    }

    #[test]
    fn rejected_extension_is_invalid_input() {
        let project = ProjectFixture::new();
        let upload = project.root().join("notes.txt");
        std::fs::write(&upload, "not an image").unwrap();

        let result = intake(&upload, &project.config);
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn missing_source_is_not_found() {
        let project = ProjectFixture::new();
        let result = intake(&project.root().join("ghost.jpg"), &project.config);
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }

    #[test]
    fn undecodable_upload_leaves_no_trace() {
        let project = ProjectFixture::new();
        let upload = project.root().join("broken.jpg");
        std::fs::write(&upload, b"jpeg in name only").unwrap();

        let result = intake(&upload, &project.config);
        assert!(matches!(result, Err(PipelineError::UnreadableImage { .. })));

        assert!(!project.config.unanalysed_root().join("broken").exists());
        let registry = Registry::load(&project.config.registry_path());
        assert!(registry.entries.is_empty());
    }

    // =========================================================================
    // delete_artwork
    // =========================================================================

    #[test]
    fn delete_removes_trees_and_registry_entry() {
        let project = ProjectFixture::new();
        let upload = project.upload_jpeg("dawn.jpg", 100, 100);
        let report = intake(&upload, &project.config).unwrap();

        delete_artwork(&report.slug, &project.config).unwrap();

        assert!(!report.dir.exists());
        let registry = Registry::load(&project.config.registry_path());
        assert!(registry.get("dawn").is_none());
    }

    #[test]
    fn delete_unknown_slug_is_not_found() {
        let project = ProjectFixture::new();
        let result = delete_artwork("ghost", &project.config);
        assert!(matches!(result, Err(PipelineError::NotFound(_))));
    }

    #[test]
    fn delete_does_not_disturb_other_slugs() {
        let project = ProjectFixture::new();
        let dawn = intake(&project.upload_jpeg("dawn.jpg", 100, 100), &project.config).unwrap();
        let dusk = intake(&project.upload_jpeg("dusk.jpg", 100, 100), &project.config).unwrap();

        delete_artwork(&dawn.slug, &project.config).unwrap();

        assert!(dusk.dir.exists());
        let registry = Registry::load(&project.config.registry_path());
        assert!(registry.get("dusk").is_some());
    }
}
