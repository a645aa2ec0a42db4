//! The unanalysed → processed stage transition.
//!
//! Moves an artwork's ANALYSE derivative out of its unanalysed folder to
//! become the processed main image (a rename, not a copy — there is exactly
//! one source of truth for the artwork file), carries the QC metadata along,
//! regenerates a THUMB for the processed image, runs the analysis routine,
//! and finally records the new locations in the registry.
//!
//! Ordering matters: the registry update is the last step, so the registry
//! never references a path that does not exist yet. The caller-supplied slug
//! is resolved against the unanalysed root and rejected if its canonical
//! form escapes it.

use std::fs;
use std::path::{Path, PathBuf};

use crate::analysis::{AnalysisProvider, analyse_with_fallback};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{DecodeLimits, load_image, write_bounded_jpeg};
use crate::naming;
use crate::registry::{self, ArtworkRecord, Registry, Status};
use crate::sku::{Sku, folder_sku};
use crate::atomic;

/// Outcome of a successful unanalysed → processed transition.
#[derive(Debug, Clone)]
pub struct ProcessReport {
    pub slug: String,
    pub sku: Sku,
    pub dir: PathBuf,
    pub record: ArtworkRecord,
}

/// Move `slug` from the unanalysed stage to the processed stage and run
/// analysis on it.
pub fn process_artwork(
    slug: &str,
    provider: Option<&dyn AnalysisProvider>,
    config: &PipelineConfig,
) -> Result<ProcessReport> {
    let source_dir = resolve_in_root(&config.unanalysed_root(), slug)?;

    let sku = Registry::load(&config.registry_path())
        .get(slug)
        .and_then(|rec| rec.sku.clone())
        .map(Sku::new)
        .or_else(|| folder_sku(&source_dir, &config.sku.prefix))
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("no SKU recorded or recoverable for {slug}"))
        })?;

    let analyse_src = naming::intake_analyse(&source_dir, &sku);
    if !analyse_src.is_file() {
        tracing::error!(slug, missing = %analyse_src.display(), "analysis source absent");
        return Err(PipelineError::NotFound(analyse_src));
    }

    let dest_dir = config.processed_root().join(slug);
    fs::create_dir_all(&dest_dir)?;

    // Move, don't copy: a single source of truth for the artwork file.
    let main = naming::main_image(&dest_dir, slug, &sku);
    fs::rename(&analyse_src, &main)?;
    tracing::info!(slug, main = %main.display(), "moved artwork into processed");

    let qc_src = naming::qc_json(&source_dir, &sku);
    let qc_dest = naming::qc_json(&dest_dir, &sku);
    if qc_src.is_file() {
        fs::rename(&qc_src, &qc_dest)?;
    } else {
        tracing::warn!(slug, qc = %qc_src.display(), "no QC metadata to carry along");
    }

    let limits = DecodeLimits::from_config(&config.decode);
    let img = load_image(&main, &limits)?;
    let thumb = naming::thumb_image(&dest_dir, slug, &sku);
    write_bounded_jpeg(&img, &thumb, config.derivatives.thumb_long_edge)?;

    let analysis = analyse_with_fallback(provider, slug, &main)?;
    let final_json = naming::final_json(&dest_dir, &sku);
    atomic::write_json(&final_json, &analysis.document)?;
    let aux_image = naming::analyse_image(&dest_dir, slug, &sku);
    atomic::write_bytes(&aux_image, &analysis.image_bytes)?;

    let record = registry::update(&config.registry_path(), slug, |rec| {
        rec.sku = Some(sku.to_string());
        rec.status = Some(Status::Processed);
        rec.image = Some(registry::abs_path_string(&main));
        rec.thumb = Some(registry::abs_path_string(&thumb));
        rec.analyse = Some(registry::abs_path_string(&aux_image));
        if qc_dest.is_file() {
            rec.qc = Some(registry::abs_path_string(&qc_dest));
        }
        rec.analysis = Some(registry::abs_path_string(&final_json));
    })?;

    tracing::info!(slug, sku = %sku, "analysis complete");

    Ok(ProcessReport {
        slug: slug.to_string(),
        sku,
        dir: dest_dir,
        record,
    })
}

/// Resolve `<root>/<slug>` and reject any result whose canonical form is not
/// a descendant of `root`.
fn resolve_in_root(root: &Path, slug: &str) -> Result<PathBuf> {
    let joined = root.join(slug);
    let canonical_root = root
        .canonicalize()
        .map_err(|_| PipelineError::NotFound(joined.clone()))?;
    let canonical = joined
        .canonicalize()
        .map_err(|_| PipelineError::NotFound(joined.clone()))?;
    if !canonical.starts_with(&canonical_root) {
        return Err(PipelineError::OutOfScope {
            path: canonical,
            root: canonical_root,
        });
    }
    Ok(canonical)
}
