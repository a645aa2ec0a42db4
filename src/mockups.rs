//! Mockup composition for processed artworks.
//!
//! Each processed artwork gets up to [`naming::MOCKUP_COUNT`] composites: the
//! artwork pasted at the origin onto a background template. Templates are the
//! first nine `*.jpg` files of the template directory in name order, so slot
//! numbers are stable across runs.
//!
//! Per-slot rules:
//! - an existing mockup file is never re-rendered — regeneration on demand
//!   means the caller removes the files it wants refreshed first;
//! - a template whose pixel dimensions differ from the artwork's is skipped
//!   with a warning — a partial mockup set is a valid, reportable outcome,
//!   not a failure;
//! - every rendered mockup gets a matching thumbnail in `THUMBS/`, and a
//!   missing thumbnail next to an existing mockup is filled in from the file
//!   on disk.

use std::fs;
use std::path::{Path, PathBuf};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{
    DecodeLimits, encode_jpeg_atomic, load_image, read_dimensions, write_bounded_jpeg,
};
use crate::naming::{self, MOCKUP_COUNT};
use crate::registry::Registry;
use crate::sku::{Sku, folder_sku};

/// Composite the processed artwork for `slug` onto the background templates.
///
/// Returns the paths of all mockups present after the run (pre-existing and
/// newly rendered), in slot order.
pub fn generate_mockups(slug: &str, config: &PipelineConfig) -> Result<Vec<PathBuf>> {
    let slug = naming::sanitize_slug(slug);
    let dir = config.processed_root().join(&slug);
    if !dir.is_dir() {
        return Err(PipelineError::NotFound(dir));
    }

    let sku = Registry::load(&config.registry_path())
        .get(&slug)
        .and_then(|rec| rec.sku.clone())
        .map(Sku::new)
        .or_else(|| folder_sku(&dir, &config.sku.prefix))
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("no SKU recorded or recoverable for {slug}"))
        })?;

    let main = naming::main_image(&dir, &slug, &sku);
    if !main.is_file() {
        tracing::error!(slug, main = %main.display(), "processed image missing");
        return Err(PipelineError::NotFound(main));
    }

    let templates = first_templates(&config.templates_root());
    if templates.is_empty() {
        tracing::warn!(
            templates = %config.templates_root().display(),
            "no mockup templates available"
        );
        return Ok(Vec::new());
    }

    let limits = DecodeLimits::from_config(&config.decode);
    let art_dims = read_dimensions(&main)?;
    let art = load_image(&main, &limits)?;

    let mut produced = Vec::new();
    for (idx, template) in templates.iter().enumerate() {
        let slot = idx + 1;
        let out = naming::mockup_image(&dir, &slug, &sku, slot);
        let thumb = naming::mockup_thumb(&dir, &slug, &sku, slot);

        if out.exists() {
            tracing::info!(slug, slot, "mockup already exists, skipping");
            if !thumb.exists() {
                let existing = load_image(&out, &limits)?;
                write_bounded_jpeg(&existing, &thumb, config.derivatives.thumb_long_edge)?;
                tracing::info!(slug, slot, "filled in missing mockup thumbnail");
            }
            produced.push(out);
            continue;
        }

        let template_dims = read_dimensions(template)?;
        if template_dims != art_dims {
            tracing::warn!(
                slug,
                slot,
                template = %template.display(),
                template_dims = ?template_dims,
                artwork_dims = ?art_dims,
                "size mismatch, skipping slot"
            );
            continue;
        }

        let mut composite = load_image(template, &limits)?;
        image::imageops::overlay(&mut composite, &art, 0, 0);
        encode_jpeg_atomic(&composite, &out)?;
        write_bounded_jpeg(&composite, &thumb, config.derivatives.thumb_long_edge)?;
        tracing::info!(slug, slot, mockup = %out.display(), "mockup saved");
        produced.push(out);
    }

    Ok(produced)
}

/// First nine `*.jpg` templates in lexicographic name order.
fn first_templates(dir: &Path) -> Vec<PathBuf> {
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(_) => return Vec::new(),
    };
    let mut templates: Vec<PathBuf> = entries
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| {
            p.is_file()
                && p.extension()
                    .and_then(|e| e.to_str())
                    .is_some_and(|e| e.eq_ignore_ascii_case("jpg"))
        })
        .collect();
    templates.sort();
    templates.truncate(MOCKUP_COUNT);
    templates
}
