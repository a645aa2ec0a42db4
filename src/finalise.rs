//! The processed → finalised stage transition.
//!
//! Copies the processed main image into the finalised root, generates the
//! byte-capped listing preview, and attaches the listing metadata to the
//! registry record. The transition is all-or-nothing: every prerequisite
//! (the main image and all nine mockups) is checked before anything is
//! written, and the failure names the first missing artifact. The registry
//! update is the final step.
//!
//! The nine mockups stay in the processed folder and are referenced from
//! there; finalisation records their locations rather than duplicating the
//! files.

use std::fs;
use std::path::PathBuf;

use crate::config::PipelineConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::{DecodeLimits, generate_preview};
use crate::naming::{self, MOCKUP_COUNT};
use crate::registry::{self, ArtworkRecord, Registry, Status};
use crate::sku::{Sku, folder_sku};

/// Free-text listing metadata supplied at finalisation.
#[derive(Debug, Clone, Default)]
pub struct FinaliseMetadata {
    pub title: String,
    pub description: String,
    pub primary_colour: String,
    pub secondary_colour: String,
}

/// Finalise `slug`: copy the artwork, generate its preview, and mark the
/// registry record `finalised`.
pub fn finalise_artwork(
    slug: &str,
    metadata: &FinaliseMetadata,
    config: &PipelineConfig,
) -> Result<ArtworkRecord> {
    let slug = naming::sanitize_slug(slug);
    let processed_dir = config.processed_root().join(&slug);
    if !processed_dir.is_dir() {
        return Err(PipelineError::NotFound(processed_dir));
    }

    let sku = Registry::load(&config.registry_path())
        .get(&slug)
        .and_then(|rec| rec.sku.clone())
        .map(Sku::new)
        .or_else(|| folder_sku(&processed_dir, &config.sku.prefix))
        .ok_or_else(|| {
            PipelineError::InvalidInput(format!("no SKU recorded or recoverable for {slug}"))
        })?;

    // Full prerequisite sweep before any destructive copy.
    let main = naming::main_image(&processed_dir, &slug, &sku);
    if !main.is_file() {
        tracing::error!(slug, missing = %main.display(), "processed image missing");
        return Err(PipelineError::Prerequisite(main));
    }
    let mut mockups: Vec<PathBuf> = Vec::with_capacity(MOCKUP_COUNT);
    for slot in 1..=MOCKUP_COUNT {
        let mockup = naming::mockup_image(&processed_dir, &slug, &sku, slot);
        if !mockup.is_file() {
            tracing::error!(slug, missing = %mockup.display(), "mockup missing");
            return Err(PipelineError::Prerequisite(mockup));
        }
        mockups.push(mockup);
    }

    let dest_dir = config.finalised_root().join(&slug);
    fs::create_dir_all(&dest_dir)?;

    let final_path = naming::main_image(&dest_dir, &slug, &sku);
    fs::copy(&main, &final_path)?;
    tracing::info!(slug, artwork = %final_path.display(), "copied artwork into finalised");

    let preview = naming::preview_image(&dest_dir, &slug, &sku);
    if preview.exists() {
        tracing::info!(slug, preview = %preview.display(), "preview already exists");
    } else {
        let limits = DecodeLimits::from_config(&config.decode);
        generate_preview(&final_path, &preview, &config.preview, &limits)?;
    }

    let record = registry::update(&config.registry_path(), &slug, |rec| {
        rec.sku = Some(sku.to_string());
        rec.status = Some(Status::Finalised);
        rec.image = Some(registry::abs_path_string(&final_path));
        rec.preview = Some(registry::abs_path_string(&preview));
        rec.mockups = mockups.iter().map(|m| registry::abs_path_string(m)).collect();
        rec.title = Some(metadata.title.clone());
        rec.description = Some(metadata.description.clone());
        rec.primary_colour = Some(metadata.primary_colour.clone());
        rec.secondary_colour = Some(metadata.secondary_colour.clone());
    })?;

    tracing::info!(slug, sku = %sku, "finalisation complete");
    Ok(record)
}
