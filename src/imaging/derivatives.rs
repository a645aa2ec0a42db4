//! Derivative generation: the THUMB/ANALYSE pair plus QC metadata.
//!
//! Every intake produces two long-edge-bounded JPEG copies of the source
//! (a moderate THUMB and a larger ANALYSE image) and a QC metadata document
//! recording dimensions, colour mode, an aspect label, and the dominant
//! colour palette.
//!
//! The pair is a logical unit: both derivatives are encoded to temp files
//! first and only renamed into place once both encodes succeeded. Restart
//! logic can therefore treat a folder holding one derivative but not the
//! other as "not yet processed" — that state only arises from a crash
//! between the two renames, never from a failed encode.
//!
//! Resizing only constrains the long edge downward; sources smaller than the
//! bound are re-encoded at their own size, never upscaled.

use std::collections::BTreeMap;
use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage};
use serde::{Deserialize, Serialize};

use crate::atomic;
use crate::config::DerivativesConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::decode::{DecodeLimits, load_image};
use crate::sku::Sku;

/// JPEG quality for derivative and mockup encodes.
const JPEG_QUALITY: u8 = 90;

/// Destination paths for one derivative run. Built by callers from the
/// [`crate::naming`] conventions (sub-folder form at intake, flat stem-based
/// form in the repair tool).
#[derive(Debug, Clone)]
pub struct DerivativePaths {
    pub thumb: PathBuf,
    pub analyse: PathBuf,
    pub qc: PathBuf,
}

/// QC metadata written next to the derivative pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QcMetadata {
    pub sku: Sku,
    pub original_filename: String,
    pub width: u32,
    pub height: u32,
    pub colour_mode: String,
    pub aspect: String,
    /// Hex `#rrggbb` triplets, most frequent first.
    pub palette: Vec<String>,
}

/// Result of a successful derivative run.
#[derive(Debug, Clone)]
pub struct DerivativeSet {
    pub thumb: PathBuf,
    pub analyse: PathBuf,
    pub qc: PathBuf,
    pub metadata: QcMetadata,
}

/// Generate the THUMB/ANALYSE pair and QC metadata for `source`.
///
/// Fails with [`PipelineError::UnreadableImage`] before writing anything if
/// the source cannot be decoded.
pub fn make_derivatives(
    source: &Path,
    paths: &DerivativePaths,
    sku: &Sku,
    config: &DerivativesConfig,
    limits: &DecodeLimits,
) -> Result<DerivativeSet> {
    let img = load_image(source, limits)?;

    let metadata = QcMetadata {
        sku: sku.clone(),
        original_filename: source
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default(),
        width: img.width(),
        height: img.height(),
        colour_mode: colour_mode(&img),
        aspect: aspect_label(img.width(), img.height()).to_string(),
        palette: dominant_colours(&img, config.palette_raster, config.palette_size),
    };

    // Encode both to temp paths; rename only after both succeeded so the
    // pair lands together.
    let thumb_tmp = atomic::staging_path(&paths.thumb);
    let analyse_tmp = atomic::staging_path(&paths.analyse);
    encode_bounded_to(&img, &thumb_tmp, config.thumb_long_edge)?;
    if let Err(err) = encode_bounded_to(&img, &analyse_tmp, config.analyse_long_edge) {
        let _ = fs::remove_file(&thumb_tmp);
        return Err(err);
    }
    fs::rename(&thumb_tmp, &paths.thumb)?;
    fs::rename(&analyse_tmp, &paths.analyse)?;

    atomic::write_json(&paths.qc, &metadata)?;

    tracing::info!(
        sku = %sku,
        thumb = %paths.thumb.display(),
        analyse = %paths.analyse.display(),
        "derivatives written"
    );

    Ok(DerivativeSet {
        thumb: paths.thumb.clone(),
        analyse: paths.analyse.clone(),
        qc: paths.qc.clone(),
        metadata,
    })
}

/// Dimensions after bounding the long edge to `bound`, preserving aspect
/// ratio. Never upscales: a source already within the bound keeps its size.
pub fn bounded_dimensions(source: (u32, u32), bound: u32) -> (u32, u32) {
    let (w, h) = source;
    let long = w.max(h);
    if long <= bound || long == 0 {
        return (w, h);
    }
    let scale = f64::from(bound) / f64::from(long);
    let scaled_w = (f64::from(w) * scale).round().max(1.0) as u32;
    let scaled_h = (f64::from(h) * scale).round().max(1.0) as u32;
    (scaled_w, scaled_h)
}

/// Resize (if needed) and encode as JPEG at `dest` — non-atomic, used for
/// staged writes.
fn encode_bounded_to(img: &DynamicImage, dest: &Path, bound: u32) -> Result<()> {
    let (w, h) = (img.width(), img.height());
    let (tw, th) = bounded_dimensions((w, h), bound);
    if (tw, th) == (w, h) {
        encode_jpeg(img, dest)
    } else {
        // The target box already preserves the source ratio, so exact
        // resizing cannot distort.
        let resized = img.resize_exact(tw, th, FilterType::Lanczos3);
        encode_jpeg(&resized, dest)
    }
}

/// Resize (if needed) and encode as JPEG atomically. Used for the processed
/// THUMB regeneration and mockup thumbnails, where single files stand alone.
pub fn write_bounded_jpeg(img: &DynamicImage, dest: &Path, bound: u32) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = atomic::staging_path(dest);
    encode_bounded_to(img, &tmp, bound)?;
    fs::rename(&tmp, dest)?;
    Ok(())
}

/// Encode `img` as JPEG at `dest` atomically, at the derivative quality.
pub fn encode_jpeg_atomic(img: &DynamicImage, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = atomic::staging_path(dest);
    encode_jpeg(img, &tmp)?;
    fs::rename(&tmp, dest)?;
    Ok(())
}

fn encode_jpeg(img: &DynamicImage, dest: &Path) -> Result<()> {
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let file = fs::File::create(dest)?;
    let writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(writer, JPEG_QUALITY);
    // JPEG has no alpha channel; flatten whatever the source mode was.
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|source| PipelineError::Encode {
            path: dest.to_path_buf(),
            source,
        })
}

/// Dominant colours: downsample to a `raster`² grid with nearest-neighbour
/// (keeps exact source colours), count RGB frequencies, and return the top
/// `count` as hex triplets. Ties break on channel value so the result is
/// deterministic.
pub fn dominant_colours(img: &DynamicImage, raster: u32, count: usize) -> Vec<String> {
    let small = img
        .resize_exact(raster, raster, FilterType::Nearest)
        .to_rgb8();

    let mut freq: BTreeMap<[u8; 3], u32> = BTreeMap::new();
    for pixel in small.pixels() {
        *freq.entry(pixel.0).or_insert(0) += 1;
    }

    let mut ranked: Vec<([u8; 3], u32)> = freq.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked.truncate(count);

    ranked
        .into_iter()
        .map(|([r, g, b], _)| format!("#{r:02x}{g:02x}{b:02x}"))
        .collect()
}

/// Nearest aspect-ratio label for QC metadata.
fn aspect_label(width: u32, height: u32) -> &'static str {
    if height == 0 {
        return "unknown";
    }
    let ratio = f64::from(width) / f64::from(height);
    const LABELS: &[(&str, f64)] = &[
        ("square", 1.0),
        ("4x5", 0.8),
        ("5x4", 1.25),
        ("3x4", 0.75),
        ("4x3", 4.0 / 3.0),
        ("16x9", 16.0 / 9.0),
        ("9x16", 9.0 / 16.0),
    ];
    let mut best = LABELS[0];
    for &candidate in LABELS {
        if (ratio - candidate.1).abs() < (ratio - best.1).abs() {
            best = candidate;
        }
    }
    best.0
}

fn colour_mode(img: &DynamicImage) -> String {
    match img.color() {
        ColorType::L8 => "L8".to_string(),
        ColorType::La8 => "LA8".to_string(),
        ColorType::Rgb8 => "RGB8".to_string(),
        ColorType::Rgba8 => "RGBA8".to_string(),
        ColorType::L16 => "L16".to_string(),
        ColorType::La16 => "LA16".to_string(),
        ColorType::Rgb16 => "RGB16".to_string(),
        ColorType::Rgba16 => "RGBA16".to_string(),
        other => format!("{other:?}"),
    }
}
