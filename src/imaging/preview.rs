//! Byte-capped preview generation for finalised listings.
//!
//! The preview is normalised to a fixed target width and re-encoded at
//! stepwise-decreasing JPEG quality until it fits the byte budget or the
//! quality floor is hit. The loop is a deliberate quality/size trade-off:
//! the stop condition is `size <= max_bytes || quality <= min_quality`, so a
//! very detailed artwork may legitimately ship a floor-quality preview that
//! still exceeds the budget.

use std::fs;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::DynamicImage;

use crate::atomic;
use crate::config::PreviewConfig;
use crate::error::{PipelineError, Result};
use crate::imaging::decode::{DecodeLimits, load_image};

/// Generate the preview for `source` at `dest`.
pub fn generate_preview(
    source: &Path,
    dest: &Path,
    config: &PreviewConfig,
    limits: &DecodeLimits,
) -> Result<()> {
    let img = load_image(source, limits)?;

    let img = if img.width() != config.width {
        let height = (f64::from(img.height()) * f64::from(config.width)
            / f64::from(img.width()))
        .round()
        .max(1.0) as u32;
        img.resize_exact(config.width, height, FilterType::Lanczos3)
    } else {
        img
    };
    let img = DynamicImage::ImageRgb8(img.to_rgb8());

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let tmp = atomic::staging_path(dest);

    let mut quality = config.start_quality;
    loop {
        let file = fs::File::create(&tmp)?;
        let encoder = JpegEncoder::new_with_quality(BufWriter::new(file), quality);
        img.write_with_encoder(encoder)
            .map_err(|source| PipelineError::Encode {
                path: tmp.clone(),
                source,
            })?;

        let size = fs::metadata(&tmp)?.len();
        if size <= config.max_bytes || quality <= config.min_quality {
            tracing::info!(
                preview = %dest.display(),
                bytes = size,
                quality,
                "preview encoded"
            );
            break;
        }
        quality = quality.saturating_sub(config.quality_step);
    }

    fs::rename(&tmp, dest)?;
    Ok(())
}
