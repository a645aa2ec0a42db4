//! Image decoding with explicit, per-call limits.
//!
//! Ultra-large artwork is normal in this pipeline, so the decoder's built-in
//! decompression-bomb guard is relaxed — but as a scoped [`DecodeLimits`]
//! value built from `[decode]` config and passed into each decode, never as a
//! process-wide override. Images above the configured threshold are logged
//! for manual review; images above the hard cap (when one is set) are
//! rejected before any pixel work happens.

use std::path::Path;

use image::{DynamicImage, ImageReader, Limits};

use crate::config::DecodeConfig;
use crate::error::{PipelineError, Result};

/// Per-call decode policy. `max_pixels == 0` means no hard cap;
/// `warn_pixels == 0` disables the large-image warning.
#[derive(Debug, Clone, Copy)]
pub struct DecodeLimits {
    pub max_pixels: u64,
    pub warn_pixels: u64,
}

impl DecodeLimits {
    pub fn from_config(config: &DecodeConfig) -> Self {
        Self {
            max_pixels: config.max_pixels,
            warn_pixels: config.large_image_threshold,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::from_config(&DecodeConfig::default())
    }
}

/// Read image dimensions from the header without a full decode.
pub fn read_dimensions(path: &Path) -> Result<(u32, u32)> {
    image::image_dimensions(path).map_err(|source| PipelineError::UnreadableImage {
        path: path.to_path_buf(),
        source,
    })
}

/// Decode an image, applying `limits` to this call only.
pub fn load_image(path: &Path, limits: &DecodeLimits) -> Result<DynamicImage> {
    let (width, height) = read_dimensions(path)?;
    let pixels = u64::from(width) * u64::from(height);

    if limits.max_pixels != 0 && pixels > limits.max_pixels {
        return Err(PipelineError::InvalidInput(format!(
            "image {} is {pixels} px, over the {} px decode cap",
            path.display(),
            limits.max_pixels
        )));
    }
    if limits.warn_pixels != 0 && pixels > limits.warn_pixels {
        tracing::warn!(
            path = %path.display(),
            width,
            height,
            "large image loaded"
        );
    }

    let mut reader = ImageReader::open(path)?;
    // The pixel policy above is the whole policy; the image crate's default
    // allocation guard must not second-guess it.
    reader.limits(Limits::no_limits());
    reader
        .decode()
        .map_err(|source| PipelineError::UnreadableImage {
            path: path.to_path_buf(),
            source,
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::create_test_jpeg;
    use tempfile::TempDir;

    #[test]
    fn read_dimensions_of_synthetic_jpeg() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("art.jpg");
        create_test_jpeg(&path, 320, 200);
        assert_eq!(read_dimensions(&path).unwrap(), (320, 200));
    }

    #[test]
    fn load_image_decodes() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("art.jpg");
        create_test_jpeg(&path, 64, 48);

        let img = load_image(&path, &DecodeLimits::default()).unwrap();
        assert_eq!(img.width(), 64);
        assert_eq!(img.height(), 48);
    }

    #[test]
    fn non_image_bytes_are_unreadable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("not-art.jpg");
        std::fs::write(&path, b"definitely not a jpeg").unwrap();

        let result = load_image(&path, &DecodeLimits::default());
        assert!(matches!(
            result,
            Err(PipelineError::UnreadableImage { .. })
        ));
    }

    #[test]
    fn hard_cap_rejects_before_decode() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("art.jpg");
        create_test_jpeg(&path, 100, 100);

        let limits = DecodeLimits {
            max_pixels: 50 * 50,
            warn_pixels: 0,
        };
        let result = load_image(&path, &limits);
        assert!(matches!(result, Err(PipelineError::InvalidInput(_))));
    }

    #[test]
    fn zero_cap_means_unlimited() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("art.jpg");
        create_test_jpeg(&path, 100, 100);

        let limits = DecodeLimits {
            max_pixels: 0,
            warn_pixels: 1, // fires the warning path, must not fail
        };
        assert!(load_image(&path, &limits).is_ok());
    }
}
