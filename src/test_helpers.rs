//! Shared test fixtures for the artpipe test suite.
//!
//! Provides a temp-directory project scaffold, synthetic image writers, and
//! builders for complete stage units. Validator tests use placeholder bytes
//! (existence is all that is checked); imaging and lifecycle tests use real
//! synthetic JPEG/PNG files.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{ExtendedColorType, ImageEncoder, Rgb, RgbImage};
use tempfile::TempDir;

use crate::config::{self, PipelineConfig};
use crate::naming::{MOCKUP_COUNT, THUMBS_DIR};

/// A temp-directory artpipe project: stage roots, template dir, and a stock
/// `config.toml` marker, with the matching [`PipelineConfig`] loaded.
pub struct ProjectFixture {
    // Held for its Drop; the path is reachable through `config`.
    _tmp: TempDir,
    pub config: PipelineConfig,
}

impl ProjectFixture {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        fs::write(
            tmp.path().join(config::CONFIG_FILENAME),
            config::stock_config_toml(),
        )
        .unwrap();
        let config = PipelineConfig::load(tmp.path()).unwrap();
        for dir in [
            config.unanalysed_root(),
            config.processed_root(),
            config.finalised_root(),
            config.templates_root(),
        ] {
            fs::create_dir_all(dir).unwrap();
        }
        Self { _tmp: tmp, config }
    }

    pub fn root(&self) -> &Path {
        self.config.root()
    }

    /// Write a synthetic JPEG upload into the project root and return its
    /// path.
    pub fn upload_jpeg(&self, name: &str, width: u32, height: u32) -> PathBuf {
        let path = self.root().join(name);
        create_test_jpeg(&path, width, height);
        path
    }

    /// Lay down `count` mockup templates of the given size.
    pub fn add_templates(&self, count: usize, width: u32, height: u32) {
        for n in 1..=count {
            create_test_jpeg(
                &self.config.templates_root().join(format!("template-{n}.jpg")),
                width,
                height,
            );
        }
    }
}

/// Create a small valid JPEG with a gradient fill.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let file = fs::File::create(path).unwrap();
    JpegEncoder::new(BufWriter::new(file))
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid PNG with a gradient fill.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x % 256) as u8, 64, (y % 256) as u8])
    });
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let file = fs::File::create(path).unwrap();
    PngEncoder::new(BufWriter::new(file))
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a JPEG of deterministic pseudo-random noise. Noise defeats JPEG
/// compression, which the preview byte-budget tests rely on.
pub fn create_noise_jpeg(path: &Path, width: u32, height: u32) {
    let mut state: u32 = 0x1234_5678;
    let mut next = move || {
        state = state.wrapping_mul(1_664_525).wrapping_add(1_013_904_223);
        (state >> 24) as u8
    };
    let img = RgbImage::from_fn(width, height, |_, _| Rgb([next(), next(), next()]));
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let file = fs::File::create(path).unwrap();
    JpegEncoder::new_with_quality(BufWriter::new(file), 100)
        .write_image(img.as_raw(), width, height, ExtendedColorType::Rgb8)
        .unwrap();
}

/// Placeholder-file unanalysed unit in sub-folder form. The validator only
/// checks existence, so the bytes don't matter.
pub fn complete_unanalysed_unit(config: &PipelineConfig, slug: &str, sku: &str) {
    let dir = config.unanalysed_root().join(slug);
    fs::create_dir_all(&dir).unwrap();
    fs::write(dir.join(format!("{slug}.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{sku}-THUMB.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{sku}-ANALYSE.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{sku}-QC.json")), "{}").unwrap();
}

/// Placeholder-file processed unit with all nine mockups and thumbs.
pub fn complete_processed_unit(config: &PipelineConfig, slug: &str, sku: &str) {
    let dir = config.processed_root().join(slug);
    let thumbs = dir.join(THUMBS_DIR);
    fs::create_dir_all(&thumbs).unwrap();

    fs::write(dir.join(format!("{slug}-{sku}.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{slug}-{sku}-THUMB.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{slug}-{sku}-ANALYSE.jpg")), "x").unwrap();
    fs::write(dir.join(format!("{sku}-QC.json")), "{}").unwrap();
    fs::write(dir.join(format!("{sku}-FINAL.json")), "{}").unwrap();
    for slot in 1..=MOCKUP_COUNT {
        fs::write(dir.join(format!("{slug}-{sku}-MU-{slot:02}.jpg")), "x").unwrap();
        fs::write(
            thumbs.join(format!("{slug}-{sku}-MU-{slot:02}-THUMB.jpg")),
            "x",
        )
        .unwrap();
    }
}
