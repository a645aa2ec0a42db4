//! Pipeline configuration.
//!
//! A single `config.toml` at the project root configures the pipeline and
//! doubles as the project marker file the validator requires. Loading is
//! sparse: every section has stock defaults and a user file only needs the
//! keys it wants to override. Unknown keys are rejected to catch typos early.
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [sku]
//! prefix = "ART"            # SKU format: "<prefix>-<zero-padded number>"
//! digits = 5
//!
//! [dirs]                    # stage roots, relative to the project root
//! unanalysed = "unanalysed"
//! processed = "processed"
//! finalised = "finalised"
//! templates = "templates"   # mockup background templates
//!
//! [files]
//! registry = "registry.json"
//! tracker = "sku-tracker.json"
//!
//! [derivatives]
//! thumb_long_edge = 2000    # THUMB bound (never upscales)
//! analyse_long_edge = 3800  # ANALYSE bound (never upscales)
//! palette_size = 5          # dominant colours kept in QC metadata
//! palette_raster = 32       # downsample edge for colour counting
//!
//! [preview]
//! width = 2000
//! max_bytes = 614400        # 600 KiB byte budget
//! start_quality = 95
//! quality_step = 5
//! min_quality = 25
//!
//! [decode]
//! max_pixels = 0                     # 0 = no pixel cap for this pipeline
//! large_image_threshold = 100000000  # warn above this pixel count
//!
//! [analysis]
//! timeout_secs = 30         # bound handed to external analysis providers
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The project marker / configuration file name at the project root.
pub const CONFIG_FILENAME: &str = "config.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Pipeline configuration loaded from `config.toml`.
///
/// All fields have defaults; user files only specify overrides. The project
/// root is attached at load time and never serialized.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PipelineConfig {
    #[serde(skip)]
    root: PathBuf,
    /// SKU prefix and zero-pad width.
    pub sku: SkuConfig,
    /// Stage directory names under the project root.
    pub dirs: DirsConfig,
    /// State file names under the project root.
    pub files: FilesConfig,
    /// Derivative generation settings.
    pub derivatives: DerivativesConfig,
    /// Finalised preview generation settings.
    pub preview: PreviewConfig,
    /// Image decode limits.
    pub decode: DecodeConfig,
    /// External analysis provider settings.
    pub analysis: AnalysisConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("."),
            sku: SkuConfig::default(),
            dirs: DirsConfig::default(),
            files: FilesConfig::default(),
            derivatives: DerivativesConfig::default(),
            preview: PreviewConfig::default(),
            decode: DecodeConfig::default(),
            analysis: AnalysisConfig::default(),
        }
    }
}

impl PipelineConfig {
    /// Load `config.toml` from `root`, falling back to stock defaults when
    /// the file does not exist. The file's *absence* is only a problem for
    /// the validator, which checks for the marker itself.
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let path = root.join(CONFIG_FILENAME);
        let mut config: Self = if path.exists() {
            toml::from_str(&fs::read_to_string(&path)?)?
        } else {
            Self::default()
        };
        config.root = root.to_path_buf();
        config.validate()?;
        Ok(config)
    }

    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sku.prefix.is_empty() {
            return Err(ConfigError::Validation("sku.prefix must not be empty".into()));
        }
        if self.sku.digits == 0 {
            return Err(ConfigError::Validation("sku.digits must be non-zero".into()));
        }
        if self.derivatives.thumb_long_edge == 0 || self.derivatives.analyse_long_edge == 0 {
            return Err(ConfigError::Validation(
                "derivatives long edges must be non-zero".into(),
            ));
        }
        if self.derivatives.palette_size == 0 || self.derivatives.palette_raster == 0 {
            return Err(ConfigError::Validation(
                "derivatives.palette_size and palette_raster must be non-zero".into(),
            ));
        }
        if self.preview.width == 0 {
            return Err(ConfigError::Validation("preview.width must be non-zero".into()));
        }
        if self.preview.start_quality > 100 || self.preview.min_quality > 100 {
            return Err(ConfigError::Validation(
                "preview quality values must be 0-100".into(),
            ));
        }
        if self.preview.min_quality > self.preview.start_quality {
            return Err(ConfigError::Validation(
                "preview.min_quality must not exceed preview.start_quality".into(),
            ));
        }
        if self.preview.quality_step == 0 {
            return Err(ConfigError::Validation(
                "preview.quality_step must be non-zero".into(),
            ));
        }
        Ok(())
    }

    /// The project root this config was loaded from.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Attach a project root (used by `load` and by test fixtures).
    pub fn with_root(mut self, root: &Path) -> Self {
        self.root = root.to_path_buf();
        self
    }

    pub fn unanalysed_root(&self) -> PathBuf {
        self.root.join(&self.dirs.unanalysed)
    }

    pub fn processed_root(&self) -> PathBuf {
        self.root.join(&self.dirs.processed)
    }

    pub fn finalised_root(&self) -> PathBuf {
        self.root.join(&self.dirs.finalised)
    }

    pub fn templates_root(&self) -> PathBuf {
        self.root.join(&self.dirs.templates)
    }

    pub fn registry_path(&self) -> PathBuf {
        self.root.join(&self.files.registry)
    }

    pub fn tracker_path(&self) -> PathBuf {
        self.root.join(&self.files.tracker)
    }

    pub fn marker_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILENAME)
    }
}

/// SKU format settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SkuConfig {
    /// Prefix before the dash, e.g. `ART` in `ART-00042`.
    pub prefix: String,
    /// Zero-pad width of the numeric part.
    pub digits: usize,
}

impl Default for SkuConfig {
    fn default() -> Self {
        Self {
            prefix: "ART".to_string(),
            digits: 5,
        }
    }
}

/// Stage directory names, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DirsConfig {
    pub unanalysed: String,
    pub processed: String,
    pub finalised: String,
    /// Mockup background templates.
    pub templates: String,
}

impl Default for DirsConfig {
    fn default() -> Self {
        Self {
            unanalysed: "unanalysed".to_string(),
            processed: "processed".to_string(),
            finalised: "finalised".to_string(),
            templates: "templates".to_string(),
        }
    }
}

/// State file names, relative to the project root.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FilesConfig {
    /// Master slug → artifact-path index.
    pub registry: String,
    /// SKU tracker, stores only the last issued number.
    pub tracker: String,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            registry: "registry.json".to_string(),
            tracker: "sku-tracker.json".to_string(),
        }
    }
}

/// Derivative generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DerivativesConfig {
    /// Long-edge bound for THUMB derivatives. Never upscales.
    pub thumb_long_edge: u32,
    /// Long-edge bound for ANALYSE derivatives. Never upscales.
    pub analyse_long_edge: u32,
    /// How many dominant colours the QC metadata keeps.
    pub palette_size: usize,
    /// Edge of the square downsample used for colour frequency counting.
    pub palette_raster: u32,
}

impl Default for DerivativesConfig {
    fn default() -> Self {
        Self {
            thumb_long_edge: 2000,
            analyse_long_edge: 3800,
            palette_size: 5,
            palette_raster: 32,
        }
    }
}

/// Finalised preview settings. The preview is resized to `width` and then
/// re-encoded at decreasing quality until it fits `max_bytes` or the quality
/// floor is reached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PreviewConfig {
    pub width: u32,
    pub max_bytes: u64,
    pub start_quality: u8,
    pub quality_step: u8,
    pub min_quality: u8,
}

impl Default for PreviewConfig {
    fn default() -> Self {
        Self {
            width: 2000,
            max_bytes: 600 * 1024,
            start_quality: 95,
            quality_step: 5,
            min_quality: 25,
        }
    }
}

/// Image decode limits, passed explicitly into every decode. `max_pixels = 0`
/// lifts the pixel cap for this pipeline's decodes without touching any
/// global state; `large_image_threshold` flags unusually large artwork for
/// manual review via a warning.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DecodeConfig {
    /// Hard pixel cap (width × height). 0 = unlimited.
    pub max_pixels: u64,
    /// Log a warning for images above this pixel count. 0 = never.
    pub large_image_threshold: u64,
}

impl Default for DecodeConfig {
    fn default() -> Self {
        Self {
            max_pixels: 0,
            // ~10k x 10k artwork
            large_image_threshold: 100_000_000,
        }
    }
}

/// External analysis provider settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnalysisConfig {
    /// Bound a provider must apply to its external call before the pipeline
    /// falls back to mock analysis.
    pub timeout_secs: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { timeout_secs: 30 }
    }
}

/// Returns a fully-commented stock `config.toml` with all keys documented.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# artpipe configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.
#
# This file also marks the directory as an artpipe project: the validator
# reports a missing config.toml as a problem.

# ---------------------------------------------------------------------------
# SKU format: "<prefix>-<zero-padded number>", e.g. ART-00042
# ---------------------------------------------------------------------------
[sku]
prefix = "ART"
digits = 5

# ---------------------------------------------------------------------------
# Stage directories, relative to the project root
# ---------------------------------------------------------------------------
[dirs]
unanalysed = "unanalysed"
processed = "processed"
finalised = "finalised"

# Mockup background templates (first 9 *.jpg in name order are used).
templates = "templates"

# ---------------------------------------------------------------------------
# State files, relative to the project root
# ---------------------------------------------------------------------------
[files]
# Master slug -> artifact-path index.
registry = "registry.json"

# SKU tracker, stores only the last issued number.
tracker = "sku-tracker.json"

# ---------------------------------------------------------------------------
# Derivative generation
# ---------------------------------------------------------------------------
[derivatives]
# Long-edge bounds in pixels. Sources smaller than the bound are never
# upscaled.
thumb_long_edge = 2000
analyse_long_edge = 3800

# Dominant-colour palette recorded in the QC metadata.
palette_size = 5
palette_raster = 32

# ---------------------------------------------------------------------------
# Finalised preview
# ---------------------------------------------------------------------------
[preview]
# Target width; JPEG quality steps down from start_quality by quality_step
# until the file fits max_bytes or min_quality is reached.
width = 2000
max_bytes = 614400
start_quality = 95
quality_step = 5
min_quality = 25

# ---------------------------------------------------------------------------
# Image decoding
# ---------------------------------------------------------------------------
[decode]
# Hard cap on decoded pixels (width x height). 0 = unlimited; ultra-large
# artwork is expected here.
max_pixels = 0

# Images above this pixel count are logged for manual review. 0 = never.
large_image_threshold = 100000000

# ---------------------------------------------------------------------------
# Analysis provider
# ---------------------------------------------------------------------------
[analysis]
# Bound on an external analysis call; on timeout or any other provider
# failure the pipeline falls back to deterministic mock analysis.
timeout_secs = 30
"##
}
