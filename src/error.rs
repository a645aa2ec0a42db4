//! Crate-wide error taxonomy.
//!
//! Every recoverable failure a pipeline operation can produce maps onto one
//! of these variants:
//!
//! - [`PipelineError::NotFound`] — an expected file, slug, or stage directory
//!   is absent. Callers surface this as a 404-equivalent.
//! - [`PipelineError::OutOfScope`] — a resolved path is not a descendant of
//!   its configured stage root (path-traversal guard).
//! - [`PipelineError::UnreadableImage`] — the source bytes could not be
//!   decoded as an image. Surfaced as a 400-equivalent.
//! - [`PipelineError::InvalidInput`] — bad extension, unusable filename, or
//!   a folder with no recoverable SKU.
//! - [`PipelineError::Prerequisite`] — a stage transition's required
//!   predecessor artifact is missing; carries the first absent path.
//! - [`PipelineError::Encode`], [`PipelineError::Io`],
//!   [`PipelineError::Json`], [`PipelineError::Config`] — unexpected
//!   failures, wrapped with their cause and logged at the call site rather
//!   than swallowed.
//!
//! A corrupt SKU tracker or registry file is deliberately *not* an error:
//! readers treat unparseable state JSON as empty/default and log a warning
//! (see [`crate::registry`] and [`crate::sku`]). Validator findings are also
//! not errors — they are accumulated strings returned to the caller, who
//! decides severity.

use std::path::PathBuf;

use thiserror::Error;

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, PipelineError>;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// An expected file, slug, or stage directory is missing.
    #[error("not found: {0}")]
    NotFound(PathBuf),

    /// A resolved path escapes its configured stage root.
    #[error("path {path} is outside {root}")]
    OutOfScope { path: PathBuf, root: PathBuf },

    /// The file exists but cannot be decoded as an image.
    #[error("unreadable image {path}: {source}")]
    UnreadableImage {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// Malformed caller input (extension, filename, missing SKU).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A transition prerequisite is absent; names the first missing artifact.
    #[error("missing prerequisite: {0}")]
    Prerequisite(PathBuf),

    /// An image could not be encoded/written.
    #[error("failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("analysis failed: {0}")]
    Analysis(#[from] crate::analysis::AnalysisError),

    #[error("config error: {0}")]
    Config(#[from] crate::config::ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
