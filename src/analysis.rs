//! Pluggable artwork analysis.
//!
//! The unanalysed → processed transition runs an analysis routine that
//! produces a JSON document (persisted as `<SKU>-FINAL.json`) and a derived
//! image (persisted as the processed ANALYSE artifact). The routine is a
//! trait so an external AI provider can be plugged in; the pipeline itself
//! ships only the deterministic [`MockAnalysis`].
//!
//! External providers are required to bound their own call time (the
//! configured `[analysis].timeout_secs` is handed to them at construction).
//! Whatever goes wrong — timeout, network error, malformed response —
//! [`analyse_with_fallback`] logs a warning and falls back to the mock
//! instead of propagating the failure: a flaky provider must never block the
//! pipeline.

use std::fs;
use std::path::Path;

use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AnalysisError {
    /// The provider failed (timeout, transport, malformed response).
    #[error("analysis provider failed: {0}")]
    Provider(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Output of one analysis run.
#[derive(Debug, Clone)]
pub struct Analysis {
    /// Full JSON document, including a `provider` key.
    pub document: serde_json::Value,
    /// Derived image bytes (JPEG), stored as the processed ANALYSE artifact.
    pub image_bytes: Vec<u8>,
}

/// An analysis routine. Implementations must apply a bounded timeout to any
/// external call; see the module docs.
pub trait AnalysisProvider {
    /// Short name used in logs and in the analysis document.
    fn name(&self) -> &str;

    fn analyse(&self, slug: &str, image: &Path) -> Result<Analysis, AnalysisError>;
}

/// Deterministic fallback: echoes the source image bytes as the derived
/// image and records that no external analysis ran.
pub struct MockAnalysis;

impl AnalysisProvider for MockAnalysis {
    fn name(&self) -> &str {
        "mock"
    }

    fn analyse(&self, slug: &str, image: &Path) -> Result<Analysis, AnalysisError> {
        let image_bytes = fs::read(image)?;
        Ok(Analysis {
            document: json!({
                "provider": "mock",
                "slug": slug,
                "notes": "external analysis unavailable or errored",
            }),
            image_bytes,
        })
    }
}

/// Run `provider` when configured, falling back to [`MockAnalysis`] on any
/// provider failure. Only IO errors from the mock itself propagate (the
/// image was already verified to exist by the caller, so that is a genuine
/// filesystem problem).
pub fn analyse_with_fallback(
    provider: Option<&dyn AnalysisProvider>,
    slug: &str,
    image: &Path,
) -> Result<Analysis, AnalysisError> {
    if let Some(provider) = provider {
        match provider.analyse(slug, image) {
            Ok(analysis) => {
                tracing::info!(slug, provider = provider.name(), "analysis succeeded");
                return Ok(analysis);
            }
            Err(err) => {
                tracing::warn!(
                    slug,
                    provider = provider.name(),
                    error = %err,
                    "analysis provider failed, using mock fallback",
                );
            }
        }
    } else {
        tracing::debug!(slug, "no analysis provider configured, using mock");
    }
    MockAnalysis.analyse(slug, image)
}
