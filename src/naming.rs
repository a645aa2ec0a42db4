//! Filename and slug conventions for the stage directories.
//!
//! Every artifact name in the pipeline is built here, so the layout rules
//! live in exactly one place:
//!
//! ```text
//! unanalysed/<slug>/
//! ├── <slug>.<ext>                      # original upload
//! ├── <SKU>-THUMB.jpg
//! ├── <SKU>-ANALYSE.jpg
//! └── <SKU>-QC.json
//! processed/<slug>/
//! ├── <slug>-<SKU>.jpg                  # main artwork
//! ├── <slug>-<SKU>-THUMB.jpg
//! ├── <slug>-<SKU>-ANALYSE.jpg
//! ├── <SKU>-QC.json
//! ├── <SKU>-FINAL.json
//! ├── <slug>-<SKU>-MU-01..09.jpg
//! └── THUMBS/<slug>-<SKU>-MU-01..09-THUMB.jpg
//! finalised/<slug>/
//! ├── <slug>-<SKU>.jpg
//! └── <slug>-<SKU>-PREVIEW.jpg
//! ```
//!
//! Derivative artifacts are always JPEG regardless of the upload format; the
//! original upload keeps its own extension.

use std::path::{Path, PathBuf};

use crate::sku::Sku;

/// Sub-folder of a processed artwork holding the mockup thumbnails.
pub const THUMBS_DIR: &str = "THUMBS";

/// A complete processed artwork carries exactly this many mockups.
pub const MOCKUP_COUNT: usize = 9;

/// Produce a lowercase, filesystem-safe slug from a raw name.
///
/// Keeps ASCII alphanumerics, collapses every other run of characters to a
/// single hyphen, and strips leading/trailing hyphens. Idempotent. Input
/// with no usable characters yields `"artwork"` — the result is never empty
/// and never contains a path separator.
///
/// - `"Sunset Over Lake"` → `"sunset-over-lake"`
/// - `"Côte d'Azur"` → `"c-te-d-azur"`
/// - `"../../etc"` → `"etc"`
pub fn sanitize_slug(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_hyphen = false;
    for ch in raw.chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_hyphen = true;
        }
    }
    if slug.is_empty() {
        "artwork".to_string()
    } else {
        slug
    }
}

/// A directory path under `base` for `slug` that does not already exist.
///
/// Appends `-1`, `-2`, … until the candidate is free, so a new artwork can
/// never overwrite an existing stage folder.
pub fn unique_slug(base: &Path, slug: &str) -> PathBuf {
    let candidate = base.join(slug);
    if !candidate.exists() {
        return candidate;
    }
    let mut counter = 1u32;
    loop {
        let candidate = base.join(format!("{slug}-{counter}"));
        if !candidate.exists() {
            return candidate;
        }
        counter += 1;
    }
}

// ---- unanalysed-stage artifacts (SKU-prefixed) ----

pub fn intake_thumb(dir: &Path, sku: &Sku) -> PathBuf {
    dir.join(format!("{sku}-THUMB.jpg"))
}

pub fn intake_analyse(dir: &Path, sku: &Sku) -> PathBuf {
    dir.join(format!("{sku}-ANALYSE.jpg"))
}

// ---- shared JSON artifacts (SKU-prefixed) ----

pub fn qc_json(dir: &Path, sku: &Sku) -> PathBuf {
    dir.join(format!("{sku}-QC.json"))
}

pub fn final_json(dir: &Path, sku: &Sku) -> PathBuf {
    dir.join(format!("{sku}-FINAL.json"))
}

// ---- processed/finalised-stage artifacts (slug + SKU) ----

pub fn main_image(dir: &Path, slug: &str, sku: &Sku) -> PathBuf {
    dir.join(format!("{slug}-{sku}.jpg"))
}

pub fn thumb_image(dir: &Path, slug: &str, sku: &Sku) -> PathBuf {
    dir.join(format!("{slug}-{sku}-THUMB.jpg"))
}

pub fn analyse_image(dir: &Path, slug: &str, sku: &Sku) -> PathBuf {
    dir.join(format!("{slug}-{sku}-ANALYSE.jpg"))
}

/// Mockup for 1-indexed `slot`, zero-padded to two digits.
pub fn mockup_image(dir: &Path, slug: &str, sku: &Sku, slot: usize) -> PathBuf {
    dir.join(format!("{slug}-{sku}-MU-{slot:02}.jpg"))
}

/// Thumbnail for mockup `slot`, inside the `THUMBS/` sub-folder.
pub fn mockup_thumb(dir: &Path, slug: &str, sku: &Sku, slot: usize) -> PathBuf {
    dir.join(THUMBS_DIR)
        .join(format!("{slug}-{sku}-MU-{slot:02}-THUMB.jpg"))
}

pub fn preview_image(dir: &Path, slug: &str, sku: &Sku) -> PathBuf {
    dir.join(format!("{slug}-{sku}-PREVIEW.jpg"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn sku() -> Sku {
        Sku::new("ART-00042")
    }

    // =========================================================================
    // sanitize_slug
    // =========================================================================

    #[test]
    fn sanitize_lowercases_and_hyphenates() {
        assert_eq!(sanitize_slug("Sunset Over Lake"), "sunset-over-lake");
    }

    #[test]
    fn sanitize_collapses_runs() {
        assert_eq!(sanitize_slug("a --- b___c"), "a-b-c");
    }

    #[test]
    fn sanitize_strips_leading_and_trailing_junk() {
        assert_eq!(sanitize_slug("--hello--"), "hello");
        assert_eq!(sanitize_slug("  spaced  "), "spaced");
    }

    #[test]
    fn sanitize_removes_path_separators() {
        let slug = sanitize_slug("../../etc/passwd");
        assert!(!slug.contains('/'));
        assert!(!slug.contains('\\'));
        assert_eq!(slug, "etc-passwd");
    }

    #[test]
    fn sanitize_is_idempotent() {
        for raw in ["Sunset Over Lake", "a --- b", "Côte d'Azur", "ALL-CAPS"] {
            let once = sanitize_slug(raw);
            assert_eq!(sanitize_slug(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn sanitize_never_empty() {
        assert_eq!(sanitize_slug(""), "artwork");
        assert_eq!(sanitize_slug("---"), "artwork");
        assert_eq!(sanitize_slug("日本語"), "artwork");
    }

    #[test]
    fn sanitize_keeps_digits() {
        assert_eq!(sanitize_slug("Piece No. 7 (final)"), "piece-no-7-final");
    }

    // =========================================================================
    // unique_slug
    // =========================================================================

    #[test]
    fn unique_slug_returns_plain_path_when_free() {
        let tmp = TempDir::new().unwrap();
        assert_eq!(unique_slug(tmp.path(), "dawn"), tmp.path().join("dawn"));
    }

    #[test]
    fn unique_slug_suffixes_on_collision() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir(tmp.path().join("dawn")).unwrap();
        assert_eq!(unique_slug(tmp.path(), "dawn"), tmp.path().join("dawn-1"));

        fs::create_dir(tmp.path().join("dawn-1")).unwrap();
        assert_eq!(unique_slug(tmp.path(), "dawn"), tmp.path().join("dawn-2"));
    }

    // =========================================================================
    // artifact builders
    // =========================================================================

    #[test]
    fn processed_artifact_names() {
        let dir = Path::new("/p/dawn");
        assert_eq!(
            main_image(dir, "dawn", &sku()),
            Path::new("/p/dawn/dawn-ART-00042.jpg")
        );
        assert_eq!(
            thumb_image(dir, "dawn", &sku()),
            Path::new("/p/dawn/dawn-ART-00042-THUMB.jpg")
        );
        assert_eq!(
            analyse_image(dir, "dawn", &sku()),
            Path::new("/p/dawn/dawn-ART-00042-ANALYSE.jpg")
        );
        assert_eq!(qc_json(dir, &sku()), Path::new("/p/dawn/ART-00042-QC.json"));
        assert_eq!(
            final_json(dir, &sku()),
            Path::new("/p/dawn/ART-00042-FINAL.json")
        );
    }

    #[test]
    fn mockup_names_are_zero_padded() {
        let dir = Path::new("/p/dawn");
        assert_eq!(
            mockup_image(dir, "dawn", &sku(), 3),
            Path::new("/p/dawn/dawn-ART-00042-MU-03.jpg")
        );
        assert_eq!(
            mockup_thumb(dir, "dawn", &sku(), 9),
            Path::new("/p/dawn/THUMBS/dawn-ART-00042-MU-09-THUMB.jpg")
        );
    }

    #[test]
    fn intake_artifact_names() {
        let dir = Path::new("/u/dawn");
        assert_eq!(
            intake_thumb(dir, &sku()),
            Path::new("/u/dawn/ART-00042-THUMB.jpg")
        );
        assert_eq!(
            intake_analyse(dir, &sku()),
            Path::new("/u/dawn/ART-00042-ANALYSE.jpg")
        );
    }

    #[test]
    fn preview_name() {
        assert_eq!(
            preview_image(Path::new("/f/dawn"), "dawn", &sku()),
            Path::new("/f/dawn/dawn-ART-00042-PREVIEW.jpg")
        );
    }
}
