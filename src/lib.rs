//! # artpipe
//!
//! An artwork intake-and-publishing pipeline. Uploaded images move through
//! three folder-based lifecycle stages, tracked by sequential SKUs and a
//! durable slug → artifact-path registry:
//!
//! ```text
//! 1. Intake    upload       →  unanalysed/<slug>/   (derivatives + QC metadata)
//! 2. Analyse   unanalysed   →  processed/<slug>/    (move + analysis + FINAL json)
//! 3. Finalise  processed    →  finalised/<slug>/    (preview + listing metadata)
//! ```
//!
//! Mockup composition sits beside stage 2/3 (processed artworks get nine
//! template composites), and an independent read-only validator audits the
//! whole tree against the required-file shape of each stage.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`intake`] | Stage 1 — upload intake, slug + SKU assignment, and artwork deletion |
//! | [`analyse`] | Stage 2 — unanalysed → processed move and analysis run |
//! | [`finalise`] | Stage 3 — processed → finalised copy, preview, listing metadata |
//! | [`mockups`] | Template composites + THUMBS for processed artworks |
//! | [`validate`] | Read-only integrity audit of the directory tree |
//! | [`repair`] | Orphan-SKU scan/repair tooling |
//! | [`analysis`] | Pluggable analysis provider trait + deterministic mock |
//! | [`imaging`] | Decode limits, derivatives, palette, byte-capped preview |
//! | [`naming`] | Slug sanitization and every artifact filename convention |
//! | [`sku`] | Sequential SKU allocator + SKU extraction from names |
//! | [`registry`] | The slug → artifact-path JSON index |
//! | [`config`] | `config.toml` loading, defaults, validation |
//! | [`atomic`] | Write-temp-then-rename persistence primitives |
//! | [`error`] | Crate-wide error taxonomy |
//!
//! # Design Decisions
//!
//! ## The directory tree is the wire format
//!
//! Each stage root has a fixed required-file shape (see [`naming`]), and the
//! validator treats that shape as the contract. The registry is the durable
//! index over the tree, not a replacement for it: transitions write files
//! first and update the registry as their final step, so the registry never
//! references a path that does not exist.
//!
//! ## Atomic state writes, tolerant state reads
//!
//! Every JSON state file (registry, SKU tracker, QC, FINAL) is written
//! temp-then-rename in its own directory. Readers treat a parse failure as
//! "empty/default" with a warning — a crash mid-write degrades to a warning,
//! never to a corrupted pipeline.
//!
//! ## Single writer, no locks
//!
//! Operations run one at a time on one thread; there is no locking around
//! the tracker or registry read-modify-write cycles. This is an explicit,
//! documented assumption of the design (see [`sku`]), not an oversight —
//! callers needing parallel intake must serialize access externally.
//!
//! ## Scoped decode limits
//!
//! Ultra-large artwork is expected, so the decompression-bomb guard is
//! relaxed — per call, through an explicit [`imaging::DecodeLimits`] value
//! built from config. Nothing global is mutated, and unusually large images
//! are logged for manual review.

pub mod analyse;
pub mod analysis;
pub mod atomic;
pub mod config;
pub mod error;
pub mod finalise;
pub mod imaging;
pub mod intake;
pub mod mockups;
pub mod naming;
pub mod registry;
pub mod repair;
pub mod sku;
pub mod validate;

#[cfg(test)]
pub(crate) mod test_helpers;
