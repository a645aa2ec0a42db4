//! Image operations — pure Rust via the `image` crate.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Decode** (JPEG, PNG) | `image` crate decoders, scoped limits |
//! | **Resize** | `image::imageops`, Lanczos3, long-edge bounded |
//! | **Composite** | `image::imageops::overlay` |
//! | **Encode → JPEG** | `image::codecs::jpeg::JpegEncoder` |
//!
//! The module is split into:
//! - **decode**: decoding with explicit, per-call [`DecodeLimits`]
//! - **derivatives**: THUMB/ANALYSE pairs plus QC metadata (palette, aspect)
//! - **preview**: the byte-capped finalised preview loop

pub mod decode;
pub mod derivatives;
pub mod preview;

pub use decode::{DecodeLimits, load_image, read_dimensions};
pub use derivatives::{
    DerivativePaths, DerivativeSet, QcMetadata, bounded_dimensions, encode_jpeg_atomic,
    make_derivatives, write_bounded_jpeg,
};
pub use preview::generate_preview;
