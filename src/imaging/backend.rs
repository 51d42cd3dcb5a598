//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the operations every backend must
//! support: identify, measure_text, and overlay.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend): pure Rust, with the
//! font parsed once and held for the whole batch.

use super::params::OverlayParams;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Failed to encode {path}: {source}")]
    Encode {
        path: PathBuf,
        source: image::ImageError,
    },
    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(PathBuf),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl Dimensions {
    pub fn as_tuple(self) -> (u32, u32) {
        (self.width, self.height)
    }
}

/// Trait for image processing backends.
///
/// `Sync` so one backend can be shared across rayon workers.
pub trait ImageBackend: Sync {
    /// Get image dimensions.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Pixel size `(width, height)` of the ink `text` leaves at `font_size`.
    ///
    /// An overlay at `(x, y)` inks exactly the box `[x, x + width) x [y, y + height)`.
    fn measure_text(&self, text: &str, font_size: u32) -> (u32, u32);

    /// Decode the source, draw the text, encode to the output path.
    fn overlay(&self, params: &OverlayParams) -> Result<(), BackendError>;

    /// Identity of rendering inputs not captured by [`OverlayParams`]
    /// (the font), used as part of cache keys.
    fn render_fingerprint(&self) -> String;
}
