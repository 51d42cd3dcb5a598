//! Signature font loading.
//!
//! A font is either the bundled DejaVu Sans compiled into the binary or a
//! TrueType/OpenType file named in the config. Either way it is parsed once
//! per run and shared read-only by every worker ([`FontArc`] is a cheap
//! clone around an `Arc`).
//!
//! Each loaded font carries a SHA-256 digest of its bytes so the processing
//! cache can tell when a font file was swapped under the same path.

use ab_glyph::{Font, FontArc, GlyphId, OutlinedGlyph, PxScale, ScaleFont, point};
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// DejaVu Sans, see `fonts/DejaVuSans-LICENSE.txt`.
const BUNDLED_FONT_DATA: &[u8] = include_bytes!("../../fonts/DejaVuSans.ttf");

#[derive(Error, Debug)]
pub enum FontError {
    #[error("Failed to read font {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Not a valid TrueType/OpenType font: {0}")]
    Invalid(String),
}

/// A parsed font plus a digest of the bytes it was parsed from.
#[derive(Clone)]
pub struct WatermarkFont {
    font: FontArc,
    digest: String,
}

impl std::fmt::Debug for WatermarkFont {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatermarkFont")
            .field("digest", &self.digest)
            .finish_non_exhaustive()
    }
}

impl WatermarkFont {
    /// The font compiled into the binary.
    pub fn bundled() -> Result<Self, FontError> {
        let font = FontArc::try_from_slice(BUNDLED_FONT_DATA)
            .map_err(|_| FontError::Invalid("bundled font".to_string()))?;
        Ok(Self {
            font,
            digest: digest(BUNDLED_FONT_DATA),
        })
    }

    /// Read and parse a font file from disk.
    pub fn load(path: &Path) -> Result<Self, FontError> {
        let bytes = std::fs::read(path).map_err(|source| FontError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let digest = digest(&bytes);
        let font = FontArc::try_from_vec(bytes)
            .map_err(|_| FontError::Invalid(path.display().to_string()))?;
        Ok(Self { font, digest })
    }

    /// Load the configured font, falling back to the bundled one.
    pub fn from_config(font_path: Option<&Path>) -> Result<Self, FontError> {
        match font_path {
            Some(path) => Self::load(path),
            None => Self::bundled(),
        }
    }

    pub fn font(&self) -> &FontArc {
        &self.font
    }

    /// Hex SHA-256 of the font file contents.
    pub fn digest(&self) -> &str {
        &self.digest
    }

    /// Pixel bounds of the ink `text` leaves at `font_size`.
    ///
    /// Glyphs are laid out the way `imageproc::drawing::draw_text_mut` lays
    /// them out: pen starting at `(0, ascent)`, advancing by `h_advance`
    /// plus kerning. `None` when nothing would be drawn (size 0, empty text,
    /// or only whitespace).
    pub fn ink_box(&self, text: &str, font_size: u32) -> Option<InkBox> {
        if font_size == 0 {
            return None;
        }
        let scale = PxScale::from(font_size as f32);
        let (mut left, mut top) = (i32::MAX, i32::MAX);
        let (mut right, mut bottom) = (i32::MIN, i32::MIN);
        for glyph in self.outline(text, scale) {
            let bounds = glyph.px_bounds();
            left = left.min(bounds.min.x.round() as i32);
            top = top.min(bounds.min.y.round() as i32);
            right = right.max(bounds.min.x.round() as i32 + bounds.width() as i32);
            bottom = bottom.max(bounds.min.y.round() as i32 + bounds.height() as i32);
        }
        (right > left && bottom > top).then(|| InkBox {
            left,
            top,
            width: (right - left) as u32,
            height: (bottom - top) as u32,
        })
    }

    fn outline(&self, text: &str, scale: PxScale) -> Vec<OutlinedGlyph> {
        let font = self.font.as_scaled(scale);
        let mut pen_x = 0f32;
        let mut last: Option<GlyphId> = None;
        let mut glyphs = Vec::new();
        for c in text.chars() {
            let id = font.glyph_id(c);
            let glyph = id.with_scale_and_position(scale, point(pen_x, font.ascent()));
            pen_x += font.h_advance(id);
            if let Some(outlined) = font.outline_glyph(glyph) {
                if let Some(last) = last {
                    pen_x += font.kern(id, last);
                }
                last = Some(id);
                glyphs.push(outlined);
            }
        }
        glyphs
    }
}

/// Where drawn text actually puts pixels, relative to the point passed to
/// the renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InkBox {
    /// Offset of the leftmost inked column from the draw origin.
    pub left: i32,
    /// Offset of the topmost inked row from the draw origin.
    pub top: i32,
    pub width: u32,
    pub height: u32,
}

fn digest(bytes: &[u8]) -> String {
    format!("{:x}", Sha256::digest(bytes))
}
