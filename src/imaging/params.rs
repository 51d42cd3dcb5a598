//! Parameter types for image operations.
//!
//! These structs describe *what* to draw, not *how* to draw it. They are the
//! interface between the high-level [`operations`](super::operations) module
//! (which decides size and placement) and the [`backend`](super::backend)
//! (which does the actual pixel work). This separation allows swapping backends
//! (e.g. for testing with a mock) without changing operation logic.
//!
//! ## Types
//!
//! - [`TextColor`]: RGB color of the signature.
//! - [`TextStyle`]: What every image gets: text, color, and the font-size cap.
//! - [`OverlayParams`]: Everything needed for one file: source, output, font size, position.

use std::path::PathBuf;

/// RGB color of the drawn text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TextColor(pub [u8; 3]);

impl TextColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    pub fn rgb(self) -> [u8; 3] {
        self.0
    }
}

impl Default for TextColor {
    /// Warm off-white, readable on most photographs.
    fn default() -> Self {
        Self([237, 230, 211])
    }
}

/// The signature drawn onto every image of a batch.
#[derive(Debug, Clone, PartialEq)]
pub struct TextStyle {
    pub text: String,
    pub color: TextColor,
    /// Upper bound on the area-derived font size.
    pub max_font_size: u32,
}

/// Parameters for drawing the signature onto one image.
#[derive(Debug, Clone, PartialEq)]
pub struct OverlayParams {
    pub source: PathBuf,
    pub output: PathBuf,
    pub text: String,
    pub color: TextColor,
    /// Font size in pixels. Zero means nothing is drawn.
    pub font_size: u32,
    /// Top-left corner of the text box; may be negative.
    pub x: i32,
    pub y: i32,
}
