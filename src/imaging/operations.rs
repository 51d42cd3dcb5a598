//! High-level image operations.
//!
//! These functions combine calculations with backend execution.
//! They take the batch's [`TextStyle`], compute size and placement for one
//! image, and call the backend.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::{calculate_font_size, calculate_text_position};
use super::params::{OverlayParams, TextStyle};
use std::path::Path;

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Where and how large the signature landed on one image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub dimensions: Dimensions,
    pub font_size: u32,
    /// Rendered text box (width, height).
    pub text_size: (u32, u32),
    /// Top-left corner of the text box.
    pub position: (i32, i32),
}

/// Compute font size and text position for an image of the given size.
pub fn plan_placement(
    backend: &impl ImageBackend,
    dimensions: Dimensions,
    style: &TextStyle,
) -> Placement {
    let font_size = calculate_font_size(dimensions.as_tuple(), style.max_font_size);
    let text_size = backend.measure_text(&style.text, font_size);
    let position = calculate_text_position(dimensions.as_tuple(), text_size);
    Placement {
        dimensions,
        font_size,
        text_size,
        position,
    }
}

/// Watermark one image: identify, size the font, place the text, draw, save.
pub fn watermark_image(
    backend: &impl ImageBackend,
    source: &Path,
    output: &Path,
    style: &TextStyle,
) -> Result<Placement> {
    let dimensions = backend.identify(source)?;
    let placement = plan_placement(backend, dimensions, style);
    let (x, y) = placement.position;

    backend.overlay(&OverlayParams {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        text: style.text.clone(),
        color: style.color,
        font_size: placement.font_size,
        x,
        y,
    })?;

    Ok(placement)
}
