//! Pure calculation functions for signature sizing and placement.
//!
//! All functions here are pure and testable without any I/O or images.

/// Image area (in pixels) that buys one pixel of font size.
pub const AREA_PER_FONT_PIXEL: u64 = 19_000;

/// Fraction of the free space left of / above the text at which it is drawn.
///
/// `1.0` would put the text flush against the bottom-right corner; `0.98`
/// keeps a 2% inset of the remaining room on each axis.
pub const INSET_FACTOR: f64 = 0.98;

/// Calculate the font size for an image from its area.
///
/// `min(max_font_size, floor(width * height / 19000))`. There is no lower
/// bound: images smaller than 19000 px yield 0.
///
/// # Examples
/// ```
/// # use signet::imaging::calculate_font_size;
/// // 1900x1000 → 100, capped at 50
/// assert_eq!(calculate_font_size((1900, 1000), 50), 50);
///
/// // 400x300 → 120000 / 19000 = 6.3 → 6
/// assert_eq!(calculate_font_size((400, 300), 50), 6);
/// ```
pub fn calculate_font_size(dimensions: (u32, u32), max_font_size: u32) -> u32 {
    let (width, height) = dimensions;
    let area = width as u64 * height as u64;
    let scaled = area / AREA_PER_FONT_PIXEL;
    scaled.min(max_font_size as u64) as u32
}

/// Calculate the top-left corner of the text box.
///
/// `x = (W - text_w) * 0.98`, `y = (H - text_h) * 0.98`, truncated toward
/// zero. When the text is larger than the image on an axis the coordinate
/// goes negative and the renderer clips.
///
/// # Arguments
/// * `image` - Image dimensions (width, height)
/// * `text` - Rendered text dimensions (width, height)
///
/// # Returns
/// * `(x, y)` - Pixel position of the text's top-left corner
pub fn calculate_text_position(image: (u32, u32), text: (u32, u32)) -> (i32, i32) {
    let inset = |outer: u32, inner: u32| -> i32 {
        let free = outer as f64 - inner as f64;
        (free * INSET_FACTOR) as i32
    };
    (inset(image.0, text.0), inset(image.1, text.1))
}
