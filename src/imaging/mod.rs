//! Image processing in pure Rust, with the font bundled into the binary.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::image_dimensions` |
//! | **Font** | `ab_glyph::FontArc` (bundled DejaVu Sans or a configured file) |
//! | **Measure text** | ink bounds of the laid-out `ab_glyph` outlines |
//! | **Draw text** | `imageproc::drawing::draw_text_mut` |
//! | **Encode** | `image` crate, format from the output extension |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for font size and placement (unit testable)
//! - **Parameters**: Data structures describing what to draw
//! - **Font**: Loading and fingerprinting the signature font
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining calculations + backend

pub mod backend;
mod calculations;
pub mod font;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    AREA_PER_FONT_PIXEL, INSET_FACTOR, calculate_font_size, calculate_text_position,
};
pub use font::{FontError, InkBox, WatermarkFont};
pub use operations::{Placement, plan_placement, watermark_image};
pub use params::{OverlayParams, TextColor, TextStyle};
pub use rust_backend::RustBackend;
