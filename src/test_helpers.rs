//! Shared test utilities for the signet test suite.
//!
//! Synthetic image writers for backend tests, and a config rooted in a temp
//! directory for batch tests.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let config = test_config(tmp.path());
//! write_dummy_sources(&config.source_dir, &["a.jpg", "b.jpg"]);
//! ```

use image::{ImageEncoder, RgbImage, RgbaImage};
use std::path::Path;

use crate::config::WatermarkConfig;

// =========================================================================
// Synthetic images
// =========================================================================

/// Write a gradient JPEG so the encoder has real content to compress.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    });
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Write a single-color RGB PNG.
pub fn create_test_png(path: &Path, width: u32, height: u32, color: [u8; 3]) {
    RgbImage::from_pixel(width, height, image::Rgb(color))
        .save(path)
        .unwrap();
}

/// Write a fully transparent RGBA PNG.
pub fn create_test_rgba_png(path: &Path, width: u32, height: u32) {
    RgbaImage::from_pixel(width, height, image::Rgba([0, 0, 0, 0]))
        .save(path)
        .unwrap();
}

// =========================================================================
// Batch fixtures
// =========================================================================

/// Create `dir` and fill it with small placeholder files.
///
/// The bytes are not an image; pair with `MockBackend`, which never decodes.
pub fn write_dummy_sources(dir: &Path, names: &[&str]) {
    std::fs::create_dir_all(dir).unwrap();
    for name in names {
        std::fs::write(dir.join(name), format!("fake image {name}")).unwrap();
    }
}

/// Default config with both directories inside `root`.
///
/// Neither directory is created.
pub fn test_config(root: &Path) -> WatermarkConfig {
    WatermarkConfig {
        source_dir: root.join("source"),
        output_dir: root.join("output"),
        ..WatermarkConfig::default()
    }
}
