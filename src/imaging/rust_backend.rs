//! Pure Rust image processing backend.
//!
//! Everything is statically linked into the binary, including the default font.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Identify | `image::image_dimensions` (header only, no full decode) |
//! | Decode (JPEG, PNG, TIFF, WebP) | `image::ImageReader` |
//! | Measure text | ink bounds of the `ab_glyph` outlines ([`WatermarkFont::ink_box`]) |
//! | Draw text | `imageproc::drawing::draw_text_mut` on the decoded buffer, in its own pixel type |
//! | Encode | `image::DynamicImage::save_with_format`, format from the output extension |
//!
//! Outputs are written to a hidden `.<name>.partial` sibling and renamed into
//! place, so a crash or encode error never leaves a half-written image under
//! the final name.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::font::WatermarkFont;
use super::params::OverlayParams;
use ab_glyph::PxScale;
use image::{
    DynamicImage, ImageBuffer, ImageError, ImageFormat, ImageReader, Luma, LumaA, Pixel, Rgb, Rgba,
};
use imageproc::definitions::Clamp;
use imageproc::drawing::draw_text_mut;
use std::path::{Path, PathBuf};

/// Pure Rust backend using the `image` + `imageproc` crates.
///
/// See the [module docs](self) for the crate-to-operation mapping.
#[derive(Debug, Clone)]
pub struct RustBackend {
    font: WatermarkFont,
}

impl RustBackend {
    pub fn new(font: WatermarkFont) -> Self {
        Self { font }
    }
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    ImageReader::open(path)
        .map_err(BackendError::Io)?
        .decode()
        .map_err(|source| decode_error(path, source))
}

fn decode_error(path: &Path, source: ImageError) -> BackendError {
    match source {
        ImageError::IoError(e) => BackendError::Io(e),
        source => BackendError::Decode {
            path: path.to_path_buf(),
            source,
        },
    }
}

/// Draw the signature in place, in the image's own pixel type.
///
/// The renderer's origin is shifted by the ink offsets so the inked pixels
/// start exactly at `(params.x, params.y)`, the corner placement computed
/// from the measured box.
fn draw_signature(img: DynamicImage, params: &OverlayParams, font: &WatermarkFont) -> DynamicImage {
    let Some(ink) = font.ink_box(&params.text, params.font_size) else {
        return img;
    };
    let pen = Pen {
        x: params.x - ink.left,
        y: params.y - ink.top,
        scale: PxScale::from(params.font_size as f32),
        font,
        text: &params.text,
    };
    let rgb = params.color.rgb();
    let [r, g, b] = rgb;
    let l = luma(rgb);
    let wide = |c: u8| c as u16 * 257;
    let float = |c: u8| c as f32 / 255.0;

    match img {
        DynamicImage::ImageLuma8(mut canvas) => {
            pen.draw(&mut canvas, Luma([l]));
            canvas.into()
        }
        DynamicImage::ImageLumaA8(mut canvas) => {
            pen.draw(&mut canvas, LumaA([l, u8::MAX]));
            canvas.into()
        }
        DynamicImage::ImageRgb8(mut canvas) => {
            pen.draw(&mut canvas, Rgb(rgb));
            canvas.into()
        }
        DynamicImage::ImageRgba8(mut canvas) => {
            pen.draw(&mut canvas, Rgba([r, g, b, u8::MAX]));
            canvas.into()
        }
        DynamicImage::ImageLuma16(mut canvas) => {
            pen.draw(&mut canvas, Luma([wide(l)]));
            canvas.into()
        }
        DynamicImage::ImageLumaA16(mut canvas) => {
            pen.draw(&mut canvas, LumaA([wide(l), u16::MAX]));
            canvas.into()
        }
        DynamicImage::ImageRgb16(mut canvas) => {
            pen.draw(&mut canvas, Rgb([wide(r), wide(g), wide(b)]));
            canvas.into()
        }
        DynamicImage::ImageRgba16(mut canvas) => {
            pen.draw(&mut canvas, Rgba([wide(r), wide(g), wide(b), u16::MAX]));
            canvas.into()
        }
        DynamicImage::ImageRgb32F(mut canvas) => {
            pen.draw(&mut canvas, Rgb([float(r), float(g), float(b)]));
            canvas.into()
        }
        other => {
            let mut canvas = other.into_rgba32f();
            pen.draw(&mut canvas, Rgba([float(r), float(g), float(b), 1.0]));
            canvas.into()
        }
    }
}

/// Rec. 709 luma, the weighting `image` uses for its own gray conversions.
fn luma([r, g, b]: [u8; 3]) -> u8 {
    let weighted = 2126 * r as u32 + 7152 * g as u32 + 722 * b as u32;
    (weighted / 10_000) as u8
}

/// One signature draw, independent of the canvas pixel type.
struct Pen<'a> {
    x: i32,
    y: i32,
    scale: PxScale,
    font: &'a WatermarkFont,
    text: &'a str,
}

impl Pen<'_> {
    fn draw<P>(&self, canvas: &mut ImageBuffer<P, Vec<P::Subpixel>>, color: P)
    where
        P: Pixel,
        P::Subpixel: Into<f32> + Clamp<f32>,
    {
        draw_text_mut(
            canvas,
            color,
            self.x,
            self.y,
            self.scale,
            self.font.font(),
            self.text,
        );
    }
}

/// Hidden sibling the encoder writes to before the rename.
fn partial_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(".{name}.partial"))
}

/// Save a DynamicImage to the given path, inferring format from extension.
fn save_image(img: &DynamicImage, path: &Path) -> Result<(), BackendError> {
    let format = ImageFormat::from_path(path)
        .ok()
        .filter(|f| f.writing_enabled())
        .ok_or_else(|| BackendError::UnsupportedFormat(path.to_path_buf()))?;

    let partial = partial_path(path);
    if let Err(source) = img.save_with_format(&partial, format) {
        let _ = std::fs::remove_file(&partial);
        return Err(BackendError::Encode {
            path: path.to_path_buf(),
            source,
        });
    }
    if let Err(e) = std::fs::rename(&partial, path) {
        let _ = std::fs::remove_file(&partial);
        return Err(BackendError::Io(e));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) =
            image::image_dimensions(path).map_err(|source| decode_error(path, source))?;
        Ok(Dimensions { width, height })
    }

    fn measure_text(&self, text: &str, font_size: u32) -> (u32, u32) {
        self.font
            .ink_box(text, font_size)
            .map_or((0, 0), |ink| (ink.width, ink.height))
    }

    fn overlay(&self, params: &OverlayParams) -> Result<(), BackendError> {
        let img = load_image(&params.source)?;
        let signed = draw_signature(img, params, &self.font);
        save_image(&signed, &params.output)
    }

    fn render_fingerprint(&self) -> String {
        self.font.digest().to_string()
    }
}
