//! # Signet
//!
//! Batch-signs a directory of photographs: every matching image in the source
//! directory gets a text signature drawn near its bottom-right corner and is
//! written, under the same file name and format, to the output directory.
//!
//! # Pipeline
//!
//! ```text
//! source-images/  →  list files  →  per image: identify → size font → measure
//!                                       → place → draw → save  →  output-images/
//! ```
//!
//! Images are independent of each other, so the per-image stage runs in
//! parallel. The first failure aborts the batch.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`scan`] | Lists the regular files in the source directory with a configured extension |
//! | [`imaging`] | Font sizing and placement math, font loading, and the pixel backend |
//! | [`process`] | Runs the batch: output directory, parallel watermarking, cache bookkeeping |
//! | [`cache`] | Content-hash manifest that lets unchanged images skip re-encoding |
//! | [`config`] | `signet.toml` loading, validation, and stock defaults |
//! | [`output`] | CLI output formatting for listings and progress |
//!
//! # Design Decisions
//!
//! ## Area-Proportional Text
//!
//! The signature scales with the picture: one pixel of font size per 19 000
//! pixels of image area, capped by `max_font_size`. A 12-megapixel frame and
//! a phone snapshot both get a signature that reads as the same fraction of
//! the frame. Tiny images can compute a size of zero; they are re-encoded
//! without text rather than failing the batch.
//!
//! ## Proportional Inset
//!
//! The text box sits at 98% of the free space on each axis, so the margin to
//! the right and bottom edges grows with the image instead of being a fixed
//! pixel count.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, drawing, and encoding use `image`, `imageproc`, and `ab_glyph`.
//! A font is embedded in the binary, so a bare install can sign images with
//! no system fonts and no native libraries.
//!
//! ## Atomic Outputs
//!
//! Each output is encoded to a hidden temporary file next to its destination
//! and renamed into place. An interrupted run leaves either the previous
//! output or the new one, never a truncated image.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod output;
pub mod process;
pub mod scan;

#[cfg(test)]
pub(crate) mod test_helpers;
