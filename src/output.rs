//! CLI output formatting.
//!
//! # Output Format
//!
//! ## List
//!
//! ```text
//! source-images (2 files)
//! 001 dawn.jpg
//! 002 dusk.jpg
//! ```
//!
//! ## Run
//!
//! ```text
//! source-images → output-images (3 files)
//! 001 dawn.jpg
//!     4000x3000, font 50px at (3502, 2891)
//! 002 dusk.jpg
//!     cached
//! 003 icon.jpg
//!     120x90, font 0px (text skipped)
//! ```
//!
//! # Architecture
//!
//! Each view has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions do no I/O.

use crate::cache::CacheStats;
use crate::process::ProcessEvent;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_count(n: usize) -> String {
    match n {
        1 => "1 file".to_string(),
        n => format!("{n} files"),
    }
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

// ============================================================================
// List
// ============================================================================

/// Format the files discovery found, in path order.
pub fn format_file_list(source_dir: &Path, files: &BTreeSet<PathBuf>) -> Vec<String> {
    let mut lines = vec![format!("{} ({})", source_dir.display(), file_count(files.len()))];
    lines.extend(
        files
            .iter()
            .enumerate()
            .map(|(i, path)| format!("{} {}", format_index(i + 1), file_name(path))),
    );
    lines
}

/// Print the discovered files to stdout.
pub fn print_file_list(source_dir: &Path, files: &BTreeSet<PathBuf>) {
    for line in format_file_list(source_dir, files) {
        println!("{}", line);
    }
}

// ============================================================================
// Run
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_process_event(event: &ProcessEvent) -> Vec<String> {
    match event {
        ProcessEvent::Started {
            source_dir,
            output_dir,
            file_count: n,
        } => vec![format!(
            "{} → {} ({})",
            source_dir.display(),
            output_dir.display(),
            file_count(*n)
        )],
        ProcessEvent::FileWatermarked {
            index,
            file_name,
            placement,
        } => {
            let dims = placement.dimensions;
            let detail = if placement.font_size == 0 {
                format!("{}x{}, font 0px (text skipped)", dims.width, dims.height)
            } else {
                let (x, y) = placement.position;
                format!(
                    "{}x{}, font {}px at ({}, {})",
                    dims.width, dims.height, placement.font_size, x, y
                )
            };
            vec![
                format!("{} {}", format_index(*index), file_name),
                format!("{}{}", indent(1), detail),
            ]
        }
        ProcessEvent::FileCached { index, file_name } => vec![
            format!("{} {}", format_index(*index), file_name),
            format!("{}cached", indent(1)),
        ],
    }
}

/// Format the end-of-run summary.
pub fn format_summary(output_dir: &Path, stats: &CacheStats) -> Vec<String> {
    vec![
        format!("Cache: {}", stats),
        format!("==> Done: {}", output_dir.display()),
    ]
}

/// Print the end-of-run summary to stdout.
pub fn print_summary(output_dir: &Path, stats: &CacheStats) {
    for line in format_summary(output_dir, stats) {
        println!("{}", line);
    }
}
