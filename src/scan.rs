//! Source directory discovery.
//!
//! Lists the files a run will watermark. Only the immediate children of the
//! source directory are considered:
//!
//! ```text
//! source-images/
//! ├── 001-dawn.jpg          ✓ regular file, extension in the set
//! ├── 002-dusk.JPG          ✗ extensions compare case-sensitively
//! ├── notes.txt             ✗ extension not in the set
//! ├── README                ✗ no extension
//! ├── .hidden.jpg           ✓ hidden files are still files
//! └── archive.jpg/          ✗ directories never match, whatever their name
//!     └── 003-old.jpg       ✗ no recursion
//! ```
//!
//! The result is a [`BTreeSet`], so it is duplicate-free and iterates in path
//! order. Nothing downstream depends on that order beyond reproducible output.
//!
//! ## Errors
//!
//! A missing, unreadable, or non-directory source is fatal to the run; there
//! is no partial listing.

use std::collections::BTreeSet;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Source directory not found: {0}")]
    NotFound(PathBuf),
    #[error("Permission denied reading source directory: {0}")]
    PermissionDenied(PathBuf),
    #[error("Source path is not a directory: {0}")]
    NotADirectory(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

/// List the direct children of `dir` that are regular files whose extension
/// is in `extensions`.
///
/// Extensions are given without the leading dot and compared exactly as
/// stored. Symlinks are followed, so a link to a matching file counts.
pub fn list_files(dir: &Path, extensions: &BTreeSet<String>) -> Result<BTreeSet<PathBuf>, ScanError> {
    let entries = fs::read_dir(dir).map_err(|e| classify(dir, e))?;

    let mut files = BTreeSet::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_extension(&path, extensions) {
            files.insert(path);
        }
    }
    Ok(files)
}

/// Whether the file's extension is a member of the set.
pub fn has_extension(path: &Path, extensions: &BTreeSet<String>) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| extensions.contains(e))
}

/// Map an error from opening the source directory onto the discovery taxonomy.
fn classify(dir: &Path, err: io::Error) -> ScanError {
    match err.kind() {
        io::ErrorKind::NotFound => ScanError::NotFound(dir.to_path_buf()),
        io::ErrorKind::PermissionDenied => ScanError::PermissionDenied(dir.to_path_buf()),
        io::ErrorKind::NotADirectory => ScanError::NotADirectory(dir.to_path_buf()),
        _ if dir.is_file() => ScanError::NotADirectory(dir.to_path_buf()),
        _ => ScanError::Io(err),
    }
}
