//! Watermarking cache for incremental runs.
//!
//! Re-running signet over a directory where nothing changed should not
//! re-encode every JPEG. This module lets the run skip a file when its
//! source bytes and the render settings match what produced the existing
//! output.
//!
//! ## Cache keys
//!
//! Entries are keyed by output file name (which always equals the source
//! file name) and hold two hashes:
//!
//! - **`source_hash`**: SHA-256 of the source file contents. Content-based
//!   rather than mtime-based so it survives `git checkout` and copies.
//!
//! - **`params_hash`**: SHA-256 of everything that shapes the drawn text:
//!   text, color, font-size cap, and the font's own digest. Changing any
//!   config value, or swapping the font file, re-encodes every image.
//!
//! A cache hit requires:
//! 1. An entry for the file name with matching `source_hash` and `params_hash`
//! 2. The previously-written output file still exists on disk
//!
//! ## Storage
//!
//! The cache manifest is a JSON file at `<output_dir>/.watermark-cache.json`.
//! It is written only after a run finishes without errors.
//!
//! Each successful run replaces the manifest with entries for exactly the
//! files it processed, so sources that were deleted or renamed drop out.
//!
//! ## Bypassing the cache
//!
//! Pass `--no-cache` to force every image to be re-encoded. Sources are not
//! hashed at all, and any existing manifest is removed before the first
//! output is overwritten, since its entries no longer describe the outputs.

use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

/// Name of the cache manifest file within the output directory.
const MANIFEST_FILENAME: &str = ".watermark-cache.json";

/// Version of the cache manifest format. Bump this to invalidate all
/// existing caches when the format or key computation changes.
const MANIFEST_VERSION: u32 = 1;

/// A single cached output file.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize, PartialEq, Eq)]
pub struct CacheEntry {
    pub source_hash: String,
    pub params_hash: String,
}

/// On-disk cache manifest mapping output file names to their cache entries.
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub struct CacheManifest {
    pub version: u32,
    pub entries: BTreeMap<String, CacheEntry>,
}

impl CacheManifest {
    /// Create an empty manifest (used for `--no-cache` or first run).
    pub fn empty() -> Self {
        Self {
            version: MANIFEST_VERSION,
            entries: BTreeMap::new(),
        }
    }

    /// Load from the output directory. Returns an empty manifest if the
    /// file doesn't exist or can't be parsed (version mismatch, corruption).
    pub fn load(output_dir: &Path) -> Self {
        let content = match std::fs::read_to_string(manifest_path(output_dir)) {
            Ok(c) => c,
            Err(_) => return Self::empty(),
        };
        match serde_json::from_str::<Self>(&content) {
            Ok(m) if m.version == MANIFEST_VERSION => m,
            _ => Self::empty(),
        }
    }

    /// Save to the output directory.
    pub fn save(&self, output_dir: &Path) -> io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(manifest_path(output_dir), json)
    }

    /// Delete the manifest from the output directory, if there is one.
    pub fn remove(output_dir: &Path) -> io::Result<()> {
        match std::fs::remove_file(manifest_path(output_dir)) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }

    /// Whether `output_dir/file_name` is up to date for these hashes.
    pub fn is_fresh(
        &self,
        file_name: &str,
        source_hash: &str,
        params_hash: &str,
        output_dir: &Path,
    ) -> bool {
        self.entries.get(file_name).is_some_and(|entry| {
            entry.source_hash == source_hash
                && entry.params_hash == params_hash
                && output_dir.join(file_name).exists()
        })
    }

    /// Record a cache entry for an output file.
    pub fn insert(&mut self, file_name: String, source_hash: String, params_hash: String) {
        self.entries.insert(
            file_name,
            CacheEntry {
                source_hash,
                params_hash,
            },
        );
    }
}

/// SHA-256 hash of a file's contents, returned as a hex string.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let bytes = std::fs::read(path)?;
    let digest = Sha256::digest(&bytes);
    Ok(format!("{:x}", digest))
}

/// SHA-256 hash of the render settings.
///
/// `font_fingerprint` is the backend's identity for the font in use.
pub fn hash_render_params(
    text: &str,
    color: [u8; 3],
    max_font_size: u32,
    font_fingerprint: &str,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(b"signature\0");
    hasher.update((text.len() as u64).to_le_bytes());
    hasher.update(text.as_bytes());
    hasher.update(color);
    hasher.update(max_font_size.to_le_bytes());
    hasher.update(font_fingerprint.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Summary of cache performance for a run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u32,
    pub misses: u32,
}

impl CacheStats {
    pub fn hit(&mut self) {
        self.hits += 1;
    }

    pub fn miss(&mut self) {
        self.misses += 1;
    }

    pub fn total(&self) -> u32 {
        self.hits + self.misses
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.hits > 0 {
            write!(
                f,
                "{} cached, {} encoded ({} total)",
                self.hits,
                self.misses,
                self.total()
            )
        } else {
            write!(f, "{} encoded", self.misses)
        }
    }
}

/// Resolve the cache manifest path for an output directory.
pub fn manifest_path(output_dir: &Path) -> PathBuf {
    output_dir.join(MANIFEST_FILENAME)
}
