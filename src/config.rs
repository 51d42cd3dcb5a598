//! Watermark configuration module.
//!
//! Handles loading, validating, and layering `signet.toml`. Every option has a
//! stock default; a config file overrides only the keys it names, and the
//! `--source` / `--path` flags override the directories last.
//!
//! ```text
//! stock defaults  ←  signet.toml (or --config FILE)  ←  CLI flags
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! # font_path = "fonts/PlayfairDisplay-Regular.ttf"  # omit for bundled DejaVu Sans
//! text = "Aleksei Khatkevich"   # Signature drawn on every image
//! color = [237, 230, 211]       # RGB
//! source_dir = "source-images"  # Scanned for input files (not recursive)
//! output_dir = "output-images"  # Created if missing
//! extensions = ["jpg"]          # Case-sensitive, no leading dot
//! max_font_size = 50            # Cap on the area-derived font size
//!
//! [processing]
//! max_processes = 4             # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::imaging::{TextColor, TextStyle};

/// Config file picked up from the working directory when `--config` is absent.
pub const DEFAULT_CONFIG_FILE: &str = "signet.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Watermark configuration loaded from `signet.toml`.
///
/// All fields have defaults. User config files need only specify the values
/// they want to override. Unknown keys are rejected.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WatermarkConfig {
    /// TrueType/OpenType font file. `None` uses the bundled font.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub font_path: Option<PathBuf>,
    /// Signature drawn onto every image.
    pub text: String,
    /// Text color as `[r, g, b]`.
    pub color: [u8; 3],
    /// Directory scanned for input images.
    pub source_dir: PathBuf,
    /// Directory watermarked images are written to.
    pub output_dir: PathBuf,
    /// File extensions to pick up, without the leading dot.
    pub extensions: BTreeSet<String>,
    /// Upper bound on the computed font size, in pixels.
    pub max_font_size: u32,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for WatermarkConfig {
    fn default() -> Self {
        Self {
            font_path: None,
            text: "Aleksei Khatkevich".to_string(),
            color: TextColor::default().rgb(),
            source_dir: PathBuf::from("source-images"),
            output_dir: PathBuf::from("output-images"),
            extensions: BTreeSet::from(["jpg".to_string()]),
            max_font_size: 50,
            processing: ProcessingConfig::default(),
        }
    }
}

impl WatermarkConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.text.is_empty() {
            return Err(ConfigError::Validation("text must not be empty".into()));
        }
        if self.extensions.is_empty() {
            return Err(ConfigError::Validation(
                "extensions must not be empty".into(),
            ));
        }
        if let Some(bad) = self
            .extensions
            .iter()
            .find(|e| e.is_empty() || e.starts_with('.'))
        {
            return Err(ConfigError::Validation(format!(
                "extensions must be non-empty and given without a leading dot, got {bad:?}"
            )));
        }
        if self.max_font_size == 0 {
            return Err(ConfigError::Validation(
                "max_font_size must be greater than 0".into(),
            ));
        }
        if self.processing.max_processes == Some(0) {
            return Err(ConfigError::Validation(
                "processing.max_processes must be greater than 0".into(),
            ));
        }
        Ok(())
    }

    /// Apply CLI directory overrides. `None` keeps the configured value.
    pub fn with_overrides(mut self, source_dir: Option<PathBuf>, output_dir: Option<PathBuf>) -> Self {
        if let Some(dir) = source_dir {
            self.source_dir = dir;
        }
        if let Some(dir) = output_dir {
            self.output_dir = dir;
        }
        self
    }

    /// The per-batch drawing style derived from this config.
    pub fn text_style(&self) -> TextStyle {
        TextStyle {
            text: self.text.clone(),
            color: TextColor(self.color),
            max_font_size: self.max_font_size,
        }
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config.max_processes.map(|n| n.min(cores)).unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(WatermarkConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file as a raw TOML value.
pub fn load_raw_config(path: &Path) -> Result<toml::Value, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(toml::from_str(&content)?)
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<WatermarkConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: WatermarkConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load the effective config.
///
/// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] in the
/// working directory is used if present, otherwise the stock defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<WatermarkConfig, ConfigError> {
    let overlay = match explicit {
        Some(path) => Some(load_raw_config(path)?),
        None => {
            let implicit = Path::new(DEFAULT_CONFIG_FILE);
            if implicit.exists() {
                Some(load_raw_config(implicit)?)
            } else {
                None
            }
        }
    };
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `signet.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# Signet Configuration
# ====================
#
# All options are optional. Values shown are the defaults.
# Place this file as signet.toml in the directory you run signet from,
# or pass it explicitly with --config.

# Font used for the signature. Any TrueType/OpenType file works.
# When omitted, the bundled DejaVu Sans is used.
# font_path = "fonts/PlayfairDisplay-Regular.ttf"

# Text drawn near the bottom-right corner of every image.
text = "Aleksei Khatkevich"

# Text color as [red, green, blue], each 0-255.
color = [237, 230, 211]

# Directory scanned for images. Only its direct children are considered.
# Overridden by --source.
source_dir = "source-images"

# Directory watermarked images are written to, under their original names.
# Created (with parents) if missing. Overridden by --path.
output_dir = "output-images"

# File extensions to process, without the leading dot.
# Matching is case-sensitive: "jpg" does not pick up "photo.JPG".
extensions = ["jpg"]

# Font size is image area / 19000 pixels, capped at this value.
max_font_size = 50

[processing]
# Maximum parallel workers. Omit to use every CPU core.
# Set to 1 to process files strictly one after another.
# max_processes = 4
"##
}
