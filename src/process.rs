//! Batch watermarking.
//!
//! Ties discovery, the imaging pipeline, and the cache together:
//!
//! ```text
//! create output_dir  →  list_files(source_dir)  →  per file: identify
//!                                                   → font size → measure
//!                                                   → place → draw → save
//! ```
//!
//! ## Output Structure
//!
//! ```text
//! output-images/
//! ├── .watermark-cache.json    # Cache manifest (see crate::cache), absent after --no-cache
//! ├── 001-dawn.jpg             # Same name and format as the source
//! └── 002-dusk.jpg
//! ```
//!
//! ## Failure Policy
//!
//! Fail-fast. The first decode, font, or write error aborts the batch and is
//! returned; nothing is retried. Because each output is renamed into place
//! only once fully encoded, an aborted batch never leaves a truncated image
//! behind, and one file's failure cannot touch another file's output.
//!
//! ## Parallel Processing
//!
//! Files are processed in parallel using [rayon](https://docs.rs/rayon). The
//! pool size comes from `processing.max_processes`; a pool of one reproduces
//! strictly sequential processing.

use crate::cache::{self, CacheManifest, CacheStats};
use crate::config::WatermarkConfig;
use crate::imaging::{
    BackendError, FontError, ImageBackend, Placement, RustBackend, TextStyle, WatermarkFont,
    watermark_image,
};
use crate::scan::{self, ScanError};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
    #[error("Font error: {0}")]
    Font(#[from] FontError),
    #[error("Output directory {0} is the source directory; outputs would overwrite inputs")]
    OutputIsSource(PathBuf),
}

/// Whether a file was drawn this run or reused from a previous one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileStatus {
    Cached,
    Encoded,
}

/// Progress events sent while a batch runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessEvent {
    Started {
        source_dir: PathBuf,
        output_dir: PathBuf,
        file_count: usize,
    },
    FileWatermarked {
        /// 1-based position in discovery order.
        index: usize,
        file_name: String,
        placement: Placement,
    },
    FileCached {
        index: usize,
        file_name: String,
    },
}

/// One processed file.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessedFile {
    pub source: PathBuf,
    pub output: PathBuf,
    pub status: FileStatus,
    /// `None` for cache hits, which skip identification.
    pub placement: Option<Placement>,
    /// `None` when the cache is bypassed.
    source_hash: Option<String>,
}

/// Everything a finished batch produced.
#[derive(Debug)]
pub struct RunResult {
    pub files: Vec<ProcessedFile>,
    pub cache_stats: CacheStats,
}

/// Watermark every matching file in `config.source_dir` with the configured font.
pub fn run(
    config: &WatermarkConfig,
    use_cache: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunResult, ProcessError> {
    let font = WatermarkFont::from_config(config.font_path.as_deref())?;
    let backend = RustBackend::new(font);
    run_with_backend(&backend, config, use_cache, progress)
}

/// Watermark a batch using a specific backend (allows testing with mock).
pub fn run_with_backend(
    backend: &impl ImageBackend,
    config: &WatermarkConfig,
    use_cache: bool,
    progress: Option<Sender<ProcessEvent>>,
) -> Result<RunResult, ProcessError> {
    let output_dir = &config.output_dir;
    reject_same_directory(&config.source_dir, output_dir)?;
    std::fs::create_dir_all(output_dir)?;

    let files: Vec<PathBuf> = scan::list_files(&config.source_dir, &config.extensions)?
        .into_iter()
        .collect();

    if let Some(tx) = &progress {
        let _ = tx.send(ProcessEvent::Started {
            source_dir: config.source_dir.clone(),
            output_dir: output_dir.clone(),
            file_count: files.len(),
        });
    }

    let manifest = if use_cache {
        CacheManifest::load(output_dir)
    } else {
        CacheManifest::remove(output_dir)?;
        CacheManifest::empty()
    };
    let style = config.text_style();
    let params_hash = cache::hash_render_params(
        &style.text,
        style.color.rgb(),
        style.max_font_size,
        &backend.render_fingerprint(),
    );

    let job = BatchJob {
        backend,
        style: &style,
        output_dir,
        manifest: &manifest,
        params_hash: &params_hash,
        use_cache,
        progress: progress.as_ref(),
    };
    let processed: Vec<ProcessedFile> = files
        .par_iter()
        .enumerate()
        .map(|(i, source)| job.process_file(i + 1, source))
        .collect::<Result<_, _>>()?;

    let mut cache_stats = CacheStats::default();
    let mut next_manifest = CacheManifest::empty();
    for file in &processed {
        match file.status {
            FileStatus::Cached => cache_stats.hit(),
            FileStatus::Encoded => cache_stats.miss(),
        }
        if let Some(source_hash) = &file.source_hash {
            next_manifest.insert(
                output_file_name(&file.output),
                source_hash.clone(),
                params_hash.clone(),
            );
        }
    }
    if use_cache {
        next_manifest.save(output_dir)?;
    }

    Ok(RunResult {
        files: processed,
        cache_stats,
    })
}

/// Read-only state shared by every worker in a batch.
struct BatchJob<'a, B: ImageBackend> {
    backend: &'a B,
    style: &'a TextStyle,
    output_dir: &'a Path,
    manifest: &'a CacheManifest,
    params_hash: &'a str,
    use_cache: bool,
    progress: Option<&'a Sender<ProcessEvent>>,
}

impl<B: ImageBackend> BatchJob<'_, B> {
    fn process_file(&self, index: usize, source: &Path) -> Result<ProcessedFile, ProcessError> {
        let file_name = output_file_name(source);
        let output = self.output_dir.join(&file_name);
        let source_hash = if self.use_cache {
            Some(cache::hash_file(source)?)
        } else {
            None
        };

        if let Some(hash) = &source_hash
            && self
                .manifest
                .is_fresh(&file_name, hash, self.params_hash, self.output_dir)
        {
            self.emit(ProcessEvent::FileCached { index, file_name });
            return Ok(ProcessedFile {
                source: source.to_path_buf(),
                output,
                status: FileStatus::Cached,
                placement: None,
                source_hash,
            });
        }

        let placement = watermark_image(self.backend, source, &output, self.style)?;
        self.emit(ProcessEvent::FileWatermarked {
            index,
            file_name,
            placement,
        });
        Ok(ProcessedFile {
            source: source.to_path_buf(),
            output,
            status: FileStatus::Encoded,
            placement: Some(placement),
            source_hash,
        })
    }

    fn emit(&self, event: ProcessEvent) {
        if let Some(tx) = self.progress {
            let _ = tx.send(event);
        }
    }
}

/// Base name of a discovered file; discovery only yields paths with one.
fn output_file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Refuse to write into the directory being read.
fn reject_same_directory(source_dir: &Path, output_dir: &Path) -> Result<(), ProcessError> {
    let (Ok(source), Ok(output)) = (source_dir.canonicalize(), output_dir.canonicalize()) else {
        return Ok(());
    };
    if source == output {
        return Err(ProcessError::OutputIsSource(output_dir.to_path_buf()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::test_helpers::{create_test_jpeg, test_config, write_dummy_sources};
    use std::fs;
    use std::sync::mpsc;
    use tempfile::TempDir;

    fn overlay_outputs(backend: &MockBackend) -> Vec<String> {
        let mut outputs: Vec<String> = backend
            .overlays()
            .into_iter()
            .filter_map(|op| match op {
                RecordedOp::Overlay { output, .. } => Some(output),
                _ => None,
            })
            .collect();
        outputs.sort();
        outputs
    }

    // =========================================================================
    // Mock backend tests
    // =========================================================================

    #[test]
    fn run_creates_nested_output_dir() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.output_dir = tmp.path().join("deep/nested/out");
        write_dummy_sources(&config.source_dir, &["a.jpg"]);

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();

        assert!(config.output_dir.is_dir());
    }

    #[test]
    fn run_watermarks_only_matching_files() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg", "b.jpg", "c.png", "notes.txt"]);

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600), ("b.jpg", 1900, 1000)]);
        let result = run_with_backend(&backend, &config, true, None).unwrap();

        assert_eq!(result.files.len(), 2);
        assert_eq!(
            overlay_outputs(&backend),
            vec![
                config.output_dir.join("a.jpg").to_string_lossy().to_string(),
                config.output_dir.join("b.jpg").to_string_lossy().to_string(),
            ]
        );
    }

    #[test]
    fn run_output_name_equals_input_name() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["001-dawn.jpg"]);

        let backend = MockBackend::with_dimensions(&[("001-dawn.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, true, None).unwrap();

        let file = &result.files[0];
        assert_eq!(file.source.file_name(), file.output.file_name());
        assert_eq!(file.output.parent(), Some(config.output_dir.as_path()));
    }

    #[test]
    fn run_passes_config_style_to_backend() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.text = "X".into();
        config.color = [9, 8, 7];
        write_dummy_sources(&config.source_dir, &["big.jpg"]);

        let backend = MockBackend::with_dimensions(&[("big.jpg", 1900, 1000)]);
        let result = run_with_backend(&backend, &config, true, None).unwrap();

        let placement = result.files[0].placement.unwrap();
        assert_eq!(placement.font_size, 50);
        assert!(matches!(
            &backend.overlays()[0],
            RecordedOp::Overlay { text, color: [9, 8, 7], font_size: 50, .. } if text == "X"
        ));
    }

    #[test]
    fn run_missing_source_dir_fails_and_writes_nothing() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.source_dir = tmp.path().join("does-not-exist");

        let backend = MockBackend::new();
        let result = run_with_backend(&backend, &config, true, None);

        assert!(matches!(result, Err(ProcessError::Scan(ScanError::NotFound(_)))));
        assert!(backend.get_operations().is_empty());
        assert_eq!(fs::read_dir(&config.output_dir).unwrap().count(), 0);
    }

    #[test]
    fn run_rejects_output_equal_to_source() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg"]);
        config.output_dir = config.source_dir.join(".");

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, true, None);

        assert!(matches!(result, Err(ProcessError::OutputIsSource(_))));
        assert!(backend.get_operations().is_empty());
    }

    #[test]
    fn run_fails_fast_on_backend_error() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg", "b.jpg"]);

        // No dimensions for b.jpg → identify fails
        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, true, None);

        assert!(matches!(result, Err(ProcessError::Imaging(_))));
        // Manifest is only written after a clean run
        assert!(!cache::manifest_path(&config.output_dir).exists());
    }

    #[test]
    fn run_skips_unchanged_files_on_second_run() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg"]);
        // The mock does not write files; stand in for the first run's output
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.output_dir.join("a.jpg"), b"signed").unwrap();

        let first = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&first, &config, true, None).unwrap();
        assert_eq!(result.cache_stats, CacheStats { hits: 0, misses: 1 });

        let second = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&second, &config, true, None).unwrap();
        assert_eq!(result.cache_stats, CacheStats { hits: 1, misses: 0 });
        assert_eq!(result.files[0].status, FileStatus::Cached);
        assert!(second.get_operations().is_empty());
    }

    #[test]
    fn run_reencodes_when_text_changes() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg"]);
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.output_dir.join("a.jpg"), b"signed").unwrap();

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();

        config.text = "Someone Else".into();
        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, true, None).unwrap();
        assert_eq!(result.cache_stats.misses, 1);
        assert_eq!(backend.overlays().len(), 1);
    }

    #[test]
    fn run_without_cache_reencodes_everything() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg"]);
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.output_dir.join("a.jpg"), b"signed").unwrap();

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, false, None).unwrap();
        assert_eq!(result.cache_stats, CacheStats { hits: 0, misses: 1 });
    }

    #[test]
    fn run_without_cache_does_not_leave_a_manifest() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg"]);
        fs::create_dir_all(&config.output_dir).unwrap();
        fs::write(config.output_dir.join("a.jpg"), b"signed").unwrap();

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();
        assert!(cache::manifest_path(&config.output_dir).exists());

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        let result = run_with_backend(&backend, &config, false, None).unwrap();
        assert!(result.files[0].source_hash.is_none());
        assert!(!cache::manifest_path(&config.output_dir).exists());
    }

    #[test]
    fn run_drops_manifest_entries_for_removed_sources() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg", "b.jpg"]);

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600), ("b.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();
        let manifest = CacheManifest::load(&config.output_dir);
        assert_eq!(manifest.entries.len(), 2);

        fs::remove_file(config.source_dir.join("b.jpg")).unwrap();
        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600)]);
        run_with_backend(&backend, &config, true, None).unwrap();

        let manifest = CacheManifest::load(&config.output_dir);
        let names: Vec<&String> = manifest.entries.keys().collect();
        assert_eq!(names, vec!["a.jpg"]);
    }

    #[test]
    fn run_reports_progress_events() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        write_dummy_sources(&config.source_dir, &["a.jpg", "b.jpg"]);

        let backend = MockBackend::with_dimensions(&[("a.jpg", 800, 600), ("b.jpg", 400, 300)]);
        let (tx, rx) = mpsc::channel();
        run_with_backend(&backend, &config, true, Some(tx)).unwrap();
        let events: Vec<ProcessEvent> = rx.iter().collect();

        assert_eq!(events.len(), 3);
        assert!(matches!(&events[0], ProcessEvent::Started { file_count: 2, .. }));
        let mut watermarked: Vec<(usize, String, u32)> = events[1..]
            .iter()
            .filter_map(|e| match e {
                ProcessEvent::FileWatermarked {
                    index,
                    file_name,
                    placement,
                } => Some((*index, file_name.clone(), placement.font_size)),
                _ => None,
            })
            .collect();
        watermarked.sort();
        assert_eq!(
            watermarked,
            vec![(1, "a.jpg".to_string(), 25), (2, "b.jpg".to_string(), 6)]
        );
    }

    #[test]
    fn run_empty_source_dir_succeeds() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        fs::create_dir_all(&config.source_dir).unwrap();

        let result = run_with_backend(&MockBackend::new(), &config, true, None).unwrap();
        assert!(result.files.is_empty());
        assert_eq!(result.cache_stats.total(), 0);
    }

    // =========================================================================
    // Real backend
    // =========================================================================

    #[test]
    fn run_with_bundled_font_writes_outputs() {
        let tmp = TempDir::new().unwrap();
        let config = test_config(tmp.path());
        fs::create_dir_all(&config.source_dir).unwrap();
        create_test_jpeg(&config.source_dir.join("photo.jpg"), 640, 480);

        let result = run(&config, true, None).unwrap();

        let output = config.output_dir.join("photo.jpg");
        assert!(output.exists());
        assert_eq!(image::image_dimensions(&output).unwrap(), (640, 480));
        assert_eq!(result.files[0].placement.unwrap().font_size, 16);
    }

    #[test]
    fn run_with_missing_font_file_fails_before_writing() {
        let tmp = TempDir::new().unwrap();
        let mut config = test_config(tmp.path());
        config.font_path = Some(tmp.path().join("missing.ttf"));
        fs::create_dir_all(&config.source_dir).unwrap();
        create_test_jpeg(&config.source_dir.join("photo.jpg"), 640, 480);

        let result = run(&config, true, None);
        assert!(matches!(result, Err(ProcessError::Font(_))));
        assert!(!config.output_dir.join("photo.jpg").exists());
    }

    #[test]
    fn output_file_name_is_base_name() {
        assert_eq!(output_file_name(Path::new("/a/b/c.jpg")), "c.jpg");
    }
}
